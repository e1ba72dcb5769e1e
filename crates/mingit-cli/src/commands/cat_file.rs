use std::io::{self, Write};

use anyhow::{anyhow, Result};
use bstr::ByteSlice;
use clap::Args;
use mingit_hash::ObjectId;
use mingit_object::Object;

use super::open_repo;

#[derive(Args)]
#[command(group(clap::ArgGroup::new("mode").required(true)))]
pub struct CatFileArgs {
    /// Show object type
    #[arg(short = 't', group = "mode")]
    type_only: bool,

    /// Show object size
    #[arg(short = 's', group = "mode")]
    size: bool,

    /// Pretty-print the object content
    #[arg(short = 'p', group = "mode")]
    pretty: bool,

    /// Object hash
    object: String,
}

pub fn run(args: &CatFileArgs) -> Result<i32> {
    let repo = open_repo()?;
    let oid = ObjectId::from_hex(&args.object)
        .map_err(|_| anyhow!("invalid object name: {}", args.object))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.type_only || args.size {
        let (obj_type, size) = repo
            .store()
            .read_header(&oid)?
            .ok_or_else(|| anyhow!("object not found: {}", args.object))?;
        if args.type_only {
            writeln!(out, "{obj_type}")?;
        } else {
            writeln!(out, "{size}")?;
        }
        return Ok(0);
    }

    // -p is the remaining mode (the arg group requires exactly one).
    debug_assert!(args.pretty);
    let obj = repo
        .store()
        .read(&oid)?
        .ok_or_else(|| anyhow!("object not found: {}", args.object))?;
    pretty_print(&obj, &mut out)?;
    Ok(0)
}

fn pretty_print(obj: &Object, out: &mut impl Write) -> Result<()> {
    match obj {
        Object::Blob(blob) => {
            out.write_all(&blob.data)?;
        }
        Object::Tree(tree) => {
            for entry in tree.iter() {
                let type_name = if entry.mode.is_tree() {
                    "tree"
                } else if entry.mode.is_gitlink() {
                    "commit"
                } else {
                    "blob"
                };
                writeln!(
                    out,
                    "{:06o} {} {}\t{}",
                    entry.mode.raw(),
                    type_name,
                    entry.oid.to_hex(),
                    entry.name.as_bstr(),
                )?;
            }
        }
        Object::Commit(_) | Object::Tag(_) => {
            out.write_all(&obj.serialize_content())?;
        }
    }
    Ok(())
}
