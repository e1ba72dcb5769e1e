use std::io::{self, Write};

use anyhow::{anyhow, bail, Result};
use bstr::ByteSlice;
use clap::Args;
use mingit_hash::ObjectId;
use mingit_object::Object;

use super::open_repo;

#[derive(Args)]
pub struct LsTreeArgs {
    /// List only filenames
    #[arg(long)]
    name_only: bool,

    /// Tree hash
    tree: String,
}

pub fn run(args: &LsTreeArgs) -> Result<i32> {
    let repo = open_repo()?;
    let oid =
        ObjectId::from_hex(&args.tree).map_err(|_| anyhow!("invalid tree name: {}", args.tree))?;

    let tree = match repo.store().read(&oid)? {
        Some(Object::Tree(t)) => t,
        Some(other) => bail!("not a tree object: {} ({})", args.tree, other.object_type()),
        None => bail!("tree not found: {}", args.tree),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for entry in tree.iter() {
        if args.name_only {
            writeln!(out, "{}", entry.name.as_bstr())?;
        } else {
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

    Ok(0)
}
