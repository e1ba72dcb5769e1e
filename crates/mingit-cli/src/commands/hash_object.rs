use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mingit_hash::Hasher;
use mingit_object::ObjectType;

use super::open_repo;

#[derive(Args)]
pub struct HashObjectArgs {
    /// Actually write the object into the object database
    #[arg(short = 'w')]
    write: bool,

    /// File to hash
    path: PathBuf,
}

pub fn run(args: &HashObjectArgs) -> Result<i32> {
    let content = std::fs::read(&args.path)
        .with_context(|| format!("cannot read {}", args.path.display()))?;

    let oid = if args.write {
        let repo = open_repo()?;
        repo.store().write_raw(ObjectType::Blob, &content)?
    } else {
        Hasher::hash_object("blob", &content)?
    };

    println!("{}", oid.to_hex());
    Ok(0)
}
