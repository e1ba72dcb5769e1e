use anyhow::{Context, Result};
use clap::Args;
use mingit_index::Index;

use super::open_repo;

#[derive(Args)]
pub struct WriteTreeArgs {}

pub fn run(_args: &WriteTreeArgs) -> Result<i32> {
    let repo = open_repo()?;

    let index = Index::read_from(repo.index_path()).context("cannot read .git/index")?;
    let oid = index.write_tree(repo.store())?;

    println!("{}", oid.to_hex());
    Ok(0)
}
