use anyhow::Result;
use clap::Args;
use mingit_repository::Repository;

#[derive(Args)]
pub struct InitArgs {}

pub fn run(_args: &InitArgs) -> Result<i32> {
    let cwd = std::env::current_dir()?;
    Repository::init(&cwd)?;
    println!("Initialized git directory");
    Ok(0)
}
