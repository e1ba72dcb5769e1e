use anyhow::{anyhow, Result};
use bstr::BString;
use clap::Args;
use mingit_hash::ObjectId;
use mingit_object::{parse_raw_date, Commit, ObjectType, Signature};

use super::open_repo;

/// Identity used when none is configured in the environment.
const FALLBACK_NAME: &str = "mingit";
const FALLBACK_EMAIL: &str = "mingit@localhost";

#[derive(Args)]
pub struct CommitTreeArgs {
    /// Tree hash the commit records
    tree: String,

    /// Parent commit hash (repeatable)
    #[arg(short = 'p', value_name = "parent")]
    parents: Vec<String>,

    /// Commit message
    #[arg(short = 'm', required = true)]
    message: String,
}

pub fn run(args: &CommitTreeArgs) -> Result<i32> {
    let repo = open_repo()?;

    let tree =
        ObjectId::from_hex(&args.tree).map_err(|_| anyhow!("invalid tree name: {}", args.tree))?;

    let mut parents = Vec::with_capacity(args.parents.len());
    for parent in &args.parents {
        parents.push(
            ObjectId::from_hex(parent).map_err(|_| anyhow!("invalid parent name: {parent}"))?,
        );
    }

    let mut message = BString::from(args.message.as_str());
    if !message.ends_with(b"\n") {
        message.push(b'\n');
    }

    let commit = Commit::new(
        tree,
        parents,
        signature_from_env("AUTHOR"),
        signature_from_env("COMMITTER"),
        message,
    );

    let oid = repo
        .store()
        .write_raw(ObjectType::Commit, &commit.serialize_content())?;

    println!("{}", oid.to_hex());
    Ok(0)
}

/// Build a signature from `GIT_<WHO>_NAME` / `_EMAIL` / `_DATE`,
/// defaulting to the built-in identity stamped with the current time.
/// `GIT_<WHO>_DATE` takes the raw `"<secs> ±HHMM"` format.
fn signature_from_env(who: &str) -> Signature {
    let name = std::env::var(format!("GIT_{who}_NAME")).unwrap_or_else(|_| FALLBACK_NAME.into());
    let email =
        std::env::var(format!("GIT_{who}_EMAIL")).unwrap_or_else(|_| FALLBACK_EMAIL.into());

    let mut sig = Signature::now(name, email);
    if let Ok(date) = std::env::var(format!("GIT_{who}_DATE")) {
        if let Ok((timestamp, tz_offset)) = parse_raw_date(&date) {
            sig.timestamp = timestamp;
            sig.tz_offset = tz_offset;
        }
    }
    sig
}
