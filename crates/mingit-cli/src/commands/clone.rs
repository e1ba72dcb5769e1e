use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use bstr::{BString, ByteSlice};
use clap::Args;
use mingit_protocol::{fetch, refs::RefAdvertisement};
use mingit_repository::{refs, Repository};
use mingit_transport::HttpTransport;

#[derive(Args)]
pub struct CloneArgs {
    /// Repository URL
    url: String,

    /// Destination directory
    directory: PathBuf,
}

pub fn run(args: &CloneArgs) -> Result<i32> {
    let stderr = io::stderr();
    let mut err = stderr.lock();

    let dest = &args.directory;
    if dest.exists() && std::fs::read_dir(dest)?.next().is_some() {
        bail!(
            "destination path '{}' already exists and is not an empty directory",
            dest.display()
        );
    }
    std::fs::create_dir_all(dest)?;

    writeln!(err, "Cloning into '{}'...", dest.display())?;

    let transport = HttpTransport::new(&args.url)?;
    let advertisement = RefAdvertisement::parse(&transport.info_refs()?)?;

    let repo = Repository::init(dest)?;

    let head = match advertisement.head() {
        Some(oid) => oid,
        None => {
            writeln!(err, "warning: you appear to have cloned an empty repository")?;
            return Ok(0);
        }
    };

    // Single-want fetch: request HEAD, expect the full reachable pack.
    let request = fetch::build_request(&head);
    let response = transport.upload_pack(request)?;
    let pack = fetch::extract_pack(&response)?;

    let oids = mingit_pack::unpack_into(pack, repo.store())?;
    writeln!(err, "Unpacked {} objects", oids.len())?;

    // Record the branch HEAD names and point our HEAD at it.
    let branch = advertisement
        .head_branch()
        .unwrap_or_else(|| BString::from("master"));
    let branch = branch.to_str_lossy();
    let refname = format!("refs/heads/{branch}");
    repo.write_ref(&refname, &head)?;
    refs::write_symbolic_head(repo.git_dir(), &refname)?;

    repo.checkout(&head)?;

    Ok(0)
}
