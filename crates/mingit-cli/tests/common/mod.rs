//! Shared test harness for mingit CLI integration tests.
//!
//! Provides a process runner with pinned identity environment variables
//! (deterministic commit hashes across machines) and a hand-rolled v2
//! index writer so `write-tree` can be exercised without an `add`
//! implementation.

#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

use mingit_hash::{Hasher, ObjectId};

/// Captured output from running a command.
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run the mingit binary in `dir` with the given arguments.
pub fn mingit(dir: &Path, args: &[&str]) -> CommandResult {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mingit"));
    cmd.args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test Author")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_AUTHOR_DATE", "1234567890 +0000")
        .env("GIT_COMMITTER_NAME", "Test Committer")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_DATE", "1234567890 +0000")
        .env("TZ", "UTC");

    let output = cmd.output().expect("failed to run mingit");
    CommandResult {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    }
}

/// Serialize and write a v2 index into `<dir>/.git/index`.
///
/// Entries are `(path, blob_oid_hex, mode)`. Stat fields are zeroed;
/// the reader only consumes path, OID, and mode.
pub fn write_index(dir: &Path, entries: &[(&str, &str, u32)]) {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"DIRC");
    buf.extend_from_slice(&2u32.to_be_bytes());
    buf.extend_from_slice(&(entries.len() as u32).to_be_bytes());

    for (path, oid_hex, mode) in entries {
        let oid = ObjectId::from_hex(oid_hex).unwrap();
        let start = buf.len();
        buf.extend_from_slice(&[0u8; 24]); // ctime/mtime/dev/ino
        buf.extend_from_slice(&mode.to_be_bytes());
        buf.extend_from_slice(&[0u8; 12]); // uid/gid/size
        buf.extend_from_slice(oid.as_bytes());
        buf.extend_from_slice(&(path.len() as u16).to_be_bytes());
        buf.extend_from_slice(path.as_bytes());

        let entry_size = (62 + path.len() + 8) & !7;
        while buf.len() - start < entry_size {
            buf.push(0);
        }
    }

    let checksum = Hasher::digest(&buf).unwrap();
    buf.extend_from_slice(checksum.as_bytes());

    std::fs::write(dir.join(".git").join("index"), buf).unwrap();
}

/// Digest of a blob with the given content (git `hash-object` semantics).
pub fn blob_oid(content: &[u8]) -> String {
    Hasher::hash_object("blob", content).unwrap().to_hex()
}
