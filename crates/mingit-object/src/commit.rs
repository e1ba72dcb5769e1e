use bstr::{BStr, BString};
use mingit_hash::ObjectId;

use crate::{ObjectError, Signature};

/// A git commit object.
///
/// The builder path only ever produces tree/parent/author/committer
/// headers; anything else encountered while parsing (encoding, gpgsig,
/// mergetag, ...) is preserved verbatim in `extra_headers` so commits
/// fetched from real remotes re-serialize byte-identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// OID of the root tree.
    pub tree: ObjectId,
    /// Parent commit OIDs (empty for a root commit).
    pub parents: Vec<ObjectId>,
    /// Author identity and timestamp.
    pub author: Signature,
    /// Committer identity and timestamp.
    pub committer: Signature,
    /// Unrecognized headers, in order. Multi-line values are stored with
    /// embedded newlines and re-serialized with continuation spaces.
    pub extra_headers: Vec<(BString, BString)>,
    /// Commit message (everything after the blank line separator).
    pub message: BString,
}

impl Commit {
    /// Build a commit from its required parts.
    pub fn new(
        tree: ObjectId,
        parents: Vec<ObjectId>,
        author: Signature,
        committer: Signature,
        message: BString,
    ) -> Self {
        Self {
            tree,
            parents,
            author,
            committer,
            extra_headers: Vec::new(),
            message,
        }
    }

    /// Parse commit content from raw bytes (no object header).
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let mut tree: Option<ObjectId> = None;
        let mut parents = Vec::new();
        let mut author: Option<Signature> = None;
        let mut committer: Option<Signature> = None;
        let mut extra_headers: Vec<(BString, BString)> = Vec::new();

        let data = content;
        let mut pos = 0;

        loop {
            if pos >= data.len() {
                break;
            }

            // A blank line separates headers from the message.
            if data[pos] == b'\n' {
                pos += 1;
                break;
            }

            let line_end = data[pos..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|p| p + pos)
                .unwrap_or(data.len());

            let line = &data[pos..line_end];

            if let Some(space_pos) = line.iter().position(|&b| b == b' ') {
                let key = &line[..space_pos];
                let value = &line[space_pos + 1..];

                match key {
                    b"tree" => {
                        tree = Some(parse_oid_value(value, "tree")?);
                    }
                    b"parent" => {
                        parents.push(parse_oid_value(value, "parent")?);
                    }
                    b"author" => {
                        author = Some(Signature::parse(BStr::new(value))?);
                    }
                    b"committer" => {
                        committer = Some(Signature::parse(BStr::new(value))?);
                    }
                    _ => {
                        // Unknown header, possibly multi-line: continuation
                        // lines start with a space.
                        let mut val = Vec::from(value);
                        let mut next = line_end + 1;
                        while next < data.len() && data[next] == b' ' {
                            val.push(b'\n');
                            let cont_end = data[next..]
                                .iter()
                                .position(|&b| b == b'\n')
                                .map(|p| p + next)
                                .unwrap_or(data.len());
                            val.extend_from_slice(&data[next + 1..cont_end]);
                            next = cont_end + 1;
                        }
                        extra_headers.push((BString::from(key), BString::from(val)));
                        pos = next;
                        continue;
                    }
                }
            }

            pos = line_end + 1;
        }

        let tree = tree.ok_or(ObjectError::MissingCommitField { field: "tree" })?;
        let author = author.ok_or(ObjectError::MissingCommitField { field: "author" })?;
        let committer =
            committer.ok_or(ObjectError::MissingCommitField { field: "committer" })?;

        Ok(Self {
            tree,
            parents,
            author,
            committer,
            extra_headers,
            message: BString::from(&data[pos..]),
        })
    }

    /// Serialize commit content to bytes (no object header).
    pub fn serialize_content(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(b"tree ");
        out.extend_from_slice(self.tree.to_hex().as_bytes());
        out.push(b'\n');

        for parent in &self.parents {
            out.extend_from_slice(b"parent ");
            out.extend_from_slice(parent.to_hex().as_bytes());
            out.push(b'\n');
        }

        out.extend_from_slice(b"author ");
        out.extend_from_slice(&self.author.to_bytes());
        out.push(b'\n');

        out.extend_from_slice(b"committer ");
        out.extend_from_slice(&self.committer.to_bytes());
        out.push(b'\n');

        for (key, val) in &self.extra_headers {
            out.extend_from_slice(key);
            out.push(b' ');
            for (i, line) in val.split(|&b| b == b'\n').enumerate() {
                if i > 0 {
                    out.push(b'\n');
                    out.push(b' ');
                }
                out.extend_from_slice(line);
            }
            out.push(b'\n');
        }

        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }
}

fn parse_oid_value(value: &[u8], field: &'static str) -> Result<ObjectId, ObjectError> {
    let hex = std::str::from_utf8(value)
        .map_err(|_| ObjectError::InvalidHeader(format!("non-UTF8 {field} OID")))?;
    Ok(ObjectId::from_hex(hex)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(ts: i64) -> Signature {
        Signature {
            name: BString::from("X"),
            email: BString::from("x@e"),
            timestamp: ts,
            tz_offset: 0,
        }
    }

    #[test]
    fn serialize_shape() {
        let tree = ObjectId::from_hex("4b825dc642cb6eb9a060e54bf8d69288fbee4904").unwrap();
        let parent = ObjectId::from_hex("ce013625030ba8dba906f756967f9e9ca394464a").unwrap();
        let commit = Commit::new(
            tree,
            vec![parent],
            sig(1700000000),
            sig(1700000000),
            BString::from("hi\n"),
        );

        let expected = format!(
            "tree {}\nparent {}\nauthor X <x@e> 1700000000 +0000\ncommitter X <x@e> 1700000000 +0000\n\nhi\n",
            tree.to_hex(),
            parent.to_hex()
        );
        assert_eq!(commit.serialize_content(), expected.as_bytes());
    }

    #[test]
    fn root_commit_has_no_parent_line() {
        let tree = ObjectId::from_hex("4b825dc642cb6eb9a060e54bf8d69288fbee4904").unwrap();
        let commit = Commit::new(tree, vec![], sig(0), sig(0), BString::from("root\n"));
        let bytes = commit.serialize_content();
        assert!(!bytes.windows(7).any(|w| w == b"parent "));
    }

    #[test]
    fn parse_roundtrip() {
        let tree = ObjectId::from_hex("4b825dc642cb6eb9a060e54bf8d69288fbee4904").unwrap();
        let p1 = ObjectId::from_hex("ce013625030ba8dba906f756967f9e9ca394464a").unwrap();
        let p2 = ObjectId::from_hex("e69de29bb2d1d6434b8b29ae775ad8c2e48c5391").unwrap();
        let commit = Commit::new(
            tree,
            vec![p1, p2],
            sig(1700000000),
            sig(1700000001),
            BString::from("merge two histories\n\ndetails here\n"),
        );

        let parsed = Commit::parse(&commit.serialize_content()).unwrap();
        assert_eq!(parsed, commit);
    }

    #[test]
    fn parse_preserves_unknown_headers() {
        let raw = b"tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
author X <x@e> 1700000000 +0000\n\
committer X <x@e> 1700000000 +0000\n\
encoding ISO-8859-1\n\
\n\
msg\n";
        let commit = Commit::parse(raw).unwrap();
        assert_eq!(commit.extra_headers.len(), 1);
        assert_eq!(commit.extra_headers[0].0, "encoding");
        assert_eq!(commit.extra_headers[0].1, "ISO-8859-1");
        assert_eq!(commit.serialize_content(), raw);
    }

    #[test]
    fn parse_multiline_header_roundtrip() {
        let raw = b"tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
author X <x@e> 1700000000 +0000\n\
committer X <x@e> 1700000000 +0000\n\
gpgsig -----BEGIN PGP SIGNATURE-----\n\
 aGVsbG8=\n\
 -----END PGP SIGNATURE-----\n\
\n\
signed\n";
        let commit = Commit::parse(raw).unwrap();
        assert_eq!(commit.extra_headers[0].0, "gpgsig");
        assert_eq!(commit.serialize_content(), raw);
    }

    #[test]
    fn parse_missing_tree_fails() {
        let raw = b"author X <x@e> 0 +0000\ncommitter X <x@e> 0 +0000\n\nmsg\n";
        let err = Commit::parse(raw).unwrap_err();
        assert!(matches!(
            err,
            ObjectError::MissingCommitField { field: "tree" }
        ));
    }

    #[test]
    fn parse_missing_committer_fails() {
        let raw = b"tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\nauthor X <x@e> 0 +0000\n\nmsg\n";
        assert!(matches!(
            Commit::parse(raw).unwrap_err(),
            ObjectError::MissingCommitField { field: "committer" }
        ));
    }
}
