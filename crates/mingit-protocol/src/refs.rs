//! Parsing the v1 ref advertisement from `info/refs?service=git-upload-pack`.
//!
//! The body is a pkt-line stream: a `# service=...` comment, a flush,
//! then one `<40-hex-oid> <refname>` line per ref. The first ref line is
//! `HEAD` and additionally carries the server's capability list after a
//! NUL byte.

use bstr::{BStr, BString, ByteSlice};
use mingit_hash::ObjectId;

use crate::pktline::{PktLine, PktLineReader};
use crate::ProtocolError;

/// The parsed advertisement: refs in server order plus the capability
/// string (opaque at this layer).
#[derive(Debug, Clone, Default)]
pub struct RefAdvertisement {
    refs: Vec<(ObjectId, BString)>,
    capabilities: String,
}

impl RefAdvertisement {
    /// Parse the advertisement from a raw response body.
    pub fn parse(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = PktLineReader::new(body);
        let mut refs = Vec::new();
        let mut capabilities = String::new();
        let mut seen_data = false;

        loop {
            match reader.read_pkt() {
                Ok(PktLine::Data(data)) => {
                    let line = strip_newline(&data);

                    // Skip the "# service=git-upload-pack" announcement.
                    if line.starts_with(b"#") || line.is_empty() {
                        continue;
                    }

                    if !seen_data {
                        seen_data = true;
                        // First ref line: capabilities follow a NUL byte.
                        if let Some(nul_pos) = line.iter().position(|&b| b == 0) {
                            capabilities =
                                String::from_utf8_lossy(&line[nul_pos + 1..]).into_owned();
                            parse_ref_line(&line[..nul_pos], &mut refs)?;
                            continue;
                        }
                    }
                    parse_ref_line(line, &mut refs)?;
                }
                Ok(PktLine::Flush) => {
                    // The advertisement ends at the flush after the refs;
                    // the flush between the service comment and the first
                    // ref is skipped here.
                    if seen_data {
                        break;
                    }
                }
                Err(ProtocolError::Protocol(_)) => break, // end of stream
                Err(e) => return Err(e),
            }
        }

        Ok(Self { refs, capabilities })
    }

    /// The advertised refs, in server order.
    pub fn refs(&self) -> &[(ObjectId, BString)] {
        &self.refs
    }

    /// Look up a ref by name.
    pub fn get(&self, name: &str) -> Option<ObjectId> {
        self.refs
            .iter()
            .find(|(_, refname)| refname.as_bstr() == BStr::new(name))
            .map(|(oid, _)| *oid)
    }

    /// The OID advertised for `HEAD`.
    pub fn head(&self) -> Option<ObjectId> {
        self.get("HEAD")
    }

    /// The server's capability string.
    pub fn capabilities(&self) -> &str {
        &self.capabilities
    }

    /// The branch name `HEAD` points at, inferred by matching its OID
    /// against `refs/heads/*`. `master` wins ties; detached or unmatched
    /// HEADs report `None`.
    pub fn head_branch(&self) -> Option<BString> {
        let head = self.head()?;
        let mut found = None;
        for (oid, refname) in &self.refs {
            if *oid != head {
                continue;
            }
            if let Some(branch) = refname.as_slice().strip_prefix(b"refs/heads/".as_slice()) {
                if branch == b"master".as_slice() {
                    return Some(BString::from(branch));
                }
                if found.is_none() {
                    found = Some(BString::from(branch));
                }
            }
        }
        found
    }
}

/// Parse a single ref line: `<40-hex-oid> <refname>`.
fn parse_ref_line(
    line: &[u8],
    refs: &mut Vec<(ObjectId, BString)>,
) -> Result<(), ProtocolError> {
    let space_pos = line.iter().position(|&b| b == b' ').ok_or_else(|| {
        ProtocolError::Protocol(format!(
            "invalid ref line (no space): {}",
            String::from_utf8_lossy(line)
        ))
    })?;

    let oid_hex = &line[..space_pos];
    let refname = &line[space_pos + 1..];

    let oid_str = std::str::from_utf8(oid_hex)
        .map_err(|_| ProtocolError::Protocol("invalid UTF-8 in OID".into()))?;

    let oid = ObjectId::from_hex(oid_str).map_err(|e| {
        ProtocolError::Protocol(format!("invalid OID in ref advertisement: {e}"))
    })?;

    refs.push((oid, BString::from(refname)));
    Ok(())
}

fn strip_newline(data: &[u8]) -> &[u8] {
    if data.last() == Some(&b'\n') {
        &data[..data.len() - 1]
    } else {
        data
    }
}
