//! The `git-upload-pack` request/response exchange.
//!
//! A clone sends a single `want` for the remote HEAD followed by `done`
//! (no negotiation, since we have nothing). The response starts with a short
//! pkt-line acknowledgment section (`NAK`), after which the raw pack
//! bytes begin at the `PACK` magic.

use std::io::Cursor;

use mingit_hash::ObjectId;

use crate::pktline::{PktLine, PktLineReader, PktLineWriter};
use crate::ProtocolError;

/// Build the upload-pack request body for a full clone of `want`:
/// one `want` line, flush, `done`, flush.
pub fn build_request(want: &ObjectId) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut writer = PktLineWriter::new(&mut buf);

    // Infallible: the writer targets a Vec and the lines are tiny.
    writer
        .write_text(&format!("want {}", want.to_hex()))
        .expect("write to Vec");
    writer.write_flush().expect("write to Vec");
    writer.write_text("done").expect("write to Vec");
    writer.write_flush().expect("write to Vec");

    buf
}

/// Locate the raw pack bytes in an upload-pack response body.
///
/// Consumes the leading ACK/NAK pkt-lines, then expects the `PACK` magic;
/// a scan from the acknowledgment boundary covers servers that interleave
/// extra pkt-lines before the pack.
pub fn extract_pack(body: &[u8]) -> Result<&[u8], ProtocolError> {
    let mut reader = PktLineReader::new(Cursor::new(body));

    let pack_start = loop {
        let pos = reader.inner_mut().position() as usize;

        if body[pos..].starts_with(b"PACK") {
            break pos;
        }

        match reader.read_pkt() {
            Ok(PktLine::Data(data)) => {
                let line = String::from_utf8_lossy(&data);
                let line = line.trim_end_matches('\n');
                if line == "NAK" || line.starts_with("ACK ") {
                    continue;
                }
                // Unexpected line: stop consuming pkt-lines and fall back
                // to scanning for the magic.
                break reader.inner_mut().position() as usize;
            }
            Ok(PktLine::Flush) => continue,
            Err(_) => break pos,
        }
    };

    match find_pack_magic(&body[pack_start..]) {
        Some(rel) => Ok(&body[pack_start + rel..]),
        None => Err(ProtocolError::Protocol(
            "no PACK data in upload-pack response".into(),
        )),
    }
}

fn find_pack_magic(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"PACK")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEAD: &str = "95d09f2b10159347eece71399a7e2e907ea3df4f";

    #[test]
    fn request_body_shape() {
        let want = ObjectId::from_hex(HEAD).unwrap();
        let body = build_request(&want);

        let expected = format!("0032want {}\n00000009done\n0000", HEAD);
        assert_eq!(body, expected.as_bytes());
    }

    #[test]
    fn extract_after_nak() {
        let mut body = b"0008NAK\n".to_vec();
        body.extend_from_slice(b"PACK\x00\x00\x00\x02rest-of-pack");

        let pack = extract_pack(&body).unwrap();
        assert!(pack.starts_with(b"PACK"));
        assert_eq!(&pack[8..], b"rest-of-pack");
    }

    #[test]
    fn extract_after_ack_then_nak() {
        let mut body = Vec::new();
        {
            let mut writer = PktLineWriter::new(&mut body);
            writer
                .write_text(&format!("ACK {} continue", HEAD))
                .unwrap();
            writer.write_text("NAK").unwrap();
        }
        body.extend_from_slice(b"PACKdata");

        let pack = extract_pack(&body).unwrap();
        assert!(pack.starts_with(b"PACK"));
    }

    #[test]
    fn extract_bare_pack_without_preamble() {
        let body = b"PACK\x00\x00\x00\x02\x00\x00\x00\x00".to_vec();
        let pack = extract_pack(&body).unwrap();
        assert_eq!(pack.len(), body.len());
    }

    #[test]
    fn missing_pack_is_an_error() {
        let body = b"0008NAK\njust some trailing junk".to_vec();
        assert!(matches!(
            extract_pack(&body).unwrap_err(),
            ProtocolError::Protocol(_)
        ));
    }

    #[test]
    fn pack_magic_never_inside_ack_lines() {
        // An ACK line containing the bytes "PACK" must not be mistaken
        // for the pack start.
        let mut body = Vec::new();
        {
            let mut writer = PktLineWriter::new(&mut body);
            writer.write_text("ACK 1111111111111111111111111111111111111111").unwrap();
            writer.write_text("NAK").unwrap();
        }
        body.extend_from_slice(b"PACKreal");

        let pack = extract_pack(&body).unwrap();
        assert_eq!(pack, b"PACKreal");
    }
}
