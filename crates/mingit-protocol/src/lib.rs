//! Git wire protocol v1 for fetch/clone.
//!
//! Handles pkt-line framing, the `info/refs` advertisement, and the
//! `git-upload-pack` want/done exchange. Protocol v2 is out of scope;
//! its delimiter packets are rejected as malformed.

pub mod fetch;
pub mod pktline;
pub mod refs;

/// Errors that can occur during protocol operations.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid pkt-line: {0}")]
    InvalidPktLine(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
