//! Object identity and hashing for the mingit git implementation.
//!
//! Provides the core `ObjectId` type (a 20-byte SHA-1 digest), hex
//! encoding/decoding, and the streaming `Hasher` used everywhere an
//! object is addressed.

mod error;
pub mod hex;
mod hasher;
mod oid;

pub use error::HashError;
pub use hasher::Hasher;
pub use oid::ObjectId;
