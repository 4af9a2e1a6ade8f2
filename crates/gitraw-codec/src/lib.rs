//! gitraw-codec - Round-trip codec for git loose-object byte streams
//!
//! Parses the canonical `<type> <size>\0<body>` serialization of git's four
//! object kinds into typed models rich enough to reproduce the input
//! byte-for-byte, and emits them back. The format is 8-bit clean: names,
//! emails, messages, and modes are raw byte sequences, never UTF-8
//! validated. Identity is handled by [`gitraw_core::Link`], the SHA-1 of
//! the canonical bytes wrapped as a git-raw CID.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod decode;
pub mod encode;
mod model;
mod person;

pub use decode::{
    decode, decode_blob, decode_commit, decode_compressed, decode_from_slice, decode_tag,
    decode_tree,
};
pub use encode::{encode, encode_blob, encode_commit, encode_tag, encode_tree};
pub use gitraw_core::{Link, LinkError};
pub use model::{Blob, Commit, GitObject, GpgSig, Links, MergeTag, Tag, Tree, TreeEntry};
pub use person::PersonInfo;

/// Errors surfaced by decode and encode.
///
/// Nothing is retried and no partial model is returned; a failed decode
/// leaves only the error.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unexpected end of stream")]
    UnexpectedEnd,

    #[error("unrecognized object type: {0}")]
    UnrecognizedType(String),

    #[error("malformed object header: {0}")]
    MalformedHeader(String),

    #[error("declared size {declared} does not match the {actual} bytes present")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("incorrectly formatted person info line: {0}")]
    MalformedPerson(String),

    #[error("expected first line of signature to be a single space or a Version/Comment header")]
    MalformedGpgSig,

    #[error("truncated tree entry")]
    TruncatedTree,

    #[error("missing required {0} header")]
    MissingHeader(&'static str),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// The four git object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectType {
    /// Parse the type tag that opens an object header.
    pub fn from_bytes(s: &[u8]) -> Option<Self> {
        match s {
            b"blob" => Some(Self::Blob),
            b"tree" => Some(Self::Tree),
            b"commit" => Some(Self::Commit),
            b"tag" => Some(Self::Tag),
            _ => None,
        }
    }

    /// The canonical header spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_type_parses_the_four_tags() {
        assert_eq!(ObjectType::from_bytes(b"blob"), Some(ObjectType::Blob));
        assert_eq!(ObjectType::from_bytes(b"tree"), Some(ObjectType::Tree));
        assert_eq!(ObjectType::from_bytes(b"commit"), Some(ObjectType::Commit));
        assert_eq!(ObjectType::from_bytes(b"tag"), Some(ObjectType::Tag));
        assert_eq!(ObjectType::from_bytes(b"blob "), None);
        assert_eq!(ObjectType::from_bytes(b""), None);
    }
}
