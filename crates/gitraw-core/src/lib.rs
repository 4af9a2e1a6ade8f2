//! gitraw-core - Content-addressed identity for git loose objects
//!
//! A git object's identity is the SHA-1 of its canonical serialization
//! (`<type> <len>\0<body>`), carried here as a CIDv1 with the git-raw
//! multicodec over a SHA-1 multihash.

use std::fmt;

use cid::Cid;
use multihash::Multihash;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};
use thiserror::Error;

/// Multicodec code for raw git objects.
pub const GIT_RAW: u64 = 0x78;

/// Multihash code for SHA-1.
pub const SHA1: u64 = 0x11;

/// Length in bytes of a SHA-1 digest.
pub const SHA1_LEN: usize = 20;

/// Errors from link construction and validation.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("expected a 20 byte sha1 digest, got {0} bytes")]
    BadDigestLength(usize),

    #[error("expected the git-raw codec 0x78, got 0x{0:x}")]
    WrongCodec(u64),

    #[error("expected a sha1 multihash, got code 0x{0:x}")]
    WrongMultihash(u64),

    #[error("invalid hex sha: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, LinkError>;

/// The identity of a git object.
///
/// Wraps a CIDv1 whose multihash digest is the object's SHA-1, so the same
/// value addresses the object both in a content-addressed block store and
/// under `.git/objects/<2-hex>/<38-hex>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    cid: Cid,
}

impl Link {
    /// Wrap a raw 20-byte SHA-1 digest.
    pub fn from_sha(sha: &[u8]) -> Result<Self> {
        if sha.len() != SHA1_LEN {
            return Err(LinkError::BadDigestLength(sha.len()));
        }
        let hash = Multihash::<64>::wrap(SHA1, sha)
            .expect("a 20 byte digest always fits a 64 byte multihash");
        Ok(Self {
            cid: Cid::new_v1(GIT_RAW, hash),
        })
    }

    /// Parse the 40-character hex form used in commit and tag headers.
    pub fn from_hex(hex_sha: &[u8]) -> Result<Self> {
        let sha = hex::decode(hex_sha)?;
        Self::from_sha(&sha)
    }

    /// Hash a full canonical serialization.
    pub fn from_canonical_bytes(data: &[u8]) -> Self {
        let digest = Sha1::digest(data);
        Self::from_sha(&digest).expect("sha1 digests are 20 bytes")
    }

    /// Adopt an existing CID, validating its prefix.
    pub fn from_cid(cid: Cid) -> Result<Self> {
        if cid.codec() != GIT_RAW {
            return Err(LinkError::WrongCodec(cid.codec()));
        }
        let hash = cid.hash();
        if hash.code() != SHA1 {
            return Err(LinkError::WrongMultihash(hash.code()));
        }
        if hash.digest().len() != SHA1_LEN {
            return Err(LinkError::BadDigestLength(hash.digest().len()));
        }
        Ok(Self { cid })
    }

    /// The raw SHA-1: the trailing 20 bytes of the multihash digest.
    pub fn sha(&self) -> [u8; SHA1_LEN] {
        let digest = self.cid.hash().digest();
        let mut sha = [0u8; SHA1_LEN];
        sha.copy_from_slice(&digest[digest.len() - SHA1_LEN..]);
        sha
    }

    /// Hex form, as written in commit and tag headers.
    pub fn to_hex(&self) -> String {
        hex::encode(self.sha())
    }

    /// The underlying CID.
    pub fn cid(&self) -> Cid {
        self.cid
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cid)
    }
}

impl From<Link> for Cid {
    fn from(link: Link) -> Self {
        link.cid
    }
}

impl TryFrom<Cid> for Link {
    type Error = LinkError;

    fn try_from(cid: Cid) -> Result<Self> {
        Self::from_cid(cid)
    }
}

// Serialized as the binary CID so the wire form is self-describing and the
// prefix check runs again on the way back in.
impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.cid.to_bytes())
    }
}

impl<'de> Deserialize<'de> for Link {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        let cid = Cid::try_from(bytes.as_slice()).map_err(de::Error::custom)?;
        Link::from_cid(cid).map_err(de::Error::custom)
    }
}
