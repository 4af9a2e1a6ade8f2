use bytes::Bytes;
use gitraw_core::Link;
use serde::{Deserialize, Serialize};

use crate::person::PersonInfo;
use crate::{encode, ObjectType, Result};

/// Objects that reference other objects by content identity.
///
/// This is the surface a content-addressed registry walks: links are
/// derived from hashes found in the serialization, never embedded
/// subtrees, so the object graph is a DAG by reference.
pub trait Links {
    fn links(&self) -> Vec<Link>;
}

/// An opaque byte payload, serialized as `blob <len>\0<payload>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub data: Bytes,
}

impl Blob {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl Links for Blob {
    fn links(&self) -> Vec<Link> {
        Vec::new()
    }
}

/// One `<mode> <name>\0<20-byte-sha>` entry of a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// File mode exactly as it appeared ("100644", "40000", ...). Leading
    /// zeros are not normalized.
    pub mode: Vec<u8>,
    pub name: Vec<u8>,
    pub hash: Link,
}

/// An ordered sequence of entries.
///
/// Order is preserved exactly and duplicate names are not rejected; both
/// would change the hash if touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Links for Tree {
    fn links(&self) -> Vec<Link> {
        self.entries.iter().map(|entry| entry.hash).collect()
    }
}

/// The armored block between the BEGIN/END PGP markers of a `gpgsig`
/// header. Each stored line keeps its single leading continuation space
/// and trailing newline, so emission is a literal copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpgSig {
    pub text: Vec<u8>,
}

/// An annotated tag embedded in a commit header, recording that a signed
/// tag was merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeTag {
    pub object: Link,
    #[serde(rename = "tagType")]
    pub tag_type: Vec<u8>,
    pub tag: Vec<u8>,
    pub tagger: PersonInfo,
    /// Text block lines with the leading continuation space stripped; the
    /// emitter puts one back per line.
    pub text: Vec<u8>,
}

impl Links for MergeTag {
    fn links(&self) -> Vec<Link> {
        vec![self.object]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Decimal body length from the decoded header, verbatim, so
    /// re-emission reproduces the exact preamble. Empty when the commit is
    /// authored in memory; the emitter then computes it.
    #[serde(skip)]
    pub data_size: String,
    pub tree: Link,
    pub parents: Vec<Link>,
    pub author: Option<PersonInfo>,
    pub committer: Option<PersonInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<GpgSig>,
    #[serde(rename = "mergeTag")]
    pub merge_tags: Vec<MergeTag>,
    /// Unrecognized header lines, verbatim and in order. Dropping one (an
    /// `HG:extra` written by hg-git, say) would change the commit's hash.
    pub other: Vec<Vec<u8>>,
    /// Everything after the blank header/body separator.
    pub message: Bytes,
}

impl Links for Commit {
    fn links(&self) -> Vec<Link> {
        let mut out = vec![self.tree];
        out.extend(self.parents.iter().copied());
        out.extend(self.merge_tags.iter().map(|tag| tag.object));
        out
    }
}

/// A standalone annotated tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Header size as decoded; emission recomputes the body length, which
    /// agrees for every canonical object.
    #[serde(skip)]
    pub data_size: String,
    pub object: Link,
    #[serde(rename = "tagType")]
    pub tag_type: Vec<u8>,
    pub tag: Vec<u8>,
    pub tagger: Option<PersonInfo>,
    /// Headers the parser did not recognize, preserved for re-emission.
    pub other: Vec<Vec<u8>>,
    /// `Some` when a blank separator introduced a text block, even an
    /// empty one.
    pub text: Option<Bytes>,
}

impl Links for Tag {
    fn links(&self) -> Vec<Link> {
        vec![self.object]
    }
}

/// A decoded git object of any of the four kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GitObject {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl GitObject {
    pub fn object_type(&self) -> ObjectType {
        match self {
            GitObject::Blob(_) => ObjectType::Blob,
            GitObject::Tree(_) => ObjectType::Tree,
            GitObject::Commit(_) => ObjectType::Commit,
            GitObject::Tag(_) => ObjectType::Tag,
        }
    }

    /// The canonical serialization, `<type> <len>\0<body>`.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        encode::encode(self, &mut out)?;
        Ok(out)
    }

    /// The object's identity: SHA-1 of the canonical bytes, as a git-raw
    /// CID.
    pub fn link(&self) -> Result<Link> {
        Ok(Link::from_canonical_bytes(&self.canonical_bytes()?))
    }
}

impl Links for GitObject {
    fn links(&self) -> Vec<Link> {
        match self {
            GitObject::Blob(blob) => blob.links(),
            GitObject::Tree(tree) => tree.links(),
            GitObject::Commit(commit) => commit.links(),
            GitObject::Tag(tag) => tag.links(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(byte: u8) -> Link {
        Link::from_sha(&[byte; 20]).unwrap()
    }

    #[test]
    fn blob_has_no_links() {
        assert!(Blob::new(&b"hello"[..]).links().is_empty());
    }

    #[test]
    fn tree_links_follow_entry_order() {
        let tree = Tree {
            entries: vec![
                TreeEntry {
                    mode: b"100644".to_vec(),
                    name: b"a".to_vec(),
                    hash: link(1),
                },
                TreeEntry {
                    mode: b"40000".to_vec(),
                    name: b"dir".to_vec(),
                    hash: link(2),
                },
            ],
        };
        assert_eq!(tree.links(), vec![link(1), link(2)]);
    }

    #[test]
    fn commit_links_cover_tree_parents_and_merge_tags() {
        let commit = Commit {
            data_size: String::new(),
            tree: link(1),
            parents: vec![link(2), link(3)],
            author: None,
            committer: None,
            encoding: None,
            signature: None,
            merge_tags: vec![MergeTag {
                object: link(4),
                tag_type: b"commit".to_vec(),
                tag: b"v1".to_vec(),
                tagger: PersonInfo::default(),
                text: Vec::new(),
            }],
            other: Vec::new(),
            message: Bytes::new(),
        };
        assert_eq!(commit.links(), vec![link(1), link(2), link(3), link(4)]);
    }

    #[test]
    fn blob_link_matches_sha1_of_canonical_bytes() {
        let object = GitObject::Blob(Blob::new(&b"hello"[..]));
        assert_eq!(object.canonical_bytes().unwrap(), b"blob 5\0hello");
        assert_eq!(
            object.link().unwrap().to_hex(),
            "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0"
        );
    }
}
