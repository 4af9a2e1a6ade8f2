//! Emitters for the canonical serialization.
//!
//! Header order is fixed: `tree`, parents, `author`, `committer`,
//! `encoding`, merge tags, `gpgsig`, unrecognized headers, blank line,
//! message. Tree, commit, and tag buffer their body to know the preamble
//! length; blobs stream. Writer errors pass through untouched.

use std::io::Write;

use crate::model::{Blob, Commit, GitObject, MergeTag, Tag, Tree};
use crate::{CodecError, Result};

/// Emit the canonical serialization of any object.
pub fn encode<W: Write>(object: &GitObject, w: &mut W) -> Result<()> {
    match object {
        GitObject::Blob(blob) => encode_blob(blob, w),
        GitObject::Tree(tree) => encode_tree(tree, w),
        GitObject::Commit(commit) => encode_commit(commit, w),
        GitObject::Tag(tag) => encode_tag(tag, w),
    }
}

/// `blob <len>\0<payload>`.
pub fn encode_blob<W: Write>(blob: &Blob, w: &mut W) -> Result<()> {
    write!(w, "blob {}\0", blob.data.len())?;
    w.write_all(&blob.data)?;
    Ok(())
}

/// `tree <len>\0` then `<mode> <name>\0<raw-sha>` per entry, in order.
pub fn encode_tree<W: Write>(tree: &Tree, w: &mut W) -> Result<()> {
    let mut body = Vec::new();
    for entry in &tree.entries {
        body.extend_from_slice(&entry.mode);
        body.push(b' ');
        body.extend_from_slice(&entry.name);
        body.push(0);
        body.extend_from_slice(&entry.hash.sha());
    }
    write!(w, "tree {}\0", body.len())?;
    w.write_all(&body)?;
    Ok(())
}

/// Canonical commit emission. A preserved `data_size` is written verbatim
/// into the preamble; an empty one is computed from the body. Real commits
/// always carry author and committer, so their absence is an error here
/// rather than a malformed byte stream.
pub fn encode_commit<W: Write>(commit: &Commit, w: &mut W) -> Result<()> {
    let author = commit
        .author
        .as_ref()
        .ok_or(CodecError::MissingHeader("author"))?;
    let committer = commit
        .committer
        .as_ref()
        .ok_or(CodecError::MissingHeader("committer"))?;

    let mut body = Vec::new();
    body.extend_from_slice(b"tree ");
    body.extend_from_slice(commit.tree.to_hex().as_bytes());
    body.push(b'\n');
    for parent in &commit.parents {
        body.extend_from_slice(b"parent ");
        body.extend_from_slice(parent.to_hex().as_bytes());
        body.push(b'\n');
    }
    body.extend_from_slice(b"author ");
    body.extend_from_slice(&author.render());
    body.push(b'\n');
    body.extend_from_slice(b"committer ");
    body.extend_from_slice(&committer.render());
    body.push(b'\n');
    if let Some(encoding) = &commit.encoding {
        body.extend_from_slice(b"encoding ");
        body.extend_from_slice(encoding);
        body.push(b'\n');
    }
    for merge_tag in &commit.merge_tags {
        write_merge_tag(&mut body, merge_tag);
    }
    if let Some(sig) = &commit.signature {
        body.extend_from_slice(b"gpgsig -----BEGIN PGP SIGNATURE-----\n");
        body.extend_from_slice(&sig.text);
        body.extend_from_slice(b" -----END PGP SIGNATURE-----\n");
    }
    for line in &commit.other {
        body.extend_from_slice(line);
        body.push(b'\n');
    }
    body.push(b'\n');
    body.extend_from_slice(&commit.message);

    if commit.data_size.is_empty() {
        write!(w, "commit {}\0", body.len())?;
    } else {
        write!(w, "commit {}\0", commit.data_size)?;
    }
    w.write_all(&body)?;
    Ok(())
}

fn write_merge_tag(body: &mut Vec<u8>, tag: &MergeTag) {
    body.extend_from_slice(b"mergetag object ");
    body.extend_from_slice(tag.object.to_hex().as_bytes());
    body.push(b'\n');
    body.extend_from_slice(b" type ");
    body.extend_from_slice(&tag.tag_type);
    body.push(b'\n');
    body.extend_from_slice(b" tag ");
    body.extend_from_slice(&tag.tag);
    body.push(b'\n');
    body.extend_from_slice(b" tagger ");
    body.extend_from_slice(&tag.tagger.render());
    body.extend_from_slice(b"\n \n");
    for line in tag.text.split_inclusive(|&b| b == b'\n') {
        body.push(b' ');
        body.extend_from_slice(line);
    }
}

/// `tag <len>\0` then headers, then `\n<text>` when a text block exists.
pub fn encode_tag<W: Write>(tag: &Tag, w: &mut W) -> Result<()> {
    let mut body = Vec::new();
    body.extend_from_slice(b"object ");
    body.extend_from_slice(tag.object.to_hex().as_bytes());
    body.push(b'\n');
    body.extend_from_slice(b"type ");
    body.extend_from_slice(&tag.tag_type);
    body.push(b'\n');
    body.extend_from_slice(b"tag ");
    body.extend_from_slice(&tag.tag);
    body.push(b'\n');
    if let Some(tagger) = &tag.tagger {
        body.extend_from_slice(b"tagger ");
        body.extend_from_slice(&tagger.render());
        body.push(b'\n');
    }
    for line in &tag.other {
        body.extend_from_slice(line);
        body.push(b'\n');
    }
    if let Some(text) = &tag.text {
        body.push(b'\n');
        body.extend_from_slice(text);
    }
    write!(w, "tag {}\0", body.len())?;
    w.write_all(&body)?;
    Ok(())
}
