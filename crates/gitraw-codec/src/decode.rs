//! Decoders for the canonical `<type> <size>\0<body>` stream.
//!
//! The dispatcher reads the type tag; each per-type decoder consumes the
//! size prelude and the body. Commit and tag bodies are line-oriented with
//! two nested forms: the space-prefixed GPG armor block and the merge-tag
//! block, whose sub-parser overshoots by one line and hands it back.

use std::io::{self, BufRead, BufReader};

use flate2::bufread::ZlibDecoder;
use gitraw_core::Link;

use crate::model::{Blob, Commit, GitObject, GpgSig, MergeTag, Tag, Tree, TreeEntry};
use crate::person::PersonInfo;
use crate::{CodecError, ObjectType, Result};

/// Decode one object from a canonical byte stream.
pub fn decode<R: BufRead>(rd: &mut R) -> Result<GitObject> {
    let tag = read_delimited(rd, b' ')?;
    match ObjectType::from_bytes(&tag) {
        Some(ObjectType::Blob) => Ok(GitObject::Blob(decode_blob(rd)?)),
        Some(ObjectType::Tree) => Ok(GitObject::Tree(decode_tree(rd)?)),
        Some(ObjectType::Commit) => Ok(GitObject::Commit(decode_commit(rd)?)),
        Some(ObjectType::Tag) => Ok(GitObject::Tag(decode_tag(rd)?)),
        None => Err(CodecError::UnrecognizedType(
            String::from_utf8_lossy(&tag).into_owned(),
        )),
    }
}

/// Decode a fully in-memory object.
pub fn decode_from_slice(buf: &[u8]) -> Result<GitObject> {
    decode(&mut &buf[..])
}

/// Decode a zlib-compressed loose object as stored under `.git/objects/`.
pub fn decode_compressed<R: BufRead>(r: R) -> Result<GitObject> {
    let mut rd = BufReader::new(ZlibDecoder::new(r));
    decode(&mut rd)
}

/// Decode a blob body: `<size>\0<payload>`.
pub fn decode_blob<R: BufRead>(rd: &mut R) -> Result<Blob> {
    let size = read_size(rd)?;
    let declared = parse_size(&size)?;
    let mut data = Vec::new();
    rd.read_to_end(&mut data)?;
    if data.len() != declared {
        return Err(CodecError::SizeMismatch {
            declared,
            actual: data.len(),
        });
    }
    Ok(Blob { data: data.into() })
}

/// Decode a tree body: `<size>\0` then entries until EOF.
pub fn decode_tree<R: BufRead>(rd: &mut R) -> Result<Tree> {
    // The declared size is a hint only; entries run to end of stream.
    let size = read_size(rd)?;
    parse_size(&size)?;
    let mut entries = Vec::new();
    while let Some(entry) = read_tree_entry(rd)? {
        entries.push(entry);
    }
    Ok(Tree { entries })
}

fn read_tree_entry<R: BufRead>(rd: &mut R) -> Result<Option<TreeEntry>> {
    let mut mode = Vec::new();
    rd.read_until(b' ', &mut mode)?;
    match mode.pop() {
        None => return Ok(None), // end of stream between entries
        Some(b' ') => {}
        Some(_) => return Err(CodecError::TruncatedTree),
    }

    let mut name = Vec::new();
    rd.read_until(0, &mut name)?;
    if name.pop() != Some(0) {
        return Err(CodecError::TruncatedTree);
    }

    let mut sha = [0u8; 20];
    rd.read_exact(&mut sha).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            CodecError::TruncatedTree
        } else {
            err.into()
        }
    })?;

    Ok(Some(TreeEntry {
        mode,
        name,
        hash: Link::from_sha(&sha)?,
    }))
}

/// Decode a commit body: `<size>\0`, header lines, blank line, message.
pub fn decode_commit<R: BufRead>(rd: &mut R) -> Result<Commit> {
    let data_size = read_size(rd)?;

    let mut tree: Option<Link> = None;
    let mut parents = Vec::new();
    let mut author = None;
    let mut committer = None;
    let mut encoding = None;
    let mut signature = None;
    let mut merge_tags = Vec::new();
    let mut other = Vec::new();
    let mut message = Vec::new();

    // The merge-tag sub-parser reads one line past its block; that line
    // lands in `pending` and is dispatched before the stream is read again.
    let mut pending: Option<Vec<u8>> = None;
    loop {
        let line = match pending.take() {
            Some(line) => line,
            None => match read_line(rd)? {
                Some(line) => line,
                None => break,
            },
        };

        if line.is_empty() {
            rd.read_to_end(&mut message)?;
            break;
        }

        if let Some(hex) = line.strip_prefix(b"tree ") {
            tree = Some(Link::from_hex(hex)?);
        } else if let Some(hex) = line.strip_prefix(b"parent ") {
            parents.push(Link::from_hex(hex)?);
        } else if line.starts_with(b"author ") {
            author = Some(PersonInfo::parse(&line)?);
        } else if line.starts_with(b"committer ") {
            committer = Some(PersonInfo::parse(&line)?);
        } else if let Some(rest) = line.strip_prefix(b"encoding ") {
            encoding = Some(rest.to_vec());
        } else if line.starts_with(b"gpgsig ") {
            signature = Some(read_gpg_sig(rd)?);
        } else if let Some(hex) = line.strip_prefix(b"mergetag object ") {
            let object = Link::from_hex(hex)?;
            let (tag, pushback) = read_merge_tag(object, rd)?;
            merge_tags.push(tag);
            pending = pushback;
        } else {
            other.push(line);
        }
    }

    Ok(Commit {
        data_size,
        tree: tree.ok_or(CodecError::MissingHeader("tree"))?,
        parents,
        author,
        committer,
        encoding,
        signature,
        merge_tags,
        other,
        message: message.into(),
    })
}

/// Decode a standalone annotated tag body.
pub fn decode_tag<R: BufRead>(rd: &mut R) -> Result<Tag> {
    let data_size = read_size(rd)?;

    let mut object = None;
    let mut tag_type = Vec::new();
    let mut tag = Vec::new();
    let mut tagger = None;
    let mut other = Vec::new();
    let mut text: Option<Vec<u8>> = None;

    while let Some(line) = read_line(rd)? {
        if line.is_empty() {
            let mut rest = Vec::new();
            rd.read_to_end(&mut rest)?;
            text = Some(rest);
            break;
        }

        if let Some(hex) = line.strip_prefix(b"object ") {
            object = Some(Link::from_hex(hex)?);
        } else if let Some(rest) = line.strip_prefix(b"type ") {
            tag_type = rest.to_vec();
        } else if let Some(rest) = line.strip_prefix(b"tag ") {
            tag = rest.to_vec();
        } else if line.starts_with(b"tagger ") {
            tagger = Some(PersonInfo::parse(&line)?);
        } else {
            other.push(line);
        }
    }

    Ok(Tag {
        data_size,
        object: object.ok_or(CodecError::MissingHeader("object"))?,
        tag_type,
        tag,
        tagger,
        other,
        text: text.map(Into::into),
    })
}

// The armored block follows the continuation convention: every line after
// the `gpgsig ` opener begins with one space. The first may be the bare
// separator or a Version/Comment armor header; both belong to the body.
// The END marker terminates the block and is not stored.
fn read_gpg_sig<R: BufRead>(rd: &mut R) -> Result<GpgSig> {
    let first = read_line(rd)?.ok_or(CodecError::UnexpectedEnd)?;
    if first != b" " && !first.starts_with(b" Version: ") && !first.starts_with(b" Comment: ") {
        return Err(CodecError::MalformedGpgSig);
    }

    let mut text = first;
    text.push(b'\n');
    loop {
        let line = read_line(rd)?.ok_or(CodecError::UnexpectedEnd)?;
        if line == b" -----END PGP SIGNATURE-----" {
            break;
        }
        text.extend_from_slice(&line);
        text.push(b'\n');
    }
    Ok(GpgSig { text })
}

// Reads the space-prefixed continuation block after `mergetag object`.
// A lone ` ` introduces the text block, which is over at the first line
// without the leading space; that line belongs to the outer commit parser
// and is handed back. Unknown continuation lines are skipped.
fn read_merge_tag<R: BufRead>(object: Link, rd: &mut R) -> Result<(MergeTag, Option<Vec<u8>>)> {
    let mut tag_type = Vec::new();
    let mut tag = Vec::new();
    let mut tagger: Option<PersonInfo> = None;
    let mut text = Vec::new();
    let mut pushback = None;

    'block: loop {
        let line = match read_line(rd)? {
            Some(line) => line,
            None => break,
        };

        if let Some(rest) = line.strip_prefix(b" type ") {
            tag_type = rest.to_vec();
        } else if let Some(rest) = line.strip_prefix(b" tag ") {
            tag = rest.to_vec();
        } else if line.starts_with(b" tagger ") {
            tagger = Some(PersonInfo::parse(&line[1..])?);
        } else if line == b" " {
            loop {
                let line = read_line(rd)?.ok_or(CodecError::UnexpectedEnd)?;
                match line.strip_prefix(b" ") {
                    Some(rest) => {
                        text.extend_from_slice(rest);
                        text.push(b'\n');
                    }
                    None => {
                        pushback = Some(line);
                        break 'block;
                    }
                }
            }
        }
    }

    let tag = MergeTag {
        object,
        tag_type,
        tag,
        tagger: tagger.ok_or(CodecError::MissingHeader("tagger"))?,
        text,
    };
    Ok((tag, pushback))
}

// Read up to `delim` and return the bytes before it; running out of input
// first is an error.
fn read_delimited<R: BufRead>(rd: &mut R, delim: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    rd.read_until(delim, &mut buf)?;
    if buf.pop() != Some(delim) {
        return Err(CodecError::UnexpectedEnd);
    }
    Ok(buf)
}

// The `<size>\0` prelude. The digit string is returned verbatim; commit
// and tag keep it for re-emission.
fn read_size<R: BufRead>(rd: &mut R) -> Result<String> {
    let raw = read_delimited(rd, 0)?;
    if raw.is_empty() || !raw.iter().all(u8::is_ascii_digit) {
        return Err(CodecError::MalformedHeader(format!(
            "non-decimal object size {:?}",
            String::from_utf8_lossy(&raw)
        )));
    }
    Ok(String::from_utf8(raw).expect("ascii digits are utf-8"))
}

fn parse_size(size: &str) -> Result<usize> {
    size.parse()
        .map_err(|_| CodecError::MalformedHeader(format!("object size {size} out of range")))
}

// One LF-terminated line without its newline; `None` at end of stream. A
// final unterminated line is still a line.
fn read_line<R: BufRead>(rd: &mut R) -> Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    let n = rd.read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    Ok(Some(buf))
}
