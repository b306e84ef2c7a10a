pub mod blob;
pub mod commit;
pub mod signature;
pub mod tree;

use super::{Error, Result, Sha1Hash};
use std::fmt;
use std::str::FromStr;

pub use blob::Blob;
pub use commit::Commit;
pub use signature::AuthorSignature;
pub use tree::{Tree, TreeEntry, TreeEntryMode, TreeEntryModeType};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
}

impl ObjectType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ObjectType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            _ => Err(Error::corrupt_object(format!("unknown object type: {s:?}"))),
        }
    }
}

/// A logical object kind with a canonical content encoding.
pub trait Object: Sized {
    const TYPE: ObjectType;

    fn encode(&self) -> Vec<u8>;

    fn decode(content: &[u8]) -> Result<Self>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitObject {
    Blob(Blob),
    Tree(Tree),
    Commit(Box<Commit>),
}

impl GitObject {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Blob(_) => ObjectType::Blob,
            Self::Tree(_) => ObjectType::Tree,
            Self::Commit(_) => ObjectType::Commit,
        }
    }

    pub fn encode_content(&self) -> Vec<u8> {
        match self {
            Self::Blob(blob) => blob.encode(),
            Self::Tree(tree) => tree.encode(),
            Self::Commit(commit) => commit.encode(),
        }
    }

    pub fn decode_content(object_type: ObjectType, content: &[u8]) -> Result<Self> {
        let object = match object_type {
            ObjectType::Blob => Self::Blob(Blob::decode(content)?),
            ObjectType::Tree => Self::Tree(Tree::decode(content)?),
            ObjectType::Commit => Self::Commit(Box::new(Commit::decode(content)?)),
        };
        Ok(object)
    }

    pub fn hash(&self) -> Sha1Hash {
        hash_raw(self.object_type(), &self.encode_content())
    }
}

impl From<Blob> for GitObject {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob)
    }
}

impl From<Tree> for GitObject {
    fn from(tree: Tree) -> Self {
        Self::Tree(tree)
    }
}

impl From<Commit> for GitObject {
    fn from(commit: Commit) -> Self {
        Self::Commit(Box::new(commit))
    }
}

impl fmt::Display for GitObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob(blob) => blob.fmt(f),
            Self::Tree(tree) => {
                for entry in tree.entries() {
                    writeln!(f, "{entry}")?;
                }
                Ok(())
            }
            Self::Commit(commit) => write!(f, "{}", String::from_utf8_lossy(&commit.encode())),
        }
    }
}

/// `"<type> <len>\0"`
pub fn header(object_type: ObjectType, len: usize) -> String {
    format!("{object_type} {len}\0")
}

pub fn hash_raw(object_type: ObjectType, content: &[u8]) -> Sha1Hash {
    Sha1Hash::digest([header(object_type, content.len()).as_bytes(), content])
}

/// Splits a decoded loose object into its type and exactly the declared number of content bytes.
pub fn parse_header(data: &[u8]) -> Result<(ObjectType, &[u8])> {
    let sp_pos = space_position(data)
        .ok_or_else(|| Error::corrupt_object("object header is missing a space"))?;
    let zero_pos = zero_position(data)
        .ok_or_else(|| Error::corrupt_object("object header is missing a NUL"))?;
    if zero_pos < sp_pos {
        return Err(Error::corrupt_object("object header has a NUL before its space"));
    }

    let object_type = std::str::from_utf8(&data[..sp_pos])
        .map_err(|err| Error::corrupt_object(format!("object type is not ascii: {err}")))?
        .parse::<ObjectType>()?;
    let len = &data[(sp_pos + 1)..zero_pos];
    if len.is_empty() || !len.iter().all(u8::is_ascii_digit) {
        return Err(Error::corrupt_object(format!(
            "object length is not a decimal number: {:?}",
            String::from_utf8_lossy(len)
        )));
    }
    let len = std::str::from_utf8(len)
        .map_err(|err| Error::corrupt_object(format!("object length is not ascii: {err}")))?
        .parse::<usize>()?;

    let content = &data[(zero_pos + 1)..];
    if content.len() < len {
        return Err(Error::corrupt_object(format!(
            "object declares {len} bytes but only {} are available",
            content.len()
        )));
    }

    Ok((object_type, &content[..len]))
}

type GetPosition = Box<dyn Fn(&[u8]) -> Option<usize>>;
fn position(byte: u8) -> GetPosition {
    Box::new(move |bytes: &[u8]| bytes.iter().position(|&b| b == byte))
}

fn zero_position(bytes: &[u8]) -> Option<usize> {
    position(b'\0')(bytes)
}

fn space_position(bytes: &[u8]) -> Option<usize> {
    position(b' ')(bytes)
}
