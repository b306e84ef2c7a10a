use super::Sha1Hash;
use std::array::TryFromSliceError;
use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("ERR - Io: {0}")]
    Io(#[from] io::Error),

    #[error("ERR - Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("ERR - Not found: object {0}")]
    NotFound(Sha1Hash),

    #[error("ERR - Already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("ERR - Corrupt object: {0}")]
    CorruptObject(String),

    #[error("ERR - Corrupt pack at offset {offset}: {reason}")]
    CorruptPack { offset: usize, reason: String },

    #[error("ERR - Corrupt delta: {0}")]
    CorruptDelta(String),

    #[error("ERR - Type mismatch: {hash} is a {actual}, expected {expected}")]
    TypeMismatch {
        hash: Sha1Hash,
        expected: String,
        actual: String,
    },

    #[error("ERR - Unsupported pack object type: {0}")]
    UnsupportedPackObjectType(String),

    #[error("ERR - Unsupported pack version: {0}")]
    UnsupportedVersion(u32),

    #[error("ERR - Delta mismatch: {0}")]
    DeltaMismatch(String),

    #[error("ERR - Protocol: {0}")]
    Protocol(String),

    #[error("ERR - Http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ERR - Other: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn corrupt_object(reason: impl Into<String>) -> Self {
        Self::CorruptObject(reason.into())
    }

    pub(crate) fn corrupt_pack(offset: usize, reason: impl Into<String>) -> Self {
        Self::CorruptPack {
            offset,
            reason: reason.into(),
        }
    }
}

impl From<ParseIntError> for Error {
    fn from(err: ParseIntError) -> Self {
        Self::CorruptObject(format!("invalid number: {err}"))
    }
}

impl From<TryFromSliceError> for Error {
    fn from(err: TryFromSliceError) -> Self {
        Self::CorruptObject(format!("invalid hash length: {err}"))
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Self::Other(anyhow::anyhow!("{value}"))
    }
}
