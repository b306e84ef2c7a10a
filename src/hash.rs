use super::Error;
use sha1::{Digest, Sha1};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const SHA1_HASH_SIZE: usize = 20;
pub const SHA1_HEX_SIZE: usize = SHA1_HASH_SIZE * 2;

/// A 160-bit object name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sha1Hash([u8; SHA1_HASH_SIZE]);

impl Sha1Hash {
    pub fn hasher() -> Sha1 {
        Sha1::new()
    }

    pub fn new(hasher: Sha1) -> Self {
        Self(hasher.finalize().into())
    }

    /// Digest of the given byte slices, in order.
    pub fn digest<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut hasher = Self::hasher();
        for part in parts {
            hasher.update(part);
        }
        Self::new(hasher)
    }

    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// `xx/yyyy...`: the shard directory followed by the file name.
    pub fn shard_path(&self) -> PathBuf {
        let hex = self.hex();
        let (dir, file) = hex.split_at(2);
        PathBuf::from(dir).join(file)
    }
}

impl fmt::Display for Sha1Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

impl FromStr for Sha1Hash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != SHA1_HEX_SIZE {
            return Err(Error::corrupt_object(format!(
                "SHA-1 hash must be {SHA1_HEX_SIZE}-characters long: {s:?}"
            )));
        }

        let mut buf = [0u8; SHA1_HASH_SIZE];
        hex::decode_to_slice(s, &mut buf)
            .map_err(|err| Error::corrupt_object(format!("invalid hex hash {s:?}: {err}")))?;
        Ok(Self(buf))
    }
}

impl TryFrom<&[u8]> for Sha1Hash {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(Self(bytes.try_into()?))
    }
}

impl From<[u8; SHA1_HASH_SIZE]> for Sha1Hash {
    fn from(value: [u8; SHA1_HASH_SIZE]) -> Self {
        Self(value)
    }
}
