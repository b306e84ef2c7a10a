use super::{Object, ObjectType, Result};
use bytes::Bytes;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob(Bytes);

impl Blob {
    pub fn data(&self) -> &[u8] {
        self.0.as_ref()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Object for Blob {
    const TYPE: ObjectType = ObjectType::Blob;

    fn encode(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    fn decode(content: &[u8]) -> Result<Self> {
        Ok(Self(Bytes::copy_from_slice(content)))
    }
}

impl From<Bytes> for Blob {
    fn from(value: Bytes) -> Self {
        Self(value)
    }
}

impl From<Vec<u8>> for Blob {
    fn from(value: Vec<u8>) -> Self {
        Self(Bytes::from(value))
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        self.data()
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.data()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_implements_to_string() {
        let blob = Blob(Bytes::from_static(b"hello"));
        assert_eq!(blob.to_string(), "hello");
    }

    #[test]
    fn it_encodes_content_without_framing() {
        let blob = Blob::decode(b"\x00binary\xffdata").unwrap();
        assert_eq!(blob.encode(), b"\x00binary\xffdata".to_vec());
        assert_eq!(blob.len(), 12);
    }
}
