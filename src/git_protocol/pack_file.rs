use super::{msb_is_1, Delta, Error, ObjectType, Result, Sha1Hash, SHA1_HASH_SIZE};
use flate2::bufread::ZlibDecoder;
use std::fmt;
use std::io::Read;

const SIGNATURE: &[u8; 4] = b"PACK";
const VERSION: u32 = 2;
const HEADER_SIZE: usize = 12;

const MASK_LAST_4: u8 = 0b00001111;
const MASK_LAST_7: u8 = 0b01111111;
const MASK_OBJECT_TYPE: u8 = 0b01110000;

/// One decoded pack entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackEntry {
    Undeltified {
        object_type: ObjectType,
        content: Vec<u8>,
    },
    Deltified {
        base: Sha1Hash,
        delta: Delta,
    },
}

/// Decodes a version 2 pack held in memory, yielding its entries in order.
#[derive(Debug)]
pub struct PackFile {
    bytes: Vec<u8>,
    position: usize,
    num_objects: u32,
    remaining: u32,
}

impl PackFile {
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::corrupt_pack(0, "pack is shorter than its header"));
        }
        if &bytes[..4] != SIGNATURE {
            return Err(Error::corrupt_pack(
                0,
                format!("invalid signature: {:?}", String::from_utf8_lossy(&bytes[..4])),
            ));
        }

        let version = read_u32(&bytes[4..8]);
        if version != VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let num_objects = read_u32(&bytes[8..12]);

        Ok(Self {
            bytes,
            position: HEADER_SIZE,
            num_objects,
            remaining: num_objects,
        })
    }

    pub fn get_entries(bytes: Vec<u8>) -> Result<Vec<PackEntry>> {
        Self::new(bytes)?.collect()
    }

    pub fn num_objects(&self) -> u32 {
        self.num_objects
    }

    /// Checks the trailing SHA-1 over everything before it.
    pub fn verify_checksum(&self) -> Result<()> {
        let len = self.bytes.len();
        if len < HEADER_SIZE + SHA1_HASH_SIZE {
            return Err(Error::corrupt_pack(len, "pack has no trailing checksum"));
        }

        let (data, trailer) = self.bytes.split_at(len - SHA1_HASH_SIZE);
        let expected = Sha1Hash::try_from(trailer)?;
        let actual = Sha1Hash::digest([data]);
        if expected != actual {
            return Err(Error::corrupt_pack(
                len - SHA1_HASH_SIZE,
                format!("checksum mismatch: trailer {expected}, computed {actual}"),
            ));
        }
        Ok(())
    }

    fn read_one(&mut self) -> Result<u8> {
        let byte = self
            .bytes
            .get(self.position)
            .copied()
            .ok_or_else(|| Error::corrupt_pack(self.position, "unexpected end of pack"))?;
        self.position += 1;
        Ok(byte)
    }

    fn read_object_header(&mut self) -> Result<(usize, PackObjectType)> {
        let start = self.position;
        let mut byte = self.read_one()?;
        let obj_type = PackObjectType::new(byte, start)?;
        let mut len: usize = (byte & MASK_LAST_4) as usize;

        let mut shift = 4;

        while msb_is_1(byte) {
            if shift >= usize::BITS {
                return Err(Error::corrupt_pack(start, "object size overflows"));
            }
            byte = self.read_one()?;

            let size = (byte & MASK_LAST_7) as usize;
            len |= size << shift;
            shift += 7;
        }

        Ok((len, obj_type))
    }

    fn read_hash(&mut self) -> Result<Sha1Hash> {
        let end = self.position + SHA1_HASH_SIZE;
        let bytes = self
            .bytes
            .get(self.position..end)
            .ok_or_else(|| Error::corrupt_pack(self.position, "truncated base object name"))?;
        let hash = Sha1Hash::try_from(bytes)?;
        self.position = end;
        Ok(hash)
    }

    /// Inflates one zlib stream that must expand to exactly `len` bytes,
    /// then moves past the compressed bytes it consumed.
    fn read_zlib(&mut self, len: usize) -> Result<Vec<u8>> {
        let current = self.position;

        let mut decoder = ZlibDecoder::new(&self.bytes[current..]);
        // One byte past `len` is enough to tell an oversized stream apart.
        let limit = (len as u64).saturating_add(1);
        let mut buf = vec![];
        decoder
            .by_ref()
            .take(limit)
            .read_to_end(&mut buf)
            .map_err(|err| Error::corrupt_pack(current, format!("cannot inflate object: {err}")))?;

        if buf.len() != len {
            return Err(Error::corrupt_pack(
                current,
                format!("object inflated to {} bytes, header declared {len}", buf.len()),
            ));
        }

        self.position = current + decoder.total_in() as usize;
        Ok(buf)
    }

    fn read_entry(&mut self) -> Result<PackEntry> {
        let (len, obj_type) = self.read_object_header()?;

        let entry = match obj_type.object_type() {
            Some(object_type) => PackEntry::Undeltified {
                object_type,
                content: self.read_zlib(len)?,
            },
            None if obj_type == PackObjectType::RefDelta => {
                let base = self.read_hash()?;
                let payload = self.read_zlib(len)?;
                let delta = Delta::new(&payload)?;
                PackEntry::Deltified { base, delta }
            }
            None => return Err(Error::UnsupportedPackObjectType(obj_type.to_string())),
        };

        Ok(entry)
    }
}

impl Iterator for PackFile {
    type Item = Result<PackEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let entry = self.read_entry();
        self.remaining = match entry {
            Ok(_) => self.remaining - 1,
            Err(_) => 0,
        };
        Some(entry)
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum PackObjectType {
    Commit,
    Tree,
    Blob,
    Tag,
    OfsDelta,
    RefDelta,
}

impl PackObjectType {
    fn new(byte: u8, offset: usize) -> Result<Self> {
        match (byte & MASK_OBJECT_TYPE) >> 4 {
            1 => Ok(Self::Commit),
            2 => Ok(Self::Tree),
            3 => Ok(Self::Blob),
            4 => Ok(Self::Tag),
            6 => Ok(Self::OfsDelta),
            7 => Ok(Self::RefDelta),
            other => Err(Error::corrupt_pack(
                offset,
                format!("invalid object type code {other}"),
            )),
        }
    }

    fn object_type(self) -> Option<ObjectType> {
        match self {
            Self::Commit => Some(ObjectType::Commit),
            Self::Tree => Some(ObjectType::Tree),
            Self::Blob => Some(ObjectType::Blob),
            Self::Tag | Self::OfsDelta | Self::RefDelta => None,
        }
    }
}

impl fmt::Display for PackObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Commit => "commit",
            Self::Tree => "tree",
            Self::Blob => "blob",
            Self::Tag => "tag",
            Self::OfsDelta => "ofs-delta",
            Self::RefDelta => "ref-delta",
        };
        write!(f, "{value}")
    }
}
