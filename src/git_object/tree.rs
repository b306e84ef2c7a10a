use super::{space_position, zero_position, Error, Object, ObjectType, Result, Sha1Hash};
use crate::hash::SHA1_HASH_SIZE;
use std::{cmp::Ordering, fmt};

const PERMISSION_MASK: u32 = 0o777;
const TYPE_SHIFT: u32 = 12;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TreeEntryModeType {
    Directory,
    RegularFile,
    SymbolicLink,
    Gitlink,
}

impl TreeEntryModeType {
    fn mask(self) -> u32 {
        match self {
            Self::Directory => 0b0100,
            Self::RegularFile => 0b1000,
            Self::SymbolicLink => 0b1010,
            Self::Gitlink => 0b1110,
        }
    }

    fn from_mask(mask: u32) -> Option<Self> {
        match mask {
            0b0100 => Some(Self::Directory),
            0b1000 => Some(Self::RegularFile),
            0b1010 => Some(Self::SymbolicLink),
            0b1110 => Some(Self::Gitlink),
            _ => None,
        }
    }

    pub fn is_permissionless(self) -> bool {
        self != Self::RegularFile
    }

    /// Object type the entry hash points at.
    pub fn object_type(self) -> &'static str {
        match self {
            Self::Directory => "tree",
            Self::Gitlink => "commit",
            Self::RegularFile | Self::SymbolicLink => "blob",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TreeEntryMode {
    kind: TreeEntryModeType,
    permission: u32,
}

impl TreeEntryMode {
    /// Panics when a permission is given for a type that carries none.
    pub fn new(kind: TreeEntryModeType, permission: u32) -> Self {
        assert!(
            !(kind.is_permissionless() && permission != 0),
            "{kind:?} is permissionless but provided: {permission:o}"
        );
        assert!(
            permission & !PERMISSION_MASK == 0,
            "permission out of range: {permission:o}"
        );
        Self { kind, permission }
    }

    pub fn directory() -> Self {
        Self::new(TreeEntryModeType::Directory, 0)
    }

    pub fn regular_file(permission: u32) -> Self {
        Self::new(TreeEntryModeType::RegularFile, permission)
    }

    pub fn symbolic_link() -> Self {
        Self::new(TreeEntryModeType::SymbolicLink, 0)
    }

    pub fn gitlink() -> Self {
        Self::new(TreeEntryModeType::Gitlink, 0)
    }

    pub fn kind(&self) -> TreeEntryModeType {
        self.kind
    }

    pub fn permission(&self) -> u32 {
        self.permission
    }

    pub fn is_executable(&self) -> bool {
        self.kind == TreeEntryModeType::RegularFile && self.permission & 0o111 != 0
    }

    fn value(&self) -> u32 {
        (self.kind.mask() << TYPE_SHIFT) | self.permission
    }

    fn parse(mode: &str) -> Result<Self> {
        let value = u32::from_str_radix(mode, 8)
            .map_err(|err| Error::corrupt_object(format!("invalid tree entry mode {mode:?}: {err}")))?;
        let kind = TreeEntryModeType::from_mask(value >> TYPE_SHIFT)
            .ok_or_else(|| Error::corrupt_object(format!("unknown tree entry mode: {mode}")))?;
        let permission = value & PERMISSION_MASK;

        if kind.is_permissionless() && permission != 0 {
            return Err(Error::corrupt_object(format!(
                "{kind:?} is permissionless but has mode {mode}"
            )));
        }

        Ok(Self { kind, permission })
    }
}

impl fmt::Display for TreeEntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:o}", self.value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    mode: TreeEntryMode,
    name: String,
    hash: Sha1Hash,
}

impl TreeEntry {
    pub fn new(mode: TreeEntryMode, name: impl Into<String>, hash: Sha1Hash) -> Self {
        Self {
            mode,
            name: name.into(),
            hash,
        }
    }

    pub fn mode(&self) -> TreeEntryMode {
        self.mode
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn hash(&self) -> Sha1Hash {
        self.hash
    }

    fn serialize_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(format!("{} {}\0", self.mode, self.name).as_bytes());
        buf.extend_from_slice(self.hash.as_bytes());
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.as_bytes().cmp(other.name.as_bytes())
    }
}

impl fmt::Display for TreeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:0>6} {} {}    {}",
            self.mode.to_string(),
            self.mode.kind().object_type(),
            self.hash,
            self.name,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Builds a canonical tree, sorting entries by name.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }
}

impl Object for Tree {
    const TYPE: ObjectType = ObjectType::Tree;

    fn encode(&self) -> Vec<u8> {
        let mut buf = vec![];
        for entry in &self.entries {
            entry.serialize_into(&mut buf);
        }
        buf
    }

    // Foreign trees keep the order they arrive in.
    fn decode(content: &[u8]) -> Result<Self> {
        let entries = TreeRecords::new(content).collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }
}

#[derive(Debug)]
pub struct TreeRecords<'a> {
    bytes: &'a [u8],
}

impl<'a> TreeRecords<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn read_entry(&mut self) -> Result<TreeEntry> {
        let bytes = self.bytes;
        let sp_pos = space_position(bytes)
            .ok_or_else(|| Error::corrupt_object("tree entry is missing a space after the mode"))?;
        let zero_pos = zero_position(bytes)
            .ok_or_else(|| Error::corrupt_object("tree entry is missing a NUL after the name"))?;
        if zero_pos < sp_pos {
            return Err(Error::corrupt_object("tree entry has a NUL inside its mode"));
        }

        let hash_end = zero_pos + 1 + SHA1_HASH_SIZE;
        if bytes.len() < hash_end {
            return Err(Error::corrupt_object(format!(
                "tree entry hash is truncated: {} of {SHA1_HASH_SIZE} bytes",
                bytes.len() - zero_pos - 1
            )));
        }

        let mode = std::str::from_utf8(&bytes[..sp_pos])
            .map_err(|err| Error::corrupt_object(format!("tree entry mode is not ascii: {err}")))?;
        let mode = TreeEntryMode::parse(mode)?;
        let name = String::from_utf8(bytes[(sp_pos + 1)..zero_pos].to_vec())
            .map_err(|err| Error::corrupt_object(format!("tree entry name is not utf-8: {err}")))?;
        let hash = Sha1Hash::try_from(&bytes[(zero_pos + 1)..hash_end])?;

        self.bytes = &bytes[hash_end..];
        Ok(TreeEntry { mode, name, hash })
    }
}

impl Iterator for TreeRecords<'_> {
    type Item = Result<TreeEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bytes.is_empty() {
            return None;
        }

        let entry = self.read_entry();
        if entry.is_err() {
            self.bytes = &[];
        }
        Some(entry)
    }
}
