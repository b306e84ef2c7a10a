use super::{msb_is_1, read_one, Error, Result};
use std::io::{Cursor, Read};

const MASK_LAST_7: u8 = 0b01111111;
const MAX_COPY_SIZE: usize = 0x10000;

const OFFSET_MASKS: [u8; 4] = [0x01, 0x02, 0x04, 0x08];
const SIZE_MASKS: [u8; 3] = [0x10, 0x20, 0x40];

fn truncated(what: &str) -> Error {
    Error::CorruptDelta(format!("payload ends inside {what}"))
}

/// Little-endian base-128 integer.
fn get_length<R: Read>(r: &mut R) -> Result<usize> {
    let mut byte = read_one(r).ok_or_else(|| truncated("a size header"))?;
    let mut len: usize = (byte & MASK_LAST_7) as usize;
    let mut shift = 7;

    while msb_is_1(byte) {
        if shift >= usize::BITS {
            return Err(Error::CorruptDelta("size header overflows".into()));
        }
        byte = read_one(r).ok_or_else(|| truncated("a size header"))?;
        let additional_len: usize = (byte & MASK_LAST_7) as usize;
        len |= additional_len << shift;
        shift += 7;
    }

    Ok(len)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    base_size: usize,
    target_size: usize,
    instructions: Vec<Instruction>,
}

impl Delta {
    pub fn new(payload: &[u8]) -> Result<Self> {
        let mut r = Cursor::new(payload);
        let base_size = get_length(&mut r)?;
        let target_size = get_length(&mut r)?;

        let mut instructions: Vec<Instruction> = vec![];
        while let Some(byte) = read_one(&mut r) {
            instructions.push(Instruction::new(byte, &mut r)?);
        }

        Ok(Self {
            base_size,
            target_size,
            instructions,
        })
    }

    pub fn base_size(&self) -> usize {
        self.base_size
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn restore(&self, base: &[u8]) -> Result<Vec<u8>> {
        apply(base, self.target_size, &self.instructions)
    }
}

/// Rebuilds a target of exactly `target_size` bytes from `base`.
pub fn apply(base: &[u8], target_size: usize, instructions: &[Instruction]) -> Result<Vec<u8>> {
    let mut result: Vec<u8> = vec![];

    for inst in instructions {
        let produced = match inst {
            Instruction::Copy { size, .. } => *size,
            Instruction::Insert(bytes) => bytes.len(),
        };
        if result.len().saturating_add(produced) > target_size {
            return Err(Error::DeltaMismatch(format!(
                "instructions produce more than the expected {target_size} bytes"
            )));
        }

        match inst {
            Instruction::Copy { offset, size } => {
                let end = offset
                    .checked_add(*size)
                    .filter(|end| *end <= base.len())
                    .ok_or_else(|| {
                        Error::DeltaMismatch(format!(
                            "copy of {size} bytes at offset {offset} exceeds base of {} bytes",
                            base.len()
                        ))
                    })?;
                result.extend_from_slice(&base[*offset..end]);
            }
            Instruction::Insert(bytes) => {
                result.extend_from_slice(bytes);
            }
        }
    }

    if result.len() != target_size {
        return Err(Error::DeltaMismatch(format!(
            "expected {target_size} bytes, reconstructed {}",
            result.len()
        )));
    }

    Ok(result)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Copy { offset: usize, size: usize },
    Insert(Vec<u8>),
}

impl Instruction {
    fn new<R: Read>(byte: u8, r: &mut R) -> Result<Self> {
        if msb_is_1(byte) {
            let offset = get_delta_offset(byte, r)?;
            let size = match get_delta_size(byte, r)? {
                0 => MAX_COPY_SIZE,
                size => size,
            };
            Ok(Self::Copy { offset, size })
        } else if byte == 0 {
            Err(Error::CorruptDelta("reserved instruction byte 0x00".into()))
        } else {
            let len = (byte & MASK_LAST_7) as usize;
            let mut buf = vec![0u8; len];
            r.read_exact(&mut buf)
                .map_err(|_| truncated("an insert instruction"))?;
            Ok(Self::Insert(buf))
        }
    }
}

fn read_le<R: Read>(byte: u8, masks: &[u8], r: &mut R) -> Result<usize> {
    let mut value = 0;
    for (i, mask) in masks.iter().enumerate() {
        if byte & mask != 0 {
            let val = read_one(r).ok_or_else(|| truncated("a copy instruction"))? as usize;
            value |= val << (8 * i);
        }
    }
    Ok(value)
}

fn get_delta_offset<R: Read>(byte: u8, r: &mut R) -> Result<usize> {
    read_le(byte, &OFFSET_MASKS, r)
}

fn get_delta_size<R: Read>(byte: u8, r: &mut R) -> Result<usize> {
    read_le(byte, &SIZE_MASKS, r)
}
