mod client;
mod delta;
mod pack_file;
mod pkt_line;

use std::io::Read;

pub use client::{parse_references, want_request, GitClient, Reference};
pub use delta::{apply, Delta, Instruction};
pub use pack_file::{PackEntry, PackFile};
pub use pkt_line::{PktLine, PktLines};

use super::{git_object::ObjectType, hash::SHA1_HASH_SIZE, Error, Result, Sha1Hash};

/// `None` at end of input.
fn read_one<R: Read>(r: &mut R) -> Option<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf).ok()?;
    let [byte] = buf;
    Some(byte)
}

fn msb_is_1(byte: u8) -> bool {
    byte & 0b10000000 == 0b10000000
}
