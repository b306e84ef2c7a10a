use super::{ObjectStore, Result};
use crate::git_object::{hash_raw, ObjectType};
use std::fs;

pub(crate) fn run(root: &str, path: String, write: bool) -> Result<()> {
    let hash = if write {
        ObjectStore::open(root)?.write_blob_file(&path)?
    } else {
        hash_raw(ObjectType::Blob, &fs::read(&path)?)
    };
    println!("{hash}");
    Ok(())
}
