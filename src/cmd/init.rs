use super::{ObjectStore, Result};
use std::path::Path;

pub(crate) fn run<P: AsRef<Path>>(root: P) -> Result<()> {
    ObjectStore::init(root)?;
    println!("Initialized git directory");
    Ok(())
}
