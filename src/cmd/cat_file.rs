use super::{ObjectStore, Result, Sha1Hash};

pub(crate) fn run(root: &str, hash: Sha1Hash) -> Result<()> {
    let obj = ObjectStore::open(root)?.read_any(&hash)?;
    print!("{obj}");
    Ok(())
}
