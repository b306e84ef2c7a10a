use super::{ObjectStore, Result};

pub(crate) fn run(root: &str) -> Result<()> {
    let hash = ObjectStore::open(root)?.write_tree_dir(root)?;
    println!("{hash}");
    Ok(())
}
