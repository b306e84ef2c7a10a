use super::{ObjectStore, Result, Sha1Hash};
use crate::git_object::Tree;

pub(crate) fn run(root: &str, hash: Sha1Hash, name_only: bool) -> Result<()> {
    let tree: Tree = ObjectStore::open(root)?.read_object(&hash)?;
    for entry in tree.entries() {
        if name_only {
            println!("{}", entry.name());
        } else {
            println!("{entry}");
        }
    }
    Ok(())
}
