use super::{ObjectStore, Result, Sha1Hash};
use crate::config::Identity;

pub(crate) fn run(
    root: &str,
    tree: Sha1Hash,
    parent: Option<Sha1Hash>,
    message: String,
) -> Result<()> {
    let store = ObjectStore::open(root)?;
    let hash = store.write_commit(tree, parent, &Identity::from_env(), &format!("{message}\n"))?;
    println!("{hash}");
    Ok(())
}
