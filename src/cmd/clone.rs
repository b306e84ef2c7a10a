use super::Result;
use crate::clone::clone_repository;

pub(crate) async fn run(url: String, dir: String) -> Result<()> {
    let store = clone_repository(&url, &dir).await?;
    println!("Cloned {url} into {}", store.root().display());
    Ok(())
}
