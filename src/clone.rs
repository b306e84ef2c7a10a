use super::checkout::FileTree;
use super::git_object::{Commit, Tree};
use super::git_protocol::{GitClient, PackEntry, PackFile};
use super::{Error, ObjectStore, Result, Sha1Hash};
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Stage {
    Init,
    FetchRefs,
    FetchPack,
    DecodePack,
    PersistUndeltified,
    ResolveDeltas,
    ReadHeadCommit,
    Checkout,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Init => "init",
            Self::FetchRefs => "fetch-refs",
            Self::FetchPack => "fetch-pack",
            Self::DecodePack => "decode-pack",
            Self::PersistUndeltified => "persist-undeltified",
            Self::ResolveDeltas => "resolve-deltas",
            Self::ReadHeadCommit => "read-head-commit",
            Self::Checkout => "checkout",
            Self::Done => "done",
        };
        write!(f, "{value}")
    }
}

fn enter(stage: Stage) {
    tracing::info!(%stage, "clone");
}

/// Clones the first ref advertised by `url` into `dir`.
///
/// A failure at any stage aborts the clone. Objects already written stay in
/// the destination store.
pub async fn clone_repository<P: AsRef<Path>>(url: &str, dir: P) -> Result<ObjectStore> {
    clone_with(&GitClient::new(url), dir).await
}

/// Same as [`clone_repository`], over an already configured client.
pub async fn clone_with<P: AsRef<Path>>(client: &GitClient, dir: P) -> Result<ObjectStore> {
    let dir = dir.as_ref();

    enter(Stage::Init);
    fs::create_dir_all(dir)?;
    let store = ObjectStore::init(dir)?;

    enter(Stage::FetchRefs);
    let head = client
        .fetch_references()
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Protocol(format!("{} advertises no references", client.url())))?;
    tracing::info!("cloning {} at {}", head.name, head.hash);

    enter(Stage::FetchPack);
    let pack = client.get_pack(&head).await?;

    enter(Stage::DecodePack);
    let pack = PackFile::new(pack)?;
    pack.verify_checksum()?;
    let entries = pack.collect::<Result<Vec<PackEntry>>>()?;
    tracing::info!("decoded {} pack entries", entries.len());

    unpack(&store, entries)?;

    enter(Stage::ReadHeadCommit);
    let tree = head_tree(&store, &head.hash)?;

    enter(Stage::Checkout);
    FileTree::new(dir, &store).write_all(&tree)?;

    enter(Stage::Done);
    Ok(store)
}

/// Persists whole objects first, then rebuilds every ref-delta from a base
/// that must already be in the store.
pub fn unpack(store: &ObjectStore, entries: Vec<PackEntry>) -> Result<Vec<Sha1Hash>> {
    let mut written = Vec::with_capacity(entries.len());
    let mut deltas = vec![];

    enter(Stage::PersistUndeltified);
    for entry in entries {
        match entry {
            PackEntry::Undeltified {
                object_type,
                content,
            } => written.push(store.write_raw(object_type, &content)?),
            PackEntry::Deltified { base, delta } => deltas.push((base, delta)),
        }
    }

    enter(Stage::ResolveDeltas);
    for (base, delta) in deltas {
        let (object_type, base_content) = store.read_raw(&base)?;
        tracing::debug!("apply delta {base} {object_type}");
        let content = delta.restore(&base_content)?;
        written.push(store.write_raw(object_type, &content)?);
    }

    Ok(written)
}

pub fn head_tree(store: &ObjectStore, commit: &Sha1Hash) -> Result<Tree> {
    let commit: Commit = store.read_object(commit)?;
    store.read_object(&commit.tree())
}
