use super::git_object::{Blob, Tree, TreeEntry, TreeEntryModeType};
use super::{Error, ObjectStore, Result};
use crate::config::GIT_DIR;
use std::fs;
use std::path::{Path, PathBuf};

/// Materializes a tree from the store into a working directory.
#[derive(Debug)]
pub struct FileTree<'a> {
    root_dir: PathBuf,
    store: &'a ObjectStore,
}

impl<'a> FileTree<'a> {
    pub fn new<P: AsRef<Path>>(root_dir: P, store: &'a ObjectStore) -> Self {
        Self {
            root_dir: root_dir.as_ref().into(),
            store,
        }
    }

    pub fn write_all(&self, tree: &Tree) -> Result<()> {
        fs::create_dir_all(&self.root_dir)?;
        self.write_tree(tree, &self.root_dir)
    }

    fn write_tree(&self, tree: &Tree, dir: &Path) -> Result<()> {
        for entry in tree.entries() {
            check_entry_name(entry.name())?;
            let path = dir.join(entry.name());

            match entry.mode().kind() {
                TreeEntryModeType::RegularFile => self.write_file(entry, &path)?,
                TreeEntryModeType::Directory => {
                    let sub_tree: Tree = self.store.read_object(&entry.hash())?;
                    fs::create_dir_all(&path)?;
                    self.write_tree(&sub_tree, &path)?;
                }
                TreeEntryModeType::SymbolicLink => self.write_symlink(entry, &path)?,
                TreeEntryModeType::Gitlink => {
                    tracing::warn!("skipping submodule {} at {}", entry.hash(), path.display());
                }
            }
        }
        Ok(())
    }

    fn write_file(&self, entry: &TreeEntry, path: &Path) -> Result<()> {
        let blob: Blob = self.store.read_object(&entry.hash())?;
        tracing::debug!("checkout {}", path.display());
        fs::write(path, blob.data())?;

        #[cfg(unix)]
        if entry.mode().is_executable() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(entry.mode().permission()))?;
        }

        Ok(())
    }

    #[cfg(unix)]
    fn write_symlink(&self, entry: &TreeEntry, path: &Path) -> Result<()> {
        let blob: Blob = self.store.read_object(&entry.hash())?;
        let target = String::from_utf8_lossy(blob.data()).to_string();
        tracing::debug!("checkout {} -> {target}", path.display());
        std::os::unix::fs::symlink(target, path)?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn write_symlink(&self, entry: &TreeEntry, path: &Path) -> Result<()> {
        tracing::warn!("writing symlink {} as a plain file", path.display());
        self.write_file(entry, path)
    }
}

/// An entry name must stay a single component inside its directory.
fn check_entry_name(name: &str) -> Result<()> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.eq_ignore_ascii_case(GIT_DIR)
        || name.contains(['/', '\\', '\0']);
    if unsafe_name {
        return Err(Error::corrupt_object(format!(
            "refusing to check out tree entry {name:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git_object::TreeEntryMode;
    use tempfile::TempDir;

    #[test]
    fn it_materializes_nested_tree() {
        let dir = TempDir::new().unwrap();
        let store = ObjectStore::init(dir.path().join("repo")).unwrap();

        let readme = store.write_object(&Blob::from(b"# readme\n".to_vec())).unwrap();
        let script = store.write_object(&Blob::from(b"#!/bin/sh\n".to_vec())).unwrap();
        let sub = store
            .write_object(&Tree::new(vec![TreeEntry::new(
                TreeEntryMode::regular_file(0o755),
                "run.sh",
                script,
            )]))
            .unwrap();
        let tree = Tree::new(vec![
            TreeEntry::new(TreeEntryMode::regular_file(0o644), "README.md", readme),
            TreeEntry::new(TreeEntryMode::directory(), "bin", sub),
            TreeEntry::new(TreeEntryMode::gitlink(), "vendor", [1; 20].into()),
        ]);

        let out = dir.path().join("out");
        FileTree::new(&out, &store).write_all(&tree).unwrap();

        assert_eq!(fs::read(out.join("README.md")).unwrap(), b"# readme\n");
        assert_eq!(fs::read(out.join("bin/run.sh")).unwrap(), b"#!/bin/sh\n");
        assert!(!out.join("vendor").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(out.join("bin/run.sh")).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn it_reports_missing_blob() {
        let dir = TempDir::new().unwrap();
        let store = ObjectStore::init(dir.path()).unwrap();
        let tree = Tree::new(vec![TreeEntry::new(
            TreeEntryMode::regular_file(0o644),
            "missing",
            [3; 20].into(),
        )]);

        assert!(matches!(
            FileTree::new(dir.path(), &store).write_all(&tree),
            Err(crate::Error::NotFound(_))
        ));
    }

    #[test]
    fn it_refuses_entries_leaving_the_directory() {
        let dir = TempDir::new().unwrap();
        let store = ObjectStore::init(dir.path().join("repo")).unwrap();
        let blob = store.write_object(&Blob::from(b"escaped\n".to_vec())).unwrap();

        // Decoded trees keep whatever names the remote sent.
        let mut bytes = b"100644 ../escaped.txt\0".to_vec();
        bytes.extend_from_slice(blob.as_bytes());
        let tree = <Tree as crate::git_object::Object>::decode(&bytes).unwrap();

        let out = dir.path().join("repo");
        assert!(matches!(
            FileTree::new(&out, &store).write_all(&tree),
            Err(Error::CorruptObject(_))
        ));
        assert!(!dir.path().join("escaped.txt").exists());

        for name in ["", ".", "..", ".git", ".GIT", "a/b", "/etc", "a\\b"] {
            assert!(check_entry_name(name).is_err(), "{name:?}");
        }
        assert!(check_entry_name("..hidden").is_ok());
        assert!(check_entry_name(".gitignore").is_ok());
    }
}
