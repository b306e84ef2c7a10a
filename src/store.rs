//! Loose object storage under `.git/objects/xx/yyyy...`.
use super::config::{
    Identity, CONFIG_FILE, DEFAULT_CONFIG, DEFAULT_HEAD, GIT_DIR, HEAD_FILE, OBJECTS_DIR, REFS_DIR,
};
use super::git_object::{
    self, Blob, Commit, GitObject, Object, ObjectType, Tree, TreeEntry, TreeEntryMode,
};
use super::{Error, Result, Sha1Hash};
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    /// Creates `.git` with its object and ref directories, `HEAD` and `config`.
    pub fn init<P: AsRef<Path>>(root: P) -> Result<Self> {
        let store = Self::at(root);
        let git_dir = store.git_dir();
        if git_dir.try_exists()? {
            return Err(Error::AlreadyExists(git_dir));
        }

        fs::create_dir_all(store.objects_dir())?;
        fs::create_dir_all(git_dir.join(REFS_DIR))?;
        fs::write(git_dir.join(HEAD_FILE), DEFAULT_HEAD)?;
        fs::write(git_dir.join(CONFIG_FILE), DEFAULT_CONFIG)?;
        tracing::debug!("initialized {}", git_dir.display());
        Ok(store)
    }

    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let store = Self::at(root);
        let git_dir = store.git_dir();
        if !git_dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not a git repository: {}", git_dir.display()),
            )
            .into());
        }
        Ok(store)
    }

    fn at<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn git_dir(&self) -> PathBuf {
        self.root.join(GIT_DIR)
    }

    fn objects_dir(&self) -> PathBuf {
        self.git_dir().join(OBJECTS_DIR)
    }

    pub fn object_path(&self, hash: &Sha1Hash) -> PathBuf {
        self.objects_dir().join(hash.shard_path())
    }

    pub fn contains(&self, hash: &Sha1Hash) -> bool {
        self.object_path(hash).is_file()
    }

    /// Stores `"<type> <len>\0<content>"` compressed and returns its hash.
    /// Writing an object that is already present leaves the file untouched.
    pub fn write_raw(&self, object_type: ObjectType, content: &[u8]) -> Result<Sha1Hash> {
        let header = git_object::header(object_type, content.len());
        let hash = Sha1Hash::digest([header.as_bytes(), content]);
        let path = self.object_path(&hash);

        if path.try_exists()? {
            tracing::trace!("{hash} already stored");
            return Ok(hash);
        }

        let dir = path
            .parent()
            .ok_or_else(|| Error::corrupt_object(format!("no shard directory for {hash}")))?;
        fs::create_dir_all(dir)?;

        // Readers only ever see complete objects.
        let mut e = ZlibEncoder::new(NamedTempFile::new_in(dir)?, Compression::default());
        e.write_all(header.as_bytes())?;
        e.write_all(content)?;
        let file = e.finish()?;

        match file.persist_noclobber(&path) {
            Ok(_) => tracing::debug!("wrote {hash} {object_type}"),
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                tracing::trace!("{hash} stored concurrently");
            }
            Err(err) => return Err(err.error.into()),
        }
        Ok(hash)
    }

    pub fn read_raw(&self, hash: &Sha1Hash) -> Result<(ObjectType, Vec<u8>)> {
        let f = File::open(self.object_path(hash)).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound(*hash),
            _ => Error::Io(err),
        })?;

        let mut decoder = ZlibDecoder::new(f);
        let mut data = vec![];
        decoder
            .read_to_end(&mut data)
            .map_err(|err| Error::corrupt_object(format!("cannot inflate {hash}: {err}")))?;

        let (object_type, content) = git_object::parse_header(&data)?;
        Ok((object_type, content.to_vec()))
    }

    pub fn write_object<T: Object>(&self, object: &T) -> Result<Sha1Hash> {
        self.write_raw(T::TYPE, &object.encode())
    }

    pub fn read_object<T: Object>(&self, hash: &Sha1Hash) -> Result<T> {
        let (object_type, content) = self.read_raw(hash)?;
        if object_type != T::TYPE {
            return Err(Error::TypeMismatch {
                hash: *hash,
                expected: T::TYPE.to_string(),
                actual: object_type.to_string(),
            });
        }
        T::decode(&content)
    }

    pub fn write_any(&self, object: &GitObject) -> Result<Sha1Hash> {
        self.write_raw(object.object_type(), &object.encode_content())
    }

    pub fn read_any(&self, hash: &Sha1Hash) -> Result<GitObject> {
        let (object_type, content) = self.read_raw(hash)?;
        GitObject::decode_content(object_type, &content)
    }

    pub fn write_blob_file<P: AsRef<Path>>(&self, path: P) -> Result<Sha1Hash> {
        let blob = Blob::from(fs::read(path)?);
        self.write_object(&blob)
    }

    /// Snapshots `dir` recursively, skipping `.git`.
    pub fn write_tree_dir<P: AsRef<Path>>(&self, dir: P) -> Result<Sha1Hash> {
        let mut entries: Vec<TreeEntry> = vec![];

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_name() == OsStr::new(GIT_DIR) {
                continue;
            }

            let path = entry.path();
            let file_type = entry.file_type()?;
            let name = entry.file_name().to_string_lossy().to_string();

            let (mode, hash) = if file_type.is_dir() {
                (TreeEntryMode::directory(), self.write_tree_dir(&path)?)
            } else if file_type.is_symlink() {
                let target = fs::read_link(&path)?;
                let blob = Blob::from(target.to_string_lossy().as_bytes().to_vec());
                (TreeEntryMode::symbolic_link(), self.write_object(&blob)?)
            } else if file_type.is_file() {
                let mode = TreeEntryMode::regular_file(file_permission(&entry.metadata()?));
                (mode, self.write_blob_file(&path)?)
            } else {
                tracing::warn!("skipping {}: not a file, directory or symlink", path.display());
                continue;
            };

            entries.push(TreeEntry::new(mode, name, hash));
        }

        self.write_object(&Tree::new(entries))
    }

    pub fn write_commit(
        &self,
        tree: Sha1Hash,
        parent: Option<Sha1Hash>,
        identity: &Identity,
        message: &str,
    ) -> Result<Sha1Hash> {
        let signature = identity.signature_now();
        let commit = Commit::new(tree, parent, signature.clone(), signature, message);
        self.write_object(&commit)
    }
}

#[cfg(unix)]
fn file_permission(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    if meta.permissions().mode() & 0o100 != 0 {
        0o755
    } else {
        0o644
    }
}

#[cfg(not(unix))]
fn file_permission(_meta: &fs::Metadata) -> u32 {
    0o644
}
