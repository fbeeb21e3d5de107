//! Store: tenant-scoped filesystem storage keyed by transformed paths.
//!
//! Layout with the content-hash transform:
//! ```text
//! {root}/
//! ├── {tenant_id}/
//! │   └── a9993/e3647/06816/aba3e/25717/850c2/6c9cd/0d89d/
//! │       └── a9993e364706816aba3e25717850c26c9cd0d89d
//! └── {other_tenant}/
//!     └── ...
//! ```
//!
//! With the identity transform the layout is `{root}/{tenant_id}/{key}/{key}`.
//!
//! Deletion removes the key's whole first-level directory. Under the
//! content-hash transform that directory is a 5-hex-char shard, so every
//! other key in the same tenant whose digest shares that prefix is removed
//! with it. Single-key deletion would need a layout with no shared directory
//! segments.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::crypto::{CopyDecrypt, XChaChaStream};
use crate::error::StoreError;
use crate::path_key::{PathKey, PathTransform};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Filesystem-backed store.
///
/// Operations are synchronous and take no locks; concurrent writers to the
/// same key race at the OS level and the last one to finish wins.
#[derive(Debug, Clone)]
pub struct Store {
    config: StoreConfig,
    decryptor: Arc<dyn CopyDecrypt>,
}

/// A key resolved against a tenant directory.
struct Resolved {
    path_key: PathKey,
    tenant_dir: PathBuf,
}

impl Resolved {
    fn file(&self) -> PathBuf {
        self.tenant_dir.join(self.path_key.relative_path())
    }

    fn first_dir(&self) -> PathBuf {
        self.tenant_dir.join(self.path_key.first_path_name())
    }
}

fn validate_tenant(id: &str) -> Result<()> {
    let bad = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidTenant(id.to_string()));
    }
    Ok(())
}

fn validate_path_key(key: &str, path_key: &PathKey) -> Result<()> {
    for segment in path_key.segments() {
        if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\0') {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                segment: segment.to_string(),
            });
        }
    }
    Ok(())
}

impl Store {
    /// Create a store from validated configuration.
    ///
    /// Creates the root directory unless in read-only mode.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        if !config.read_only {
            fs::create_dir_all(&config.root)
                .map_err(|e| StoreError::io("create root directory", &config.root, e))?;
        }

        debug!(
            root = %config.root.display(),
            transform = %config.transform,
            read_only = config.read_only,
            "opened store"
        );

        Ok(Self {
            config,
            decryptor: Arc::new(XChaChaStream),
        })
    }

    /// Create an identity-transform store at a specific root.
    pub fn at_path(root: impl Into<PathBuf>) -> Result<Self> {
        Self::new(StoreConfig::with_root(root))
    }

    /// Create a store at `root` using `transform`.
    pub fn with_transform(root: impl Into<PathBuf>, transform: PathTransform) -> Result<Self> {
        Self::new(StoreConfig::with_root(root).with_transform(transform))
    }

    /// Replace the primitive used by [`Store::write_decrypt`].
    pub fn with_decryptor(mut self, decryptor: Arc<dyn CopyDecrypt>) -> Self {
        self.decryptor = decryptor;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    fn resolve(&self, id: &str, key: &str) -> Result<Resolved> {
        validate_tenant(id)?;
        let path_key = self.config.transform.transform(key);
        validate_path_key(key, &path_key)?;
        Ok(Resolved {
            path_key,
            tenant_dir: self.config.tenant_dir(id),
        })
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.config.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }

    /// Absolute location of `key` for tenant `id`.
    pub fn full_path(&self, id: &str, key: &str) -> Result<PathBuf> {
        Ok(self.resolve(id, key)?.file())
    }

    /// Check whether `key` exists for tenant `id`.
    ///
    /// Returns `Ok(false)` only when the OS reports the path as missing.
    /// Every other stat failure is returned as an error.
    pub fn try_has(&self, id: &str, key: &str) -> Result<bool> {
        let path = self.resolve(id, key)?.file();
        match fs::metadata(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io("stat", path, e)),
        }
    }

    /// Boolean convenience over [`Store::try_has`]; errors count as absent.
    pub fn has(&self, id: &str, key: &str) -> bool {
        self.try_has(id, key).unwrap_or_else(|e| {
            warn!(tenant = id, key, error = %e, "existence check failed, treating as absent");
            false
        })
    }

    /// Create parent directories and a staging file beside the target.
    ///
    /// The staging file is removed on drop unless [`Store::commit`] renames it
    /// over the target, so a failed write never disturbs the stored value.
    fn open_for_writing(&self, resolved: &Resolved) -> Result<(PathBuf, NamedTempFile)> {
        let path = resolved.file();
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| resolved.tenant_dir.clone());
        fs::create_dir_all(&parent)
            .map_err(|e| StoreError::io("create directory", &parent, e))?;

        let staging = NamedTempFile::new_in(&parent)
            .map_err(|e| StoreError::io("create staging file in", &parent, e))?;
        Ok((path, staging))
    }

    /// Flush the staging file and rename it into place.
    fn commit(&self, mut staging: NamedTempFile, path: &Path) -> Result<()> {
        staging
            .flush()
            .map_err(|e| StoreError::io("flush", staging.path(), e))?;
        staging
            .persist(path)
            .map_err(|e| StoreError::io("rename into", path, e.error))?;
        Ok(())
    }

    /// Stream `reader` into `key` for tenant `id`, returning bytes written.
    ///
    /// Bytes land in a staging file first; on error the previous value, if
    /// any, is left untouched.
    pub fn write<R: Read>(&self, id: &str, key: &str, mut reader: R) -> Result<u64> {
        self.ensure_writable()?;
        let resolved = self.resolve(id, key)?;
        let (path, mut staging) = self.open_for_writing(&resolved)?;

        let n = io::copy(&mut reader, &mut staging).map_err(|e| StoreError::Io {
            op: "copy into",
            path: path.clone(),
            source: e,
        })?;
        self.commit(staging, &path)?;

        debug!(tenant = id, key, bytes = n, path = %path.display(), "wrote");
        Ok(n)
    }

    /// Open `key` for tenant `id`, returning its size and an open handle.
    ///
    /// The handle belongs to the caller and closes when dropped.
    pub fn read(&self, id: &str, key: &str) -> Result<(u64, File)> {
        let path = self.resolve(id, key)?.file();

        let file = File::open(&path).map_err(|e| StoreError::io("open", &path, e))?;
        let size = file
            .metadata()
            .map_err(|e| StoreError::io("stat", &path, e))?
            .len();

        debug!(tenant = id, key, bytes = size, "opened for reading");
        Ok((size, file))
    }

    /// Remove the first-level directory containing `key` for tenant `id`.
    ///
    /// Succeeds when the directory is already gone.
    pub fn delete(&self, id: &str, key: &str) -> Result<()> {
        self.ensure_writable()?;
        let resolved = self.resolve(id, key)?;
        let target = resolved.first_dir();

        match fs::remove_dir_all(&target) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io("remove", target, e)),
        }

        info!(
            tenant = id,
            filename = %resolved.path_key.filename,
            "deleted from disk"
        );
        Ok(())
    }

    /// Like [`Store::write`], but decrypts `reader` on the way to disk.
    ///
    /// Returns the number of plaintext bytes written. A decryption failure
    /// leaves the previous value, if any, in place.
    pub fn write_decrypt<R: Read>(
        &self,
        decryption_key: &[u8],
        id: &str,
        key: &str,
        mut reader: R,
    ) -> Result<u64> {
        self.ensure_writable()?;
        let resolved = self.resolve(id, key)?;
        let (path, mut staging) = self.open_for_writing(&resolved)?;

        let n = self
            .decryptor
            .copy_decrypt(decryption_key, &mut reader, &mut staging)
            .map_err(|source| StoreError::Decrypt {
                path: path.clone(),
                source,
            })?;
        self.commit(staging, &path)?;

        debug!(tenant = id, key, bytes = n, path = %path.display(), "wrote decrypted");
        Ok(n)
    }

    /// Remove the entire root, every tenant included.
    pub fn clear(&self) -> Result<()> {
        self.ensure_writable()?;
        match fs::remove_dir_all(&self.config.root) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io("remove", &self.config.root, e)),
        }
        info!(root = %self.config.root.display(), "cleared store");
        Ok(())
    }
}
