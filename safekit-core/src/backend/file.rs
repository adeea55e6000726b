//! File system backend with atomic writes.
//!
//! Each namespace is a directory; each entry is one file named after the
//! hex-encoded key. Writes follow the write-to-temp-then-rename pattern:
//!
//! 1. Write data to a temporary file in the same directory, unique to this
//!    write
//! 2. Call `fsync()` on the temporary file
//! 3. Atomically rename the temporary file to the target name
//! 4. Call `fsync()` on the parent directory
//!
//! Readers always see either the old content or the new content, never a
//! partial write.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::platform::{NoSystemIdentifier, Platform, PlatformIdentifier};

use super::{KeyValueBackend, StorageProvider};

/// Extension of committed entry files.
const ENTRY_EXTENSION: &str = "bin";

/// Extension of in-flight writes.
const TEMP_EXTENSION: &str = "tmp";

/// Longest key accepted, in bytes. Hex encoding doubles it, and file names
/// are limited to 255 bytes on common file systems.
const MAX_KEY_LEN: usize = 120;

/// Directory-per-namespace implementation of [`KeyValueBackend`].
///
/// A private backend creates its directory and files readable by the owner
/// only (on Unix).
#[derive(Debug, Clone)]
pub struct FileBackend {
    directory: PathBuf,
    #[cfg_attr(not(unix), allow(dead_code))]
    private: bool,
}

impl FileBackend {
    /// Opens a backend rooted at `directory`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new<P: AsRef<Path>>(directory: P) -> StoreResult<Self> {
        Self::open(directory.as_ref(), false)
    }

    /// Like [`FileBackend::new`], but restricts the directory and entries to
    /// the current user.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or its
    /// permissions cannot be changed.
    pub fn private<P: AsRef<Path>>(directory: P) -> StoreResult<Self> {
        Self::open(directory.as_ref(), true)
    }

    fn open(directory: &Path, private: bool) -> StoreResult<Self> {
        fs::create_dir_all(directory).map_err(|e| {
            StoreError::io(
                format!("creating store directory '{}'", directory.display()),
                e,
            )
        })?;

        #[cfg(unix)]
        if private {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(directory, fs::Permissions::from_mode(0o700)).map_err(|e| {
                StoreError::io(
                    format!("restricting store directory '{}'", directory.display()),
                    e,
                )
            })?;
        }

        Ok(Self {
            directory: directory.to_path_buf(),
            private,
        })
    }

    /// Returns the directory holding this backend's entries.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn file_stem(key: &str) -> StoreResult<String> {
        if key.len() > MAX_KEY_LEN {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(hex::encode(key.as_bytes()))
    }

    fn entry_path(&self, key: &str) -> StoreResult<PathBuf> {
        Ok(self
            .directory
            .join(format!("{}.{ENTRY_EXTENSION}", Self::file_stem(key)?)))
    }

    /// A temp file private to one write, so concurrent writers of the same
    /// key never share one.
    fn temp_path(&self) -> PathBuf {
        self.directory.join(format!(".{}.{TEMP_EXTENSION}", Uuid::new_v4().simple()))
    }

    fn write_atomic(&self, target: &Path, temp: &Path, bytes: &[u8]) -> StoreResult<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        if self.private {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(temp)
            .map_err(|e| StoreError::io(format!("creating '{}'", temp.display()), e))?;
        file.write_all(bytes)
            .map_err(|e| StoreError::io(format!("writing '{}'", temp.display()), e))?;
        file.sync_all()
            .map_err(|e| StoreError::io(format!("syncing '{}'", temp.display()), e))?;
        drop(file);

        if let Err(e) = fs::rename(temp, target) {
            let _ = fs::remove_file(temp);
            return Err(StoreError::io(
                format!("renaming into '{}'", target.display()),
                e,
            ));
        }

        self.sync_directory()
    }

    /// Makes a completed rename durable.
    #[cfg(unix)]
    fn sync_directory(&self) -> StoreResult<()> {
        let dir = File::open(&self.directory).map_err(|e| {
            StoreError::io(
                format!("opening directory '{}' for sync", self.directory.display()),
                e,
            )
        })?;
        dir.sync_all().map_err(|e| {
            StoreError::io(
                format!("syncing directory '{}'", self.directory.display()),
                e,
            )
        })
    }

    #[cfg(not(unix))]
    #[allow(clippy::unnecessary_wraps, clippy::unused_self)]
    fn sync_directory(&self) -> StoreResult<()> {
        // Directory handles cannot be synced on this platform.
        Ok(())
    }
}

#[async_trait]
impl KeyValueBackend for FileBackend {
    async fn get_bytes(&self, key: String) -> StoreResult<Option<Vec<u8>>> {
        let path = self.entry_path(&key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(format!("reading '{}'", path.display()), e)),
        }
    }

    async fn set_bytes(&self, key: String, value: Vec<u8>) -> StoreResult<()> {
        let target = self.entry_path(&key)?;
        let temp = self.temp_path();
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.write_atomic(&target, &temp, &value))
            .await
            .map_err(|e| StoreError::backend(format!("write task failed: {e}")))?
    }

    async fn remove(&self, key: String) -> StoreResult<()> {
        let path = self.entry_path(&key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(format!("removing '{}'", path.display()), e)),
        }
    }

    async fn clear(&self) -> StoreResult<()> {
        let mut entries = tokio::fs::read_dir(&self.directory).await.map_err(|e| {
            StoreError::io(format!("listing '{}'", self.directory.display()), e)
        })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StoreError::io(format!("listing '{}'", self.directory.display()), e)
        })? {
            let path = entry.path();
            let is_entry = path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION);
            let is_stale_temp = path.extension().is_some_and(|ext| ext == TEMP_EXTENSION);
            if !is_entry && !is_stale_temp {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(StoreError::io(format!("removing '{}'", path.display()), e));
                }
            }
        }
        Ok(())
    }

    async fn contains(&self, key: String) -> StoreResult<bool> {
        let path = self.entry_path(&key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::io(format!("probing '{}'", path.display()), e))
    }
}

/// Desktop provider keeping both namespaces on disk under one root.
///
/// ```text
/// <root>/common/        plaintext entries
/// <root>/credentials/   owner-only entries
/// ```
///
/// There is no OS-level encryption here; hosts that need it should supply a
/// keystore-backed credentials backend instead.
pub struct FilePlatform {
    common: Arc<FileBackend>,
    credentials: Arc<FileBackend>,
    identifier: Arc<dyn PlatformIdentifier>,
}

impl FilePlatform {
    /// Opens (or creates) the store under `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if either namespace directory cannot be created.
    pub fn new<P: AsRef<Path>>(root: P) -> StoreResult<Self> {
        let root = root.as_ref();
        Ok(Self {
            common: Arc::new(FileBackend::new(root.join("common"))?),
            credentials: Arc::new(FileBackend::private(root.join("credentials"))?),
            identifier: Arc::new(NoSystemIdentifier),
        })
    }
}

impl StorageProvider for FilePlatform {
    fn common_store(&self) -> Arc<dyn KeyValueBackend> {
        self.common.clone()
    }

    fn credential_store(&self) -> Arc<dyn KeyValueBackend> {
        self.credentials.clone()
    }

    fn platform_identifier(&self) -> Arc<dyn PlatformIdentifier> {
        self.identifier.clone()
    }

    fn platform(&self) -> Platform {
        Platform::current()
    }
}
