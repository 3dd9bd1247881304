//! Filesystem implementation of the KeyStore trait.
//!
//! One file per slot inside a single directory. Writes go to a temporary
//! sibling, are synced to disk and then renamed into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::store::{KeySlot, KeyStore};

/// Directory-backed key store.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, slot: KeySlot) -> PathBuf {
        self.dir.join(format!("{}.bin", slot.name()))
    }
}

#[async_trait]
impl KeyStore for FileKeyStore {
    async fn get(&self, slot: KeySlot) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path(slot)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, slot: KeySlot, bytes: &[u8]) -> Result<()> {
        let path = self.path(slot);
        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, slot: KeySlot) -> Result<()> {
        match fs::remove_file(self.path(slot)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
