//! Filesystem-backed storage of binary asset payloads.
//!
//! One flat directory, one file per asset, named by asset id. Companion
//! thumbnails live in the same directory under a name derived from the id.

use crate::error::{Error, Result};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores asset payloads as flat files named by asset id.
#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    /// Open a blob store over the given directory, creating it if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the blobs.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the blob file for the given key.
    fn blob_path(&self, key: &str) -> Result<PathBuf> {
        // Keys name flat files only - no path traversal
        if key.is_empty() || key.contains("..") || key.contains('/') || key.contains('\\') {
            return Err(Error::invalid_key(key));
        }
        Ok(self.dir.join(key))
    }

    /// Whether a blob exists for the key. Invalid keys report false.
    pub fn exists(&self, key: &str) -> bool {
        self.blob_path(key).map(|p| p.exists()).unwrap_or(false)
    }

    /// Read a blob's bytes. Fails if the blob is absent.
    pub fn load(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(key)?;
        let bytes = fs::read(&path)?;
        debug!(key, bytes = bytes.len(), "blob loaded");
        Ok(bytes)
    }

    /// Delete a blob. Fails if it is absent.
    pub fn delete(&self, key: &str) -> Result<()> {
        let path = self.blob_path(key)?;
        fs::remove_file(&path)?;
        debug!(key, "blob deleted");
        Ok(())
    }

    /// Stream `source` into the blob file for `key`, returning the byte count.
    ///
    /// The write goes straight to the final path, truncating any previous
    /// content. A reader observing the file mid-write sees a truncated
    /// payload; readers of freshly saved assets must tolerate that window.
    pub fn write<R: Read>(&self, key: &str, mut source: R) -> Result<u64> {
        let path = self.blob_path(key)?;
        let mut file = fs::File::create(&path)?;
        let bytes = io::copy(&mut source, &mut file)?;
        file.flush()?;
        debug!(key, bytes, "blob written");
        Ok(bytes)
    }

    /// Companion thumbnail key for an asset id: the trailing three characters
    /// (assumed to be a three-character extension) are replaced with `png`.
    ///
    /// Purely string-based; nothing checks that the id really ends in a
    /// three-character extension. Ids shorter than three characters derive
    /// the bare key `png`.
    pub fn thumb_key(id: &str) -> String {
        let keep = id.chars().count().saturating_sub(3);
        let mut key: String = id.chars().take(keep).collect();
        key.push_str("png");
        key
    }
}
