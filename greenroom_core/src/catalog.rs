//! The metadata catalog: one JSON document holding every asset record.
//!
//! The document is read into memory once and written through whole on every
//! mutation (last-writer-wins at the file level). Mutations run under a lock
//! so that a read-modify-write sequence cannot interleave with another one in
//! the same process.

use crate::error::Result;
use crate::record::AssetRecord;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The persisted document: all asset records, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Asset records in insertion order, most recently saved first.
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
}

/// Reads and writes the catalog document, serializing mutations.
#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    doc: Mutex<Document>,
}

impl Catalog {
    /// Open the catalog at the given file path.
    ///
    /// Persists an empty document if none exists yet, so a fresh store root
    /// is immediately readable.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let doc = if path.exists() {
            let bytes = fs::read(&path)?;
            serde_json::from_slice(&bytes)?
        } else {
            let doc = Document::default();
            Self::persist(&path, &doc)?;
            doc
        };

        debug!(path = %path.display(), records = doc.assets.len(), "catalog opened");
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    /// A point-in-time copy of the current document.
    pub fn snapshot(&self) -> Document {
        self.doc.lock().clone()
    }

    /// Run a read-modify-write sequence under the catalog lock.
    ///
    /// The closure mutates a working copy. On success the whole document is
    /// persisted and the copy published; on error the copy is discarded and
    /// the current document stays as it was, in memory and on disk.
    pub fn with_doc<T>(&self, f: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let mut guard = self.doc.lock();
        let mut working = guard.clone();
        let value = f(&mut working)?;
        Self::persist(&self.path, &working)?;
        *guard = working;
        Ok(value)
    }

    /// Path of the catalog file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole document atomically: temp file in the same directory,
    /// then rename over the target.
    fn persist(path: &Path, doc: &Document) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(doc)?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
        temp_file.write_all(&bytes)?;
        temp_file.flush()?;
        temp_file.persist(path)?;

        debug!(path = %path.display(), bytes = bytes.len(), "catalog persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_empty_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");

        let catalog = Catalog::open(&path).unwrap();
        assert!(path.exists());
        assert!(catalog.snapshot().assets.is_empty());

        let on_disk: Document = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk, Document::default());
    }

    #[test]
    fn test_with_doc_persists_and_publishes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        let catalog = Catalog::open(&path).unwrap();

        let count = catalog
            .with_doc(|doc| {
                doc.assets
                    .insert(0, AssetRecord::new().with("id", "a.png"));
                Ok(doc.assets.len())
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(catalog.snapshot().assets.len(), 1);

        // And the change survives a reopen at the path the catalog reports.
        let catalog_path = catalog.path().to_path_buf();
        assert_eq!(catalog_path, path);
        drop(catalog);
        let reopened = Catalog::open(catalog_path).unwrap();
        assert_eq!(reopened.snapshot().assets.len(), 1);
        assert_eq!(reopened.snapshot().assets[0].id(), Some("a.png"));
    }

    #[test]
    fn test_with_doc_error_discards_changes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        let catalog = Catalog::open(&path).unwrap();
        catalog
            .with_doc(|doc| {
                doc.assets.insert(0, AssetRecord::new().with("id", "keep.png"));
                Ok(())
            })
            .unwrap();

        let result: Result<()> = catalog.with_doc(|doc| {
            doc.assets.clear();
            Err(Error::asset_not_found("whatever"))
        });
        assert!(result.is_err());

        // The failed mutation left nothing behind.
        assert_eq!(catalog.snapshot().assets.len(), 1);
        let on_disk: Document = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.assets.len(), 1);
    }

    #[test]
    fn test_open_rejects_malformed_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        fs::write(&path, b"{ not json").unwrap();

        let result = Catalog::open(&path);
        assert!(matches!(result, Err(Error::Document { .. })));
    }

    #[test]
    fn test_open_tolerates_missing_assets_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        fs::write(&path, b"{}").unwrap();

        let catalog = Catalog::open(&path).unwrap();
        assert!(catalog.snapshot().assets.is_empty());
    }
}
