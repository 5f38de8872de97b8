//! The asset store: metadata CRUD and payload coordination.

use crate::blobs::BlobStore;
use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::record::AssetRecord;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// Name of the catalog document inside a store root.
const CATALOG_FILE: &str = "catalog.json";

/// Name of the blob directory inside a store root.
const MEDIA_DIR: &str = "media";

/// An asset store rooted at one directory.
///
/// Layout:
/// - `catalog.json` holds the metadata document, newest record first
/// - `media/` holds payload blobs and companion thumbnails, one flat file
///   per asset, named by id
#[derive(Debug)]
pub struct AssetStore {
    root: PathBuf,
    catalog: Catalog,
    blobs: BlobStore,
    pending: Mutex<Vec<PendingWrite>>,
}

/// A payload write still running on a background thread.
#[derive(Debug)]
struct PendingWrite {
    id: String,
    handle: JoinHandle<Result<u64>>,
}

impl AssetStore {
    /// Open the store at the given root, creating the layout if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let blobs = BlobStore::open(root.join(MEDIA_DIR))?;
        let catalog = Catalog::open(root.join(CATALOG_FILE))?;

        debug!(root = %root.display(), "asset store opened");
        Ok(Self {
            root,
            catalog,
            blobs,
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Get the root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All records passing the filters, newest first.
    ///
    /// Filter semantics are the wildcard-friendly rule described on
    /// [`AssetRecord::matches`]: only a present, truthy, differing field
    /// excludes a record. Pass an empty map to list everything.
    pub fn list(&self, filters: &Map<String, Value>) -> Vec<AssetRecord> {
        let doc = self.catalog.snapshot();
        doc.assets
            .into_iter()
            .filter(|record| record.matches(filters))
            .collect()
    }

    /// The record with the given id.
    pub fn get(&self, id: &str) -> Result<AssetRecord> {
        let doc = self.catalog.snapshot();
        doc.assets
            .into_iter()
            .find(|record| record.id() == Some(id))
            .ok_or_else(|| Error::asset_not_found(id))
    }

    /// Position of the record with the given id, or `-1` when absent.
    ///
    /// Never fails. Because `-1` is non-zero, a guard that treats a falsy
    /// index as "not found" will not detect a miss; compare against `-1`
    /// explicitly.
    pub fn get_index(&self, id: &str) -> isize {
        let doc = self.catalog.snapshot();
        doc.assets
            .iter()
            .position(|record| record.id() == Some(id))
            .map(|index| index as isize)
            .unwrap_or(-1)
    }

    /// Whether the primary payload blob exists on disk.
    ///
    /// Metadata is not consulted: a record whose payload write is still
    /// pending reports `false`, and a stray blob without a record reports
    /// `true`.
    pub fn exists(&self, id: &str) -> bool {
        self.blobs.exists(id)
    }

    /// Raw bytes of the primary payload blob. Fails if the blob is absent.
    pub fn load(&self, id: &str) -> Result<Vec<u8>> {
        self.blobs.load(id)
    }

    /// Save a new asset: mint an id, commit the metadata record, then stream
    /// the payload in the background.
    ///
    /// The new id is `<generated>.<extension>` and replaces any `id` the
    /// caller put in `info`. The record is prepended to the catalog and
    /// persisted before this returns; the payload write runs on a background
    /// thread and is not guaranteed complete until [`flush`](Self::flush)
    /// returns. A failed payload write does not roll the record back.
    pub fn save<R>(&self, source: R, extension: &str, mut info: AssetRecord) -> Result<String>
    where
        R: Read + Send + 'static,
    {
        let id = format!("{}.{}", generate_id(), extension);
        info.set("id", id.clone());

        self.catalog.with_doc(move |doc| {
            doc.assets.insert(0, info);
            Ok(())
        })?;

        self.reap_finished();
        let blobs = self.blobs.clone();
        let write_id = id.clone();
        let handle = std::thread::spawn(move || blobs.write(&write_id, source));
        self.pending.lock().push(PendingWrite {
            id: id.clone(),
            handle,
        });

        debug!(id = %id, "asset saved, payload write pending");
        Ok(id)
    }

    /// Write the companion thumbnail for an asset id, synchronously.
    ///
    /// The thumbnail key comes from [`BlobStore::thumb_key`]; records whose
    /// `subtype` is `"char"` or `"video"` are expected to have one.
    pub fn save_thumbnail<R: Read>(&self, id: &str, source: R) -> Result<u64> {
        let key = BlobStore::thumb_key(id);
        let bytes = self.blobs.write(&key, source)?;
        debug!(id = %id, key = %key, bytes, "thumbnail written");
        Ok(bytes)
    }

    /// Shallow-merge `info` onto the record with the given id and persist.
    ///
    /// Fields absent from `info` keep their values. The record's `id` cannot
    /// change; an `id` field in `info` is ignored. The payload blob is
    /// untouched. Fails with `AssetNotFound` if no record matches.
    pub fn update(&self, id: &str, mut info: AssetRecord) -> Result<()> {
        info.remove("id");

        self.catalog.with_doc(move |doc| {
            let index = doc
                .assets
                .iter()
                .position(|record| record.id() == Some(id))
                .ok_or_else(|| Error::asset_not_found(id))?;
            doc.assets[index].merge(info);
            Ok(())
        })?;

        debug!(id = %id, "asset updated");
        Ok(())
    }

    /// Delete an asset: remove its record, persist the document, delete the
    /// primary blob, then maybe delete a thumbnail.
    ///
    /// The thumbnail step runs when the record **now occupying the removed
    /// record's position** has subtype `"char"` or `"video"`; the thumbnail
    /// key is still derived from the deleted id. The check reads the shifted
    /// slot, not the deleted record; downstream consumers depend on this
    /// exact sequencing. With no record left at that position the step is
    /// skipped. Fails with `AssetNotFound` if no record matches; a blob
    /// deletion failure surfaces after the record is already gone.
    pub fn delete(&self, id: &str) -> Result<()> {
        let cleanup_thumbnail = self.catalog.with_doc(|doc| {
            let index = doc
                .assets
                .iter()
                .position(|record| record.id() == Some(id))
                .ok_or_else(|| Error::asset_not_found(id))?;
            doc.assets.remove(index);

            // Read the slot after removal: whatever record shifted in
            // decides whether a thumbnail gets cleaned up.
            Ok(doc
                .assets
                .get(index)
                .is_some_and(|record| record.has_companion_thumbnail()))
        })?;

        self.blobs.delete(id)?;

        if cleanup_thumbnail {
            let thumb = BlobStore::thumb_key(id);
            self.blobs.delete(&thumb)?;
            debug!(id = %id, thumb = %thumb, "asset and thumbnail deleted");
        } else {
            debug!(id = %id, "asset deleted");
        }
        Ok(())
    }

    /// Wait for every payload write started by [`save`](Self::save).
    ///
    /// A successful return means all saved payloads are fully on disk.
    /// Returns the first write failure; later writes still run to completion
    /// before this returns, and their failures are logged.
    pub fn flush(&self) -> Result<()> {
        let pending: Vec<PendingWrite> = std::mem::take(&mut *self.pending.lock());
        let mut first_error = None;

        for write in pending {
            match write.handle.join() {
                Ok(Ok(bytes)) => debug!(id = %write.id, bytes, "payload write finished"),
                Ok(Err(err)) => {
                    warn!(id = %write.id, error = %err, "payload write failed");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(_) => {
                    warn!(id = %write.id, "payload writer panicked");
                    if first_error.is_none() {
                        first_error = Some(Error::Io {
                            source: std::io::Error::other("payload writer panicked"),
                        });
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Drop finished writer handles, logging any failures they carried.
    fn reap_finished(&self) {
        let mut pending = self.pending.lock();
        let mut still_running = Vec::new();

        for write in pending.drain(..) {
            if write.handle.is_finished() {
                match write.handle.join() {
                    Ok(Ok(bytes)) => debug!(id = %write.id, bytes, "payload write finished"),
                    Ok(Err(err)) => warn!(id = %write.id, error = %err, "payload write failed"),
                    Err(_) => warn!(id = %write.id, "payload writer panicked"),
                }
            } else {
                still_running.push(write);
            }
        }

        *pending = still_running;
    }
}

/// Mint the opaque part of a new asset id: 32 lowercase hex characters.
fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
