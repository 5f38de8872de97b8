//! # Greenroom Core
//!
//! A small media asset store: binary payloads on disk, one JSON catalog of
//! metadata records, and per-kind XML projection of records for a legacy
//! client.
//!
//! This library provides the storage and projection layer. Records are JSON
//! objects stored exactly as supplied; payloads live as flat files named by
//! asset id, with companion thumbnails derived from the id.
//!
//! ## Features
//!
//! - One-directory store layout: `catalog.json` plus a flat `media/` dir
//! - Wildcard-friendly record filtering (falsy stored values always match)
//! - Background payload writes with an explicit `flush` completion point
//! - Bit-exact XML fragments per asset kind for the consuming client
//! - Companion thumbnail naming derived from the asset id
//!
//! ## Example
//!
//! ```no_run
//! use greenroom_core::{AssetRecord, AssetStore, project};
//! use std::fs::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Open (or create) a store
//! let store = AssetStore::open("./my-assets")?;
//!
//! // Save a payload with its metadata; the id comes back immediately
//! let info = AssetRecord::new().with("type", "bg").with("title", "Sunset");
//! let id = store.save(File::open("./sunset.jpg")?, "jpg", info)?;
//!
//! // Wait until the payload is fully on disk
//! store.flush()?;
//!
//! // Render the record for the client
//! if let Some(xml) = project(&store.get(&id)?) {
//!     println!("{}", xml);
//! }
//! # Ok(())
//! # }
//! ```

mod blobs;
mod catalog;
mod error;
mod record;
mod store;
mod xml;

pub use blobs::BlobStore;
pub use catalog::{Catalog, Document};
pub use error::{Error, Result};
pub use record::{AssetKind, AssetRecord};
pub use store::AssetStore;
pub use xml::project;
