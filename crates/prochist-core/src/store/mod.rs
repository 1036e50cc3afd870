//! Metadata store adapters.
//!
//! A file's history lives in one text item of the file's key-value metadata.
//! [`MetadataStore`] is that attribute API on an open handle; the core never
//! opens or closes caller handles itself. [`StoreOpener`] is used only for
//! parent files given by path, which are opened read-only and dropped after
//! their history is read.
//!
//! # Items
//!
//! - [`HISTORY_ITEM`]: the JSON document as-is.
//! - [`HISTORY_ITEM_PACKED`]: the document packed (zlib + base64), used when the
//!   store has a size limit the plain text exceeds.
//!
//! Exactly one of them is present after a write.

mod memory;
mod sidecar;

use std::path::Path;

pub use memory::{MemoryCatalog, MemoryStore};
pub use sidecar::{Access, SIDECAR_SUFFIX, SidecarOpener, SidecarStore};

use crate::codec;
use crate::error::{Result, StoreError};

/// Metadata item holding the plain JSON history.
pub const HISTORY_ITEM: &str = "ProcessingHistory";
/// Metadata item holding the packed history.
pub const HISTORY_ITEM_PACKED: &str = "ProcessingHistory_Zipped";

/// Key-value text metadata of one open file.
pub trait MetadataStore {
    /// File name of the underlying file, recorded in new history.
    fn name(&self) -> Option<String>;

    fn get_item(&self, key: &str) -> std::result::Result<Option<String>, StoreError>;

    fn set_item(&mut self, key: &str, value: &str) -> std::result::Result<(), StoreError>;

    fn remove_item(&mut self, key: &str) -> std::result::Result<(), StoreError>;

    /// Largest item the underlying format can hold, in bytes.
    fn size_limit(&self) -> Option<usize> {
        None
    }

    /// Set `key` and remove `stale` as one update.
    ///
    /// The default runs the two steps in sequence; stores that can commit both
    /// at once override it.
    fn replace_item(
        &mut self,
        key: &str,
        value: &str,
        stale: &str,
    ) -> std::result::Result<(), StoreError> {
        self.set_item(key, value)?;
        self.remove_item(stale)
    }
}

/// Opens stores for parent files named by path.
pub trait StoreOpener {
    fn open(&self, path: &Path) -> std::result::Result<Box<dyn MetadataStore>, StoreError>;
}

/// Read the stored history text, unpacking it if needed.
///
/// `Ok(None)` means no history was ever written.
pub fn read_raw(store: &dyn MetadataStore) -> Result<Option<String>> {
    if let Some(text) = store.get_item(HISTORY_ITEM)? {
        return Ok(Some(text));
    }
    match store.get_item(HISTORY_ITEM_PACKED)? {
        Some(packed) => Ok(Some(codec::unpack(&packed)?)),
        None => Ok(None),
    }
}

/// Replace the stored history text.
///
/// Text larger than the store's limit is packed; packed text still over the
/// limit fails with [`StoreError::TooLarge`] and leaves the store untouched.
pub fn write_raw(store: &mut dyn MetadataStore, text: &str) -> Result<()> {
    let Some(limit) = store.size_limit().filter(|limit| text.len() > *limit) else {
        store.replace_item(HISTORY_ITEM, text, HISTORY_ITEM_PACKED)?;
        return Ok(());
    };

    let packed = codec::pack(text).map_err(|source| StoreError::Write {
        path: store.name().unwrap_or_default().into(),
        source,
    })?;
    if packed.len() > limit {
        return Err(StoreError::TooLarge {
            size: packed.len(),
            limit,
        }
        .into());
    }

    tracing::debug!(plain = text.len(), packed = packed.len(), limit, "storing packed history");
    store.replace_item(HISTORY_ITEM_PACKED, &packed, HISTORY_ITEM)?;
    Ok(())
}
