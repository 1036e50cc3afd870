//! In-memory metadata stores.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use super::{MetadataStore, StoreOpener};
use crate::error::StoreError;

/// Metadata items held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    name: Option<String>,
    items: IndexMap<String, String>,
    read_only: bool,
    size_limit: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store standing in for the file called `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_size_limit(mut self, limit: usize) -> Self {
        self.size_limit = Some(limit);
        self
    }

    /// Reject every write from now on.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Direct view of one item, bypassing history decoding.
    pub fn item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly(
                self.name.clone().unwrap_or_else(|| "memory store".to_string()),
            ));
        }
        Ok(())
    }
}

impl MetadataStore for MemoryStore {
    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.items.shift_remove(key);
        Ok(())
    }

    fn size_limit(&self) -> Option<usize> {
        self.size_limit
    }
}

/// A set of in-memory stores addressed by path.
///
/// Opening hands out a read-only snapshot, so later writes to the catalog do
/// not reach a store already handed to a reader.
#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    stores: HashMap<PathBuf, MemoryStore>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty store for `path`, named after its file name.
    pub fn create(&mut self, path: impl AsRef<Path>) -> &mut MemoryStore {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let slot = self.stores.entry(path.to_path_buf()).or_default();
        *slot = MemoryStore::named(name);
        slot
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, store: MemoryStore) {
        self.stores.insert(path.into(), store);
    }

    /// Take a store out, e.g. to write to it while the catalog serves parents.
    pub fn remove(&mut self, path: impl AsRef<Path>) -> Option<MemoryStore> {
        self.stores.remove(path.as_ref())
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&MemoryStore> {
        self.stores.get(path.as_ref())
    }

    pub fn get_mut(&mut self, path: impl AsRef<Path>) -> Option<&mut MemoryStore> {
        self.stores.get_mut(path.as_ref())
    }
}

impl StoreOpener for MemoryCatalog {
    fn open(&self, path: &Path) -> Result<Box<dyn MetadataStore>, StoreError> {
        let store = self
            .stores
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))?;
        Ok(Box::new(store.clone().read_only()))
    }
}
