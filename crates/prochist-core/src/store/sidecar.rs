//! Metadata kept in a JSON sidecar next to the data file.
//!
//! `dem.img` keeps its items in `dem.img.aux.json`, a flat object of
//! item name → text. The data file itself is never modified, but it must
//! exist: a sidecar without its file is not a store.
//!
//! Writes go to a temporary file in the same directory that is then renamed
//! over the sidecar, so a reader sees either the old items or the new ones.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tempfile::NamedTempFile;

use super::{MetadataStore, StoreOpener};
use crate::config::HistoryConfig;
use crate::error::StoreError;

/// Appended to the data file name to get the sidecar name.
pub const SIDECAR_SUFFIX: &str = ".aux.json";

/// How a [`SidecarStore`] is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    Update,
}

/// Metadata items of one data file, backed by its sidecar.
#[derive(Debug)]
pub struct SidecarStore {
    path: PathBuf,
    sidecar: PathBuf,
    access: Access,
    items: IndexMap<String, String>,
    size_limit: Option<usize>,
}

impl SidecarStore {
    /// Open the store of the data file at `path`.
    pub fn open(path: impl AsRef<Path>, access: Access) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(StoreError::Open {
                path: path.to_path_buf(),
                source: std::io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
            });
        }

        let sidecar = sidecar_path(path);
        let items = load(&sidecar)?;
        tracing::debug!(path = %path.display(), items = items.len(), ?access, "opened sidecar store");

        Ok(Self {
            path: path.to_path_buf(),
            sidecar,
            access,
            items,
            size_limit: None,
        })
    }

    /// Open the store of `path` with the item size limit from `config`.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        access: Access,
        config: &HistoryConfig,
    ) -> Result<Self, StoreError> {
        Ok(Self::open(path, access)?.with_size_limit(config.size_limit))
    }

    /// Emulate a format that caps the size of one metadata item.
    pub fn with_size_limit(mut self, limit: Option<usize>) -> Self {
        self.size_limit = limit;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sidecar_path(&self) -> &Path {
        &self.sidecar
    }

    pub fn access(&self) -> Access {
        self.access
    }

    fn commit(&mut self, items: IndexMap<String, String>) -> Result<(), StoreError> {
        if self.access == Access::ReadOnly {
            return Err(StoreError::ReadOnly(self.path.display().to_string()));
        }

        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.sidecar.clone(),
            source,
        };

        let dir = self
            .sidecar
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        serde_json::to_writer_pretty(&mut tmp, &items).map_err(|e| write_err(e.into()))?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.sidecar).map_err(|e| write_err(e.error))?;

        self.items = items;
        Ok(())
    }
}

impl MetadataStore for SidecarStore {
    fn name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut items = self.items.clone();
        items.insert(key.to_string(), value.to_string());
        self.commit(items)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        if !self.items.contains_key(key) {
            return Ok(());
        }
        let mut items = self.items.clone();
        items.shift_remove(key);
        self.commit(items)
    }

    fn size_limit(&self) -> Option<usize> {
        self.size_limit
    }

    fn replace_item(&mut self, key: &str, value: &str, stale: &str) -> Result<(), StoreError> {
        let mut items = self.items.clone();
        items.shift_remove(stale);
        items.insert(key.to_string(), value.to_string());
        self.commit(items)
    }
}

/// Opens parent files' sidecars read-only.
#[derive(Clone, Copy, Debug, Default)]
pub struct SidecarOpener;

impl StoreOpener for SidecarOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn MetadataStore>, StoreError> {
        Ok(Box::new(SidecarStore::open(path, Access::ReadOnly)?))
    }
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

fn load(sidecar: &Path) -> Result<IndexMap<String, String>, StoreError> {
    match fs::read_to_string(sidecar) {
        Ok(text) => serde_json::from_str(&text).map_err(|e| StoreError::Corrupt {
            path: sidecar.to_path_buf(),
            reason: e.to_string(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(IndexMap::new()),
        Err(source) => Err(StoreError::Read {
            path: sidecar.to_path_buf(),
            source,
        }),
    }
}
