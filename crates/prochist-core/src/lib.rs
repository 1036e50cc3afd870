//! Processing history for derived data files.
//!
//! Every time a file is produced, [`write_history`] stores a [`LineageNode`]
//! in the file's metadata: the automatic facts of the producing process, the
//! caller's own fields, and a full copy of each input file's history. Reading
//! a file therefore shows its whole lineage, even after the inputs are gone.
//!
//! # Flow
//!
//! ```text
//! write:  UserFields + ParentSource* ──RecordBuilder──▶ LineageNode
//!                                                        │ codec::serialize
//!                                                        ▼
//!                                          MetadataStore["ProcessingHistory"]
//!
//! view:   MetadataStore ──read_history──▶ LineageNode ──navigate(path)──▶ View
//! ```
//!
//! # Example
//!
//! ```no_run
//! use prochist_core::{
//!     Access, HistoryConfig, RecordBuilder, SidecarOpener, SidecarStore, SystemFacts, UserFields,
//!     write_history,
//! };
//!
//! # fn main() -> prochist_core::Result<()> {
//! let config = HistoryConfig::from_env();
//! let facts = SystemFacts::new();
//! let builder = RecordBuilder::new(&facts, &SidecarOpener).with_config(&config);
//!
//! let mut dem = SidecarStore::open_with_config("dem.img", Access::Update, &config)?;
//! let fields = UserFields::new()
//!     .with("DESCRIPTION", "Elevation above sea level")
//!     .with("UNITS", "Metres");
//! write_history(&builder, &fields, &[], &mut dem)?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod codec;
pub mod config;
pub mod error;
pub mod facts;
mod finite;
pub mod history;
mod legacy;
pub mod navigator;
pub mod store;

pub use builder::{FieldSelection, ParentSource, RecordBuilder, UserFields};
pub use config::HistoryConfig;
pub use error::{HistoryError, ParseError, Result, StoreError};
pub use facts::{FactProvider, StaticFacts, SystemFacts};
pub use history::{has_history, read_history, read_history_or_empty, write_history};
pub use navigator::{ParentSummary, View, ViewMode, find_by_name, navigate, resolve};
pub use store::{
    Access, MemoryCatalog, MemoryStore, MetadataStore, SidecarOpener, SidecarStore, StoreOpener,
};

pub use prochist_types::{Fields, LineageNode, MAX_LINEAGE_DEPTH, MAX_VALUE_NESTING, NodePath, keys};
