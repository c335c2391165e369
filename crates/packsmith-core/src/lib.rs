//! Engine of the packsmith plugin manager.
//!
//! packsmith keeps the editor's native package directories in line with a
//! YAML manifest. This crate holds everything except the command line:
//!
//! - [`Plugin`] / [`PluginSet`] / [`Group`]: the declared plugin model
//! - [`ManifestStore`]: loading and atomically saving the manifest
//! - [`plugin_from_url`]: deriving a declaration from an archive URL
//! - [`resolve_manifest_path`] / [`PackLayout`]: where things live on disk
//! - [`query_pack_layout`]: asking the editor for its `packpath`
//! - [`ArchiveFetcher`] / [`HttpFetcher`]: downloading archives
//! - [`extract_archive`]: zip extraction that strips a shared top-level directory
//! - [`Reconciler`]: garbage collection and installation for both groups
//!
//! # Example
//!
//! ```no_run
//! use packsmith_core::{HttpFetcher, ManifestStore, PackLayout, Reconciler};
//!
//! # fn main() -> packsmith_core::PackResult<()> {
//! let plugins = ManifestStore::new("packsmith_plugins.yml").load_or_default()?;
//! let layout = PackLayout::from_root("/tmp/site/pack/packsmith");
//! let fetcher = HttpFetcher::new()?;
//!
//! let mut events: Vec<packsmith_core::SyncEvent> = Vec::new();
//! let report = Reconciler::new(&layout, &fetcher).sync(&plugins, &mut events)?;
//! println!("installed {} plugins", report.installed().len());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod archive;
pub mod dirs;
pub mod editor;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod plugin;
pub mod reconcile;
pub mod source;

pub use archive::{ExtractSummary, extract_archive};
pub use dirs::{
    MANIFEST_ENV, ManifestLookup, PACK_DIR_ENV, PACK_NAME, PackLayout, resolve_manifest_path,
};
pub use editor::{DEFAULT_EDITOR, EDITOR_ENV, editor_from_env, query_pack_layout};
pub use error::{PackError, PackResult};
pub use fetch::{ArchiveFetcher, HttpFetcher};
pub use manifest::{MANIFEST_FILE_NAME, ManifestStore, SCHEMA_VERSION};
pub use plugin::{Group, Plugin, PluginSet};
pub use reconcile::{
    GroupPlan, InstallState, PlannedInstall, Reconciler, SyncEvent, SyncOptions, SyncPhase,
    SyncReport, SyncReporter, plan_group,
};
pub use source::plugin_from_url;
