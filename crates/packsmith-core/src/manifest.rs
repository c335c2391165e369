//! The plugin manifest: the declarative YAML file listing desired plugins.
//!
//! # Format
//!
//! ```yaml
//! schemaVersion: 1
//! start:
//!   - repository: owner/repo1
//!     sourceURL: https://github.com/owner/repo1/archive/refs/tags/v1.0.0.zip
//!     version: v1.0.0
//! opt:
//!   - repository: owner/repo3
//!     sourceURL: https://github.com/owner/repo3/archive/refs/heads/main.zip
//! ```
//!
//! Documents without `schemaVersion` are schema 0, whose entries use `repo`
//! and `url`. They load transparently and are rewritten as the current schema
//! on the next save.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PackError, PackResult};
use crate::plugin::PluginSet;

/// Current manifest schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Standard manifest file name.
pub const MANIFEST_FILE_NAME: &str = "packsmith_plugins.yml";

const HEADER: &str = "# Managed by packsmith. Groups are kept sorted by repository.\n";

/// On-disk document shape.
#[derive(Debug, Serialize, Deserialize)]
struct ManifestDocument {
    #[serde(rename = "schemaVersion", default)]
    schema_version: u32,
    #[serde(flatten)]
    plugins: PluginSet,
}

/// Reads and writes the manifest at a fixed path.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    /// Create a store for the manifest at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the manifest file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the declared plugins, treating a missing file as an empty set.
    ///
    /// Reads and handles `NotFound` instead of checking `exists()` first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(&self) -> PackResult<PluginSet> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => self.parse_content(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No manifest found, using empty plugin set");
                Ok(PluginSet::default())
            },
            Err(e) => Err(self.error(format!("failed to read manifest: {e}"))),
        }
    }

    /// Return the manifest text exactly as stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unreadable.
    pub fn read_raw(&self) -> PackResult<String> {
        std::fs::read_to_string(&self.path)
            .map_err(|e| self.error(format!("failed to read manifest: {e}")))
    }

    fn parse_content(&self, content: &str) -> PackResult<PluginSet> {
        // An empty (or comment-only) document deserializes to YAML null.
        let value: serde_yaml::Value = serde_yaml::from_str(content)
            .map_err(|e| self.error(format!("failed to parse manifest: {e}")))?;
        if value.is_null() {
            return Ok(PluginSet::default());
        }

        let document: ManifestDocument = serde_yaml::from_value(value)
            .map_err(|e| self.error(format!("failed to parse manifest: {e}")))?;

        if document.schema_version > SCHEMA_VERSION {
            warn!(
                path = %self.path.display(),
                found = document.schema_version,
                expected = SCHEMA_VERSION,
                "Manifest schema is newer than supported, attempting best-effort load"
            );
        } else if document.schema_version < SCHEMA_VERSION {
            debug!(
                path = %self.path.display(),
                found = document.schema_version,
                "Upgrading legacy manifest schema in memory"
            );
        }

        debug!(
            path = %self.path.display(),
            start = document.plugins.start.len(),
            opt = document.plugins.opt.len(),
            "Loaded plugin manifest"
        );

        Ok(document.plugins)
    }

    /// Sort both groups by repository and atomically replace the manifest.
    ///
    /// Writes to a temporary file in the same directory, syncs it, then
    /// renames it over the destination. Creates parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be serialized or written.
    pub fn save(&self, plugins: &mut PluginSet) -> PackResult<()> {
        plugins.sort();

        let document = ManifestDocument {
            schema_version: SCHEMA_VERSION,
            plugins: plugins.clone(),
        };
        let body = serde_yaml::to_string(&document)
            .map_err(|e| self.error(format!("failed to serialize manifest: {e}")))?;
        let content = format!("{HEADER}{body}");

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)
            .map_err(|e| self.error(format!("failed to create parent directory: {e}")))?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| self.error(format!("failed to create temp file: {e}")))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| self.error(format!("failed to write temp manifest: {e}")))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| self.error(format!("failed to sync temp manifest: {e}")))?;
        tmp.persist(&self.path)
            .map_err(|e| self.error(format!("failed to replace manifest: {e}")))?;

        debug!(path = %self.path.display(), plugins = plugins.len(), "Saved plugin manifest");
        Ok(())
    }

    fn error(&self, message: String) -> PackError {
        PackError::Manifest {
            path: self.path.clone(),
            message,
        }
    }
}
