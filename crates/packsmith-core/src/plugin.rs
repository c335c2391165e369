//! Declared plugin model: [`Plugin`], [`Group`] and [`PluginSet`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PackError;

/// The two package groups of the editor's native package layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    /// Loaded unconditionally at startup (`pack/*/start`).
    Start,
    /// Loaded on demand (`pack/*/opt`).
    Opt,
}

impl Group {
    /// Every group, in processing order.
    pub const ALL: [Self; 2] = [Self::Start, Self::Opt];

    /// Directory and manifest key for this group.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Opt => "opt",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" | "eager" => Ok(Self::Start),
            "opt" | "optional" => Ok(Self::Opt),
            other => Err(PackError::InvalidGroup(other.to_string())),
        }
    }
}

/// A declared plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    /// `owner/name` identifier, unique within its group.
    #[serde(alias = "repo")]
    pub repository: String,
    /// Address of a downloadable archive.
    #[serde(rename = "sourceURL", alias = "url")]
    pub source_url: String,
    /// Informational label; never compared or resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Plugin {
    /// Create a plugin declaration.
    #[must_use]
    pub fn new(
        repository: impl Into<String>,
        source_url: impl Into<String>,
        version: Option<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            source_url: source_url.into(),
            version,
        }
    }

    /// Name of the directory this plugin is installed into.
    ///
    /// The last non-empty segment of `repository` (`owner/repo` → `repo`).
    /// This is the join key between the manifest and the install roots.
    #[must_use]
    pub fn dir_name(&self) -> &str {
        self.repository
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(&self.repository)
    }

    /// Check that [`Plugin::dir_name`] names a single entry inside a group
    /// root.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidRepository`] for an empty name, `.` or
    /// `..`, or a name containing a path separator or NUL.
    pub fn validate(&self) -> Result<(), PackError> {
        let invalid = |reason| PackError::InvalidRepository {
            repository: self.repository.clone(),
            reason,
        };
        match self.dir_name() {
            "" => Err(invalid("directory name is empty")),
            "." | ".." => Err(invalid("directory name must not be '.' or '..'")),
            name if name.contains(['/', '\\', '\0']) => {
                Err(invalid("directory name must not contain separators or NUL"))
            },
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{v}", self.repository),
            None => f.write_str(&self.repository),
        }
    }
}

/// The full declared state: one ordered list per [`Group`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSet {
    /// Eager plugins.
    #[serde(default)]
    pub start: Vec<Plugin>,
    /// Optional plugins.
    #[serde(default)]
    pub opt: Vec<Plugin>,
}

impl PluginSet {
    /// Plugins declared in `group`.
    #[must_use]
    pub fn group(&self, group: Group) -> &[Plugin] {
        match group {
            Group::Start => &self.start,
            Group::Opt => &self.opt,
        }
    }

    fn group_mut(&mut self, group: Group) -> &mut Vec<Plugin> {
        match group {
            Group::Start => &mut self.start,
            Group::Opt => &mut self.opt,
        }
    }

    /// Whether `group` declares `repository`.
    #[must_use]
    pub fn contains(&self, group: Group, repository: &str) -> bool {
        self.group(group).iter().any(|p| p.repository == repository)
    }

    /// Append `plugin` to `group`.
    ///
    /// Returns `false` without modifying the set when the group already
    /// declares the same repository.
    pub fn add(&mut self, group: Group, plugin: Plugin) -> bool {
        if self.contains(group, &plugin.repository) {
            return false;
        }
        self.group_mut(group).push(plugin);
        true
    }

    /// Remove the plugin whose repository exactly matches `repository`.
    pub fn remove(&mut self, group: Group, repository: &str) -> Option<Plugin> {
        let plugins = self.group_mut(group);
        let index = plugins.iter().position(|p| p.repository == repository)?;
        Some(plugins.remove(index))
    }

    /// Validate every declared plugin.
    ///
    /// # Errors
    ///
    /// Returns the first [`PackError::InvalidRepository`] found, start group
    /// first.
    pub fn validate(&self) -> Result<(), PackError> {
        self.start.iter().chain(&self.opt).try_for_each(Plugin::validate)
    }

    /// Stable sort of both groups by repository.
    pub fn sort(&mut self) {
        self.start.sort_by(|a, b| a.repository.cmp(&b.repository));
        self.opt.sort_by(|a, b| a.repository.cmp(&b.repository));
    }

    /// Total number of declared plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.start.len().saturating_add(self.opt.len())
    }

    /// Whether no plugin is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.opt.is_empty()
    }
}
