//! Converging the install roots to the declared [`PluginSet`].
//!
//! Each group is handled the same way, start before opt:
//!
//! 1. **Garbage collection.** Every entry of the group root whose name is
//!    not the directory name of a declared plugin is deleted.
//! 2. **Installation.** The root is listed again; every declared plugin
//!    whose directory is missing is downloaded into `<root>/<name>.zip`,
//!    extracted to `<root>/<name>`, and the archive is deleted.
//!
//! Planning ([`plan_group`]) is a pure function of the declared plugins and
//! the observed entry names. [`Reconciler::sync`] executes the plan against
//! the filesystem and stops at the first error; nothing is rolled back.
//!
//! # Install state
//!
//! Because the temporary archive is only deleted after a successful
//! extraction, a leftover `<name>.zip` next to `<name>/` marks an
//! interrupted install ([`InstallState::Partial`]). Partial installs are
//! reported and skipped unless [`SyncOptions::repair`] is set, in which case
//! they are deleted and installed again.

use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::archive::extract_archive;
use crate::dirs::PackLayout;
use crate::error::{PackError, PackResult};
use crate::fetch::ArchiveFetcher;
use crate::plugin::{Group, Plugin, PluginSet};

/// Extension of the temporary archive written next to a plugin directory.
const ARCHIVE_SUFFIX: &str = ".zip";

/// Observed state of one declared plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    /// No entry with the plugin's directory name.
    Absent,
    /// The directory exists and no interrupted install is recorded.
    Present,
    /// The directory exists next to a leftover temporary archive.
    Partial,
}

impl InstallState {
    /// Classify `dir_name` against the entry names of its group root.
    #[must_use]
    pub fn classify(dir_name: &str, observed: &BTreeSet<OsString>) -> Self {
        if !observed.contains(OsStr::new(dir_name)) {
            Self::Absent
        } else if observed.contains(OsStr::new(&temp_archive_name(dir_name))) {
            Self::Partial
        } else {
            Self::Present
        }
    }
}

/// A declared plugin together with its observed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedInstall {
    /// The declaration.
    pub plugin: Plugin,
    /// State observed before garbage collection.
    pub state: InstallState,
}

impl PlannedInstall {
    /// Whether a sync with the given options downloads this plugin.
    #[must_use]
    pub fn needs_install(&self, options: SyncOptions) -> bool {
        match self.state {
            InstallState::Absent => true,
            InstallState::Partial => options.repair,
            InstallState::Present => false,
        }
    }
}

/// What a sync will do to one group root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    /// The group.
    pub group: Group,
    /// Entry names to delete, sorted. Names need not be valid UTF-8.
    pub removals: Vec<OsString>,
    /// Every declared plugin of the group, in manifest order.
    pub installs: Vec<PlannedInstall>,
}

/// Compute the plan for one group.
///
/// `observed` holds the entry names currently in the group root.
/// `declared` is expected to have passed [`PluginSet::validate`].
#[must_use]
pub fn plan_group(group: Group, declared: &[Plugin], observed: &BTreeSet<OsString>) -> GroupPlan {
    let expected: BTreeSet<&str> = declared.iter().map(Plugin::dir_name).collect();

    let removals = observed
        .iter()
        .filter(|name| !name.to_str().is_some_and(|n| expected.contains(n)))
        .cloned()
        .collect();

    let installs = declared
        .iter()
        .map(|plugin| PlannedInstall {
            state: InstallState::classify(plugin.dir_name(), observed),
            plugin: plugin.clone(),
        })
        .collect();

    GroupPlan {
        group,
        removals,
        installs,
    }
}

/// Sync behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Delete and reinstall plugins left partially extracted by an
    /// interrupted sync.
    pub repair: bool,
}

/// The two passes of a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Garbage collection.
    Gc,
    /// Installation.
    Install,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gc => "gc",
            Self::Install => "install",
        })
    }
}

/// Progress emitted while a sync runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A phase began.
    PhaseStarted(SyncPhase),
    /// A phase completed.
    PhaseFinished(SyncPhase),
    /// An undeclared entry was deleted.
    Removed {
        /// Group root it was removed from.
        group: Group,
        /// Entry name.
        name: String,
    },
    /// A plugin was downloaded and extracted.
    Installed {
        /// Group root it was installed into.
        group: Group,
        /// Directory name.
        name: String,
    },
    /// A declared plugin was already installed and left untouched.
    Skipped {
        /// Group root.
        group: Group,
        /// Directory name.
        name: String,
    },
    /// A plugin directory was found from an interrupted install.
    Incomplete {
        /// Group root.
        group: Group,
        /// Directory name.
        name: String,
        /// Whether it is being reinstalled in this sync.
        repairing: bool,
    },
}

/// Receives [`SyncEvent`]s as they happen.
///
/// Events arrive before the next filesystem action, so a reporter has
/// seen everything that was done even when the sync later fails.
pub trait SyncReporter {
    /// Handle one event.
    fn report(&mut self, event: &SyncEvent);
}

impl SyncReporter for Vec<SyncEvent> {
    fn report(&mut self, event: &SyncEvent) {
        self.push(event.clone());
    }
}

/// Everything a completed sync did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// All events, in order.
    pub events: Vec<SyncEvent>,
}

impl SyncReport {
    /// `(group, name)` of every removed entry.
    #[must_use]
    pub fn removed(&self) -> Vec<(Group, &str)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SyncEvent::Removed { group, name } => Some((*group, name.as_str())),
                _ => None,
            })
            .collect()
    }

    /// `(group, name)` of every installed plugin.
    #[must_use]
    pub fn installed(&self) -> Vec<(Group, &str)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SyncEvent::Installed { group, name } => Some((*group, name.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Whether the sync touched the filesystem at all.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.events.iter().all(|e| {
            matches!(
                e,
                SyncEvent::PhaseStarted(_)
                    | SyncEvent::PhaseFinished(_)
                    | SyncEvent::Skipped { .. }
                    | SyncEvent::Incomplete {
                        repairing: false,
                        ..
                    }
            )
        })
    }
}

/// Executes sync plans against a [`PackLayout`].
pub struct Reconciler<'a> {
    layout: &'a PackLayout,
    fetcher: &'a dyn ArchiveFetcher,
    options: SyncOptions,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler with default options.
    #[must_use]
    pub fn new(layout: &'a PackLayout, fetcher: &'a dyn ArchiveFetcher) -> Self {
        Self {
            layout,
            fetcher,
            options: SyncOptions::default(),
        }
    }

    /// Replace the sync options.
    #[must_use]
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Compute the plans for both groups without changing anything.
    ///
    /// A missing group root is treated as empty.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidRepository`] for a declaration that does
    /// not name a single directory, or an error if an existing root cannot be
    /// listed.
    pub fn plan(&self, plugins: &PluginSet) -> PackResult<Vec<GroupPlan>> {
        plugins.validate()?;
        Group::ALL
            .iter()
            .map(|&group| -> PackResult<GroupPlan> {
                let root = self.layout.group_root(group);
                let observed = match list_entries(&root) {
                    Err(PackError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                        BTreeSet::new()
                    },
                    other => other?,
                };
                Ok(plan_group(group, plugins.group(group), &observed))
            })
            .collect()
    }

    /// Converge both group roots to `plugins`.
    ///
    /// # Errors
    ///
    /// Returns the first filesystem, network, or extraction error. Work done
    /// before the error is kept. Invalid declarations are rejected before any
    /// root is touched.
    pub fn sync(
        &self,
        plugins: &PluginSet,
        reporter: &mut dyn SyncReporter,
    ) -> PackResult<SyncReport> {
        plugins.validate()?;

        let mut report = SyncReport::default();
        let mut emit = |event: SyncEvent| {
            reporter.report(&event);
            report.events.push(event);
        };

        for group in Group::ALL {
            let root = self.layout.group_root(group);
            debug!(root = %root.display(), "Ensuring group root");
            fs::create_dir_all(&root).map_err(|e| PackError::io("failed to create", &root, e))?;
        }

        emit(SyncEvent::PhaseStarted(SyncPhase::Gc));
        let mut plans = Vec::with_capacity(Group::ALL.len());
        for group in Group::ALL {
            let root = self.layout.group_root(group);
            let plan = plan_group(group, plugins.group(group), &list_entries(&root)?);
            for name in &plan.removals {
                remove_entry(&root.join(name))?;
                let name = name.to_string_lossy();
                info!(group = %group, name = %name, "Removed undeclared entry");
                emit(SyncEvent::Removed {
                    group,
                    name: name.into_owned(),
                });
            }
            plans.push(plan);
        }
        emit(SyncEvent::PhaseFinished(SyncPhase::Gc));

        emit(SyncEvent::PhaseStarted(SyncPhase::Install));
        for plan in &plans {
            let root = self.layout.group_root(plan.group);
            let mut current = list_entries(&root)?;

            for planned in &plan.installs {
                let name = planned.plugin.dir_name();

                if planned.state == InstallState::Partial {
                    warn!(
                        group = %plan.group,
                        name,
                        repair = self.options.repair,
                        "Plugin directory is left over from an interrupted install"
                    );
                    emit(SyncEvent::Incomplete {
                        group: plan.group,
                        name: name.to_string(),
                        repairing: self.options.repair,
                    });
                    if !self.options.repair {
                        continue;
                    }
                    remove_entry(&root.join(name))?;
                    current.remove(OsStr::new(name));
                }

                if current.contains(OsStr::new(name)) {
                    debug!(group = %plan.group, name, "Already installed");
                    emit(SyncEvent::Skipped {
                        group: plan.group,
                        name: name.to_string(),
                    });
                    continue;
                }

                self.install(&root, &planned.plugin)?;
                current.insert(OsString::from(name));
                emit(SyncEvent::Installed {
                    group: plan.group,
                    name: name.to_string(),
                });
            }
        }
        emit(SyncEvent::PhaseFinished(SyncPhase::Install));

        Ok(report)
    }

    /// Download and extract one plugin into `root`.
    fn install(&self, root: &Path, plugin: &Plugin) -> PackResult<()> {
        let name = plugin.dir_name();
        let archive_path = root.join(temp_archive_name(name));
        let dest = root.join(name);

        let bytes = self.fetcher.fetch(&plugin.source_url, &archive_path)?;
        let summary = extract_archive(&archive_path, &dest)?;
        fs::remove_file(&archive_path)
            .map_err(|e| PackError::io("failed to remove", &archive_path, e))?;

        info!(
            plugin = %plugin,
            dest = %dest.display(),
            bytes,
            files = summary.files,
            stripped = ?summary.stripped_prefix,
            "Installed plugin"
        );
        Ok(())
    }
}

/// Name of the temporary archive for plugin directory `dir_name`.
fn temp_archive_name(dir_name: &str) -> String {
    format!("{dir_name}{ARCHIVE_SUFFIX}")
}

/// Entry names directly under `root`, exactly as the filesystem reports them.
fn list_entries(root: &Path) -> PackResult<BTreeSet<OsString>> {
    let read_err = |e| PackError::io("failed to list", root, e);
    let mut names = BTreeSet::new();
    for entry in fs::read_dir(root).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        names.insert(entry.file_name());
    }
    Ok(names)
}

/// Delete a file, symlink, or directory tree.
fn remove_entry(path: &Path) -> PackResult<()> {
    debug!(path = %path.display(), "Removing entry");
    let metadata =
        fs::symlink_metadata(path).map_err(|e| PackError::io("failed to inspect", path, e))?;
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| PackError::io("failed to remove", path, e))
}
