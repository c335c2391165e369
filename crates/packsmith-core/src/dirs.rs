//! Location of the manifest file and of the install roots.
//!
//! # Layout
//!
//! ```text
//! <packpath>/pack/packsmith/      (PackLayout::root)
//! ├── start/                      (eager plugins, one directory each)
//! │   └── <repo>/
//! └── opt/                        (optional plugins)
//!     └── <repo>/
//! ```

use std::path::{Path, PathBuf};

use crate::manifest::MANIFEST_FILE_NAME;
use crate::plugin::Group;

/// Environment variable naming the manifest file explicitly.
pub const MANIFEST_ENV: &str = "PACKSMITH_MANIFEST";

/// Environment variable naming the `pack/packsmith` directory explicitly.
pub const PACK_DIR_ENV: &str = "PACKSMITH_PACK_DIR";

/// Name of the package directory under `<packpath>/pack/`.
pub const PACK_NAME: &str = "packsmith";

/// Inputs to manifest location resolution.
///
/// Holding the inputs explicitly keeps [`resolve_manifest_path`] a pure
/// function; [`ManifestLookup::from_env`] fills it from the process.
#[derive(Debug, Clone, Default)]
pub struct ManifestLookup {
    /// Explicit manifest path (flag or [`MANIFEST_ENV`]).
    pub explicit: Option<PathBuf>,
    /// Value of `XDG_CONFIG_HOME`.
    pub xdg_config_home: Option<PathBuf>,
    /// Value of `LOCALAPPDATA` (consulted on Windows only).
    pub local_app_data: Option<PathBuf>,
    /// The user's home directory.
    pub home: Option<PathBuf>,
    /// Whether to follow Windows conventions.
    pub windows: bool,
}

impl ManifestLookup {
    /// Collect lookup inputs from the current process environment.
    #[must_use]
    pub fn from_env(explicit: Option<PathBuf>) -> Self {
        let var = |key: &str| {
            std::env::var_os(key)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            explicit: explicit.or_else(|| var(MANIFEST_ENV)),
            xdg_config_home: var("XDG_CONFIG_HOME"),
            local_app_data: var("LOCALAPPDATA"),
            home: directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()),
            windows: cfg!(windows),
        }
    }
}

/// Resolve where the manifest lives.
///
/// Order: explicit path, `$XDG_CONFIG_HOME/nvim/`, then `%LOCALAPPDATA%\nvim\`
/// on Windows or `~/.config/nvim/` elsewhere, and finally a bare relative
/// file name.
#[must_use]
pub fn resolve_manifest_path(lookup: &ManifestLookup) -> PathBuf {
    if let Some(explicit) = &lookup.explicit {
        return explicit.clone();
    }
    if let Some(xdg) = &lookup.xdg_config_home {
        return xdg.join("nvim").join(MANIFEST_FILE_NAME);
    }

    let fallback_root = if lookup.windows {
        lookup.local_app_data.clone()
    } else {
        lookup.home.as_ref().map(|h| h.join(".config"))
    };

    fallback_root.map_or_else(
        || PathBuf::from(MANIFEST_FILE_NAME),
        |root| root.join("nvim").join(MANIFEST_FILE_NAME),
    )
}

/// The `pack/packsmith` directory and its two group roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackLayout {
    root: PathBuf,
}

impl PackLayout {
    /// Use `root` directly as the `pack/packsmith` directory.
    #[must_use]
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Derive the layout from one entry of the editor's `packpath`.
    #[must_use]
    pub fn from_packpath(packpath_entry: &Path) -> Self {
        Self::from_root(packpath_entry.join("pack").join(PACK_NAME))
    }

    /// The `pack/packsmith` directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Install root for `group`.
    #[must_use]
    pub fn group_root(&self, group: Group) -> PathBuf {
        self.root.join(group.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let lookup = ManifestLookup {
            explicit: Some(PathBuf::from("/tmp/custom.yml")),
            xdg_config_home: Some(PathBuf::from("/xdg")),
            home: Some(PathBuf::from("/home/u")),
            ..Default::default()
        };
        assert_eq!(resolve_manifest_path(&lookup), PathBuf::from("/tmp/custom.yml"));
    }

    #[test]
    fn xdg_config_home_next() {
        let lookup = ManifestLookup {
            xdg_config_home: Some(PathBuf::from("/xdg")),
            home: Some(PathBuf::from("/home/u")),
            ..Default::default()
        };
        assert_eq!(
            resolve_manifest_path(&lookup),
            PathBuf::from("/xdg/nvim/packsmith_plugins.yml")
        );
    }

    #[test]
    fn home_config_on_unix() {
        let lookup = ManifestLookup {
            home: Some(PathBuf::from("/home/u")),
            local_app_data: Some(PathBuf::from("C:/ignored")),
            ..Default::default()
        };
        assert_eq!(
            resolve_manifest_path(&lookup),
            PathBuf::from("/home/u/.config/nvim/packsmith_plugins.yml")
        );
    }

    #[test]
    fn local_app_data_on_windows() {
        let lookup = ManifestLookup {
            local_app_data: Some(PathBuf::from("/appdata")),
            home: Some(PathBuf::from("/home/u")),
            windows: true,
            ..Default::default()
        };
        assert_eq!(
            resolve_manifest_path(&lookup),
            PathBuf::from("/appdata/nvim/packsmith_plugins.yml")
        );
    }

    #[test]
    fn bare_file_name_last() {
        assert_eq!(
            resolve_manifest_path(&ManifestLookup::default()),
            PathBuf::from(MANIFEST_FILE_NAME)
        );
        let windows_without_appdata = ManifestLookup {
            home: Some(PathBuf::from("/home/u")),
            windows: true,
            ..Default::default()
        };
        assert_eq!(
            resolve_manifest_path(&windows_without_appdata),
            PathBuf::from(MANIFEST_FILE_NAME)
        );
    }

    #[test]
    fn pack_layout_from_packpath() {
        let layout = PackLayout::from_packpath(Path::new("/home/u/.local/share/nvim/site"));
        assert_eq!(
            layout.root(),
            Path::new("/home/u/.local/share/nvim/site/pack/packsmith")
        );
        assert_eq!(
            layout.group_root(Group::Start),
            PathBuf::from("/home/u/.local/share/nvim/site/pack/packsmith/start")
        );
        assert_eq!(
            layout.group_root(Group::Opt),
            PathBuf::from("/home/u/.local/share/nvim/site/pack/packsmith/opt")
        );
    }
}
