//! `packsmith add <group> <url>`.

use anyhow::Context;
use tracing::debug;

use packsmith_core::{Group, ManifestStore, plugin_from_url};

use crate::theme::Theme;

pub(crate) fn add_plugin(store: &ManifestStore, group: Group, url: &str) -> anyhow::Result<()> {
    let plugin = plugin_from_url(url)?;
    let repository = plugin.repository.clone();
    debug!(plugin = %plugin, group = %group, "Adding plugin");

    let mut plugins = store
        .load_or_default()
        .context("failed to load plugin manifest")?;

    if !plugins.add(group, plugin) {
        println!(
            "{}",
            Theme::warning(&format!("{repository} already exists in {group}"))
        );
        return Ok(());
    }

    store
        .save(&mut plugins)
        .with_context(|| format!("failed to save {}", store.path().display()))?;

    println!(
        "{}",
        Theme::success(&format!("added: {repository} ({group})"))
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://github.com/acme/foo/archive/refs/tags/v1.2.0.zip";

    #[test]
    fn adds_and_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(tmp.path().join("nested/plugins.yml"));

        add_plugin(&store, Group::Opt, URL).unwrap();

        let plugins = store.load_or_default().unwrap();
        let added = &plugins.group(Group::Opt)[0];
        assert_eq!(added.repository, "acme/foo");
        assert_eq!(added.version.as_deref(), Some("v1.2.0"));
        assert!(plugins.group(Group::Start).is_empty());
    }

    #[test]
    fn duplicate_leaves_file_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(tmp.path().join("plugins.yml"));
        add_plugin(&store, Group::Start, URL).unwrap();
        let before = store.read_raw().unwrap();

        add_plugin(
            &store,
            Group::Start,
            "https://github.com/acme/foo/archive/refs/heads/dev.zip",
        )
        .unwrap();

        assert_eq!(store.read_raw().unwrap(), before);
    }

    #[test]
    fn invalid_url_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(tmp.path().join("plugins.yml"));
        assert!(add_plugin(&store, Group::Start, "ftp://example.com/a/b.zip").is_err());
        assert!(!store.path().exists());
    }
}
