//! `packsmith rm <group> <repository>`.
//!
//! Only the manifest changes; the installed directory is collected by the
//! next `sync`.

use anyhow::Context;

use packsmith_core::{Group, ManifestStore};

use crate::theme::Theme;

pub(crate) fn remove_plugin(
    store: &ManifestStore,
    group: Group,
    repository: &str,
) -> anyhow::Result<()> {
    let mut plugins = store
        .load_or_default()
        .context("failed to load plugin manifest")?;

    let Some(removed) = plugins.remove(group, repository) else {
        println!("{}", Theme::dimmed("removed: nothing"));
        return Ok(());
    };

    store
        .save(&mut plugins)
        .with_context(|| format!("failed to save {}", store.path().display()))?;

    println!(
        "{}",
        Theme::removal(&format!("removed: {} ({group})", removed.repository))
    );
    Ok(())
}
