//! `packsmith list`.

use std::io::Write;

use anyhow::Context;

use packsmith_core::ManifestStore;

pub(crate) fn list_manifest(store: &ManifestStore) -> anyhow::Result<()> {
    let raw = store.read_raw()?;
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(raw.as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write manifest to stdout")
}
