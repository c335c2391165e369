//! Subcommand implementations.

pub(crate) mod add;
pub(crate) mod list;
pub(crate) mod remove;
pub(crate) mod sync;

pub(crate) use add::add_plugin;
pub(crate) use list::list_manifest;
pub(crate) use remove::remove_plugin;
pub(crate) use sync::{SyncArgs, sync_plugins};
