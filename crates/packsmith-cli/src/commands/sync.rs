//! `packsmith sync`.

use std::path::PathBuf;

use anyhow::Context;
use tracing::{debug, info};

use packsmith_core::{
    GroupPlan, HttpFetcher, InstallState, ManifestStore, PackLayout, Reconciler, SyncEvent,
    SyncOptions, SyncPhase, SyncReporter, editor_from_env, query_pack_layout,
};

use crate::theme::{ITEM_INDENT, Theme};

/// Flags of the `sync` subcommand.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SyncArgs {
    pub(crate) repair: bool,
    pub(crate) dry_run: bool,
}

pub(crate) fn sync_plugins(
    store: &ManifestStore,
    pack_dir: Option<PathBuf>,
    args: SyncArgs,
) -> anyhow::Result<()> {
    let plugins = store
        .load_or_default()
        .context("failed to load plugin manifest")?;
    let layout = resolve_layout(pack_dir)?;
    debug!(root = %layout.root().display(), plugins = plugins.len(), "Starting sync");

    let fetcher = HttpFetcher::new()?;
    let options = SyncOptions {
        repair: args.repair,
    };
    let reconciler = Reconciler::new(&layout, &fetcher).with_options(options);

    if args.dry_run {
        let plans = reconciler.plan(&plugins)?;
        for line in plan_lines(&plans, options) {
            println!("{line}");
        }
        return Ok(());
    }

    let report = reconciler.sync(&plugins, &mut ConsoleReporter)?;
    info!(
        removed = report.removed().len(),
        installed = report.installed().len(),
        "Sync complete"
    );
    Ok(())
}

/// `--pack-dir` if given, otherwise ask the editor.
fn resolve_layout(pack_dir: Option<PathBuf>) -> anyhow::Result<PackLayout> {
    if let Some(dir) = pack_dir {
        return Ok(PackLayout::from_root(dir));
    }
    let editor = editor_from_env();
    query_pack_layout(&editor).context("failed to locate the editor package directory")
}

/// Prints sync progress to stdout as it happens.
struct ConsoleReporter;

impl SyncReporter for ConsoleReporter {
    fn report(&mut self, event: &SyncEvent) {
        if let Some(line) = event_line(event) {
            println!("{line}");
        }
    }
}

fn event_line(event: &SyncEvent) -> Option<String> {
    let line = match event {
        SyncEvent::PhaseStarted(phase) => Theme::phase(&format!("[start] {phase}")),
        SyncEvent::PhaseFinished(phase) => Theme::phase(&format!("[end  ] {phase}")),
        SyncEvent::Removed { name, .. } => {
            Theme::removal(&format!("{ITEM_INDENT}removed: {name}"))
        },
        SyncEvent::Installed { group, name } => {
            Theme::success(&format!("{ITEM_INDENT}installed to {group}: {name}"))
        },
        SyncEvent::Incomplete {
            name, repairing, ..
        } => {
            let suffix = if *repairing { " (reinstalling)" } else { "" };
            Theme::warning(&format!("{ITEM_INDENT}incomplete: {name}{suffix}"))
        },
        SyncEvent::Skipped { .. } => return None,
    };
    Some(line)
}

/// What a sync would do, one line per action.
fn plan_lines(plans: &[GroupPlan], options: SyncOptions) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(Theme::header("sync plan (dry run)"));

    lines.push(Theme::phase(&format!("[start] {}", SyncPhase::Gc)));
    for plan in plans {
        for name in &plan.removals {
            lines.push(Theme::removal(&format!(
                "{ITEM_INDENT}would remove from {}: {}",
                plan.group,
                name.to_string_lossy()
            )));
        }
    }
    lines.push(Theme::phase(&format!("[end  ] {}", SyncPhase::Gc)));

    lines.push(Theme::phase(&format!("[start] {}", SyncPhase::Install)));
    for plan in plans {
        for planned in &plan.installs {
            let name = planned.plugin.dir_name();
            if planned.state == InstallState::Partial && !options.repair {
                lines.push(Theme::warning(&format!(
                    "{ITEM_INDENT}incomplete: {name} (run with --repair to reinstall)"
                )));
            } else if planned.needs_install(options) {
                lines.push(Theme::success(&format!(
                    "{ITEM_INDENT}would install to {}: {name}",
                    plan.group
                )));
            }
        }
    }
    lines.push(Theme::phase(&format!("[end  ] {}", SyncPhase::Install)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::ffi::OsString;

    use packsmith_core::{Group, Plugin, plan_group};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn progress_lines() {
        plain();
        let line = |e: SyncEvent| event_line(&e).unwrap();

        assert_eq!(line(SyncEvent::PhaseStarted(SyncPhase::Gc)), "[start] gc");
        assert_eq!(
            line(SyncEvent::PhaseFinished(SyncPhase::Install)),
            "[end  ] install"
        );
        assert_eq!(
            line(SyncEvent::Removed {
                group: Group::Start,
                name: "bar".into()
            }),
            "        removed: bar"
        );
        assert_eq!(
            line(SyncEvent::Installed {
                group: Group::Opt,
                name: "foo".into()
            }),
            "        installed to opt: foo"
        );
        assert_eq!(
            line(SyncEvent::Incomplete {
                group: Group::Start,
                name: "foo".into(),
                repairing: false,
            }),
            "        incomplete: foo"
        );
        assert!(
            event_line(&SyncEvent::Skipped {
                group: Group::Start,
                name: "foo".into()
            })
            .is_none()
        );
    }

    #[test]
    fn dry_run_lists_pending_actions() {
        plain();
        let declared = [
            Plugin::new("acme/foo", "https://example.com/acme/foo/archive/main.zip", None),
            Plugin::new("acme/bar", "https://example.com/acme/bar/archive/main.zip", None),
        ];
        let observed: BTreeSet<OsString> = ["bar", "stale"].iter().map(OsString::from).collect();
        let plans = [plan_group(Group::Start, &declared, &observed)];

        let lines = plan_lines(&plans, SyncOptions::default());
        assert!(lines.contains(&"        would remove from start: stale".to_string()));
        assert!(lines.contains(&"        would install to start: foo".to_string()));
        assert!(!lines.iter().any(|l| l.ends_with(": bar")));
    }

    #[test]
    fn explicit_pack_dir_skips_editor() {
        let layout = resolve_layout(Some(PathBuf::from("/tmp/site/pack/packsmith"))).unwrap();
        assert_eq!(layout.group_root(Group::Opt), PathBuf::from("/tmp/site/pack/packsmith/opt"));
    }
}
