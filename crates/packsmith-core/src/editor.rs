//! Asking the host editor where its packages live.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::dirs::PackLayout;
use crate::error::{PackError, PackResult};

/// Environment variable overriding the editor binary.
pub const EDITOR_ENV: &str = "PACKSMITH_EDITOR";

/// Editor binary used when [`EDITOR_ENV`] is unset.
pub const DEFAULT_EDITOR: &str = "nvim";

/// Lua snippet printing the editor's `packpath` option to stdout.
const PACKPATH_QUERY: &str = "lua io.stdout:write(vim.o.packpath)";

/// Editor binary from [`EDITOR_ENV`], falling back to [`DEFAULT_EDITOR`].
#[must_use]
pub fn editor_from_env() -> String {
    std::env::var(EDITOR_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
}

/// Run `editor` headless and build the pack layout from its first
/// `packpath` entry.
///
/// Stdin is null so the editor can never block waiting for input.
///
/// # Errors
///
/// Returns [`PackError::EditorQuery`] if the editor cannot be spawned, exits
/// unsuccessfully, or prints no usable path.
pub fn query_pack_layout(editor: &str) -> PackResult<PackLayout> {
    let query_error = |message: String| PackError::EditorQuery {
        editor: editor.to_string(),
        message,
    };

    debug!(editor, "Querying editor packpath");
    let output = Command::new(editor)
        .args(["--headless", "-c", PACKPATH_QUERY, "-c", "qa"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| query_error(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(query_error(format!(
            "exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let entry = first_packpath_entry(&stdout)
        .ok_or_else(|| query_error("packpath is empty".to_string()))?;
    debug!(packpath = %entry.display(), "Resolved packpath entry");

    Ok(PackLayout::from_packpath(&entry))
}

/// First entry of a comma-separated `packpath` value.
fn first_packpath_entry(raw: &str) -> Option<PathBuf> {
    let first = raw.split(',').next()?.trim();
    (!first.is_empty()).then(|| PathBuf::from(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_entry_of_packpath() {
        assert_eq!(
            first_packpath_entry("/home/u/.config/nvim,/etc/xdg/nvim,/usr/share/nvim/runtime"),
            Some(PathBuf::from("/home/u/.config/nvim"))
        );
        assert_eq!(
            first_packpath_entry("  /only/entry\n"),
            Some(PathBuf::from("/only/entry"))
        );
    }

    #[test]
    fn empty_packpath() {
        assert_eq!(first_packpath_entry(""), None);
        assert_eq!(first_packpath_entry(" ,/second"), None);
    }

    #[test]
    fn missing_editor_is_reported() {
        let err = query_pack_layout("packsmith-no-such-editor-binary").unwrap_err();
        match err {
            PackError::EditorQuery { editor, .. } => {
                assert_eq!(editor, "packsmith-no-such-editor-binary");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn editor_failure_is_reported() {
        // `false` ignores its arguments and exits 1.
        let err = query_pack_layout("false").unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }
}
