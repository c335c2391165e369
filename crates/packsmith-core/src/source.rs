//! Deriving a [`Plugin`] declaration from an archive URL.
//!
//! Accepted URLs look like the archive links code forges hand out:
//!
//! - `https://github.com/owner/repo/archive/refs/heads/main.zip`
//! - `https://github.com/owner/repo/archive/refs/tags/v1.0.0.zip`
//! - `https://github.com/owner/repo/archive/v1.0.0.zip`
//!
//! The first two path segments become the repository (`owner/repo`).

use url::Url;

use crate::error::{PackError, PackResult};
use crate::plugin::Plugin;

/// Archive extensions stripped from a ref to form the version label.
const ARCHIVE_EXTENSIONS: [&str; 3] = [".tar.gz", ".tgz", ".zip"];

/// Build a plugin declaration for `raw_url`.
///
/// # Errors
///
/// Returns [`PackError::InvalidSource`] if the URL does not parse, uses a
/// scheme other than `http`/`https`, or has fewer than two path segments,
/// and [`PackError::InvalidRepository`] if the repository would not name a
/// single directory.
pub fn plugin_from_url(raw_url: &str) -> PackResult<Plugin> {
    let invalid = |reason: &str| PackError::InvalidSource {
        url: raw_url.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw_url).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(&format!(
            "unsupported scheme '{}', expected http or https",
            url.scheme()
        )));
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let [owner, repo, rest @ ..] = segments.as_slice() else {
        return Err(invalid("expected a path of the form /<owner>/<repo>/..."));
    };

    let plugin = Plugin::new(format!("{owner}/{repo}"), raw_url, version_hint(rest));
    plugin.validate()?;
    Ok(plugin)
}

/// Pick a version label out of the path segments after `owner/repo`.
fn version_hint(rest: &[&str]) -> Option<String> {
    let git_ref = match rest {
        ["archive", "refs", "tags" | "heads", tail @ ..] | ["archive", tail @ ..] => {
            tail.join("/")
        },
        _ => return None,
    };

    let trimmed = ARCHIVE_EXTENSIONS
        .iter()
        .find_map(|ext| git_ref.strip_suffix(ext))
        .unwrap_or(&git_ref);

    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
