//! Archive extraction that flattens an incidental wrapping directory.
//!
//! Source archives from code forges usually wrap everything in a single
//! `<repo>-<ref>/` directory. [`extract_archive`] strips that directory if,
//! and only if, every entry lives under it; otherwise the archive is
//! extracted verbatim.
//!
//! # Security
//!
//! - Rejects entries with `..`, root or drive-prefix components
//! - Rejects symlinks, devices and FIFOs before anything is written
//! - Never restores setuid/setgid/sticky bits
//!
//! Extraction is not transactional: the first error aborts and whatever was
//! written so far stays on disk.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::error::{PackError, PackResult};

/// Outcome of a successful extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// The wrapping directory that was stripped, if any.
    pub stripped_prefix: Option<String>,
    /// Number of regular files written.
    pub files: usize,
    /// Number of directory entries created.
    pub dirs: usize,
}

/// Extract the zip archive at `archive_path` into `dest`.
///
/// `dest` is created if needed. Existing files at the same paths are
/// overwritten.
///
/// # Errors
///
/// Returns [`PackError::Archive`] if the archive is unreadable,
/// [`PackError::PathTraversal`] for unsafe entry names,
/// [`PackError::UnsafeEntryType`] for anything but files and directories, and
/// [`PackError::Io`] for filesystem failures.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> PackResult<ExtractSummary> {
    let archive_err = |source| PackError::Archive {
        path: archive_path.to_path_buf(),
        source,
    };

    let file =
        File::open(archive_path).map_err(|e| PackError::io("failed to open", archive_path, e))?;
    let mut archive = ZipArchive::new(file).map_err(archive_err)?;

    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(archive_err)?;
        if let Some(entry_type) = entry.unix_mode().and_then(unsafe_entry_type) {
            return Err(PackError::UnsafeEntryType {
                entry_type,
                path: entry.name().to_string(),
            });
        }
        names.push(normalize_name(entry.name()));
    }

    let top_level = common_top_level_dir(names.iter().map(String::as_str)).map(str::to_string);
    debug!(
        archive = %archive_path.display(),
        entries = names.len(),
        top_level = ?top_level,
        "Extracting archive"
    );

    fs::create_dir_all(dest).map_err(|e| PackError::io("failed to create", dest, e))?;

    let mut summary = ExtractSummary {
        stripped_prefix: top_level.clone(),
        ..ExtractSummary::default()
    };

    for (index, name) in names.iter().enumerate() {
        let mut entry = archive.by_index(index).map_err(archive_err)?;
        let relative = safe_relative_path(strip_top_level(name, top_level.as_deref()))?;
        let target = dest.join(&relative);

        if entry.is_dir() || name.ends_with('/') {
            fs::create_dir_all(&target).map_err(|e| PackError::io("failed to create", &target, e))?;
            summary.dirs = summary.dirs.saturating_add(1);
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| PackError::io("failed to create", parent, e))?;
        }

        let mut out =
            File::create(&target).map_err(|e| PackError::io("failed to create", &target, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| PackError::io("failed to write", &target, e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o777))
                .map_err(|e| PackError::io("failed to set permissions on", &target, e))?;
        }

        summary.files = summary.files.saturating_add(1);
    }

    Ok(summary)
}

/// File-type bits of a unix mode.
const S_IFMT: u32 = 0o170_000;

/// Name of the file type in `mode` unless it is a regular file or a
/// directory. Archives written without unix metadata carry no type bits.
fn unsafe_entry_type(mode: u32) -> Option<&'static str> {
    match mode & S_IFMT {
        0 | 0o100_000 | 0o040_000 => None,
        0o120_000 => Some("symlink"),
        0o020_000 => Some("char device"),
        0o060_000 => Some("block device"),
        0o010_000 => Some("fifo"),
        0o140_000 => Some("socket"),
        _ => Some("unknown"),
    }
}

/// Entry names use `/`, but some archivers emit `\`.
fn normalize_name(raw: &str) -> String {
    raw.replace('\\', "/")
}

/// The first path segment shared by every entry, if there is one.
///
/// Any entry without a `/` (a bare top-level file) or with a different
/// first segment rules stripping out. An empty archive has no common
/// directory.
fn common_top_level_dir<'a, I>(names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidate: Option<&str> = None;
    for name in names {
        let (first, _) = name.split_once('/')?;
        if first.is_empty() {
            return None;
        }
        match candidate {
            None => candidate = Some(first),
            Some(existing) if existing == first => {},
            Some(_) => return None,
        }
    }
    candidate
}

/// Remove `<top>/` from the front of `name` when it is present.
fn strip_top_level<'a>(name: &'a str, top: Option<&str>) -> &'a str {
    top.and_then(|t| name.strip_prefix(t)?.strip_prefix('/'))
        .unwrap_or(name)
}

/// Turn an entry name into a relative path that cannot escape `dest`.
fn safe_relative_path(name: &str) -> PackResult<PathBuf> {
    let mut cleaned = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => cleaned.push(part),
            Component::CurDir => {},
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(PackError::PathTraversal {
                    path: name.to_string(),
                });
            },
        }
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    /// `None` content means a directory entry.
    fn write_zip(path: &Path, entries: &[(&str, Option<&str>)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            match content {
                None => zip
                    .add_directory(*name, SimpleFileOptions::default())
                    .unwrap(),
                Some(text) => {
                    let options = SimpleFileOptions::default().unix_permissions(0o644);
                    zip.start_file(*name, options).unwrap();
                    zip.write_all(text.as_bytes()).unwrap();
                },
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn common_dir_requires_every_entry() {
        assert_eq!(
            common_top_level_dir(["foo-main/", "foo-main/lua/foo.lua", "foo-main/README.md"]),
            Some("foo-main")
        );
        assert_eq!(common_top_level_dir(["a/x", "b/y"]), None);
        assert_eq!(common_top_level_dir(["foo/x", "README"]), None);
        assert_eq!(common_top_level_dir(["/abs/x"]), None);
        assert_eq!(common_top_level_dir(std::iter::empty()), None);
    }

    #[test]
    fn strip_only_matching_prefix() {
        assert_eq!(strip_top_level("foo/lua/x.lua", Some("foo")), "lua/x.lua");
        assert_eq!(strip_top_level("foo/", Some("foo")), "");
        assert_eq!(strip_top_level("foobar/x", Some("foo")), "foobar/x");
        assert_eq!(strip_top_level("foo/x", None), "foo/x");
    }

    #[test]
    fn backslash_names_are_normalized() {
        let names = [normalize_name("foo-main\\lua\\x.lua"), normalize_name("foo-main\\")];
        assert_eq!(
            common_top_level_dir(names.iter().map(String::as_str)),
            Some("foo-main")
        );
    }

    #[test]
    fn unsafe_paths_rejected() {
        assert!(safe_relative_path("../evil").is_err());
        assert!(safe_relative_path("a/../../evil").is_err());
        assert!(safe_relative_path("/etc/passwd").is_err());
        assert_eq!(
            safe_relative_path("./lua/x.lua").unwrap(),
            PathBuf::from("lua/x.lua")
        );
        assert_eq!(safe_relative_path("").unwrap(), PathBuf::new());
    }

    #[test]
    fn strips_wrapping_directory() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("foo.zip");
        write_zip(
            &archive,
            &[
                ("foo-main/", None),
                ("foo-main/plugin/", None),
                ("foo-main/plugin/foo.lua", Some("return {}")),
                ("foo-main/README.md", Some("# foo")),
            ],
        );

        let dest = tmp.path().join("foo");
        let summary = extract_archive(&archive, &dest).unwrap();

        assert_eq!(summary.stripped_prefix.as_deref(), Some("foo-main"));
        assert_eq!(summary.files, 2);
        assert_eq!(summary.dirs, 2);
        assert_eq!(
            fs::read_to_string(dest.join("plugin/foo.lua")).unwrap(),
            "return {}"
        );
        assert!(dest.join("README.md").is_file());
        assert!(!dest.join("foo-main").exists());
    }

    #[test]
    fn strips_without_explicit_directory_entries() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("bar.zip");
        write_zip(
            &archive,
            &[
                ("bar-v1/lua/bar/init.lua", Some("-- bar")),
                ("bar-v1/doc/bar.txt", Some("help")),
            ],
        );

        let dest = tmp.path().join("bar");
        extract_archive(&archive, &dest).unwrap();
        assert!(dest.join("lua/bar/init.lua").is_file());
        assert!(dest.join("doc/bar.txt").is_file());
    }

    #[test]
    fn mixed_prefixes_are_preserved() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("mixed.zip");
        write_zip(
            &archive,
            &[("a/x.txt", Some("x")), ("b/y.txt", Some("y"))],
        );

        let dest = tmp.path().join("mixed");
        let summary = extract_archive(&archive, &dest).unwrap();
        assert_eq!(summary.stripped_prefix, None);
        assert!(dest.join("a/x.txt").is_file());
        assert!(dest.join("b/y.txt").is_file());
    }

    #[test]
    fn top_level_files_disable_stripping() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("flat.zip");
        write_zip(
            &archive,
            &[("README", Some("readme")), ("plugin/flat.vim", Some("\" flat"))],
        );

        let dest = tmp.path().join("flat");
        extract_archive(&archive, &dest).unwrap();
        assert!(dest.join("README").is_file());
        assert!(dest.join("plugin/flat.vim").is_file());
    }

    #[test]
    fn empty_archive_creates_empty_destination() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("empty.zip");
        write_zip(&archive, &[]);

        let dest = tmp.path().join("empty");
        let summary = extract_archive(&archive, &dest).unwrap();
        assert_eq!(summary, ExtractSummary::default());
        assert!(dest.is_dir());
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
    }

    #[test]
    fn overwrites_existing_files() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("foo.zip");
        write_zip(&archive, &[("foo-main/init.lua", Some("new"))]);

        let dest = tmp.path().join("foo");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("init.lua"), "old contents that are longer").unwrap();

        extract_archive(&archive, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("init.lua")).unwrap(), "new");
    }

    #[test]
    fn traversal_entry_aborts_extraction() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("evil.zip");
        write_zip(
            &archive,
            &[("ok.txt", Some("ok")), ("../escape.txt", Some("pwned"))],
        );

        let dest = tmp.path().join("evil");
        let err = extract_archive(&archive, &dest).unwrap_err();
        assert!(matches!(err, PackError::PathTraversal { .. }));
        assert!(!tmp.path().join("escape.txt").exists());
        // Entries before the failure stay on disk.
        assert!(dest.join("ok.txt").is_file());
    }

    #[test]
    fn entry_types_by_mode() {
        assert_eq!(unsafe_entry_type(0o644), None);
        assert_eq!(unsafe_entry_type(0o100_755), None);
        assert_eq!(unsafe_entry_type(0o040_755), None);
        assert_eq!(unsafe_entry_type(0o120_777), Some("symlink"));
        assert_eq!(unsafe_entry_type(0o010_644), Some("fifo"));
    }

    #[test]
    fn symlink_entry_rejected_before_writing() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("link.zip");
        let mut zip = zip::ZipWriter::new(File::create(&archive).unwrap());
        zip.start_file("foo-main/init.lua", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"return 1").unwrap();
        zip.add_symlink("foo-main/passwd", "/etc/passwd", SimpleFileOptions::default())
            .unwrap();
        zip.finish().unwrap();

        let dest = tmp.path().join("foo");
        let err = extract_archive(&archive, &dest).unwrap_err();
        let PackError::UnsafeEntryType { entry_type, path } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(*entry_type, "symlink");
        assert_eq!(path, "foo-main/passwd");
        assert!(!dest.exists());
    }

    #[test]
    fn not_a_zip_is_an_archive_error() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("bogus.zip");
        fs::write(&archive, b"<html>404</html>").unwrap();

        let err = extract_archive(&archive, &tmp.path().join("bogus")).unwrap_err();
        assert!(matches!(err, PackError::Archive { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn preserves_file_mode_without_special_bits() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("tool.zip");
        let mut zip = zip::ZipWriter::new(File::create(&archive).unwrap());
        zip.start_file(
            "tool-main/bin/run.sh",
            SimpleFileOptions::default().unix_permissions(0o4755),
        )
        .unwrap();
        zip.write_all(b"#!/bin/sh\n").unwrap();
        zip.finish().unwrap();

        let dest = tmp.path().join("tool");
        extract_archive(&archive, &dest).unwrap();
        let mode = fs::metadata(dest.join("bin/run.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o7777, 0o755);
    }
}
