use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Local;
use umya_spreadsheet::Spreadsheet;

use crate::strategy::ContentType;

/// Maximum worksheet-name length accepted by spreadsheet applications.
pub const SHEET_NAME_MAX_LEN: usize = 31;

/// A workbook ready for reconciliation: either parsed from disk
/// (`file_existed`) or a fresh in-memory one, plus the path the commit step
/// will target.
pub struct ResolvedWorkbook {
    pub book: Spreadsheet,
    pub path: PathBuf,
    pub file_existed: bool,
}

/// Strips the characters spreadsheet applications reject in sheet names and
/// filenames (`\ / ? * [ ]`) and truncates to `max_len` characters.
pub fn sanitize_component(raw: &str, max_len: usize) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '\\' | '/' | '?' | '*' | '[' | ']'))
        .take(max_len)
        .collect()
}

/// Worksheet name for a title; empty titles fall back to `Sheet1`.
pub fn sheet_name_for(title: &str) -> String {
    let name = sanitize_component(title.trim(), SHEET_NAME_MAX_LEN);
    if name.is_empty() {
        "Sheet1".to_string()
    } else {
        name
    }
}

/// Probes whether the file can be opened for both read and write. A failed
/// probe usually means another process holds the file open.
fn is_read_writable(path: &Path) -> bool {
    OpenOptions::new().read(true).write(true).open(path).is_ok()
}

/// Sibling path with a timestamp suffix, used when the target file is
/// locked: `stats.xlsx` becomes `stats_1756400000000.xlsx`.
fn timestamped_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("workbook");
    let millis = Local::now().timestamp_millis();
    path.with_file_name(format!("{stem}_{millis}.xlsx"))
}

/// Base directory resolution, tried in order:
/// 1. the hint itself, when it is an existing directory;
/// 2. the hint's parent, when that exists (inferring a filename from the
///    hint's basename unless a custom one was supplied);
/// 3. the platform downloads directory (then desktop, then cwd).
fn resolve_base_dir(hint: Option<&Path>, custom: Option<&str>) -> (PathBuf, Option<String>) {
    if let Some(hint) = hint {
        if hint.is_dir() {
            return (hint.to_path_buf(), None);
        }
        if let Some(parent) = hint.parent()
            && !parent.as_os_str().is_empty()
            && parent.is_dir()
        {
            let inferred = if custom.is_none() {
                hint.file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            } else {
                None
            };
            return (parent.to_path_buf(), inferred);
        }
        tracing::warn!(
            hint = %hint.display(),
            "save path hint does not resolve to an existing directory, using downloads dir"
        );
    }

    let fallback = dirs::download_dir()
        .or_else(dirs::desktop_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    (fallback, None)
}

/// Computes the target workbook path from the optional external hint, the
/// save mode and the optional custom filename. Precedence for the filename:
/// sanitized custom name, then the content type's append template, then its
/// date-stamped fresh template.
pub fn resolve_target_path(
    hint: Option<&Path>,
    append: bool,
    custom_filename: Option<&str>,
    kind: ContentType,
) -> PathBuf {
    let custom = custom_filename
        .map(|name| sanitize_component(name.trim(), 120))
        .filter(|name| !name.is_empty());

    let (base_dir, inferred) = resolve_base_dir(hint, custom.as_deref());

    let filename = custom
        .or(inferred)
        .map(|stem| format!("{stem}.xlsx"))
        .unwrap_or_else(|| kind.default_filename(append, Local::now().date_naive()));

    base_dir.join(filename)
}

/// Opens the workbook at `path` or starts a fresh one. Corruption and lock
/// contention never fail resolution: an unparseable file is discarded in
/// favor of a fresh workbook, and a locked file redirects the save to a
/// timestamp-suffixed sibling. Missing parent directories are created.
pub fn open_or_create(path: PathBuf) -> anyhow::Result<ResolvedWorkbook> {
    if path.is_file() {
        if !is_read_writable(&path) {
            let redirected = timestamped_sibling(&path);
            tracing::warn!(
                path = %path.display(),
                redirected = %redirected.display(),
                "target file appears locked by another process, using new filename"
            );
            return Ok(ResolvedWorkbook {
                book: umya_spreadsheet::new_file_empty_worksheet(),
                path: redirected,
                file_existed: false,
            });
        }

        match umya_spreadsheet::reader::xlsx::read(&path) {
            Ok(book) => {
                tracing::info!(path = %path.display(), "opened existing workbook");
                return Ok(ResolvedWorkbook {
                    book,
                    path,
                    file_existed: true,
                });
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "existing workbook is unreadable, starting fresh"
                );
                return Ok(ResolvedWorkbook {
                    book: umya_spreadsheet::new_file_empty_worksheet(),
                    path,
                    file_existed: false,
                });
            }
        }
    }

    if path.exists() {
        // Exists but is not a regular file; leave the path alone and let the
        // commit fallback deal with it.
        tracing::warn!(path = %path.display(), "target path exists but is not a file");
    } else if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create workbook dir: {}", parent.display()))?;
    }

    Ok(ResolvedWorkbook {
        book: umya_spreadsheet::new_file_empty_worksheet(),
        path,
        file_existed: false,
    })
}

/// Full resolver: target path plus opened-or-fresh workbook.
pub fn resolve(
    hint: Option<&Path>,
    append: bool,
    custom_filename: Option<&str>,
    kind: ContentType,
) -> anyhow::Result<ResolvedWorkbook> {
    let path = resolve_target_path(hint, append, custom_filename, kind);
    tracing::debug!(path = %path.display(), append, kind = kind.label(), "resolved target path");
    open_or_create(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_illegal_characters() {
        assert_eq!(sanitize_component("a/b\\c?d*e[f]g", 64), "abcdefg");
    }

    #[test]
    fn sheet_names_are_truncated_to_limit() {
        let long = "x".repeat(80);
        assert_eq!(sheet_name_for(&long).chars().count(), SHEET_NAME_MAX_LEN);
    }

    #[test]
    fn empty_title_falls_back_to_default_sheet_name() {
        assert_eq!(sheet_name_for("///"), "Sheet1");
        assert_eq!(sheet_name_for("  "), "Sheet1");
    }

    #[test]
    fn directory_hint_is_used_as_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_target_path(Some(dir.path()), true, None, ContentType::Comic);
        assert_eq!(path.parent().unwrap(), dir.path());
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "webtoon_stats_daily_append.xlsx"
        );
    }

    #[test]
    fn file_hint_infers_basename_when_no_custom_filename() {
        let dir = tempfile::tempdir().unwrap();
        let hint = dir.path().join("my_stats.xlsx");
        let path = resolve_target_path(Some(&hint), false, None, ContentType::Comic);
        assert_eq!(path, dir.path().join("my_stats.xlsx"));
    }

    #[test]
    fn extensionless_file_hint_infers_basename() {
        let dir = tempfile::tempdir().unwrap();
        let hint = dir.path().join("mycomic");
        let path = resolve_target_path(Some(&hint), false, None, ContentType::Comic);
        assert_eq!(path, dir.path().join("mycomic.xlsx"));
    }

    #[test]
    fn custom_filename_overrides_inference_and_templates() {
        let dir = tempfile::tempdir().unwrap();
        let hint = dir.path().join("ignored.xlsx");
        let path = resolve_target_path(Some(&hint), true, Some("custom*name"), ContentType::Novel);
        assert_eq!(path, dir.path().join("customname.xlsx"));
    }

    #[test]
    fn fresh_novel_filename_is_date_stamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_target_path(Some(dir.path()), false, None, ContentType::Novel);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("novel_stats_"));
        assert!(name.ends_with(".xlsx"));
    }

    #[test]
    fn corrupt_existing_file_degrades_to_fresh_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let resolved = open_or_create(path.clone()).unwrap();
        assert!(!resolved.file_existed);
        assert_eq!(resolved.path, path);
    }

    #[cfg(unix)]
    #[test]
    fn locked_existing_file_redirects_to_timestamped_sibling() {
        use std::os::unix::fs::PermissionsExt as _;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.xlsx");
        std::fs::write(&path, b"held by another process").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o444)).unwrap();
        if is_read_writable(&path) {
            // Running privileged; permission bits cannot simulate the lock.
            return;
        }

        let resolved = open_or_create(path.clone()).unwrap();
        assert!(!resolved.file_existed);
        assert_ne!(resolved.path, path);
        assert_eq!(resolved.path.parent().unwrap(), dir.path());
        let name = resolved.path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("locked_"));
        assert!(name.ends_with(".xlsx"));
    }

    #[test]
    fn missing_parent_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("out.xlsx");
        let resolved = open_or_create(path.clone()).unwrap();
        assert!(!resolved.file_existed);
        assert!(path.parent().unwrap().is_dir());
        assert_eq!(resolved.path, path);
    }
}
