use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use chrono::Local;
use umya_spreadsheet::Spreadsheet;

use crate::cli::VerifyArgs;

/// Writes the workbook to `path`, falling back to the system temp directory
/// when the primary location is unwritable. Returns the path actually
/// written, which the caller must treat as authoritative.
pub fn commit(book: &Spreadsheet, path: &Path, sheet_name: &str) -> anyhow::Result<PathBuf> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create workbook dir: {}", parent.display()))?;
    }

    match write_and_verify(book, path, sheet_name) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "workbook saved");
            return Ok(path.to_path_buf());
        }
        Err(primary_err) => {
            tracing::warn!(
                path = %path.display(),
                error = %primary_err,
                "save failed, retrying in temp directory"
            );

            let fallback = fallback_path(path);
            match write_and_verify(book, &fallback, sheet_name) {
                Ok(()) => {
                    tracing::info!(path = %fallback.display(), "workbook saved to fallback location");
                    Ok(fallback)
                }
                Err(fallback_err) => bail!(
                    "original save failed ({primary_err:#}); fallback also failed ({fallback_err:#})"
                ),
            }
        }
    }
}

fn fallback_path(original: &Path) -> PathBuf {
    let stem = original
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("workbook");
    let millis = Local::now().timestamp_millis();
    std::env::temp_dir().join(format!("{stem}_fallback_{millis}.xlsx"))
}

fn write_and_verify(book: &Spreadsheet, path: &Path, sheet_name: &str) -> anyhow::Result<()> {
    umya_spreadsheet::writer::xlsx::write(book, path)
        .with_context(|| format!("write workbook: {}", path.display()))?;
    let rows = verify(path, sheet_name)?;
    tracing::debug!(path = %path.display(), rows, "workbook verified after write");
    Ok(())
}

/// Re-reads the file from disk with a fresh parser and checks that the
/// worksheet exists and holds at least one row. Returns the row count.
pub fn verify(path: &Path, sheet_name: &str) -> anyhow::Result<u32> {
    let book = umya_spreadsheet::reader::xlsx::read(path)
        .with_context(|| format!("reopen workbook for verification: {}", path.display()))?;

    let Some(sheet) = book.get_sheet_by_name(sheet_name) else {
        bail!(
            "verification failed: worksheet {sheet_name:?} missing from {}",
            path.display()
        );
    };

    let rows = sheet.get_highest_row();
    if rows == 0 {
        bail!(
            "verification failed: worksheet {sheet_name:?} in {} is empty",
            path.display()
        );
    }
    Ok(rows)
}

pub fn run(args: VerifyArgs) -> anyhow::Result<()> {
    let rows = verify(&args.file, &args.sheet)?;
    println!("{}: sheet {:?} ok, {rows} rows", args.file.display(), args.sheet);
    Ok(())
}
