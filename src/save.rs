use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context as _;
use chrono::Local;

use crate::chapters::{self, ChapterMap};
use crate::cli::SaveArgs;
use crate::compose;
use crate::formats::{ScrapePayload, SaveOutcome, WorkInfo};
use crate::persist;
use crate::reconcile;
use crate::strategy::ContentType;
use crate::workbook;

/// Per-save configuration, resolved from the CLI or an embedding caller.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub save_path: Option<PathBuf>,
    pub append: bool,
    pub content_type: ContentType,
    pub filename: Option<String>,
}

/// Runs the full pipeline for one scrape snapshot: normalize chapters,
/// resolve the workbook, reconcile the worksheet, compose the row, commit
/// and verify. Returns the outcome summary on success.
pub fn save(
    info: &WorkInfo,
    raw_chapters: &[crate::formats::ChapterRecord],
    options: &SaveOptions,
) -> anyhow::Result<SaveOutcome> {
    let started = Instant::now();
    let kind = options.content_type;

    tracing::info!(
        title = %info.title,
        kind = kind.label(),
        append = options.append,
        chapters = raw_chapters.len(),
        "saving statistics snapshot"
    );

    let chapter_map: ChapterMap = chapters::normalize(raw_chapters, kind);
    let sheet_name = workbook::sheet_name_for(&info.title);

    let resolved = workbook::resolve(
        options.save_path.as_deref(),
        options.append,
        options.filename.as_deref(),
        kind,
    )
    .context("resolve workbook")?;
    let mut book = resolved.book;
    let path = resolved.path;

    let timestamp = Local::now().format("%Y-%m-%d %H:%M").to_string();
    let composed = {
        let reconciled =
            reconcile::reconcile(&mut book, &sheet_name, &chapter_map, options.append, kind)
                .context("reconcile worksheet")?;
        compose::append_row(
            reconciled.sheet,
            &reconciled.columns,
            info,
            &chapter_map,
            kind,
            &timestamp,
        )
        .context("compose row")?
    };

    let file_path = persist::commit(&book, &path, &sheet_name).context("commit workbook")?;

    let outcome = SaveOutcome {
        file_path,
        row_added: composed.final_row_count > composed.initial_row_count,
        initial_row_count: composed.initial_row_count,
        final_row_count: composed.final_row_count,
        worksheet_name: sheet_name,
        processing_time: started.elapsed().as_secs_f64(),
        is_append_mode: options.append,
    };
    tracing::info!(
        path = %outcome.file_path.display(),
        rows = outcome.final_row_count,
        elapsed_secs = outcome.processing_time,
        "save complete"
    );
    Ok(outcome)
}

pub fn run(args: SaveArgs) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read input: {}", args.input.display()))?;
    let payload: ScrapePayload = serde_json::from_str(&raw)
        .with_context(|| format!("parse input: {}", args.input.display()))?;

    let options = SaveOptions {
        save_path: args.out,
        append: args.append,
        content_type: ContentType::from_novel_flag(args.novel),
        filename: args.filename,
    };

    let outcome = save(&payload.info, &payload.chapters, &options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.file_path.display());
    }
    Ok(())
}
