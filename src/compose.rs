use umya_spreadsheet::Worksheet;

use crate::chapters::ChapterMap;
use crate::formats::WorkInfo;
use crate::reconcile::ColumnMap;
use crate::strategy::{CellData, ContentType};

/// Authors longer than this are truncated before landing in a cell.
pub const AUTHOR_MAX_LEN: usize = 20;

/// Bookkeeping for one appended snapshot row.
#[derive(Debug, Clone, Copy)]
pub struct ComposedRow {
    pub row: u32,
    pub initial_row_count: u32,
    pub final_row_count: u32,
    pub cells_written: usize,
}

fn set_cell(sheet: &mut Worksheet, col: u32, row: u32, value: &CellData) {
    let cell = sheet.get_cell_mut((col, row));
    match value {
        CellData::Text(text) => {
            cell.set_value_string(text.as_str());
        }
        CellData::Number(number) => {
            cell.set_value_number(*number);
        }
    }
}

fn truncate_chars(raw: &str, max_len: usize) -> String {
    raw.chars().take(max_len).collect()
}

/// Appends exactly one snapshot row below the current last row, aligned to
/// the reconciled column map. Columns with no corresponding data are left
/// empty, never zero-filled. `timestamp` is the commit-time wall clock,
/// formatted by the caller.
pub fn append_row(
    sheet: &mut Worksheet,
    columns: &ColumnMap,
    info: &WorkInfo,
    chapters: &ChapterMap,
    kind: ContentType,
    timestamp: &str,
) -> anyhow::Result<ComposedRow> {
    let initial_row_count = sheet.get_highest_row();
    let row = initial_row_count + 1;
    let mut cells_written = 0usize;

    if let Some(col) = columns.index_of("Date") {
        set_cell(sheet, col, row, &CellData::Text(timestamp.to_string()));
        cells_written += 1;
    }

    if let Some(col) = columns.index_of("Author") {
        let author = info.author.trim();
        let author = if author.is_empty() {
            "Unknown".to_string()
        } else {
            truncate_chars(author, AUTHOR_MAX_LEN)
        };
        set_cell(sheet, col, row, &CellData::Text(author));
        cells_written += 1;
    }

    for (header, value) in kind.stat_fields(info) {
        if let Some(col) = columns.index_of(header) {
            set_cell(sheet, col, row, &value);
            cells_written += 1;
        }
    }

    for chapter in chapters.values() {
        if let Some(col) = columns.chapter_index(chapter.number) {
            set_cell(sheet, col, row, &CellData::Number(chapter.metric as f64));
            cells_written += 1;
        }
    }

    if cells_written == 0 {
        anyhow::bail!(
            "no usable fields: nothing in the scraped data maps onto any of the {} worksheet columns",
            columns.len()
        );
    }

    let final_row_count = sheet.get_highest_row();
    if final_row_count <= initial_row_count {
        // Cells were written, so a stagnant row count is an internal
        // inconsistency worth surfacing, but the data is present.
        tracing::error!(
            initial_row_count,
            final_row_count,
            "row cells written but worksheet row count did not increase"
        );
    } else {
        tracing::debug!(
            row,
            cells_written,
            initial_row_count,
            final_row_count,
            "appended snapshot row"
        );
    }

    Ok(ComposedRow {
        row,
        initial_row_count,
        final_row_count,
        cells_written,
    })
}
