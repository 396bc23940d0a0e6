use std::collections::BTreeMap;

use umya_spreadsheet::{
    HorizontalAlignmentValues, Spreadsheet, VerticalAlignmentValues, Worksheet,
};

use crate::chapters::ChapterMap;
use crate::strategy::ContentType;

/// Hard ceiling on worksheet columns in the xlsx format.
pub const MAX_COLUMNS: u32 = 16_384;

const CHAPTER_COLUMN_WIDTH: f64 = 10.0;

/// Mapping from header labels (and chapter numbers) to 1-based column
/// indices. Indices are unique by construction; on duplicate labels the
/// first registration wins.
#[derive(Debug, Default, Clone)]
pub struct ColumnMap {
    labels: BTreeMap<String, u32>,
    chapter_cols: BTreeMap<u32, u32>,
}

impl ColumnMap {
    pub fn index_of(&self, label: &str) -> Option<u32> {
        self.labels.get(label).copied()
    }

    pub fn chapter_index(&self, number: u32) -> Option<u32> {
        self.chapter_cols.get(&number).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// 1-based index the next appended column should take.
    pub fn next_free_index(&self) -> u32 {
        self.labels.values().max().map_or(1, |max| max + 1)
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, u32)> {
        self.labels.iter().map(|(label, idx)| (label.as_str(), *idx))
    }

    fn register(&mut self, label: &str, index: u32) {
        self.labels.entry(label.to_string()).or_insert(index);
    }

    fn register_chapter(&mut self, number: u32, index: u32) {
        self.chapter_cols.entry(number).or_insert(index);
    }
}

/// Output of worksheet reconciliation: the sheet to write into, whether it
/// carried prior rows, and the column map row composition aligns to.
pub struct ReconciledSheet<'a> {
    pub sheet: &'a mut Worksheet,
    pub is_existing: bool,
    pub columns: ColumnMap,
}

/// Brings the target worksheet in line with the current scrape.
///
/// Three cases: no sheet of that name yet (create with the full schema);
/// sheet exists but the save is not in append mode (drop and recreate,
/// since fresh-mode saves replace prior history for the title); sheet
/// exists in append mode (keep every existing row and column, extend the
/// header with newly seen chapter columns only).
pub fn reconcile<'a>(
    book: &'a mut Spreadsheet,
    sheet_name: &str,
    chapters: &ChapterMap,
    append: bool,
    kind: ContentType,
) -> anyhow::Result<ReconciledSheet<'a>> {
    let had_sheet = book.get_sheet_by_name(sheet_name).is_some();

    if had_sheet && !append {
        tracing::info!(sheet = sheet_name, "replacing existing worksheet (fresh mode)");
        book.remove_sheet_by_name(sheet_name)
            .map_err(|err| anyhow::anyhow!("remove worksheet '{sheet_name}': {err}"))?;
    }

    if had_sheet && append {
        let sheet = book.get_sheet_by_name_mut(sheet_name).ok_or_else(|| {
            anyhow::anyhow!("worksheet '{sheet_name}' disappeared during reconciliation")
        })?;
        tracing::info!(sheet = sheet_name, "appending to existing worksheet");
        let columns = extend_header(sheet, chapters, kind);
        Ok(ReconciledSheet {
            sheet,
            is_existing: true,
            columns,
        })
    } else {
        let sheet = book
            .new_sheet(sheet_name)
            .map_err(|err| anyhow::anyhow!("create worksheet '{sheet_name}': {err}"))?;
        tracing::info!(sheet = sheet_name, "created new worksheet");
        let columns = write_full_schema(sheet, chapters, kind);
        Ok(ReconciledSheet {
            sheet,
            is_existing: false,
            columns,
        })
    }
}

fn write_header_cell(sheet: &mut Worksheet, col: u32, text: &str, centered: bool) {
    let cell = sheet.get_cell_mut((col, 1u32));
    cell.set_value_string(text);
    let style = cell.get_style_mut();
    style.get_font_mut().set_bold(true);
    if centered {
        let alignment = style.get_alignment_mut();
        alignment.set_horizontal(HorizontalAlignmentValues::Center);
        alignment.set_vertical(VerticalAlignmentValues::Center);
    }
}

/// New-sheet case: fixed columns followed by one column per chapter in the
/// current scrape, headers bold and centered, widths as cosmetic hints.
fn write_full_schema(sheet: &mut Worksheet, chapters: &ChapterMap, kind: ContentType) -> ColumnMap {
    let mut columns = ColumnMap::default();
    let mut col: u32 = 0;

    for spec in kind.fixed_columns() {
        col += 1;
        write_header_cell(sheet, col, spec.header, true);
        sheet
            .get_column_dimension_by_number_mut(&col)
            .set_width(spec.width);
        columns.register(spec.header, col);
    }

    for chapter in chapters.values() {
        if col >= MAX_COLUMNS {
            tracing::warn!(
                chapter = chapter.number,
                "column ceiling reached, dropping remaining chapter columns"
            );
            break;
        }
        col += 1;
        let header = kind.chapter_header(chapter.number, &chapter.source);
        write_header_cell(sheet, col, &header, true);
        sheet
            .get_column_dimension_by_number_mut(&col)
            .set_width(CHAPTER_COLUMN_WIDTH);
        columns.register(&header, col);
        columns.register_chapter(chapter.number, col);
    }

    columns
}

/// Reads the header row of an existing sheet into a column map, registering
/// the chapter-number projection for every label the content type's key
/// format recognizes.
fn read_header(sheet: &Worksheet, kind: ContentType) -> ColumnMap {
    let mut columns = ColumnMap::default();
    let highest = sheet.get_highest_column();

    for col in 1..=highest {
        let value = sheet.get_value((col, 1u32));
        if value.is_empty() {
            continue;
        }
        if let Some(number) = kind.parse_chapter_column(&value) {
            columns.register_chapter(number, col);
        }
        columns.register(&value, col);
    }

    columns
}

/// Append case: existing rows and columns stay untouched; chapters with no
/// matching header get one new column each at the next free index.
fn extend_header(sheet: &mut Worksheet, chapters: &ChapterMap, kind: ContentType) -> ColumnMap {
    let mut columns = read_header(sheet, kind);

    if columns.is_empty() {
        // Manual edits can leave a sheet without any header text. Rebuild a
        // minimal Date/Author header instead of failing the save.
        tracing::warn!("existing worksheet has no readable header row, rebuilding minimal header");
        for (offset, header) in ["Date", "Author"].into_iter().enumerate() {
            let col = offset as u32 + 1;
            write_header_cell(sheet, col, header, true);
            columns.register(header, col);
        }
    }

    for chapter in chapters.values() {
        if columns.chapter_index(chapter.number).is_some() {
            continue;
        }
        let header = kind.chapter_header(chapter.number, &chapter.source);
        if let Some(existing) = columns.index_of(&header) {
            // A title-labeled column from an earlier save already covers
            // this chapter; reuse it instead of duplicating.
            columns.register_chapter(chapter.number, existing);
            continue;
        }

        let col = columns.next_free_index();
        if col > MAX_COLUMNS {
            tracing::warn!(
                chapter = chapter.number,
                "column ceiling reached, dropping remaining chapter columns"
            );
            break;
        }
        write_header_cell(sheet, col, &header, false);
        sheet
            .get_column_dimension_by_number_mut(&col)
            .set_width(CHAPTER_COLUMN_WIDTH);
        columns.register(&header, col);
        columns.register_chapter(chapter.number, col);
        tracing::debug!(header = %header, column = col, "added chapter column");
    }

    columns
}
