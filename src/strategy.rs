use chrono::NaiveDate;

use crate::formats::{ChapterRecord, WorkInfo};

/// Content-type policy: column schema, chapter header formatting, stat
/// coercion and filename templates differ between the two supported kinds
/// of serialized work. Selected once per save and threaded through
/// reconciliation and row composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Comic,
    Novel,
}

/// One fixed (non-chapter) column of the sheet schema. Widths are cosmetic
/// hints in character units.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub header: &'static str,
    pub width: f64,
}

/// A value destined for one worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellData {
    Text(String),
    Number(f64),
}

const COMIC_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { header: "Date", width: 20.0 },
    ColumnSpec { header: "Author", width: 20.0 },
    ColumnSpec { header: "Total Views", width: 15.0 },
    ColumnSpec { header: "Subscribers", width: 15.0 },
    ColumnSpec { header: "Rating", width: 10.0 },
];

const NOVEL_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec { header: "Date", width: 20.0 },
    ColumnSpec { header: "Author", width: 20.0 },
    ColumnSpec { header: "Total Views", width: 15.0 },
    ColumnSpec { header: "Likes", width: 15.0 },
    ColumnSpec { header: "Status", width: 15.0 },
    ColumnSpec { header: "Total Chapters", width: 15.0 },
    ColumnSpec { header: "Total Words", width: 15.0 },
];

impl ContentType {
    pub fn from_novel_flag(novel: bool) -> Self {
        if novel { ContentType::Novel } else { ContentType::Comic }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContentType::Comic => "comic",
            ContentType::Novel => "novel",
        }
    }

    /// Ordered fixed-column schema written ahead of any chapter columns.
    pub fn fixed_columns(self) -> &'static [ColumnSpec] {
        match self {
            ContentType::Comic => COMIC_COLUMNS,
            ContentType::Novel => NOVEL_COLUMNS,
        }
    }

    fn chapter_key_prefix(self) -> &'static str {
        match self {
            ContentType::Comic => "CH",
            ContentType::Novel => "Words_CH",
        }
    }

    /// Internal column key for a chapter, independent of the human-readable
    /// header text (`CH7` for comics, `Words_CH7` for novels).
    pub fn chapter_column_key(self, number: u32) -> String {
        format!("{}{number}", self.chapter_key_prefix())
    }

    /// Reverse-maps a header label back to a chapter number when it matches
    /// this content type's key format (case-insensitive).
    pub fn parse_chapter_column(self, label: &str) -> Option<u32> {
        let label = label.trim();
        let prefix = self.chapter_key_prefix();
        let head = label.get(..prefix.len())?;
        if !head.eq_ignore_ascii_case(prefix) {
            return None;
        }
        let digits = &label[prefix.len()..];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Header text for a chapter column. Priority: explicit display-name
    /// override, then title (novels prefix the collection when present),
    /// then the bare key fallback `CH<number>`.
    pub fn chapter_header(self, number: u32, record: &ChapterRecord) -> String {
        if let Some(name) = record
            .chapter_display_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            return name.to_string();
        }
        if let Some(title) = record.title.as_deref().filter(|s| !s.trim().is_empty()) {
            if self == ContentType::Novel
                && let Some(collection) = record
                    .collection
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
            {
                return format!("{collection} - {title}");
            }
            return title.to_string();
        }
        format!("CH{number}")
    }

    /// Numeric metric a chapter contributes to its cell: like count for
    /// comics, word count for novels. Unusable values become 0.
    pub fn chapter_metric(self, record: &ChapterRecord) -> u64 {
        match self {
            ContentType::Comic => record
                .likes
                .as_ref()
                .and_then(|likes| likes.as_count())
                .unwrap_or(0),
            ContentType::Novel => record
                .words
                .as_ref()
                .and_then(|words| words.as_count())
                .unwrap_or(0),
        }
    }

    /// Coerced stat fields for one snapshot row, keyed by header label.
    /// Absent numeric stats yield no cell at all (sparse, not zero); the
    /// novel status field always materializes, with an `N/A` placeholder.
    pub fn stat_fields(self, info: &WorkInfo) -> Vec<(&'static str, CellData)> {
        let mut fields = Vec::new();
        let mut count = |header: &'static str, stat: &Option<crate::formats::RawStat>| {
            if let Some(value) = stat.as_ref().and_then(|s| s.as_count()) {
                fields.push((header, CellData::Number(value as f64)));
            }
        };

        match self {
            ContentType::Comic => {
                count("Total Views", &info.views);
                count("Subscribers", &info.subscribers);
                if let Some(rating) = info.rating.as_ref().and_then(|r| r.as_float()) {
                    fields.push(("Rating", CellData::Number(rating)));
                }
            }
            ContentType::Novel => {
                count("Total Views", &info.views);
                count("Likes", &info.likes);
                count("Total Chapters", &info.total_chapters);
                count("Total Words", &info.total_words);
                let status = info
                    .status
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or("N/A");
                fields.push(("Status", CellData::Text(status.to_string())));
            }
        }

        fields
    }

    /// Default workbook filename. Append mode uses a fixed name so repeated
    /// scheduled runs keep targeting the same file; fresh mode stamps the
    /// date into the template.
    pub fn default_filename(self, append: bool, date: NaiveDate) -> String {
        let stem = match self {
            ContentType::Comic => "webtoon_stats",
            ContentType::Novel => "novel_stats",
        };
        if append {
            format!("{stem}_daily_append.xlsx")
        } else {
            format!("{stem}_{}.xlsx", date.format("%Y-%m-%d"))
        }
    }
}
