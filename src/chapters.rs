use std::collections::BTreeMap;

use crate::formats::ChapterRecord;
use crate::strategy::ContentType;

/// Canonical form of one scraped chapter: the extracted numeric metric plus
/// the source record, kept for header formatting.
#[derive(Debug, Clone)]
pub struct NormalizedChapter {
    pub number: u32,
    pub metric: u64,
    pub source: ChapterRecord,
}

/// Chapters keyed by `ch` + 3-digit zero-padded number. The fixed-width
/// padding is what makes lexicographic key order equal numeric chapter
/// order, so iteration over the map visits chapters in reading order.
pub type ChapterMap = BTreeMap<String, NormalizedChapter>;

pub fn chapter_key(number: u32) -> String {
    format!("ch{number:03}")
}

/// Trailing digit run of a chapter number string (`"#12"` → 12,
/// `"Episode 7"` → 7). A leading `#` is irrelevant to the trailing run but
/// comics commonly carry one.
pub fn trailing_number(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let run_start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    trimmed[run_start..].parse().ok()
}

/// Builds the canonical chapter map for one scrape. Records whose number
/// field has no trailing digits are skipped with a warning rather than
/// failing the save; duplicate chapter numbers let the later record win.
pub fn normalize(chapters: &[ChapterRecord], kind: ContentType) -> ChapterMap {
    let mut normalized = ChapterMap::new();

    for record in chapters {
        let Some(number) = trailing_number(&record.number) else {
            tracing::warn!(
                number = %record.number,
                "unable to parse chapter number, skipping record"
            );
            continue;
        };

        let metric = kind.chapter_metric(record);
        let key = chapter_key(number);
        if normalized.contains_key(&key) {
            tracing::debug!(key = %key, "duplicate chapter number, later record wins");
        }
        normalized.insert(
            key,
            NormalizedChapter {
                number,
                metric,
                source: record.clone(),
            },
        );
    }

    if !normalized.is_empty() {
        tracing::debug!(
            count = normalized.len(),
            kind = kind.label(),
            "normalized chapters"
        );
    }

    normalized
}
