use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Stat value as scrapers emit it: either already numeric or a display
/// string like `"1,234"` / `"9.5"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawStat {
    Number(f64),
    Text(String),
}

impl RawStat {
    /// Integer reading: numbers are truncated, strings are stripped of every
    /// non-digit character first (so `"1,234 views"` becomes `1234`).
    pub fn as_count(&self) -> Option<u64> {
        match self {
            RawStat::Number(n) if *n >= 0.0 => Some(*n as u64),
            RawStat::Number(_) => None,
            RawStat::Text(s) => {
                let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
                if digits.is_empty() {
                    return None;
                }
                digits.parse().ok()
            }
        }
    }

    /// Float reading for rating-like fields; strings parse leniently
    /// (`"9.5 / 10"` becomes `9.5`).
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RawStat::Number(n) => Some(*n),
            RawStat::Text(s) => {
                let head: String = s
                    .trim()
                    .chars()
                    .take_while(|c| c.is_ascii_digit() || *c == '.')
                    .collect();
                if head.is_empty() {
                    return None;
                }
                head.parse().ok()
            }
        }
    }
}

/// Scraped metadata snapshot for one title. Produced fresh per scrape and
/// only ever projected into a worksheet row, never persisted as-is.
///
/// Comics fill `views`/`subscribers`/`rating`; novels fill
/// `views`/`likes`/`status`/`total_chapters`/`total_words`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub views: Option<RawStat>,
    #[serde(default)]
    pub subscribers: Option<RawStat>,
    #[serde(default)]
    pub rating: Option<RawStat>,
    #[serde(default)]
    pub likes: Option<RawStat>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_chapters: Option<RawStat>,
    #[serde(default)]
    pub total_words: Option<RawStat>,
}

/// One raw chapter as scraped. `number` is a display string and may carry a
/// `#` prefix; `likes` is the comic metric, `words` the novel metric.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub likes: Option<RawStat>,
    #[serde(default)]
    pub words: Option<RawStat>,
    /// Volume/collection grouping, used by the novel header format.
    #[serde(default)]
    pub collection: Option<String>,
    /// Explicit column-header override from the source site.
    #[serde(default)]
    pub chapter_display_name: Option<String>,
}

/// The JSON document the scraper hands to `save` (and the CLI reads from
/// `--input`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapePayload {
    pub info: WorkInfo,
    #[serde(default)]
    pub chapters: Vec<ChapterRecord>,
}

/// Result of one completed save operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub file_path: PathBuf,
    pub row_added: bool,
    pub initial_row_count: u32,
    pub final_row_count: u32,
    pub worksheet_name: String,
    /// Wall-clock seconds spent in the save operation.
    pub processing_time: f64,
    pub is_append_mode: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_stat_count_strips_thousands_separators() {
        let stat = RawStat::Text("1,234,567".to_string());
        assert_eq!(stat.as_count(), Some(1_234_567));
    }

    #[test]
    fn raw_stat_count_rejects_text_without_digits() {
        assert_eq!(RawStat::Text("ongoing".to_string()).as_count(), None);
    }

    #[test]
    fn raw_stat_float_reads_rating_prefix() {
        assert_eq!(RawStat::Text("9.5 / 10".to_string()).as_float(), Some(9.5));
    }

    #[test]
    fn chapter_record_accepts_camel_case_display_name() {
        let record: ChapterRecord = serde_json::from_str(
            r##"{"number":"#3","likes":"100","chapterDisplayName":"Episode 3"}"##,
        )
        .unwrap();
        assert_eq!(record.chapter_display_name.as_deref(), Some("Episode 3"));
    }

    #[test]
    fn raw_stat_accepts_both_number_and_string() {
        let payload: ScrapePayload = serde_json::from_str(
            r#"{"info":{"title":"T","author":"A","views":1234,"rating":"9.5"},"chapters":[]}"#,
        )
        .unwrap();
        assert_eq!(payload.info.views.unwrap().as_count(), Some(1234));
        assert_eq!(payload.info.rating.unwrap().as_float(), Some(9.5));
    }
}
