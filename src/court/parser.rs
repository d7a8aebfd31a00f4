//! Search response parsing

use crate::court::types::{CourtApi, RawVerdict, SearchResponse};
use crate::court::ScraperError;
use crate::models::{DocumentRecord, DocumentType, DownloadStatus};
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use reqwest::Url;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Records recovered from one day's listing
#[derive(Debug, Default)]
pub struct ParsedListing {
    pub records: Vec<DocumentRecord>,
    /// Entries dropped because a required field was missing or malformed
    pub skipped: usize,
}

/// Parse a raw search response into partial document records, in listing order.
///
/// `first_sequence` numbers the first kept record; numbering is contiguous
/// over kept records so stored file names never collide within a run.
pub fn parse_search_response(
    body: &str,
    date: NaiveDate,
    base_url: &str,
    first_sequence: usize,
) -> Result<ParsedListing, ScraperError> {
    let response: SearchResponse = serde_json::from_str(body).map_err(|e| ScraperError::Parse {
        date: date.to_string(),
        message: e.to_string(),
    })?;

    let entries = response.data.unwrap_or_default();
    debug!("Search response for {} has {} entries", date, entries.len());

    let mut listing = ParsedListing::default();
    for (index, entry) in entries.into_iter().enumerate() {
        let sequence = first_sequence + listing.records.len();

        let raw: RawVerdict = match serde_json::from_value(entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skipping malformed entry {} for {}: {}", index + 1, date, e);
                listing.skipped += 1;
                continue;
            }
        };

        match to_record(raw, base_url, sequence) {
            Ok(record) => listing.records.push(record),
            Err(reason) => {
                warn!("Skipping entry {} for {}: {}", index + 1, date, reason);
                listing.skipped += 1;
            }
        }
    }

    Ok(listing)
}

fn to_record(raw: RawVerdict, base_url: &str, sequence: usize) -> Result<DocumentRecord, String> {
    let case_number = raw
        .case_number()
        .unwrap_or_else(|| format!("case_{}", sequence));

    let (path, file_name) = match (raw.path_for_web, raw.file_name) {
        (Some(path), Some(file)) if !path.is_empty() && !file.is_empty() => (path, file),
        _ => return Err(format!("missing path or file name for case {}", case_number)),
    };

    let type_code = raw
        .type_code
        .ok_or_else(|| format!("missing type code for case {}", case_number))?;
    let document_type = DocumentType::from_type_code(type_code)
        .ok_or_else(|| format!("unsupported file type {} for case {}", type_code, case_number))?;

    let decision_date = raw
        .verdict_dt
        .as_deref()
        .and_then(parse_ms_date)
        .ok_or_else(|| format!("missing or invalid decision date for case {}", case_number))?;

    let download_url = build_download_url(base_url, &path, &file_name, type_code)
        .map_err(|e| e.to_string())?;

    let filename = sanitize_filename(&format!(
        "{}_{}_{:04}",
        case_number,
        decision_date.format("%Y-%m-%d"),
        sequence
    ));

    Ok(DocumentRecord {
        case_number,
        parties: raw.case_name.unwrap_or_default(),
        decision_date,
        document_type,
        download_url,
        filename,
        file_size: None,
        local_path: None,
        status: DownloadStatus::Pending,
        attempts: 0,
    })
}

/// `/Date(<millis>)/`, optionally with a `+hhmm` offset before the closing paren
static MS_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/Date\((-?\d+)(?:[+-]\d{4})?\)/").expect("valid date pattern")
});

/// Anything that is not a word character, whitespace or `-`
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid filename pattern"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Convert `/Date(1349827200000)/` (optionally with a `+hhmm` suffix) to a UTC date.
/// Plain `YYYY-MM-DD...` strings are accepted as well.
pub fn parse_ms_date(value: &str) -> Option<NaiveDate> {
    if value.contains("/Date(") {
        let millis: i64 = MS_DATE.captures(value)?.get(1)?.as_str().parse().ok()?;
        return DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive());
    }

    value
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Official download endpoint for one listed file.
pub fn build_download_url(
    base_url: &str,
    path: &str,
    file_name: &str,
    type_code: i64,
) -> Result<String, ScraperError> {
    let mut url = Url::parse(base_url)
        .and_then(|base| base.join(CourtApi::DOWNLOAD_ENDPOINT))
        .map_err(|e| ScraperError::Config(format!("Invalid base URL {}: {}", base_url, e)))?;

    url.query_pairs_mut()
        .append_pair("path", path)
        .append_pair("fileName", file_name)
        .append_pair("type", &type_code.to_string());

    Ok(url.to_string())
}

/// Drop characters outside `[\w\s-]`, turn whitespace runs into `_`, lowercase.
pub fn sanitize_filename(name: &str) -> String {
    let kept = UNSAFE_FILENAME_CHARS.replace_all(name, "");
    WHITESPACE_RUN.replace_all(&kept, "_").to_lowercase()
}
