use crate::court::ScraperError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Earliest publish date the court search accepts.
pub const EARLIEST_SEARCH_DATE: (i32, u32, u32) = (1990, 11, 24);

/// Highest numeric case type code the site assigns.
pub const MAX_CASE_TYPE_CODE: u16 = 999;

pub fn earliest_search_date() -> NaiveDate {
    let (y, m, d) = EARLIEST_SEARCH_DATE;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DecisionType {
    Decision,
    Judgment,
}

impl DecisionType {
    pub fn code(&self) -> u8 {
        match self {
            DecisionType::Decision => 1,
            DecisionType::Judgment => 2,
        }
    }
}

impl TryFrom<u8> for DecisionType {
    type Error = ScraperError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(DecisionType::Decision),
            2 => Ok(DecisionType::Judgment),
            other => Err(ScraperError::validation(format!(
                "Unknown decision type {}. Supported: 1=Decision, 2=Judgment",
                other
            ))),
        }
    }
}

/// Site-defined case type code, e.g. 13 = CrimA, 21 = ADA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CaseType(u16);

impl CaseType {
    pub fn code(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for CaseType {
    type Error = ScraperError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        if (1..=MAX_CASE_TYPE_CODE).contains(&code) {
            Ok(CaseType(code))
        } else {
            Err(ScraperError::validation(format!(
                "Case type {} is out of range 1..={}",
                code, MAX_CASE_TYPE_CODE
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Docx,
}

impl DocumentType {
    /// Map the site's `TypeCode` to a downloadable document type.
    pub fn from_type_code(code: i64) -> Option<Self> {
        match code {
            2 | 4 => Some(DocumentType::Pdf),
            3 => Some(DocumentType::Docx),
            _ => None,
        }
    }

    pub fn file_extension(&self) -> &str {
        match self {
            DocumentType::Pdf => "pdf",
            DocumentType::Docx => "docx",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Pending,
    Success,
    Failed,
}

/// One discovered document and its extracted metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub case_number: String,
    pub parties: String,
    pub decision_date: NaiveDate,
    pub document_type: DocumentType,
    pub download_url: String,
    /// Base file name (without extension) the document is stored under.
    pub filename: String,
    #[serde(rename = "file_size_bytes")]
    pub file_size: Option<u64>,
    pub local_path: Option<PathBuf>,
    #[serde(rename = "download_status")]
    pub status: DownloadStatus,
    pub attempts: u32,
}

impl DocumentRecord {
    pub fn file_name_with_extension(&self) -> String {
        format!("{}.{}", self.filename, self.document_type.file_extension())
    }

    pub fn into_downloaded(self, local_path: PathBuf, file_size: u64, attempts: u32) -> Self {
        DocumentRecord {
            file_size: Some(file_size),
            local_path: Some(local_path),
            status: DownloadStatus::Success,
            attempts,
            ..self
        }
    }

    pub fn into_failed(self, attempts: u32) -> Self {
        DocumentRecord {
            file_size: None,
            local_path: None,
            status: DownloadStatus::Failed,
            attempts,
            ..self
        }
    }
}

/// Search criteria for a run, validated once on construction.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub decision_types: BTreeSet<DecisionType>,
    pub case_types: BTreeSet<CaseType>,
    pub keywords: Option<String>,
}

impl SearchFilter {
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        decision_codes: &[u8],
        case_codes: &[u16],
        keywords: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, ScraperError> {
        if start_date > end_date {
            return Err(ScraperError::validation(format!(
                "Start date {} is after end date {}",
                start_date, end_date
            )));
        }
        validate_search_date(start_date, today)?;
        validate_search_date(end_date, today)?;

        let decision_types = decision_codes
            .iter()
            .map(|&code| DecisionType::try_from(code))
            .collect::<Result<BTreeSet<_>, _>>()?;
        let case_types = case_codes
            .iter()
            .map(|&code| CaseType::try_from(code))
            .collect::<Result<BTreeSet<_>, _>>()?;

        let keywords = keywords
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        Ok(SearchFilter {
            start_date,
            end_date,
            decision_types,
            case_types,
            keywords,
        })
    }

    /// Every calendar day of the run, inclusive on both ends.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |day| *day <= self.end_date)
    }
}

/// Reject dates the site cannot search.
pub fn validate_search_date(date: NaiveDate, today: NaiveDate) -> Result<(), ScraperError> {
    let earliest = earliest_search_date();
    if date < earliest || date > today {
        return Err(ScraperError::validation(format!(
            "Date {} is outside the searchable range {} to {}",
            date, earliest, today
        )));
    }
    Ok(())
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub days_searched: usize,
    pub failed_days: usize,
    pub documents_found: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub skipped: usize,
}
