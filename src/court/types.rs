//! Wire types for the court search endpoint

use serde::{Deserialize, Serialize};

/// Search endpoint request body
#[derive(Debug, Clone, Serialize)]
pub struct SearchPayload {
    pub document: SearchDocument,
    /// Interface language; "2" selects the English listing
    pub lan: String,
}

/// Search criteria block of the request body
#[derive(Debug, Clone, Serialize)]
pub struct SearchDocument {
    #[serde(rename = "dateType")]
    pub date_type: u8,
    #[serde(rename = "PublishFrom")]
    pub publish_from: String,
    #[serde(rename = "PublishTo")]
    pub publish_to: String,
    #[serde(rename = "publishDate")]
    pub publish_date: u8,
    #[serde(rename = "translationDateType")]
    pub translation_date_type: u8,
    #[serde(rename = "translationPublishFrom")]
    pub translation_publish_from: String,
    #[serde(rename = "translationPublishTo")]
    pub translation_publish_to: String,
    #[serde(rename = "translationPublishDate")]
    pub translation_publish_date: u8,
    #[serde(rename = "SearchText")]
    pub search_text: Vec<TextClause>,
    #[serde(rename = "Parties")]
    pub parties: Vec<TextClause>,
    #[serde(rename = "Counsel")]
    pub counsel: Vec<TextClause>,
    #[serde(rename = "AllSubjects")]
    pub all_subjects: Vec<SubjectClause>,
    /// Decision type codes
    #[serde(rename = "CodeTypes")]
    pub code_types: Vec<u8>,
    /// Case type codes
    #[serde(rename = "CodeInyan")]
    pub code_inyan: Vec<u16>,
    #[serde(rename = "Old")]
    pub old: bool,
    #[serde(rename = "JudgesOperator")]
    pub judges_operator: u8,
    #[serde(rename = "OldMainNumFormat")]
    pub old_main_num_format: bool,
}

/// Free-text criterion as the search form submits it
#[derive(Debug, Clone, Serialize)]
pub struct TextClause {
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "textOperator")]
    pub text_operator: u8,
    pub option: String,
    #[serde(rename = "Inverted")]
    pub inverted: bool,
    #[serde(rename = "Synonym")]
    pub synonym: bool,
    #[serde(rename = "NearDistance")]
    pub near_distance: u8,
    #[serde(rename = "MatchOrder")]
    pub match_order: bool,
}

impl TextClause {
    pub fn new(text: impl Into<String>, text_operator: u8) -> Self {
        Self {
            text: text.into(),
            text_operator,
            option: "2".to_string(),
            inverted: false,
            synonym: false,
            near_distance: 3,
            match_order: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SubjectClause {
    #[serde(rename = "Subject")]
    pub subject: Option<String>,
    #[serde(rename = "SubSubject")]
    pub sub_subject: Option<String>,
    #[serde(rename = "SubSubSubject")]
    pub sub_sub_subject: Option<String>,
}

/// Search endpoint response
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// Listing entries, kept raw so one malformed entry cannot fail the rest
    #[serde(default)]
    pub data: Option<Vec<serde_json::Value>>,
}

/// One listing entry as the site returns it
#[derive(Debug, Clone, Deserialize)]
pub struct RawVerdict {
    /// Usually a string such as "5678/12"; older listings send a bare number
    #[serde(rename = "CaseNum")]
    pub case_num: Option<serde_json::Value>,
    /// `/Date(<millis>)/`
    #[serde(rename = "VerdictDt")]
    pub verdict_dt: Option<String>,
    #[serde(rename = "CaseName")]
    pub case_name: Option<String>,
    #[serde(rename = "PathForWeb")]
    pub path_for_web: Option<String>,
    #[serde(rename = "FileName")]
    pub file_name: Option<String>,
    #[serde(rename = "TypeCode")]
    pub type_code: Option<i64>,
}

impl RawVerdict {
    /// Case number as text, whatever JSON type the listing used for it.
    pub fn case_number(&self) -> Option<String> {
        match self.case_num.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Court website endpoints and constants
pub struct CourtApi;

impl CourtApi {
    /// Document download endpoint, relative to the site root
    pub const DOWNLOAD_ENDPOINT: &'static str = "/Home/Download";
    /// English interface
    pub const LANGUAGE: &'static str = "2";
    /// Search by publish date
    pub const DATE_TYPE_PUBLISH: u8 = 2;
    /// Custom publish window
    pub const PUBLISH_RANGE_CUSTOM: u8 = 8;
    pub const TEXT_OPERATOR_AND: u8 = 1;
    pub const TEXT_OPERATOR_OR: u8 = 2;
}
