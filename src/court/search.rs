//! Search request construction

use crate::court::types::{CourtApi, SearchDocument, SearchPayload, SubjectClause, TextClause};
use crate::court::ScraperError;
use crate::models::{validate_search_date, SearchFilter};
use chrono::NaiveDate;

const DAY_START: &str = "T00:00:00.000Z";
const DAY_END: &str = "T23:59:59.999Z";

/// Build the search payload for decisions published on `date`.
///
/// Fails with [`ScraperError::Validation`] when `date` falls outside the
/// searchable range, so no request is ever sent for it.
pub fn build_search_payload(
    date: NaiveDate,
    filter: &SearchFilter,
    today: NaiveDate,
) -> Result<SearchPayload, ScraperError> {
    validate_search_date(date, today)?;

    let day = date.format("%Y-%m-%d").to_string();
    let publish_from = format!("{}{}", day, DAY_START);
    let publish_to = format!("{}{}", day, DAY_END);

    let keywords = filter.keywords.clone().unwrap_or_default();

    Ok(SearchPayload {
        document: SearchDocument {
            date_type: CourtApi::DATE_TYPE_PUBLISH,
            publish_from: publish_from.clone(),
            publish_to: publish_to.clone(),
            publish_date: CourtApi::PUBLISH_RANGE_CUSTOM,
            translation_date_type: 1,
            translation_publish_from: publish_from,
            translation_publish_to: publish_to,
            translation_publish_date: CourtApi::PUBLISH_RANGE_CUSTOM,
            search_text: vec![TextClause::new(keywords, CourtApi::TEXT_OPERATOR_AND)],
            parties: vec![TextClause::new("", CourtApi::TEXT_OPERATOR_OR)],
            counsel: vec![TextClause::new("", CourtApi::TEXT_OPERATOR_OR)],
            all_subjects: vec![SubjectClause::default()],
            code_types: filter.decision_types.iter().map(|t| t.code()).collect(),
            code_inyan: filter.case_types.iter().map(|t| t.code()).collect(),
            old: false,
            judges_operator: CourtApi::TEXT_OPERATOR_OR,
            old_main_num_format: false,
        },
        lan: CourtApi::LANGUAGE.to_string(),
    })
}
