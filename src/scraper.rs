//! Run orchestration: search each day of the range, then download its documents

use crate::config::Config;
use crate::court::types::SearchPayload;
use crate::court::{build_search_payload, download_record, parse_search_response, ScraperError, Transport};
use crate::models::{validate_search_date, DownloadStatus, RunSummary, SearchFilter};
use crate::storage::{LogOutcome, RunOutput};
use chrono::NaiveDate;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub struct Scraper<T: Transport> {
    config: Config,
    transport: T,
}

impl<T: Transport> Scraper<T> {
    pub fn new(config: Config, transport: T) -> Self {
        Self { config, transport }
    }

    /// Scrape every day of `filter`'s range into the configured output directory.
    ///
    /// Per-document and per-day failures are counted in the summary. Only
    /// validation, session setup and filesystem errors end the run early.
    pub async fn run(&self, filter: &SearchFilter, today: NaiveDate) -> Result<RunSummary, ScraperError> {
        validate_search_date(filter.start_date, today)?;
        validate_search_date(filter.end_date, today)?;

        info!(
            "🚀 Searching decisions published from {} to {}",
            filter.start_date, filter.end_date
        );
        let start_time = Instant::now();

        self.transport.warm_up().await?;

        let mut output = RunOutput::create(&self.config.output_dir, filter.start_date, filter.end_date).await?;
        let documents_dir = output.documents_dir().to_path_buf();
        output
            .log_mut()
            .write(
                LogOutcome::Info,
                &format!("run started for {} to {}", filter.start_date, filter.end_date),
            )
            .await?;

        let search_url = self.config.search_url();
        let mut summary = RunSummary::default();

        for (day_index, day) in filter.days().enumerate() {
            if day_index > 0 {
                tokio::time::sleep(self.config.search_delay()).await;
            }

            let payload = build_search_payload(day, filter, today)?;
            summary.days_searched += 1;

            let body = match self.search_with_retry(&search_url, &payload, day).await {
                Ok(body) => body,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!("Search for {} failed: {}", day, e);
                    summary.failed_days += 1;
                    output
                        .log_mut()
                        .write(LogOutcome::Failure, &format!("search {}\t{}", day, e))
                        .await?;
                    continue;
                }
            };

            let first_sequence = output.documents().len() + 1;
            let listing = match parse_search_response(&body, day, &self.config.base_url, first_sequence) {
                Ok(listing) => listing,
                Err(e) => {
                    warn!("Discarding search results for {}: {}", day, e);
                    summary.failed_days += 1;
                    output
                        .log_mut()
                        .write(LogOutcome::Failure, &format!("search {}\t{}", day, e))
                        .await?;
                    continue;
                }
            };

            summary.documents_found += listing.records.len();
            summary.skipped += listing.skipped;

            if listing.records.is_empty() {
                info!("No documents found for {}", day);
            } else {
                info!("Found {} documents for {}", listing.records.len(), day);
            }

            let total = listing.records.len();
            for (index, record) in listing.records.into_iter().enumerate() {
                info!(
                    "Downloading document {}/{} for {}: {} ({})",
                    index + 1,
                    total,
                    day,
                    record.case_number,
                    record.parties
                );

                let record = download_record(
                    &self.transport,
                    record,
                    &documents_dir,
                    &self.config.retry,
                    output.log_mut(),
                )
                .await?;
                output.push(record);

                tokio::time::sleep(self.config.download_delay()).await;
            }

            output.flush_metadata().await?;
        }

        output.flush_metadata().await?;

        summary.downloaded = output.count(DownloadStatus::Success);
        summary.failed = output.count(DownloadStatus::Failed);

        let message = format!(
            "run finished: {} downloaded, {} failed, {} skipped, {} of {} days failed",
            summary.downloaded, summary.failed, summary.skipped, summary.failed_days, summary.days_searched
        );
        output.log_mut().write(LogOutcome::Info, &message).await?;

        let elapsed = start_time.elapsed();
        info!("🎉 Scraping complete: {} successful, {} failed", summary.downloaded, summary.failed);
        info!("⏱️  Total time: {} minutes {} seconds", elapsed.as_secs() / 60, elapsed.as_secs() % 60);

        Ok(summary)
    }

    async fn search_with_retry(
        &self,
        url: &str,
        payload: &SearchPayload,
        day: NaiveDate,
    ) -> Result<String, ScraperError> {
        let retry = &self.config.retry;
        let max_attempts = retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!("Searching {} (attempt {}/{})", day, attempt, max_attempts);
            match self.transport.search(url, payload).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = retry.backoff(attempt);
                    warn!("Search for {} failed: {}; retrying in {:?}", day, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
