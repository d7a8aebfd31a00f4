//! Document downloading with bounded retry

use crate::config::RetryPolicy;
use crate::court::{ScraperError, Transport};
use crate::models::DocumentRecord;
use crate::storage::{DownloadLog, LogOutcome};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

/// Download one record into `documents_dir`.
///
/// Transient failures are retried up to `retry.max_attempts` with exponential
/// backoff. A document that cannot be fetched comes back marked failed; only a
/// failure to write output is returned as an error.
pub async fn download_record<T: Transport + ?Sized>(
    transport: &T,
    record: DocumentRecord,
    documents_dir: &Path,
    retry: &RetryPolicy,
    log: &mut DownloadLog,
) -> Result<DocumentRecord, ScraperError> {
    let output_path = documents_dir.join(record.file_name_with_extension());
    let max_attempts = retry.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        debug!(
            "Downloading {} from {} (attempt {}/{})",
            record.filename, record.download_url, attempt, max_attempts
        );

        match transport.fetch(&record.download_url).await {
            Ok(content) => {
                // Existing files from earlier runs are overwritten.
                fs::write(&output_path, &content).await?;
                let file_size = fs::metadata(&output_path).await?.len();

                log.attempt(
                    LogOutcome::Success,
                    &record,
                    attempt,
                    max_attempts,
                    &format!("{} bytes", file_size),
                )
                .await?;
                info!("✓ Saved {} ({} bytes)", output_path.display(), file_size);

                return Ok(record.into_downloaded(output_path, file_size, attempt));
            }
            Err(e) => {
                log.attempt(LogOutcome::Failure, &record, attempt, max_attempts, &e.to_string())
                    .await?;

                if !e.is_transient() || attempt == max_attempts {
                    warn!(
                        "✗ Failed to download {} after {} attempt(s): {}",
                        record.case_number, attempt, e
                    );
                    return Ok(record.into_failed(attempt));
                }

                let delay = retry.backoff(attempt);
                warn!(
                    "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                    attempt, max_attempts, record.case_number, e, delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    Ok(record.into_failed(max_attempts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::court::types::SearchPayload;
    use crate::models::{DocumentType, DownloadStatus};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serves scripted fetch results in order
    struct ScriptedTransport {
        responses: Mutex<Vec<Result<Vec<u8>, u16>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedTransport {
        fn new(mut responses: Vec<Result<Vec<u8>, u16>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn search(&self, _url: &str, _payload: &SearchPayload) -> Result<String, ScraperError> {
            unreachable!("downloader never searches")
        }

        async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
            *self.calls.lock().unwrap() += 1;
            match self.responses.lock().unwrap().pop() {
                Some(Ok(bytes)) => Ok(bytes),
                Some(Err(status)) => Err(ScraperError::Status { url: url.to_string(), status }),
                None => Err(ScraperError::Status { url: url.to_string(), status: 503 }),
            }
        }
    }

    fn record() -> DocumentRecord {
        DocumentRecord {
            case_number: "5678/12".into(),
            parties: "State v. Levi".into(),
            decision_date: NaiveDate::from_ymd_opt(2012, 10, 10).unwrap(),
            document_type: DocumentType::Pdf,
            download_url: "https://court.example/Home/Download?type=4".into(),
            filename: "567812_2012-10-10_0001".into(),
            file_size: None,
            local_path: None,
            status: DownloadStatus::Pending,
            attempts: 0,
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy { max_attempts: 3, backoff_ms: 1 }
    }

    #[tokio::test]
    async fn test_retries_transient_failure_then_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let mut log = DownloadLog::open(&temp_dir.path().join("log.txt")).await.unwrap();
        let transport = ScriptedTransport::new(vec![Err(503), Ok(b"%PDF-1.4 body".to_vec())]);

        let result = download_record(&transport, record(), temp_dir.path(), &fast_retry(), &mut log)
            .await
            .unwrap();

        assert_eq!(result.status, DownloadStatus::Success);
        assert_eq!(result.attempts, 2);
        assert_eq!(transport.calls(), 2);

        let path = result.local_path.clone().unwrap();
        assert_eq!(path, temp_dir.path().join("567812_2012-10-10_0001.pdf"));
        assert_eq!(result.file_size, Some(std::fs::metadata(&path).unwrap().len()));
    }

    #[tokio::test]
    async fn test_exhausted_retries_mark_record_failed() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("log.txt");
        let mut log = DownloadLog::open(&log_path).await.unwrap();
        let transport = ScriptedTransport::new(vec![Err(500), Err(502), Err(504)]);

        let result = download_record(&transport, record(), temp_dir.path(), &fast_retry(), &mut log)
            .await
            .unwrap();

        assert_eq!(result.status, DownloadStatus::Failed);
        assert_eq!(result.attempts, 3);
        assert!(result.local_path.is_none());
        assert_eq!(transport.calls(), 3);

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(content.lines().filter(|l| l.contains("\tFAILURE\t")).count(), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let temp_dir = TempDir::new().unwrap();
        let mut log = DownloadLog::open(&temp_dir.path().join("log.txt")).await.unwrap();
        let transport = ScriptedTransport::new(vec![Err(404), Ok(b"never".to_vec())]);

        let result = download_record(&transport, record(), temp_dir.path(), &fast_retry(), &mut log)
            .await
            .unwrap();

        assert_eq!(result.status, DownloadStatus::Failed);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let mut log = DownloadLog::open(&temp_dir.path().join("log.txt")).await.unwrap();
        let transport = ScriptedTransport::new(vec![Ok(b"body".to_vec())]);
        let missing = temp_dir.path().join("does-not-exist");

        let result = download_record(&transport, record(), &missing, &fast_retry(), &mut log).await;
        assert!(matches!(result, Err(ScraperError::Filesystem(_))));
    }
}
