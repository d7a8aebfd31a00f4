// tests/scrape_run.rs
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;

use verdict_scraper::config::{Config, RetryPolicy};
use verdict_scraper::court::types::SearchPayload;
use verdict_scraper::models::{DownloadStatus, SearchFilter};
use verdict_scraper::storage::load_metadata;
use verdict_scraper::{Scraper, ScraperError, Transport};

const TWO_RECORDS: &str = r#"{
    "data": [
        {"CaseNum": "5678/12", "VerdictDt": "/Date(1349827200000)/", "CaseName": "State of Israel v. Levi",
         "PathForWeb": "EnglishVerdicts/12/780/056/a01", "FileName": "12056780.A01", "TypeCode": 4},
        {"CaseNum": "2222/12", "VerdictDt": "/Date(1349827200000)/", "CaseName": "Cohen v. Minister of Interior",
         "PathForWeb": "EnglishVerdicts/12/220/002/b02", "FileName": "12002220.B02", "TypeCode": 3}
    ]
}"#;

/// In-memory court site: canned search bodies per keyword, file bodies per URL fragment
struct FakeCourt {
    reachable: bool,
    search_bodies: HashMap<String, String>,
    files: Vec<(String, Result<Vec<u8>, u16>)>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeCourt {
    fn new(search_body: &str) -> Self {
        let mut search_bodies = HashMap::new();
        search_bodies.insert(String::new(), search_body.to_string());
        Self {
            reachable: true,
            search_bodies,
            files: vec![
                ("12056780.A01".to_string(), Ok(b"%PDF-1.4 levi judgment".to_vec())),
                ("12002220.B02".to_string(), Ok(b"PK\x03\x04 cohen decision docx".to_vec())),
            ],
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Request history that stays readable after the court moves into a `Scraper`
    fn request_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl Transport for FakeCourt {
    async fn warm_up(&self) -> Result<(), ScraperError> {
        self.requests.lock().unwrap().push("warm_up".to_string());
        if self.reachable {
            Ok(())
        } else {
            Err(ScraperError::Status { url: "https://court.example".to_string(), status: 503 })
        }
    }

    async fn search(&self, url: &str, payload: &SearchPayload) -> Result<String, ScraperError> {
        self.requests.lock().unwrap().push(format!("search {}", url));
        let keywords = payload.document.search_text[0].text.clone();
        Ok(self
            .search_bodies
            .get(&keywords)
            .cloned()
            .unwrap_or_else(|| r#"{"data": []}"#.to_string()))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
        self.requests.lock().unwrap().push(format!("fetch {}", url));
        for (fragment, response) in &self.files {
            if url.contains(fragment.as_str()) {
                return match response {
                    Ok(bytes) => Ok(bytes.clone()),
                    Err(status) => Err(ScraperError::Status { url: url.to_string(), status: *status }),
                };
            }
        }
        Err(ScraperError::Status { url: url.to_string(), status: 404 })
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 1, 1)
}

fn test_config(output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.base_url = "https://court.example".to_string();
    config.output_dir = output_dir.to_path_buf();
    config.rate_limits.search_delay_ms = 0;
    config.rate_limits.download_delay_ms = 0;
    config.retry = RetryPolicy { max_attempts: 3, backoff_ms: 1 };
    config
}

fn single_day(keywords: Option<&str>) -> SearchFilter {
    let day = date(2012, 10, 10);
    SearchFilter::new(day, day, &[], &[], keywords, today()).unwrap()
}

#[tokio::test]
async fn two_listed_records_produce_two_files_and_entries() {
    let dir = TempDir::new().unwrap();
    let scraper = Scraper::new(test_config(dir.path()), FakeCourt::new(TWO_RECORDS));

    let summary = scraper.run(&single_day(None), today()).await.unwrap();
    assert_eq!(summary.documents_found, 2);
    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.failed, 0);

    let files: Vec<_> = fs::read_dir(dir.path().join("documents")).unwrap().collect();
    assert_eq!(files.len(), 2);
    assert!(dir.path().join("documents/567812_2012-10-10_0001.pdf").exists());
    assert!(dir.path().join("documents/222212_2012-10-10_0002.docx").exists());

    let metadata = load_metadata(&dir.path().join("metadata.json")).await.unwrap();
    assert_eq!(metadata.documents.len(), 2);
    assert_eq!(metadata.successful_downloads, 2);
    assert_eq!(metadata.documents[0].parties, "State of Israel v. Levi");

    let log = fs::read_to_string(dir.path().join("download_log.txt")).unwrap();
    assert!(log.lines().filter(|l| l.contains("\tSUCCESS\t")).count() >= 2);
}

#[tokio::test]
async fn recorded_sizes_match_files_on_disk() {
    let dir = TempDir::new().unwrap();
    let scraper = Scraper::new(test_config(dir.path()), FakeCourt::new(TWO_RECORDS));
    scraper.run(&single_day(None), today()).await.unwrap();

    let metadata = load_metadata(&dir.path().join("metadata.json")).await.unwrap();
    for record in metadata.documents.iter().filter(|d| d.status == DownloadStatus::Success) {
        let path = record.local_path.as_ref().unwrap();
        assert_eq!(record.file_size, Some(fs::metadata(path).unwrap().len()));
    }
}

#[tokio::test]
async fn empty_listing_completes_without_downloads() {
    let dir = TempDir::new().unwrap();
    let court = FakeCourt::new(r#"{"data": []}"#);
    let scraper = Scraper::new(test_config(dir.path()), court);

    let summary = scraper.run(&single_day(None), today()).await.unwrap();
    assert_eq!(summary.downloaded, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(fs::read_dir(dir.path().join("documents")).unwrap().count(), 0);
}

#[tokio::test]
async fn unmatched_keywords_write_empty_metadata() {
    let dir = TempDir::new().unwrap();
    let scraper = Scraper::new(test_config(dir.path()), FakeCourt::new(TWO_RECORDS));

    let summary = scraper
        .run(&single_day(Some("no such phrase anywhere")), today())
        .await
        .unwrap();
    assert_eq!(summary.documents_found, 0);

    let metadata = load_metadata(&dir.path().join("metadata.json")).await.unwrap();
    assert!(metadata.documents.is_empty());
    assert_eq!(metadata.total_documents, 0);
}

#[tokio::test]
async fn failing_download_is_marked_and_run_continues() {
    let dir = TempDir::new().unwrap();
    let mut court = FakeCourt::new(TWO_RECORDS);
    court.files[0].1 = Err(503);
    let scraper = Scraper::new(test_config(dir.path()), court);

    let summary = scraper.run(&single_day(None), today()).await.unwrap();
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.failed, 1);

    let metadata = load_metadata(&dir.path().join("metadata.json")).await.unwrap();
    assert_eq!(metadata.documents[0].status, DownloadStatus::Failed);
    assert_eq!(metadata.documents[0].attempts, 3);
    assert_eq!(metadata.documents[1].status, DownloadStatus::Success);

    let log = fs::read_to_string(dir.path().join("download_log.txt")).unwrap();
    assert_eq!(log.lines().filter(|l| l.contains("\tFAILURE\t5678/12")).count(), 3);
}

#[tokio::test]
async fn unreachable_site_aborts_before_search() {
    let dir = TempDir::new().unwrap();
    let mut court = FakeCourt::new(TWO_RECORDS);
    court.reachable = false;
    let requests = court.request_log();
    let scraper = Scraper::new(test_config(dir.path()), court);

    let result = scraper.run(&single_day(None), today()).await;
    assert!(result.is_err());
    assert_eq!(*requests.lock().unwrap(), vec!["warm_up".to_string()]);
    assert!(!dir.path().join("metadata.json").exists());
}

#[tokio::test]
async fn out_of_range_dates_fail_before_any_request() {
    let dir = TempDir::new().unwrap();
    let court = FakeCourt::new(TWO_RECORDS);
    let requests = court.request_log();
    let scraper = Scraper::new(test_config(dir.path()), court);

    // valid when built, but the run's "today" predates the searched day
    let filter = single_day(None);
    let result = scraper.run(&filter, date(2012, 10, 9)).await;

    assert!(matches!(result, Err(ScraperError::Validation(_))));
    assert!(requests.lock().unwrap().is_empty());
    assert!(!dir.path().join("download_log.txt").exists());
}

#[tokio::test]
async fn unparseable_search_body_is_logged_and_run_continues() {
    let dir = TempDir::new().unwrap();
    let court = FakeCourt::new("<html>Service Unavailable</html>");
    let scraper = Scraper::new(test_config(dir.path()), court);

    let summary = scraper.run(&single_day(None), today()).await.unwrap();
    assert_eq!(summary.failed_days, 1);
    assert_eq!(summary.downloaded, 0);

    let log = fs::read_to_string(dir.path().join("download_log.txt")).unwrap();
    assert_eq!(
        log.lines()
            .filter(|l| l.contains("\tFAILURE\tsearch 2012-10-10\t"))
            .count(),
        1
    );

    let metadata = load_metadata(&dir.path().join("metadata.json")).await.unwrap();
    assert!(metadata.documents.is_empty());
}
