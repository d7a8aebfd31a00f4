//! Run output: downloaded files, `metadata.json` and `download_log.txt`

use crate::court::ScraperError;
use crate::models::{DocumentRecord, DownloadStatus};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

pub const DOCUMENTS_DIR: &str = "documents";
pub const METADATA_FILE: &str = "metadata.json";
pub const DOWNLOAD_LOG_FILE: &str = "download_log.txt";

/// Serialized form of `metadata.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub download_timestamp: DateTime<Utc>,
    pub total_documents: usize,
    pub successful_downloads: usize,
    pub failed_downloads: usize,
    pub documents: Vec<DocumentRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    Success,
    Failure,
    Info,
}

impl LogOutcome {
    fn as_str(&self) -> &str {
        match self {
            LogOutcome::Success => "SUCCESS",
            LogOutcome::Failure => "FAILURE",
            LogOutcome::Info => "INFO",
        }
    }
}

/// Append-only, human-readable event log. Earlier runs' lines are kept.
pub struct DownloadLog {
    file: File,
}

impl DownloadLog {
    pub async fn open(path: &Path) -> Result<Self, ScraperError> {
        let file = OpenOptions::new().create(true).append(true).open(path).await?;
        Ok(Self { file })
    }

    /// Record one download attempt.
    pub async fn attempt(
        &mut self,
        outcome: LogOutcome,
        record: &DocumentRecord,
        attempt: u32,
        max_attempts: u32,
        detail: &str,
    ) -> Result<(), ScraperError> {
        let line = format!(
            "{}\t{}\tattempt {}/{}\t{}",
            record.case_number,
            record.file_name_with_extension(),
            attempt,
            max_attempts,
            detail
        );
        self.write(outcome, &line).await
    }

    pub async fn write(&mut self, outcome: LogOutcome, message: &str) -> Result<(), ScraperError> {
        let line = format!(
            "{}\t{}\t{}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            outcome.as_str(),
            message
        );
        self.file.write_all(line.as_bytes()).await?;
        self.file.flush().await?;
        Ok(())
    }
}

/// Everything a run produces, accumulated in listing order.
pub struct RunOutput {
    output_dir: PathBuf,
    documents_dir: PathBuf,
    start_date: NaiveDate,
    end_date: NaiveDate,
    documents: Vec<DocumentRecord>,
    log: DownloadLog,
}

impl RunOutput {
    /// Create the output layout and open the log.
    pub async fn create(
        output_dir: &Path,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, ScraperError> {
        let documents_dir = output_dir.join(DOCUMENTS_DIR);
        fs::create_dir_all(&documents_dir).await?;
        let log = DownloadLog::open(&output_dir.join(DOWNLOAD_LOG_FILE)).await?;

        debug!("Output prepared under {}", output_dir.display());
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            documents_dir,
            start_date,
            end_date,
            documents: Vec::new(),
            log,
        })
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.output_dir.join(METADATA_FILE)
    }

    pub fn log_mut(&mut self) -> &mut DownloadLog {
        &mut self.log
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn push(&mut self, record: DocumentRecord) {
        self.documents.push(record);
    }

    pub fn count(&self, status: DownloadStatus) -> usize {
        self.documents.iter().filter(|d| d.status == status).count()
    }

    pub fn metadata(&self) -> RunMetadata {
        RunMetadata {
            start_date: self.start_date,
            end_date: self.end_date,
            download_timestamp: Utc::now(),
            total_documents: self.documents.len(),
            successful_downloads: self.count(DownloadStatus::Success),
            failed_downloads: self.count(DownloadStatus::Failed),
            documents: self.documents.clone(),
        }
    }

    /// Replace `metadata.json` with the current collection.
    pub async fn flush_metadata(&self) -> Result<(), ScraperError> {
        let path = self.metadata_path();
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(&self.metadata())?;

        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &path).await?;

        info!("Saved metadata for {} documents to {}", self.documents.len(), path.display());
        Ok(())
    }
}

/// Read a previously written `metadata.json`.
pub async fn load_metadata(path: &Path) -> Result<RunMetadata, ScraperError> {
    let raw = fs::read(path).await?;
    Ok(serde_json::from_slice(&raw)?)
}
