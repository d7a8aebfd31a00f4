use crate::court::ScraperError;
use crate::models::SearchFilter;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "verdict-scraper")]
#[command(about = "Download published Supreme Court decisions and their metadata for a date range")]
#[command(version)]
pub struct Cli {
    /// Search start date (YYYY-MM-DD)
    #[arg(long = "start-date", alias = "start_date")]
    pub start_date: NaiveDate,

    /// Search end date (YYYY-MM-DD)
    #[arg(long = "end-date", alias = "end_date")]
    pub end_date: NaiveDate,

    /// Decision type(s): 1=Decision, 2=Judgment
    #[arg(long = "decision-type", alias = "decision_type", num_args = 1..)]
    pub decision_type: Vec<u8>,

    /// Case type code(s), e.g. 13=CrimA, 21=ADA
    #[arg(long = "case-type", alias = "case_type", num_args = 1..)]
    pub case_type: Vec<u16>,

    /// Free-text search
    #[arg(long)]
    pub keywords: Option<String>,

    /// Output directory
    #[arg(short, long = "output-dir", default_value = "output")]
    pub output_dir: PathBuf,

    /// JSON file with base_url, search_path, headers and cookies
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Validate the arguments into a search filter, relative to `today`.
    pub fn search_filter(&self, today: NaiveDate) -> Result<SearchFilter, ScraperError> {
        SearchFilter::new(
            self.start_date,
            self.end_date,
            &self.decision_type,
            &self.case_type,
            self.keywords.as_deref(),
            today,
        )
    }
}
