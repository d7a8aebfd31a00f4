pub mod cli;
pub mod config;
pub mod court;
pub mod models;
pub mod scraper;
pub mod storage;

pub use court::{HttpSession, ScraperError, Transport};
pub use scraper::Scraper;
