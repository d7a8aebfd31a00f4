//! Court website module
//!
//! Everything that talks to the court's public decision search: the HTTP
//! session, search payload construction, listing parsing and document
//! downloads.

pub mod types;
pub mod errors;
pub mod session;
pub mod search;
pub mod parser;
pub mod downloader;

pub use errors::ScraperError;
pub use session::{HttpSession, Transport};

pub use search::build_search_payload;
pub use parser::{parse_search_response, ParsedListing};
pub use downloader::download_record;
