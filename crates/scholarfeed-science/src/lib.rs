//! Scholarfeed Science — scholarly search, result parsing, and the daily harvest pipeline.

pub mod error;
pub mod filter;
pub mod harvest;
pub mod http;
pub mod parser;
pub mod sources;

pub use error::{Result, ScienceError};
pub use filter::filter_valid;
pub use harvest::{AuthorSummary, HarvestOptions, Harvester, RunSummary, WeeklyRoster, parse_author_list};
pub use parser::RecordParser;
pub use sources::{RawSearchResult, ScholarSearch};
pub use sources::serpapi::SerpApiSource;
