//! Daily harvest: fetch → parse → filter → dedupe → insert, one author at a time.

mod orchestrator;
mod roster;
mod summary;

pub use orchestrator::{HarvestOptions, Harvester, NO_ARTICLES_FOUND, parse_author_list};
pub use roster::WeeklyRoster;
pub use summary::{AuthorSummary, RunSummary};
