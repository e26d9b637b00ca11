use std::sync::Arc;
use std::time::Duration;

use scholarfeed_core::{HarvestConfig, PublicationRecord, PublicationStore, SavedPublicationRef};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::summary::{AuthorSummary, RunSummary};
use crate::error::{Result, ScienceError};
use crate::filter::filter_valid;
use crate::parser::RecordParser;
use crate::sources::ScholarSearch;

pub const NO_ARTICLES_FOUND: &str = "No articles found";

#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub authors_per_run: usize,
    pub per_author_cap: usize,
    pub inter_author_delay: Duration,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self::from(&HarvestConfig::default())
    }
}

impl From<&HarvestConfig> for HarvestOptions {
    fn from(config: &HarvestConfig) -> Self {
        Self {
            authors_per_run: config.authors_per_run,
            per_author_cap: config.per_author_cap,
            inter_author_delay: config.inter_author_delay(),
        }
    }
}

/// Splits a comma-separated author list, trimming names and dropping empties.
pub fn parse_author_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Drives search → parse → filter → dedupe → insert for a fixed number of authors.
pub struct Harvester {
    search: Arc<dyn ScholarSearch>,
    parser: RecordParser,
    store: Arc<dyn PublicationStore>,
    options: HarvestOptions,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Harvester {
    pub fn new(
        search: Arc<dyn ScholarSearch>,
        parser: RecordParser,
        store: Arc<dyn PublicationStore>,
        options: HarvestOptions,
    ) -> Self {
        Self {
            search,
            parser,
            store,
            options,
            shutdown: None,
        }
    }

    /// Lets a `true` on `shutdown` interrupt the pause between authors.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Trims names, drops empties, and requires exactly `authors_per_run` of them.
    pub fn validate_authors(&self, author_names: &[String]) -> Result<Vec<String>> {
        let names: Vec<String> = author_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if names.len() != self.options.authors_per_run {
            return Err(ScienceError::Validation(format!(
                "exactly {} author names are required, got {}",
                self.options.authors_per_run,
                names.len()
            )));
        }
        Ok(names)
    }

    pub async fn run(&self, author_names: &[String]) -> Result<RunSummary> {
        let names = self.validate_authors(author_names)?;
        info!(authors = ?names, source = self.search.name(), "starting harvest run");

        let mut run = RunSummary::default();
        let mut pending = names.iter();

        while let Some(author) = pending.next() {
            run.push(self.harvest_author(author).await);

            if pending.len() > 0 && !self.pause().await {
                warn!("harvest cancelled between authors");
                run.cancelled = true;
                let reason = ScienceError::Cancelled.to_string();
                for skipped in pending.by_ref() {
                    run.push(AuthorSummary::failed(skipped.as_str(), reason.as_str()));
                }
            }
        }

        info!(
            fetched = run.total_fetched,
            saved = run.total_saved,
            already_exists = run.total_already_exists,
            failed_authors = run.failed_authors().count(),
            "harvest run finished"
        );
        Ok(run)
    }

    async fn harvest_author(&self, author: &str) -> AuthorSummary {
        let mut summary = AuthorSummary::new(author);
        info!(author, "harvesting author");

        let raw = match self.search.search_by_author(author).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(author, error = %e, "search failed");
                summary.error = Some(e.to_string());
                return summary;
            }
        };

        if raw.is_empty() {
            info!(author, "no results");
            summary.error = Some(NO_ARTICLES_FOUND.to_string());
            return summary;
        }

        let candidates = filter_valid(self.parser.parse_all(&raw.items));
        summary.fetched = candidates.len();

        for record in &candidates {
            if summary.saved >= self.options.per_author_cap {
                break;
            }
            self.consider(record, &mut summary);
        }

        info!(
            author,
            fetched = summary.fetched,
            saved = summary.saved,
            already_exists = summary.already_exists,
            "author done"
        );
        summary
    }

    /// Existence check, then insert; a storage-level duplicate counts the same as a hit.
    fn consider(&self, record: &PublicationRecord, summary: &mut AuthorSummary) {
        let clean = record.sanitized();
        match self.store.exists_by_external_id(&clean.external_id) {
            Ok(true) => {
                debug!(external_id = %clean.external_id, "already stored");
                summary.already_exists += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(external_id = %clean.external_id, error = %e, "existence check failed, skipping record");
                return;
            }
        }

        match self.store.insert(&clean) {
            Ok(id) => {
                debug!(id, external_id = %clean.external_id, "saved");
                summary.saved += 1;
                summary.saved_records.push(SavedPublicationRef::new(id, &clean));
            }
            Err(e) if e.is_duplicate() => {
                debug!(external_id = %clean.external_id, "inserted concurrently, counting as existing");
                summary.already_exists += 1;
            }
            Err(e) => {
                warn!(external_id = %clean.external_id, error = %e, "insert failed, skipping record");
            }
        }
    }

    /// Sleeps the inter-author delay. Returns `false` if shutdown was requested.
    async fn pause(&self) -> bool {
        let delay = self.options.inter_author_delay;
        let Some(shutdown) = &self.shutdown else {
            sleep(delay).await;
            return true;
        };

        let mut shutdown = shutdown.clone();
        if *shutdown.borrow_and_update() {
            return false;
        }

        let deadline = sleep(delay);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => return true,
                changed = shutdown.changed() => match changed {
                    Ok(()) if *shutdown.borrow_and_update() => return false,
                    Ok(()) => continue,
                    Err(_) => {
                        (&mut deadline).await;
                        return true;
                    }
                },
            }
        }
    }
}
