//! Congressional roster ingestion.
//!
//! The house roster and the senate roster are independent flush units: each
//! is fetched, parsed and written as one batch. A chamber that cannot be
//! fetched or parsed is reported and skipped; the other still runs. There is
//! no checkpoint since every run rewrites the full roster.

use legisharvest_extract::{
    build_senate_roster, parse_house_roster, parse_senate_assignments, parse_senate_members,
};
use legisharvest_fetch::Fetcher;
use legisharvest_shared::{AppConfig, Chamber, HarvestError, IndexBatch, Result, RosterRecord};
use legisharvest_storage::BulkIndexer;
use tracing::{info, instrument, warn};
use url::Url;
use uuid::Uuid;

/// Sources and target index for a roster run.
#[derive(Debug, Clone)]
pub struct MembersConfig {
    pub index: String,
    pub house_roster_url: Url,
    pub senate_members_url: Url,
    pub senate_assignments_url: Url,
}

impl MembersConfig {
    pub fn from_app(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            index: config.indexes.members.clone(),
            house_roster_url: config.source_url(&config.sources.house_roster_url)?,
            senate_members_url: config.source_url(&config.sources.senate_members_url)?,
            senate_assignments_url: config.source_url(&config.sources.senate_assignments_url)?,
        })
    }
}

/// Result of one chamber's flush unit.
#[derive(Debug, Clone)]
pub struct ChamberReport {
    pub chamber: Chamber,
    /// Rows parsed from upstream.
    pub parsed: usize,
    pub indexed: usize,
    /// Rows dropped before indexing (unusable id) or rejected by the index.
    pub failed_documents: usize,
    /// Set when the chamber was skipped.
    pub error: Option<String>,
}

impl ChamberReport {
    fn skipped(chamber: Chamber, error: &HarvestError) -> Self {
        Self {
            chamber,
            parsed: 0,
            indexed: 0,
            failed_documents: 0,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RosterSummary {
    pub chambers: Vec<ChamberReport>,
}

impl RosterSummary {
    /// True when no chamber was skipped.
    pub fn is_success(&self) -> bool {
        self.chambers.iter().all(|c| c.error.is_none())
    }

    pub fn indexed(&self) -> usize {
        self.chambers.iter().map(|c| c.indexed).sum()
    }
}

/// Roster ingestion over injected fetcher and indexer.
pub struct RosterIngester<'a, F, I> {
    config: MembersConfig,
    fetcher: &'a F,
    indexer: &'a I,
}

impl<'a, F, I> RosterIngester<'a, F, I>
where
    F: Fetcher,
    I: BulkIndexer,
{
    pub fn new(config: MembersConfig, fetcher: &'a F, indexer: &'a I) -> Self {
        Self {
            config,
            fetcher,
            indexer,
        }
    }

    /// Ingest both rosters. Only an index flush error aborts the run.
    #[instrument(skip_all, fields(run_id = %Uuid::now_v7(), index = %self.config.index))]
    pub async fn run(&self) -> Result<RosterSummary> {
        let mut summary = RosterSummary::default();

        for chamber in [Chamber::House, Chamber::Senate] {
            let records = match chamber {
                Chamber::House => self.fetch_house().await,
                _ => self.fetch_senate().await,
            };

            let report = match records {
                Ok(records) => self.flush_chamber(chamber, records).await?,
                Err(e) => {
                    warn!(%chamber, error = %e, "skipping roster");
                    ChamberReport::skipped(chamber, &e)
                }
            };
            summary.chambers.push(report);
        }

        info!(
            indexed = summary.indexed(),
            success = summary.is_success(),
            "roster ingestion finished"
        );
        Ok(summary)
    }

    async fn flush_chamber(
        &self,
        chamber: Chamber,
        records: Vec<RosterRecord>,
    ) -> Result<ChamberReport> {
        let parsed = records.len();
        let mut batch = IndexBatch::new(&self.config.index);
        let mut failed_documents = 0;

        for record in records {
            match record.into_op() {
                Ok(op) => batch.push(op),
                Err(e) => {
                    warn!(%chamber, error = %e, "dropping roster row");
                    failed_documents += 1;
                }
            }
        }

        let response = self.indexer.flush(&batch).await?;
        failed_documents += response.failed.len();
        info!(%chamber, parsed, indexed = response.indexed, "roster flushed");

        Ok(ChamberReport {
            chamber,
            parsed,
            indexed: response.indexed,
            failed_documents,
            error: None,
        })
    }

    async fn fetch_house(&self) -> Result<Vec<RosterRecord>> {
        let body = self.fetch_body(&self.config.house_roster_url).await?;
        let records = parse_house_roster(&body);
        if records.is_empty() {
            return Err(HarvestError::parse("house roster page has no member rows"));
        }
        Ok(records)
    }

    async fn fetch_senate(&self) -> Result<Vec<RosterRecord>> {
        let xml = self.fetch_body(&self.config.senate_members_url).await?;
        let members = parse_senate_members(&xml)?;
        if members.is_empty() {
            return Err(HarvestError::parse("senate contact list has no members"));
        }

        let html = self.fetch_body(&self.config.senate_assignments_url).await?;
        let memberships = parse_senate_assignments(&html);
        Ok(build_senate_roster(members, &memberships))
    }

    async fn fetch_body(&self, url: &Url) -> Result<String> {
        Ok(self.fetcher.get(url).await?.error_for_status()?.body)
    }
}
