//! Resumable, time-boxed hearings harvest.
//!
//! One run walks congress numbers from the stored checkpoint down to the
//! floor. For each number it fetches every committee listing, flushes the
//! collected hearings to the index, and then checks the wall-clock budget.
//! When the budget runs out the last processed number becomes the new
//! checkpoint; when the floor is reached the checkpoint resets to the current
//! congress so the next run starts a fresh sweep.
//!
//! Only three things are fatal: the checkpoint store failing, the committee
//! catalog being unavailable, and an index flush error. A failed listing
//! fetch is logged and skipped.

use std::time::Duration;

use legisharvest_extract::{CommitteeCatalog, HearingListing, parse_committee_catalog, parse_hearing_listing};
use legisharvest_fetch::Fetcher;
use legisharvest_shared::{
    AppConfig, CONGRESS_NUMBER_KEY, Chamber, HarvestError, IndexBatch, Result,
};
use legisharvest_storage::{BulkIndexer, CheckpointStore};
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::congress::{congress_number_from_year, next_range, resolve_checkpoint};

/// Committee browse page, relative to the govinfo base URL.
const CATALOG_PATH: &str = "browse/committee";

static SYSTEM_CLOCK: SystemClock = SystemClock;

// ---------------------------------------------------------------------------
// Config & results
// ---------------------------------------------------------------------------

/// Settings for one hearings run.
#[derive(Debug, Clone)]
pub struct HearingsConfig {
    /// Target index name.
    pub index: String,
    /// govinfo base URL (catalog and listings resolve against it).
    pub base_url: Url,
    /// Wall-clock budget for the run.
    pub time_budget: Duration,
    /// Oldest congress number visited (inclusive).
    pub floor: u32,
    /// Calendar year used to compute the current congress.
    pub current_year: i32,
}

impl HearingsConfig {
    /// Build from the application config for the given calendar year.
    pub fn from_app(config: &AppConfig, current_year: i32) -> Result<Self> {
        Ok(Self {
            index: config.indexes.hearings.clone(),
            base_url: config.source_url(&config.sources.govinfo_base_url)?,
            time_budget: Duration::from_secs(config.harvest.time_budget_secs),
            floor: config.harvest.congress_floor,
            current_year,
        })
    }

    fn catalog_url(&self) -> Result<Url> {
        self.base_url
            .join(CATALOG_PATH)
            .map_err(|e| HarvestError::config(format!("catalog URL: {e}")))
    }

    fn listing_url(&self, chamber: Chamber, committee: &str, congress: u32) -> Result<Url> {
        let path = format!(
            "wssearch/browsecommittee/chamber/{chamber}/committee/{committee}/collection/CHRG/congress/{congress}?fetchChildrenOnly=1"
        );
        self.base_url
            .join(&path)
            .map_err(|e| HarvestError::config(format!("listing URL for {committee}: {e}")))
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// The floor was reached; checkpoint reset to the current congress.
    Completed,
    /// The budget ran out; checkpoint set to the last processed number.
    BudgetExhausted,
}

/// Summary of one hearings run.
#[derive(Debug, Clone)]
pub struct HarvestSummary {
    /// Checkpoint as read at the start of the run.
    pub start_checkpoint: u32,
    /// Current congress number.
    pub ceiling: u32,
    /// Congress numbers processed, in order.
    pub processed: Vec<u32>,
    /// Documents written to the index.
    pub records_indexed: usize,
    /// Documents the index rejected individually.
    pub failed_documents: usize,
    /// Listing fetches skipped after an error or non-2xx status.
    pub failed_fetches: usize,
    /// Listing children dropped for lacking an id.
    pub dropped_records: usize,
    pub outcome: HarvestOutcome,
    /// Checkpoint written at the end of the run.
    pub checkpoint: u32,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting harvest status.
pub trait HarvestProgress: Send + Sync {
    /// Called before the listings of a congress number are fetched.
    fn congress_started(&self, congress: u32, remaining: usize);
    /// Called when a listing fetch is skipped.
    fn fetch_failed(&self, congress: u32, chamber: Chamber, committee: &str);
    /// Called after a congress number's batch was flushed.
    fn congress_flushed(&self, congress: u32, records: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl HarvestProgress for SilentProgress {
    fn congress_started(&self, _congress: u32, _remaining: usize) {}
    fn fetch_failed(&self, _congress: u32, _chamber: Chamber, _committee: &str) {}
    fn congress_flushed(&self, _congress: u32, _records: usize) {}
}

// ---------------------------------------------------------------------------
// Harvester
// ---------------------------------------------------------------------------

/// Hearings harvest loop over injected collaborators.
pub struct HearingsHarvester<'a, F, S, I> {
    config: HearingsConfig,
    fetcher: &'a F,
    checkpoints: &'a S,
    indexer: &'a I,
    clock: &'a dyn Clock,
    progress: &'a dyn HarvestProgress,
}

impl<'a, F, S, I> HearingsHarvester<'a, F, S, I>
where
    F: Fetcher,
    S: CheckpointStore,
    I: BulkIndexer,
{
    pub fn new(config: HearingsConfig, fetcher: &'a F, checkpoints: &'a S, indexer: &'a I) -> Self {
        Self {
            config,
            fetcher,
            checkpoints,
            indexer,
            clock: &SYSTEM_CLOCK,
            progress: &SilentProgress,
        }
    }

    /// Replace the wall clock (tests drive the budget deterministically).
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn HarvestProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Run one invocation of the sweep.
    ///
    /// The budget is checked only between congress numbers, and not after
    /// the first one when that number is the stored checkpoint itself: it was
    /// already processed by the run that wrote the checkpoint, so every run
    /// gets at least one number of fresh progress.
    #[instrument(skip_all, fields(run_id = %Uuid::now_v7(), index = %self.config.index))]
    pub async fn run(&self) -> Result<HarvestSummary> {
        let started = self.clock.now();
        let ceiling = congress_number_from_year(self.config.current_year);

        let stored = self.checkpoints.read(CONGRESS_NUMBER_KEY).await?;
        let start_checkpoint = resolve_checkpoint(stored, ceiling)?;
        if start_checkpoint > ceiling {
            info!(start_checkpoint, ceiling, "stale checkpoint, starting at current congress");
        }

        let catalog = self.fetch_catalog().await?;
        let range = next_range(start_checkpoint, ceiling, self.config.floor);

        info!(
            start_checkpoint,
            ceiling,
            floor = self.config.floor,
            congresses = range.len(),
            committees = catalog.len(),
            budget_secs = self.config.time_budget.as_secs(),
            "starting hearings harvest"
        );

        let mut summary = HarvestSummary {
            start_checkpoint,
            ceiling,
            processed: Vec::with_capacity(range.len()),
            records_indexed: 0,
            failed_documents: 0,
            failed_fetches: 0,
            dropped_records: 0,
            outcome: HarvestOutcome::Completed,
            checkpoint: ceiling,
            elapsed: Duration::ZERO,
        };

        let mut batch = IndexBatch::new(&self.config.index);

        for (i, &congress) in range.iter().enumerate() {
            let remaining = range.len() - i;
            self.progress.congress_started(congress, remaining);
            self.collect_congress(congress, &catalog, &mut batch, &mut summary)
                .await;

            let records = batch.len();
            if batch.is_empty() {
                debug!(congress, "no hearings, skipping flush");
            } else {
                let response = self.indexer.flush(&batch).await?;
                summary.records_indexed += response.indexed;
                summary.failed_documents += response.failed.len();
            }
            batch.clear();
            summary.processed.push(congress);
            self.progress.congress_flushed(congress, records);
            debug!(congress, records, "congress flushed");

            if i == 0 && stored == Some(i64::from(congress)) {
                continue;
            }

            let elapsed = self.clock.now().duration_since(started);
            if elapsed > self.config.time_budget {
                info!(
                    congress,
                    elapsed_secs = elapsed.as_secs(),
                    "time budget exhausted"
                );
                summary.outcome = HarvestOutcome::BudgetExhausted;
                summary.checkpoint = congress;
                break;
            }
        }

        self.checkpoints
            .write(CONGRESS_NUMBER_KEY, i64::from(summary.checkpoint))
            .await?;
        summary.elapsed = self.clock.now().duration_since(started);

        info!(
            outcome = ?summary.outcome,
            checkpoint = summary.checkpoint,
            processed = summary.processed.len(),
            records_indexed = summary.records_indexed,
            failed_fetches = summary.failed_fetches,
            dropped_records = summary.dropped_records,
            "hearings harvest finished"
        );

        Ok(summary)
    }

    /// Fetch every committee listing for one congress into `batch`.
    async fn collect_congress(
        &self,
        congress: u32,
        catalog: &CommitteeCatalog,
        batch: &mut IndexBatch,
        summary: &mut HarvestSummary,
    ) {
        for (chamber, committee) in catalog.pairs() {
            let listing = match self.fetch_listing(chamber, committee, congress).await {
                Ok(listing) => listing,
                Err(e) => {
                    warn!(congress, %chamber, committee, error = %e, "failed to get hearings");
                    summary.failed_fetches += 1;
                    self.progress.fetch_failed(congress, chamber, committee);
                    continue;
                }
            };

            summary.dropped_records += listing.dropped;
            for record in listing.records {
                batch.push(record.into_op());
            }
        }
    }

    async fn fetch_catalog(&self) -> Result<CommitteeCatalog> {
        let url = self.config.catalog_url()?;
        let response = self.fetcher.get(&url).await?.error_for_status()?;
        let catalog = parse_committee_catalog(&response.body)?;

        if catalog.is_empty() {
            warn!(%url, "committee catalog is empty");
        }
        Ok(catalog)
    }

    async fn fetch_listing(
        &self,
        chamber: Chamber,
        committee: &str,
        congress: u32,
    ) -> Result<HearingListing> {
        let url = self.config.listing_url(chamber, committee, congress)?;
        let response = self.fetcher.get(&url).await?.error_for_status()?;
        parse_hearing_listing(&response.body)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    use legisharvest_fetch::FetchResponse;
    use legisharvest_storage::BulkResponse;

    use super::*;

    const INDEX: &str = "federal_congressional_hearings";
    const YEAR: i32 = 2026; // congress 119

    // -----------------------------------------------------------------------
    // Fakes
    // -----------------------------------------------------------------------

    /// Fetcher answering from a closure over the request URL.
    struct FnFetcher<H> {
        handler: H,
        requests: Mutex<Vec<String>>,
    }

    impl<H> FnFetcher<H>
    where
        H: Fn(&Url) -> Result<FetchResponse> + Send + Sync,
    {
        fn new(handler: H) -> Self {
            Self {
                handler,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn listing_congresses(&self) -> Vec<u32> {
            let mut seen: Vec<u32> = self
                .requests
                .lock()
                .unwrap()
                .iter()
                .filter_map(|u| congress_of(u))
                .collect();
            seen.dedup();
            seen
        }
    }

    impl<H> Fetcher for FnFetcher<H>
    where
        H: Fn(&Url) -> Result<FetchResponse> + Send + Sync,
    {
        async fn get(&self, url: &Url) -> Result<FetchResponse> {
            self.requests.lock().unwrap().push(url.to_string());
            (self.handler)(url)
        }
    }

    #[derive(Default)]
    struct MemoryCheckpoints {
        value: Mutex<Option<i64>>,
        writes: Mutex<Vec<i64>>,
        unavailable: bool,
        read_only: bool,
    }

    impl MemoryCheckpoints {
        fn at(value: i64) -> Self {
            Self {
                value: Mutex::new(Some(value)),
                ..Default::default()
            }
        }

        fn current(&self) -> Option<i64> {
            *self.value.lock().unwrap()
        }
    }

    impl CheckpointStore for MemoryCheckpoints {
        async fn read(&self, key: &str) -> Result<Option<i64>> {
            assert_eq!(key, CONGRESS_NUMBER_KEY);
            if self.unavailable {
                return Err(HarvestError::Storage("settings unavailable".into()));
            }
            Ok(self.current())
        }

        async fn write(&self, _key: &str, value: i64) -> Result<()> {
            if self.read_only {
                return Err(HarvestError::Storage("settings are read-only".into()));
            }
            *self.value.lock().unwrap() = Some(value);
            self.writes.lock().unwrap().push(value);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingIndexer {
        flushes: Mutex<Vec<Vec<String>>>,
        documents: Mutex<HashMap<String, serde_json::Value>>,
        broken: bool,
    }

    impl RecordingIndexer {
        fn flush_count(&self) -> usize {
            self.flushes.lock().unwrap().len()
        }

        fn total_ops(&self) -> usize {
            self.flushes.lock().unwrap().iter().map(Vec::len).sum()
        }
    }

    impl BulkIndexer for RecordingIndexer {
        async fn flush(&self, batch: &IndexBatch) -> Result<BulkResponse> {
            assert_eq!(batch.index, INDEX);
            if self.broken {
                return Err(HarvestError::Storage("index unavailable".into()));
            }
            let mut docs = self.documents.lock().unwrap();
            for op in &batch.ops {
                docs.insert(op.id.to_string(), op.document.clone());
            }
            self.flushes
                .lock()
                .unwrap()
                .push(batch.ops.iter().map(|op| op.id.to_string()).collect());
            Ok(BulkResponse {
                indexed: batch.len(),
                failed: Vec::new(),
            })
        }
    }

    /// Advances by `step` every time it is read after the first.
    struct StepClock {
        base: Instant,
        step: Duration,
        reads: AtomicU32,
    }

    impl StepClock {
        fn new(step_secs: u64) -> Self {
            Self {
                base: Instant::now(),
                step: Duration::from_secs(step_secs),
                reads: AtomicU32::new(0),
            }
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> Instant {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            self.base + self.step * n
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn config(budget_secs: u64, floor: u32) -> HearingsConfig {
        HearingsConfig {
            index: INDEX.into(),
            base_url: Url::parse("https://www.govinfo.gov/").unwrap(),
            time_budget: Duration::from_secs(budget_secs),
            floor,
            current_year: YEAR,
        }
    }

    fn ok(url: &Url, body: String) -> Result<FetchResponse> {
        Ok(FetchResponse {
            url: url.clone(),
            status: 200,
            body,
        })
    }

    fn status(url: &Url, code: u16) -> Result<FetchResponse> {
        Ok(FetchResponse {
            url: url.clone(),
            status: code,
            body: String::new(),
        })
    }

    fn catalog_html(senate: &[&str]) -> String {
        let entries: String = senate
            .iter()
            .map(|c| format!(r#"<div class="field_items"><a href="/committee/senate-{c}">{c}</a></div>"#))
            .collect();
        format!(
            r#"<div id="senate-col">{entries}</div><div id="house-col"></div><div id="joint-col"></div>"#
        )
    }

    fn listing(ids: &[String]) -> String {
        let children: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| serde_json::json!({ "nodeValue": { "granuleid": null, "packageid": id } }))
            .collect();
        serde_json::json!({ "childNodes": children }).to_string()
    }

    fn congress_of(url: &str) -> Option<u32> {
        let rest = url.split("/congress/").nth(1)?;
        rest.split('?').next()?.parse().ok()
    }

    fn committee_of(url: &Url) -> Option<String> {
        let segments: Vec<&str> = url.path_segments()?.collect();
        let pos = segments.iter().position(|s| *s == "committee")?;
        segments.get(pos + 1).map(|s| s.to_string())
    }

    /// One senate committee; two hearings per congress in `with_records`.
    fn two_per_congress(
        with_records: std::ops::RangeInclusive<u32>,
    ) -> impl Fn(&Url) -> Result<FetchResponse> + Send + Sync {
        move |url: &Url| {
            if url.path() == "/browse/committee" {
                return ok(url, catalog_html(&["agriculture"]));
            }
            let congress = congress_of(url.as_str()).expect("listing url");
            let ids = if with_records.contains(&congress) {
                vec![format!("CHRG-{congress}a"), format!("CHRG-{congress}b")]
            } else {
                Vec::new()
            };
            ok(url, listing(&ids))
        }
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn full_sweep_resets_checkpoint_to_ceiling() {
        let fetcher = FnFetcher::new(two_per_congress(95..=100));
        let checkpoints = MemoryCheckpoints::at(100);
        let indexer = RecordingIndexer::default();

        let summary = HearingsHarvester::new(config(300, 84), &fetcher, &checkpoints, &indexer)
            .run()
            .await
            .unwrap();

        assert_eq!(indexer.flush_count(), 6);
        assert_eq!(indexer.total_ops(), 12);
        assert_eq!(summary.records_indexed, 12);
        assert_eq!(summary.outcome, HarvestOutcome::Completed);
        assert_eq!(summary.processed, (84..=100).rev().collect::<Vec<_>>());
        assert_eq!(summary.checkpoint, 119);
        assert_eq!(*checkpoints.writes.lock().unwrap(), vec![119]);
    }

    #[tokio::test]
    async fn budget_exhaustion_records_last_processed() {
        let fetcher = FnFetcher::new(two_per_congress(84..=119));
        let checkpoints = MemoryCheckpoints::at(100);
        let indexer = RecordingIndexer::default();
        // Reads after 99 → 100s, after 98 → 200s.
        let clock = StepClock::new(100);

        let summary = HearingsHarvester::new(config(150, 84), &fetcher, &checkpoints, &indexer)
            .with_clock(&clock)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.outcome, HarvestOutcome::BudgetExhausted);
        assert_eq!(summary.processed, vec![100, 99, 98]);
        assert_eq!(checkpoints.current(), Some(98));
        assert_eq!(fetcher.listing_congresses(), vec![100, 99, 98]);
        assert_eq!(indexer.flush_count(), 3);
    }

    #[tokio::test]
    async fn resumed_run_continues_where_previous_stopped() {
        let checkpoints = MemoryCheckpoints::at(100);
        let indexer = RecordingIndexer::default();

        let first = FnFetcher::new(two_per_congress(84..=119));
        let clock = StepClock::new(100);
        HearingsHarvester::new(config(150, 84), &first, &checkpoints, &indexer)
            .with_clock(&clock)
            .run()
            .await
            .unwrap();
        assert_eq!(checkpoints.current(), Some(98));

        let second = FnFetcher::new(two_per_congress(84..=119));
        let summary = HearingsHarvester::new(config(300, 84), &second, &checkpoints, &indexer)
            .run()
            .await
            .unwrap();

        // Nothing above the checkpoint is revisited and nothing below it is skipped.
        assert_eq!(second.listing_congresses(), (84..=98).rev().collect::<Vec<_>>());
        assert_eq!(summary.outcome, HarvestOutcome::Completed);
        assert_eq!(checkpoints.current(), Some(119));

        // Every congress 84..=100 is in the index exactly once per hearing.
        assert_eq!(indexer.documents.lock().unwrap().len(), 17 * 2);
    }

    #[tokio::test]
    async fn checkpoint_never_increases_within_a_sweep() {
        let checkpoints = MemoryCheckpoints::at(119);
        let indexer = RecordingIndexer::default();

        // Zero budget: every run stops at the first point it may.
        let mut previous = 119;
        for _ in 0..5 {
            let fetcher = FnFetcher::new(two_per_congress(84..=119));
            let summary = HearingsHarvester::new(config(0, 84), &fetcher, &checkpoints, &indexer)
                .with_clock(&StepClock::new(1))
                .run()
                .await
                .unwrap();
            assert_eq!(summary.outcome, HarvestOutcome::BudgetExhausted);
            assert!(summary.checkpoint < previous, "no progress from {previous}");
            previous = summary.checkpoint;
        }
        assert_eq!(previous, 114);
    }

    #[tokio::test]
    async fn failed_committee_does_not_block_others() {
        let fetcher = FnFetcher::new(|url: &Url| {
            if url.path() == "/browse/committee" {
                return ok(url, catalog_html(&["agriculture", "judiciary"]));
            }
            let congress = congress_of(url.as_str()).unwrap();
            match committee_of(url).as_deref() {
                Some("judiciary") if congress == 100 => status(url, 503),
                Some("judiciary") => Err(HarvestError::Network("connection reset".into())),
                Some(c) => ok(url, listing(&[format!("CHRG-{congress}-{c}")])),
                None => panic!("unexpected url {url}"),
            }
        });
        let checkpoints = MemoryCheckpoints::at(100);
        let indexer = RecordingIndexer::default();

        let summary = HearingsHarvester::new(config(300, 99), &fetcher, &checkpoints, &indexer)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.failed_fetches, 2);
        assert_eq!(summary.records_indexed, 2);
        let flushes = indexer.flushes.lock().unwrap();
        assert_eq!(flushes[0], vec!["CHRG-100-agriculture".to_string()]);
        assert_eq!(flushes[1], vec!["CHRG-99-agriculture".to_string()]);
    }

    #[tokio::test]
    async fn malformed_listing_is_skipped() {
        let fetcher = FnFetcher::new(|url: &Url| {
            if url.path() == "/browse/committee" {
                return ok(url, catalog_html(&["agriculture"]));
            }
            match congress_of(url.as_str()) {
                Some(100) => ok(url, "<html>maintenance</html>".into()),
                _ => ok(
                    url,
                    r#"{"childNodes":[{"nodeValue":{"packageid":"CHRG-99x"}},{"nodeValue":{}}]}"#
                        .into(),
                ),
            }
        });
        let checkpoints = MemoryCheckpoints::at(100);
        let indexer = RecordingIndexer::default();

        let summary = HearingsHarvester::new(config(300, 99), &fetcher, &checkpoints, &indexer)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.failed_fetches, 1);
        assert_eq!(summary.dropped_records, 1);
        assert_eq!(summary.records_indexed, 1);
        assert_eq!(summary.outcome, HarvestOutcome::Completed);
    }

    #[tokio::test]
    async fn stale_and_missing_checkpoints_start_at_ceiling() {
        for checkpoints in [MemoryCheckpoints::at(130), MemoryCheckpoints::default()] {
            let fetcher = FnFetcher::new(two_per_congress(0..=0));
            let indexer = RecordingIndexer::default();

            let summary = HearingsHarvester::new(config(300, 118), &fetcher, &checkpoints, &indexer)
                .run()
                .await
                .unwrap();

            assert_eq!(summary.processed, vec![119, 118]);
            assert_eq!(fetcher.listing_congresses(), vec![119, 118]);
            assert_eq!(indexer.flush_count(), 0);
            assert_eq!(checkpoints.current(), Some(119));
        }
    }

    #[tokio::test]
    async fn checkpoint_store_failure_is_fatal() {
        let fetcher = FnFetcher::new(two_per_congress(84..=119));
        let checkpoints = MemoryCheckpoints {
            unavailable: true,
            ..Default::default()
        };
        let indexer = RecordingIndexer::default();

        let err = HearingsHarvester::new(config(300, 84), &fetcher, &checkpoints, &indexer)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::Storage(_)));
        assert!(fetcher.requests.lock().unwrap().is_empty());
        assert!(checkpoints.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn checkpoint_write_failure_is_fatal() {
        let fetcher = FnFetcher::new(two_per_congress(84..=119));
        let checkpoints = MemoryCheckpoints {
            value: Mutex::new(Some(100)),
            read_only: true,
            ..Default::default()
        };
        let indexer = RecordingIndexer::default();

        let err = HearingsHarvester::new(config(300, 98), &fetcher, &checkpoints, &indexer)
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::Storage(_)));
        // The numbers were harvested, only the cursor could not be saved.
        assert_eq!(indexer.flush_count(), 3);
        assert!(checkpoints.writes.lock().unwrap().is_empty());
        assert_eq!(checkpoints.current(), Some(100));
    }

    #[tokio::test]
    async fn budget_exhausted_on_floor_keeps_floor_then_completes() {
        let checkpoints = MemoryCheckpoints::at(86);
        let indexer = RecordingIndexer::default();

        // Reads after 85 → 100s, after 84 → 200s.
        let first = FnFetcher::new(two_per_congress(84..=119));
        let clock = StepClock::new(100);
        let summary = HearingsHarvester::new(config(150, 84), &first, &checkpoints, &indexer)
            .with_clock(&clock)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.processed, vec![86, 85, 84]);
        assert_eq!(summary.outcome, HarvestOutcome::BudgetExhausted);
        assert_eq!(checkpoints.current(), Some(84));

        let second = FnFetcher::new(two_per_congress(84..=119));
        let summary = HearingsHarvester::new(config(0, 84), &second, &checkpoints, &indexer)
            .with_clock(&StepClock::new(100))
            .run()
            .await
            .unwrap();

        assert_eq!(summary.processed, vec![84]);
        assert_eq!(summary.outcome, HarvestOutcome::Completed);
        assert_eq!(checkpoints.current(), Some(119));
    }

    #[tokio::test]
    async fn flush_failure_leaves_checkpoint_untouched() {
        let fetcher = FnFetcher::new(two_per_congress(84..=119));
        let checkpoints = MemoryCheckpoints::at(100);
        let indexer = RecordingIndexer {
            broken: true,
            ..Default::default()
        };

        let result = HearingsHarvester::new(config(300, 84), &fetcher, &checkpoints, &indexer)
            .run()
            .await;

        assert!(result.is_err());
        assert!(checkpoints.writes.lock().unwrap().is_empty());
        assert_eq!(checkpoints.current(), Some(100));
    }

    #[tokio::test]
    async fn catalog_failure_is_fatal() {
        let fetcher = FnFetcher::new(|url: &Url| status(url, 502));
        let checkpoints = MemoryCheckpoints::at(100);
        let indexer = RecordingIndexer::default();

        let err = HearingsHarvester::new(config(300, 84), &fetcher, &checkpoints, &indexer)
            .run()
            .await
            .unwrap_err();

        assert!(err.to_string().contains("HTTP 502"));
        assert!(checkpoints.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn end_to_end_against_http_and_storage() {
        use legisharvest_fetch::{FetchOptions, HttpFetcher};
        use legisharvest_storage::Storage;
        use wiremock::matchers::{method, path, path_regex, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/browse/committee"))
            .respond_with(ResponseTemplate::new(200).set_body_string(catalog_html(&["agriculture"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"/committee/agriculture/collection/CHRG/congress/119$"))
            .and(query_param("fetchChildrenOnly", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[
                "CHRG-119shrg1".to_string(),
                "CHRG-119shrg2".to_string(),
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"/congress/118$"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"childNodes":null}"#))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&FetchOptions::default()).unwrap();
        let tmp = std::env::temp_dir().join(format!("lh_hearings_{}.db", Uuid::now_v7()));
        let storage = Storage::open(&tmp).await.unwrap();

        let mut cfg = config(300, 118);
        cfg.base_url = Url::parse(&format!("{}/", server.uri())).unwrap();

        let summary = HearingsHarvester::new(cfg, &fetcher, &storage, &storage)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.outcome, HarvestOutcome::Completed);
        assert_eq!(summary.records_indexed, 2);
        assert_eq!(storage.count_documents(INDEX).await.unwrap(), 2);
        assert_eq!(storage.read(CONGRESS_NUMBER_KEY).await.unwrap(), Some(119));

        let doc = storage.get_document(INDEX, "CHRG-119shrg2").await.unwrap().unwrap();
        assert_eq!(doc["obj"]["packageid"], "CHRG-119shrg2");
    }

    #[test]
    fn listing_url_shape() {
        let url = config(300, 84)
            .listing_url(Chamber::House, "ways", 118)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.govinfo.gov/wssearch/browsecommittee/chamber/house/committee/ways/collection/CHRG/congress/118?fetchChildrenOnly=1"
        );
    }
}
