use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::{FreshnessWindow, IndexCache};
use crate::config::ResolvedConfig;
use crate::crawler::HubCrawler;
use crate::domain::ProjectRecord;
use crate::error::ArcIndexError;
use crate::fetcher::ProjectMetadataFetcher;
use crate::grid::GridReader;
use crate::hub::HubClient;
use crate::store::IndexStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HubStatus {
    Crawled,
    CarriedForward,
}

#[derive(Debug, Clone, Serialize)]
pub struct HubReport {
    pub hub: String,
    pub status: HubStatus,
    pub records: usize,
    pub fetched: usize,
    pub reused: usize,
    pub duplicates: usize,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub records: Vec<ProjectRecord>,
    pub hubs: Vec<HubReport>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<H: HubClient, G: GridReader> {
    store: IndexStore,
    client: H,
    reader: G,
    hubs: Vec<String>,
    freshness: FreshnessWindow,
    workers: usize,
}

impl<H: HubClient, G: GridReader> App<H, G> {
    pub fn new(store: IndexStore, client: H, reader: G) -> Self {
        Self {
            store,
            client,
            reader,
            hubs: Vec::new(),
            freshness: FreshnessWindow::everything(),
            workers: 1,
        }
    }

    pub fn from_config(config: &ResolvedConfig, client: H, reader: G) -> Self {
        let store = IndexStore::new(config.index_path.clone()).with_mirror(config.mirror_dir.clone());
        Self::new(store, client, reader)
            .with_hubs(config.hubs.iter().map(|hub| hub.name.clone()).collect())
            .with_freshness(FreshnessWindow::from_boundary(config.fresh_since))
            .with_workers(config.workers)
    }

    pub fn with_hubs(mut self, hubs: Vec<String>) -> Self {
        self.hubs = hubs;
        self
    }

    pub fn with_freshness(mut self, freshness: FreshnessWindow) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn client(&self) -> &H {
        &self.client
    }

    pub fn load_index(&self) -> Result<Vec<ProjectRecord>, ArcIndexError> {
        self.store.load()
    }

    pub fn build_index(&self, sink: &dyn ProgressSink) -> Result<BuildResult, ArcIndexError> {
        let cache = IndexCache::new(self.previous_snapshot());
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; previous index holds {} records", cache.len()),
            elapsed: None,
        });

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|index| format!("arc-index-fetch-{index}"))
            .build()
            .map_err(|err| ArcIndexError::WorkerPool(err.to_string()))?;
        let fetcher = ProjectMetadataFetcher::new(&self.client, &self.reader).with_store(&self.store);
        let freshness = self.freshness;
        let crawler = HubCrawler::new(&self.client);

        let mut records = Vec::new();
        let mut reports = Vec::new();
        let mut visited = HashSet::new();
        for hub in &self.hubs {
            if !visited.insert(hub.as_str()) {
                warn!(hub = hub.as_str(), "hub configured twice; skipping repeat");
                continue;
            }
            let start = Instant::now();
            sink.event(ProgressEvent {
                message: format!("phase=Crawl; hub {hub}"),
                elapsed: None,
            });

            let report = match crawler.crawl_all(hub) {
                Ok(projects) => {
                    let outcome = pool.install(|| {
                        cache.merge(
                            hub,
                            projects,
                            |activity| freshness.is_fresh(activity),
                            |project| fetcher.fetch(hub, project),
                        )
                    });
                    info!(
                        hub = hub.as_str(),
                        records = outcome.records.len(),
                        fetched = outcome.fetched,
                        reused = outcome.reused,
                        "hub merged"
                    );
                    let report = HubReport {
                        hub: hub.clone(),
                        status: HubStatus::Crawled,
                        records: outcome.records.len(),
                        fetched: outcome.fetched,
                        reused: outcome.reused,
                        duplicates: outcome.duplicates,
                        elapsed_ms: start.elapsed().as_millis(),
                    };
                    records.extend(outcome.records);
                    report
                }
                Err(err) => {
                    let carried = cache.records_for_hub(hub);
                    warn!(
                        hub = hub.as_str(),
                        error = %err,
                        carried = carried.len(),
                        "hub listing failed; keeping previous records"
                    );
                    let report = HubReport {
                        hub: hub.clone(),
                        status: HubStatus::CarriedForward,
                        records: carried.len(),
                        fetched: 0,
                        reused: carried.len(),
                        duplicates: 0,
                        elapsed_ms: start.elapsed().as_millis(),
                    };
                    records.extend(carried);
                    report
                }
            };
            sink.event(ProgressEvent {
                message: format!(
                    "phase=Merge; hub {hub} records={} fetched={} reused={}",
                    report.records, report.fetched, report.reused
                ),
                elapsed: Some(start.elapsed()),
            });
            reports.push(report);
        }

        sink.event(ProgressEvent {
            message: format!("phase=Store; writing {} records", records.len()),
            elapsed: None,
        });
        self.store.save(&records)?;

        Ok(BuildResult {
            records,
            hubs: reports,
        })
    }

    fn previous_snapshot(&self) -> Vec<ProjectRecord> {
        match self.store.load() {
            Ok(records) => records,
            Err(ArcIndexError::IndexUnavailable(_)) => {
                info!(path = %self.store.index_path(), "no previous index; building from scratch");
                Vec::new()
            }
            Err(err) => {
                warn!(error = %err, "previous index unreadable; building from scratch");
                Vec::new()
            }
        }
    }
}
