use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::domain::{IndexKey, ProjectRecord, ProjectSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessWindow {
    since: Option<NaiveDateTime>,
}

impl FreshnessWindow {
    pub fn since(date: NaiveDate) -> Self {
        Self {
            since: date.and_hms_opt(0, 0, 0),
        }
    }

    pub fn calendar_year(year: i32) -> Self {
        match NaiveDate::from_ymd_opt(year, 1, 1) {
            Some(date) => Self::since(date),
            None => Self::everything(),
        }
    }

    pub fn everything() -> Self {
        Self { since: None }
    }

    pub fn from_boundary(boundary: Option<NaiveDate>) -> Self {
        boundary.map(Self::since).unwrap_or_else(Self::everything)
    }

    pub fn is_fresh(&self, last_activity: &str) -> bool {
        let Some(since) = self.since else {
            return true;
        };
        parse_activity(last_activity)
            .map(|activity| activity >= since)
            .unwrap_or(true)
    }
}

fn parse_activity(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.naive_local())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok())
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeOutcome {
    pub records: Vec<ProjectRecord>,
    pub fetched: usize,
    pub reused: usize,
    pub duplicates: usize,
}

enum Plan {
    Reuse(ProjectRecord),
    Fetch(ProjectSummary),
}

#[derive(Debug, Clone, Default)]
pub struct IndexCache {
    previous: Vec<ProjectRecord>,
    positions: HashMap<IndexKey, usize>,
}

impl IndexCache {
    pub fn new(previous: Vec<ProjectRecord>) -> Self {
        let mut positions = HashMap::with_capacity(previous.len());
        for (index, record) in previous.iter().enumerate() {
            positions.entry(record.key()).or_insert(index);
        }
        Self {
            previous,
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }

    pub fn lookup(&self, key: &IndexKey) -> Option<&ProjectRecord> {
        self.positions.get(key).map(|&index| &self.previous[index])
    }

    pub fn records_for_hub(&self, hub: &str) -> Vec<ProjectRecord> {
        self.previous
            .iter()
            .filter(|record| record.hub == hub)
            .cloned()
            .collect()
    }

/// Fresh projects and cache misses are fetched on the current rayon pool; the rest are reused verbatim.
    pub fn merge<P, F>(
        &self,
        hub: &str,
        candidates: Vec<ProjectSummary>,
        is_fresh: P,
        fetch: F,
    ) -> MergeOutcome
    where
        P: Fn(&str) -> bool,
        F: Fn(&ProjectSummary) -> ProjectRecord + Sync,
    {
        let mut seen = HashSet::with_capacity(candidates.len());
        let mut outcome = MergeOutcome::default();
        let mut plans = Vec::with_capacity(candidates.len());

        for project in candidates {
            let key = IndexKey::for_summary(hub, &project);
            if !seen.insert(key.clone()) {
                outcome.duplicates += 1;
                continue;
            }
            let cached = if is_fresh(&project.last_activity_at) {
                None
            } else {
                self.lookup(&key)
            };
            match cached {
                Some(record) => {
                    outcome.reused += 1;
                    plans.push(Plan::Reuse(record.clone()));
                }
                None => {
                    debug!(%key, "scheduling fetch");
                    outcome.fetched += 1;
                    plans.push(Plan::Fetch(project));
                }
            }
        }

        outcome.records = plans
            .into_par_iter()
            .map(|plan| match plan {
                Plan::Reuse(record) => record,
                Plan::Fetch(project) => fetch(&project),
            })
            .collect();
        outcome
    }
}
