use std::fmt;

use chrono::DateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const OTHER_ASSAYS: &str = "other";

pub type Cell = Option<String>;

pub type FieldRecord = IndexMap<String, Cell>;
pub type ContactRecord = FieldRecord;
pub type PublicationRecord = FieldRecord;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProjectSummary {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub namespace: Namespace,
    pub created_at: String,
    pub last_activity_at: String,
    pub http_url_to_repo: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl ProjectSummary {
    pub fn git_ref(&self) -> &str {
        self.default_branch.as_deref().unwrap_or("main")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Namespace {
    pub name: String,
    pub full_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Author {
    pub name: String,
    #[serde(alias = "username")]
    pub handle: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProjectRecord {
    #[serde(alias = "datahub")]
    pub hub: String,
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub topics: Vec<String>,
    pub author: Author,
    pub created_at: String,
    pub last_activity: String,
    #[serde(default)]
    pub license: Map<String, Value>,
    #[serde(default)]
    pub identifier: String,
    pub url: String,
    #[serde(default)]
    pub assay_study_relation: StudyAssayMap,
    #[serde(default)]
    pub contacts: Vec<ContactRecord>,
    #[serde(default)]
    pub publications: Vec<PublicationRecord>,
}

impl ProjectRecord {
    pub fn key(&self) -> IndexKey {
        IndexKey::new(&self.hub, self.id, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey {
    pub hub: String,
    pub id: u64,
    pub name: String,
}

impl IndexKey {
    pub fn new(hub: &str, id: u64, name: &str) -> Self {
        Self {
            hub: hub.to_string(),
            id,
            name: name.to_string(),
        }
    }

    pub fn for_summary(hub: &str, project: &ProjectSummary) -> Self {
        Self::new(hub, project.id, &project.name)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.hub, self.id, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct StudyAssayMap(IndexMap<String, Vec<String>>);

impl StudyAssayMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, study: impl Into<String>, assays: Vec<String>) {
        self.0.insert(study.into(), assays);
    }

    pub fn extend(&mut self, study: &str, assays: Vec<String>) {
        self.0.entry(study.to_string()).or_default().extend(assays);
    }

    pub fn get(&self, study: &str) -> Option<&[String]> {
        self.0.get(study).map(Vec::as_slice)
    }

    pub fn other(&self) -> Option<&[String]> {
        self.get(OTHER_ASSAYS)
    }

    pub fn studies(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvestigationResult {
    pub identifier: String,
    pub contacts: Vec<ContactRecord>,
    pub publications: Vec<PublicationRecord>,
}

impl InvestigationResult {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Normalizes a hub timestamp (`2024-05-02T09:13:44.120Z`) to `2024-05-02 09:13:44`.
pub fn normalize_timestamp(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    match raw.split_once('T') {
        Some((date, time)) => {
            let time = time.split('.').next().unwrap_or(time);
            let time = time.trim_end_matches('Z');
            format!("{date} {time}")
        }
        None => raw.to_string(),
    }
}
