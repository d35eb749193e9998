#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde_json::{Map, Value, json};

use arc_index::domain::{
    Author, Namespace, ProjectRecord, ProjectSummary, StudyAssayMap, normalize_timestamp,
};
use arc_index::error::ArcIndexError;
use arc_index::grid::{DocumentKind, Grid, GridReader};
use arc_index::hub::{HubClient, ProjectPage, TreeEntry};

pub fn summary(id: u64, name: &str, last_activity_at: &str) -> ProjectSummary {
    ProjectSummary {
        id,
        name: name.to_string(),
        description: Some(format!("{name} description")),
        topics: vec!["plants".to_string()],
        namespace: Namespace {
            name: "Plant Lab".to_string(),
            full_path: "plant-lab".to_string(),
        },
        created_at: "2021-03-04T10:11:12.000Z".to_string(),
        last_activity_at: last_activity_at.to_string(),
        http_url_to_repo: format!("https://git.example.org/plant-lab/{name}.git"),
        default_branch: Some("main".to_string()),
    }
}

/// A record as an earlier run would have stored it, marked so reuse is observable.
pub fn stored_record(hub: &str, project: &ProjectSummary) -> ProjectRecord {
    ProjectRecord {
        hub: hub.to_string(),
        id: project.id,
        name: project.name.clone(),
        description: project.description.clone(),
        topics: project.topics.clone(),
        author: Author {
            name: project.namespace.name.clone(),
            handle: project.namespace.full_path.clone(),
        },
        created_at: normalize_timestamp(&project.created_at),
        last_activity: normalize_timestamp(&project.last_activity_at),
        license: Map::new(),
        identifier: format!("cached-{}", project.id),
        url: project.http_url_to_repo.clone(),
        assay_study_relation: StudyAssayMap::new(),
        contacts: Vec::new(),
        publications: Vec::new(),
    }
}

/// Grid reader for tests: file bytes are a JSON array of rows of `string | null`.
#[derive(Default)]
pub struct JsonGridReader;

impl GridReader for JsonGridReader {
    fn read(&self, bytes: &[u8], _kind: DocumentKind) -> Result<Grid, ArcIndexError> {
        let rows: Vec<Vec<Option<String>>> =
            serde_json::from_slice(bytes).map_err(|err| ArcIndexError::Grid(err.to_string()))?;
        Ok(Grid::new(rows))
    }
}

pub fn grid_bytes(rows: Value) -> Vec<u8> {
    serde_json::to_vec(&rows).unwrap()
}

#[derive(Default)]
pub struct MockHub {
    pub pages: HashMap<String, Vec<Vec<ProjectSummary>>>,
    /// When set, listings omit the page count and report this page size instead.
    pub unreported_page_size: Option<u32>,
    pub listed_pages: Mutex<Vec<u32>>,
    pub failing_hubs: HashSet<String>,
    pub files: HashMap<(u64, String), Vec<u8>>,
    pub trees: HashMap<(u64, String), Vec<TreeEntry>>,
    pub failing_trees: HashSet<(u64, String)>,
    pub licenses: HashMap<u64, Map<String, Value>>,
    pub raw_fetches: Mutex<Vec<(u64, String)>>,
    pub license_calls: Mutex<usize>,
}

impl MockHub {
    pub fn with_pages(hub: &str, pages: Vec<Vec<ProjectSummary>>) -> Self {
        let mut mock = Self::default();
        mock.pages.insert(hub.to_string(), pages);
        mock
    }

    pub fn add_file(&mut self, project_id: u64, path: &str, content: Vec<u8>) {
        self.files.insert((project_id, path.to_string()), content);
    }

    pub fn add_dirs(&mut self, project_id: u64, path: &str, dirs: &[&str]) {
        let mut entries: Vec<TreeEntry> = dirs
            .iter()
            .map(|name| TreeEntry {
                name: name.to_string(),
                kind: "tree".to_string(),
            })
            .collect();
        entries.push(TreeEntry {
            name: ".gitkeep".to_string(),
            kind: "blob".to_string(),
        });
        self.trees.insert((project_id, path.to_string()), entries);
    }

    pub fn fetch_count(&self) -> usize {
        *self.license_calls.lock().unwrap()
    }
}

impl HubClient for MockHub {
    fn head_exists(
        &self,
        _hub: &str,
        project_id: u64,
        path: &str,
        _git_ref: &str,
    ) -> Result<bool, ArcIndexError> {
        Ok(self.files.contains_key(&(project_id, path.to_string())))
    }

    fn get_raw(
        &self,
        _hub: &str,
        project_id: u64,
        path: &str,
        _git_ref: &str,
    ) -> Result<Vec<u8>, ArcIndexError> {
        self.raw_fetches
            .lock()
            .unwrap()
            .push((project_id, path.to_string()));
        self.files
            .get(&(project_id, path.to_string()))
            .cloned()
            .ok_or(ArcIndexError::HubStatus {
                status: 404,
                message: "not found".to_string(),
            })
    }

    fn list_tree(
        &self,
        _hub: &str,
        project_id: u64,
        path: &str,
        _git_ref: &str,
    ) -> Result<Vec<TreeEntry>, ArcIndexError> {
        let key = (project_id, path.to_string());
        if self.failing_trees.contains(&key) {
            return Err(ArcIndexError::HubHttp("connection reset".to_string()));
        }
        Ok(self.trees.get(&key).cloned().unwrap_or_default())
    }

    fn list_public_projects(&self, hub: &str, page: u32) -> Result<ProjectPage, ArcIndexError> {
        if self.failing_hubs.contains(hub) {
            return Err(ArcIndexError::HubStatus {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }
        self.listed_pages.lock().unwrap().push(page);
        let pages = self.pages.get(hub).cloned().unwrap_or_default();
        let items = pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default();
        Ok(match self.unreported_page_size {
            Some(per_page) => ProjectPage {
                items,
                total_pages: None,
                per_page,
            },
            None => ProjectPage {
                items,
                total_pages: Some(pages.len() as u32),
                per_page: 100,
            },
        })
    }

    fn get_license(&self, _hub: &str, project_id: u64) -> Result<Map<String, Value>, ArcIndexError> {
        *self.license_calls.lock().unwrap() += 1;
        self.licenses
            .get(&project_id)
            .cloned()
            .ok_or_else(|| ArcIndexError::HubPayload("expected value at line 1".to_string()))
    }
}

pub fn mit_license() -> Map<String, Value> {
    match json!({"key": "mit", "name": "MIT License", "nickname": null}) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}
