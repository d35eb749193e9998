use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::ProjectSummary;
use crate::error::ArcIndexError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TreeEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == "tree"
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPage {
    pub items: Vec<ProjectSummary>,
    pub total_pages: Option<u32>,
    pub per_page: u32,
}

impl ProjectPage {
    pub fn has_more(&self, page: u32) -> bool {
        more_pages(page, self.total_pages, self.items.len(), self.per_page)
    }
}

/// Without a reported page count, a full page means another one may follow.
pub fn more_pages(page: u32, total_pages: Option<u32>, batch_len: usize, per_page: u32) -> bool {
    match total_pages {
        Some(total) => page < total,
        None => batch_len > 0 && batch_len >= per_page as usize,
    }
}

pub trait HubClient: Send + Sync {
    fn head_exists(
        &self,
        hub: &str,
        project_id: u64,
        path: &str,
        git_ref: &str,
    ) -> Result<bool, ArcIndexError>;
    fn get_raw(
        &self,
        hub: &str,
        project_id: u64,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<u8>, ArcIndexError>;
    fn list_tree(
        &self,
        hub: &str,
        project_id: u64,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<TreeEntry>, ArcIndexError>;
    fn list_public_projects(&self, hub: &str, page: u32) -> Result<ProjectPage, ArcIndexError>;
    fn get_license(&self, hub: &str, project_id: u64) -> Result<Map<String, Value>, ArcIndexError>;
}

pub fn list_dir_names<H: HubClient + ?Sized>(
    client: &H,
    hub: &str,
    project_id: u64,
    path: &str,
    git_ref: &str,
) -> Result<Vec<String>, ArcIndexError> {
    Ok(client
        .list_tree(hub, project_id, path, git_ref)?
        .into_iter()
        .filter(TreeEntry::is_dir)
        .map(|entry| entry.name)
        .collect())
}
