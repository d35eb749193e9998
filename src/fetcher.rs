use serde_json::Map;
use tracing::{debug, warn};

use crate::assays;
use crate::domain::{
    Author, InvestigationResult, ProjectRecord, ProjectSummary, StudyAssayMap, normalize_timestamp,
};
use crate::error::ArcIndexError;
use crate::grid::{DocumentKind, Grid, GridReader};
use crate::hub::{HubClient, list_dir_names};
use crate::investigation;
use crate::store::IndexStore;

pub const INVESTIGATION_FILE: &str = "isa.investigation.xlsx";
pub const ASSAYS_DIR: &str = "assays";
pub const STUDIES_DIR: &str = "studies";

pub fn study_file(study: &str) -> String {
    format!("{STUDIES_DIR}/{study}/isa.study.xlsx")
}

pub struct ProjectMetadataFetcher<'a, H: HubClient + ?Sized, G: GridReader + ?Sized> {
    client: &'a H,
    reader: &'a G,
    store: Option<&'a IndexStore>,
}

impl<'a, H: HubClient + ?Sized, G: GridReader + ?Sized> ProjectMetadataFetcher<'a, H, G> {
    pub fn new(client: &'a H, reader: &'a G) -> Self {
        Self {
            client,
            reader,
            store: None,
        }
    }

    pub fn with_store(mut self, store: &'a IndexStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn fetch(&self, hub: &str, project: &ProjectSummary) -> ProjectRecord {
        let git_ref = project.git_ref();
        let investigation = self.investigation(hub, project.id, git_ref);
        let license = self
            .client
            .get_license(hub, project.id)
            .unwrap_or_else(|err| {
                warn!(hub, project = project.id, error = %err, "license lookup failed");
                Map::new()
            });
        let assay_study_relation = self.assay_study_relation(hub, project.id, git_ref);

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
            license,
            identifier: investigation.identifier,
            url: project.http_url_to_repo.clone(),
            assay_study_relation,
            contacts: investigation.contacts,
            publications: investigation.publications,
        }
    }

    pub fn investigation(&self, hub: &str, project_id: u64, git_ref: &str) -> InvestigationResult {
        match self.download_grid(
            hub,
            project_id,
            INVESTIGATION_FILE,
            git_ref,
            DocumentKind::Investigation,
        ) {
            Ok(Some(grid)) => investigation::parse(&grid),
            Ok(None) => {
                debug!(hub, project = project_id, "no investigation file");
                InvestigationResult::empty()
            }
            Err(err) => {
                warn!(hub, project = project_id, error = %err, "investigation unavailable");
                InvestigationResult::empty()
            }
        }
    }

    pub fn assay_study_relation(&self, hub: &str, project_id: u64, git_ref: &str) -> StudyAssayMap {
        let assay_dirs = self.dir_names(hub, project_id, ASSAYS_DIR, git_ref);
        let studies = self.dir_names(hub, project_id, STUDIES_DIR, git_ref);
        assays::relate(&assay_dirs, &studies, |study| {
            self.study_assays(hub, project_id, study, git_ref)
        })
    }

    fn study_assays(&self, hub: &str, project_id: u64, study: &str, git_ref: &str) -> Vec<String> {
        let path = study_file(study);
        match self.download_grid(hub, project_id, &path, git_ref, DocumentKind::Study) {
            Ok(Some(grid)) => assays::resolve(&grid),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(hub, project = project_id, study, error = %err, "study manifest unavailable");
                Vec::new()
            }
        }
    }

    fn dir_names(&self, hub: &str, project_id: u64, path: &str, git_ref: &str) -> Vec<String> {
        list_dir_names(self.client, hub, project_id, path, git_ref).unwrap_or_else(|err| {
            warn!(hub, project = project_id, path, error = %err, "tree listing failed");
            Vec::new()
        })
    }

    fn download_grid(
        &self,
        hub: &str,
        project_id: u64,
        path: &str,
        git_ref: &str,
        kind: DocumentKind,
    ) -> Result<Option<Grid>, ArcIndexError> {
        if !self.client.head_exists(hub, project_id, path, git_ref)? {
            return Ok(None);
        }
        let bytes = self.client.get_raw(hub, project_id, path, git_ref)?;
        if let Some(store) = self.store {
            if let Err(err) = store.mirror_file(hub, project_id, path, &bytes) {
                warn!(hub, project = project_id, path, error = %err, "mirror write failed");
            }
        }
        self.reader.read(&bytes, kind).map(Some)
    }
}
