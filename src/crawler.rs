use tracing::{debug, info};

use crate::domain::ProjectSummary;
use crate::error::ArcIndexError;
use crate::hub::HubClient;

pub struct HubCrawler<'a, H: HubClient + ?Sized> {
    client: &'a H,
}

impl<'a, H: HubClient + ?Sized> HubCrawler<'a, H> {
    pub fn new(client: &'a H) -> Self {
        Self { client }
    }

    pub fn crawl_all(&self, hub: &str) -> Result<Vec<ProjectSummary>, ArcIndexError> {
        let mut projects = Vec::new();
        let mut page = 1u32;
        loop {
            let next = self.client.list_public_projects(hub, page)?;
            debug!(hub, page, items = next.items.len(), "fetched project page");
            let more = next.has_more(page);
            projects.extend(next.items);
            if !more {
                break;
            }
            page += 1;
        }
        if projects.is_empty() {
            info!(hub, "hub lists no public projects");
        } else {
            info!(hub, pages = page, projects = projects.len(), "hub listing complete");
        }
        Ok(projects)
    }
}
