use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::HubSpec;
use crate::domain::ProjectSummary;
use crate::error::ArcIndexError;
use crate::hub::{HubClient, ProjectPage, TreeEntry, more_pages};

const TOTAL_PAGES_HEADER: &str = "x-total-pages";

#[derive(Clone)]
pub struct GitlabHttpClient {
    client: Client,
    hubs: Vec<HubSpec>,
    per_page: u32,
}

impl GitlabHttpClient {
    pub fn new(hubs: Vec<HubSpec>, timeout: Duration, per_page: u32) -> Result<Self, ArcIndexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("arc-index/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ArcIndexError::HubHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| ArcIndexError::HubHttp(err.to_string()))?;
        Ok(Self {
            client,
            hubs,
            per_page,
        })
    }

    fn base_url(&self, hub: &str) -> Result<&str, ArcIndexError> {
        self.hubs
            .iter()
            .find(|spec| spec.name == hub)
            .map(|spec| spec.base_url.as_str())
            .ok_or_else(|| ArcIndexError::UnknownHub(hub.to_string()))
    }

    /// `{base}/api/v4/projects[/{id}]/{segments..}`; each segment is encoded whole,
    /// so a file path becomes a single `%2F`-joined segment.
    fn api_url(
        &self,
        hub: &str,
        project_id: Option<u64>,
        segments: &[&str],
    ) -> Result<Url, ArcIndexError> {
        let mut url = Url::parse(&format!("{}/api/v4/projects", self.base_url(hub)?))
            .map_err(|err| ArcIndexError::HubHttp(err.to_string()))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ArcIndexError::HubHttp(format!("hub {hub} has no usable base url")))?;
            if let Some(id) = project_id {
                path.push(&id.to_string());
            }
            path.extend(segments);
        }
        Ok(url)
    }

    fn handle_status(response: Response) -> Result<Response, ArcIndexError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "hub request failed".to_string());
        Err(ArcIndexError::HubStatus { status, message })
    }

    fn send_with_retries<F>(&self, mut make_req: F) -> Result<Response, ArcIndexError>
    where
        F: FnMut() -> RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(ArcIndexError::HubHttp(err.to_string()));
                }
            }
        }
    }
}

impl HubClient for GitlabHttpClient {
    fn head_exists(
        &self,
        hub: &str,
        project_id: u64,
        path: &str,
        git_ref: &str,
    ) -> Result<bool, ArcIndexError> {
        let url = self.api_url(hub, Some(project_id), &["repository", "files", path])?;
        let response =
            self.send_with_retries(|| self.client.head(url.clone()).query(&[("ref", git_ref)]))?;
        debug!(hub, project = project_id, path, status = %response.status(), "file head");
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::handle_status(response).map(|_| true)
    }

    fn get_raw(
        &self,
        hub: &str,
        project_id: u64,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<u8>, ArcIndexError> {
        let url = self.api_url(hub, Some(project_id), &["repository", "files", path, "raw"])?;
        let response =
            self.send_with_retries(|| self.client.get(url.clone()).query(&[("ref", git_ref)]))?;
        let response = Self::handle_status(response)?;
        let bytes = response
            .bytes()
            .map_err(|err| ArcIndexError::HubHttp(err.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn list_tree(
        &self,
        hub: &str,
        project_id: u64,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<TreeEntry>, ArcIndexError> {
        let url = self.api_url(hub, Some(project_id), &["repository", "tree"])?;
        let per_page = self.per_page.to_string();
        let mut entries = Vec::new();
        let mut page = 1u32;
        loop {
            let page_param = page.to_string();
            let response = self.send_with_retries(|| {
                self.client.get(url.clone()).query(&[
                    ("path", path),
                    ("ref", git_ref),
                    ("per_page", per_page.as_str()),
                    ("page", page_param.as_str()),
                ])
            })?;
            let response = Self::handle_status(response)?;
            let total_pages = total_pages(&response);
            let batch: Vec<TreeEntry> = response
                .json()
                .map_err(|err| ArcIndexError::HubPayload(err.to_string()))?;
            let more = more_pages(page, total_pages, batch.len(), self.per_page);
            entries.extend(batch);
            if !more {
                break;
            }
            page += 1;
        }
        Ok(entries)
    }

    fn list_public_projects(&self, hub: &str, page: u32) -> Result<ProjectPage, ArcIndexError> {
        let url = self.api_url(hub, None, &[])?;
        let per_page = self.per_page.to_string();
        let page_param = page.to_string();
        let response = self.send_with_retries(|| {
            self.client.get(url.clone()).query(&[
                ("visibility", "public"),
                ("order_by", "id"),
                ("sort", "asc"),
                ("per_page", per_page.as_str()),
                ("page", page_param.as_str()),
            ])
        })?;
        let response = Self::handle_status(response)?;
        let total_pages = total_pages(&response);
        let items: Vec<ProjectSummary> = response
            .json()
            .map_err(|err| ArcIndexError::HubPayload(err.to_string()))?;
        debug!(hub, page, ?total_pages, items = items.len(), "project page");
        Ok(ProjectPage {
            items,
            total_pages,
            per_page: self.per_page,
        })
    }

    fn get_license(&self, hub: &str, project_id: u64) -> Result<Map<String, Value>, ArcIndexError> {
        let url = self.api_url(hub, Some(project_id), &[])?;
        let response =
            self.send_with_retries(|| self.client.get(url.clone()).query(&[("license", "true")]))?;
        let response = Self::handle_status(response)?;
        let project: Value = response
            .json()
            .map_err(|err| ArcIndexError::HubPayload(err.to_string()))?;
        Ok(project
            .get("license")
            .and_then(|value| value.as_object())
            .cloned()
            .unwrap_or_default())
    }
}

fn total_pages(response: &Response) -> Option<u32> {
    response
        .headers()
        .get(TOTAL_PAGES_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}
