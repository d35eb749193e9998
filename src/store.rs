use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::domain::ProjectRecord;
use crate::error::ArcIndexError;

#[derive(Debug, Clone)]
pub struct IndexStore {
    index_path: Utf8PathBuf,
    mirror_root: Option<Utf8PathBuf>,
}

impl IndexStore {
    pub fn new(index_path: Utf8PathBuf) -> Self {
        Self {
            index_path,
            mirror_root: None,
        }
    }

    pub fn with_mirror(mut self, mirror_root: Option<Utf8PathBuf>) -> Self {
        self.mirror_root = mirror_root;
        self
    }

    pub fn index_path(&self) -> &Utf8Path {
        &self.index_path
    }

    pub fn exists(&self) -> bool {
        self.index_path.as_std_path().exists()
    }

    pub fn load(&self) -> Result<Vec<ProjectRecord>, ArcIndexError> {
        if !self.exists() {
            return Err(ArcIndexError::IndexUnavailable(
                self.index_path.as_std_path().to_path_buf(),
            ));
        }
        let content = fs::read_to_string(self.index_path.as_std_path())
            .map_err(|err| ArcIndexError::Filesystem(format!("read {}: {err}", self.index_path)))?;
        serde_json::from_str(&content).map_err(|err| ArcIndexError::IndexCorrupt(err.to_string()))
    }

    pub fn save(&self, records: &[ProjectRecord]) -> Result<(), ArcIndexError> {
        let content =
            serde_json::to_vec(records).map_err(|err| ArcIndexError::Filesystem(err.to_string()))?;
        Self::write_bytes_atomic(&self.index_path, &content)
    }

    pub fn mirror_path(&self, hub: &str, project_id: u64, path: &str) -> Option<Utf8PathBuf> {
        self.mirror_root
            .as_ref()
            .map(|root| root.join(format!("{hub}-{project_id}")).join(path))
    }

    pub fn mirror_file(
        &self,
        hub: &str,
        project_id: u64,
        path: &str,
        content: &[u8],
    ) -> Result<(), ArcIndexError> {
        let Some(destination) = self.mirror_path(hub, project_id, path) else {
            return Ok(());
        };
        debug!(%destination, "mirroring file");
        Self::write_bytes_atomic(&destination, content)
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), ArcIndexError> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
            _ => Utf8PathBuf::from("."),
        };
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| ArcIndexError::Filesystem(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix(".arc-index")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| ArcIndexError::Filesystem(err.to_string()))?;
        temp.write_all(content)
            .map_err(|err| ArcIndexError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| ArcIndexError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_layout() {
        let store = IndexStore::new(Utf8PathBuf::from("index.json"))
            .with_mirror(Some(Utf8PathBuf::from("/srv/arcs")));
        let path = store
            .mirror_path("freiburg", 12, "studies/S1/isa.study.xlsx")
            .unwrap();
        assert_eq!(path.as_str(), "/srv/arcs/freiburg-12/studies/S1/isa.study.xlsx");

        let bare = IndexStore::new(Utf8PathBuf::from("index.json"));
        assert!(bare.mirror_path("freiburg", 12, "isa.investigation.xlsx").is_none());
    }

    #[test]
    fn save_replaces_existing_index() {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("index.json")).unwrap();
        fs::write(path.as_std_path(), b"stale").unwrap();

        let store = IndexStore::new(path.clone());
        store.save(&[]).unwrap();

        assert_eq!(fs::read_to_string(path.as_std_path()).unwrap(), "[]");
        assert!(store.load().unwrap().is_empty());
    }
}
