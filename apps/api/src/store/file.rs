//! JSON file store: one pretty-printed file per concluded session.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{SessionStore, StorageError};
use crate::interview::models::SessionRecord;

pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<name_slug>_<YYYYmmdd_HHMMSS>_<id prefix>.json`
    fn file_name(record: &SessionRecord) -> String {
        let id = record.session_id.simple().to_string();
        format!(
            "{}_{}_{}.json",
            name_slug(record.candidate.name.as_deref()),
            record.submission_timestamp.format("%Y%m%d_%H%M%S"),
            &id[..8]
        )
    }
}

#[async_trait]
impl SessionStore for JsonFileStore {
    async fn save(&self, record: &SessionRecord) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(Self::file_name(record));
        let json = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&path, json).await?;

        info!("Wrote session record {}", path.display());
        Ok(path.display().to_string())
    }

    async fn list(&self) -> Result<Vec<SessionRecord>, StorageError> {
        if !tokio::fs::try_exists(&self.dir).await? {
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut records = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<SessionRecord>(&bytes) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable record {}: {}", path.display(), e),
            }
        }

        records.sort_by_key(|r| r.submission_timestamp);
        Ok(records)
    }
}

fn name_slug(name: Option<&str>) -> String {
    let slug = name
        .unwrap_or_default()
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if slug.is_empty() {
        "candidate".to_string()
    } else {
        slug
    }
}
