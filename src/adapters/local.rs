use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::payload::{CatalogPayload, StoredPlan};
use crate::domain::ports::{CatalogSource, PlanStore};
use crate::utils::error::{PlannerError, Result};

/// JSON files under one data directory:
/// `catalogs/<major>.json` and `plans/<plan id>.json`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn catalog_path(&self, major: &str) -> PathBuf {
        self.base_path
            .join("catalogs")
            .join(format!("{}.json", file_stem(major)))
    }

    fn plan_path(&self, plan_id: &str) -> PathBuf {
        self.base_path
            .join("plans")
            .join(format!("{}.json", file_stem(plan_id)))
    }

    pub async fn write_catalog(&self, major: &str, payload: &CatalogPayload) -> Result<()> {
        write_json(&self.catalog_path(major), payload).await
    }
}

/// Injective mapping from ids to file names: ASCII alphanumerics and `-`
/// pass through, every other byte becomes `_XX`. The empty id is `_`.
fn file_stem(raw: &str) -> String {
    if raw.is_empty() {
        return "_".to_string();
    }
    let mut stem = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{:02X}", byte));
        }
    }
    stem
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let data = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, data).await?;
    Ok(())
}

#[async_trait]
impl CatalogSource for LocalStore {
    async fn load_catalog(&self, major: &str) -> Result<CatalogPayload> {
        let path = self.catalog_path(major);
        tracing::debug!("Reading catalog from {}", path.display());
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PlannerError::CatalogNotFound {
                major: major.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PlanStore for LocalStore {
    async fn load_plan(&self, plan_id: &str) -> Result<Option<StoredPlan>> {
        let path = self.plan_path(plan_id);
        match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data)
                .map(Some)
                .map_err(|e| PlannerError::PayloadError {
                    message: format!("{}: {}", path.display(), e),
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_plan(&self, plan: &StoredPlan) -> Result<()> {
        let path = self.plan_path(&plan.plan.id);
        tracing::debug!("Writing plan to {}", path.display());
        write_json(&path, plan).await
    }

    async fn delete_plan(&self, plan_id: &str) -> Result<()> {
        match tokio::fs::remove_file(self.plan_path(plan_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
