use crate::domain::payload::{CatalogPayload, StoredPlan};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Content collaborator: one catalog per major.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load_catalog(&self, major: &str) -> Result<CatalogPayload>;
}

/// Plan-persistence collaborator.
#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn load_plan(&self, plan_id: &str) -> Result<Option<StoredPlan>>;
    async fn save_plan(&self, plan: &StoredPlan) -> Result<()>;
    async fn delete_plan(&self, plan_id: &str) -> Result<()>;
}
