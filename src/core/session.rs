use std::sync::Arc;

use crate::core::catalog::Catalog;
use crate::core::move_engine::{EngineSettings, MoveEngine};
use crate::core::plan_state::{HydrationReport, PlanState};
use crate::domain::payload::StoredPlan;
use crate::domain::ports::{CatalogSource, PlanStore};
use crate::utils::error::Result;

/// Awaits the collaborators, then hands the fetched snapshots to the
/// synchronous core.
pub struct PlanSession<C: CatalogSource, S: PlanStore> {
    catalogs: C,
    store: S,
    settings: EngineSettings,
    plan_id: String,
    plan_name: String,
    engine: MoveEngine,
}

impl<C: CatalogSource, S: PlanStore> PlanSession<C, S> {
    /// Loads the major's catalog and, if it exists, the stored plan.
    pub async fn open(
        catalogs: C,
        store: S,
        settings: EngineSettings,
        major: &str,
        plan_id: &str,
    ) -> Result<(Self, HydrationReport)> {
        let catalog = Arc::new(Catalog::from_payload(major, catalogs.load_catalog(major).await?));
        tracing::info!(
            "Loaded catalog for {} ({} courses)",
            catalog.major(),
            catalog.courses().len()
        );

        let (plan, plan_name, report) = match store.load_plan(plan_id).await? {
            Some(stored) => {
                if !stored.plan.major.name.is_empty() && stored.plan.major.name != catalog.major() {
                    tracing::warn!(
                        "Plan {} was saved for {}, opening with {}",
                        plan_id,
                        stored.plan.major.name,
                        catalog.major()
                    );
                }
                let (plan, report) = PlanState::hydrate(&catalog, &stored, settings.unit_cap);
                log_hydration(plan_id, &report);
                (plan, stored.plan.name, report)
            }
            None => {
                tracing::info!("Plan {} not found, starting empty", plan_id);
                (PlanState::new(&catalog), plan_id.to_string(), HydrationReport::default())
            }
        };

        let engine = MoveEngine::new(catalog, plan, settings);
        Ok((
            Self {
                catalogs,
                store,
                settings,
                plan_id: plan_id.to_string(),
                plan_name,
                engine,
            },
            report,
        ))
    }

    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    pub fn plan_name(&self) -> &str {
        &self.plan_name
    }

    pub fn rename(&mut self, name: &str) {
        self.plan_name = name.to_string();
    }

    pub fn engine(&self) -> &MoveEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MoveEngine {
        &mut self.engine
    }

    pub fn to_stored_plan(&self) -> StoredPlan {
        self.engine
            .plan()
            .to_stored_plan(self.engine.catalog(), &self.plan_id, &self.plan_name)
    }

    pub async fn save(&self) -> Result<()> {
        let stored = self.to_stored_plan();
        self.store.save_plan(&stored).await?;
        tracing::info!(
            "Saved plan {} ({} quarters, {} completed)",
            self.plan_id,
            stored.plan.quarters.len(),
            stored.completed_class_ids.len()
        );
        Ok(())
    }

    /// Replaces the catalog and starts an empty plan for the new major.
    pub async fn switch_major(&mut self, major: &str) -> Result<()> {
        let payload = self.catalogs.load_catalog(major).await?;
        self.engine
            .replace_catalog(Arc::new(Catalog::from_payload(major, payload)));
        tracing::info!("Switched plan {} to {}", self.plan_id, major);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.engine.reset();
        tracing::info!("Reset plan {}", self.plan_id);
    }

    /// Resets and removes the stored copy.
    pub async fn discard(mut self) -> Result<()> {
        self.reset();
        self.store.delete_plan(&self.plan_id).await
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }
}

fn log_hydration(plan_id: &str, report: &HydrationReport) {
    if report.is_clean() {
        return;
    }
    for id in &report.unknown_courses {
        tracing::warn!("Plan {} references unknown course {}", plan_id, id);
    }
    for id in &report.duplicates {
        tracing::warn!("Plan {} lists {} more than once", plan_id, id);
    }
    for id in &report.over_unit_cap {
        tracing::warn!("Plan {}: {} left unplaced, its quarter is over the unit cap", plan_id, id);
    }
    for n in &report.invalid_quarters {
        tracing::warn!("Plan {} has out-of-range quarter {}", plan_id, n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CourseId, SlotId};
    use crate::domain::payload::{CatalogPayload, CoursePayload};
    use crate::core::move_engine::DropTarget;
    use crate::utils::error::PlannerError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StaticCatalogs;

    #[async_trait]
    impl CatalogSource for StaticCatalogs {
        async fn load_catalog(&self, major: &str) -> Result<CatalogPayload> {
            let ids: &[&str] = match major {
                "CS" => &["CSE8A", "CSE8B"],
                "MATH" => &["MATH20A"],
                _ => {
                    return Err(PlannerError::CatalogNotFound {
                        major: major.to_string(),
                    })
                }
            };
            Ok(CatalogPayload {
                major: None,
                available_classes: ids
                    .iter()
                    .map(|id| CoursePayload {
                        id: CourseId::from(*id),
                        code: id.to_string(),
                        units: 4,
                        ..Default::default()
                    })
                    .collect(),
                major_requirements: None,
                major_requirement_groups: None,
            })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        plans: Mutex<HashMap<String, StoredPlan>>,
    }

    #[async_trait]
    impl PlanStore for MemoryStore {
        async fn load_plan(&self, plan_id: &str) -> Result<Option<StoredPlan>> {
            Ok(self.plans.lock().unwrap().get(plan_id).cloned())
        }

        async fn save_plan(&self, plan: &StoredPlan) -> Result<()> {
            self.plans
                .lock()
                .unwrap()
                .insert(plan.plan.id.clone(), plan.clone());
            Ok(())
        }

        async fn delete_plan(&self, plan_id: &str) -> Result<()> {
            self.plans.lock().unwrap().remove(plan_id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_open_missing_plan_starts_empty() {
        let (session, report) = PlanSession::open(
            StaticCatalogs,
            MemoryStore::default(),
            EngineSettings::default(),
            "CS",
            "p1",
        )
        .await
        .unwrap();
        assert!(report.is_clean());
        assert_eq!(session.engine().plan().pool().len(), 2);
        assert_eq!(session.plan_name(), "p1");
    }

    #[tokio::test]
    async fn test_unknown_major_is_an_error() {
        let result = PlanSession::open(
            StaticCatalogs,
            MemoryStore::default(),
            EngineSettings::default(),
            "ART",
            "p1",
        )
        .await;
        assert!(matches!(result, Err(PlannerError::CatalogNotFound { .. })));
    }

    #[tokio::test]
    async fn test_save_then_switch_major() {
        let (mut session, _) = PlanSession::open(
            StaticCatalogs,
            MemoryStore::default(),
            EngineSettings::default(),
            "CS",
            "p1",
        )
        .await
        .unwrap();
        let slot = SlotId::new(1, 1).unwrap();
        session
            .engine_mut()
            .move_course(&CourseId::from("CSE8A"), Some(DropTarget::Slot(slot)));
        session.save().await.unwrap();

        let saved = session.store.load_plan("p1").await.unwrap().unwrap();
        assert_eq!(saved.plan.quarters.len(), 1);
        assert_eq!(saved.plan.major.name, "CS");

        session.switch_major("MATH").await.unwrap();
        assert_eq!(session.engine().catalog().major(), "MATH");
        assert!(session.engine().plan().placed().next().is_none());
    }
}
