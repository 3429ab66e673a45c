//! Wire shapes exchanged with the content and plan-storage collaborators.
//!
//! Every collection defaults to empty so that a partially filled payload still
//! loads; the catalog and plan builders decide what to skip.

use serde::{Deserialize, Serialize};

use crate::domain::model::{CourseId, RequirementId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPayload {
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub available_classes: Vec<CoursePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_requirements: Option<Vec<RequirementPayload>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_requirement_groups: Option<Vec<RequirementGroupPayload>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePayload {
    pub id: CourseId,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub units: u32,
    #[serde(default)]
    pub description: String,
    /// Flat list; every entry is individually required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prereq_ids: Option<Vec<CourseId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prereq_groups: Option<Vec<Vec<CourseId>>>,
    #[serde(default)]
    pub fulfills_req_ids: Vec<RequirementId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementPayload {
    pub id: RequirementId,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub courses_to_choose: Option<u32>,
    #[serde(default)]
    pub fulfilled_by_class_ids: Vec<CourseId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementGroupPayload {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub num_requirements_to_choose: Option<usize>,
    #[serde(default)]
    pub requirements: Vec<RequirementPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MajorRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlan {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub major: MajorRef,
    #[serde(default)]
    pub quarters: Vec<SavedQuarter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuarter {
    pub quarter_number: u32,
    #[serde(default)]
    pub plan_classes: Vec<PlanClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanClass {
    pub class: ClassSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub id: CourseId,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub units: u32,
    #[serde(default)]
    pub description: String,
}

/// What the plan store persists: the saved plan plus the quarter-0 id list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPlan {
    pub plan: SavedPlan,
    #[serde(default)]
    pub completed_class_ids: Vec<CourseId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_collections_default_to_empty() {
        let catalog: CatalogPayload = serde_json::from_str("{}").unwrap();
        assert!(catalog.available_classes.is_empty());
        assert!(catalog.major_requirements.is_none());

        let plan: SavedPlan = serde_json::from_str(r#"{"id": "p1", "name": "Mine"}"#).unwrap();
        assert!(plan.quarters.is_empty());
        assert_eq!(plan.major.name, "");
    }

    #[test]
    fn test_camel_case_fields() {
        let json = r#"{
            "id": "R1",
            "name": "Lower Division",
            "type": "Major",
            "coursesToChoose": 2,
            "fulfilledByClassIds": ["A", "B"]
        }"#;
        let req: RequirementPayload = serde_json::from_str(json).unwrap();
        assert_eq!(req.kind, "Major");
        assert_eq!(req.courses_to_choose, Some(2));
        assert_eq!(req.fulfilled_by_class_ids.len(), 2);
    }
}
