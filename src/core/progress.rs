//! Requirement fulfillment.
//!
//! Courses are assigned greedily: requirements are visited in category
//! priority order (the narrowest requirement first within a category, then
//! declaration order), and each one takes the eligible unassigned course with the
//! fewest eligible requirements overall, earliest in plan order on ties. A
//! course counts toward at most one requirement.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::catalog::Catalog;
use crate::core::plan_state::PlanState;
use crate::domain::model::{Category, CourseId, Requirement, RequirementGroup, RequirementId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementProgress {
    pub id: RequirementId,
    pub name: String,
    pub category: Category,
    pub assigned: Vec<CourseId>,
    pub completed: u32,
    pub total: u32,
}

impl RequirementProgress {
    pub fn is_satisfied(&self) -> bool {
        self.completed >= self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupProgress {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub completed: u32,
    pub total: u32,
    pub requirements: Vec<RequirementProgress>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryProgress {
    pub category: Category,
    pub completed: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub groups: Vec<GroupProgress>,
    /// Only categories that have at least one group, in priority order.
    pub categories: Vec<CategoryProgress>,
    pub assignments: BTreeMap<CourseId, RequirementId>,
    /// Taken or planned courses that count toward nothing.
    pub unassigned: Vec<CourseId>,
    pub percent: f64,
}

impl ProgressReport {
    pub fn category(&self, category: Category) -> Option<&CategoryProgress> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn requirement(&self, id: &RequirementId) -> Option<&RequirementProgress> {
        self.groups
            .iter()
            .flat_map(|g| g.requirements.iter())
            .find(|r| r.id == *id)
    }
}

/// Position of a requirement inside the catalog's group list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequirementSlot {
    group: usize,
    requirement: usize,
}

pub fn compute(catalog: &Catalog, plan: &PlanState) -> ProgressReport {
    let courses: Vec<CourseId> = plan
        .ordered_courses()
        .into_iter()
        .filter(|id| catalog.contains(id))
        .collect();
    compute_for(catalog, &courses)
}

/// Runs the assignment over an explicit course order.
pub fn compute_for(catalog: &Catalog, courses: &[CourseId]) -> ProgressReport {
    let groups = catalog.groups();
    let flat = flatten(catalog, groups);
    let picks = assign(catalog, courses, &flat, groups);

    let mut assigned: BTreeMap<(usize, usize), Vec<CourseId>> = BTreeMap::new();
    let mut assignments = BTreeMap::new();
    for (flat_index, course_indices) in picks.iter().enumerate() {
        let at = flat[flat_index];
        let requirement = &groups[at.group].requirements[at.requirement];
        for &c in course_indices {
            assignments.insert(courses[c].clone(), requirement.id.clone());
            assigned
                .entry((at.group, at.requirement))
                .or_default()
                .push(courses[c].clone());
        }
    }

    let group_progress: Vec<GroupProgress> = groups
        .iter()
        .enumerate()
        .map(|(g, group)| {
            let requirements = group
                .requirements
                .iter()
                .enumerate()
                .map(|(r, requirement)| {
                    let picked = assigned.remove(&(g, r)).unwrap_or_default();
                    requirement_progress(requirement, picked)
                })
                .collect();
            roll_up_group(group, requirements)
        })
        .collect();

    let categories: Vec<CategoryProgress> = Category::PRIORITY
        .iter()
        .filter_map(|&category| {
            let mut members = group_progress.iter().filter(|g| g.category == category).peekable();
            members.peek()?;
            let (completed, total) = members.fold((0u32, 0u32), |(c, t), g| {
                (c.saturating_add(g.completed), t.saturating_add(g.total))
            });
            Some(CategoryProgress {
                category,
                completed,
                total,
            })
        })
        .collect();

    let (completed, total) = categories.iter().fold((0u32, 0u32), |(c, t), category| {
        (
            c.saturating_add(category.completed),
            t.saturating_add(category.total),
        )
    });
    let percent = if total == 0 {
        0.0
    } else {
        f64::from(completed) / f64::from(total) * 100.0
    };

    let unassigned = courses
        .iter()
        .filter(|id| !assignments.contains_key(*id))
        .cloned()
        .collect();

    ProgressReport {
        groups: group_progress,
        categories,
        assignments,
        unassigned,
        percent,
    }
}

/// Requirements in category priority order. Within a category the one with
/// the fewest eligible catalog courses comes first; ties keep declaration
/// order.
fn flatten(catalog: &Catalog, groups: &[RequirementGroup]) -> Vec<RequirementSlot> {
    let mut flat: Vec<RequirementSlot> = groups
        .iter()
        .enumerate()
        .flat_map(|(group, g)| {
            (0..g.requirements.len()).map(move |requirement| RequirementSlot { group, requirement })
        })
        .collect();
    flat.sort_by_cached_key(|at| {
        let requirement = &groups[at.group].requirements[at.requirement];
        (requirement.category.rank(), eligible_pool_size(catalog, requirement))
    });
    flat
}

fn eligible_pool_size(catalog: &Catalog, requirement: &Requirement) -> usize {
    let outside_catalog = requirement
        .fulfilled_by
        .iter()
        .filter(|id| !catalog.contains(id))
        .count();
    let in_catalog = catalog
        .courses()
        .iter()
        .filter(|c| catalog.is_eligible(&c.id, requirement))
        .count();
    outside_catalog + in_catalog
}

/// For each flattened requirement, the indices (into `courses`) assigned to it.
fn assign(
    catalog: &Catalog,
    courses: &[CourseId],
    flat: &[RequirementSlot],
    groups: &[RequirementGroup],
) -> Vec<Vec<usize>> {
    let eligible: Vec<Vec<bool>> = courses
        .iter()
        .map(|course| {
            flat.iter()
                .map(|at| catalog.is_eligible(course, &groups[at.group].requirements[at.requirement]))
                .collect()
        })
        .collect();
    let option_counts: Vec<usize> = eligible
        .iter()
        .map(|row| row.iter().filter(|e| **e).count())
        .collect();

    let mut taken = vec![false; courses.len()];
    let mut picks = vec![Vec::new(); flat.len()];

    for (flat_index, at) in flat.iter().enumerate() {
        let need = groups[at.group].requirements[at.requirement].courses_to_choose as usize;
        while picks[flat_index].len() < need {
            let candidate = (0..courses.len())
                .filter(|&c| !taken[c] && eligible[c][flat_index])
                .min_by_key(|&c| (option_counts[c], c));
            let Some(c) = candidate else {
                break;
            };
            taken[c] = true;
            picks[flat_index].push(c);
        }
    }

    picks
}

fn requirement_progress(requirement: &Requirement, assigned: Vec<CourseId>) -> RequirementProgress {
    RequirementProgress {
        id: requirement.id.clone(),
        name: requirement.name.clone(),
        category: requirement.category,
        completed: assigned.len() as u32,
        total: requirement.courses_to_choose,
        assigned,
    }
}

fn roll_up_group(group: &RequirementGroup, requirements: Vec<RequirementProgress>) -> GroupProgress {
    let (completed, total) = match requirements.as_slice() {
        [] => (0, 0),
        [only] => (only.completed, only.total),
        [first, rest @ ..] if group.num_requirements_to_choose <= 1 => {
            let best = rest
                .iter()
                .fold(first, |best, r| if r.completed > best.completed { r } else { best });
            (best.completed, best.total)
        }
        [first, ..] => {
            let picks = u32::try_from(group.num_requirements_to_choose).unwrap_or(u32::MAX);
            let total = picks.saturating_mul(first.total);
            let completed = requirements
                .iter()
                .filter(|r| r.is_satisfied())
                .fold(0u32, |sum, r| sum.saturating_add(r.completed));
            (completed.min(total), total)
        }
    };

    GroupProgress {
        id: group.id.clone(),
        name: group.name.clone(),
        category: group.category,
        completed,
        total,
        requirements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<CourseId> {
        list.iter().map(|s| CourseId::from(*s)).collect()
    }

    #[test]
    fn test_scarce_course_goes_to_the_requirement_that_needs_it() {
        let json = r#"{
            "availableClasses": [{"id": "C1", "units": 4}, {"id": "C2", "units": 4}],
            "majorRequirements": [
                {"id": "R1", "type": "Major", "fulfilledByClassIds": ["C1", "C2"]},
                {"id": "R2", "type": "Major", "fulfilledByClassIds": ["C2"]}
            ]
        }"#;
        let catalog = Catalog::from_json("TEST", json).unwrap();
        let report = compute_for(&catalog, &ids(&["C2", "C1"]));
        assert_eq!(report.requirement(&RequirementId::from("R1")).unwrap().assigned, ids(&["C1"]));
        assert_eq!(report.requirement(&RequirementId::from("R2")).unwrap().assigned, ids(&["C2"]));
        assert!((report.percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_narrow_requirement_claims_a_shared_course_first() {
        let json = r#"{
            "availableClasses": [{"id": "C1", "units": 4}, {"id": "C2", "units": 4}],
            "majorRequirements": [
                {"id": "R1", "type": "Major", "fulfilledByClassIds": ["C1", "C2"]},
                {"id": "R2", "type": "Major", "fulfilledByClassIds": ["C2"]}
            ]
        }"#;
        let catalog = Catalog::from_json("TEST", json).unwrap();
        let report = compute_for(&catalog, &ids(&["C2"]));
        assert_eq!(report.requirement(&RequirementId::from("R2")).unwrap().assigned, ids(&["C2"]));
        let r1 = report.requirement(&RequirementId::from("R1")).unwrap();
        assert_eq!((r1.completed, r1.total), (0, 1));
    }

    #[test]
    fn test_category_priority_decides_contention() {
        let json = r#"{
            "availableClasses": [{"id": "X", "units": 4}],
            "majorRequirementGroups": [
                {"id": "ge", "type": "GE", "requirements": [
                    {"id": "GE1", "fulfilledByClassIds": ["X"]}]},
                {"id": "prep", "type": "Prep", "requirements": [
                    {"id": "P1", "fulfilledByClassIds": ["X"]}]}
            ]
        }"#;
        let catalog = Catalog::from_json("TEST", json).unwrap();
        let report = compute_for(&catalog, &ids(&["X"]));
        assert_eq!(report.assignments.get(&CourseId::from("X")), Some(&RequirementId::from("P1")));
        assert_eq!(report.category(Category::Ge).unwrap().completed, 0);
        assert_eq!(report.category(Category::Prep).unwrap().completed, 1);
        assert!((report.percent - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ties_prefer_earlier_courses() {
        let json = r#"{
            "availableClasses": [{"id": "A", "units": 4}, {"id": "B", "units": 4}],
            "majorRequirements": [
                {"id": "R", "type": "Major", "coursesToChoose": 1, "fulfilledByClassIds": ["A", "B"]}
            ]
        }"#;
        let catalog = Catalog::from_json("TEST", json).unwrap();
        let report = compute_for(&catalog, &ids(&["B", "A"]));
        assert_eq!(report.requirement(&RequirementId::from("R")).unwrap().assigned, ids(&["B"]));
        assert_eq!(report.unassigned, ids(&["A"]));
    }

    #[test]
    fn test_pick_one_group_reports_best_requirement() {
        let json = r#"{
            "availableClasses": [{"id": "A", "units": 4}, {"id": "B", "units": 4}, {"id": "C", "units": 4}],
            "majorRequirementGroups": [
                {"id": "g", "type": "Tech Breadth", "numRequirementsToChoose": 1, "requirements": [
                    {"id": "T1", "coursesToChoose": 3, "fulfilledByClassIds": ["A"]},
                    {"id": "T2", "coursesToChoose": 2, "fulfilledByClassIds": ["B", "C"]}
                ]}
            ]
        }"#;
        let catalog = Catalog::from_json("TEST", json).unwrap();
        let report = compute_for(&catalog, &ids(&["A", "B", "C"]));
        let group = &report.groups[0];
        assert_eq!((group.completed, group.total), (2, 2));
    }

    #[test]
    fn test_choose_many_group_counts_only_satisfied_requirements() {
        let json = r#"{
            "availableClasses": [{"id": "A", "units": 4}, {"id": "B", "units": 4}, {"id": "C", "units": 4}],
            "majorRequirementGroups": [
                {"id": "g", "type": "Sci-Tech", "numRequirementsToChoose": 2, "requirements": [
                    {"id": "S1", "coursesToChoose": 2, "fulfilledByClassIds": ["A", "B"]},
                    {"id": "S2", "coursesToChoose": 2, "fulfilledByClassIds": ["C"]},
                    {"id": "S3", "coursesToChoose": 2, "fulfilledByClassIds": []}
                ]}
            ]
        }"#;
        let catalog = Catalog::from_json("TEST", json).unwrap();
        let report = compute_for(&catalog, &ids(&["A", "B", "C"]));
        let group = &report.groups[0];
        assert_eq!(group.total, 4);
        assert_eq!(group.completed, 2);
        assert_eq!(group.requirements[1].completed, 1);
    }

    #[test]
    fn test_huge_course_counts_saturate() {
        let json = r#"{
            "availableClasses": [{"id": "A", "units": 4}],
            "majorRequirementGroups": [
                {"id": "g", "type": "Major", "numRequirementsToChoose": 2, "requirements": [
                    {"id": "M1", "coursesToChoose": 4294967295, "fulfilledByClassIds": ["A"]},
                    {"id": "M2", "coursesToChoose": 4294967295}
                ]},
                {"id": "h", "type": "Major", "requirements": [
                    {"id": "M3", "coursesToChoose": 4294967295}
                ]}
            ]
        }"#;
        let catalog = Catalog::from_json("TEST", json).unwrap();
        let report = compute_for(&catalog, &ids(&["A"]));
        assert_eq!(report.groups[0].total, u32::MAX);
        assert_eq!(report.categories[0].total, u32::MAX);
        assert!(report.percent < 1e-6);
    }

    #[test]
    fn test_empty_catalog_is_zero_percent() {
        let catalog = Catalog::from_json("TEST", "{}").unwrap();
        let report = compute_for(&catalog, &[]);
        assert!(report.groups.is_empty());
        assert_eq!(report.percent, 0.0);
    }
}
