use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::catalog::Catalog;
use crate::core::plan_state::PlanState;
use crate::domain::model::{Course, CourseId, SlotId, DEFAULT_UNIT_CAP};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitCapCheck {
    pub current: u32,
    pub adding: u32,
    pub cap: u32,
}

impl UnitCapCheck {
    /// A sum that overflows `u32` is over any cap.
    pub fn passes(&self) -> bool {
        self.current
            .checked_add(self.adding)
            .is_some_and(|units| units <= self.cap)
    }
}

/// Unsatisfied OR-groups, each listed by course code. Reporting only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrereqCheck {
    pub missing_groups: Vec<Vec<String>>,
}

impl PrereqCheck {
    pub fn satisfied(&self) -> bool {
        self.missing_groups.is_empty()
    }
}

/// A placed course that needs the moving course strictly earlier than itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockingDependent {
    pub course: CourseId,
    pub code: String,
    pub slot: SlotId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementCheck {
    pub unit_cap: UnitCapCheck,
    pub prerequisites: PrereqCheck,
    pub blocking_dependents: Vec<BlockingDependent>,
}

impl PlacementCheck {
    /// Dependents are advisory and do not affect this.
    pub fn allowed(&self) -> bool {
        self.unit_cap.passes() && self.prerequisites.satisfied()
    }
}

/// Side-effect-free placement predicates over a plan and its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementValidator {
    unit_cap: u32,
}

impl Default for PlacementValidator {
    fn default() -> Self {
        Self::new(DEFAULT_UNIT_CAP)
    }
}

impl PlacementValidator {
    pub fn new(unit_cap: u32) -> Self {
        Self { unit_cap }
    }

    pub fn unit_cap(&self) -> u32 {
        self.unit_cap
    }

    pub fn check_unit_cap(
        &self,
        plan: &PlanState,
        catalog: &Catalog,
        target: SlotId,
        course: &Course,
    ) -> UnitCapCheck {
        let current = plan
            .slot(target)
            .iter()
            .filter(|id| **id != course.id)
            .filter_map(|id| catalog.course(id))
            .fold(0u32, |units, c| units.saturating_add(c.units));
        UnitCapCheck {
            current,
            adding: course.units,
            cap: self.unit_cap,
        }
    }

    pub fn check_prerequisites(
        &self,
        plan: &PlanState,
        catalog: &Catalog,
        target: SlotId,
        course: &Course,
    ) -> PrereqCheck {
        let taken = taken_before(plan, target, &course.id);
        let missing_groups = course
            .effective_prereq_groups()
            .into_iter()
            .filter(|group| !group.iter().any(|id| taken.contains(id)))
            .map(|group| group.iter().map(|id| catalog.code_of(id)).collect())
            .collect();
        PrereqCheck { missing_groups }
    }

    /// Placed courses that would no longer follow `moving` if it went to
    /// `new_slot` (`None` meaning it leaves the grid).
    pub fn blocking_dependents(
        &self,
        plan: &PlanState,
        catalog: &Catalog,
        moving: &CourseId,
        new_slot: Option<SlotId>,
    ) -> Vec<BlockingDependent> {
        plan.placed()
            .filter(|(_, id)| *id != moving)
            .filter_map(|(slot, id)| catalog.course(id).map(|course| (slot, course)))
            .filter(|(_, course)| course.depends_on(moving))
            .filter(|(slot, _)| match new_slot {
                None => true,
                Some(new_slot) => slot.quarter_number() <= new_slot.quarter_number(),
            })
            .map(|(slot, course)| BlockingDependent {
                course: course.id.clone(),
                code: course.code.clone(),
                slot,
            })
            .collect()
    }

    pub fn check_placement(
        &self,
        plan: &PlanState,
        catalog: &Catalog,
        target: SlotId,
        course: &Course,
    ) -> PlacementCheck {
        PlacementCheck {
            unit_cap: self.check_unit_cap(plan, catalog, target, course),
            prerequisites: self.check_prerequisites(plan, catalog, target, course),
            blocking_dependents: self.blocking_dependents(plan, catalog, &course.id, Some(target)),
        }
    }
}

/// Completed-before-plan courses plus everything in strictly earlier
/// quarters, never including `excluding`.
pub fn taken_before<'a>(
    plan: &'a PlanState,
    target: SlotId,
    excluding: &CourseId,
) -> BTreeSet<&'a CourseId> {
    plan.completed()
        .iter()
        .chain(
            plan.placed()
                .filter(|(slot, _)| slot.quarter_number() < target.quarter_number())
                .map(|(_, id)| id),
        )
        .filter(|id| *id != excluding)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Location;

    fn catalog() -> Catalog {
        let json = r#"{"availableClasses": [
            {"id": "A", "code": "A 1", "units": 4},
            {"id": "B", "code": "B 1", "units": 4},
            {"id": "Y", "code": "Y 1", "units": 4, "prereqGroups": [["A", "B"]]},
            {"id": "Z", "code": "Z 1", "units": 4, "prereqGroups": [["Y"], ["Z"]]},
            {"id": "BIG", "code": "BIG 1", "units": 20}
        ]}"#;
        Catalog::from_json("TEST", json).unwrap()
    }

    fn put(plan: &mut PlanState, id: &str, year: u8, quarter: u8) {
        let id = CourseId::from(id);
        plan.detach(&id);
        plan.append_to_slot(SlotId::new(year, quarter).unwrap(), id);
    }

    fn course<'a>(catalog: &'a Catalog, id: &str) -> &'a Course {
        catalog.course(&CourseId::from(id)).unwrap()
    }

    #[test]
    fn test_unit_cap() {
        let catalog = catalog();
        let mut plan = PlanState::new(&catalog);
        put(&mut plan, "BIG", 1, 1);
        let validator = PlacementValidator::default();
        let target = SlotId::new(1, 1).unwrap();

        let check = validator.check_unit_cap(&plan, &catalog, target, course(&catalog, "A"));
        assert_eq!(check.current, 20);
        assert!(!check.passes());

        let roomy = PlacementValidator::new(24);
        assert!(roomy
            .check_unit_cap(&plan, &catalog, target, course(&catalog, "A"))
            .passes());
    }

    #[test]
    fn test_unit_cap_overflow_fails() {
        let check = UnitCapCheck {
            current: 4,
            adding: u32::MAX,
            cap: DEFAULT_UNIT_CAP,
        };
        assert!(!check.passes());
    }

    #[test]
    fn test_prerequisites_need_strictly_earlier_quarter() {
        let catalog = catalog();
        let mut plan = PlanState::new(&catalog);
        let validator = PlacementValidator::default();
        let y = course(&catalog, "Y");

        let check = validator.check_prerequisites(&plan, &catalog, SlotId::new(1, 2).unwrap(), y);
        assert_eq!(check.missing_groups, vec![vec!["A 1".to_string(), "B 1".to_string()]]);

        put(&mut plan, "B", 1, 2);
        let same_quarter = validator.check_prerequisites(&plan, &catalog, SlotId::new(1, 2).unwrap(), y);
        assert!(!same_quarter.satisfied());
        let later = validator.check_prerequisites(&plan, &catalog, SlotId::new(1, 3).unwrap(), y);
        assert!(later.satisfied());
    }

    #[test]
    fn test_completed_courses_count_as_quarter_zero() {
        let catalog = catalog();
        let mut plan = PlanState::new(&catalog);
        let a = CourseId::from("A");
        plan.detach(&a);
        plan.insert_completed(a);
        let validator = PlacementValidator::default();
        let check = validator.check_prerequisites(
            &plan,
            &catalog,
            SlotId::new(1, 1).unwrap(),
            course(&catalog, "Y"),
        );
        assert!(check.satisfied());
    }

    #[test]
    fn test_self_reference_is_ignored() {
        let catalog = catalog();
        let mut plan = PlanState::new(&catalog);
        put(&mut plan, "A", 1, 1);
        put(&mut plan, "Y", 1, 2);
        let validator = PlacementValidator::default();
        let check = validator.check_prerequisites(
            &plan,
            &catalog,
            SlotId::new(1, 3).unwrap(),
            course(&catalog, "Z"),
        );
        assert!(check.satisfied());
    }

    #[test]
    fn test_blocking_dependents() {
        let catalog = catalog();
        let mut plan = PlanState::new(&catalog);
        put(&mut plan, "A", 1, 1);
        put(&mut plan, "Y", 1, 3);
        let validator = PlacementValidator::default();
        let a = CourseId::from("A");

        assert!(validator
            .blocking_dependents(&plan, &catalog, &a, SlotId::new(1, 2))
            .is_empty());
        let blockers = validator.blocking_dependents(&plan, &catalog, &a, SlotId::new(1, 3));
        assert_eq!(blockers.len(), 1);
        assert_eq!(blockers[0].code, "Y 1");
        assert_eq!(validator.blocking_dependents(&plan, &catalog, &a, None).len(), 1);
    }

    #[test]
    fn test_validation_is_pure() {
        let catalog = catalog();
        let mut plan = PlanState::new(&catalog);
        put(&mut plan, "A", 1, 1);
        let before = plan.clone();
        let validator = PlacementValidator::default();
        let y = course(&catalog, "Y");
        let target = SlotId::new(2, 1).unwrap();

        let first = validator.check_placement(&plan, &catalog, target, y);
        let second = validator.check_placement(&plan, &catalog, target, y);
        assert_eq!(first, second);
        assert!(first.allowed());
        assert_eq!(plan, before);
        assert_eq!(plan.location_of(&y.id), Some(Location::Pool));
    }
}
