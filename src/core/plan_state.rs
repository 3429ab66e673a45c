use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::catalog::Catalog;
use crate::domain::model::{CourseId, Location, SlotId, SLOT_COUNT};
use crate::domain::payload::{
    ClassSummary, MajorRef, PlanClass, SavedPlan, SavedQuarter, StoredPlan,
};

/// The plan grid: sixteen slots, the unplaced pool, and the quarter-0 set.
///
/// A catalog course lives in exactly one of those places. Mutators are
/// crate-private so every change goes through the move engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanState {
    slots: Vec<Vec<CourseId>>,
    pool: Vec<CourseId>,
    completed: BTreeSet<CourseId>,
}

/// Entries of a saved plan that could not be placed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HydrationReport {
    pub unknown_courses: Vec<CourseId>,
    pub duplicates: Vec<CourseId>,
    pub over_unit_cap: Vec<CourseId>,
    pub invalid_quarters: Vec<u32>,
}

impl HydrationReport {
    pub fn is_clean(&self) -> bool {
        self.unknown_courses.is_empty()
            && self.duplicates.is_empty()
            && self.over_unit_cap.is_empty()
            && self.invalid_quarters.is_empty()
    }
}

impl PlanState {
    /// Empty grid with every catalog course in the pool.
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            slots: vec![Vec::new(); SLOT_COUNT],
            pool: catalog.courses().iter().map(|c| c.id.clone()).collect(),
            completed: BTreeSet::new(),
        }
    }

    /// Rebuilds a plan from its persisted form. All sixteen slots exist before
    /// anything is placed; quarter number 0 is read as completed-before-plan.
    pub fn hydrate(catalog: &Catalog, stored: &StoredPlan, unit_cap: u32) -> (Self, HydrationReport) {
        let mut state = Self {
            slots: vec![Vec::new(); SLOT_COUNT],
            pool: Vec::new(),
            completed: BTreeSet::new(),
        };
        let mut report = HydrationReport::default();
        let mut seen: BTreeSet<CourseId> = BTreeSet::new();

        for id in &stored.completed_class_ids {
            if !catalog.contains(id) {
                report.unknown_courses.push(id.clone());
            } else if !seen.insert(id.clone()) {
                report.duplicates.push(id.clone());
            } else {
                state.completed.insert(id.clone());
            }
        }

        let mut quarters: Vec<&SavedQuarter> = stored.plan.quarters.iter().collect();
        quarters.sort_by_key(|q| q.quarter_number);

        for quarter in quarters {
            let slot = match quarter.quarter_number {
                0 => None,
                n => match SlotId::from_quarter_number(n) {
                    Some(slot) => Some(slot),
                    None => {
                        report.invalid_quarters.push(n);
                        continue;
                    }
                },
            };

            for entry in &quarter.plan_classes {
                let id = &entry.class.id;
                let Some(course) = catalog.course(id) else {
                    report.unknown_courses.push(id.clone());
                    continue;
                };
                if seen.contains(id) {
                    report.duplicates.push(id.clone());
                    continue;
                }
                match slot {
                    None => {
                        state.completed.insert(id.clone());
                    }
                    Some(slot) => {
                        let fits = state
                            .slot_units(catalog, slot)
                            .checked_add(course.units)
                            .is_some_and(|units| units <= unit_cap);
                        if !fits {
                            report.over_unit_cap.push(id.clone());
                            continue;
                        }
                        state.slots[slot.index()].push(id.clone());
                    }
                }
                seen.insert(id.clone());
            }
        }

        state.pool = catalog
            .courses()
            .iter()
            .filter(|c| !seen.contains(&c.id))
            .map(|c| c.id.clone())
            .collect();

        (state, report)
    }

    /// Only quarters holding at least one course are emitted.
    pub fn to_saved_plan(&self, catalog: &Catalog, id: &str, name: &str) -> SavedPlan {
        let quarters = SlotId::all()
            .filter(|slot| !self.slot(*slot).is_empty())
            .map(|slot| SavedQuarter {
                quarter_number: slot.quarter_number(),
                plan_classes: self
                    .slot(slot)
                    .iter()
                    .filter_map(|course_id| catalog.course(course_id))
                    .map(|course| PlanClass {
                        class: ClassSummary {
                            id: course.id.clone(),
                            code: course.code.clone(),
                            units: course.units,
                            description: course.description.clone(),
                        },
                    })
                    .collect(),
            })
            .collect();

        SavedPlan {
            id: id.to_string(),
            name: name.to_string(),
            major: MajorRef {
                name: catalog.major().to_string(),
            },
            quarters,
        }
    }

    pub fn to_stored_plan(&self, catalog: &Catalog, id: &str, name: &str) -> StoredPlan {
        StoredPlan {
            plan: self.to_saved_plan(catalog, id, name),
            completed_class_ids: self.completed.iter().cloned().collect(),
        }
    }

    pub fn slot(&self, slot: SlotId) -> &[CourseId] {
        &self.slots[slot.index()]
    }

    pub fn pool(&self) -> &[CourseId] {
        &self.pool
    }

    pub fn completed(&self) -> &BTreeSet<CourseId> {
        &self.completed
    }

    pub fn is_completed(&self, id: &CourseId) -> bool {
        self.completed.contains(id)
    }

    /// `None` for completed-before-plan courses and ids the plan never saw.
    pub fn location_of(&self, id: &CourseId) -> Option<Location> {
        if self.pool.contains(id) {
            return Some(Location::Pool);
        }
        SlotId::all()
            .find(|slot| self.slot(*slot).contains(id))
            .map(Location::Slot)
    }

    pub fn placed(&self) -> impl Iterator<Item = (SlotId, &CourseId)> {
        SlotId::all().flat_map(move |slot| self.slot(slot).iter().map(move |id| (slot, id)))
    }

    pub fn slot_units(&self, catalog: &Catalog, slot: SlotId) -> u32 {
        self.slot(slot)
            .iter()
            .filter_map(|id| catalog.course(id))
            .fold(0u32, |units, c| units.saturating_add(c.units))
    }

    pub fn total_units(&self, catalog: &Catalog) -> u32 {
        SlotId::all().fold(0u32, |units, slot| {
            units.saturating_add(self.slot_units(catalog, slot))
        })
    }

    /// Completed courses in id order, then slots in grid order, then
    /// within-slot order.
    pub fn ordered_courses(&self) -> Vec<CourseId> {
        self.completed
            .iter()
            .cloned()
            .chain(self.placed().map(|(_, id)| id.clone()))
            .collect()
    }

    /// True when every catalog course sits in exactly one place and nothing
    /// outside the catalog is held.
    pub fn is_consistent(&self, catalog: &Catalog) -> bool {
        let mut seen = BTreeSet::new();
        let all = self
            .pool
            .iter()
            .chain(self.completed.iter())
            .chain(self.slots.iter().flatten());
        for id in all {
            if !catalog.contains(id) || !seen.insert(id) {
                return false;
            }
        }
        seen.len() == catalog.courses().len()
    }

    /// Takes a course out of the pool or its slot.
    pub(crate) fn detach(&mut self, id: &CourseId) -> Option<Location> {
        if let Some(pos) = self.pool.iter().position(|c| c == id) {
            self.pool.remove(pos);
            return Some(Location::Pool);
        }
        for slot in SlotId::all() {
            let courses = &mut self.slots[slot.index()];
            if let Some(pos) = courses.iter().position(|c| c == id) {
                courses.remove(pos);
                return Some(Location::Slot(slot));
            }
        }
        None
    }

    pub(crate) fn append_to_slot(&mut self, slot: SlotId, id: CourseId) {
        self.slots[slot.index()].push(id);
    }

    /// Re-inserts into the pool at the course's catalog position.
    pub(crate) fn return_to_pool(&mut self, catalog: &Catalog, id: CourseId) {
        let rank = catalog.position(&id).unwrap_or(usize::MAX);
        let at = self
            .pool
            .iter()
            .position(|c| catalog.position(c).unwrap_or(usize::MAX) > rank)
            .unwrap_or(self.pool.len());
        self.pool.insert(at, id);
    }

    /// Moves `id` to the position currently held by `over` in the same slot.
    pub(crate) fn reorder(&mut self, slot: SlotId, id: &CourseId, over: &CourseId) -> bool {
        let courses = &mut self.slots[slot.index()];
        let (Some(from), Some(to)) = (
            courses.iter().position(|c| c == id),
            courses.iter().position(|c| c == over),
        ) else {
            return false;
        };
        if from == to {
            return false;
        }
        let moving = courses.remove(from);
        courses.insert(to, moving);
        true
    }

    pub(crate) fn insert_completed(&mut self, id: CourseId) {
        self.completed.insert(id);
    }

    pub(crate) fn remove_completed(&mut self, id: &CourseId) -> bool {
        self.completed.remove(id)
    }

    pub(crate) fn reset(&mut self, catalog: &Catalog) {
        *self = Self::new(catalog);
    }
}
