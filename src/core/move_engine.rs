//! Drag-and-drop state machine over the plan grid.
//!
//! ```text
//! Idle -> Dragging(course, source) -> Idle
//! ```
//!
//! A drag-end event is first classified into one [`Transition`] and only then
//! applied, so every branch validates before it touches the plan.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::catalog::Catalog;
use crate::core::plan_state::PlanState;
use crate::core::progress::{self, ProgressReport};
use crate::core::validator::{
    BlockingDependent, PlacementCheck, PlacementValidator, UnitCapCheck,
};
use crate::domain::model::{CourseId, Location, SlotId, DEFAULT_UNIT_CAP};

static SLOT_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:y|year-?)([1-4])[-_ ]?(?:q|quarter-?)([1-4])$")
        .unwrap_or_else(|e| panic!("slot target pattern is invalid: {e}"))
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependentsPolicy {
    /// Report blocking dependents but apply the move.
    #[default]
    Warn,
    /// Reject later-moves that would leave a dependent at or before the course.
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub unit_cap: u32,
    pub dependents: DependentsPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            unit_cap: DEFAULT_UNIT_CAP,
            dependents: DependentsPolicy::Warn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    Idle,
    Dragging { course: CourseId, source: Location },
}

/// What the pointer was over when the drag ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DropTarget {
    Pool,
    Slot(SlotId),
    Course(CourseId),
}

impl FromStr for DropTarget {
    type Err = std::convert::Infallible;

    /// `pool`/`unplaced`, `Y2Q3`/`year-2-quarter-3`, anything else is a
    /// course id.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("pool") || trimmed.eq_ignore_ascii_case("unplaced") {
            return Ok(DropTarget::Pool);
        }
        if let Some(caps) = SLOT_TARGET.captures(trimmed) {
            let year = caps[1].parse::<u8>().ok();
            let quarter = caps[2].parse::<u8>().ok();
            if let Some(slot) = year.zip(quarter).and_then(|(y, q)| SlotId::new(y, q)) {
                return Ok(DropTarget::Slot(slot));
            }
        }
        Ok(DropTarget::Course(CourseId::from(trimmed)))
    }
}

impl fmt::Display for DropTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropTarget::Pool => f.write_str("pool"),
            DropTarget::Slot(slot) => write!(f, "{}", slot),
            DropTarget::Course(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragEnd {
    pub active: CourseId,
    pub over: Option<DropTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoopReason {
    UnknownCourse,
    CourseCompleted,
    StaleTarget,
    AlreadyInPool,
    SameSlot,
    /// Drag end without a matching drag start.
    NotDragging,
    /// Drag end for a different course than the one being dragged.
    ActiveMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    UnitCap(UnitCapCheck),
    Prerequisites { missing_groups: Vec<Vec<String>> },
    DependentsBroken { blocking: Vec<BlockingDependent> },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnitCap(check) => write!(
                f,
                "unit cap exceeded ({} + {} > {})",
                check.current, check.adding, check.cap
            ),
            Rejection::Prerequisites { missing_groups } => {
                let groups: Vec<String> = missing_groups.iter().map(|g| g.join(" or ")).collect();
                write!(f, "missing prerequisites: {}", groups.join("; "))
            }
            Rejection::DependentsBroken { blocking } => {
                let codes: Vec<&str> = blocking.iter().map(|d| d.code.as_str()).collect();
                write!(f, "would break prerequisites of {}", codes.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    Cancelled,
    Noop {
        reason: NoopReason,
    },
    ReturnedToPool {
        course: CourseId,
        from: SlotId,
        blocking_dependents: Vec<BlockingDependent>,
    },
    Reordered {
        course: CourseId,
        slot: SlotId,
        blocking_dependents: Vec<BlockingDependent>,
    },
    Placed {
        course: CourseId,
        from: Location,
        to: SlotId,
        blocking_dependents: Vec<BlockingDependent>,
    },
    Rejected {
        course: CourseId,
        to: SlotId,
        rejection: Rejection,
    },
}

impl MoveOutcome {
    pub fn applied(&self) -> bool {
        matches!(
            self,
            MoveOutcome::ReturnedToPool { .. } | MoveOutcome::Reordered { .. } | MoveOutcome::Placed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Transition {
    Cancel,
    Ignore(NoopReason),
    ReturnToPool { from: SlotId },
    Reorder { slot: SlotId, over: CourseId },
    SlotToSlot { from: SlotId, to: SlotId },
    PoolToSlot { to: SlotId },
}

/// Owns the plan and applies validated moves to it.
#[derive(Debug, Clone)]
pub struct MoveEngine {
    catalog: Arc<Catalog>,
    plan: PlanState,
    validator: PlacementValidator,
    dependents: DependentsPolicy,
    state: DragState,
}

impl MoveEngine {
    pub fn new(catalog: Arc<Catalog>, plan: PlanState, settings: EngineSettings) -> Self {
        Self {
            catalog,
            plan,
            validator: PlacementValidator::new(settings.unit_cap),
            dependents: settings.dependents,
            state: DragState::Idle,
        }
    }

    pub fn empty(catalog: Arc<Catalog>, settings: EngineSettings) -> Self {
        let plan = PlanState::new(&catalog);
        Self::new(catalog, plan, settings)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn plan(&self) -> &PlanState {
        &self.plan
    }

    pub fn into_plan(self) -> PlanState {
        self.plan
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn validator(&self) -> &PlacementValidator {
        &self.validator
    }

    pub fn progress(&self) -> ProgressReport {
        progress::compute(&self.catalog, &self.plan)
    }

    /// Placement report for `course` in `target` without moving anything.
    pub fn check(&self, course: &CourseId, target: SlotId) -> Option<PlacementCheck> {
        let course = self.catalog.course(course)?;
        Some(
            self.validator
                .check_placement(&self.plan, &self.catalog, target, course),
        )
    }

    /// Returns false when the course is not draggable (unknown or completed).
    pub fn drag_start(&mut self, course: &CourseId) -> bool {
        match self.plan.location_of(course) {
            Some(source) => {
                self.state = DragState::Dragging {
                    course: course.clone(),
                    source,
                };
                true
            }
            None => {
                self.state = DragState::Idle;
                false
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Classifies against the source recorded by `drag_start`. An event for
    /// any other course, or one arriving while idle, changes nothing.
    pub fn drag_end(&mut self, event: DragEnd) -> MoveOutcome {
        let transition = match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Idle => Transition::Ignore(NoopReason::NotDragging),
            DragState::Dragging { course, .. } if course != event.active => {
                Transition::Ignore(NoopReason::ActiveMismatch)
            }
            DragState::Dragging { source, .. } => self.classify(&event, source),
        };
        tracing::debug!(course = %event.active, ?transition, "drag end");
        self.apply(event.active, transition)
    }

    /// `drag_start` followed by `drag_end`.
    pub fn move_course(&mut self, course: &CourseId, over: Option<DropTarget>) -> MoveOutcome {
        if !self.drag_start(course) {
            let reason = if self.plan.is_completed(course) {
                NoopReason::CourseCompleted
            } else {
                NoopReason::UnknownCourse
            };
            return MoveOutcome::Noop { reason };
        }
        self.drag_end(DragEnd {
            active: course.clone(),
            over,
        })
    }

    fn classify(&self, event: &DragEnd, source: Location) -> Transition {
        let Some(over) = &event.over else {
            return Transition::Cancel;
        };

        let (target, hovered) = match over {
            DropTarget::Pool => (Location::Pool, None),
            DropTarget::Slot(slot) => (Location::Slot(*slot), None),
            DropTarget::Course(id) => match self.plan.location_of(id) {
                Some(location) => (location, Some(id.clone())),
                None => return Transition::Ignore(NoopReason::StaleTarget),
            },
        };

        match (source, target) {
            (Location::Slot(from), Location::Pool) => Transition::ReturnToPool { from },
            (Location::Pool, Location::Pool) => Transition::Ignore(NoopReason::AlreadyInPool),
            (Location::Slot(from), Location::Slot(to)) if from == to => match hovered {
                Some(over) if over != event.active => Transition::Reorder { slot: from, over },
                _ => Transition::Ignore(NoopReason::SameSlot),
            },
            (Location::Slot(from), Location::Slot(to)) => Transition::SlotToSlot { from, to },
            (Location::Pool, Location::Slot(to)) => Transition::PoolToSlot { to },
        }
    }

    fn apply(&mut self, course: CourseId, transition: Transition) -> MoveOutcome {
        match transition {
            Transition::Cancel => MoveOutcome::Cancelled,
            Transition::Ignore(reason) => MoveOutcome::Noop { reason },
            Transition::ReturnToPool { from } => {
                let blocking_dependents =
                    self.validator
                        .blocking_dependents(&self.plan, &self.catalog, &course, None);
                if !blocking_dependents.is_empty() {
                    tracing::debug!(
                        "Returning {} leaves {} dependent(s) without it",
                        course,
                        blocking_dependents.len()
                    );
                }
                self.plan.detach(&course);
                self.plan.return_to_pool(&self.catalog, course.clone());
                MoveOutcome::ReturnedToPool {
                    course,
                    from,
                    blocking_dependents,
                }
            }
            Transition::Reorder { slot, over } => {
                // Advisory only: a dependent sharing the slot already lacks
                // the course strictly earlier.
                let blocking_dependents =
                    self.validator
                        .blocking_dependents(&self.plan, &self.catalog, &course, Some(slot));
                if self.plan.reorder(slot, &course, &over) {
                    MoveOutcome::Reordered {
                        course,
                        slot,
                        blocking_dependents,
                    }
                } else {
                    MoveOutcome::Noop {
                        reason: NoopReason::SameSlot,
                    }
                }
            }
            Transition::SlotToSlot { from, to } => {
                self.place(course, Location::Slot(from), to)
            }
            Transition::PoolToSlot { to } => self.place(course, Location::Pool, to),
        }
    }

    fn place(&mut self, course_id: CourseId, from: Location, to: SlotId) -> MoveOutcome {
        let Some(course) = self.catalog.course(&course_id) else {
            return MoveOutcome::Noop {
                reason: NoopReason::UnknownCourse,
            };
        };

        let unit_cap = self
            .validator
            .check_unit_cap(&self.plan, &self.catalog, to, course);
        if !unit_cap.passes() {
            return MoveOutcome::Rejected {
                course: course_id,
                to,
                rejection: Rejection::UnitCap(unit_cap),
            };
        }

        let prerequisites = self
            .validator
            .check_prerequisites(&self.plan, &self.catalog, to, course);
        if !prerequisites.satisfied() {
            return MoveOutcome::Rejected {
                course: course_id,
                to,
                rejection: Rejection::Prerequisites {
                    missing_groups: prerequisites.missing_groups,
                },
            };
        }

        let moving_later = matches!(from, Location::Slot(f) if to.quarter_number() > f.quarter_number());
        let blocking_dependents = if moving_later {
            self.validator
                .blocking_dependents(&self.plan, &self.catalog, &course_id, Some(to))
        } else {
            Vec::new()
        };
        if self.dependents == DependentsPolicy::Block && !blocking_dependents.is_empty() {
            return MoveOutcome::Rejected {
                course: course_id,
                to,
                rejection: Rejection::DependentsBroken {
                    blocking: blocking_dependents,
                },
            };
        }

        self.plan.detach(&course_id);
        self.plan.append_to_slot(to, course_id.clone());
        MoveOutcome::Placed {
            course: course_id,
            from,
            to,
            blocking_dependents,
        }
    }

    /// Moves a pooled or placed course into the completed-before-plan set.
    pub fn mark_completed(&mut self, course: &CourseId) -> bool {
        if self.plan.detach(course).is_none() {
            return false;
        }
        self.plan.insert_completed(course.clone());
        self.state = DragState::Idle;
        true
    }

    /// Returns a completed course to the pool, reporting placed courses that
    /// relied on it. `None` if the course was not completed.
    pub fn unmark_completed(&mut self, course: &CourseId) -> Option<Vec<BlockingDependent>> {
        if !self.plan.remove_completed(course) {
            return None;
        }
        let blocking = self
            .validator
            .blocking_dependents(&self.plan, &self.catalog, course, None);
        self.plan.return_to_pool(&self.catalog, course.clone());
        self.state = DragState::Idle;
        Some(blocking)
    }

    pub fn reset(&mut self) {
        self.plan.reset(&self.catalog);
        self.state = DragState::Idle;
    }

    /// A new major brings a new catalog and an empty plan.
    pub fn replace_catalog(&mut self, catalog: Arc<Catalog>) {
        self.catalog = catalog;
        self.reset();
    }
}
