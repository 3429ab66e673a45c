pub mod catalog;
pub mod move_engine;
pub mod plan_state;
pub mod progress;
pub mod session;
pub mod validator;

pub use crate::domain::model::{Category, Course, CourseId, Location, Requirement, RequirementGroup, RequirementId, SlotId};
pub use crate::domain::ports::{CatalogSource, PlanStore};
pub use crate::utils::error::Result;
