pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::LocalStore;
pub use config::PlannerConfig;
pub use core::catalog::Catalog;
pub use core::move_engine::{DragEnd, DropTarget, EngineSettings, MoveEngine, MoveOutcome};
pub use core::plan_state::PlanState;
pub use core::progress::ProgressReport;
pub use core::session::PlanSession;
pub use utils::error::{PlannerError, Result};
