use clap::{Parser, Subcommand};

use crate::config::toml_config::PlannerConfig;
use crate::core::move_engine::DependentsPolicy;
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, Validate};

#[derive(Debug, Clone, Parser)]
#[command(name = "course-planner")]
#[command(about = "Plan courses across a four-year quarter grid and track degree progress")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "planner.toml")]
    pub config: String,

    /// Overrides storage.data_dir
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Overrides plan.unit_cap
    #[arg(long)]
    pub unit_cap: Option<u32>,

    /// Reject later-moves that break a dependent course
    #[arg(long)]
    pub block_dependents: bool,

    #[arg(long)]
    pub major: String,

    #[arg(long, default_value = "default")]
    pub plan: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print requirement progress for the plan
    Progress {
        #[arg(long)]
        json: bool,
    },
    /// Report whether a course could go into a quarter, without moving it
    Check {
        course: String,
        /// Target quarter, e.g. Y2Q3
        target: String,
    },
    /// Drop a course onto a quarter, the pool, or another course
    Move {
        course: String,
        /// Y2Q3, pool, or a course id
        target: String,
    },
    /// Mark a course as completed before the plan starts
    Complete { course: String },
    /// Return a completed course to the pool
    Uncomplete { course: String },
    /// Clear every placement
    Reset,
}

impl CliConfig {
    /// File config with command-line overrides applied.
    pub fn resolve(&self) -> Result<PlannerConfig> {
        let mut config = PlannerConfig::load_or_default(&self.config)?;
        if let Some(dir) = &self.data_dir {
            config.storage.data_dir = dir.clone();
        }
        if let Some(cap) = self.unit_cap {
            config.plan.unit_cap = cap;
        }
        if self.block_dependents {
            config.plan.dependents = DependentsPolicy::Block;
        }
        config.validate()?;
        Ok(config)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("major", &self.major)?;
        validate_non_empty_string("plan", &self.plan)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move_command() {
        let cli = CliConfig::try_parse_from([
            "course-planner",
            "--major",
            "CS26",
            "--unit-cap",
            "18",
            "move",
            "CSE12",
            "Y1Q2",
        ])
        .unwrap();
        assert_eq!(cli.plan, "default");
        assert!(matches!(cli.command, Command::Move { ref target, .. } if target == "Y1Q2"));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_overrides_apply_over_defaults() {
        let cli = CliConfig::try_parse_from([
            "course-planner",
            "--config",
            "/definitely/not/here.toml",
            "--major",
            "CS26",
            "--data-dir",
            "/tmp/plans",
            "--block-dependents",
            "reset",
        ])
        .unwrap();
        let config = cli.resolve().unwrap();
        assert_eq!(config.storage.data_dir, "/tmp/plans");
        assert_eq!(config.plan.dependents, DependentsPolicy::Block);
        assert_eq!(config.plan.unit_cap, 21);
    }
}
