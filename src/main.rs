use anyhow::Context;
use clap::Parser;
use course_planner::config::Command;
use course_planner::core::move_engine::MoveOutcome;
use course_planner::domain::model::CourseId;
use course_planner::utils::{logger, validation::Validate};
use course_planner::{CliConfig, DropTarget, LocalStore, PlanSession, PlannerError, ProgressReport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.validate().and_then(|_| cli.resolve()) {
        Ok(config) => config,
        Err(e) => {
            logger::init_cli_logger(cli.verbose);
            tracing::error!("Configuration validation failed: {}", e);
            eprintln!("{}", e.user_friendly_message());
            eprintln!("Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    logger::init_logger(Some(&config.logging.level), config.logging.format, cli.verbose);
    tracing::debug!("CLI config: {:?}", cli);

    let store = LocalStore::new(&config.storage.data_dir);
    let (mut session, report) = match PlanSession::open(
        store.clone(),
        store,
        config.engine_settings(),
        &cli.major,
        &cli.plan,
    )
    .await
    {
        Ok(opened) => opened,
        Err(e) => {
            tracing::error!("Failed to open plan: {}", e);
            eprintln!("{}", e.user_friendly_message());
            eprintln!("Suggestion: {}", e.recovery_suggestion());
            std::process::exit(2);
        }
    };
    if !report.is_clean() {
        println!("Some saved entries were skipped: {}", serde_json::to_string(&report)?);
    }

    match &cli.command {
        Command::Progress { json } => {
            let progress = session.engine().progress();
            if *json {
                println!("{}", serde_json::to_string_pretty(&progress)?);
            } else {
                print_progress(&progress);
            }
        }
        Command::Check { course, target } => {
            let id = resolve_course(&session, course)?;
            let DropTarget::Slot(slot) = target.parse::<DropTarget>()? else {
                anyhow::bail!("'{}' is not a quarter (expected e.g. Y2Q3)", target);
            };
            let check = session
                .engine()
                .check(&id, slot)
                .with_context(|| format!("course {} disappeared from the catalog", id))?;
            println!("{}", serde_json::to_string_pretty(&check)?);
            println!("{}", if check.allowed() { "allowed" } else { "not allowed" });
        }
        Command::Move { course, target } => {
            let id = resolve_course(&session, course)?;
            let over = target.parse::<DropTarget>()?;
            let outcome = session.engine_mut().move_course(&id, Some(over));
            report_outcome(&outcome);
            if outcome.applied() {
                session.save().await.context("saving plan")?;
            }
        }
        Command::Complete { course } => {
            let id = resolve_course(&session, course)?;
            if session.engine_mut().mark_completed(&id) {
                session.save().await.context("saving plan")?;
                println!("{} marked as completed", course);
            } else {
                println!("{} is already completed", course);
            }
        }
        Command::Uncomplete { course } => {
            let id = resolve_course(&session, course)?;
            match session.engine_mut().unmark_completed(&id) {
                Some(blocking) => {
                    session.save().await.context("saving plan")?;
                    println!("{} returned to the pool", course);
                    for dependent in blocking {
                        println!("  warning: {} in {} relied on it", dependent.code, dependent.slot);
                    }
                }
                None => println!("{} was not completed", course),
            }
        }
        Command::Reset => {
            session.reset();
            session.save().await.context("saving plan")?;
            println!("Plan {} reset", session.plan_id());
        }
    }

    Ok(())
}

fn resolve_course(session: &PlanSession<LocalStore, LocalStore>, raw: &str) -> anyhow::Result<CourseId> {
    let course = session
        .engine()
        .catalog()
        .resolve(raw)
        .map(|c| c.id.clone())
        .ok_or_else(|| PlannerError::UnknownCourse {
            course_id: raw.to_string(),
        })?;
    Ok(course)
}

fn report_outcome(outcome: &MoveOutcome) {
    match outcome {
        MoveOutcome::Cancelled => println!("Move cancelled"),
        MoveOutcome::Noop { reason } => println!("Nothing to do ({:?})", reason),
        MoveOutcome::ReturnedToPool {
            course,
            from,
            blocking_dependents,
        } => {
            println!("{} returned to the pool from {}", course, from);
            for dependent in blocking_dependents {
                println!("  warning: {} in {} relied on it", dependent.code, dependent.slot);
            }
        }
        MoveOutcome::Reordered {
            course,
            slot,
            blocking_dependents,
        } => {
            println!("{} reordered within {}", course, slot);
            for dependent in blocking_dependents {
                println!("  warning: {} in {} needs it in an earlier quarter", dependent.code, dependent.slot);
            }
        }
        MoveOutcome::Placed {
            course,
            to,
            blocking_dependents,
            ..
        } => {
            println!("{} placed in {}", course, to);
            for dependent in blocking_dependents {
                println!("  warning: {} in {} now comes too early", dependent.code, dependent.slot);
            }
        }
        MoveOutcome::Rejected {
            course,
            to,
            rejection,
        } => println!("{} cannot go in {}: {}", course, to, rejection),
    }
}

fn print_progress(progress: &ProgressReport) {
    println!("Overall: {:.1}%", progress.percent);
    for category in &progress.categories {
        println!(
            "{:<14} {}/{}",
            category.category.label(),
            category.completed,
            category.total
        );
    }
    for group in &progress.groups {
        println!("\n{} [{}] {}/{}", group.name, group.category, group.completed, group.total);
        for requirement in &group.requirements {
            let courses: Vec<&str> = requirement.assigned.iter().map(|c| c.as_str()).collect();
            println!(
                "  {:<30} {}/{}  {}",
                requirement.name,
                requirement.completed,
                requirement.total,
                courses.join(", ")
            );
        }
    }
    if !progress.unassigned.is_empty() {
        let courses: Vec<&str> = progress.unassigned.iter().map(|c| c.as_str()).collect();
        println!("\nNot counted toward any requirement: {}", courses.join(", "));
    }
}
