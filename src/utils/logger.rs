use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

fn filter_for(level: Option<&str>, verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("course_planner=debug,info")
        } else {
            EnvFilter::new(format!("course_planner={}", level.unwrap_or("info")))
        }
    })
}

pub fn init_cli_logger(verbose: bool) {
    init_logger(None, LogFormat::Compact, verbose);
}

/// Installs the global subscriber. A second call is ignored.
pub fn init_logger(level: Option<&str>, format: LogFormat, verbose: bool) {
    let filter = filter_for(level, verbose);

    let result = match format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .json(),
            )
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Logger already initialized");
    }
}
