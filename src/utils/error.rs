use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Catalog not found for major '{major}'")]
    CatalogNotFound { major: String },

    #[error("Malformed payload: {message}")]
    PayloadError { message: String },

    #[error("Unknown course: {course_id}")]
    UnknownCourse { course_id: String },
}

impl PlannerError {
    pub fn user_friendly_message(&self) -> String {
        match self {
            PlannerError::IoError(e) => format!("Could not access a file: {}", e),
            PlannerError::SerializationError(e) => format!("A data file is not valid JSON: {}", e),
            PlannerError::ConfigError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            PlannerError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            PlannerError::CatalogNotFound { major } => {
                format!("No course catalog is available for '{}'", major)
            }
            PlannerError::PayloadError { message } => format!("Unreadable plan data: {}", message),
            PlannerError::UnknownCourse { course_id } => {
                format!("Course '{}' is not in the catalog", course_id)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PlannerError::IoError(_) => "Check that the data directory exists and is readable",
            PlannerError::SerializationError(_) | PlannerError::PayloadError { .. } => {
                "Re-export the file from the planner or fix the JSON by hand"
            }
            PlannerError::ConfigError { .. }
            | PlannerError::InvalidConfigValueError { .. } => "Review planner.toml",
            PlannerError::CatalogNotFound { .. } => {
                "Place <major>.json under the catalogs/ directory of the data dir"
            }
            PlannerError::UnknownCourse { .. } => "Use a course id or code from the catalog",
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
