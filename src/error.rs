use thiserror::Error;

/// Unified application error type to simplify bubbling errors through async flows.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Errored while handling a file. {0}")]
    Io(#[from] std::io::Error),
    #[error("Error from git. {0}")]
    Git(#[from] git2::Error),
    #[error("Error serializing json. {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Error parsing the profile at `{path}`. {source}")]
    Profile {
        path: String,
        source: serde_json::Error,
    },
    #[error("Error formatting a timestamp. {0}")]
    TimeFormat(#[from] time::error::Format),
    #[error("Date or time component out of range. {0}")]
    TimeRange(#[from] time::error::ComponentRange),
    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: time::Date, end: time::Date },
    #[error("Invalid configuration. {0}")]
    InvalidConfig(String),
    #[error("{0}")]
    Other(String),
}

impl From<serde_path_to_error::Error<serde_json::Error>> for AppError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        AppError::Profile {
            path: err.path().to_string(),
            source: err.into_inner(),
        }
    }
}

/// Convenience alias for results that bubble `AppError`.
pub type AppResult<T> = Result<T, AppError>;
