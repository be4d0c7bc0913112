use std::path::PathBuf;

/// Errors produced by the scanning pipeline.
///
/// Configuration errors (missing inputs, missing preconditions) are detected
/// before any processing starts and map to a distinct exit code; everything
/// else is a runtime failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("target path not found: {0}")]
    TargetNotFound(PathBuf),

    #[error("CSV file not found: {0}")]
    CsvNotFound(PathBuf),

    #[error("inventory CSV not found: {0}")]
    InventoryNotFound(PathBuf),

    #[error("unique packages list not found at {0} - run inventory mode first")]
    UniqueListNotFound(PathBuf),

    #[error("failed to read {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors that are caller mistakes rather than data failures.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::TargetNotFound(_)
                | Error::CsvNotFound(_)
                | Error::InventoryNotFound(_)
                | Error::UniqueListNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
