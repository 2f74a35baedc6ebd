use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeaWatchError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown region preset: {0}")]
    UnknownRegion(String),
}

pub type Result<T> = std::result::Result<T, SeaWatchError>;
