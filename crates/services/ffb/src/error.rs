use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::error::Error),

    #[error(transparent)]
    Config(#[from] ff_config::error::Error),

    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    #[error("Source file {0:?} does not exist")]
    SourceNotFound(PathBuf),

    #[error("No source file matches `{0}`")]
    NoSourcesMatched(String),

    #[error("Unsupported source pattern `{0}`, wildcards are only allowed in the file name")]
    UnsupportedPattern(String),

    #[error("Failed to join runner task {0}")]
    ThreadJoin(#[from] tokio::task::JoinError),
}
