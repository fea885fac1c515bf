//! Error types for the pipeline engine.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Non-zero exit from the environment manager; `stderr` is the
    /// manager's raw diagnostic output, surfaced unmodified.
    #[error("ERROR: conda exited with status {status}:\n{stderr}")]
    EnvManager { status: i32, stderr: String },

    #[error("ERROR: malformed model identifier '{0}'")]
    MalformedModel(String),

    #[error("ERROR: required tools not installed in any environment: {0:?}")]
    MissingTools(Vec<String>),

    #[error("ERROR: '{0}' is not a valid read folder location")]
    InvalidReadsDir(PathBuf),

    #[error("ERROR: configuration value '{0}' must be positive")]
    InvalidParam(&'static str),

    #[error("ERROR: step '{step}' failed in {folder}:\n{stderr}")]
    StepFailed {
        step: String,
        folder: PathBuf,
        stderr: String,
    },

    #[error("ERROR: I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("ERROR: could not parse config file: {0}")]
    Config(#[from] toml::de::Error),
}
