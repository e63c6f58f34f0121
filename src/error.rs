// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures while turning a locator into a workspace. Always fatal to a run.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("git executable not found: {binary}. Install Git and ensure it is in PATH")]
    ExecutableNotFound { binary: String },

    #[error("git clone timed out after {timeout_secs}s")]
    CloneTimeout { timeout_secs: u64 },

    #[error("git clone failed with exit code {exit_code}: {stderr}")]
    CloneFailed { exit_code: i32, stderr: String },

    #[error("local path is not an existing directory: {}", path.display())]
    InvalidLocalPath { path: PathBuf },

    #[error("invalid repository url: {url}")]
    InvalidUrl { url: String },

    #[error("provide either a valid local_path or a repo_url")]
    MissingLocator,

    #[error("scratch directory error at {}: {source}", path.display())]
    ScratchIo {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl AcquisitionError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ExecutableNotFound { .. } => "executable_not_found",
            Self::CloneTimeout { .. } => "clone_timeout",
            Self::CloneFailed { .. } => "clone_failed",
            Self::InvalidLocalPath { .. } => "invalid_local_path",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::MissingLocator => "missing_locator",
            Self::ScratchIo { .. } => "scratch_io",
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error("No source files found under {}", root.display())]
    NoSourceFiles { root: PathBuf },

    #[error("Deadline of {deadline_secs}s exceeded after {parsed} files")]
    DeadlineExceeded { deadline_secs: u64, parsed: usize },

    #[error("Invalid pipeline transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Stable tag for programmatic handling by callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Acquisition(e) => e.kind(),
            Self::NoSourceFiles { .. } => "no_source_files",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::FileOperation { .. } => "file_operation",
            Self::Validation(_) => "validation",
            Self::Task(_) => "task",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}
