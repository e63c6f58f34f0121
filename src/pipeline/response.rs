// file: src/pipeline/response.rs
// description: caller-facing request and response payloads for a pipeline run
// reference: https://docs.rs/schemars

use crate::error::PipelineError;
use crate::models::{SourceUnit, Summary, UndocumentedItem};
use crate::repository::Origin;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One summarization request. A usable `local_path` takes precedence over
/// `repo_url`; omitted limits fall back to configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PipelineRequest {
    /// Existing directory to analyse in place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,

    /// Remote repository to shallow-clone when no local path is usable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,

    /// Clone depth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1))]
    pub depth: Option<u32>,

    /// Clone timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1))]
    pub timeout: Option<u64>,

    /// Extra glob patterns, relative to the repository root, to skip.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_patterns: Vec<String>,

    /// Abort parsing once this many seconds have passed since the run began.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1))]
    pub deadline_secs: Option<u64>,
}

impl PipelineRequest {
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            local_path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            repo_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn schema() -> schemars::Schema {
        schemars::schema_for!(PipelineRequest)
    }
}

/// Outcome of a run that reached `Done`.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub mode: Origin,
    pub target_dir: PathBuf,
    pub summary: Summary,
    pub undocumented: Vec<UndocumentedItem>,
    #[serde(skip)]
    pub units: Vec<SourceUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineResponse {
    Completed(PipelineReport),
    Failed { kind: String, message: String },
}

impl PipelineResponse {
    pub fn from_result(result: Result<PipelineReport, PipelineError>) -> Self {
        match result {
            Ok(report) => PipelineResponse::Completed(report),
            Err(e) => PipelineResponse::Failed {
                kind: e.kind().to_string(),
                message: e.to_string(),
            },
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineResponse::Completed(_))
    }
}
