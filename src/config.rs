// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use dotenvy::dotenv;
use globset::Glob;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub acquisition: AcquisitionConfig,
    pub discovery: DiscoveryConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    /// Parent directory for cloned workspaces. Each clone gets its own child.
    pub scratch_root: PathBuf,
    pub git_binary: String,
    pub default_depth: u32,
    pub default_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    pub extensions: Vec<String>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    pub max_file_size_mb: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub parallel_workers: usize,
    pub show_progress: bool,
    /// Coloured progress bars. `--color false` on the command line wins.
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_color() -> bool {
    true
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(
                config::File::from(Path::new("config/default.toml")).required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DOCGEN")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            acquisition: AcquisitionConfig {
                scratch_root: PathBuf::from("./runtime"),
                git_binary: "git".to_string(),
                default_depth: 1,
                default_timeout_secs: 120,
            },
            discovery: DiscoveryConfig {
                extensions: vec!["py".to_string()],
                exclude_patterns: vec![],
                max_file_size_mb: 10,
            },
            pipeline: PipelineConfig {
                parallel_workers: 4,
                show_progress: false,
                color: true,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.parallel_workers == 0 {
            return Err(PipelineError::Config(
                "parallel_workers must be greater than 0".to_string(),
            ));
        }

        if self.acquisition.default_depth == 0 {
            return Err(PipelineError::Config(
                "default_depth must be greater than 0".to_string(),
            ));
        }

        if self.acquisition.default_timeout_secs == 0 {
            return Err(PipelineError::Config(
                "default_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.discovery.extensions.is_empty() {
            return Err(PipelineError::Config(
                "at least one source extension is required".to_string(),
            ));
        }

        for pattern in &self.discovery.exclude_patterns {
            Glob::new(pattern).map_err(|e| {
                PipelineError::Config(format!("invalid exclude pattern {}: {}", pattern, e))
            })?;
        }

        Ok(())
    }
}
