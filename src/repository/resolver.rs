// file: src/repository/resolver.rs
// description: resolves a local path or remote url into a workspace
// reference: shallow clone into uniquely named scratch directories

use crate::config::AcquisitionConfig;
use crate::error::AcquisitionError;
use crate::repository::clone::{GitCli, RepositoryCloner};
use crate::repository::workspace::Workspace;
use crate::utils::Validator;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// What the caller wants analysed. A usable local directory always wins.
#[derive(Debug, Clone, Default)]
pub struct Locator {
    pub local_path: Option<PathBuf>,
    pub repo_url: Option<String>,
}

impl Locator {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            local_path: Some(path.into()),
            repo_url: None,
        }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            local_path: None,
            repo_url: Some(url.into()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AcquireOptions {
    pub depth: u32,
    pub timeout: Duration,
}

impl AcquireOptions {
    pub fn from_config(config: &AcquisitionConfig) -> Self {
        Self {
            depth: config.default_depth,
            timeout: Duration::from_secs(config.default_timeout_secs),
        }
    }
}

pub struct WorkspaceResolver<C = GitCli> {
    scratch_root: PathBuf,
    cloner: C,
}

impl WorkspaceResolver<GitCli> {
    pub fn new(config: &AcquisitionConfig) -> Self {
        Self::with_cloner(&config.scratch_root, GitCli::new(config.git_binary.clone()))
    }
}

impl<C: RepositoryCloner> WorkspaceResolver<C> {
    pub fn with_cloner(scratch_root: &Path, cloner: C) -> Self {
        let scratch_root =
            std::path::absolute(scratch_root).unwrap_or_else(|_| scratch_root.to_path_buf());
        Self {
            scratch_root,
            cloner,
        }
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    pub async fn resolve(
        &self,
        locator: &Locator,
        options: AcquireOptions,
    ) -> Result<Workspace, AcquisitionError> {
        if let Some(path) = &locator.local_path {
            if path.is_dir() {
                let root = std::path::absolute(path).unwrap_or_else(|_| path.clone());
                info!("Using local directory {}", root.display());
                return Ok(Workspace::local(root));
            }

            if locator.repo_url.is_none() {
                return Err(AcquisitionError::InvalidLocalPath { path: path.clone() });
            }

            warn!(
                "Local path {} is not a directory, falling back to clone",
                path.display()
            );
        }

        let url = locator
            .repo_url
            .as_deref()
            .ok_or(AcquisitionError::MissingLocator)?;

        if !Validator::is_repo_url(url) {
            return Err(AcquisitionError::InvalidUrl {
                url: url.to_string(),
            });
        }

        let workspace = self.create_scratch_dir()?;

        if let Err(e) = self
            .cloner
            .clone_repo(url, workspace.root_path(), options.depth, options.timeout)
            .await
        {
            let dir = workspace.root_path().to_path_buf();
            if let Err(cleanup) = workspace.release() {
                warn!(
                    "Failed to remove partial clone {}: {}",
                    dir.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        Ok(workspace)
    }

    /// `tmp-<utc timestamp>-<random suffix>`; `create_dir` fails instead of
    /// reusing a directory that already exists.
    fn create_scratch_dir(&self) -> Result<Workspace, AcquisitionError> {
        fs::create_dir_all(&self.scratch_root).map_err(|source| AcquisitionError::ScratchIo {
            path: self.scratch_root.clone(),
            source,
        })?;

        let suffix = Uuid::new_v4().simple().to_string();
        let name = format!(
            "tmp-{}-{}",
            Utc::now().format("%Y%m%dT%H%M%S%3f"),
            &suffix[..12]
        );
        let path = self.scratch_root.join(name);

        fs::create_dir(&path).map_err(|source| AcquisitionError::ScratchIo {
            path: path.clone(),
            source,
        })?;

        Ok(Workspace::owned(path))
    }
}
