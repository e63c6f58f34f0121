// file: src/repository/workspace.rs
// description: local view of a repository with scoped ownership of cloned directories
// reference: RAII cleanup of scratch directories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Local,
    Cloned,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Local => "local",
            Origin::Cloned => "cloned",
        }
    }
}

/// A caller-owned directory is never touched. An owned (cloned) directory is
/// removed on [`Workspace::release`] or, failing that, on drop.
#[derive(Debug)]
pub struct Workspace {
    root_path: PathBuf,
    origin: Origin,
    created_at: DateTime<Utc>,
    owns_directory: bool,
    released: bool,
}

impl Workspace {
    pub fn local(root_path: PathBuf) -> Self {
        Self {
            root_path,
            origin: Origin::Local,
            created_at: Utc::now(),
            owns_directory: false,
            released: false,
        }
    }

    pub(crate) fn owned(root_path: PathBuf) -> Self {
        Self {
            root_path,
            origin: Origin::Cloned,
            created_at: Utc::now(),
            owns_directory: true,
            released: false,
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn owns_directory(&self) -> bool {
        self.owns_directory
    }

    pub fn release(mut self) -> io::Result<()> {
        self.remove_owned()
    }

    fn remove_owned(&mut self) -> io::Result<()> {
        if !self.owns_directory || self.released {
            return Ok(());
        }
        self.released = true;

        if self.root_path.exists() {
            debug!("Removing workspace {}", self.root_path.display());
            fs::remove_dir_all(&self.root_path)?;
        }
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = self.remove_owned() {
            warn!(
                "Failed to remove workspace {}: {}",
                self.root_path.display(),
                e
            );
        }
    }
}
