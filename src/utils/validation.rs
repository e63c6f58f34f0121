// file: src/utils/validation.rs
// description: locator validation utilities and helpers
// reference: input validation patterns

use crate::error::{PipelineError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    static ref REMOTE_URL: Regex = Regex::new(
        r"^(?:https?|ssh|git|git\+ssh)://(?:[^@\s/]+@)?[A-Za-z0-9][A-Za-z0-9.\-]*(?::\d+)?(?:/\S*)?$"
    )
    .expect("remote url pattern");
    static ref FILE_URL: Regex = Regex::new(r"^file:///?\S+$").expect("file url pattern");
    static ref SCP_URL: Regex =
        Regex::new(r"^[A-Za-z0-9._\-]+@[A-Za-z0-9][A-Za-z0-9.\-]*:[^\s:][^\s]*$")
            .expect("scp url pattern");
}

pub struct Validator;

impl Validator {
    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(PipelineError::Validation(format!(
                "Directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(PipelineError::Validation(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }

    /// Accepts `scheme://host/path` for the schemes git clones over, and
    /// scp-like `user@host:path`. Anything that could be read as a git option
    /// is rejected.
    pub fn is_repo_url(url: &str) -> bool {
        if url.is_empty() || url.starts_with('-') || url.chars().any(char::is_whitespace) {
            return false;
        }

        REMOTE_URL.is_match(url) || FILE_URL.is_match(url) || SCP_URL.is_match(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_directory() {
        let temp = TempDir::new().unwrap();
        assert!(Validator::validate_directory(temp.path()).is_ok());
        assert!(Validator::validate_directory(Path::new("/nonexistent")).is_err());

        let file = temp.path().join("file.py");
        fs::write(&file, "").unwrap();
        assert!(Validator::validate_directory(&file).is_err());
    }

    #[test]
    fn test_accepts_common_remote_forms() {
        for url in [
            "https://github.com/user/repo",
            "https://github.com/user/repo.git",
            "http://localhost:8080/repo.git",
            "ssh://git@github.com/user/repo.git",
            "git://example.org/project.git",
            "file:///srv/git/project.git",
            "git@github.com:user/repo.git",
        ] {
            assert!(Validator::is_repo_url(url), "{url}");
        }
    }

    #[test]
    fn test_rejects_malformed_urls() {
        for url in [
            "",
            "example.com/repo",
            "ftp://example.com/repo",
            "https://",
            "https://exa mple.com/repo",
            "--upload-pack=touch /tmp/x",
            "/local/path",
        ] {
            assert!(!Validator::is_repo_url(url), "{url}");
        }
    }
}
