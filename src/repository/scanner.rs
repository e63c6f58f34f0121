// file: src/repository/scanner.rs
// description: Directory walking and source file discovery with glob filtering
// reference: https://docs.rs/walkdir, https://docs.rs/globset

use crate::config::DiscoveryConfig;
use crate::error::{PipelineError, Result};
use crate::models::DiscoveryError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Directories skipped on every walk regardless of caller patterns.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    ".tox",
    "node_modules",
    "dist",
    "build",
    "venv",
    ".venv",
    "env",
    ".env",
    "site-packages",
];

#[derive(Debug, Clone)]
pub struct FileScanner {
    extensions: Vec<String>,
    max_file_size: u64,
    excludes: GlobSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub size: u64,
}

impl FileScanner {
    pub fn new(config: &DiscoveryConfig) -> Result<Self> {
        Self::with_excludes(config, &[])
    }

    /// Builds a scanner whose exclusions are the defaults, the configured
    /// patterns and `extra` (usually per-request patterns).
    pub fn with_excludes(config: &DiscoveryConfig, extra: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();

        for dir in DEFAULT_EXCLUDED_DIRS {
            builder.add(compile(&format!("**/{}", dir))?);
            builder.add(compile(&format!("**/{}/**", dir))?);
        }

        for pattern in config.exclude_patterns.iter().chain(extra.iter()) {
            builder.add(compile(pattern)?);
        }

        let excludes = builder
            .build()
            .map_err(|e| PipelineError::Validation(format!("Invalid exclude patterns: {}", e)))?;

        Ok(Self {
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            max_file_size: (config.max_file_size_mb as u64) * 1024 * 1024,
            excludes,
        })
    }

    /// Lazily walks `root` in file-name order. The returned iterator is
    /// single-use; traversal failures are available from it afterwards.
    pub fn discover(&self, root: &Path) -> Discovery {
        info!("Scanning directory: {}", root.display());

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Discovery {
            scanner: self.clone(),
            root: root.to_path_buf(),
            canonical_root: fs::canonicalize(root).ok(),
            walker,
            errors: Vec::new(),
        }
    }

    pub fn scan_directory(&self, root: &Path) -> (Vec<ScannedFile>, Vec<DiscoveryError>) {
        let mut discovery = self.discover(root);
        let files: Vec<ScannedFile> = discovery.by_ref().collect();
        info!("Found {} source files", files.len());
        (files, discovery.into_errors())
    }

    fn is_excluded_dir(&self, relative_path: &str, name: &str) -> bool {
        (name.starts_with('.') && name.len() > 1) || self.excludes.is_match(relative_path)
    }

    fn is_excluded_file(&self, relative_path: &str) -> bool {
        self.excludes.is_match(relative_path)
    }

    fn has_target_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|ext| ext.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

fn compile(pattern: &str) -> Result<Glob> {
    Glob::new(pattern)
        .map_err(|e| PipelineError::Validation(format!("Invalid glob {}: {}", pattern, e)))
}

fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub struct Discovery {
    scanner: FileScanner,
    root: PathBuf,
    canonical_root: Option<PathBuf>,
    walker: walkdir::IntoIter,
    errors: Vec<DiscoveryError>,
}

impl Discovery {
    pub fn into_errors(self) -> Vec<DiscoveryError> {
        self.errors
    }

    fn record_error(&mut self, err: walkdir::Error) {
        let path = err
            .path()
            .map(|p| relative_path(&self.root, p))
            .unwrap_or_default();
        warn!("Skipping unreadable path {}: {}", path, err);
        self.errors.push(DiscoveryError {
            path,
            message: err.to_string(),
        });
    }

    fn accept_file(&self, entry: &DirEntry, relative_path: String) -> Option<ScannedFile> {
        if !self.scanner.has_target_extension(entry.path()) {
            return None;
        }

        if self.scanner.is_excluded_file(&relative_path) {
            debug!("Excluded by pattern: {}", relative_path);
            return None;
        }

        let size = match fs::metadata(entry.path()) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                debug!("Cannot stat {}: {}", relative_path, e);
                return None;
            }
        };

        if self.scanner.max_file_size > 0 && size > self.scanner.max_file_size {
            debug!(
                "Skipping large file ({} MB): {}",
                size / 1024 / 1024,
                relative_path
            );
            return None;
        }

        Some(ScannedFile {
            path: entry.path().to_path_buf(),
            relative_path,
            size,
        })
    }

    /// Symlinked files are kept only when their target stays inside the root.
    fn accept_symlink(&self, entry: &DirEntry, relative_path: String) -> Option<ScannedFile> {
        let root = self.canonical_root.as_ref()?;
        let target = fs::canonicalize(entry.path()).ok()?;

        if !target.starts_with(root) {
            debug!("Symlink escapes workspace, skipping: {}", relative_path);
            return None;
        }

        if !target.is_file() {
            debug!("Not following directory symlink: {}", relative_path);
            return None;
        }

        self.accept_file(entry, relative_path)
    }
}

impl Iterator for Discovery {
    type Item = ScannedFile;

    fn next(&mut self) -> Option<ScannedFile> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    self.record_error(err);
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let rel = relative_path(&self.root, entry.path());
            let file_type = entry.file_type();

            if file_type.is_dir() {
                let name = entry.file_name().to_string_lossy();
                if self.scanner.is_excluded_dir(&rel, &name) {
                    debug!("Skipping directory: {}", rel);
                    self.walker.skip_current_dir();
                }
                continue;
            }

            let accepted = if file_type.is_symlink() {
                self.accept_symlink(&entry, rel)
            } else if file_type.is_file() {
                self.accept_file(&entry, rel)
            } else {
                None
            };

            if let Some(file) = accepted {
                return Some(file);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn relative_paths(files: &[ScannedFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative_path.as_str()).collect()
    }

    #[test]
    fn test_scan_directory_orders_and_filters() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pkg/b.py", "");
        write(temp.path(), "pkg/a.py", "");
        write(temp.path(), "main.py", "");
        write(temp.path(), "README.md", "# readme");

        let scanner = FileScanner::new(&Config::default_config().discovery).unwrap();
        let (files, errors) = scanner.scan_directory(temp.path());

        assert_eq!(relative_paths(&files), vec!["main.py", "pkg/a.py", "pkg/b.py"]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_default_exclusions() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "app.py", "");
        write(temp.path(), ".venv/lib/site.py", "");
        write(temp.path(), "venv/lib/x.py", "");
        write(temp.path(), "src/__pycache__/app.cpython-311.py", "");
        write(temp.path(), "src/node_modules/pkg/setup.py", "");
        write(temp.path(), ".git/hooks/hook.py", "");
        write(temp.path(), ".hidden/tool.py", "");
        write(temp.path(), "build/lib/mod.py", "");

        let scanner = FileScanner::new(&Config::default_config().discovery).unwrap();
        let (files, _) = scanner.scan_directory(temp.path());

        assert_eq!(relative_paths(&files), vec!["app.py"]);
    }

    #[test]
    fn test_caller_exclude_patterns() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/app.py", "");
        write(temp.path(), "tests/test_app.py", "");
        write(temp.path(), "src/conftest.py", "");

        let scanner = FileScanner::with_excludes(
            &Config::default_config().discovery,
            &["tests/**".to_string(), "**/conftest.py".to_string()],
        )
        .unwrap();
        let (files, _) = scanner.scan_directory(temp.path());

        assert_eq!(relative_paths(&files), vec!["src/app.py"]);
    }

    #[test]
    fn test_discovery_is_deterministic() {
        let temp = TempDir::new().unwrap();
        for name in ["z.py", "m/a.py", "m/z.py", "a.py", "b/c/d.py"] {
            write(temp.path(), name, "");
        }

        let scanner = FileScanner::new(&Config::default_config().discovery).unwrap();
        let (first, _) = scanner.scan_directory(temp.path());
        let (second, _) = scanner.scan_directory(temp.path());

        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn test_large_files_skipped() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "small.py", "x = 1\n");
        write(temp.path(), "large.py", &"#".repeat(2 * 1024 * 1024));

        let mut config = Config::default_config().discovery;
        config.max_file_size_mb = 1;
        let scanner = FileScanner::new(&config).unwrap();
        let (files, _) = scanner.scan_directory(temp.path());

        assert_eq!(relative_paths(&files), vec!["small.py"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_escaping_root_are_not_followed() {
        let outside = TempDir::new().unwrap();
        write(outside.path(), "secret.py", "");
        write(outside.path(), "lib/deep.py", "");

        let temp = TempDir::new().unwrap();
        write(temp.path(), "real.py", "");
        std::os::unix::fs::symlink(temp.path().join("real.py"), temp.path().join("alias.py"))
            .unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.py"), temp.path().join("leak.py"))
            .unwrap();
        std::os::unix::fs::symlink(outside.path().join("lib"), temp.path().join("lib")).unwrap();

        let scanner = FileScanner::new(&Config::default_config().discovery).unwrap();
        let (files, _) = scanner.scan_directory(temp.path());

        assert_eq!(relative_paths(&files), vec!["alias.py", "real.py"]);
    }

    #[test]
    fn test_missing_root_records_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");

        let scanner = FileScanner::new(&Config::default_config().discovery).unwrap();
        let (files, errors) = scanner.scan_directory(&missing);

        assert!(files.is_empty());
        assert_eq!(errors.len(), 1);
    }
}
