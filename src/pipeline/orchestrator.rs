// file: src/pipeline/orchestrator.rs
// description: coordinates workspace acquisition, discovery, parsing, and aggregation
// reference: orchestrates one asynchronous summarization run

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::models::{DiscoveryError, SourceUnit, Summary, UndocumentedItem};
use crate::pipeline::aggregator::{SummaryAggregator, undocumented};
use crate::pipeline::processor::FileProcessor;
use crate::pipeline::progress::{PipelineStats, ProgressTracker};
use crate::pipeline::response::{PipelineReport, PipelineRequest};
use crate::pipeline::state::{PipelineState, RunState};
use crate::repository::{
    AcquireOptions, FileScanner, GitCli, Locator, Origin, RepositoryCloner, ScannedFile,
    Workspace, WorkspaceResolver,
};
use crate::utils::{OperationTimer, PerformanceMetrics};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy)]
struct Deadline {
    secs: u64,
    at: Instant,
}

impl Deadline {
    fn after(started: Instant, secs: u64) -> Self {
        Self {
            secs,
            at: started + Duration::from_secs(secs),
        }
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.at
    }
}

pub struct PipelineOrchestrator<C = GitCli> {
    config: Config,
    resolver: WorkspaceResolver<C>,
    processor: FileProcessor,
    max_concurrent_tasks: usize,
}

impl PipelineOrchestrator<GitCli> {
    pub fn new(config: Config) -> Result<Self> {
        let cloner = GitCli::new(config.acquisition.git_binary.clone());
        Self::with_cloner(config, cloner)
    }
}

impl<C: RepositoryCloner> PipelineOrchestrator<C> {
    pub fn with_cloner(config: Config, cloner: C) -> Result<Self> {
        config.validate()?;
        let resolver = WorkspaceResolver::with_cloner(&config.acquisition.scratch_root, cloner);
        let max_concurrent_tasks = config.pipeline.parallel_workers.max(1);

        Ok(Self {
            config,
            resolver,
            processor: FileProcessor::new(),
            max_concurrent_tasks,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one request to completion. The caller gets either a full report,
    /// possibly carrying per-file parse errors, or a single fatal error. Any
    /// cloned workspace is gone by the time this returns.
    pub async fn run(&self, request: &PipelineRequest) -> Result<PipelineReport> {
        let started = Instant::now();
        let mut timer = OperationTimer::new("summarize");
        let mut state = RunState::new();

        let options = self.acquire_options(request)?;
        let deadline = request
            .deadline_secs
            .map(|secs| Deadline::after(started, secs));
        let locator = Locator {
            local_path: request.local_path.as_ref().map(PathBuf::from),
            repo_url: request.repo_url.clone(),
        };

        state.advance(PipelineState::Acquiring)?;
        let workspace = match self.resolver.resolve(&locator, options).await {
            Ok(workspace) => workspace,
            Err(e) => {
                state.advance(PipelineState::Failed)?;
                error!("Acquisition failed ({}): {}", e.kind(), e);
                return Err(e.into());
            }
        };
        timer.checkpoint("acquire");
        timer.warn_if_slow(options.timeout / 2, "acquisition");

        let mode = workspace.origin();
        let target_dir = workspace.root_path().to_path_buf();
        let outcome = self
            .summarize(&workspace, request, deadline, &mut state)
            .await;
        timer.checkpoint("summarize");

        if let Err(e) = workspace.release() {
            warn!("Failed to release workspace {}: {}", target_dir.display(), e);
        }
        debug!("Pipeline states: {:?}", state.history());

        let (summary, undocumented, units) = outcome?;
        let note = match mode {
            Origin::Cloned => Some(format!(
                "Cloned to {}; the temporary clone was removed after analysis.",
                target_dir.display()
            )),
            Origin::Local => None,
        };

        timer.finish_with_count(summary.files);

        Ok(PipelineReport {
            mode,
            target_dir,
            summary,
            undocumented,
            units,
            note,
        })
    }

    async fn summarize(
        &self,
        workspace: &Workspace,
        request: &PipelineRequest,
        deadline: Option<Deadline>,
        state: &mut RunState,
    ) -> Result<(Summary, Vec<UndocumentedItem>, Vec<SourceUnit>)> {
        state.advance(PipelineState::Discovering)?;
        let root = workspace.root_path().to_path_buf();

        let (files, discovery_errors) = match self
            .scan_files(&root, &request.exclude_patterns)
            .await
            .and_then(|(files, errors)| {
                if files.is_empty() {
                    Err(PipelineError::NoSourceFiles { root: root.clone() })
                } else {
                    Ok((files, errors))
                }
            }) {
            Ok(found) => found,
            Err(e) => {
                state.advance(PipelineState::Failed)?;
                warn!("Discovery failed: {}", e);
                return Err(e);
            }
        };
        info!("Found {} source files to parse", files.len());

        state.advance(PipelineState::Parsing)?;
        let progress = if self.config.pipeline.show_progress {
            ProgressTracker::with_color(files.len(), self.config.pipeline.color)
        } else {
            ProgressTracker::hidden(files.len())
        };

        let units = match self.parse_files(files, deadline, &progress).await {
            Ok(units) => units,
            Err(e) => {
                progress.abandon("Deadline exceeded");
                state.advance(PipelineState::Cancelled)?;
                warn!("{}", e);
                return Err(e);
            }
        };
        progress.finish();
        self.log_final_stats(&progress.get_stats());

        let mut aggregator = SummaryAggregator::new().with_discovery_errors(discovery_errors);
        for unit in &units {
            aggregator.add(unit);
        }
        let summary = aggregator.finish();
        let undocumented = undocumented(&units);
        state.advance(PipelineState::Aggregated)?;

        info!(
            "Summary: {} modules, {} classes, {} functions, {} methods, {} parse errors",
            summary.modules,
            summary.classes,
            summary.functions,
            summary.methods,
            summary.parse_errors.len()
        );

        state.advance(PipelineState::Done)?;
        Ok((summary, undocumented, units))
    }

    fn acquire_options(&self, request: &PipelineRequest) -> Result<AcquireOptions> {
        let mut options = AcquireOptions::from_config(&self.config.acquisition);

        if let Some(depth) = request.depth {
            if depth == 0 {
                return Err(PipelineError::Validation(
                    "depth must be at least 1".to_string(),
                ));
            }
            options.depth = depth;
        }

        if let Some(timeout) = request.timeout {
            if timeout == 0 {
                return Err(PipelineError::Validation(
                    "timeout must be at least 1 second".to_string(),
                ));
            }
            options.timeout = Duration::from_secs(timeout);
        }

        if request.deadline_secs == Some(0) {
            return Err(PipelineError::Validation(
                "deadline_secs must be at least 1".to_string(),
            ));
        }

        Ok(options)
    }

    async fn scan_files(
        &self,
        root: &Path,
        exclude_patterns: &[String],
    ) -> Result<(Vec<ScannedFile>, Vec<DiscoveryError>)> {
        let scanner = FileScanner::with_excludes(&self.config.discovery, exclude_patterns)?;
        let root = root.to_path_buf();

        tokio::task::spawn_blocking(move || scanner.scan_directory(&root))
            .await
            .map_err(|e| PipelineError::Task(format!("File scanning task failed: {}", e)))
    }

    /// Parses on the blocking pool with bounded concurrency. Results come back
    /// in discovery order. The deadline is checked before each file.
    async fn parse_files(
        &self,
        files: Vec<ScannedFile>,
        deadline: Option<Deadline>,
        progress: &ProgressTracker,
    ) -> Result<Vec<SourceUnit>> {
        let parse_started = Instant::now();
        let total = files.len();

        info!(
            "Parsing files with {} concurrent tasks...",
            self.max_concurrent_tasks
        );

        let mut results = stream::iter(files)
            .map(|file| {
                let processor = self.processor.clone();
                async move {
                    let task_file = file.clone();
                    let joined =
                        tokio::task::spawn_blocking(move || processor.process(&task_file)).await;
                    (file, joined)
                }
            })
            .buffered(self.max_concurrent_tasks);

        let mut units = Vec::with_capacity(total);
        loop {
            if let Some(deadline) = deadline.filter(Deadline::expired) {
                return Err(PipelineError::DeadlineExceeded {
                    deadline_secs: deadline.secs,
                    parsed: units.len(),
                });
            }

            let Some((file, joined)) = results.next().await else {
                break;
            };

            let unit = match joined {
                Ok(unit) => unit,
                Err(e) => {
                    error!("Parse task for {} failed: {}", file.relative_path, e);
                    FileProcessor::crashed(&file, &e.to_string())
                }
            };

            if unit.is_ok() {
                progress.inc_files_parsed();
            } else {
                progress.inc_files_failed();
            }
            progress.add_bytes_read(file.size);
            units.push(unit);
        }

        debug!(
            "{}",
            PerformanceMetrics::new("parse", total, parse_started.elapsed()).format()
        );
        Ok(units)
    }

    fn log_final_stats(&self, stats: &PipelineStats) {
        info!("=== Parse Summary ===");
        info!("Duration: {} ms", stats.duration_ms);
        info!("Files parsed: {}", stats.files_parsed);
        info!("Files with errors: {}", stats.files_failed);
        info!("Success rate: {:.2}%", stats.success_rate());
        info!("Bytes read: {}", stats.total_bytes_read);
        info!(
            "Processing speed: {:.2} files/sec",
            stats.files_per_second()
        );
        info!("=====================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParseErrorKind;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const SERVICE: &str = r#""""Service module."""

class Service:
    """Runs things."""

    def start(self):
        """Start."""
        pass

    def stop(self):
        pass


def main():
    pass
"#;

    fn test_config(scratch: &Path) -> Config {
        let mut config = Config::default_config();
        config.acquisition.scratch_root = scratch.to_path_buf();
        config.pipeline.parallel_workers = 2;
        config
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn entries(dir: &Path) -> usize {
        fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn test_orchestrator_creation() {
        let scratch = TempDir::new().unwrap();
        let orchestrator = PipelineOrchestrator::new(test_config(scratch.path())).unwrap();
        assert_eq!(orchestrator.max_concurrent_tasks, 2);
    }

    #[test]
    fn test_orchestrator_rejects_invalid_config() {
        let scratch = TempDir::new().unwrap();
        let mut config = test_config(scratch.path());
        config.pipeline.parallel_workers = 0;
        assert!(PipelineOrchestrator::new(config).is_err());
    }

    #[tokio::test]
    async fn test_local_run_end_to_end() {
        let repo = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        write(repo.path(), "service.py", SERVICE);

        let orchestrator = PipelineOrchestrator::new(test_config(scratch.path())).unwrap();
        let report = orchestrator
            .run(&PipelineRequest::local(repo.path().to_string_lossy()))
            .await
            .unwrap();

        assert_eq!(report.mode, Origin::Local);
        assert_eq!(report.target_dir, repo.path());
        assert_eq!(report.note, None);

        let summary = &report.summary;
        assert_eq!(summary.modules, 1);
        assert_eq!(summary.classes, 1);
        assert_eq!(summary.functions, 1);
        assert_eq!(summary.methods, 2);
        assert_eq!(summary.missing_module_docs, 0);
        assert_eq!(summary.missing_function_docs, 2);
        assert_eq!(
            report
                .undocumented
                .iter()
                .map(|i| i.qualified_name.as_str())
                .collect::<Vec<_>>(),
            vec!["Service.stop", "main"]
        );

        assert!(repo.path().join("service.py").exists());
        assert_eq!(entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_repeated_runs_are_identical() {
        let repo = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        write(repo.path(), "service.py", SERVICE);
        write(repo.path(), "pkg/__init__.py", "");
        write(repo.path(), "pkg/util.py", "def helper(x):\n    \"\"\"Help.\"\"\"\n");

        let orchestrator = PipelineOrchestrator::new(test_config(scratch.path())).unwrap();
        let request = PipelineRequest::local(repo.path().to_string_lossy());

        let first = orchestrator.run(&request).await.unwrap();
        let second = orchestrator.run(&request).await.unwrap();

        assert_eq!(first.summary, second.summary);
        assert_eq!(first.summary.fingerprint(), second.summary.fingerprint());
        assert_eq!(
            first
                .units
                .iter()
                .map(|u| u.relative_path.as_str())
                .collect::<Vec<_>>(),
            vec!["pkg/__init__.py", "pkg/util.py", "service.py"]
        );
    }

    #[tokio::test]
    async fn test_invalid_syntax_still_completes() {
        let repo = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        write(repo.path(), "good.py", "def ok():\n    pass\n");
        write(repo.path(), "broken.py", "def broken(:\n    pass\n");

        let orchestrator = PipelineOrchestrator::new(test_config(scratch.path())).unwrap();
        let report = orchestrator
            .run(&PipelineRequest::local(repo.path().to_string_lossy()))
            .await
            .unwrap();

        assert_eq!(report.summary.files, 2);
        assert_eq!(report.summary.modules, 1);
        assert_eq!(report.summary.parse_errors.len(), 1);
        assert_eq!(report.summary.parse_errors[0].relative_path, "broken.py");
        assert_eq!(
            report.summary.parse_errors[0].kind,
            ParseErrorKind::SyntaxError
        );
    }

    #[tokio::test]
    async fn test_request_excludes_are_applied() {
        let repo = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        write(repo.path(), "app.py", "x = 1\n");
        write(repo.path(), "tests/test_app.py", "def test_x():\n    pass\n");

        let orchestrator = PipelineOrchestrator::new(test_config(scratch.path())).unwrap();
        let request = PipelineRequest {
            exclude_patterns: vec!["tests/**".to_string()],
            ..PipelineRequest::local(repo.path().to_string_lossy())
        };
        let report = orchestrator.run(&request).await.unwrap();

        assert_eq!(report.summary.files, 1);
        assert_eq!(report.summary.functions, 0);
    }

    #[tokio::test]
    async fn test_zero_files_is_fatal() {
        let repo = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        write(repo.path(), "README.md", "# nothing to see\n");

        let orchestrator = PipelineOrchestrator::new(test_config(scratch.path())).unwrap();
        let err = orchestrator
            .run(&PipelineRequest::local(repo.path().to_string_lossy()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "no_source_files");
    }

    #[tokio::test]
    async fn test_invalid_local_path_is_fatal() {
        let scratch = TempDir::new().unwrap();
        let orchestrator = PipelineOrchestrator::new(test_config(scratch.path())).unwrap();

        let err = orchestrator
            .run(&PipelineRequest::local("/definitely/not/a/repo"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "invalid_local_path");
    }

    #[tokio::test]
    async fn test_zero_depth_rejected() {
        let scratch = TempDir::new().unwrap();
        let orchestrator = PipelineOrchestrator::new(test_config(scratch.path())).unwrap();
        let request = PipelineRequest {
            depth: Some(0),
            ..PipelineRequest::remote("https://example.com/r.git")
        };

        let err = orchestrator.run(&request).await.unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_expired_deadline_aborts_parsing() {
        let repo = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        write(repo.path(), "a.py", "x = 1\n");
        write(repo.path(), "b.py", "y = 2\n");

        let orchestrator = PipelineOrchestrator::new(test_config(scratch.path())).unwrap();
        let (files, _) = orchestrator.scan_files(repo.path(), &[]).await.unwrap();
        let deadline = Deadline {
            secs: 1,
            at: Instant::now(),
        };

        let err = orchestrator
            .parse_files(files, Some(deadline), &ProgressTracker::hidden(2))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::DeadlineExceeded {
                deadline_secs: 1,
                parsed: 0
            }
        ));
    }

    #[cfg(unix)]
    mod with_fake_git {
        use super::*;
        use crate::repository::clone::fake::*;
        use pretty_assertions::assert_eq;

        fn fake_git_config(bin: &Path, scratch: &Path, body: &str) -> Config {
            let mut config = test_config(scratch);
            config.acquisition.git_binary =
                script(bin, "git", body).to_string_lossy().into_owned();
            config
        }

        #[tokio::test]
        async fn test_cloned_run_removes_workspace() {
            let bin = TempDir::new().unwrap();
            let scratch = TempDir::new().unwrap();
            let config = fake_git_config(bin.path(), scratch.path(), CLONE_OK);

            let orchestrator = PipelineOrchestrator::new(config).unwrap();
            let report = orchestrator
                .run(&PipelineRequest::remote("https://example.com/pkg.git"))
                .await
                .unwrap();

            assert_eq!(report.mode, Origin::Cloned);
            assert!(report.note.is_some());
            assert_eq!(report.summary.files, 2);
            assert_eq!(report.summary.modules, 2);
            assert_eq!(report.summary.functions, 1);
            assert_eq!(report.summary.missing_module_docs, 1);
            assert_eq!(report.summary.top_modules[0].module, "pkg");

            assert!(!report.target_dir.exists());
            assert_eq!(entries(scratch.path()), 0);
        }

        #[tokio::test]
        async fn test_clone_timeout_is_fatal_and_clean() {
            let bin = TempDir::new().unwrap();
            let scratch = TempDir::new().unwrap();
            let config = fake_git_config(bin.path(), scratch.path(), CLONE_HANG);

            let orchestrator = PipelineOrchestrator::new(config).unwrap();
            let request = PipelineRequest {
                timeout: Some(1),
                ..PipelineRequest::remote("https://example.com/slow.git")
            };

            let started = Instant::now();
            let err = orchestrator.run(&request).await.unwrap_err();

            assert_eq!(err.kind(), "clone_timeout");
            assert!(started.elapsed() < Duration::from_secs(5));
            assert_eq!(entries(scratch.path()), 0);
        }

        #[tokio::test]
        async fn test_clone_failure_is_fatal() {
            let bin = TempDir::new().unwrap();
            let scratch = TempDir::new().unwrap();
            let config = fake_git_config(bin.path(), scratch.path(), CLONE_FAIL);

            let orchestrator = PipelineOrchestrator::new(config).unwrap();
            let err = orchestrator
                .run(&PipelineRequest::remote("https://example.com/missing.git"))
                .await
                .unwrap_err();

            assert_eq!(err.kind(), "clone_failed");
            assert_eq!(entries(scratch.path()), 0);
        }

        #[tokio::test]
        async fn test_deadline_passed_during_clone_cancels_run() {
            let bin = TempDir::new().unwrap();
            let scratch = TempDir::new().unwrap();
            let config = fake_git_config(bin.path(), scratch.path(), CLONE_SLOW_OK);

            let orchestrator = PipelineOrchestrator::new(config).unwrap();
            let request = PipelineRequest {
                timeout: Some(10),
                deadline_secs: Some(1),
                ..PipelineRequest::remote("https://example.com/slow.git")
            };

            let err = orchestrator.run(&request).await.unwrap_err();

            assert_eq!(err.kind(), "deadline_exceeded");
            assert!(matches!(
                err,
                PipelineError::DeadlineExceeded {
                    deadline_secs: 1,
                    parsed: 0
                }
            ));
            assert_eq!(entries(scratch.path()), 0);
        }
    }
}
