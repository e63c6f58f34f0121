// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod exporter;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod repository;
pub mod utils;

pub use config::{AcquisitionConfig, Config, DiscoveryConfig, PipelineConfig};
pub use error::{AcquisitionError, PipelineError, Result};
pub use exporter::{ExportManifest, JsonExporter};
pub use models::{
    ClassDecl, FunctionDecl, ParamInfo, ParamKind, ParseError, ParseErrorKind, SourceUnit,
    Summary, UndocumentedItem,
};
pub use parser::PythonParser;
pub use pipeline::{
    FileProcessor, PipelineOrchestrator, PipelineReport, PipelineRequest, PipelineResponse,
    PipelineState, PipelineStats, ProgressTracker, aggregate, undocumented,
};
pub use repository::{
    AcquireOptions, FileScanner, GitCli, Locator, Origin, RepositoryCloner, ScannedFile,
    Workspace, WorkspaceResolver,
};
pub use utils::{OperationTimer, PerformanceMetrics, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert!(PythonParser::new().is_ok());
        assert_eq!(GitCli::default().binary(), "git");
    }
}
