// file: src/pipeline/processor.rs
// description: converts scanned source files into parsed source units
// reference: reads file bytes and runs the python parser at the file boundary

use crate::models::{ParseErrorKind, SourceUnit};
use crate::parser::PythonParser;
use crate::repository::ScannedFile;
use std::fs;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct FileProcessor;

impl FileProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Always yields a unit; read and parse failures are attached to it.
    pub fn process(&self, scanned_file: &ScannedFile) -> SourceUnit {
        debug!("Parsing file: {}", scanned_file.relative_path);

        let bytes = match fs::read(&scanned_file.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read {}: {}", scanned_file.relative_path, e);
                return SourceUnit::failed(
                    &scanned_file.relative_path,
                    ParseErrorKind::DecodeError,
                    format!("failed to read file: {}", e),
                    None,
                );
            }
        };

        let mut parser = match PythonParser::new() {
            Ok(parser) => parser,
            Err(e) => {
                return SourceUnit::failed(
                    &scanned_file.relative_path,
                    ParseErrorKind::UnexpectedParserFailure,
                    e.to_string(),
                    None,
                );
            }
        };

        let unit = parser.parse_bytes(&scanned_file.relative_path, &bytes);

        if let Some(error) = &unit.parse_error {
            warn!(
                "Failed to parse {} ({:?}): {}",
                scanned_file.relative_path, error.kind, error.message
            );
        } else {
            debug!(
                "Extracted {} classes, {} functions, {} methods from {}",
                unit.classes.len(),
                unit.functions.len(),
                unit.method_count(),
                scanned_file.relative_path
            );
        }

        unit
    }

    /// Unit for a file whose parse task panicked or was cancelled.
    pub fn crashed(scanned_file: &ScannedFile, reason: &str) -> SourceUnit {
        SourceUnit::failed(
            &scanned_file.relative_path,
            ParseErrorKind::UnexpectedParserFailure,
            format!("parser task failed: {}", reason),
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_file(dir: &TempDir, name: &str, content: &[u8]) -> ScannedFile {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        ScannedFile {
            path,
            relative_path: name.to_string(),
            size: content.len() as u64,
        }
    }

    #[test]
    fn test_process_simple_module() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_file(
            &temp_dir,
            "app.py",
            b"\"\"\"App.\"\"\"\n\nclass A:\n    def run(self):\n        pass\n",
        );

        let unit = FileProcessor::new().process(&file);

        assert!(unit.is_ok());
        assert_eq!(unit.relative_path, "app.py");
        assert_eq!(unit.classes.len(), 1);
        assert_eq!(unit.method_count(), 1);
    }

    #[test]
    fn test_process_missing_file_becomes_unit_error() {
        let file = ScannedFile {
            path: PathBuf::from("/nonexistent/gone.py"),
            relative_path: "gone.py".to_string(),
            size: 0,
        };

        let unit = FileProcessor::new().process(&file);

        let error = unit.parse_error.expect("read error recorded");
        assert_eq!(error.kind, ParseErrorKind::DecodeError);
        assert_eq!(error.relative_path, "gone.py");
    }

    #[test]
    fn test_crashed_unit() {
        let file = ScannedFile {
            path: PathBuf::from("x.py"),
            relative_path: "x.py".to_string(),
            size: 0,
        };
        let unit = FileProcessor::crashed(&file, "panic");
        assert_eq!(
            unit.parse_error.unwrap().kind,
            ParseErrorKind::UnexpectedParserFailure
        );
    }
}
