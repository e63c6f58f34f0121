// file: src/exporter/json.rs
// description: json export of pipeline responses and parsed units

use crate::error::{PipelineError, Result};
use crate::models::SourceUnit;
use crate::pipeline::PipelineResponse;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ExportManifest {
    pub exported_at: String,
    pub total_units: usize,
    pub files: Vec<String>,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|source| PipelineError::FileOperation {
            path: output_dir.clone(),
            source,
        })?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes `summary-<timestamp>.json` and returns its path.
    pub fn export_response(&self, response: &PipelineResponse, pretty: bool) -> Result<PathBuf> {
        let name = format!("summary-{}.json", Utc::now().format("%Y%m%dT%H%M%S%3fZ"));
        let path = self.output_dir.join(name);
        self.write_json(&path, response, pretty)?;

        info!("Exported response to {}", path.display());
        Ok(path)
    }

    /// One file per parsed unit, mirroring the repository layout, plus a
    /// `manifest.json` listing them.
    pub fn export_units(&self, units: &[SourceUnit], pretty: bool) -> Result<ExportManifest> {
        info!("Starting JSON export to {:?}", self.output_dir);

        let mut files = Vec::with_capacity(units.len());
        for unit in units {
            let relative = format!("units/{}.json", unit.relative_path);
            let path = self.output_dir.join(&relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| PipelineError::FileOperation {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            self.write_json(&path, unit, pretty)?;
            files.push(relative);
        }

        let manifest = ExportManifest {
            exported_at: Utc::now().to_rfc3339(),
            total_units: units.len(),
            files,
        };
        self.write_json(&self.output_dir.join("manifest.json"), &manifest, true)?;

        info!("Export complete: {} units exported", manifest.total_units);
        Ok(manifest)
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T, pretty: bool) -> Result<()> {
        let encoded = if pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        fs::write(path, encoded).map_err(|source| PipelineError::FileOperation {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParseErrorKind;
    use tempfile::tempdir;

    #[test]
    fn test_exporter_creation() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path().join("out")).unwrap();
        assert!(exporter.output_dir().is_dir());
    }

    #[test]
    fn test_export_failed_response() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path()).unwrap();
        let response = PipelineResponse::Failed {
            kind: "clone_timeout".to_string(),
            message: "git clone timed out after 1s".to_string(),
        };

        let path = exporter.export_response(&response, false).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(value["status"], "failed");
        assert_eq!(value["kind"], "clone_timeout");
    }

    #[test]
    fn test_export_units_mirrors_layout() {
        let dir = tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path()).unwrap();
        let units = vec![SourceUnit::failed(
            "pkg/broken.py",
            ParseErrorKind::SyntaxError,
            "invalid syntax".to_string(),
            Some(3),
        )];

        let manifest = exporter.export_units(&units, true).unwrap();

        assert_eq!(manifest.total_units, 1);
        assert_eq!(manifest.files, vec!["units/pkg/broken.py.json".to_string()]);
        assert!(dir.path().join("units/pkg/broken.py.json").exists());
        assert!(dir.path().join("manifest.json").exists());
    }
}
