// file: src/models/summary.rs
// description: repository-level aggregate produced once per pipeline run
// reference: internal data structures

use crate::models::source_unit::ParseError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A path the walker could not read. Recorded and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub module: String,
    pub path: String,
    pub classes: usize,
    pub functions: usize,
    pub has_doc: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub files: usize,
    pub modules: usize,
    pub classes: usize,
    pub functions: usize,
    pub methods: usize,
    pub missing_module_docs: usize,
    pub missing_function_docs: usize,
    pub missing_method_docs: usize,
    pub parse_errors: Vec<ParseError>,
    pub discovery_errors: Vec<DiscoveryError>,
    pub top_modules: Vec<ModuleEntry>,
}

impl Summary {
    /// SHA-256 of the JSON encoding. Equal summaries give equal fingerprints.
    pub fn fingerprint(&self) -> String {
        let encoded = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        format!("{:x}", hasher.finalize())
    }

    pub fn documented_ratio(&self) -> f64 {
        let total = self.functions + self.methods;
        if total == 0 {
            return 100.0;
        }
        ((total - self.missing_function_docs) as f64 / total as f64) * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Class,
    Function,
    Method,
}

/// Locates a declaration without a docstring precisely enough for a writer to
/// rewrite it later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndocumentedItem {
    pub relative_path: String,
    pub qualified_name: String,
    pub kind: DeclKind,
    pub line_start: usize,
    pub line_end: usize,
}
