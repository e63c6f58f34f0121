// file: src/models/source_unit.rs
// description: per-file declaration tree produced by the unit parser
// reference: internal data structures

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    PositionalOnly,
    Positional,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: String,
    pub type_annotation: Option<String>,
    pub has_default: bool,
    pub kind: ParamKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub line_start: usize,
    pub line_end: usize,
    pub docstring: Option<String>,
    pub parameters: Vec<ParamInfo>,
    pub return_annotation: Option<String>,
    pub is_method: bool,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub line_start: usize,
    pub line_end: usize,
    pub docstring: Option<String>,
    pub methods: Vec<FunctionDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    SyntaxError,
    DecodeError,
    UnexpectedParserFailure,
}

/// A recoverable failure scoped to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub relative_path: String,
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub relative_path: String,
    pub module: String,
    pub module_docstring: Option<String>,
    pub classes: Vec<ClassDecl>,
    pub functions: Vec<FunctionDecl>,
    pub parse_error: Option<ParseError>,
}

impl SourceUnit {
    pub fn failed(
        relative_path: &str,
        kind: ParseErrorKind,
        message: String,
        line: Option<usize>,
    ) -> Self {
        Self {
            relative_path: relative_path.to_string(),
            module: module_name(relative_path),
            module_docstring: None,
            classes: Vec::new(),
            functions: Vec::new(),
            parse_error: Some(ParseError {
                relative_path: relative_path.to_string(),
                kind,
                message,
                line,
            }),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.parse_error.is_none()
    }

    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }
}

/// Dotted module path for a `/`-separated relative path.
///
/// `pkg/sub/mod.py` becomes `pkg.sub.mod` and `pkg/__init__.py` becomes `pkg`.
pub fn module_name(relative_path: &str) -> String {
    let without_ext = match relative_path.rfind('.') {
        Some(idx) if !relative_path[idx..].contains('/') => &relative_path[..idx],
        _ => relative_path,
    };

    let mut parts: Vec<&str> = without_ext
        .split('/')
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();

    if parts.last() == Some(&"__init__") {
        parts.pop();
    }

    parts.join(".")
}
