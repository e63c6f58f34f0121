// file: src/parser/python.rs
// description: python declaration tree extraction with tree-sitter
// reference: https://docs.rs/tree-sitter, https://docs.rs/tree-sitter-python

use crate::error::{PipelineError, Result};
use crate::models::{ClassDecl, FunctionDecl, ParseErrorKind, SourceUnit, module_name};
use crate::parser::docstring::extract_docstring;
use crate::parser::signature::{node_text, parse_parameters};
use tree_sitter::{Node, Parser, Tree};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parses Python source into a [`SourceUnit`]. The analysed code is never
/// executed or imported.
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| PipelineError::Config(format!("Failed to load Python grammar: {}", e)))?;
        Ok(Self { parser })
    }

    /// Turns raw file bytes into a unit. Every failure becomes a recorded
    /// parse error on the returned unit.
    pub fn parse_bytes(&mut self, relative_path: &str, bytes: &[u8]) -> SourceUnit {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        match std::str::from_utf8(bytes) {
            Ok(source) => self.parse_source(relative_path, source),
            Err(e) => {
                let valid = &bytes[..e.valid_up_to()];
                let line = valid.iter().filter(|b| **b == b'\n').count() + 1;
                SourceUnit::failed(
                    relative_path,
                    ParseErrorKind::DecodeError,
                    format!("file is not valid UTF-8: {}", e),
                    Some(line),
                )
            }
        }
    }

    pub fn parse_source(&mut self, relative_path: &str, source: &str) -> SourceUnit {
        let Some(tree) = self.parser.parse(source, None) else {
            return SourceUnit::failed(
                relative_path,
                ParseErrorKind::UnexpectedParserFailure,
                "parser produced no syntax tree".to_string(),
                None,
            );
        };

        let root = tree.root_node();
        if root.has_error() {
            let (message, line) = describe_syntax_error(&tree, source);
            return SourceUnit::failed(relative_path, ParseErrorKind::SyntaxError, message, line);
        }

        let mut classes = Vec::new();
        let mut functions = Vec::new();

        let mut cursor = root.walk();
        for statement in root.named_children(&mut cursor) {
            let Some(definition) = unwrap_decorated(statement) else {
                continue;
            };

            match definition.kind() {
                "class_definition" => {
                    if let Some(class) = parse_class(definition, source) {
                        classes.push(class);
                    }
                }
                "function_definition" => {
                    if let Some(function) = parse_function(definition, source, false) {
                        functions.push(function);
                    }
                }
                _ => {}
            }
        }

        SourceUnit {
            relative_path: relative_path.to_string(),
            module: module_name(relative_path),
            module_docstring: extract_docstring(root, source),
            classes,
            functions,
            parse_error: None,
        }
    }
}

/// Resolves `@decorator` wrappers to the class or function they decorate.
fn unwrap_decorated(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "decorated_definition" => node.child_by_field_name("definition"),
        "class_definition" | "function_definition" => Some(node),
        _ => None,
    }
}

fn line_span(node: Node<'_>) -> (usize, usize) {
    let start = node.start_position();
    let end = node.end_position();
    let line_start = start.row + 1;
    let mut line_end = end.row + 1;
    if end.column == 0 && end.row > start.row {
        line_end -= 1;
    }
    (line_start, line_end.max(line_start))
}

fn parse_class(node: Node<'_>, source: &str) -> Option<ClassDecl> {
    let name = node_text(node.child_by_field_name("name")?, source)?;
    let body = node.child_by_field_name("body")?;
    let (line_start, line_end) = line_span(node);

    let mut methods = Vec::new();
    let mut cursor = body.walk();
    for statement in body.named_children(&mut cursor) {
        if let Some(definition) = unwrap_decorated(statement)
            && definition.kind() == "function_definition"
            && let Some(method) = parse_function(definition, source, true)
        {
            methods.push(method);
        }
    }

    Some(ClassDecl {
        name,
        line_start,
        line_end,
        docstring: extract_docstring(body, source),
        methods,
    })
}

fn parse_function(node: Node<'_>, source: &str, is_method: bool) -> Option<FunctionDecl> {
    let name = node_text(node.child_by_field_name("name")?, source)?;
    let (line_start, line_end) = line_span(node);

    let mut parameters = node
        .child_by_field_name("parameters")
        .map(|p| parse_parameters(p, source))
        .unwrap_or_default();

    if is_method && parameters.first().is_some_and(|p| p.name == "self") {
        parameters.remove(0);
    }

    let mut cursor = node.walk();
    let is_async = node.children(&mut cursor).any(|c| c.kind() == "async");

    Some(FunctionDecl {
        name,
        line_start,
        line_end,
        docstring: node
            .child_by_field_name("body")
            .and_then(|body| extract_docstring(body, source)),
        parameters,
        return_annotation: node
            .child_by_field_name("return_type")
            .and_then(|r| node_text(r, source)),
        is_method,
        is_async,
    })
}

/// Message and 1-based line of the first ERROR or MISSING node, in
/// document order.
fn describe_syntax_error(tree: &Tree, source: &str) -> (String, Option<usize>) {
    let mut cursor = tree.walk();

    loop {
        let node = cursor.node();

        if node.is_missing() {
            return (
                format!("invalid syntax: missing {}", node.kind()),
                Some(node.start_position().row + 1),
            );
        }

        if node.is_error() {
            let snippet: String = node
                .utf8_text(source.as_bytes())
                .unwrap_or_default()
                .lines()
                .next()
                .unwrap_or_default()
                .chars()
                .take(40)
                .collect();
            return (
                format!("invalid syntax near `{}`", snippet.trim()),
                Some(node.start_position().row + 1),
            );
        }

        if node.has_error() && cursor.goto_first_child() {
            continue;
        }

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return ("invalid syntax".to_string(), None);
            }
        }
    }
}
