// file: src/parser/signature.rs
// description: parameter list and annotation extraction from function definitions
// reference: tree-sitter-python grammar node kinds

use crate::models::{ParamInfo, ParamKind};
use tree_sitter::Node;

/// Source text of an annotation or expression with whitespace runs collapsed,
/// so multi-line annotations read as one line.
pub fn node_text(node: Node<'_>, source: &str) -> Option<String> {
    let text = node.utf8_text(source.as_bytes()).ok()?;
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() { None } else { Some(collapsed) }
}

pub fn parse_parameters(parameters: Node<'_>, source: &str) -> Vec<ParamInfo> {
    let mut params: Vec<ParamInfo> = Vec::new();
    let mut keyword_only = false;

    let mut cursor = parameters.walk();
    for child in parameters.named_children(&mut cursor) {
        match child.kind() {
            "comment" => continue,
            "positional_separator" => {
                for param in params.iter_mut() {
                    if param.kind == ParamKind::Positional {
                        param.kind = ParamKind::PositionalOnly;
                    }
                }
                continue;
            }
            "keyword_separator" => {
                keyword_only = true;
                continue;
            }
            _ => {}
        }

        if let Some(param) = parse_parameter(child, source, keyword_only) {
            if param.kind == ParamKind::VarPositional {
                keyword_only = true;
            }
            params.push(param);
        }
    }

    params
}

fn parse_parameter(node: Node<'_>, source: &str, keyword_only: bool) -> Option<ParamInfo> {
    let plain_kind = if keyword_only {
        ParamKind::KeywordOnly
    } else {
        ParamKind::Positional
    };

    match node.kind() {
        "identifier" | "tuple_pattern" => Some(ParamInfo {
            name: node_text(node, source)?,
            type_annotation: None,
            has_default: false,
            kind: plain_kind,
        }),
        "list_splat_pattern" | "dictionary_splat_pattern" => Some(ParamInfo {
            name: splat_name(node, source)?,
            type_annotation: None,
            has_default: false,
            kind: splat_kind(node.kind()),
        }),
        "typed_parameter" => {
            let mut cursor = node.walk();
            let target = node.named_children(&mut cursor).next()?;
            let annotation = node
                .child_by_field_name("type")
                .and_then(|t| node_text(t, source));

            let (name, kind) = match target.kind() {
                "list_splat_pattern" | "dictionary_splat_pattern" => {
                    (splat_name(target, source)?, splat_kind(target.kind()))
                }
                _ => (node_text(target, source)?, plain_kind),
            };

            Some(ParamInfo {
                name,
                type_annotation: annotation,
                has_default: false,
                kind,
            })
        }
        "default_parameter" | "typed_default_parameter" => Some(ParamInfo {
            name: node_text(node.child_by_field_name("name")?, source)?,
            type_annotation: node
                .child_by_field_name("type")
                .and_then(|t| node_text(t, source)),
            has_default: true,
            kind: plain_kind,
        }),
        _ => None,
    }
}

fn splat_kind(kind: &str) -> ParamKind {
    if kind == "dictionary_splat_pattern" {
        ParamKind::VarKeyword
    } else {
        ParamKind::VarPositional
    }
}

fn splat_name(node: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    let inner = node.named_children(&mut cursor).next();
    match inner {
        Some(ident) => node_text(ident, source),
        None => node_text(node, source).map(|t| t.trim_start_matches('*').to_string()),
    }
}
