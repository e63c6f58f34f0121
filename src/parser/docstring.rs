// file: src/parser/docstring.rs
// description: docstring detection, literal decoding and indentation cleanup
// reference: python documentation conventions (PEP 257)

use tree_sitter::Node;

/// Returns the cleaned docstring of a body (`module` or `block` node).
///
/// Only the first statement counts, and only when it is a bare string
/// literal. Formatted and bytes literals are never docstrings. An empty
/// docstring is reported as absent.
pub fn extract_docstring(body: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment")?;

    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }

    let mut inner_cursor = first.walk();
    let expr = first.named_children(&mut inner_cursor).next()?;

    let raw = match expr.kind() {
        "string" => string_value(expr, source)?,
        "concatenated_string" => {
            let mut parts_cursor = expr.walk();
            let mut joined = String::new();
            for part in expr.named_children(&mut parts_cursor) {
                if part.kind() == "comment" {
                    continue;
                }
                joined.push_str(&string_value(part, source)?);
            }
            joined
        }
        _ => return None,
    };

    let cleaned = clean_docstring(&raw);
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Decoded value of a single `string` node, or `None` for f-strings and bytes.
fn string_value(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    let start = children.iter().find(|c| c.kind() == "string_start")?;
    let end = children.iter().rev().find(|c| c.kind() == "string_end")?;

    let opener = start.utf8_text(source.as_bytes()).ok()?;
    let prefix: String = opener
        .chars()
        .take_while(|c| *c != '"' && *c != '\'')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if prefix.contains('f') || prefix.contains('b') || prefix.contains('t') {
        return None;
    }

    let body = source.get(start.end_byte()..end.start_byte())?;
    if prefix.contains('r') {
        Some(body.to_string())
    } else {
        Some(unescape(body))
    }
}

/// Resolves backslash escapes the way a non-raw Python `str` literal does.
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };

        match next {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0B}'),
            '0'..='7' => {
                let mut digits = String::from(next);
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(d @ '0'..='7') => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                push_code_point(&mut out, u32::from_str_radix(&digits, 8).ok(), &digits, '\\');
            }
            'x' => take_hex(&mut chars, &mut out, 2, 'x'),
            'u' => take_hex(&mut chars, &mut out, 4, 'u'),
            'U' => take_hex(&mut chars, &mut out, 8, 'U'),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

fn take_hex(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    out: &mut String,
    width: usize,
    marker: char,
) {
    let mut digits = String::with_capacity(width);
    while digits.len() < width {
        match chars.peek() {
            Some(d) if d.is_ascii_hexdigit() => {
                digits.push(*d);
                chars.next();
            }
            _ => break,
        }
    }

    if digits.len() == width {
        push_code_point(out, u32::from_str_radix(&digits, 16).ok(), &digits, marker);
    } else {
        out.push('\\');
        out.push(marker);
        out.push_str(&digits);
    }
}

fn push_code_point(out: &mut String, value: Option<u32>, digits: &str, marker: char) {
    match value.and_then(char::from_u32) {
        Some(ch) => out.push(ch),
        None => {
            out.push('\\');
            if marker != '\\' {
                out.push(marker);
            }
            out.push_str(digits);
        }
    }
}

/// Same normalisation as Python's `inspect.cleandoc`: expand tabs, drop the
/// common indentation of every line after the first, strip the first line and
/// remove leading and trailing blank lines.
pub fn clean_docstring(doc: &str) -> String {
    let expanded: Vec<String> = doc.split('\n').map(expand_tabs).collect();

    let margin = expanded
        .iter()
        .skip(1)
        .filter(|line| !line.trim_start().is_empty())
        .map(|line| indent_width(line))
        .min();

    let mut lines: Vec<String> = Vec::with_capacity(expanded.len());
    for (idx, line) in expanded.into_iter().enumerate() {
        if idx == 0 {
            lines.push(line.trim_start().to_string());
        } else if let Some(margin) = margin {
            let strip = margin.min(indent_width(&line));
            lines.push(line.chars().skip(strip).collect());
        } else {
            lines.push(line);
        }
    }

    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| l.trim().is_empty()).count();

    lines[leading..].join("\n")
}

/// Leading whitespace measured in characters, so multi-byte spaces such as
/// U+3000 count once.
fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + 8);
    let mut column = 0;
    for c in line.chars() {
        match c {
            '\t' => {
                let pad = 8 - (column % 8);
                out.extend(std::iter::repeat_n(' ', pad));
                column += pad;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_docstring_dedents_body() {
        let raw = "Summary line.\n\n        Details here.\n          indented more.\n    ";
        assert_eq!(
            clean_docstring(raw),
            "Summary line.\n\nDetails here.\n  indented more."
        );
    }

    #[test]
    fn test_clean_docstring_strips_blank_edges() {
        assert_eq!(clean_docstring("\n\n    Hello.\n\n"), "Hello.");
        assert_eq!(clean_docstring("   "), "");
    }

    #[test]
    fn test_clean_docstring_expands_tabs() {
        assert_eq!(clean_docstring("Top.\n\tBody."), "Top.\nBody.");
    }

    #[test]
    fn test_clean_docstring_multibyte_indent() {
        assert_eq!(clean_docstring("Top.\n \n a\n\u{3000}b\n    "), "Top.\n\na\nb");
        assert_eq!(
            clean_docstring("Top.\n\u{a0}\u{a0}deep\n\u{a0}shallow"),
            "Top.\n\u{a0}deep\nshallow"
        );
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"line\nnext"), "line\nnext");
        assert_eq!(unescape(r"tab\there"), "tab\there");
        assert_eq!(unescape(r"quote \' and \\"), "quote ' and \\");
        assert_eq!(unescape(r"\x41é\101"), "AéA");
        assert_eq!(unescape("keep\\\njoined"), "keepjoined");
        assert_eq!(unescape(r"unknown \d escape"), r"unknown \d escape");
    }

    #[test]
    fn test_unescape_keeps_named_escapes() {
        assert_eq!(unescape(r"\N{BULLET} item"), r"\N{BULLET} item");
    }
}
