//! Structural extraction of command candidates from a Rust syntax tree.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tree_sitter::{Language, Node, Parser};

use super::doc;
use super::{CommandInfo, ScanError, Shape};

/// `Result<(), E>`, optionally path-qualified (`io::Result<()>`, `anyhow::Result<()>`).
static RESULT_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_]*::)*Result<\(\)(?:,.+)?>$")
        .expect("return-type pattern is valid")
});

const OWNED_ARGS: &str = "Vec<String>";
const BORROWED_ARGS: &str = "&[String]";

fn rust_language() -> Language {
    tree_sitter_rust::LANGUAGE.into()
}

/// Candidates of one file plus the types it gives an `impl Default`, which
/// may belong to a type declared in another file.
#[derive(Debug, Default)]
pub(super) struct Parsed {
    pub commands: Vec<CommandInfo>,
    pub default_impls: Vec<String>,
}

pub(super) fn parse(path: &Path, source: &str) -> Result<Parsed, ScanError> {
    let mut parser = Parser::new();
    parser
        .set_language(&rust_language())
        .map_err(|e| ScanError::Grammar(e.to_string()))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ScanError::Grammar("parser produced no tree".into()))?;

    let root = tree.root_node();
    if root.has_error() {
        let at = first_error(root).unwrap_or(root).start_position();
        return Err(ScanError::Syntax {
            path: path.to_path_buf(),
            line: at.row + 1,
            column: at.column + 1,
        });
    }

    let mut parsed = Parsed::default();
    let mut cursor = root.walk();
    for item in root.named_children(&mut cursor) {
        match item.kind() {
            "function_item" => parsed.commands.extend(flat_function(item, source)),
            "struct_item" | "enum_item" | "type_item" => {
                parsed.commands.extend(namespace_type(item, source))
            }
            "impl_item" => match default_impl_target(item, source) {
                Some(target) => parsed.default_impls.push(target),
                None => parsed.commands.extend(impl_methods(item, source)),
            },
            _ => {}
        }
    }

    let local: HashSet<&str> = parsed.default_impls.iter().map(String::as_str).collect();
    for info in &mut parsed.commands {
        if let Shape::Type { default, .. } = &mut info.shape {
            *default |= local.contains(info.name.as_str());
        }
    }
    Ok(parsed)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    None
}

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}

fn compact(s: &str) -> String {
    s.split_whitespace().collect()
}

fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == kind)
}

/// Only a bare `pub` exports; `pub(crate)` and friends do not.
fn is_exported(item: Node<'_>, source: &str) -> bool {
    child_of_kind(item, "visibility_modifier").is_some_and(|v| text(v, source).trim() == "pub")
}

fn doc_comment(item: Node<'_>, source: &str) -> String {
    let mut comments = Vec::new();
    let mut prev = item.prev_sibling();
    while let Some(node) = prev {
        match node.kind() {
            "attribute_item" => {}
            "line_comment" | "block_comment" => {
                let comment = text(node, source).trim();
                if !doc::is_outer_doc(comment) {
                    break;
                }
                comments.push(comment);
            }
            _ => break,
        }
        prev = node.prev_sibling();
    }
    comments.reverse();
    doc::normalize(&comments)
}

/// Outer attributes directly above `item`, nearest last.
fn attributes<'s>(item: Node<'_>, source: &'s str) -> Vec<&'s str> {
    let mut attrs = Vec::new();
    let mut prev = item.prev_sibling();
    while let Some(node) = prev {
        match node.kind() {
            "attribute_item" => attrs.push(text(node, source)),
            "line_comment" | "block_comment" => {}
            _ => break,
        }
        prev = node.prev_sibling();
    }
    attrs.reverse();
    attrs
}

/// `#[derive(.., Default, ..)]`, also path-qualified.
fn derives_default(attr: &str) -> bool {
    let attr = compact(attr);
    let Some(list) = attr
        .strip_prefix("#[derive(")
        .and_then(|rest| rest.strip_suffix(")]"))
    else {
        return false;
    };
    list.split(',')
        .any(|name| name.rsplit("::").next() == Some("Default"))
}

fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

fn parameters<'t>(function: Node<'t>) -> Vec<Node<'t>> {
    let Some(params) = function.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter(|p| !matches!(p.kind(), "attribute_item" | "line_comment" | "block_comment"))
        .collect()
}

/// Signature problems shared by free functions and methods.
fn signature_problem(function: Node<'_>, source: &str) -> Option<String> {
    if let Some(modifiers) = child_of_kind(function, "function_modifiers") {
        return Some(format!(
            "`{}` functions are not supported",
            compact(text(modifiers, source))
        ));
    }
    if function.child_by_field_name("type_parameters").is_some() {
        return Some("generic functions are not supported".into());
    }
    if let Some(ret) = function.child_by_field_name("return_type") {
        let ret = compact(text(ret, source));
        if ret != "()" && !RESULT_UNIT.is_match(&ret) {
            return Some(format!("return type `{}` is not `()` or `Result<(), E>`", ret));
        }
    }
    None
}

fn flat_function(item: Node<'_>, source: &str) -> Option<CommandInfo> {
    if !is_exported(item, source) {
        return None;
    }
    let name = text(item.child_by_field_name("name")?, source).to_string();

    let shape = match signature_problem(item, source) {
        Some(problem) => Shape::Unsupported(problem),
        None => match parameters(item).as_slice() {
            [] => Shape::Unit,
            [param] if param.kind() == "parameter" => {
                let ty = param
                    .child_by_field_name("type")
                    .map(|t| compact(text(t, source)))
                    .unwrap_or_default();
                match ty.as_str() {
                    OWNED_ARGS => Shape::Variadic { borrowed: false },
                    BORROWED_ARGS => Shape::Variadic { borrowed: true },
                    _ => Shape::Unsupported(format!(
                        "parameter type `{}` is not `Vec<String>` or `&[String]`",
                        ty
                    )),
                }
            }
            _ => Shape::Unsupported(
                "parameters must be empty, `Vec<String>` or `&[String]`".into(),
            ),
        },
    };

    Some(CommandInfo {
        description: doc_comment(item, source),
        line: line_of(item),
        ..CommandInfo::flat(name, shape)
    })
}

fn namespace_type(item: Node<'_>, source: &str) -> Option<CommandInfo> {
    if !is_exported(item, source) {
        return None;
    }
    let name = text(item.child_by_field_name("name")?, source).to_string();
    let shape = if item.child_by_field_name("type_parameters").is_some() {
        Shape::Unsupported("generic namespace types are not supported".into())
    } else {
        Shape::Type {
            unit: item.kind() == "struct_item" && item.child_by_field_name("body").is_none(),
            default: attributes(item, source).into_iter().any(derives_default),
        }
    };

    Some(CommandInfo {
        description: doc_comment(item, source),
        line: line_of(item),
        ..CommandInfo::namespace_type(name, shape)
    })
}

/// Base identifier of an impl target with indirection and paths stripped.
fn base_type_name(node: Node<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "type_identifier" => Some(text(node, source).to_string()),
        "generic_type" | "reference_type" | "pointer_type" => {
            base_type_name(node.child_by_field_name("type")?, source)
        }
        "scoped_type_identifier" => base_type_name(node.child_by_field_name("name")?, source),
        _ => None,
    }
}

/// Target type of `impl Default for T`.
fn default_impl_target(item: Node<'_>, source: &str) -> Option<String> {
    let trait_ref = item.child_by_field_name("trait")?;
    if base_type_name(trait_ref, source)? != "Default" {
        return None;
    }
    base_type_name(item.child_by_field_name("type")?, source)
}

fn impl_methods(item: Node<'_>, source: &str) -> Vec<CommandInfo> {
    if item.child_by_field_name("trait").is_some() {
        return Vec::new();
    }
    let Some(namespace) = item
        .child_by_field_name("type")
        .and_then(|t| base_type_name(t, source))
    else {
        return Vec::new();
    };
    let Some(body) = item.child_by_field_name("body") else {
        return Vec::new();
    };
    let generic_impl = item.child_by_field_name("type_parameters").is_some();

    let mut methods = Vec::new();
    let mut cursor = body.walk();
    for function in body.named_children(&mut cursor) {
        if function.kind() != "function_item" || !is_exported(function, source) {
            continue;
        }
        let Some(name) = function.child_by_field_name("name") else {
            continue;
        };
        let params = parameters(function);
        // Associated functions (constructors and the like) are not commands.
        if params.first().is_none_or(|p| p.kind() != "self_parameter") {
            continue;
        }

        let shape = if generic_impl {
            Shape::Unsupported("methods of generic impl blocks are not supported".into())
        } else if let Some(problem) = signature_problem(function, source) {
            Shape::Unsupported(problem)
        } else if params.len() > 1 {
            Shape::Unsupported("methods must take only a `self` receiver".into())
        } else {
            Shape::Unit
        };

        methods.push(CommandInfo {
            description: doc_comment(function, source),
            line: line_of(function),
            ..CommandInfo::method(namespace.clone(), text(name, source), shape)
        });
    }
    methods
}
