//! Serializer: renders a [`ConfigTree`] back to configuration text.

use std::borrow::Cow;

use generational_arena::Index;

use crate::domain::arena::{ConfigNode, ConfigTree, NodeKind};

const INDENT: &str = "    ";

pub fn render(tree: &ConfigTree) -> String {
    let mut out = String::new();
    render_children(tree, tree.root(), 0, &mut out);
    for line in tree.footer() {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn render_children(tree: &ConfigTree, idx: Index, depth: usize, out: &mut String) {
    for (child_idx, node) in tree.children(idx) {
        render_node(tree, child_idx, node, depth, out);
    }
}

fn render_node(tree: &ConfigTree, idx: Index, node: &ConfigNode, depth: usize, out: &mut String) {
    match node.kind {
        NodeKind::Leaf => {
            write_comment(node.comment.as_deref(), depth, out);
            match &node.value {
                None => write_line(depth, &node.name, out),
                Some(value) => {
                    for v in value.as_slice() {
                        write_line(depth, &format!("{} {}", node.name, quote(v)), out);
                    }
                }
            }
        }
        NodeKind::Tag if !node.children.is_empty() => {
            write_comment(node.comment.as_deref(), depth, out);
            for (child_idx, child) in tree.children(idx) {
                write_comment(child.comment.as_deref(), depth, out);
                let header = format!("{} {}", node.name, quote(&child.name));
                write_block(tree, child_idx, &header, depth, out);
            }
        }
        // An empty tag node has no inline form left
        NodeKind::Node | NodeKind::Tag => {
            write_comment(node.comment.as_deref(), depth, out);
            write_block(tree, idx, &node.name, depth, out);
        }
    }
}

fn write_block(tree: &ConfigTree, idx: Index, header: &str, depth: usize, out: &mut String) {
    write_line(depth, &format!("{} {{", header), out);
    render_children(tree, idx, depth + 1, out);
    write_line(depth, "}", out);
}

fn write_comment(comment: Option<&str>, depth: usize, out: &mut String) {
    if let Some(text) = comment {
        write_line(depth, &format!("/* {} */", text), out);
    }
}

fn write_line(depth: usize, text: &str, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

/// Quote a value unless it lexes back as a single bare word. Values holding
/// `;`, `#` or `'` are always quoted.
fn quote(value: &str) -> Cow<'_, str> {
    let needs_quotes = value.is_empty()
        || value.starts_with("/*")
        || value.starts_with("//")
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '"' | '\\' | ';' | '#' | '\''));
    if !needs_quotes {
        return Cow::Borrowed(value);
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    Cow::Owned(format!("\"{}\"", escaped))
}
