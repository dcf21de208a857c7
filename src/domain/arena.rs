//! Arena-backed configuration tree.

use std::fmt;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ConfigPath;

/// How a node is written in the text format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Plain container: `name { ... }`
    Node,
    /// Container whose children are written inline: `name child { ... }`
    Tag,
    /// Value holder: `name`, `name value`, or repeated `name value` lines
    Leaf,
}

/// Value carried by a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    Scalar(String),
    List(Vec<String>),
}

impl NodeValue {
    pub fn as_slice(&self) -> &[String] {
        match self {
            NodeValue::Scalar(v) => std::slice::from_ref(v),
            NodeValue::List(vs) => vs,
        }
    }

    /// Append a value, promoting a scalar to a list.
    pub fn push(&mut self, value: String) {
        match self {
            NodeValue::Scalar(first) => {
                let first = std::mem::take(first);
                *self = NodeValue::List(vec![first, value]);
            }
            NodeValue::List(vs) => vs.push(value),
        }
    }
}

/// One entry of the configuration tree.
#[derive(Debug)]
pub struct ConfigNode {
    pub name: String,
    pub kind: NodeKind,
    pub value: Option<NodeValue>,
    /// Text of a `/* ... */` comment preceding the node
    pub comment: Option<String>,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in insertion order
    pub children: Vec<Index>,
}

impl ConfigNode {
    fn new(name: String, kind: NodeKind, parent: Option<Index>) -> Self {
        Self {
            name,
            kind,
            value: None,
            comment: None,
            parent,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }
}

/// Hierarchical configuration document.
///
/// Nodes live in a generational arena; sibling order is the order of the
/// parent's `children` vector. Sibling names are unique: the parser rejects
/// duplicates and nothing else inserts nodes.
#[derive(Debug)]
pub struct ConfigTree {
    arena: Arena<ConfigNode>,
    root: Index,
    /// Root-level `//` lines, emitted after the last node
    footer: Vec<String>,
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigTree {
    /// Create an empty document.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(ConfigNode::new(String::new(), NodeKind::Node, None));
        Self {
            arena,
            root,
            footer: Vec::new(),
        }
    }

    /// Parse configuration text into a tree.
    pub fn parse(text: &str) -> DomainResult<Self> {
        crate::domain::parser::parse(text).map_err(DomainError::from)
    }

    /// Render the tree back to configuration text.
    pub fn serialize(&self) -> String {
        crate::domain::render::render(self)
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn get_node(&self, idx: Index) -> Option<&ConfigNode> {
        self.arena.get(idx)
    }

    pub fn footer(&self) -> &[String] {
        &self.footer
    }

    /// Number of live nodes, root excluded.
    pub fn node_count(&self) -> usize {
        self.arena.len() - 1
    }

    /// Children of `idx` in order.
    pub fn children(&self, idx: Index) -> impl Iterator<Item = (Index, &ConfigNode)> + '_ {
        self.arena
            .get(idx)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|&child| self.arena.get(child).map(|node| (child, node)))
    }

    pub fn child_by_name(&self, idx: Index, name: &str) -> Option<Index> {
        self.children(idx)
            .find(|(_, node)| node.name == name)
            .map(|(child, _)| child)
    }

    /// Walk `path` from the root.
    #[instrument(level = "trace", skip(self, path), fields(path = %path))]
    pub fn resolve(&self, path: &ConfigPath) -> Option<Index> {
        path.segments()
            .iter()
            .try_fold(self.root, |idx, segment| self.child_by_name(idx, segment))
    }

    pub fn get(&self, path: &ConfigPath) -> Option<&ConfigNode> {
        self.resolve(path).and_then(|idx| self.arena.get(idx))
    }

    /// Whether a node is reachable at `path`. Never fails.
    pub fn exists(&self, path: &ConfigPath) -> bool {
        self.resolve(path).is_some()
    }

    /// Child names directly under `path`, in document order.
    #[instrument(level = "trace", skip(self, path), fields(path = %path))]
    pub fn list_nodes(&self, path: &ConfigPath) -> DomainResult<Vec<String>> {
        let idx = self
            .resolve(path)
            .ok_or_else(|| DomainError::NotFound(path.clone()))?;
        Ok(self.children(idx).map(|(_, node)| node.name.clone()).collect())
    }

    /// Remove the node at `path` together with its whole subtree.
    #[instrument(level = "debug", skip(self, path), fields(path = %path))]
    pub fn delete(&mut self, path: &ConfigPath) -> DomainResult<()> {
        let Some((parent_path, name)) = path.split_last() else {
            return Err(DomainError::InvalidPath(
                "cannot delete the root node".to_string(),
            ));
        };
        let (parent_idx, idx) = self
            .resolve(&parent_path)
            .and_then(|parent| Some((parent, self.child_by_name(parent, name)?)))
            .ok_or_else(|| DomainError::NotFound(path.clone()))?;

        if let Some(parent) = self.arena.get_mut(parent_idx) {
            parent.children.retain(|&child| child != idx);
        }

        let mut pending = vec![idx];
        let mut removed = 0usize;
        while let Some(current) = pending.pop() {
            if let Some(node) = self.arena.remove(current) {
                pending.extend(node.children);
                removed += 1;
            }
        }
        debug!("deleted {} node(s) at {}", removed, path);
        Ok(())
    }

    /// First value of the leaf at `path`.
    pub fn return_value(&self, path: &ConfigPath) -> Option<&str> {
        self.get(path)
            .and_then(|node| node.value.as_ref())
            .and_then(|value| value.as_slice().first())
            .map(String::as_str)
    }

    /// All values of the leaf at `path`, empty if absent or valueless.
    pub fn return_values(&self, path: &ConfigPath) -> Vec<&str> {
        self.get(path)
            .and_then(|node| node.value.as_ref())
            .map(|value| value.as_slice().iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub(crate) fn insert_node(&mut self, parent: Index, name: String, kind: NodeKind) -> Index {
        let idx = self.arena.insert(ConfigNode::new(name, kind, Some(parent)));
        if let Some(parent) = self.arena.get_mut(parent) {
            parent.children.push(idx);
        }
        idx
    }

    pub(crate) fn get_node_mut(&mut self, idx: Index) -> Option<&mut ConfigNode> {
        self.arena.get_mut(idx)
    }

    pub(crate) fn push_footer(&mut self, line: String) {
        self.footer.push(line);
    }

    fn subtree_eq(&self, idx: Index, other: &ConfigTree, other_idx: Index) -> bool {
        let (Some(a), Some(b)) = (self.arena.get(idx), other.arena.get(other_idx)) else {
            return false;
        };
        a.name == b.name
            && a.is_leaf() == b.is_leaf()
            && a.value == b.value
            && a.comment == b.comment
            && a.children.len() == b.children.len()
            && a
                .children
                .iter()
                .zip(&b.children)
                .all(|(&ca, &cb)| self.subtree_eq(ca, other, cb))
    }
}

/// Structural equivalence: same paths, values, comments and child order.
/// Tag and plain containers compare equal.
impl PartialEq for ConfigTree {
    fn eq(&self, other: &Self) -> bool {
        self.footer == other.footer && self.subtree_eq(self.root, other, other.root)
    }
}

impl Eq for ConfigTree {}

impl fmt::Display for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}
