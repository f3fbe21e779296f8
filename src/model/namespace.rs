//! Namespace tree holding global data.
//!
//! Nodes live in a flat arena owned by the tree; each node lists its children
//! and its members (indices into the program's global list). The tree is
//! built once after type resolution and sorted for deterministic iteration.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Index;

/// Handle of a node in a [`NamespaceTree`].
pub type NamespaceId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Last path component; empty for the root.
    pub name: String,
    pub parent: Option<NamespaceId>,
    pub children: Vec<NamespaceId>,
    /// Indices into [`crate::ProgramData::globals`].
    pub members: Vec<usize>,
}

impl Namespace {
    fn new(name: &str, parent: Option<NamespaceId>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceTree {
    nodes: Vec<Namespace>,
    by_path: HashMap<String, NamespaceId>,
}

impl NamespaceTree {
    pub const ROOT: NamespaceId = 0;

    pub fn new() -> Self {
        let mut by_path = HashMap::new();
        by_path.insert(String::new(), Self::ROOT);
        Self {
            nodes: vec![Namespace::new("", None)],
            by_path,
        }
    }

    pub fn root(&self) -> &Namespace {
        &self.nodes[Self::ROOT]
    }

    /// Node for a slash-delimited path, creating missing ancestors top-down.
    pub fn get_or_add(&mut self, path: &str) -> NamespaceId {
        let path = path.strip_prefix('/').unwrap_or(path);
        if let Some(id) = self.by_path.get(path) {
            return *id;
        }

        let (parent_path, name) = match path.rfind('/') {
            Some(index) => (&path[..index], &path[index + 1..]),
            None => ("", path),
        };
        let parent = self.get_or_add(parent_path);

        let id = self.nodes.len();
        self.nodes.push(Namespace::new(name, Some(parent)));
        self.nodes[parent].children.push(id);
        self.by_path.insert(path.to_string(), id);
        id
    }

    /// Existing node for a path.
    pub fn get(&self, path: &str) -> Option<NamespaceId> {
        let path = path.strip_prefix('/').unwrap_or(path);
        self.by_path.get(path).copied()
    }

    pub fn add_member(&mut self, id: NamespaceId, member: usize) {
        self.nodes[id].members.push(member);
    }

    /// Full slash-delimited path of a node.
    pub fn path_of(&self, id: NamespaceId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id];
            if node.parent.is_some() {
                parts.push(node.name.as_str());
            }
            current = node.parent;
        }
        parts.reverse();
        parts.join("/")
    }

    /// Sort every node's children by name and members by `member_order`.
    pub fn sort<F>(&mut self, mut member_order: F)
    where
        F: FnMut(&usize, &usize) -> Ordering,
    {
        let names: Vec<String> = self.nodes.iter().map(|n| n.name.clone()).collect();
        for node in &mut self.nodes {
            node.children
                .sort_by(|a, b| names[*a].cmp(&names[*b]).then(a.cmp(b)));
            node.members.sort_by(&mut member_order);
        }
    }

    /// Depth-first pre-order walk yielding `(depth, node)`.
    pub fn walk(&self) -> Vec<(usize, NamespaceId)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(0usize, Self::ROOT)];
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            for child in self.nodes[id].children.iter().rev() {
                stack.push((depth + 1, *child));
            }
        }
        out
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<NamespaceId> for NamespaceTree {
    type Output = Namespace;

    fn index(&self, id: NamespaceId) -> &Namespace {
        &self.nodes[id]
    }
}
