//! Node storage for the option tree
//!
//! Nodes live in an insertion-ordered map keyed by [`Attribute`], each with an
//! explicit parent link and child set. Structural operations (subtree walks,
//! relabelling) work directly on the index.

use crate::record::OptionRecord;
use indexmap::IndexMap;
use optree_core::Attribute;
use std::collections::BTreeSet;

/// One option tree node
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) record: OptionRecord,
    pub(crate) parent: Option<Attribute>,
    pub(crate) children: BTreeSet<Attribute>,
    /// Node lies under a `<name>` template position
    pub(crate) is_template: bool,
}

impl Node {
    fn new(attribute: &Attribute, record: OptionRecord) -> Self {
        Self {
            record,
            parent: attribute.parent(),
            children: BTreeSet::new(),
            is_template: attribute.has_placeholder(),
        }
    }
}

/// Attribute-indexed node arena, always containing the root
#[derive(Debug, Clone)]
pub(crate) struct Arena {
    nodes: IndexMap<Attribute, Node>,
}

impl Arena {
    pub(crate) fn with_root(record: OptionRecord) -> Self {
        let root = Attribute::root();
        let mut nodes = IndexMap::new();
        nodes.insert(root.clone(), Node::new(&root, record));
        Self { nodes }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn contains(&self, attribute: &Attribute) -> bool {
        self.nodes.contains_key(attribute)
    }

    pub(crate) fn get(&self, attribute: &Attribute) -> Option<&Node> {
        self.nodes.get(attribute)
    }

    pub(crate) fn get_mut(&mut self, attribute: &Attribute) -> Option<&mut Node> {
        self.nodes.get_mut(attribute)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Attribute, &Node)> {
        self.nodes.iter()
    }

    /// Insert a node below its (existing) parent
    ///
    /// Returns `false` without touching the arena when the attribute is
    /// already present or its parent is missing.
    pub(crate) fn insert_child(&mut self, attribute: Attribute, record: OptionRecord) -> bool {
        let Some(parent) = attribute.parent() else {
            return false;
        };
        if self.nodes.contains_key(&attribute) {
            return false;
        }
        let Some(parent_node) = self.nodes.get_mut(&parent) else {
            return false;
        };
        parent_node.children.insert(attribute.clone());
        let node = Node::new(&attribute, record);
        self.nodes.insert(attribute, node);
        true
    }

    /// Attributes of the subtree rooted at `attribute`, parents before children
    pub(crate) fn subtree(&self, attribute: &Attribute) -> Vec<&Attribute> {
        let mut out = Vec::new();
        let Some((root, _)) = self.nodes.get_key_value(attribute) else {
            return out;
        };
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Strict descendants of `attribute` that have no children
    pub(crate) fn leaves(&self, attribute: &Attribute) -> Vec<&Attribute> {
        self.subtree(attribute)
            .into_iter()
            .filter(|attr| *attr != attribute)
            .filter(|attr| self.nodes.get(*attr).is_some_and(|node| node.children.is_empty()))
            .collect()
    }

    /// Move the subtree at `old` to `new`, keeping records and arena positions
    ///
    /// The caller guarantees `old` exists and is not the root, `new` is free
    /// and outside the subtree, and `new`'s parent exists.
    pub(crate) fn relabel_subtree(&mut self, old: &Attribute, new: &Attribute) {
        let (Some(old_parent), Some(new_parent)) = (old.parent(), new.parent()) else {
            return;
        };
        let subtree: Vec<Attribute> = self.subtree(old).into_iter().cloned().collect();
        if subtree.is_empty() {
            return;
        }

        if let Some(parent) = self.nodes.get_mut(&old_parent) {
            parent.children.remove(old);
        }

        for attribute in subtree {
            let Some(relabelled) = attribute.replace_prefix(old, new) else {
                continue;
            };
            let Some((index, _, mut node)) = self.nodes.shift_remove_full(&attribute) else {
                continue;
            };
            node.parent = if attribute == *old {
                Some(new_parent.clone())
            } else {
                node.parent
                    .and_then(|parent| parent.replace_prefix(old, new))
            };
            node.children = node
                .children
                .into_iter()
                .filter_map(|child| child.replace_prefix(old, new))
                .collect();
            node.is_template = relabelled.has_placeholder();
            self.nodes.shift_insert(index, relabelled, node);
        }

        if let Some(parent) = self.nodes.get_mut(&new_parent) {
            parent.children.insert(new.clone());
        }
    }
}
