//! The option tree
//!
//! [`OptionTree`] owns the option hierarchy, resolves effective definitions
//! across the three layers and keeps both change caches consistent with the
//! records on every write.

use crate::arena::{Arena, Node};
use crate::config::TreeConfig;
use crate::error::{Result, TreeError};
use crate::memo::{AncestorMemo, AncestorSet, ChangeMarker};
use crate::record::{OptionMetadata, OptionRecord, RecordUpdate};
use crate::schema::{ElementSchema, SUBMODULE};
use indexmap::IndexMap;
use optree_core::{
    Attribute, Change, ChangeLayer, LayerSelection, OptionDefinition, Segment, UNDEFINED,
};
use std::str::FromStr;

/// Which descendants [`OptionTree::children`] returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildrenMode {
    /// Immediate children
    #[default]
    Direct,

    /// Descendants without children of their own
    Leaves,
}

impl FromStr for ChildrenMode {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "direct" => Ok(Self::Direct),
            "leaves" => Ok(Self::Leaves),
            other => Err(TreeError::invalid_argument(format!(
                "unknown children mode '{other}' (expected 'direct' or 'leaves')"
            ))),
        }
    }
}

/// Option hierarchy with layered definitions and change tracking
///
/// Built once from evaluator output, then edited in place. Nodes under a
/// `<name>` template position only serve as cloning sources and never show
/// up in enumeration or navigation.
///
/// # Invariants
/// - every non-root node's parent is its attribute minus the last segment
/// - an attribute is in the in-memory change cache iff its in-memory
///   definition differs from its configured definition
/// - every mutating call produces a new [`ChangeMarker`]
#[derive(Debug, Clone)]
pub struct OptionTree {
    arena: Arena,
    configured_change_cache: IndexMap<Attribute, OptionDefinition>,
    in_memory_change_cache: IndexMap<Attribute, OptionDefinition>,
    change_marker: ChangeMarker,
    memo: AncestorMemo,
    config: TreeConfig,
}

impl OptionTree {
    /// Build a tree from system option metadata and configured definitions
    pub fn new<S, C>(system_option_data: S, config_options: C) -> Self
    where
        S: IntoIterator<Item = (Attribute, OptionMetadata)>,
        C: IntoIterator<Item = (Attribute, OptionDefinition)>,
    {
        Self::with_config(TreeConfig::default(), system_option_data, config_options)
    }

    /// Build a tree with explicit configuration
    ///
    /// Configured definitions for attributes that are neither in the system
    /// metadata nor reachable through an attribute set template are logged
    /// and dropped.
    pub fn with_config<S, C>(tree_config: TreeConfig, system_option_data: S, config_options: C) -> Self
    where
        S: IntoIterator<Item = (Attribute, OptionMetadata)>,
        C: IntoIterator<Item = (Attribute, OptionDefinition)>,
    {
        let mut tree = Self {
            arena: Arena::with_root(OptionRecord::attribute_set()),
            configured_change_cache: IndexMap::new(),
            in_memory_change_cache: IndexMap::new(),
            change_marker: ChangeMarker::default(),
            memo: AncestorMemo::new(tree_config.memo_capacity),
            config: tree_config,
        };

        // ancestors and templates before the attributes that depend on them
        let mut system_option_data: Vec<_> = system_option_data.into_iter().collect();
        system_option_data.sort_by(|(a, _), (b, _)| a.cmp(b));
        let option_count = system_option_data.len();
        for (attribute, metadata) in system_option_data {
            tree.upsert_node_data(&attribute, metadata.into());
        }

        let mut ignored = 0usize;
        for (attribute, definition) in config_options {
            if !tree.is_known_option(&attribute) {
                tracing::warn!(%attribute, "not a valid option, ignored");
                ignored += 1;
                continue;
            }
            tree.upsert_node_data(&attribute, RecordUpdate::new().configured(definition.clone()));
            let differs = tree
                .arena
                .get(&attribute)
                .is_some_and(|node| node.record.system_default_definition != definition);
            if differs {
                tree.configured_change_cache.insert(attribute, definition);
            }
        }

        tracing::debug!(
            options = option_count,
            nodes = tree.arena.len(),
            configured_changes = tree.configured_change_cache.len(),
            ignored,
            "built option tree"
        );
        tree
    }

    /// Configuration the tree was built with
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Current mutation marker
    #[inline]
    #[must_use]
    pub fn change_marker(&self) -> ChangeMarker {
        self.change_marker
    }

    /// Number of nodes, templates and root included
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Check if the attribute has a node
    #[inline]
    #[must_use]
    pub fn contains(&self, attribute: &Attribute) -> bool {
        self.arena.contains(attribute)
    }

    fn bump_marker(&mut self) {
        self.change_marker = self.change_marker.next();
    }

    fn node(&self, attribute: &Attribute) -> Result<&Node> {
        self.arena
            .get(attribute)
            .ok_or_else(|| TreeError::NotFound(attribute.clone()))
    }

    fn element_schema(&self, attribute: &Attribute) -> Option<ElementSchema> {
        self.arena
            .get(attribute)
            .and_then(|node| node.record.option_type.as_deref())
            .and_then(ElementSchema::of)
    }

    /// Check if the attribute is present or reachable through a template
    ///
    /// Concrete names below an `attribute set of submodules` are matched
    /// against its `<name>` template; a scalar set admits exactly one more
    /// segment.
    fn is_known_option(&self, attribute: &Attribute) -> bool {
        let segments = attribute.segments();
        let mut schema_path = Attribute::root();
        for (index, segment) in segments.iter().enumerate() {
            let direct = schema_path.child(segment.clone());
            if self.arena.contains(&direct) {
                schema_path = direct;
                continue;
            }
            let is_last = index + 1 == segments.len();
            match self.element_schema(&schema_path) {
                Some(ElementSchema::Submodule) if !segment.is_placeholder() => {
                    let template = schema_path.child(Segment::Placeholder);
                    if !self.arena.contains(&template) {
                        return is_last;
                    }
                    schema_path = template;
                }
                Some(ElementSchema::Scalar(_)) if !segment.is_placeholder() => return is_last,
                _ => return false,
            }
        }
        true
    }

    /// Merge `update` into the node at `attribute`, creating missing branches
    fn upsert_node_data(&mut self, attribute: &Attribute, update: RecordUpdate) {
        if !self.arena.contains(attribute) {
            let mut parent = Attribute::root();
            for segment in attribute.iter() {
                let child = parent.child(segment.clone());
                if !self.arena.contains(&child) {
                    self.create_branch(&parent, &child);
                }
                parent = child;
            }
        }

        if let Some(node) = self.arena.get_mut(attribute) {
            node.record.merge(update);
        }
    }

    fn create_branch(&mut self, parent: &Attribute, child: &Attribute) {
        let is_template = child.last().is_some_and(Segment::is_placeholder);
        match self.element_schema(parent) {
            Some(schema) if !is_template => self.clone_template_branch(parent, child, &schema),
            _ => {
                self.arena.insert_child(child.clone(), OptionRecord::attribute_set());
            }
        }
    }

    /// Build a concrete element of the attribute set at `parent`
    fn clone_template_branch(&mut self, parent: &Attribute, child: &Attribute, schema: &ElementSchema) {
        let Some(parent_record) = self.arena.get(parent).map(|node| node.record.clone()) else {
            return;
        };
        let Some(name) = child.last().cloned() else {
            return;
        };

        let template = parent.child(Segment::Placeholder);
        let record = match schema {
            ElementSchema::Submodule if self.arena.contains(&template) => {
                let position = parent.len();
                let branch: Vec<(Attribute, OptionRecord)> = self
                    .arena
                    .subtree(&template)
                    .into_iter()
                    .filter_map(|attribute| {
                        let record = self.arena.get(attribute)?.record.schema_copy();
                        Some((attribute.with_segment(position, name.clone())?, record))
                    })
                    .collect();
                tracing::trace!(%template, %child, nodes = branch.len(), "cloned submodule template");
                for (attribute, record) in branch {
                    self.arena.insert_child(attribute, record);
                }
                return;
            }
            ElementSchema::Submodule => parent_record.element(SUBMODULE),
            ElementSchema::Scalar(element_type) => parent_record.element(element_type.as_str()),
        };
        tracing::trace!(%parent, %child, "created attribute set element");
        self.arena.insert_child(child.clone(), record);
    }

    fn update_in_memory_change_cache(&mut self, attribute: &Attribute, definition: OptionDefinition) {
        let differs = self.arena.get(attribute).is_some_and(|node| {
            node.record.in_memory_definition != node.record.configured_definition
        });
        if differs {
            self.in_memory_change_cache.insert(attribute.clone(), definition);
        } else {
            self.in_memory_change_cache.shift_remove(attribute);
        }
        self.bump_marker();
    }

    fn change_cache(&self, layer: ChangeLayer) -> &IndexMap<Attribute, OptionDefinition> {
        match layer {
            ChangeLayer::Configured => &self.configured_change_cache,
            ChangeLayer::InMemory => &self.in_memory_change_cache,
        }
    }

    /// Record of the attribute
    ///
    /// # Errors
    /// `NotFound` if the attribute has no node
    pub fn record(&self, attribute: &Attribute) -> Result<&OptionRecord> {
        self.node(attribute).map(|node| &node.record)
    }

    /// Effective definition: in-memory, else configured, else system default
    ///
    /// # Errors
    /// `NotFound` if the attribute has no node
    pub fn get_definition(&self, attribute: &Attribute) -> Result<&OptionDefinition> {
        self.resolve_definition(attribute, LayerSelection::ALL)
    }

    /// Effective definition over the selected layers
    ///
    /// The system default always takes part; the undefined sentinel is
    /// returned when no selected layer defines the option.
    ///
    /// # Errors
    /// `NotFound` if the attribute has no node
    pub fn resolve_definition(
        &self,
        attribute: &Attribute,
        selection: LayerSelection,
    ) -> Result<&OptionDefinition> {
        let record = self.record(attribute)?;
        if selection.include_in_memory && record.in_memory_definition.is_defined() {
            return Ok(&record.in_memory_definition);
        }
        if selection.include_configured && record.configured_definition.is_defined() {
            return Ok(&record.configured_definition);
        }
        if record.system_default_definition.is_defined() {
            return Ok(&record.system_default_definition);
        }
        Ok(&UNDEFINED)
    }

    /// In-memory layer of the attribute
    ///
    /// # Errors
    /// `NotFound` if the attribute has no node
    pub fn get_in_memory_definition(&self, attribute: &Attribute) -> Result<&OptionDefinition> {
        self.record(attribute).map(|record| &record.in_memory_definition)
    }

    /// Configured layer of the attribute
    ///
    /// # Errors
    /// `NotFound` if the attribute has no node
    pub fn get_configured_definition(&self, attribute: &Attribute) -> Result<&OptionDefinition> {
        self.record(attribute).map(|record| &record.configured_definition)
    }

    /// System default of the attribute
    ///
    /// # Errors
    /// `NotFound` if the attribute has no node
    pub fn get_system_default_definition(&self, attribute: &Attribute) -> Result<&OptionDefinition> {
        self.record(attribute).map(|record| &record.system_default_definition)
    }

    /// Type descriptor of the attribute
    ///
    /// # Errors
    /// `NotFound` if the attribute has no node
    pub fn get_type(&self, attribute: &Attribute) -> Result<Option<&str>> {
        self.record(attribute).map(|record| record.option_type.as_deref())
    }

    /// Description of the attribute
    ///
    /// # Errors
    /// `NotFound` if the attribute has no node
    pub fn get_description(&self, attribute: &Attribute) -> Result<Option<&str>> {
        self.record(attribute).map(|record| record.description.as_deref())
    }

    /// Read-only flag of the attribute
    ///
    /// # Errors
    /// `NotFound` if the attribute has no node
    pub fn is_readonly(&self, attribute: &Attribute) -> Result<Option<bool>> {
        self.record(attribute).map(|record| record.read_only)
    }

    /// Set the in-memory definition, creating the attribute if needed
    ///
    /// Setting the configured definition back removes the attribute from
    /// the in-memory change set.
    pub fn set_definition(&mut self, attribute: &Attribute, definition: OptionDefinition) {
        tracing::trace!(%attribute, %definition, "set in-memory definition");
        self.upsert_node_data(attribute, RecordUpdate::new().in_memory(definition.clone()));
        self.update_in_memory_change_cache(attribute, definition);
    }

    /// Materialize the attribute and any missing ancestors without defining it
    pub fn insert_attribute(&mut self, attribute: &Attribute) {
        tracing::trace!(%attribute, "insert attribute");
        self.upsert_node_data(attribute, RecordUpdate::new());
        self.bump_marker();
    }

    /// Move the attribute and its whole subtree to `new`
    ///
    /// Records are preserved and change cache entries under the old path are
    /// re-keyed to the new path.
    ///
    /// # Errors
    /// - `NotFound` if `old` or the parent of `new` is missing
    /// - `InvalidArgument` if `old` is the root or `new` lies within `old`
    /// - `AlreadyExists` if `new` is taken
    pub fn rename_attribute(&mut self, old: &Attribute, new: &Attribute) -> Result<()> {
        if !self.arena.contains(old) {
            return Err(TreeError::NotFound(old.clone()));
        }
        if old.is_empty() {
            return Err(TreeError::invalid_argument("cannot rename the root attribute"));
        }
        if old.is_prefix_of(new) {
            return Err(TreeError::invalid_argument(format!(
                "cannot rename '{old}' into its own subtree '{new}'"
            )));
        }
        if self.arena.contains(new) {
            return Err(TreeError::AlreadyExists(new.clone()));
        }
        let new_parent = new.parent().unwrap_or_default();
        if !self.arena.contains(&new_parent) {
            return Err(TreeError::NotFound(new_parent));
        }

        self.arena.relabel_subtree(old, new);
        for cache in [&mut self.configured_change_cache, &mut self.in_memory_change_cache] {
            *cache = cache
                .drain(..)
                .map(|(attribute, definition)| {
                    (attribute.replace_prefix(old, new).unwrap_or(attribute), definition)
                })
                .collect();
        }
        self.bump_marker();
        tracing::trace!(%old, %new, "renamed attribute");
        Ok(())
    }

    /// Check if the attribute is in the change cache of `layer`
    #[must_use]
    pub fn has_pending_change(&self, attribute: &Attribute, layer: ChangeLayer) -> bool {
        self.change_cache(layer).contains_key(attribute)
    }

    /// Changed options of one layer with their baseline definitions
    ///
    /// Configured changes are diffed against system defaults, in-memory
    /// changes against configured-or-default. Entries equal to a freshly
    /// resolved baseline are skipped. Each call starts a new pass.
    pub fn iter_changes(&self, layer: ChangeLayer) -> impl Iterator<Item = Change<'_>> + '_ {
        let baseline = LayerSelection::baseline(layer);
        self.change_cache(layer)
            .iter()
            .filter_map(move |(attribute, new)| {
                let old = self.resolve_definition(attribute, baseline).ok()?;
                (new != old).then(|| Change::new(attribute, old, new))
            })
    }

    /// Strict ancestors of every changed option in one layer
    ///
    /// Memoized per change marker.
    pub fn get_change_set_with_ancestors(&self, layer: ChangeLayer) -> AncestorSet {
        self.memo.get_or_compute(layer, self.change_marker, || {
            self.iter_changes(layer)
                .flat_map(|change| change.attribute.ancestors())
                .collect()
        })
    }

    /// All non-template attributes with their records
    pub fn iter_attribute_data(&self) -> impl Iterator<Item = (&Attribute, &OptionRecord)> {
        self.arena
            .iter()
            .filter(|(_, node)| !node.is_template)
            .map(|(attribute, node)| (attribute, &node.record))
    }

    /// All non-template attributes
    pub fn iter_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.iter_attribute_data().map(|(attribute, _)| attribute)
    }

    /// Children of the attribute, templates excluded
    ///
    /// `Leaves` yields strict descendants only: a childless attribute is not
    /// its own leaf, so asking for the leaves of a leaf gives nothing.
    ///
    /// # Errors
    /// `NotFound` if the attribute has no node
    pub fn children(
        &self,
        attribute: &Attribute,
        mode: ChildrenMode,
    ) -> Result<Vec<(&Attribute, &OptionRecord)>> {
        let node = self.node(attribute)?;
        let candidates: Vec<&Attribute> = match mode {
            ChildrenMode::Direct => node.children.iter().collect(),
            ChildrenMode::Leaves => self.arena.leaves(attribute),
        };
        Ok(candidates
            .into_iter()
            .filter_map(|child| self.arena.get(child).map(|node| (child, node)))
            .filter(|(_, node)| !node.is_template)
            .map(|(child, node)| (child, &node.record))
            .collect())
    }

    /// Follow single-child chains down from the attribute
    ///
    /// Stops at the first node with zero or several (non-template) children.
    ///
    /// # Errors
    /// `NotFound` if the attribute has no node
    pub fn get_next_branching_option(&self, attribute: &Attribute) -> Result<Attribute> {
        let mut current = attribute.clone();
        loop {
            let children = self.children(&current, ChildrenMode::Direct)?;
            match children.as_slice() {
                [(only, _)] => current = (*only).clone(),
                _ => return Ok(current),
            }
        }
    }
}
