//! optree Option Tree
//!
//! Hierarchical store of system configuration options that reconciles three
//! sources of truth for every option: the system default, the value committed
//! to the configuration file, and the value set in the current editing
//! session.
//!
//! # Core Operations
//!
//! - **Build**: ingest evaluator metadata and configured definitions once
//! - **Resolve**: in-memory > configured > system default > undefined
//! - **Edit**: set in-memory definitions, insert and rename attributes
//! - **Diff**: enumerate changes per layer and the ancestors of changed options
//!
//! # Architecture
//!
//! ```text
//! SystemOptionData ─┐                       ┌→ iter_changes(layer)
//!                   ├→ OptionTree (arena) ──┤
//! ConfigOptions ────┘        ↑              └→ get_change_set_with_ancestors(layer)
//!                    set_definition / insert_attribute / rename_attribute
//! ```
//!
//! # Example
//!
//! ```rust
//! use optree::{OptionMetadata, OptionTree};
//! use optree_core::{Attribute, ChangeLayer, OptionDefinition};
//!
//! let enable: Attribute = "services.openssh.enable".parse().unwrap();
//! let mut tree = OptionTree::new(
//!     [(enable.clone(), OptionMetadata::new("boolean").with_default(OptionDefinition::value(false)))],
//!     [(enable.clone(), OptionDefinition::value(true))],
//! );
//!
//! tree.set_definition(&enable, OptionDefinition::value(false));
//! let changes: Vec<_> = tree.iter_changes(ChangeLayer::InMemory).collect();
//! assert_eq!(changes.len(), 1);
//! assert_eq!(changes[0].old, &OptionDefinition::value(true));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
mod arena;
pub mod config;
pub mod error;
pub mod input;
pub mod memo;
pub mod record;
pub mod schema;
pub mod tree;

// Re-exports for convenience
pub use config::TreeConfig;
pub use error::{Result, TreeError};
pub use input::{ConfigOptions, InputError, SystemOptionData};
pub use memo::{AncestorSet, ChangeMarker};
pub use record::{OptionMetadata, OptionRecord, RecordUpdate};
pub use schema::ElementSchema;
pub use tree::{ChildrenMode, OptionTree};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the option tree
    pub use crate::input::{ConfigOptions, SystemOptionData};
    pub use crate::record::{OptionMetadata, OptionRecord};
    pub use crate::tree::{ChildrenMode, OptionTree};
    pub use optree_core::{Attribute, Change, ChangeLayer, OptionDefinition, Segment};
}
