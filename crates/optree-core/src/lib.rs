//! optree core value types
//!
//! Immutable building blocks shared by the option tree and its consumers.
//!
//! # Core Concepts
//!
//! - [`Attribute`]: Hierarchical path into the option namespace
//! - [`Segment`]: One path component, either a name or the `<name>` template
//! - [`OptionDefinition`]: Undefined, an evaluated value, or expression text
//! - [`Change`]: `(attribute, old, new)` triple from a layer diff
//! - [`ChangeLayer`]: Which layer a diff is taken from
//!
//! # Example
//!
//! ```rust
//! use optree_core::{Attribute, OptionDefinition, Segment};
//!
//! let attr: Attribute = "users.users.<name>.uid".parse().unwrap();
//! assert!(attr.has_placeholder());
//!
//! let alice = attr.with_segment(2, Segment::name("alice")).unwrap();
//! assert_eq!(alice.to_string(), "users.users.alice.uid");
//!
//! let def = OptionDefinition::value(1000);
//! assert_eq!(def.to_expression().as_deref(), Some("1000"));
//! ```

#![warn(unreachable_pub)]

// Core modules
mod attribute;
mod change;
mod definition;

// Re-exports
pub use attribute::{Attribute, PathError, Segment, PLACEHOLDER};
pub use change::{Change, ChangeLayer, LayerSelection, UnknownLayer};
pub use definition::{OptionDefinition, UNDEFINED};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
