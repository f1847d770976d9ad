//! Attribute set element schemas
//!
//! An option typed `attribute set of X` describes its children once; every
//! concrete child is built from that description. [`ElementSchema`] says how.

/// Type of a plain namespace node
pub const ATTRIBUTE_SET: &str = "attribute set";

/// Prefix marking a homogeneous attribute set
pub const ATTRIBUTE_SET_OF: &str = "attribute set of ";

/// Attribute set whose elements are described by a `<name>` template subtree
pub const ATTRIBUTE_SET_OF_SUBMODULES: &str = "attribute set of submodules";

/// Element type of a submodule set that has no template subtree
pub const SUBMODULE: &str = "submodule";

/// How the children of an `attribute set of X` node are built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementSchema {
    /// Deep copy of the `<name>` template subtree
    Submodule,

    /// Single leaf of the given element type
    Scalar(String),
}

impl ElementSchema {
    /// Classify an option type; `None` when it is not an `attribute set of X`
    #[must_use]
    pub fn of(option_type: &str) -> Option<Self> {
        if option_type == ATTRIBUTE_SET_OF_SUBMODULES {
            return Some(Self::Submodule);
        }
        let element = option_type.strip_prefix(ATTRIBUTE_SET_OF)?;
        // "attribute set of strings" holds strings
        let element = element.strip_suffix('s').unwrap_or(element);
        Some(Self::Scalar(element.to_string()))
    }
}
