//! Change records between definition layers
//!
//! Provides [`Change`] for the `(attribute, old, new)` triples produced when
//! diffing one definition layer against the layer below it, and
//! [`ChangeLayer`] / [`LayerSelection`] for choosing which layers take part.

use crate::attribute::Attribute;
use crate::definition::OptionDefinition;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Which change cache a diff is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeLayer {
    /// Configured definitions against system defaults
    Configured,

    /// In-memory definitions against configured definitions
    InMemory,
}

impl ChangeLayer {
    /// Convert the boolean "configured changes" flag
    #[inline]
    #[must_use]
    pub fn from_configured(get_configured_changes: bool) -> Self {
        if get_configured_changes {
            Self::Configured
        } else {
            Self::InMemory
        }
    }
}

impl Display for ChangeLayer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured => f.write_str("configured"),
            Self::InMemory => f.write_str("in-memory"),
        }
    }
}

impl FromStr for ChangeLayer {
    type Err = UnknownLayer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "configured" => Ok(Self::Configured),
            "in-memory" | "in_memory" => Ok(Self::InMemory),
            other => Err(UnknownLayer(other.to_string())),
        }
    }
}

/// Unrecognized layer name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown change layer '{0}' (expected 'configured' or 'in-memory')")]
pub struct UnknownLayer(pub String);

/// Which layers take part in definition resolution
///
/// The system default always takes part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerSelection {
    /// Consult the in-memory layer
    pub include_in_memory: bool,

    /// Consult the configured layer
    pub include_configured: bool,
}

impl LayerSelection {
    /// Every layer
    pub const ALL: Self = Self {
        include_in_memory: true,
        include_configured: true,
    };

    /// Layers that make up the "old" value of a change in `layer`
    ///
    /// In-memory changes are diffed against configured-or-default; configured
    /// changes are diffed against the default alone.
    #[inline]
    #[must_use]
    pub fn baseline(layer: ChangeLayer) -> Self {
        Self {
            include_in_memory: false,
            include_configured: layer == ChangeLayer::InMemory,
        }
    }
}

impl Default for LayerSelection {
    fn default() -> Self {
        Self::ALL
    }
}

/// A single option whose definition differs from its baseline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change<'a> {
    /// Changed option
    pub attribute: &'a Attribute,

    /// Baseline definition
    pub old: &'a OptionDefinition,

    /// Changed definition
    pub new: &'a OptionDefinition,
}

impl<'a> Change<'a> {
    /// Create change record
    #[inline]
    #[must_use]
    pub fn new(
        attribute: &'a Attribute,
        old: &'a OptionDefinition,
        new: &'a OptionDefinition,
    ) -> Self {
        Self { attribute, old, new }
    }

    /// Check if the change removes the definition
    #[inline]
    #[must_use]
    pub fn is_revert(&self) -> bool {
        self.new.is_undefined()
    }

    /// Owned copy of the triple
    #[must_use]
    pub fn to_owned_triple(&self) -> (Attribute, OptionDefinition, OptionDefinition) {
        (self.attribute.clone(), self.old.clone(), self.new.clone())
    }
}

impl Display for Change<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.attribute, self.old, self.new)
    }
}
