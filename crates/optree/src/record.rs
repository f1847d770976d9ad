//! Per-option records and partial updates
//!
//! Every tree node carries one [`OptionRecord`]. Writes go through
//! [`RecordUpdate`], which only touches the fields it carries.

use crate::schema::ATTRIBUTE_SET;
use optree_core::OptionDefinition;
use serde::{Deserialize, Serialize};

/// Metadata and the three definition layers of one option
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptionRecord {
    /// Human-readable description
    pub description: Option<String>,

    /// Whether the option may be set by users
    pub read_only: Option<bool>,

    /// Free-form type descriptor from the module system
    pub option_type: Option<String>,

    /// Value the module system uses when nothing is configured
    pub system_default_definition: OptionDefinition,

    /// Value committed to the configuration file
    pub configured_definition: OptionDefinition,

    /// Value set during the current editing session
    pub in_memory_definition: OptionDefinition,
}

impl OptionRecord {
    /// Record for a plain namespace node
    #[must_use]
    pub fn attribute_set() -> Self {
        Self {
            option_type: Some(ATTRIBUTE_SET.to_string()),
            ..Self::default()
        }
    }

    /// Apply the fields present in `update`, leaving the rest untouched
    pub fn merge(&mut self, update: RecordUpdate) {
        let RecordUpdate {
            description,
            read_only,
            option_type,
            system_default_definition,
            configured_definition,
            in_memory_definition,
        } = update;

        if let Some(description) = description {
            self.description = Some(description);
        }
        if let Some(read_only) = read_only {
            self.read_only = Some(read_only);
        }
        if let Some(option_type) = option_type {
            self.option_type = Some(option_type);
        }
        if let Some(definition) = system_default_definition {
            self.system_default_definition = definition;
        }
        if let Some(definition) = configured_definition {
            self.configured_definition = definition;
        }
        if let Some(definition) = in_memory_definition {
            self.in_memory_definition = definition;
        }
    }

    /// Schema part of the record: metadata and system default
    ///
    /// Configured and in-memory definitions are left undefined.
    #[must_use]
    pub fn schema_copy(&self) -> Self {
        Self {
            description: self.description.clone(),
            read_only: self.read_only,
            option_type: self.option_type.clone(),
            system_default_definition: self.system_default_definition.clone(),
            ..Self::default()
        }
    }

    /// Record for one element of an attribute set described by `self`
    #[must_use]
    pub fn element(&self, element_type: impl Into<String>) -> Self {
        Self {
            description: self.description.clone(),
            read_only: self.read_only,
            option_type: Some(element_type.into()),
            ..Self::default()
        }
    }
}

/// Partial update of an [`OptionRecord`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordUpdate {
    /// New description
    pub description: Option<String>,
    /// New read-only flag
    pub read_only: Option<bool>,
    /// New type descriptor
    pub option_type: Option<String>,
    /// New system default
    pub system_default_definition: Option<OptionDefinition>,
    /// New configured definition
    pub configured_definition: Option<OptionDefinition>,
    /// New in-memory definition
    pub in_memory_definition: Option<OptionDefinition>,
}

impl RecordUpdate {
    /// Empty update
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set description
    #[inline]
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set read-only flag
    #[inline]
    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }

    /// Set type descriptor
    #[inline]
    #[must_use]
    pub fn option_type(mut self, option_type: impl Into<String>) -> Self {
        self.option_type = Some(option_type.into());
        self
    }

    /// Set system default
    #[inline]
    #[must_use]
    pub fn system_default(mut self, definition: OptionDefinition) -> Self {
        self.system_default_definition = Some(definition);
        self
    }

    /// Set configured definition
    #[inline]
    #[must_use]
    pub fn configured(mut self, definition: OptionDefinition) -> Self {
        self.configured_definition = Some(definition);
        self
    }

    /// Set in-memory definition
    #[inline]
    #[must_use]
    pub fn in_memory(mut self, definition: OptionDefinition) -> Self {
        self.in_memory_definition = Some(definition);
        self
    }

    /// Check if the update carries no field
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Option metadata as reported by the module evaluator
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionMetadata {
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the option may be set by users
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    /// Type descriptor
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub option_type: Option<String>,

    /// System default; undefined only when the key is absent
    #[serde(default, skip_serializing_if = "OptionDefinition::is_undefined")]
    pub default: OptionDefinition,
}

impl OptionMetadata {
    /// Metadata for an option of the given type
    #[must_use]
    pub fn new(option_type: impl Into<String>) -> Self {
        Self {
            option_type: Some(option_type.into()),
            ..Self::default()
        }
    }

    /// With system default
    #[inline]
    #[must_use]
    pub fn with_default(mut self, default: OptionDefinition) -> Self {
        self.default = default;
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With read-only flag
    #[inline]
    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }
}

impl From<OptionMetadata> for RecordUpdate {
    fn from(metadata: OptionMetadata) -> Self {
        Self {
            description: metadata.description,
            read_only: metadata.read_only,
            option_type: metadata.option_type,
            system_default_definition: metadata.default.is_defined().then_some(metadata.default),
            ..Self::default()
        }
    }
}
