//! Evaluator output
//!
//! The module evaluator dumps two JSON documents keyed by attribute text:
//! option metadata and configured definitions. [`SystemOptionData`] and
//! [`ConfigOptions`] load them and feed [`OptionTree::new`](crate::OptionTree::new).

use crate::record::OptionMetadata;
use optree_core::{Attribute, OptionDefinition};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Errors while loading evaluator output
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid evaluator output
    #[error("invalid evaluator output: {0}")]
    Json(#[from] serde_json::Error),
}

impl InputError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn read_path<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let file = File::open(path).map_err(|e| InputError::io_error(path, e))?;
    let value = serde_json::from_reader(BufReader::new(file))?;
    tracing::debug!(path = %path.display(), "loaded evaluator output");
    Ok(value)
}

/// Option metadata for every known option
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemOptionData(pub BTreeMap<Attribute, OptionMetadata>);

/// Definitions committed to the configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigOptions(pub BTreeMap<Attribute, OptionDefinition>);

macro_rules! evaluator_document {
    ($ty:ident, $value:ty) => {
        impl $ty {
            /// Parse from a JSON string
            ///
            /// # Errors
            /// Returns error if the document is malformed
            pub fn from_json_str(s: &str) -> Result<Self, InputError> {
                Ok(serde_json::from_str(s)?)
            }

            /// Parse from a reader
            ///
            /// # Errors
            /// Returns error if reading fails or the document is malformed
            pub fn from_reader(reader: impl Read) -> Result<Self, InputError> {
                Ok(serde_json::from_reader(reader)?)
            }

            /// Load from a JSON file
            ///
            /// # Errors
            /// Returns error if the file cannot be read or is malformed
            pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InputError> {
                read_path(path.as_ref())
            }

            /// Number of entries
            #[must_use]
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// Check if there are no entries
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl IntoIterator for $ty {
            type Item = (Attribute, $value);
            type IntoIter = std::collections::btree_map::IntoIter<Attribute, $value>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.into_iter()
            }
        }

        impl FromIterator<(Attribute, $value)> for $ty {
            fn from_iter<I: IntoIterator<Item = (Attribute, $value)>>(iter: I) -> Self {
                Self(iter.into_iter().collect())
            }
        }
    };
}

evaluator_document!(SystemOptionData, OptionMetadata);
evaluator_document!(ConfigOptions, OptionDefinition);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_option_data_from_json() {
        let data = SystemOptionData::from_json_str(
            r#"{
                "users.users": {"type": "attribute set of submodules", "default": {}},
                "users.users.<name>.uid": {"type": "null or signed integer", "default": null},
                "users.users.<name>.name": {"type": "string"}
            }"#,
        )
        .unwrap();
        assert_eq!(data.len(), 3);
        let uid: Attribute = "users.users.<name>.uid".parse().unwrap();
        assert!(uid.has_placeholder());
        assert_eq!(data.0[&uid].default, OptionDefinition::value(serde_json::Value::Null));

        // only a missing key leaves the default undefined
        let name: Attribute = "users.users.<name>.name".parse().unwrap();
        assert!(data.0[&name].default.is_undefined());
    }

    #[test]
    fn configured_null_is_kept() {
        let options = ConfigOptions::from_json_str(r#"{"services.foo.package": null}"#).unwrap();
        let package: Attribute = "services.foo.package".parse().unwrap();
        assert_eq!(options.0[&package], OptionDefinition::value(serde_json::Value::Null));
    }

    #[test]
    fn config_options_from_reader() {
        let json = br#"{"networking.hostName": "box", "environment.systemPackages": {"_type": "literalExpression", "text": "[ pkgs.vim ]"}}"#;
        let options = ConfigOptions::from_reader(&json[..]).unwrap();
        let packages: Attribute = "environment.systemPackages".parse().unwrap();
        assert_eq!(options.0[&packages], OptionDefinition::expression("[ pkgs.vim ]"));
    }

    #[test]
    fn malformed_attribute_key_is_rejected() {
        let result = ConfigOptions::from_json_str(r#"{"a..b": true}"#);
        assert!(matches!(result, Err(InputError::Json(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SystemOptionData::from_path("/nonexistent/options.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/options.json"));
    }
}
