//! Error types for the option tree

use optree_core::Attribute;

/// Errors raised by option tree operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Attribute has no node in the tree
    #[error("attribute not found: '{0}'")]
    NotFound(Attribute),

    /// Argument outside the accepted set
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Target of a structural mutation is already taken
    #[error("attribute already exists: '{0}'")]
    AlreadyExists(Attribute),
}

impl TreeError {
    /// Create invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Result type alias for option tree operations
pub type Result<T, E = TreeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let attr: Attribute = "services.openssh.enable".parse().unwrap();
        let err = TreeError::NotFound(attr);
        assert_eq!(err.to_string(), "attribute not found: 'services.openssh.enable'");
    }

    #[test]
    fn invalid_argument_display() {
        let err = TreeError::invalid_argument("unknown children mode 'full'");
        assert_eq!(err.to_string(), "invalid argument: unknown children mode 'full'");
    }
}
