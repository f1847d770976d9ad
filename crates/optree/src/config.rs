//! Option tree configuration

/// Tuning knobs for an [`OptionTree`](crate::OptionTree)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Ancestor sets kept in the memo before eviction
    pub memo_capacity: u64,
}

impl TreeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With memo capacity
    #[inline]
    #[must_use]
    pub fn with_memo_capacity(mut self, capacity: u64) -> Self {
        self.memo_capacity = capacity;
        self
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { memo_capacity: 16 }
    }
}
