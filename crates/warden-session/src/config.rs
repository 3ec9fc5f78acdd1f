//! Configuration for the session registry.

/// Default number of sessions held in the recency cache.
pub const DEFAULT_CACHE_SIZE: usize = 10;

/// Configuration for a [`SessionRegistry`](crate::SessionRegistry).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of sessions kept in the recency cache.
    /// Values below 1 are clamped to 1.
    pub cache_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl RegistryConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the recency cache capacity.
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }
}
