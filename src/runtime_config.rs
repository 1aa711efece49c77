//! Environment-driven runtime configuration.
//!
//! ## Environment Variables
//!
//! ### `MASKROUTE_DISPATCH_CACHE`
//!
//! Enables or disables the broker's construction-time dispatch cache.
//! Accepts `1`/`true`/`on` and `0`/`false`/`off` (case-insensitive).
//! Default: enabled.
//!
//! Disabling the cache makes every `construct_url` a linear scan over
//! the children in insertion order. The cache is transparent - both
//! modes return identical URLs - so the switch exists for debugging
//! bucket selection and for comparison in tests and benches.

use std::env;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Whether `RouteList` builds its dispatch cache (default: true)
    pub dispatch_cache: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dispatch_cache: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let dispatch_cache = match env::var("MASKROUTE_DISPATCH_CACHE") {
            Ok(value) => !matches!(
                value.to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            ),
            Err(_) => true,
        };
        Self { dispatch_cache }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_cache() {
        assert!(RuntimeConfig::default().dispatch_cache);
    }
}
