//! Lazily constructed, process-wide highlighter.

use std::sync::OnceLock;

use crate::highlighter::{HighlightConfig, HighlightError, Highlighter};

/// Holds the single [`Highlighter`] for a process.
///
/// Construct one at startup and share it by `Arc`. The first [`get`] builds
/// the highlighter; every later call returns the same instance. The outcome of
/// that first call is kept, so a failed initialization is not retried.
///
/// [`get`]: HighlighterCache::get
#[derive(Debug)]
pub struct HighlighterCache {
    config: HighlightConfig,
    cell: OnceLock<Result<Highlighter, HighlightError>>,
}

impl HighlighterCache {
    /// Create an empty cache for the given theme pair.
    pub fn new(config: HighlightConfig) -> Self {
        Self {
            config,
            cell: OnceLock::new(),
        }
    }

    /// Get the shared highlighter, initializing it on first use.
    pub fn get(&self) -> Result<&Highlighter, HighlightError> {
        self.cell
            .get_or_init(|| {
                tracing::debug!("Initializing highlighter");
                Highlighter::new(&self.config)
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Whether initialization has already happened.
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// The theme pair this cache was configured with.
    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }
}

impl Default for HighlighterCache {
    fn default() -> Self {
        Self::new(HighlightConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initializes_once() {
        let cache = HighlighterCache::default();
        assert!(!cache.is_initialized());

        let first = cache.get().unwrap() as *const Highlighter;
        let second = cache.get().unwrap() as *const Highlighter;

        assert!(cache.is_initialized());
        assert_eq!(first, second);
    }

    #[test]
    fn failure_is_memoized() {
        let cache = HighlighterCache::new(HighlightConfig {
            light_theme: "missing".to_string(),
            dark_theme: "base16-ocean.dark".to_string(),
        });

        assert!(cache.get().is_err());
        assert!(cache.is_initialized());
        assert!(matches!(cache.get(), Err(HighlightError::UnknownTheme(_))));
    }
}
