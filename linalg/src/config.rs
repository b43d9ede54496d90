//! Configuration for the linalg utilities.
//!
//! Built with a bon builder, with environment variable fallbacks for the
//! process-wide default.

use std::sync::OnceLock;

use bon::bon;
use strata_ir::DEFAULT_COMPOSE_LIMIT;

/// Tunables shared by the range collector, the composer and the loop nest builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinalgConfig {
    /// Deepest chain of view-producing operations the range collector walks.
    /// Checked in debug builds only.
    pub max_view_depth: usize,
    /// Fixpoint rounds allowed when composing affine maps.
    pub compose_limit: usize,
}

impl Default for LinalgConfig {
    fn default() -> Self {
        Self { max_view_depth: 64, compose_limit: DEFAULT_COMPOSE_LIMIT }
    }
}

static GLOBAL: OnceLock<LinalgConfig> = OnceLock::new();

#[bon]
impl LinalgConfig {
    /// Create a configuration with builder pattern.
    #[builder]
    pub fn builder(
        #[builder(default = 64)] max_view_depth: usize,
        #[builder(default = DEFAULT_COMPOSE_LIMIT)] compose_limit: usize,
    ) -> Self {
        Self { max_view_depth, compose_limit }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `STRATA_MAX_VIEW_DEPTH` - Range collector depth bound (default: 64)
    /// * `STRATA_COMPOSE_LIMIT` - Affine composition rounds (default: 1024)
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`LinalgConfig::from_env`] with variables read through `lookup`.
    /// Missing or unparsable values fall back to the defaults.
    pub(crate) fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let max_view_depth =
            lookup("STRATA_MAX_VIEW_DEPTH").and_then(|s| s.parse().ok()).unwrap_or(defaults.max_view_depth);
        let compose_limit =
            lookup("STRATA_COMPOSE_LIMIT").and_then(|s| s.parse().ok()).unwrap_or(defaults.compose_limit);
        Self { max_view_depth, compose_limit }
    }

    /// Process-wide configuration, read from the environment on first use.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| {
            let config = Self::from_env();
            tracing::debug!(?config, "linalg configuration");
            config
        })
    }
}
