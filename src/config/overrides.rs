//! Command-line overrides
//!
//! A loaded configuration is never mutated; overrides produce a new value.

use std::num::NonZeroUsize;

use crate::config::schema::{Configuration, YearSelection};

/// Values supplied on the command line that take precedence over the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Replaces `nprocs`
    pub nprocs: Option<NonZeroUsize>,
    /// Forces incremental update of an existing dataset
    pub update: bool,
}

impl Overrides {
    /// Whether any override is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nprocs.is_none() && !self.update
    }
}

impl Configuration {
    /// Returns a copy of this configuration with `overrides` applied.
    #[must_use]
    pub fn with_overrides(&self, overrides: &Overrides) -> Self {
        let mut config = self.clone();

        if let Some(nprocs) = overrides.nprocs {
            tracing::info!(
                file = config.nprocs.get(),
                cli = nprocs.get(),
                "overriding nprocs from the command line"
            );
            config.nprocs = nprocs;
        }

        if overrides.update && !config.year.is_update() {
            tracing::info!("overriding year selection: extending existing dataset");
            config.year = YearSelection::ExtendExisting;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::tests::sample_config;

    #[test]
    fn test_empty_overrides_keep_config() {
        let config = sample_config();
        assert!(Overrides::default().is_empty());
        assert_eq!(config.with_overrides(&Overrides::default()), config);
    }

    #[test]
    fn test_nprocs_override() {
        let config = sample_config();
        let overrides = Overrides {
            nprocs: NonZeroUsize::new(16),
            update: false,
        };
        let updated = config.with_overrides(&overrides);
        assert_eq!(updated.nprocs.get(), 16);
        assert_eq!(config.nprocs.get(), 4, "original is untouched");
    }

    #[test]
    fn test_update_override_replaces_range() {
        let overrides = Overrides {
            nprocs: None,
            update: true,
        };
        let updated = sample_config().with_overrides(&overrides);
        assert_eq!(updated.year, YearSelection::ExtendExisting);
    }
}
