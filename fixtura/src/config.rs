//! Configuration types for controlling fixture generation.

use crate::arbitrary::{Arbitrary, ErasedArbitrary};

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Null probability outside of [0, 1]
    #[error("Invalid nullable field probability: {0} (must be within [0, 1])")]
    InvalidNullProbability(f64),
    /// Recursion depth limit must be > 0
    #[error("Invalid recursion depth limit: {0} (must be > 0)")]
    InvalidRecursionDepth(usize),
    /// Fixture attempt budget must be > 0
    #[error("Invalid fixture attempts: {0} (must be > 0)")]
    InvalidFixtureAttempts(usize),
    /// Filter attempt budget must be > 0
    #[error("Invalid filter attempts: {0} (must be > 0)")]
    InvalidFilterAttempts(usize),
}

/// Default probability that an `Option` field is generated as `None`
pub const DEFAULT_NULLABLE_FIELD_PROBABILITY: f64 = 0.2;
/// Default depth at which nested generation gives up
pub const DEFAULT_RECURSION_DEPTH_LIMIT: usize = 5;
/// Default number of candidates drawn before rejections exhaust a call
pub const DEFAULT_MAX_FIXTURE_ATTEMPTS: usize = 100;
/// Default number of draws `Arbitrary::filter` makes before giving up
pub const DEFAULT_MAX_FILTER_ATTEMPTS: usize = 1000;

/// Options shared by every generation that runs under them
///
/// Rejections by `customize_fixture` and rejections inside
/// [`Arbitrary::filter`] are counted against separate budgets.
#[derive(Debug, Clone)]
pub struct ArbitraryOption {
    /// Never generate `None` for `Option` fields
    pub default_not_null: bool,
    /// Probability of `None` for `Option` fields when `default_not_null` is off
    pub nullable_field_probability: f64,
    /// Maximum nesting depth of fixture types inside a fixture
    pub recursion_depth_limit: usize,
    /// Candidates drawn per call before `GenerationExhausted`
    pub max_fixture_attempts: usize,
    /// Draws per value made by a filtered arbitrary
    pub max_filter_attempts: usize,
    field_defaults: Vec<(String, ErasedArbitrary)>,
}

impl Default for ArbitraryOption {
    fn default() -> Self {
        Self {
            default_not_null: false,
            nullable_field_probability: DEFAULT_NULLABLE_FIELD_PROBABILITY,
            recursion_depth_limit: DEFAULT_RECURSION_DEPTH_LIMIT,
            max_fixture_attempts: DEFAULT_MAX_FIXTURE_ATTEMPTS,
            max_filter_attempts: DEFAULT_MAX_FILTER_ATTEMPTS,
            field_defaults: Vec::new(),
        }
    }
}

impl ArbitraryOption {
    /// Start building a validated option set
    pub fn builder() -> ArbitraryOptionBuilder {
        ArbitraryOptionBuilder::default()
    }

    /// Validate the option set
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.nullable_field_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::InvalidNullProbability(p));
        }
        if self.recursion_depth_limit == 0 {
            return Err(ConfigError::InvalidRecursionDepth(
                self.recursion_depth_limit,
            ));
        }
        if self.max_fixture_attempts == 0 {
            return Err(ConfigError::InvalidFixtureAttempts(
                self.max_fixture_attempts,
            ));
        }
        if self.max_filter_attempts == 0 {
            return Err(ConfigError::InvalidFilterAttempts(self.max_filter_attempts));
        }
        Ok(())
    }

    /// Field-name based default strategies, in registration order
    pub fn field_defaults(&self) -> impl Iterator<Item = (&str, &ErasedArbitrary)> {
        self.field_defaults
            .iter()
            .map(|(name, arbitrary)| (name.as_str(), arbitrary))
    }
}

/// Fluent builder for [`ArbitraryOption`]
#[derive(Debug, Clone, Default)]
pub struct ArbitraryOptionBuilder {
    option: ArbitraryOption,
}

impl ArbitraryOptionBuilder {
    /// Never generate `None` for `Option` fields
    pub fn default_not_null(mut self, not_null: bool) -> Self {
        self.option.default_not_null = not_null;
        self
    }

    /// Probability of `None` for `Option` fields
    pub fn nullable_field_probability(mut self, probability: f64) -> Self {
        self.option.nullable_field_probability = probability;
        self
    }

    /// Maximum nesting depth of fixture types
    pub fn recursion_depth_limit(mut self, limit: usize) -> Self {
        self.option.recursion_depth_limit = limit;
        self
    }

    /// Candidates drawn per call before giving up
    pub fn max_fixture_attempts(mut self, attempts: usize) -> Self {
        self.option.max_fixture_attempts = attempts;
        self
    }

    /// Draws per value made by filtered arbitraries
    pub fn max_filter_attempts(mut self, attempts: usize) -> Self {
        self.option.max_filter_attempts = attempts;
        self
    }

    /// Use `arbitrary` for every field called `name` whose type matches.
    ///
    /// Applies across all fixture types generated under these options, so a
    /// type without such a field is left untouched. Later registrations for
    /// the same name win.
    pub fn field_default<V>(mut self, name: impl Into<String>, arbitrary: Arbitrary<V>) -> Self
    where
        V: Send + Sync + 'static,
    {
        self.option
            .field_defaults
            .push((name.into(), ErasedArbitrary::new(arbitrary)));
        self
    }

    /// Validate and return the option set
    pub fn build(self) -> Result<ArbitraryOption, ConfigError> {
        self.option.validate()?;
        Ok(self.option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_defaults() {
        let option = ArbitraryOption::default();
        assert!(!option.default_not_null);
        assert_eq!(option.nullable_field_probability, 0.2);
        assert_eq!(option.recursion_depth_limit, 5);
        assert_eq!(option.max_fixture_attempts, 100);
        assert_eq!(option.max_filter_attempts, 1000);
        assert_eq!(option.field_defaults().count(), 0);
        assert!(option.validate().is_ok());
    }

    #[test]
    fn test_builder_validation() {
        assert_eq!(
            ArbitraryOption::builder()
                .nullable_field_probability(1.5)
                .build()
                .unwrap_err(),
            ConfigError::InvalidNullProbability(1.5)
        );
        assert!(
            ArbitraryOption::builder()
                .nullable_field_probability(f64::NAN)
                .build()
                .is_err()
        );
        assert_eq!(
            ArbitraryOption::builder()
                .recursion_depth_limit(0)
                .build()
                .unwrap_err(),
            ConfigError::InvalidRecursionDepth(0)
        );
        assert_eq!(
            ArbitraryOption::builder()
                .max_fixture_attempts(0)
                .build()
                .unwrap_err(),
            ConfigError::InvalidFixtureAttempts(0)
        );
        assert_eq!(
            ArbitraryOption::builder()
                .max_filter_attempts(0)
                .build()
                .unwrap_err(),
            ConfigError::InvalidFilterAttempts(0)
        );
    }

    #[test]
    fn test_builder_sets_fields() {
        let option = ArbitraryOption::builder()
            .default_not_null(true)
            .nullable_field_probability(0.0)
            .recursion_depth_limit(2)
            .max_fixture_attempts(3)
            .field_default("price", Arbitrary::just(10u32))
            .build()
            .unwrap();

        assert!(option.default_not_null);
        assert_eq!(option.recursion_depth_limit, 2);
        assert_eq!(option.max_fixture_attempts, 3);

        let defaults: Vec<_> = option.field_defaults().map(|(name, _)| name).collect();
        assert_eq!(defaults, vec!["price"]);
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::InvalidRecursionDepth(0).to_string(),
            "Invalid recursion depth limit: 0 (must be > 0)"
        );
    }
}
