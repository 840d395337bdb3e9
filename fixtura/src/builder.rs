//! Fluent, reusable builders bound to one fixture type.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use rand::RngCore;
use tracing::{debug, warn};

use crate::arbitrary::Arbitrary;
use crate::config::ArbitraryOption;
use crate::context::GenContext;
use crate::customizer::Customizer;
use crate::error::{FixtureError, FixtureResult};
use crate::fields::FieldArbitraries;
use crate::fixture::Fixture;
use crate::monkey::Engine;
use crate::stream::Fixtures;

/// Builder of fixtures of type `T`
///
/// A builder only holds configuration: options and customizers in
/// registration order. Every `sample` is an independent generation call.
///
/// ```rust
/// use fixtura::{Fixtura, Fixture};
///
/// #[derive(Debug, Clone, PartialEq, Fixture)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let fixtura = Fixtura::new();
/// let on_axis = fixtura.give_me_builder::<Point>().set_value("y", 0);
///
/// for point in on_axis.sample_list(5).unwrap() {
///     assert_eq!(point.y, 0);
/// }
/// ```
pub struct ArbitraryBuilder<T> {
    engine: Arc<Engine>,
    options: Arc<ArbitraryOption>,
    customizers: Vec<Customizer<T>>,
}

impl<T> Clone for ArbitraryBuilder<T> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            options: Arc::clone(&self.options),
            customizers: self.customizers.clone(),
        }
    }
}

impl<T> fmt::Debug for ArbitraryBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArbitraryBuilder")
            .field("type", &type_name::<T>())
            .field("options", &self.options)
            .field("customizers", &self.customizers.len())
            .finish()
    }
}

impl<T: Fixture> ArbitraryBuilder<T> {
    pub(crate) fn new(engine: Arc<Engine>, options: Arc<ArbitraryOption>) -> Self {
        Self {
            engine,
            options,
            customizers: Vec::new(),
        }
    }

    /// Options in effect for this builder
    pub fn options_ref(&self) -> &ArbitraryOption {
        &self.options
    }

    /// Replace the options of this builder
    pub fn options(mut self, options: ArbitraryOption) -> FixtureResult<Self> {
        options.validate()?;
        self.options = Arc::new(options);
        Ok(self)
    }

    /// Append a customizer
    pub fn customize(mut self, customizer: Customizer<T>) -> Self {
        self.customizers.push(customizer);
        self
    }

    /// Draw field `name` from `arbitrary`.
    ///
    /// An unknown field or a mismatched type surfaces as a configuration
    /// error when sampling.
    pub fn set<V: 'static>(self, name: &'static str, arbitrary: Arbitrary<V>) -> Self {
        self.customize(Customizer::set(name, arbitrary))
    }

    /// Pin field `name` to `value`
    pub fn set_value<V: Clone + Send + Sync + 'static>(self, name: &'static str, value: V) -> Self {
        self.set(name, Arbitrary::just(value))
    }

    /// Transform every constructed fixture
    pub fn post_process<F>(self, transform: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.customize(Customizer::post_process(transform))
    }

    /// Redraw fixtures failing `predicate`
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.customize(Customizer::filter(predicate))
    }

    /// Generate one fixture
    pub fn sample(&self) -> FixtureResult<T> {
        let mut rng = self.engine.next_rng();
        self.generate_with(&mut rng)
    }

    /// Generate exactly `n` fixtures, failing on the first error
    pub fn sample_list(&self, n: usize) -> FixtureResult<Vec<T>> {
        (0..n).map(|_| self.sample()).collect()
    }

    /// Endless sequence of fixtures from this builder
    pub fn fixtures(&self) -> Fixtures<T> {
        Fixtures::new(self.clone())
    }

    /// This builder as an arbitrary drawing from the caller's randomness
    pub fn arbitrary(&self) -> Arbitrary<T> {
        let builder = self.clone();
        Arbitrary::from_fn(move |ctx| builder.generate_with(ctx.rng()))
    }

    /// Run one generation call on `rng`
    pub fn generate_with(&self, rng: &mut dyn RngCore) -> FixtureResult<T> {
        let descriptor = self.engine.describe::<T>()?;
        let mut fields = FieldArbitraries::with_options(Arc::clone(&descriptor), &self.options);
        for customizer in &self.customizers {
            customizer.customize_fields(&descriptor, &mut fields)?;
        }

        let attempts = self.options.max_fixture_attempts;
        for attempt in 1..=attempts {
            let mut ctx = GenContext::new(&mut *rng, &self.engine, &self.options);
            let candidate = T::assemble(&mut ctx, &fields)?;
            match self.apply_fixture_customizers(candidate) {
                Some(fixture) => return Ok(fixture),
                None => debug!(
                    type_name = descriptor.type_name(),
                    attempt,
                    "fixture rejected by customizer"
                ),
            }
        }

        warn!(
            type_name = descriptor.type_name(),
            attempts, "every candidate fixture was rejected"
        );
        Err(FixtureError::exhausted(descriptor.type_name(), attempts))
    }

    fn apply_fixture_customizers(&self, candidate: T) -> Option<T> {
        self.customizers
            .iter()
            .try_fold(candidate, |target, customizer| {
                customizer.customize_fixture(target)
            })
    }
}
