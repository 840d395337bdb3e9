//! Per-call generation state handed to every arbitrary.

use std::any::type_name;

use rand::RngCore;

use crate::arbitrary::Arbitrary;
use crate::config::ArbitraryOption;
use crate::error::{FixtureError, FixtureResult};
use crate::fields::FieldArbitraries;
use crate::fixture::Fixture;
use crate::monkey::Engine;

/// Randomness, options and nesting depth of one generation call
pub struct GenContext<'a> {
    rng: &'a mut dyn RngCore,
    engine: &'a Engine,
    options: &'a ArbitraryOption,
    depth: usize,
}

impl<'a> GenContext<'a> {
    pub(crate) fn new(
        rng: &'a mut dyn RngCore,
        engine: &'a Engine,
        options: &'a ArbitraryOption,
    ) -> Self {
        Self {
            rng,
            engine,
            options,
            depth: 0,
        }
    }

    /// The random source of this call
    pub fn rng(&mut self) -> &mut dyn RngCore {
        &mut *self.rng
    }

    /// Options in effect for this call
    pub fn options(&self) -> &ArbitraryOption {
        self.options
    }

    /// Nesting depth of the fixture currently being assembled, 0 at the root
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Type strategy registered on the owning instance for `V`
    pub fn registered<V: 'static>(&self) -> Option<&Arbitrary<V>> {
        self.engine.registry().get::<V>()
    }

    /// Generate a nested fixture one level deeper.
    ///
    /// Nested fixtures use the default strategies of their fields plus any
    /// field defaults from the options; customizers only apply at the root.
    pub fn nested<T: Fixture>(&mut self) -> FixtureResult<T> {
        let limit = self.options.recursion_depth_limit;
        if self.depth >= limit {
            return Err(FixtureError::RecursionLimit {
                type_name: type_name::<T>().to_string(),
                limit,
            });
        }

        let descriptor = self.engine.describe::<T>()?;
        let fields = FieldArbitraries::with_options(descriptor, self.options);
        let mut child = GenContext {
            rng: &mut *self.rng,
            engine: self.engine,
            options: self.options,
            depth: self.depth + 1,
        };
        T::assemble(&mut child, &fields)
    }
}
