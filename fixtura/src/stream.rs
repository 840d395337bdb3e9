//! Lazy, endless sequences of fixtures.

use crate::builder::ArbitraryBuilder;
use crate::error::FixtureResult;
use crate::fixture::Fixture;

/// Pull-based sequence of fixtures
///
/// Every pull is an independent generation call with the descriptor and
/// customizers of the builder it came from. The sequence never ends; bound
/// it with `take`.
#[derive(Debug, Clone)]
pub struct Fixtures<T> {
    builder: ArbitraryBuilder<T>,
}

impl<T: Fixture> Fixtures<T> {
    pub(crate) fn new(builder: ArbitraryBuilder<T>) -> Self {
        Self { builder }
    }

    /// Builder backing this sequence
    pub fn builder(&self) -> &ArbitraryBuilder<T> {
        &self.builder
    }
}

impl<T: Fixture> Iterator for Fixtures<T> {
    type Item = FixtureResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.builder.sample())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl<T: Fixture> std::iter::FusedIterator for Fixtures<T> {}
