//! Composable value producers.
//!
//! An [`Arbitrary`] is a configured random-value producer. It is cheap to
//! clone and can be shared between threads and between generation calls;
//! every draw depends only on the [`GenContext`] it is sampled with.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use rand::RngCore;
use rand::distributions::uniform::SampleUniform;
use rand::distributions::{Alphanumeric, Distribution};

use crate::context::GenContext;
use crate::error::{FixtureError, FixtureResult};
use crate::monkey::Engine;

type Sampler<T> = dyn Fn(&mut GenContext<'_>) -> FixtureResult<T> + Send + Sync;

/// A lazy, restartable producer of values of type `T`
pub struct Arbitrary<T> {
    sampler: Arc<Sampler<T>>,
}

impl<T> Clone for Arbitrary<T> {
    fn clone(&self) -> Self {
        Self {
            sampler: Arc::clone(&self.sampler),
        }
    }
}

impl<T> fmt::Debug for Arbitrary<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Arbitrary<{}>", type_name::<T>())
    }
}

impl<T: 'static> Arbitrary<T> {
    /// Build an arbitrary from a sampling function
    pub fn from_fn<F>(sampler: F) -> Self
    where
        F: Fn(&mut GenContext<'_>) -> FixtureResult<T> + Send + Sync + 'static,
    {
        Self {
            sampler: Arc::new(sampler),
        }
    }

    /// Draw one value within an ongoing generation
    pub fn sample(&self, ctx: &mut GenContext<'_>) -> FixtureResult<T> {
        (self.sampler)(ctx)
    }

    /// Draw one value outside of any generation call.
    ///
    /// Uses default options, so this is the entry point for external
    /// randomized-testing frameworks that own the RNG.
    pub fn generate(&self, rng: &mut dyn RngCore) -> FixtureResult<T> {
        let engine = Engine::global();
        let mut ctx = GenContext::new(rng, engine, engine.options());
        self.sample(&mut ctx)
    }

    /// Map produced values to another type
    pub fn map<U, F>(self, mapper: F) -> Arbitrary<U>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        Arbitrary::from_fn(move |ctx| self.sample(ctx).map(&mapper))
    }

    /// Keep only values accepted by `predicate`.
    ///
    /// Gives up with `GenerationExhausted` after `max_filter_attempts` draws.
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Arbitrary::from_fn(move |ctx| {
            let attempts = ctx.options().max_filter_attempts;
            for _ in 0..attempts {
                let value = self.sample(ctx)?;
                if predicate(&value) {
                    return Ok(value);
                }
            }
            Err(FixtureError::exhausted(
                format!("filter over {}", type_name::<T>()),
                attempts,
            ))
        })
    }

    /// Wrap values in `Option`, yielding `None` as the options dictate
    pub fn optional(self) -> Arbitrary<Option<T>> {
        Arbitrary::from_fn(move |ctx| {
            let not_null = ctx.options().default_not_null;
            let null_probability = ctx.options().nullable_field_probability;
            if !not_null && ctx.rng().gen_bool(null_probability) {
                return Ok(None);
            }
            self.sample(ctx).map(Some)
        })
    }

    /// Collect `min_len..=max_len` draws into a `Vec`
    pub fn list(self, min_len: usize, max_len: usize) -> Arbitrary<Vec<T>> {
        Arbitrary::from_fn(move |ctx| {
            if min_len > max_len {
                return Err(FixtureError::configuration(format!(
                    "list length {}..={} is empty",
                    min_len, max_len
                )));
            }
            let len = ctx.rng().gen_range(min_len..=max_len);
            (0..len).map(|_| self.sample(ctx)).collect()
        })
    }
}

impl<T: Clone + Send + Sync + 'static> Arbitrary<T> {
    /// Always produce `value`
    pub fn just(value: T) -> Self {
        Arbitrary::from_fn(move |_ctx| Ok(value.clone()))
    }

    /// Choose uniformly from `values`
    pub fn one_of(values: Vec<T>) -> Self {
        Arbitrary::from_fn(move |ctx| {
            if values.is_empty() {
                return Err(FixtureError::configuration(
                    "one_of requires at least one value",
                ));
            }
            let index = ctx.rng().gen_range(0..values.len());
            Ok(values[index].clone())
        })
    }
}

impl<T> Arbitrary<T>
where
    T: SampleUniform + PartialOrd + Copy + fmt::Debug + Send + Sync + 'static,
{
    /// Draw uniformly from `min..=max`
    pub fn range(min: T, max: T) -> Self {
        Arbitrary::from_fn(move |ctx| {
            if min > max {
                return Err(FixtureError::configuration(format!(
                    "range {:?}..={:?} is empty",
                    min, max
                )));
            }
            Ok(ctx.rng().gen_range(min..=max))
        })
    }
}

impl Arbitrary<String> {
    /// Alphanumeric strings with a length in `min_len..=max_len`
    pub fn alphanumeric(min_len: usize, max_len: usize) -> Self {
        Arbitrary::from_fn(move |ctx| {
            if min_len > max_len {
                return Err(FixtureError::configuration(format!(
                    "string length {}..={} is empty",
                    min_len, max_len
                )));
            }
            let rng = ctx.rng();
            let len = rng.gen_range(min_len..=max_len);
            Ok((0..len)
                .map(|_| char::from(Alphanumeric.sample(rng)))
                .collect())
        })
    }
}

/// Create an arbitrary that always produces the same value
pub fn just<T: Clone + Send + Sync + 'static>(value: T) -> Arbitrary<T> {
    Arbitrary::just(value)
}

/// Create an arbitrary that chooses from a collection of values
pub fn one_of<T: Clone + Send + Sync + 'static>(values: Vec<T>) -> Arbitrary<T> {
    Arbitrary::one_of(values)
}

/// Create an arbitrary for values in an inclusive range
pub fn range<T>(min: T, max: T) -> Arbitrary<T>
where
    T: SampleUniform + PartialOrd + Copy + fmt::Debug + Send + Sync + 'static,
{
    Arbitrary::range(min, max)
}

/// An [`Arbitrary`] with its value type erased, keyed by `TypeId`
#[derive(Clone)]
pub struct ErasedArbitrary {
    type_id: TypeId,
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ErasedArbitrary {
    /// Erase the value type of `arbitrary`
    pub fn new<V: 'static>(arbitrary: Arbitrary<V>) -> Self {
        Self {
            type_id: TypeId::of::<V>(),
            type_name: type_name::<V>(),
            inner: Arc::new(arbitrary),
        }
    }

    /// `TypeId` of the produced values
    pub fn value_type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the produced value type
    pub fn value_type_name(&self) -> &'static str {
        self.type_name
    }

    /// Recover the typed arbitrary, if it produces `V`
    pub fn downcast<V: 'static>(&self) -> Option<&Arbitrary<V>> {
        self.inner.downcast_ref::<Arbitrary<V>>()
    }
}

impl fmt::Debug for ErasedArbitrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErasedArbitrary<{}>", self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_just() {
        let mut rng = rng();
        let arbitrary = just(42);
        for _ in 0..10 {
            assert_eq!(arbitrary.generate(&mut rng).unwrap(), 42);
        }
    }

    #[test]
    fn test_range_stays_in_bounds() {
        let mut rng = rng();
        let arbitrary = range(-3i32, 7);
        for _ in 0..1000 {
            let value = arbitrary.generate(&mut rng).unwrap();
            assert!((-3..=7).contains(&value));
        }
    }

    #[test]
    fn test_empty_range_is_configuration_error() {
        let mut rng = rng();
        let error = range(10u8, 1).generate(&mut rng).unwrap_err();
        assert!(matches!(error, FixtureError::Configuration { .. }));
    }

    #[test]
    fn test_one_of() {
        let mut rng = rng();
        let values = vec!["a", "b", "c"];
        let arbitrary = one_of(values.clone());
        for _ in 0..20 {
            assert!(values.contains(&arbitrary.generate(&mut rng).unwrap()));
        }

        let error = one_of(Vec::<i32>::new()).generate(&mut rng).unwrap_err();
        assert!(matches!(error, FixtureError::Configuration { .. }));
    }

    #[test]
    fn test_map_and_filter() {
        let mut rng = rng();
        let arbitrary = range(1, 100).filter(|x| x % 2 == 0).map(|x| x * 10);
        for _ in 0..100 {
            let value = arbitrary.generate(&mut rng).unwrap();
            assert_eq!(value % 20, 0);
            assert!((20..=1000).contains(&value));
        }
    }

    #[test]
    fn test_filter_exhaustion() {
        let mut rng = rng();
        let error = range(1, 10)
            .filter(|x| *x > 100)
            .generate(&mut rng)
            .unwrap_err();
        assert_eq!(
            error,
            FixtureError::exhausted("filter over i32", 1000)
        );
    }

    #[test]
    fn test_alphanumeric_strings() {
        let mut rng = rng();
        let arbitrary = Arbitrary::alphanumeric(3, 5);
        for _ in 0..100 {
            let value = arbitrary.generate(&mut rng).unwrap();
            assert!((3..=5).contains(&value.len()));
            assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_list_lengths() {
        let mut rng = rng();
        let arbitrary = just(1u8).list(2, 4);
        for _ in 0..50 {
            let value = arbitrary.generate(&mut rng).unwrap();
            assert!((2..=4).contains(&value.len()));
            assert!(value.iter().all(|v| *v == 1));
        }
    }

    #[test]
    fn test_optional_produces_both_variants() {
        let mut rng = rng();
        let arbitrary = just(5).optional();
        let values: Vec<_> = (0..500)
            .map(|_| arbitrary.generate(&mut rng).unwrap())
            .collect();
        assert!(values.iter().any(Option::is_none));
        assert!(values.iter().any(Option::is_some));
    }

    #[test]
    fn test_erased_downcast() {
        let erased = ErasedArbitrary::new(just(7u16));
        assert_eq!(erased.value_type_id(), TypeId::of::<u16>());
        assert_eq!(erased.value_type_name(), "u16");
        assert!(erased.downcast::<u32>().is_none());

        let mut rng = rng();
        let typed = erased.downcast::<u16>().unwrap();
        assert_eq!(typed.generate(&mut rng).unwrap(), 7);
    }
}
