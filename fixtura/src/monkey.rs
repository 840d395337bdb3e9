//! The `Fixtura` entry point.

use std::any::type_name;
use std::sync::{Arc, OnceLock};

use rand::rngs::StdRng;

use crate::arbitrary::Arbitrary;
use crate::builder::ArbitraryBuilder;
use crate::config::ArbitraryOption;
use crate::customizer::Customizer;
use crate::descriptor::{DescriptorCache, TypeDescriptor};
use crate::error::{FixtureError, FixtureResult};
use crate::fixture::Fixture;
use crate::registry::TypeRegistry;
use crate::rng::RngSource;
use crate::stream::Fixtures;

/// State shared by every generation call of one `Fixtura`
#[derive(Debug)]
pub(crate) struct Engine {
    descriptors: DescriptorCache,
    registry: TypeRegistry,
    options: ArbitraryOption,
    rng: RngSource,
}

impl Engine {
    fn new(registry: TypeRegistry, options: ArbitraryOption, rng: RngSource) -> Self {
        Self {
            descriptors: DescriptorCache::new(),
            registry,
            options,
            rng,
        }
    }

    /// Engine backing arbitraries sampled outside of any `Fixtura`
    pub(crate) fn global() -> &'static Engine {
        static GLOBAL_ENGINE: OnceLock<Engine> = OnceLock::new();
        GLOBAL_ENGINE.get_or_init(|| {
            Engine::new(
                TypeRegistry::new(),
                ArbitraryOption::default(),
                RngSource::from_entropy(),
            )
        })
    }

    pub(crate) fn describe<T: Fixture>(&self) -> FixtureResult<Arc<TypeDescriptor>> {
        self.descriptors.get_or_describe::<T>()
    }

    pub(crate) fn descriptors(&self) -> &DescriptorCache {
        &self.descriptors
    }

    pub(crate) fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub(crate) fn options(&self) -> &ArbitraryOption {
        &self.options
    }

    pub(crate) fn next_rng(&self) -> StdRng {
        self.rng.next_rng()
    }
}

/// Generates fixtures of any [`Fixture`] type
///
/// Each instance owns its descriptor cache, type registry and options.
/// Cloning is cheap and clones share all three; independently built
/// instances describe every type again.
///
/// ```rust
/// use fixtura::{Customizer, Fixtura, Fixture};
///
/// #[derive(Debug, Clone, Fixture)]
/// struct Account {
///     #[fixture(range = "1..=1000")]
///     id: u32,
///     owner: String,
/// }
///
/// let fixtura = Fixtura::new();
/// let accounts: Vec<Account> = fixtura
///     .give_me_list_with(3, [Customizer::set("owner", fixtura::just("alice".to_string()))])
///     .unwrap();
///
/// assert_eq!(accounts.len(), 3);
/// assert!(accounts.iter().all(|a| (1..=1000).contains(&a.id) && a.owner == "alice"));
/// ```
#[derive(Debug, Clone)]
pub struct Fixtura {
    engine: Arc<Engine>,
}

impl Default for Fixtura {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixtura {
    /// An instance with default options, unseeded
    pub fn new() -> Self {
        Self {
            engine: Arc::new(Engine::new(
                TypeRegistry::new(),
                ArbitraryOption::default(),
                RngSource::from_entropy(),
            )),
        }
    }

    /// Configure a new instance
    pub fn builder() -> FixturaBuilder {
        FixturaBuilder::default()
    }

    /// Default options of builders created by this instance
    pub fn options(&self) -> &ArbitraryOption {
        self.engine.options()
    }

    /// Cached descriptor of `T`
    pub fn describe<T: Fixture>(&self) -> FixtureResult<Arc<TypeDescriptor>> {
        self.engine.describe::<T>()
    }

    /// Number of descriptors cached so far
    pub fn described_types(&self) -> usize {
        self.engine.descriptors().len()
    }

    /// Generate one fixture
    pub fn give_me_one<T: Fixture>(&self) -> FixtureResult<T> {
        self.give_me_builder::<T>().sample()
    }

    /// Generate one fixture with customizers applied in order
    pub fn give_me_one_with<T, I>(&self, customizers: I) -> FixtureResult<T>
    where
        T: Fixture,
        I: IntoIterator<Item = Customizer<T>>,
    {
        self.customized_builder(customizers).sample()
    }

    /// Endless sequence of independently generated fixtures
    pub fn give_me<T: Fixture>(&self) -> Fixtures<T> {
        self.give_me_builder::<T>().fixtures()
    }

    /// Endless sequence of customized fixtures
    pub fn give_me_with<T, I>(&self, customizers: I) -> Fixtures<T>
    where
        T: Fixture,
        I: IntoIterator<Item = Customizer<T>>,
    {
        self.customized_builder(customizers).fixtures()
    }

    /// Exactly `n` fixtures, or the first error
    pub fn give_me_list<T: Fixture>(&self, n: usize) -> FixtureResult<Vec<T>> {
        self.give_me_builder::<T>().sample_list(n)
    }

    /// Exactly `n` customized fixtures, or the first error
    pub fn give_me_list_with<T, I>(&self, n: usize, customizers: I) -> FixtureResult<Vec<T>>
    where
        T: Fixture,
        I: IntoIterator<Item = Customizer<T>>,
    {
        self.customized_builder(customizers).sample_list(n)
    }

    /// The producer of `T` itself, for composition with other strategies
    pub fn give_me_arbitrary<T: Fixture>(&self) -> Arbitrary<T> {
        self.give_me_builder::<T>().arbitrary()
    }

    /// Reusable builder of `T` under the instance's options
    pub fn give_me_builder<T: Fixture>(&self) -> ArbitraryBuilder<T> {
        ArbitraryBuilder::new(
            Arc::clone(&self.engine),
            Arc::new(self.engine.options().clone()),
        )
    }

    /// Reusable builder of `T` under `options`
    pub fn give_me_builder_with_options<T: Fixture>(
        &self,
        options: ArbitraryOption,
    ) -> FixtureResult<ArbitraryBuilder<T>> {
        options.validate()?;
        Ok(ArbitraryBuilder::new(
            Arc::clone(&self.engine),
            Arc::new(options),
        ))
    }

    /// Builder whose fields default to the values of `example`
    pub fn give_me_builder_from<T: Fixture>(&self, example: T) -> ArbitraryBuilder<T> {
        self.give_me_builder::<T>()
            .customize(Customizer::from_example(example))
    }

    /// Registered strategy of a type that does not implement [`Fixture`]
    pub fn arbitrary_of<T: 'static>(&self) -> FixtureResult<Arbitrary<T>> {
        self.engine
            .registry()
            .get::<T>()
            .cloned()
            .ok_or_else(|| FixtureError::unsupported_type(type_name::<T>()))
    }

    fn customized_builder<T, I>(&self, customizers: I) -> ArbitraryBuilder<T>
    where
        T: Fixture,
        I: IntoIterator<Item = Customizer<T>>,
    {
        customizers
            .into_iter()
            .fold(self.give_me_builder::<T>(), ArbitraryBuilder::customize)
    }
}

/// Configures a [`Fixtura`]
#[derive(Debug, Default)]
pub struct FixturaBuilder {
    options: ArbitraryOption,
    seed: Option<u64>,
    registry: TypeRegistry,
}

impl FixturaBuilder {
    /// Default options for every builder of the instance
    pub fn options(mut self, options: ArbitraryOption) -> Self {
        self.options = options;
        self
    }

    /// Make the sequence of generated fixtures reproducible
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Strategy for every field of type `T` without a declared domain.
    ///
    /// This is also how fields of types without a default strategy get
    /// their values.
    pub fn register<T: 'static>(mut self, arbitrary: Arbitrary<T>) -> Self {
        self.registry.register(arbitrary);
        self
    }

    /// Validate the options and build the instance
    pub fn build(self) -> FixtureResult<Fixtura> {
        self.options.validate()?;
        Ok(Fixtura {
            engine: Arc::new(Engine::new(
                self.registry,
                self.options,
                RngSource::new(self.seed),
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::GenContext;
    use crate::descriptor::{Domain, FieldSpec};
    use crate::fields::FieldArbitraries;
    use crate::fixture::{Generate, nested_arbitrary};

    #[derive(Debug, Clone, PartialEq)]
    struct Pixel {
        r: u8,
        g: u8,
    }

    impl Generate for Pixel {
        fn domain() -> Domain {
            Domain::nested::<Self>()
        }

        fn arbitrary_for(domain: &Domain) -> FixtureResult<Arbitrary<Self>> {
            nested_arbitrary::<Self>(domain)
        }
    }

    impl Fixture for Pixel {
        fn describe() -> FixtureResult<TypeDescriptor> {
            TypeDescriptor::builder::<Self>()
                .field(FieldSpec::generated::<u8>("r")?)
                .field(FieldSpec::int_range::<u8>("g", 0, 15)?)
                .build()
        }

        fn assemble(ctx: &mut GenContext<'_>, fields: &FieldArbitraries) -> FixtureResult<Self> {
            Ok(Self {
                r: fields.draw("r", ctx)?,
                g: fields.draw("g", ctx)?,
            })
        }

        fn seed_fields(&self, fields: &mut FieldArbitraries) -> FixtureResult<()> {
            fields.set_value("r", self.r)?;
            fields.set_value("g", self.g)?;
            Ok(())
        }
    }

    #[test]
    fn test_descriptors_are_cached_once() {
        let fixtura = Fixtura::new();
        assert_eq!(fixtura.described_types(), 0);

        let first = fixtura.describe::<Pixel>().unwrap();
        let second = fixtura.describe::<Pixel>().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fixtura.described_types(), 1);
    }

    #[test]
    fn test_give_me_variants_agree() {
        let fixtura = Fixtura::builder().seed(3).build().unwrap();

        assert!(fixtura.give_me_one::<Pixel>().unwrap().g <= 15);
        assert_eq!(fixtura.give_me_list::<Pixel>(4).unwrap().len(), 4);
        assert_eq!(fixtura.give_me::<Pixel>().take(4).count(), 4);
    }

    #[test]
    fn test_builder_from_example() {
        let fixtura = Fixtura::new();
        let example = Pixel { r: 200, g: 3 };

        let copy = fixtura.give_me_builder_from(example.clone()).sample().unwrap();

        assert_eq!(copy, example);
    }

    #[test]
    fn test_registered_strategy_applies_to_undeclared_fields() {
        let fixtura = Fixtura::builder()
            .register(Arbitrary::just(7u8))
            .build()
            .unwrap();

        for pixel in fixtura.give_me_list::<Pixel>(20).unwrap() {
            assert_eq!(pixel.r, 7);
            assert!(pixel.g <= 15);
        }
        assert_eq!(fixtura.arbitrary_of::<u8>().unwrap().generate(&mut rand::thread_rng()), Ok(7));
    }

    #[test]
    fn test_invalid_options_fail_to_build() {
        let mut options = ArbitraryOption::default();
        options.max_fixture_attempts = 0;

        assert!(Fixtura::builder().options(options.clone()).build().is_err());
        assert!(
            Fixtura::new()
                .give_me_builder_with_options::<Pixel>(options)
                .is_err()
        );
    }
}
