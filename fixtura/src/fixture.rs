//! Traits through which types take part in fixture generation.

use crate::arbitrary::Arbitrary;
use crate::context::GenContext;
use crate::descriptor::{Domain, TypeDescriptor};
use crate::error::{FixtureError, FixtureResult};
use crate::fields::FieldArbitraries;

/// Field value types with a default generation strategy
///
/// Implemented for the primitive types, `String`, `Option<T>`, `Box<T>`,
/// `Vec<T>` and every `#[derive(Fixture)]` type.
pub trait Generate: Clone + Send + Sync + 'static {
    /// The unconstrained domain of the type
    fn domain() -> Domain;

    /// Build a strategy drawing from `domain`.
    ///
    /// Fails with a configuration error when `domain` does not describe
    /// values of this type or is empty.
    fn arbitrary_for(domain: &Domain) -> FixtureResult<Arbitrary<Self>>;

    /// Strategy over the unconstrained domain
    fn arbitrary() -> FixtureResult<Arbitrary<Self>> {
        Self::arbitrary_for(&Self::domain())
    }
}

/// Types that can be described field by field and assembled from draws
///
/// Usually derived with `#[derive(Fixture)]`.
pub trait Fixture: Generate {
    /// Describe the fields of the type
    fn describe() -> FixtureResult<TypeDescriptor>;

    /// Assemble one instance, drawing every field from `fields`
    fn assemble(ctx: &mut GenContext<'_>, fields: &FieldArbitraries) -> FixtureResult<Self>;

    /// Pin every field of `fields` to the matching value of `self`
    fn seed_fields(&self, fields: &mut FieldArbitraries) -> FixtureResult<()>;
}

/// `Generate::arbitrary_for` for fixture types used as fields of other fixtures
pub fn nested_arbitrary<T: Fixture>(domain: &Domain) -> FixtureResult<Arbitrary<T>> {
    match domain {
        Domain::Nested { .. } => Ok(Arbitrary::from_fn(|ctx| ctx.nested::<T>())),
        other => Err(FixtureError::configuration(format!(
            "domain {} cannot produce {}",
            other,
            std::any::type_name::<T>()
        ))),
    }
}
