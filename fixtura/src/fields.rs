//! Per-call field overrides.

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::arbitrary::{Arbitrary, ErasedArbitrary};
use crate::config::ArbitraryOption;
use crate::context::GenContext;
use crate::descriptor::{FieldSpec, TypeDescriptor};
use crate::error::{FixtureError, FixtureResult};

/// Field name to override mapping for one generation call
///
/// Overrides are checked against the descriptor when they are added: the
/// field has to exist and the arbitrary has to produce the field's type.
#[derive(Debug, Clone)]
pub struct FieldArbitraries {
    descriptor: Arc<TypeDescriptor>,
    overrides: HashMap<&'static str, ErasedArbitrary>,
}

impl FieldArbitraries {
    /// Overrides for `descriptor`, initially empty
    pub fn new(descriptor: Arc<TypeDescriptor>) -> Self {
        Self {
            descriptor,
            overrides: HashMap::new(),
        }
    }

    /// Overrides seeded with the field-name defaults of `options`.
    ///
    /// Defaults naming a field that is missing, or that has another type,
    /// do not apply to this descriptor and are skipped.
    pub fn with_options(descriptor: Arc<TypeDescriptor>, options: &ArbitraryOption) -> Self {
        let mut fields = Self::new(descriptor);
        for (name, arbitrary) in options.field_defaults() {
            match fields.descriptor.field(name) {
                Some(spec) if spec.value_type_id() == arbitrary.value_type_id() => {
                    fields.overrides.insert(spec.name(), arbitrary.clone());
                }
                _ => trace!(
                    field = name,
                    type_name = fields.descriptor.type_name(),
                    "field default does not apply"
                ),
            }
        }
        fields
    }

    /// Descriptor the overrides are checked against
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Draw `name` from `arbitrary` instead of its default
    pub fn replace_arbitrary<V: 'static>(
        &mut self,
        name: &str,
        arbitrary: Arbitrary<V>,
    ) -> FixtureResult<&mut Self> {
        let spec = self.spec(name)?;
        if spec.value_type_id() != TypeId::of::<V>() {
            return Err(FixtureError::configuration_for_field(
                format!(
                    "field has type {} but the arbitrary produces {}",
                    spec.value_type_name(),
                    type_name::<V>()
                ),
                name,
            ));
        }
        let key = spec.name();
        self.overrides.insert(key, ErasedArbitrary::new(arbitrary));
        Ok(self)
    }

    /// Pin `name` to `value`
    pub fn set_value<V: Clone + Send + Sync + 'static>(
        &mut self,
        name: &str,
        value: V,
    ) -> FixtureResult<&mut Self> {
        self.replace_arbitrary(name, Arbitrary::just(value))
    }

    /// Drop the override of `name`, falling back to its default
    pub fn reset(&mut self, name: &str) -> FixtureResult<bool> {
        let key = self.spec(name)?.name();
        Ok(self.overrides.remove(key).is_some())
    }

    /// Whether `name` has an override
    pub fn is_overridden(&self, name: &str) -> bool {
        self.overrides.contains_key(name)
    }

    /// Number of overridden fields
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Whether no field is overridden
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Draw the value of field `name`.
    ///
    /// Sources are tried in order: the override, the strategy declared on
    /// the field, the type strategy registered on the instance, and the
    /// type's default domain.
    pub fn draw<V: 'static>(&self, name: &str, ctx: &mut GenContext<'_>) -> FixtureResult<V> {
        let spec = self.spec(name)?;

        if let Some(arbitrary) = self.overrides.get(spec.name()) {
            return typed::<V>(arbitrary, spec)?.sample(ctx);
        }

        let default = spec.default_arbitrary();
        if let Some(arbitrary) = default.filter(|_| spec.is_declared()) {
            return typed::<V>(arbitrary, spec)?.sample(ctx);
        }

        if let Some(arbitrary) = ctx.registered::<V>().cloned() {
            return arbitrary.sample(ctx);
        }

        match default {
            Some(arbitrary) => typed::<V>(arbitrary, spec)?.sample(ctx),
            None => Err(FixtureError::validation(
                self.descriptor.type_name(),
                spec.name(),
            )),
        }
    }

    fn spec(&self, name: &str) -> FixtureResult<&FieldSpec> {
        self.descriptor.field(name).ok_or_else(|| {
            FixtureError::configuration_for_field(
                format!("no such field in {}", self.descriptor.type_name()),
                name,
            )
        })
    }
}

fn typed<'a, V: 'static>(
    arbitrary: &'a ErasedArbitrary,
    spec: &FieldSpec,
) -> FixtureResult<&'a Arbitrary<V>> {
    arbitrary.downcast::<V>().ok_or_else(|| {
        FixtureError::configuration_for_field(
            format!(
                "field has type {} but was drawn as {}",
                spec.value_type_name(),
                type_name::<V>()
            ),
            spec.name(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldSpec;
    use crate::monkey::Engine;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[derive(Debug)]
    struct Order;

    fn descriptor() -> Arc<TypeDescriptor> {
        Arc::new(
            TypeDescriptor::builder::<Order>()
                .field(FieldSpec::int_range::<u32>("quantity", 1, 9).unwrap())
                .field(FieldSpec::generated::<String>("note").unwrap())
                .field(FieldSpec::opaque::<Vec<u8>>("payload"))
                .build()
                .unwrap(),
        )
    }

    fn draw<V: 'static>(fields: &FieldArbitraries, name: &str) -> FixtureResult<V> {
        let options = ArbitraryOption::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut ctx = GenContext::new(&mut rng, Engine::global(), &options);
        fields.draw::<V>(name, &mut ctx)
    }

    #[test]
    fn test_declared_domain_is_used_without_override() {
        let fields = FieldArbitraries::new(descriptor());
        for _ in 0..100 {
            assert!((1..=9).contains(&draw::<u32>(&fields, "quantity").unwrap()));
        }
    }

    #[test]
    fn test_override_wins() {
        let mut fields = FieldArbitraries::new(descriptor());
        fields.set_value("quantity", 42u32).unwrap();
        assert!(fields.is_overridden("quantity"));
        assert_eq!(draw::<u32>(&fields, "quantity").unwrap(), 42);

        assert!(fields.reset("quantity").unwrap());
        assert!(!fields.reset("quantity").unwrap());
        assert!(fields.is_empty());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut fields = FieldArbitraries::new(descriptor());
        let err = fields.set_value("missing", 1u32).unwrap_err();
        assert!(matches!(
            err,
            FixtureError::Configuration { field: Some(ref f), .. } if f == "missing"
        ));
    }

    #[test]
    fn test_mismatched_type_is_rejected() {
        let mut fields = FieldArbitraries::new(descriptor());
        assert!(fields.set_value("quantity", "ten".to_string()).is_err());
        assert!(fields.is_empty());
        assert!(draw::<i64>(&fields, "quantity").is_err());
    }

    #[test]
    fn test_opaque_field_needs_a_source() {
        let mut fields = FieldArbitraries::new(descriptor());
        assert_eq!(
            draw::<Vec<u8>>(&fields, "payload").unwrap_err(),
            FixtureError::validation(std::any::type_name::<Order>(), "payload")
        );

        fields.set_value("payload", vec![1u8, 2]).unwrap();
        assert_eq!(draw::<Vec<u8>>(&fields, "payload").unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_option_field_defaults_apply_where_they_fit() {
        let options = ArbitraryOption::builder()
            .field_default("note", Arbitrary::just("n/a".to_string()))
            .field_default("quantity", Arbitrary::just(-1i64))
            .field_default("absent", Arbitrary::just(0u8))
            .build()
            .unwrap();
        let fields = FieldArbitraries::with_options(descriptor(), &options);

        assert_eq!(fields.len(), 1);
        assert!(fields.is_overridden("note"));
        assert_eq!(draw::<String>(&fields, "note").unwrap(), "n/a");
    }
}
