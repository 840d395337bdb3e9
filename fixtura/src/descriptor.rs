//! Static structural descriptions of fixture types.

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError};

use crossbeam::sync::ShardedLock;
use tracing::debug;

use crate::arbitrary::{Arbitrary, ErasedArbitrary};
use crate::error::{FixtureError, FixtureResult};
use crate::fixture::{Fixture, Generate};

/// Declared value domain of a field
#[derive(Debug, Clone, PartialEq)]
pub enum Domain {
    Bool,
    Char,
    /// Inclusive integer bounds
    Integer { min: i128, max: i128 },
    /// Inclusive float bounds
    Float { min: f64, max: f64 },
    /// Strings with a length in `min_len..=max_len`
    Text { min_len: usize, max_len: usize },
    /// `Option` of the inner domain
    Optional(Box<Domain>),
    /// Lists of `min_len..=max_len` elements
    List {
        element: Box<Domain>,
        min_len: usize,
        max_len: usize,
    },
    /// Another fixture type, generated recursively
    Nested { type_name: &'static str },
    /// Values come from a field-level strategy
    Custom,
    /// No default strategy; the value must be supplied
    Opaque,
}

impl Domain {
    /// Domain of a nested fixture type
    pub fn nested<T: 'static>() -> Self {
        Domain::Nested {
            type_name: type_name::<T>(),
        }
    }

    /// Narrow integer bounds, looking through `Optional`
    pub fn with_int_bounds(self, min: i128, max: i128) -> FixtureResult<Self> {
        match self {
            Domain::Integer { .. } => Ok(Domain::Integer { min, max }),
            Domain::Float { .. } => Ok(Domain::Float {
                min: min as f64,
                max: max as f64,
            }),
            Domain::Optional(inner) => Ok(Domain::Optional(Box::new(
                inner.with_int_bounds(min, max)?,
            ))),
            other => Err(FixtureError::configuration(format!(
                "integer range {}..={} does not apply to {}",
                min, max, other
            ))),
        }
    }

    /// Narrow float bounds, looking through `Optional`
    pub fn with_float_bounds(self, min: f64, max: f64) -> FixtureResult<Self> {
        match self {
            Domain::Float { .. } => Ok(Domain::Float { min, max }),
            Domain::Optional(inner) => Ok(Domain::Optional(Box::new(
                inner.with_float_bounds(min, max)?,
            ))),
            other => Err(FixtureError::configuration(format!(
                "float range {}..={} does not apply to {}",
                min, max, other
            ))),
        }
    }

    /// Set the length of a string or list domain, looking through `Optional`
    pub fn with_length(self, min_len: usize, max_len: usize) -> FixtureResult<Self> {
        match self {
            Domain::Text { .. } => Ok(Domain::Text { min_len, max_len }),
            Domain::List { element, .. } => Ok(Domain::List {
                element,
                min_len,
                max_len,
            }),
            Domain::Optional(inner) => Ok(Domain::Optional(Box::new(
                inner.with_length(min_len, max_len)?,
            ))),
            other => Err(FixtureError::configuration(format!(
                "length {}..={} does not apply to {}",
                min_len, max_len, other
            ))),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Bool => write!(f, "bool"),
            Domain::Char => write!(f, "char"),
            Domain::Integer { min, max } => write!(f, "integer in [{}, {}]", min, max),
            Domain::Float { min, max } => write!(f, "float in [{}, {}]", min, max),
            Domain::Text { min_len, max_len } => {
                write!(f, "text of length [{}, {}]", min_len, max_len)
            }
            Domain::Optional(inner) => write!(f, "optional {}", inner),
            Domain::List {
                element,
                min_len,
                max_len,
            } => write!(f, "list of [{}, {}] {}", min_len, max_len, element),
            Domain::Nested { type_name } => write!(f, "nested {}", type_name),
            Domain::Custom => write!(f, "custom"),
            Domain::Opaque => write!(f, "opaque"),
        }
    }
}

/// One field of a [`TypeDescriptor`]
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: &'static str,
    value_type_id: TypeId,
    value_type_name: &'static str,
    domain: Domain,
    default: Option<ErasedArbitrary>,
    declared: bool,
}

impl FieldSpec {
    /// A field drawn from the type's own default domain
    pub fn generated<V: Generate>(name: &'static str) -> FixtureResult<Self> {
        let mut spec = Self::constrained::<V>(name, V::domain())?;
        spec.declared = false;
        Ok(spec)
    }

    /// A field drawn from an explicitly declared domain
    pub fn constrained<V: Generate>(name: &'static str, domain: Domain) -> FixtureResult<Self> {
        let arbitrary = V::arbitrary_for(&domain).map_err(|err| err.in_field(name))?;
        Ok(Self {
            name,
            value_type_id: TypeId::of::<V>(),
            value_type_name: type_name::<V>(),
            domain,
            default: Some(ErasedArbitrary::new(arbitrary)),
            declared: true,
        })
    }

    /// A field whose integer bounds are narrowed to `min..=max`
    pub fn int_range<V: Generate>(name: &'static str, min: i128, max: i128) -> FixtureResult<Self> {
        let domain = V::domain()
            .with_int_bounds(min, max)
            .map_err(|err| err.in_field(name))?;
        Self::constrained::<V>(name, domain)
    }

    /// A field whose float bounds are narrowed to `min..=max`
    pub fn float_range<V: Generate>(name: &'static str, min: f64, max: f64) -> FixtureResult<Self> {
        let domain = V::domain()
            .with_float_bounds(min, max)
            .map_err(|err| err.in_field(name))?;
        Self::constrained::<V>(name, domain)
    }

    /// A string or list field with a length in `min_len..=max_len`
    pub fn sized<V: Generate>(
        name: &'static str,
        min_len: usize,
        max_len: usize,
    ) -> FixtureResult<Self> {
        let domain = V::domain()
            .with_length(min_len, max_len)
            .map_err(|err| err.in_field(name))?;
        Self::constrained::<V>(name, domain)
    }

    /// A field drawn from a field-level strategy
    pub fn with_arbitrary<V: 'static>(name: &'static str, arbitrary: Arbitrary<V>) -> Self {
        Self {
            name,
            value_type_id: TypeId::of::<V>(),
            value_type_name: type_name::<V>(),
            domain: Domain::Custom,
            default: Some(ErasedArbitrary::new(arbitrary)),
            declared: true,
        }
    }

    /// A field with no default strategy
    pub fn opaque<V: 'static>(name: &'static str) -> Self {
        Self {
            name,
            value_type_id: TypeId::of::<V>(),
            value_type_name: type_name::<V>(),
            domain: Domain::Opaque,
            default: None,
            declared: false,
        }
    }

    /// Field name as declared
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `TypeId` of the field type
    pub fn value_type_id(&self) -> TypeId {
        self.value_type_id
    }

    /// Name of the field type
    pub fn value_type_name(&self) -> &'static str {
        self.value_type_name
    }

    /// Declared value domain
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Strategy used when nothing overrides the field
    pub fn default_arbitrary(&self) -> Option<&ErasedArbitrary> {
        self.default.as_ref()
    }

    /// Whether the domain or strategy was declared on the field itself
    pub fn is_declared(&self) -> bool {
        self.declared
    }
}

/// Ordered field list of a fixture type
#[derive(Debug)]
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    fields: Vec<FieldSpec>,
    index: HashMap<&'static str, usize>,
}

impl TypeDescriptor {
    /// Start describing `T`
    pub fn builder<T: 'static>() -> TypeDescriptorBuilder {
        TypeDescriptorBuilder {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            fields: Vec::new(),
        }
    }

    /// Descriptor of a fieldless unit type
    pub fn unit<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// `TypeId` of the described type
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the described type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field called `name`
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&position| &self.fields[position])
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(FieldSpec::name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the type has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`TypeDescriptor`]
#[derive(Debug)]
pub struct TypeDescriptorBuilder {
    type_id: TypeId,
    type_name: &'static str,
    fields: Vec<FieldSpec>,
}

impl TypeDescriptorBuilder {
    /// Append a field
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Finish the descriptor.
    ///
    /// A type without any field cannot be inspected and is rejected; unit
    /// types use [`TypeDescriptor::unit`].
    pub fn build(self) -> FixtureResult<TypeDescriptor> {
        if self.fields.is_empty() {
            return Err(FixtureError::unsupported_type(self.type_name));
        }

        let mut index = HashMap::with_capacity(self.fields.len());
        for (position, spec) in self.fields.iter().enumerate() {
            if index.insert(spec.name, position).is_some() {
                return Err(FixtureError::configuration_for_field(
                    format!("duplicate field in {}", self.type_name),
                    spec.name,
                ));
            }
        }

        Ok(TypeDescriptor {
            type_id: self.type_id,
            type_name: self.type_name,
            fields: self.fields,
            index,
        })
    }
}

/// Read-mostly cache of descriptors keyed by type
///
/// Lookups of cached types only take the shared side of the lock. A miss
/// describes the type without holding the lock and then inserts only if no
/// other thread got there first, so every caller observes one descriptor
/// per type.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: ShardedLock<HashMap<TypeId, Arc<TypeDescriptor>>>,
}

impl DescriptorCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached descriptor of `T`, describing it on first use
    pub fn get_or_describe<T: Fixture>(&self) -> FixtureResult<Arc<TypeDescriptor>> {
        let key = TypeId::of::<T>();
        if let Some(descriptor) = self.get(key) {
            return Ok(descriptor);
        }

        let described = Arc::new(T::describe()?);
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let descriptor = entries.entry(key).or_insert_with(|| {
            debug!(
                type_name = described.type_name(),
                fields = described.len(),
                "described fixture type"
            );
            Arc::clone(&described)
        });
        Ok(Arc::clone(descriptor))
    }

    /// Cached descriptor for `key`, if any
    pub fn get(&self, key: TypeId) -> Option<Arc<TypeDescriptor>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    /// Number of cached descriptors
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been described yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Probe;

    #[test]
    fn test_builder_indexes_fields_in_order() {
        let descriptor = TypeDescriptor::builder::<Probe>()
            .field(FieldSpec::generated::<i32>("id").unwrap())
            .field(FieldSpec::generated::<String>("name").unwrap())
            .build()
            .unwrap();

        assert_eq!(descriptor.type_id(), TypeId::of::<Probe>());
        assert_eq!(descriptor.len(), 2);
        assert_eq!(
            descriptor.field_names().collect::<Vec<_>>(),
            vec!["id", "name"]
        );

        let id = descriptor.field("id").unwrap();
        assert_eq!(id.value_type_id(), TypeId::of::<i32>());
        assert_eq!(
            id.domain(),
            &Domain::Integer {
                min: i32::MIN as i128,
                max: i32::MAX as i128
            }
        );
        assert!(!id.is_declared());
        assert!(id.default_arbitrary().is_some());
        assert!(descriptor.field("missing").is_none());
    }

    #[test]
    fn test_empty_descriptor_is_unsupported() {
        let error = TypeDescriptor::builder::<Probe>().build().unwrap_err();
        assert!(matches!(error, FixtureError::UnsupportedType { .. }));

        let unit = TypeDescriptor::unit::<Probe>();
        assert!(unit.is_empty());
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let error = TypeDescriptor::builder::<Probe>()
            .field(FieldSpec::generated::<i32>("id").unwrap())
            .field(FieldSpec::generated::<u8>("id").unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(
            error,
            FixtureError::Configuration { field: Some(ref f), .. } if f == "id"
        ));
    }

    #[test]
    fn test_constrained_domain_must_fit_type() {
        let error = FieldSpec::constrained::<u8>("small", Domain::Integer { min: 0, max: 300 })
            .unwrap_err();
        assert!(matches!(
            error,
            FixtureError::Configuration { field: Some(ref f), .. } if f == "small"
        ));

        let error = FieldSpec::constrained::<String>("name", Domain::Bool).unwrap_err();
        assert!(matches!(error, FixtureError::Configuration { .. }));

        let spec =
            FieldSpec::constrained::<u8>("small", Domain::Integer { min: 1, max: 9 }).unwrap();
        assert!(spec.is_declared());
    }

    #[test]
    fn test_domain_narrowing() {
        let domain = <Option<u8> as Generate>::domain()
            .with_int_bounds(1, 5)
            .unwrap();
        assert_eq!(
            domain,
            Domain::Optional(Box::new(Domain::Integer { min: 1, max: 5 }))
        );

        let domain = <Vec<String> as Generate>::domain().with_length(2, 2).unwrap();
        assert!(matches!(domain, Domain::List { min_len: 2, max_len: 2, .. }));

        assert!(Domain::Bool.with_length(1, 2).is_err());
        assert!(Domain::Text { min_len: 1, max_len: 2 }
            .with_float_bounds(0.0, 1.0)
            .is_err());
    }

    #[test]
    fn test_opaque_field_has_no_default() {
        let spec = FieldSpec::opaque::<std::time::Instant>("at");
        assert_eq!(spec.domain(), &Domain::Opaque);
        assert!(spec.default_arbitrary().is_none());
    }
}
