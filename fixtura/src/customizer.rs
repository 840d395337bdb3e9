//! Caller-supplied customizations of a generation call.

use std::fmt;
use std::sync::Arc;

use crate::arbitrary::Arbitrary;
use crate::descriptor::TypeDescriptor;
use crate::error::FixtureResult;
use crate::fields::FieldArbitraries;
use crate::fixture::Fixture;

type FieldsFn = dyn Fn(&TypeDescriptor, &mut FieldArbitraries) -> FixtureResult<()> + Send + Sync;
type FixtureFn<T> = dyn Fn(T) -> Option<T> + Send + Sync;

/// A pair of optional hooks applied around the construction of a fixture
///
/// `customize_fields` runs before construction and edits the field
/// overrides of the call. `customize_fixture` runs after construction and
/// may return a replacement, or `None` to reject the candidate so that the
/// call draws a fresh one.
pub struct Customizer<T> {
    fields: Option<Arc<FieldsFn>>,
    fixture: Option<Arc<FixtureFn<T>>>,
}

impl<T> Clone for Customizer<T> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            fixture: self.fixture.clone(),
        }
    }
}

impl<T> Default for Customizer<T> {
    fn default() -> Self {
        Self {
            fields: None,
            fixture: None,
        }
    }
}

impl<T> fmt::Debug for Customizer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Customizer")
            .field("fields", &self.fields.is_some())
            .field("fixture", &self.fixture.is_some())
            .finish()
    }
}

impl<T: 'static> Customizer<T> {
    /// A customizer that changes nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hook run before construction
    pub fn on_fields<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TypeDescriptor, &mut FieldArbitraries) -> FixtureResult<()> + Send + Sync + 'static,
    {
        self.fields = Some(Arc::new(hook));
        self
    }

    /// Set the hook run after construction
    pub fn on_fixture<F>(mut self, hook: F) -> Self
    where
        F: Fn(T) -> Option<T> + Send + Sync + 'static,
    {
        self.fixture = Some(Arc::new(hook));
        self
    }

    /// Draw field `name` from `arbitrary`
    pub fn set<V: 'static>(name: &'static str, arbitrary: Arbitrary<V>) -> Self {
        Self::new().on_fields(move |_, fields| {
            fields.replace_arbitrary(name, arbitrary.clone())?;
            Ok(())
        })
    }

    /// Transform every constructed fixture
    pub fn post_process<F>(transform: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        Self::new().on_fixture(move |target| Some(transform(target)))
    }

    /// Reject constructed fixtures failing `predicate`
    pub fn filter<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::new().on_fixture(move |target| predicate(&target).then_some(target))
    }

    /// Run the pre-construction hook, if set
    pub fn customize_fields(
        &self,
        descriptor: &TypeDescriptor,
        fields: &mut FieldArbitraries,
    ) -> FixtureResult<()> {
        match &self.fields {
            Some(hook) => hook(descriptor, fields),
            None => Ok(()),
        }
    }

    /// Run the post-construction hook, if set
    pub fn customize_fixture(&self, target: T) -> Option<T> {
        match &self.fixture {
            Some(hook) => hook(target),
            None => Some(target),
        }
    }
}

impl<T: Fixture> Customizer<T> {
    /// Pin every field to the matching value of `example`
    pub fn from_example(example: T) -> Self {
        Self::new().on_fields(move |_, fields| example.seed_fields(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_customizer_is_identity() {
        let customizer = Customizer::<i32>::new();
        assert_eq!(customizer.customize_fixture(5), Some(5));
    }

    #[test]
    fn test_post_process_and_filter() {
        let double = Customizer::post_process(|x: i32| x * 2);
        assert_eq!(double.customize_fixture(4), Some(8));

        let positive = Customizer::filter(|x: &i32| *x > 0);
        assert_eq!(positive.customize_fixture(3), Some(3));
        assert_eq!(positive.customize_fixture(-3), None);
    }

    #[test]
    fn test_clone_shares_hooks() {
        let customizer = Customizer::post_process(|s: String| s + "!");
        let copy = customizer.clone();
        assert_eq!(copy.customize_fixture("hi".to_string()), Some("hi!".to_string()));
        assert_eq!(
            format!("{:?}", customizer),
            "Customizer { fields: false, fixture: true }"
        );
    }
}
