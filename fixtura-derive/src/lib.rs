//! Derive macro for the fixtura fixture generation library
//!
//! This crate provides `#[derive(Fixture)]`, which writes the static
//! descriptor of a struct together with the code assembling it from
//! generated field values.

use proc_macro::TokenStream;

mod derive;

/// Derive macro implementing `fixtura::Fixture` and `fixtura::Generate`
///
/// The struct must also implement `Clone`. Named, tuple and unit structs
/// are supported; tuple fields are named `"0"`, `"1"`, ...
///
/// # Basic Usage
///
/// ```rust
/// use fixtura::Fixture;
///
/// #[derive(Debug, Clone, Fixture)]
/// struct User {
///     id: u32,
///     name: String,
///     active: bool,
/// }
/// ```
///
/// # Customization
///
/// ```rust
/// use fixtura::{Arbitrary, Fixture};
///
/// #[derive(Debug, Clone, Fixture)]
/// struct CustomUser {
///     #[fixture(range = "1..=1000")]
///     id: u32,
///     #[fixture(length = "5..=20")]
///     name: String,
///     #[fixture(with = "always_true")]
///     active: bool,
/// }
///
/// fn always_true() -> Arbitrary<bool> {
///     Arbitrary::just(true)
/// }
/// ```
///
/// # Supported Attributes
///
/// - `range = "min..=max"` or `"min..max"`: integer or float bounds
/// - `length = "min..=max"`: length of strings and lists
/// - `with = "path::to_fn"`: field-level strategy, `fn() -> Arbitrary<FieldType>`
/// - `opaque`: the field type has no default strategy; its value comes from
///   an override or from a strategy registered for the type
///
/// # Generic Types
///
/// Type parameters receive a `fixtura::Generate` bound:
///
/// ```rust
/// use fixtura::Fixture;
///
/// #[derive(Debug, Clone, Fixture)]
/// struct Pair<T> {
///     first: T,
///     second: T,
/// }
/// ```
#[proc_macro_derive(Fixture, attributes(fixture))]
pub fn derive_fixture(input: TokenStream) -> TokenStream {
    derive::derive_fixture_impl(input)
}
