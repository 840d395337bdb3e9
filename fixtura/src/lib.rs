//! # Fixtura - constraint-aware fixture generation
//!
//! Fixtura produces valid, randomized instances of your types for tests.
//! Types describe their fields statically through `#[derive(Fixture)]`;
//! callers shape generation with per-field overrides and post-construction
//! customizers.
//!
//! ## Quick Start
//!
//! ```rust
//! use fixtura::{Customizer, Fixtura, Fixture, just};
//!
//! #[derive(Debug, Clone, Fixture)]
//! struct TestClass {
//!     int_value: i32,
//!     string_value: String,
//! }
//!
//! let fixtura = Fixtura::new();
//!
//! let customizer = Customizer::set("int_value", just(-1)).on_fixture(|target: TestClass| {
//!     Some(TestClass {
//!         string_value: "test_value".to_string(),
//!         ..target
//!     })
//! });
//!
//! let fixtures = fixtura.give_me_list_with(10, [customizer]).unwrap();
//! assert_eq!(fixtures.len(), 10);
//! assert!(fixtures.iter().all(|f| f.int_value == -1 && f.string_value == "test_value"));
//! ```

extern crate self as fixtura;

pub mod arbitrary;
pub mod builder;
pub mod config;
pub mod context;
pub mod customizer;
pub mod descriptor;
pub mod error;
pub mod fields;
pub mod fixture;
pub mod monkey;
pub mod primitives;
pub mod registry;
pub mod rng;
pub mod stream;

pub use arbitrary::{Arbitrary, ErasedArbitrary, just, one_of, range};
pub use builder::ArbitraryBuilder;
pub use config::{ArbitraryOption, ArbitraryOptionBuilder, ConfigError};
pub use context::GenContext;
pub use customizer::Customizer;
pub use descriptor::{DescriptorCache, Domain, FieldSpec, TypeDescriptor, TypeDescriptorBuilder};
pub use error::{FixtureError, FixtureResult};
pub use fields::FieldArbitraries;
pub use fixture::{Fixture, Generate, nested_arbitrary};
pub use monkey::{Fixtura, FixturaBuilder};
pub use registry::TypeRegistry;
pub use rng::RngSource;
pub use stream::Fixtures;

// Re-export derive macro from separate crate when derive feature is enabled
#[cfg(feature = "derive")]
pub use fixtura_derive::Fixture;
