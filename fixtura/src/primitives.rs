//! Default strategies for primitive types and basic containers.

use std::any::type_name;

use num_traits::{Bounded, NumCast};
use rand::Rng;

use crate::arbitrary::Arbitrary;
use crate::descriptor::Domain;
use crate::error::{FixtureError, FixtureResult};
use crate::fixture::Generate;

/// Default length bounds of generated strings; never empty
pub const DEFAULT_TEXT_LENGTH: (usize, usize) = (1, 16);
/// Default length bounds of generated lists
pub const DEFAULT_LIST_LENGTH: (usize, usize) = (0, 3);

fn domain_mismatch<T>(domain: &Domain) -> FixtureError {
    FixtureError::configuration(format!(
        "domain {} cannot produce {}",
        domain,
        type_name::<T>()
    ))
}

fn check_length(min_len: usize, max_len: usize) -> FixtureResult<()> {
    if min_len > max_len {
        return Err(FixtureError::configuration(format!(
            "length {}..={} is empty",
            min_len, max_len
        )));
    }
    Ok(())
}

fn narrow<T: NumCast>(bound: i128) -> FixtureResult<T> {
    NumCast::from(bound).ok_or_else(|| {
        FixtureError::configuration(format!(
            "bound {} does not fit in {}",
            bound,
            type_name::<T>()
        ))
    })
}

macro_rules! impl_int_generate {
    ($($t:ty),*) => {
        $(
            impl Generate for $t {
                fn domain() -> Domain {
                    Domain::Integer {
                        min: <$t as Bounded>::min_value() as i128,
                        max: <$t as Bounded>::max_value() as i128,
                    }
                }

                fn arbitrary_for(domain: &Domain) -> FixtureResult<Arbitrary<Self>> {
                    let Domain::Integer { min, max } = domain else {
                        return Err(domain_mismatch::<$t>(domain));
                    };
                    let min: $t = narrow(*min)?;
                    let max: $t = narrow(*max)?;
                    if min > max {
                        return Err(FixtureError::configuration(format!(
                            "range {}..={} is empty",
                            min, max
                        )));
                    }
                    Ok(Arbitrary::from_fn(move |ctx| Ok(ctx.rng().gen_range(min..=max))))
                }
            }
        )*
    };
}

impl_int_generate!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

macro_rules! impl_float_generate {
    ($($t:ty => $bits:ty),*) => {
        $(
            impl Generate for $t {
                fn domain() -> Domain {
                    Domain::Float {
                        min: <$t>::MIN as f64,
                        max: <$t>::MAX as f64,
                    }
                }

                fn arbitrary_for(domain: &Domain) -> FixtureResult<Arbitrary<Self>> {
                    let Domain::Float { min, max } = *domain else {
                        return Err(domain_mismatch::<$t>(domain));
                    };
                    if !(min <= max)
                        || min < <$t>::MIN as f64
                        || max > <$t>::MAX as f64
                    {
                        return Err(FixtureError::configuration(format!(
                            "range {}..={} is not a finite {} range",
                            min, max, stringify!($t)
                        )));
                    }
                    let (min, max) = (min as $t, max as $t);

                    // Uniform sampling scales the width by 1 / (1 - EPSILON).
                    if ((max - min) / (1.0 - <$t>::EPSILON)).is_finite() {
                        return Ok(Arbitrary::from_fn(move |ctx| {
                            Ok(ctx.rng().gen_range(min..=max))
                        }));
                    }

                    // The width overflows, so draw finite bit patterns instead.
                    Ok(Arbitrary::from_fn(move |ctx| {
                        let attempts = ctx.options().max_filter_attempts;
                        for _ in 0..attempts {
                            let value = <$t>::from_bits(ctx.rng().r#gen::<$bits>());
                            if value.is_finite() && min <= value && value <= max {
                                return Ok(value);
                            }
                        }
                        Err(FixtureError::exhausted(stringify!($t), attempts))
                    }))
                }
            }
        )*
    };
}

impl_float_generate!(f32 => u32, f64 => u64);

impl Generate for bool {
    fn domain() -> Domain {
        Domain::Bool
    }

    fn arbitrary_for(domain: &Domain) -> FixtureResult<Arbitrary<Self>> {
        match domain {
            Domain::Bool => Ok(Arbitrary::from_fn(|ctx| Ok(ctx.rng().r#gen()))),
            other => Err(domain_mismatch::<bool>(other)),
        }
    }
}

impl Generate for char {
    fn domain() -> Domain {
        Domain::Char
    }

    fn arbitrary_for(domain: &Domain) -> FixtureResult<Arbitrary<Self>> {
        match domain {
            Domain::Char => Ok(Arbitrary::from_fn(|ctx| Ok(ctx.rng().r#gen()))),
            other => Err(domain_mismatch::<char>(other)),
        }
    }
}

impl Generate for String {
    fn domain() -> Domain {
        let (min_len, max_len) = DEFAULT_TEXT_LENGTH;
        Domain::Text { min_len, max_len }
    }

    fn arbitrary_for(domain: &Domain) -> FixtureResult<Arbitrary<Self>> {
        match *domain {
            Domain::Text { min_len, max_len } => {
                check_length(min_len, max_len)?;
                Ok(Arbitrary::alphanumeric(min_len, max_len))
            }
            ref other => Err(domain_mismatch::<String>(other)),
        }
    }
}

impl<T: Generate> Generate for Option<T> {
    fn domain() -> Domain {
        Domain::Optional(Box::new(T::domain()))
    }

    fn arbitrary_for(domain: &Domain) -> FixtureResult<Arbitrary<Self>> {
        let Domain::Optional(inner) = domain else {
            return Err(domain_mismatch::<Self>(domain));
        };
        let arbitrary = T::arbitrary_for(inner)?.optional();
        if !matches!(**inner, Domain::Nested { .. }) {
            return Ok(arbitrary);
        }

        // A nullable edge to a nested fixture ends the chain at the depth limit.
        Ok(Arbitrary::from_fn(move |ctx| {
            let options = ctx.options();
            if !options.default_not_null && ctx.depth() >= options.recursion_depth_limit {
                return Ok(None);
            }
            arbitrary.sample(ctx)
        }))
    }
}

impl<T: Generate> Generate for Box<T> {
    fn domain() -> Domain {
        T::domain()
    }

    fn arbitrary_for(domain: &Domain) -> FixtureResult<Arbitrary<Self>> {
        Ok(T::arbitrary_for(domain)?.map(Box::new))
    }
}

impl<T: Generate> Generate for Vec<T> {
    fn domain() -> Domain {
        let (min_len, max_len) = DEFAULT_LIST_LENGTH;
        Domain::List {
            element: Box::new(T::domain()),
            min_len,
            max_len,
        }
    }

    fn arbitrary_for(domain: &Domain) -> FixtureResult<Arbitrary<Self>> {
        match domain {
            Domain::List {
                element,
                min_len,
                max_len,
            } => {
                check_length(*min_len, *max_len)?;
                Ok(T::arbitrary_for(element)?.list(*min_len, *max_len))
            }
            other => Err(domain_mismatch::<Self>(other)),
        }
    }
}
