//! Implementation of `#[derive(Fixture)]`
//!
//! The generated `describe` lists one `FieldSpec` per field in declaration
//! order, `assemble` draws every field by name, and `seed_fields` pins every
//! field to the value of an existing instance.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Field, Fields, GenericParam, LitStr, Member, Path, Result, Type,
    parse_macro_input, parse_quote,
};

/// Main entry point for the Fixture derive macro
pub fn derive_fixture_impl(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_fixture_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// How the value of one field is generated
#[derive(Debug, Clone, PartialEq)]
enum FieldStrategy {
    Default,
    IntRange(i128, i128),
    FloatRange(f64, f64),
    Length(usize, usize),
    With(Path),
    Opaque,
}

/// A field as seen by the generated code
struct FixtureField<'a> {
    member: Member,
    name: String,
    ty: &'a Type,
    strategy: FieldStrategy,
}

fn generate_fixture_impl(input: &DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    let data_struct = match &input.data {
        Data::Struct(data_struct) => data_struct,
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "Fixture can only be derived for structs; implement `fixtura::Generate` for enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Fixture derive is not supported for unions",
            ));
        }
    };

    let mut generics = input.generics.clone();
    add_trait_bounds(&mut generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = collect_fields(&data_struct.fields)?;
    let describe_body = describe_body(&data_struct.fields, &fields);
    let assemble_body = assemble_body(&data_struct.fields, &fields);
    let seed_body = seed_body(&fields);

    Ok(quote! {
        impl #impl_generics fixtura::Generate for #name #ty_generics #where_clause {
            fn domain() -> fixtura::Domain {
                fixtura::Domain::nested::<Self>()
            }

            fn arbitrary_for(
                domain: &fixtura::Domain,
            ) -> fixtura::FixtureResult<fixtura::Arbitrary<Self>> {
                fixtura::nested_arbitrary::<Self>(domain)
            }
        }

        impl #impl_generics fixtura::Fixture for #name #ty_generics #where_clause {
            fn describe() -> fixtura::FixtureResult<fixtura::TypeDescriptor> {
                #describe_body
            }

            fn assemble(
                ctx: &mut fixtura::GenContext<'_>,
                fields: &fixtura::FieldArbitraries,
            ) -> fixtura::FixtureResult<Self> {
                #assemble_body
            }

            fn seed_fields(
                &self,
                fields: &mut fixtura::FieldArbitraries,
            ) -> fixtura::FixtureResult<()> {
                #seed_body
            }
        }
    })
}

/// Add the `Generate` bound to every type parameter
fn add_trait_bounds(generics: &mut syn::Generics) {
    for param in &mut generics.params {
        if let GenericParam::Type(ref mut type_param) = *param {
            type_param.bounds.push(parse_quote!(fixtura::Generate));
        }
    }
}

fn collect_fields(fields: &Fields) -> Result<Vec<FixtureField<'_>>> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let (member, name) = match &field.ident {
                Some(ident) => (Member::Named(ident.clone()), ident.to_string()),
                None => (Member::Unnamed(index.into()), index.to_string()),
            };
            Ok(FixtureField {
                member,
                name,
                ty: &field.ty,
                strategy: parse_field_strategy(field)?,
            })
        })
        .collect()
}

fn describe_body(shape: &Fields, fields: &[FixtureField<'_>]) -> TokenStream {
    if matches!(shape, Fields::Unit) {
        return quote! {
            Ok(fixtura::TypeDescriptor::unit::<Self>())
        };
    }

    let specs = fields.iter().map(field_spec);
    quote! {
        fixtura::TypeDescriptor::builder::<Self>()
            #(.field(#specs))*
            .build()
    }
}

fn field_spec(field: &FixtureField<'_>) -> TokenStream {
    let name = &field.name;
    let ty = field.ty;
    match &field.strategy {
        FieldStrategy::Default => quote! {
            fixtura::FieldSpec::generated::<#ty>(#name)?
        },
        FieldStrategy::IntRange(min, max) => quote! {
            fixtura::FieldSpec::int_range::<#ty>(#name, #min, #max)?
        },
        FieldStrategy::FloatRange(min, max) => quote! {
            fixtura::FieldSpec::float_range::<#ty>(#name, #min, #max)?
        },
        FieldStrategy::Length(min, max) => quote! {
            fixtura::FieldSpec::sized::<#ty>(#name, #min, #max)?
        },
        FieldStrategy::With(path) => quote! {
            fixtura::FieldSpec::with_arbitrary::<#ty>(#name, #path())
        },
        FieldStrategy::Opaque => quote! {
            fixtura::FieldSpec::opaque::<#ty>(#name)
        },
    }
}

fn assemble_body(shape: &Fields, fields: &[FixtureField<'_>]) -> TokenStream {
    let draws = fields.iter().map(|field| {
        let name = &field.name;
        let ty = field.ty;
        quote! { fields.draw::<#ty>(#name, ctx)? }
    });

    let unused = fields.is_empty().then(|| quote! { let _ = (ctx, fields); });

    match shape {
        Fields::Named(_) => {
            let members = fields.iter().map(|field| &field.member);
            quote! {
                #unused
                Ok(Self { #(#members: #draws,)* })
            }
        }
        Fields::Unnamed(_) => quote! {
            #unused
            Ok(Self(#(#draws,)*))
        },
        Fields::Unit => quote! {
            #unused
            Ok(Self)
        },
    }
}

fn seed_body(fields: &[FixtureField<'_>]) -> TokenStream {
    let pins = fields.iter().map(|field| {
        let name = &field.name;
        let member = &field.member;
        quote! {
            fields.replace_arbitrary(
                #name,
                fixtura::Arbitrary::just(::std::clone::Clone::clone(&self.#member)),
            )?;
        }
    });

    let unused = fields.is_empty().then(|| quote! { let _ = fields; });

    quote! {
        #unused
        #(#pins)*
        Ok(())
    }
}

/// Parse the `#[fixture(...)]` attributes of a field
fn parse_field_strategy(field: &Field) -> Result<FieldStrategy> {
    let mut strategy = FieldStrategy::Default;

    for attr in &field.attrs {
        if !attr.path().is_ident("fixture") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let parsed = if meta.path.is_ident("range") {
                let value: LitStr = meta.value()?.parse()?;
                parse_range(&value.value()).map_err(|message| Error::new_spanned(&value, message))?
            } else if meta.path.is_ident("length") {
                let value: LitStr = meta.value()?.parse()?;
                let (min, max) = parse_length(&value.value())
                    .map_err(|message| Error::new_spanned(&value, message))?;
                FieldStrategy::Length(min, max)
            } else if meta.path.is_ident("with") {
                let value: LitStr = meta.value()?.parse()?;
                FieldStrategy::With(value.parse()?)
            } else if meta.path.is_ident("opaque") {
                FieldStrategy::Opaque
            } else {
                return Err(meta.error("unsupported fixture attribute"));
            };

            if strategy != FieldStrategy::Default {
                return Err(meta.error(
                    "only one of `range`, `length`, `with` or `opaque` may be given per field",
                ));
            }
            strategy = parsed;
            Ok(())
        })?;
    }

    Ok(strategy)
}

/// Split `"min..=max"` or `"min..max"` into its bounds
fn split_range(range_str: &str) -> Option<(&str, &str, bool)> {
    if let Some((start, end)) = range_str.split_once("..=") {
        return Some((start.trim(), end.trim(), true));
    }
    range_str
        .split_once("..")
        .map(|(start, end)| (start.trim(), end.trim(), false))
}

fn parse_range(range_str: &str) -> std::result::Result<FieldStrategy, String> {
    let (start, end, inclusive) = split_range(range_str)
        .ok_or_else(|| "range must be in the format \"min..=max\" or \"min..max\"".to_string())?;
    let start = start.replace('_', "");
    let end = end.replace('_', "");

    if let (Ok(min), Ok(max)) = (start.parse::<i128>(), end.parse::<i128>()) {
        let max = if inclusive {
            Some(max)
        } else {
            max.checked_sub(1)
        };
        return match max {
            Some(max) if min <= max => Ok(FieldStrategy::IntRange(min, max)),
            _ => Err(format!("range {} is empty", range_str)),
        };
    }

    match (start.parse::<f64>(), end.parse::<f64>()) {
        (Ok(min), Ok(max)) if min.is_finite() && max.is_finite() => {
            if !inclusive {
                return Err("float ranges must be inclusive (\"min..=max\")".to_string());
            }
            if min > max {
                return Err(format!("range {} is empty", range_str));
            }
            Ok(FieldStrategy::FloatRange(min, max))
        }
        _ => Err(format!("range {} must have numeric bounds", range_str)),
    }
}

fn parse_length(length_str: &str) -> std::result::Result<(usize, usize), String> {
    let (start, end, inclusive) = split_range(length_str)
        .ok_or_else(|| "length must be in the format \"min..=max\" or \"min..max\"".to_string())?;

    match (start.parse::<usize>(), end.parse::<usize>()) {
        (Ok(min), Ok(max)) => {
            let max = if inclusive {
                Some(max)
            } else {
                max.checked_sub(1)
            };
            match max {
                Some(max) if min <= max => Ok((min, max)),
                _ => Err(format!("length {} is empty", length_str)),
            }
        }
        _ => Err(format!("length {} must have unsigned bounds", length_str)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_parse_int_ranges() {
        assert_eq!(parse_range("1..=100"), Ok(FieldStrategy::IntRange(1, 100)));
        assert_eq!(parse_range("0..10"), Ok(FieldStrategy::IntRange(0, 9)));
        assert_eq!(parse_range("-5 ..= 5"), Ok(FieldStrategy::IntRange(-5, 5)));
        assert_eq!(
            parse_range("1_000..=2_000"),
            Ok(FieldStrategy::IntRange(1000, 2000))
        );
        assert!(parse_range("5..5").is_err());
        let lowest = i128::MIN;
        assert!(parse_range(&format!("{}..{}", lowest, lowest)).is_err());
        assert_eq!(
            parse_range(&format!("{}..={}", lowest, lowest)),
            Ok(FieldStrategy::IntRange(lowest, lowest))
        );
        assert!(parse_range("invalid").is_err());
        assert!(parse_range("a..=b").is_err());
    }

    #[test]
    fn test_parse_float_ranges() {
        assert_eq!(
            parse_range("0.5..=1.5"),
            Ok(FieldStrategy::FloatRange(0.5, 1.5))
        );
        assert!(parse_range("0.0..1.0").is_err());
        assert!(parse_range("2.0..=1.0").is_err());
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length("1..=8"), Ok((1, 8)));
        assert_eq!(parse_length("2..5"), Ok((2, 4)));
        assert!(parse_length("0..0").is_err());
        assert!(parse_length("-1..=3").is_err());
    }

    #[test]
    fn test_field_attributes() {
        let field: Field = parse_quote! {
            #[fixture(range = "1..=9")]
            id: u8
        };
        assert_eq!(
            parse_field_strategy(&field).unwrap(),
            FieldStrategy::IntRange(1, 9)
        );

        let field: Field = parse_quote! {
            #[fixture(opaque)]
            handle: Handle
        };
        assert_eq!(parse_field_strategy(&field).unwrap(), FieldStrategy::Opaque);

        let field: Field = parse_quote! {
            #[fixture(with = "strategies::names")]
            name: String
        };
        assert!(matches!(
            parse_field_strategy(&field).unwrap(),
            FieldStrategy::With(_)
        ));

        let field: Field = parse_quote! {
            #[fixture(range = "1..=9", opaque)]
            id: u8
        };
        assert!(parse_field_strategy(&field).is_err());

        let field: Field = parse_quote! {
            #[fixture(unknown)]
            id: u8
        };
        assert!(parse_field_strategy(&field).is_err());
    }

    #[test]
    fn test_add_trait_bounds() {
        let mut generics: syn::Generics = parse_quote! { <T, U> };
        add_trait_bounds(&mut generics);

        if let GenericParam::Type(type_param) = &generics.params[0] {
            assert_eq!(type_param.bounds.len(), 1);
        }
    }

    #[test]
    fn test_enums_are_rejected() {
        let input: DeriveInput = parse_quote! {
            enum Status { Active, Inactive }
        };
        assert!(generate_fixture_impl(&input).is_err());
    }

    #[test]
    fn test_unit_struct_uses_unit_descriptor() {
        let input: DeriveInput = parse_quote! {
            struct Marker;
        };
        let tokens = generate_fixture_impl(&input).unwrap().to_string();
        assert!(tokens.contains("TypeDescriptor :: unit"));
    }
}
