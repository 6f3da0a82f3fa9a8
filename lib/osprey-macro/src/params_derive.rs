//! `#[derive(Params)]` implementation.
//!
//! The generated encoder is one `push` per field. Whether a value is emitted,
//! and how it is rendered, is decided by its `ParamValue` impl in
//! `osprey-core`, so this crate stays unaware of individual types.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, DeriveInput, Fields, LitStr, parse2};

/// Struct-level options parsed from `#[param(...)]` attributes.
#[derive(Debug, Clone, Default)]
struct StructOptions {
    rename_all: Option<RenameRule>,
}

/// Case conversion rules for `rename_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::enum_variant_names)]
enum RenameRule {
    /// `lowercase`
    LowerCase,
    /// `camelCase`
    CamelCase,
    /// `snake_case`
    SnakeCase,
    /// `kebab-case`
    KebabCase,
}

impl RenameRule {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "lowercase" => Some(Self::LowerCase),
            "camelCase" => Some(Self::CamelCase),
            "snake_case" => Some(Self::SnakeCase),
            "kebab-case" => Some(Self::KebabCase),
            _ => None,
        }
    }

    fn apply(self, name: &str) -> String {
        match self {
            Self::LowerCase => name.to_lowercase(),
            Self::CamelCase => to_camel_case(name),
            Self::SnakeCase => name.to_string(),
            Self::KebabCase => name.replace('_', "-"),
        }
    }
}

/// Convert a `snake_case` field name to `camelCase`.
fn to_camel_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

/// Field options parsed from `#[param(...)]` attributes.
#[derive(Debug, Clone, Default)]
struct FieldOptions {
    /// Key in the query string.
    rename: Option<String>,
    /// Merge the field's own parameters into this struct's.
    flatten: bool,
    /// Never encode this field.
    skip: bool,
}

/// Expand the `#[derive(Params)]` macro.
pub fn expand_params_derive(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = parse2(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let struct_options = parse_struct_options(&input.attrs)?;

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unit => {
                return Ok(quote! {
                    impl #impl_generics ::osprey::EncodeParams for #name #ty_generics #where_clause {
                        fn encode_into(&self, _out: &mut ::osprey::ParamMap) {}
                    }
                });
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Params derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Params derive only supports structs",
            ));
        }
    };

    let mut pushes = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let options = parse_field_options(&field.attrs)?;
        if options.skip {
            continue;
        }

        if options.flatten {
            if options.rename.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "`flatten` and `rename` cannot be combined",
                ));
            }
            pushes.push(quote! {
                ::osprey::EncodeParams::encode_into(&self.#field_name, out);
            });
            continue;
        }

        // Explicit rename > rename_all > field name (raw identifiers unprefixed)
        let ident = field_name.to_string();
        let ident = ident.strip_prefix("r#").unwrap_or(&ident);
        let key = match (&options.rename, struct_options.rename_all) {
            (Some(rename), _) => rename.clone(),
            (None, Some(rule)) => rule.apply(ident),
            (None, None) => ident.to_string(),
        };

        pushes.push(quote! {
            out.push(#key, &self.#field_name);
        });
    }

    Ok(quote! {
        impl #impl_generics ::osprey::EncodeParams for #name #ty_generics #where_clause {
            fn encode_into(&self, out: &mut ::osprey::ParamMap) {
                #(#pushes)*
            }
        }
    })
}

fn parse_struct_options(attrs: &[Attribute]) -> syn::Result<StructOptions> {
    let mut options = StructOptions::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("param")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                let value: LitStr = meta.value()?.parse()?;
                let rule = RenameRule::parse(&value.value()).ok_or_else(|| {
                    syn::Error::new_spanned(
                        &value,
                        format!(
                            "unknown rename_all value: \"{}\". Expected one of: \
                             lowercase, camelCase, snake_case, kebab-case",
                            value.value()
                        ),
                    )
                })?;
                options.rename_all = Some(rule);
                Ok(())
            } else {
                Err(meta.error("unsupported struct attribute, expected `rename_all`"))
            }
        })?;
    }

    Ok(options)
}

fn parse_field_options(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("param")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                options.rename = Some(value.value());
            } else if meta.path.is_ident("flatten") {
                options.flatten = true;
            } else if meta.path.is_ident("skip") {
                options.skip = true;
            } else {
                return Err(meta.error(
                    "unsupported field attribute, expected `rename`, `flatten` or `skip`",
                ));
            }
            Ok(())
        })?;
    }

    Ok(options)
}
