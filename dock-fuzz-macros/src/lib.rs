//! Procedural macros for dock-fuzz

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(CodedEnum)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(coded), supports(enum_unit))]
struct CodedOpts {
    ident: syn::Ident,
    data: darling::ast::Data<CodedVariant, ()>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(coded))]
struct CodedVariant {
    ident: syn::Ident,

    /// Bounds marker: decodable, but never listed by `all()`
    #[darling(default)]
    sentinel: bool,

    /// Display name override (defaults to the variant name)
    #[darling(default)]
    rename: Option<String>,
}

/// Derive integer-code and name conversions for a closed, fieldless enum.
///
/// The integer code is the variant's discriminant, so declare explicit
/// discriminants when the codes are persisted. Variants marked
/// `#[coded(sentinel)]` round-trip through `from_code`/`from_name` but are
/// left out of `all()`.
///
/// Generated inherent methods:
/// - `code(&self) -> i64`
/// - `from_code(i64) -> Option<Self>`
/// - `name(&self) -> &'static str`
/// - `from_name(&str) -> Option<Self>`
/// - `is_sentinel(&self) -> bool`
/// - `all() -> &'static [Self]`
///
/// # Example
/// ```ignore
/// #[derive(CodedEnum, Clone, Copy, Debug, PartialEq, Eq)]
/// enum Side {
///     #[coded(sentinel)]
///     None = 0,
///     #[coded(rename = "left")]
///     Left = 1,
///     #[coded(rename = "right")]
///     Right = 2,
/// }
///
/// assert_eq!(Side::Left.code(), 1);
/// assert_eq!(Side::from_name("right"), Some(Side::Right));
/// assert_eq!(Side::all(), &[Side::Left, Side::Right]);
/// ```
#[proc_macro_derive(CodedEnum, attributes(coded))]
pub fn derive_coded_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match CodedOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "CodedEnum can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    let idents: Vec<_> = variants.iter().map(|v| &v.ident).collect();
    let strings: Vec<String> = variants
        .iter()
        .map(|v| v.rename.clone().unwrap_or_else(|| v.ident.to_string()))
        .collect();

    let code_arms = idents.iter().map(|v| {
        quote! { #name::#v => #name::#v as i64 }
    });

    let from_code_checks = idents.iter().map(|v| {
        quote! {
            if code == #name::#v as i64 {
                return ::core::option::Option::Some(#name::#v);
            }
        }
    });

    let name_arms = idents.iter().zip(strings.iter()).map(|(v, s)| {
        quote! { #name::#v => #s }
    });

    let from_name_arms = idents.iter().zip(strings.iter()).map(|(v, s)| {
        quote! { #s => ::core::option::Option::Some(#name::#v) }
    });

    let sentinel_variants: Vec<_> = variants
        .iter()
        .filter(|v| v.sentinel)
        .map(|v| &v.ident)
        .collect();

    let is_sentinel_body = if sentinel_variants.is_empty() {
        quote! { false }
    } else {
        quote! { matches!(self, #(#name::#sentinel_variants)|*) }
    };

    let listed = variants
        .iter()
        .filter(|v| !v.sentinel)
        .map(|v| {
            let ident = &v.ident;
            quote! { #name::#ident }
        });

    let expanded = quote! {
        impl #name {
            /// Integer code used in persisted records
            pub fn code(&self) -> i64 {
                match self {
                    #(#code_arms),*
                }
            }

            /// Decode an integer code, including sentinel codes
            pub fn from_code(code: i64) -> ::core::option::Option<Self> {
                #(#from_code_checks)*
                ::core::option::Option::None
            }

            /// Display name
            pub fn name(&self) -> &'static str {
                match self {
                    #(#name_arms),*
                }
            }

            /// Look up a variant by its display name
            pub fn from_name(name: &str) -> ::core::option::Option<Self> {
                match name {
                    #(#from_name_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            /// Whether this variant is a bounds marker rather than a real value
            pub fn is_sentinel(&self) -> bool {
                #is_sentinel_body
            }

            /// Every non-sentinel variant, in declaration order
            pub fn all() -> &'static [Self] {
                static ALL: &[#name] = &[#(#listed),*];
                ALL
            }
        }
    };

    TokenStream::from(expanded)
}
