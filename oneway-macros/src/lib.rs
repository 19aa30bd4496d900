//! Procedural macros for oneway

use darling::{FromDeriveInput, FromVariant};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes shared by the message derives
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action, change, output), supports(enum_any, struct_any))]
struct MessageOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<MessageVariant, ()>,

    /// Name reported for a struct message
    #[darling(default)]
    name: Option<String>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(action, change, output))]
struct MessageVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<()>,

    /// Explicit name override
    #[darling(default)]
    name: Option<String>,
}

/// The message traits a derive can target
#[derive(Clone, Copy)]
enum MessageKind {
    Action,
    Change,
    Output,
}

impl MessageKind {
    fn trait_path(self) -> TokenStream2 {
        match self {
            MessageKind::Action => quote! { ::oneway::Action },
            MessageKind::Change => quote! { ::oneway::Change },
            MessageKind::Output => quote! { ::oneway::Output },
        }
    }
}

fn expand(input: DeriveInput, kind: MessageKind) -> TokenStream2 {
    let opts = match MessageOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors(),
    };

    let name = &opts.ident;
    let trait_path = kind.trait_path();
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let body = match &opts.data {
        darling::ast::Data::Enum(variants) => {
            if variants.is_empty() {
                quote! { match *self {} }
            } else {
                let arms = variants.iter().map(|v| {
                    let variant_name = &v.ident;
                    let variant_str = v.name.clone().unwrap_or_else(|| variant_name.to_string());

                    match &v.fields.style {
                        darling::ast::Style::Unit => quote! {
                            #name::#variant_name => #variant_str
                        },
                        darling::ast::Style::Tuple => quote! {
                            #name::#variant_name(..) => #variant_str
                        },
                        darling::ast::Style::Struct => quote! {
                            #name::#variant_name { .. } => #variant_str
                        },
                    }
                });
                quote! {
                    match self {
                        #(#arms),*
                    }
                }
            }
        }
        darling::ast::Data::Struct(_) => {
            let struct_str = opts.name.clone().unwrap_or_else(|| name.to_string());
            quote! { #struct_str }
        }
    };

    quote! {
        impl #impl_generics #trait_path for #name #ty_generics #where_clause {
            fn name(&self) -> &'static str {
                #body
            }
        }
    }
}

/// Derive macro for the Action trait
///
/// Generates a `name()` method that returns the variant name as a static
/// string. `#[action(name = "...")]` on a variant overrides it.
///
/// # Example
/// ```ignore
/// #[derive(Action, Debug)]
/// enum LotteryAction {
///     Play,
///     #[action(name = "Resolved")]
///     PlayDidResolve(Result<bool, LotteryError>),
/// }
///
/// assert_eq!(LotteryAction::Play.name(), "Play");
/// assert_eq!(LotteryAction::PlayDidResolve(Ok(true)).name(), "Resolved");
/// ```
#[proc_macro_derive(Action, attributes(action))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input, MessageKind::Action).into()
}

/// Derive macro for the Change trait
///
/// Same naming rules as `#[derive(Action)]`, with `#[change(name = "...")]`
/// for overrides.
#[proc_macro_derive(Change, attributes(change))]
pub fn derive_change(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input, MessageKind::Change).into()
}

/// Derive macro for the Output trait
///
/// Same naming rules as `#[derive(Action)]`, with `#[output(name = "...")]`
/// for overrides. The type must also be `Clone + Debug`.
#[proc_macro_derive(Output, attributes(output))]
pub fn derive_output(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input, MessageKind::Output).into()
}
