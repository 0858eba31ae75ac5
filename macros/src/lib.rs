//! Derive macros for the storefront state container
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Generates wire kind names and request/terminal
//!   classifiers for action enums
//!
//! # Example
//!
//! ```ignore
//! use storefront_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum WishlistAction {
//!     #[request]
//!     WishlistRequest,
//!
//!     #[success]
//!     WishlistSuccess { items: Vec<String> },
//!
//!     #[failure]
//!     WishlistFail { error: String },
//!
//!     WishlistCleared,
//! }
//!
//! assert_eq!(WishlistAction::WishlistRequest.kind(), "WISHLIST_REQUEST");
//! assert!(WishlistAction::WishlistRequest.is_request());
//! assert!(!WishlistAction::WishlistCleared.is_terminal());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Variant, parse_macro_input};

/// Derive macro for Action enums
///
/// Generates helper methods for action enums:
/// - `kind()` - The wire name of the variant (`CartContentSaveFail` → `CART_CONTENT_SAVE_FAIL`)
/// - `KINDS` - Every wire name, in declaration order
/// - `is_request()` - True for variants marked `#[request]`
/// - `is_success()` - True for variants marked `#[success]`
/// - `is_failure()` - True for variants marked `#[failure]`
/// - `is_terminal()` - True for success or failure variants
///
/// # Attributes
///
/// - `#[request]` - The variant opens a remote operation
/// - `#[success]` - The variant is the resolved terminal of an operation
/// - `#[failure]` - The variant is the rejected terminal of an operation
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a non-enum type
/// - A variant carries more than one of the phase attributes
#[proc_macro_derive(Action, attributes(request, success, failure))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut request_arms = Vec::new();
    let mut success_arms = Vec::new();
    let mut failure_arms = Vec::new();
    let mut kind_arms = Vec::new();
    let mut kinds = Vec::new();

    for variant in &data_enum.variants {
        let is_request = has_attribute(&variant.attrs, "request");
        let is_success = has_attribute(&variant.attrs, "success");
        let is_failure = has_attribute(&variant.attrs, "failure");

        if [is_request, is_success, is_failure].iter().filter(|flag| **flag).count() > 1 {
            return syn::Error::new_spanned(
                variant,
                "Variant can carry only one of #[request], #[success] and #[failure]",
            )
            .to_compile_error()
            .into();
        }

        let pattern = variant_pattern(variant);
        let kind = screaming_snake(&variant.ident.to_string());

        if is_request {
            request_arms.push(quote! { #pattern => true, });
        }
        if is_success {
            success_arms.push(quote! { #pattern => true, });
        }
        if is_failure {
            failure_arms.push(quote! { #pattern => true, });
        }

        kind_arms.push(quote! { #pattern => #kind, });
        kinds.push(kind);
    }

    let expanded = quote! {
        impl #name {
            /// Wire names of every action kind, in declaration order
            pub const KINDS: &'static [&'static str] = &[#(#kinds),*];

            /// Returns the wire name of this action kind
            #[must_use]
            pub const fn kind(&self) -> &'static str {
                match self {
                    #(#kind_arms)*
                }
            }

            /// Returns true if this action opens a remote operation
            #[must_use]
            #[allow(unreachable_patterns, clippy::match_like_matches_macro)]
            pub const fn is_request(&self) -> bool {
                match self {
                    #(#request_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action resolves a remote operation
            #[must_use]
            #[allow(unreachable_patterns, clippy::match_like_matches_macro)]
            pub const fn is_success(&self) -> bool {
                match self {
                    #(#success_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action rejects a remote operation
            #[must_use]
            #[allow(unreachable_patterns, clippy::match_like_matches_macro)]
            pub const fn is_failure(&self) -> bool {
                match self {
                    #(#failure_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action terminates a remote operation
            #[must_use]
            pub const fn is_terminal(&self) -> bool {
                self.is_success() || self.is_failure()
            }
        }
    };

    TokenStream::from(expanded)
}

fn variant_pattern(variant: &Variant) -> TokenStream2 {
    let ident = &variant.ident;
    match &variant.fields {
        Fields::Named(_) => quote! { Self::#ident { .. } },
        Fields::Unnamed(_) => quote! { Self::#ident(..) },
        Fields::Unit => quote! { Self::#ident },
    }
}

/// `CartContentSaveFail` → `CART_CONTENT_SAVE_FAIL`, `HTTPError` → `HTTP_ERROR`
fn screaming_snake(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);

    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }

    out
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

#[cfg(test)]
mod tests {
    use super::screaming_snake;

    #[test]
    fn converts_camel_case_to_wire_names() {
        assert_eq!(screaming_snake("CartRequest"), "CART_REQUEST");
        assert_eq!(screaming_snake("CartContentSaveFail"), "CART_CONTENT_SAVE_FAIL");
        assert_eq!(screaming_snake("AuthLogout"), "AUTH_LOGOUT");
        assert_eq!(screaming_snake("HTTPError"), "HTTP_ERROR");
        assert_eq!(screaming_snake("Step2Done"), "STEP2_DONE");
    }
}
