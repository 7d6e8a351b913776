//! Derive macros for icegraph's compile-time dependency injection.
//!
//! - `#[derive(Context)]` on the root context makes every field extractable.
//! - `#[derive(FromContext)]` on a service resolves each of its fields from the root.
//!
//! Generated code names `crate::FromRef`, so the consuming crate must expose that trait
//! at its root.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod context;
mod fields;
mod from_context;

/// Generates `impl FromRef<Root> for FieldType` for each named field.
///
/// Field types must be `Clone` and pairwise distinct, otherwise the impls overlap.
///
/// ```ignore
/// #[derive(Context, Clone)]
/// pub struct Context {
///     pub freshness: Arc<FreshnessConfig>,
///     pub classifier: AppClassifier,
/// }
/// ```
#[proc_macro_derive(Context)]
pub fn derive_context(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    context::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Generates `impl FromRef<Context> for Service`, resolving each field through `FromRef`.
///
/// The root type defaults to `Context` in scope and can be overridden:
///
/// ```ignore
/// #[derive(FromContext, Clone)]
/// #[from_context(Context = "crate::context::Context")]
/// pub struct HybridCategorizer {
///     config: Arc<CategorizerConfig>,
///     classifier: AppClassifier,
/// }
/// ```
#[proc_macro_derive(FromContext, attributes(from_context))]
pub fn derive_from_context(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_context::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
