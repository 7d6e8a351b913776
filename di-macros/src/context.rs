//! `#[derive(Context)]`: one `FromRef` impl per field of the root context.

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::fields::named_fields;

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let root = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let impls = named_fields(input, "Context")?
        .iter()
        .filter_map(|field| field.ident.as_ref().map(|ident| (ident, &field.ty)))
        .map(|(ident, ty)| {
            quote! {
                impl #impl_generics crate::FromRef<#root #ty_generics> for #ty #where_clause {
                    fn from_ref(ctx: &#root #ty_generics) -> Self {
                        ::core::clone::Clone::clone(&ctx.#ident)
                    }
                }
            }
        });

    Ok(quote! { #(#impls)* })
}
