//! `#[derive(FromContext)]`: build a service by resolving every field from the context.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr, Type};

use crate::fields::named_fields;

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let service = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let root = context_type(input)?;

    let inits = named_fields(input, "FromContext")?
        .iter()
        .filter_map(|field| field.ident.as_ref().map(|ident| (ident, &field.ty)))
        .map(|(ident, ty)| {
            quote! { #ident: <#ty as crate::FromRef<#root>>::from_ref(ctx) }
        });

    Ok(quote! {
        impl #impl_generics crate::FromRef<#root> for #service #ty_generics #where_clause {
            fn from_ref(ctx: &#root) -> Self {
                Self { #(#inits),* }
            }
        }
    })
}

/// Reads `#[from_context(Context = "path::To::Root")]`, defaulting to `Context`.
fn context_type(input: &DeriveInput) -> syn::Result<TokenStream> {
    let mut root: Option<Type> = None;

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("from_context")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("Context") {
                let lit: LitStr = meta.value()?.parse()?;
                root = Some(lit.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `Context = \"...\"`"))
            }
        })?;
    }

    Ok(match root {
        Some(ty) => quote! { #ty },
        None => quote! { Context },
    })
}
