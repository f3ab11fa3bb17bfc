// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Derive macros for simulation model components.

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

/// Derive `std::fmt::Display` for a struct with an `entity` field, printing
/// the entity's full name.
#[proc_macro_derive(EntityDisplay)]
pub fn entity_display(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    quote! {
        impl #impl_generics std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.entity)
            }
        }
    }
    .into()
}

/// Derive an empty `Runnable` implementation, for components with no work
/// of their own at simulation start.
#[proc_macro_derive(Runnable)]
pub fn runnable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    quote! {
        #[async_trait(?Send)]
        impl #impl_generics spur_engine::traits::Runnable for #name #ty_generics #where_clause {}
    }
    .into()
}
