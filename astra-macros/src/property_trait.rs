use crate::decode_table::TableMetadata;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Ident, spanned::Spanned};

/// `{Type}Properties` trait with one typed handle per mapped property.
pub(crate) fn property_trait(table: &TableMetadata) -> TokenStream {
    let struct_name = &table.item.ident;
    let vis = &table.item.vis;
    let trait_name = Ident::new(&format!("{}Properties", struct_name), table.item.span());
    let declarations = table.columns.iter().map(|c| {
        let ident = &c.ident;
        quote! {
            #[allow(non_upper_case_globals)]
            const #ident: ::astra::PropertyRef<#struct_name>;
        }
    });
    let definitions = table.columns.iter().map(|c| {
        let ident = &c.ident;
        let name = &c.name;
        quote! {
            const #ident: ::astra::PropertyRef<#struct_name> = ::astra::PropertyRef::new(#name);
        }
    });
    quote! {
        #vis trait #trait_name {
            #(#declarations)*
        }
        impl #trait_name for #struct_name {
            #(#definitions)*
        }
    }
}
