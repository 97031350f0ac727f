mod decode_column;
mod decode_table;
mod encode_property_def;
mod property_trait;

use decode_table::decode_table;
use encode_property_def::encode_property_def;
use proc_macro::TokenStream;
use property_trait::property_trait;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

/// Implements `astra::Entity` for a struct with named fields.
///
/// Every `pub` field is a property, unless marked `#[cql(skip)]`. Restricted
/// visibility like `pub(crate)` is not enough.
/// - `#[cql(table = "...")]`, `#[cql(keyspace = "...")]` on the struct.
/// - `#[cql(column = "...")]` on a field declares its column name.
/// - `#[cql(converted)]` on a field without a native representation, stored
///   through the converter registered for its type.
///
/// Also generates the `{Type}Properties` trait exposing `Type::field` handles.
#[proc_macro_derive(Entity, attributes(cql))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let table = decode_table(parse_macro_input!(input as ItemStruct));
    let name = &table.item.ident;
    let type_name = &table.type_name;
    let declared_table = match &table.table {
        Some(v) => quote!(Some(#v)),
        None => quote!(None),
    };
    let declared_keyspace = match &table.keyspace {
        Some(v) => quote!(Some(#v)),
        None => quote!(None),
    };
    let properties = table.columns.iter().map(|c| encode_property_def(name, c));
    let properties_trait = property_trait(&table);
    quote! {
        #properties_trait
        impl ::astra::Entity for #name {
            fn type_name() -> &'static str {
                #type_name
            }
            fn declared_table() -> Option<&'static str> {
                #declared_table
            }
            fn declared_keyspace() -> Option<&'static str> {
                #declared_keyspace
            }
            fn properties() -> &'static [::astra::PropertyDef<Self>] {
                static PROPERTIES: &[::astra::PropertyDef<#name>] = &[#(#properties),*];
                PROPERTIES
            }
        }
    }
    .into()
}
