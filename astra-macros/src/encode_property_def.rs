use crate::decode_column::ColumnMetadata;
use proc_macro2::{Ident, TokenStream};
use quote::{ToTokens, quote};

pub fn encode_property_def(entity: &Ident, metadata: &ColumnMetadata) -> TokenStream {
    let field = &metadata.ident;
    let name = &metadata.name;
    let column = match &metadata.column {
        Some(v) => quote!(Some(#v)),
        None => quote!(None),
    };
    let type_name = metadata
        .ty
        .to_token_stream()
        .to_string()
        .replace(' ', "");
    let nullable = metadata.nullable;
    let (to_storage, from_storage) = if metadata.converted {
        (quote!(to_storage_converted), quote!(from_storage_converted))
    } else {
        (quote!(to_storage), quote!(from_storage))
    };
    let (get, set) = if nullable {
        (
            quote! {
                |e, c| match &e.#field {
                    Some(v) => c.#to_storage(v),
                    None => Ok(::astra::Value::Null),
                }
            },
            quote! {
                |e, v, c| {
                    e.#field = match v {
                        Some(v) => Some(c.#from_storage(v)?),
                        None => None,
                    };
                    Ok(())
                }
            },
        )
    } else {
        (
            quote!(|e, c| c.#to_storage(&e.#field)),
            quote! {
                |e, v, c| {
                    if let Some(v) = v {
                        e.#field = c.#from_storage(v)?;
                    }
                    Ok(())
                }
            },
        )
    };
    quote! {
        ::astra::PropertyDef::<#entity> {
            name: #name,
            column: #column,
            type_name: #type_name,
            nullable: #nullable,
            get: #get,
            set: #set,
        }
    }
}
