use crate::decode_column::{ColumnMetadata, decode_column};
use syn::{Fields, ItemStruct, LitStr, parse::ParseBuffer};

pub(crate) struct TableMetadata {
    pub(crate) item: ItemStruct,
    /// Simple name of the type.
    pub(crate) type_name: String,
    /// Declared table name.
    pub(crate) table: Option<String>,
    /// Declared keyspace.
    pub(crate) keyspace: Option<String>,
    /// Mapped fields only, in declaration order.
    pub(crate) columns: Vec<ColumnMetadata>,
}

pub fn decode_table(item: ItemStruct) -> TableMetadata {
    if !matches!(item.fields, Fields::Named(..)) {
        panic!("Entity can only be derived for structs with named fields");
    }
    if !item.generics.params.is_empty() {
        panic!("Entity cannot be derived for generic structs");
    }
    let columns: Vec<_> = item
        .fields
        .iter()
        .map(decode_column)
        .filter(|c| !c.skip)
        .collect();
    let mut table = None;
    let mut keyspace = None;
    for attr in &item.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("cql") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `cql`, use it like: `#[cql(attribute = value, ..)]`",);
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("table") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `table`, use it like: `#[cql(table = \"my_table\")]`"
                        );
                    };
                    table = Some(value.value());
                } else if arg.path.is_ident("keyspace") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `keyspace`, use it like: `#[cql(keyspace = \"my_keyspace\")]`"
                        );
                    };
                    keyspace = Some(value.value());
                } else {
                    panic!(
                        "Unknown attribute `{}` inside cql macro",
                        quote::ToTokens::to_token_stream(&arg.path)
                    );
                }
                Ok(())
            });
        }
    }
    TableMetadata {
        type_name: item.ident.to_string(),
        item,
        table,
        keyspace,
        columns,
    }
}
