use quote::ToTokens;
use syn::{
    Field, GenericArgument, Ident, LitStr, PathArguments, Type, TypePath, Visibility,
    ext::IdentExt, parse::ParseBuffer,
};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    /// Property name, the field name without `r#`.
    pub(crate) name: String,
    /// Declared column name.
    pub(crate) column: Option<String>,
    pub(crate) nullable: bool,
    /// Stored only through a registered converter.
    pub(crate) converted: bool,
    /// Not mapped: private or `#[cql(skip)]`.
    pub(crate) skip: bool,
}

/// The `T` of `Option<T>`, matched by the last path segment.
pub(crate) fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(TypePath { qself: None, path }) = ty else {
        return None;
    };
    let last = path.segments.last()?;
    if last.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

pub fn decode_column(field: &Field) -> ColumnMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Entity can only be derived for structs with named fields");
    let mut metadata = ColumnMetadata {
        name: ident.unraw().to_string(),
        ident,
        ty: field.ty.clone(),
        column: None,
        nullable: option_inner(&field.ty).is_some(),
        converted: false,
        skip: !matches!(field.vis, Visibility::Public(..)),
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("cql") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `cql`, use it like: `#[cql(attribute = value, ...)]`",);
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("column") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `column`, use it like: `#[cql(column = \"my_column\")]`"
                        );
                    };
                    metadata.column = Some(v.value());
                } else if arg.path.is_ident("converted") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!("Error while parsing `converted`, use it like: `#[cql(converted)]`");
                    };
                    metadata.converted = true;
                } else if arg.path.is_ident("skip") {
                    let Err(..) = arg.value() else {
                        panic!("Error while parsing `skip`, use it like: `#[cql(skip)]`");
                    };
                    metadata.skip = true;
                } else {
                    panic!(
                        "Unknown attribute `{}` inside cql macro",
                        arg.path.to_token_stream()
                    );
                }
                Ok(())
            });
        }
    }
    metadata
}
