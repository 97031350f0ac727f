use crate::{Error, Result, Value};
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use std::{
    any,
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    hash::Hash,
    net::IpAddr,
};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// This is the "native representation" of a type: what gets stored when no
/// converter is registered for it. Types without a natural CQL representation do
/// not implement it and are mapped through a [`crate::TypeConverter`] instead.
///
/// `try_from_value` accepts the canonical variant and, where it is lossless or
/// range checked, other representations (integer widening and narrowing, bigint
/// milliseconds for timestamps). Anything else is an error naming the target type.
///
/// # Examples
/// ```rust
/// use astra_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The typed null of this type, used as storage type descriptor.
    fn as_empty_value() -> Value;
    /// Convert into the owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Text(Some(value.into()))
    }
}

pub(crate) fn cannot_convert<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {} value {} to {}",
        value.type_name(),
        value,
        any::type_name::<T>(),
    ))
}

macro_rules! narrow {
    ($v:expr, $from:literal) => {
        Self::try_from($v).map_err(|_| {
            Error::msg(format!(
                "Value {}: {} is out of range for {}",
                $v,
                $from,
                any::type_name::<Self>()
            ))
        })
    };
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self as _))
            }
            #[allow(unreachable_patterns)]
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => narrow!(v, "the native type"),
                    Value::TinyInt(Some(v)) => narrow!(v, "tinyint"),
                    Value::SmallInt(Some(v)) => narrow!(v, "smallint"),
                    Value::Int(Some(v)) => narrow!(v, "int"),
                    Value::BigInt(Some(v)) => narrow!(v, "bigint"),
                    Value::Varint(Some(v)) => narrow!(v, "varint"),
                    Value::Decimal(Some(v)) => {
                        let error = Error::msg(format!(
                            "Value {v}: decimal does not fit into {}",
                            any::type_name::<Self>()
                        ));
                        if !v.is_integer() {
                            return Err(error.context("The value is not an integer"));
                        }
                        let v = v.to_i128().ok_or(error)?;
                        narrow!(v, "decimal")
                    }
                    _ => Err(cannot_convert::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value_integer!(i8, Value::TinyInt);
impl_as_value_integer!(i16, Value::SmallInt);
impl_as_value_integer!(i32, Value::Int);
impl_as_value_integer!(i64, Value::BigInt);
impl_as_value_integer!(i128, Value::Varint);
impl_as_value_integer!(isize, Value::BigInt);
impl_as_value_integer!(u16, Value::Int);
impl_as_value_integer!(u32, Value::BigInt);
impl_as_value_integer!(u64, Value::Varint);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::TinyInt(Some(v)) => Ok(v != 0),
            Value::SmallInt(Some(v)) => Ok(v != 0),
            Value::Int(Some(v)) => Ok(v != 0),
            Value::BigInt(Some(v)) => Ok(v != 0),
            Value::Varint(Some(v)) => Ok(v != 0),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl AsValue for f32 {
    fn as_empty_value() -> Value {
        Value::Float(None)
    }
    fn as_value(self) -> Value {
        Value::Float(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(Some(v)) => Ok(v),
            Value::Double(Some(v)) => {
                if (v as f32) as f64 != v && !v.is_nan() {
                    return Err(Error::msg(format!(
                        "Value {v}: double cannot be represented exactly as f32"
                    )));
                }
                Ok(v as f32)
            }
            Value::TinyInt(Some(v)) => Ok(v as f32),
            Value::SmallInt(Some(v)) => Ok(v as f32),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl AsValue for f64 {
    fn as_empty_value() -> Value {
        Value::Double(None)
    }
    fn as_value(self) -> Value {
        Value::Double(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Double(Some(v)) => Ok(v),
            Value::Float(Some(v)) => Ok(v as f64),
            Value::TinyInt(Some(v)) => Ok(v as f64),
            Value::SmallInt(Some(v)) => Ok(v as f64),
            Value::Int(Some(v)) => Ok(v as f64),
            Value::Decimal(Some(v)) => v
                .to_f64()
                .ok_or_else(|| Error::msg(format!("Value {v}: decimal does not fit into f64"))),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::TinyInt(Some(v)) => Ok(v.into()),
            Value::SmallInt(Some(v)) => Ok(v.into()),
            Value::Int(Some(v)) => Ok(v.into()),
            Value::BigInt(Some(v)) => Ok(v.into()),
            Value::Varint(Some(v)) => Decimal::from_i128(v)
                .ok_or_else(|| Error::msg(format!("Value {v}: varint does not fit into Decimal"))),
            Value::Float(Some(v)) => Decimal::from_f32(v)
                .ok_or_else(|| Error::msg(format!("Value {v}: float does not fit into Decimal"))),
            Value::Double(Some(v)) => Decimal::from_f64(v)
                .ok_or_else(|| Error::msg(format!("Value {v}: double does not fit into Decimal"))),
            _ => Err(cannot_convert::<Self>(&value)),
        }
    }
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v.into()),
                    $($pat_rest => $expr_rest,)*
                    _ => Err(cannot_convert::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value!(String, Value::Text);
impl_as_value!(Box<[u8]>, Value::Blob);
impl_as_value!(
    Uuid,
    Value::Uuid,
    Value::Blob(Some(v)) => Uuid::from_slice(&v).map_err(Into::into),
);
impl_as_value!(IpAddr, Value::Inet);
impl_as_value!(Date, Value::Date, Value::Timestamp(Some(v)) => Ok(v.date()));
impl_as_value!(Time, Value::Time);
impl_as_value!(
    OffsetDateTime,
    Value::Timestamp,
    Value::BigInt(Some(v)) => {
        OffsetDateTime::from_unix_timestamp_nanos(v as i128 * 1_000_000).map_err(Into::into)
    },
);

impl<'a> AsValue for Cow<'a, str> {
    fn as_empty_value() -> Value {
        Value::Text(None)
    }
    fn as_value(self) -> Value {
        Value::Text(Some(self.into()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Into::into)
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(if value.is_null() {
            None
        } else {
            Some(<T as AsValue>::try_from_value(value)?)
        })
    }
}

macro_rules! impl_as_value_collection {
    ($source:ident, $destination:path $(, $item_trait:ident)*) => {
        impl<T: AsValue $(+ $item_trait)*> AsValue for $source<T> {
            fn as_empty_value() -> Value {
                $destination(None, Box::new(T::as_empty_value()))
            }
            fn as_value(self) -> Value {
                $destination(
                    Some(self.into_iter().map(AsValue::as_value).collect()),
                    Box::new(T::as_empty_value()),
                )
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::List(Some(v), ..) | Value::Set(Some(v), ..) => v
                        .into_iter()
                        .map(<T as AsValue>::try_from_value)
                        .collect::<Result<_>>(),
                    Value::List(None, ..) | Value::Set(None, ..) => Ok(Default::default()),
                    _ => Err(cannot_convert::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value_collection!(Vec, Value::List);
impl_as_value_collection!(BTreeSet, Value::Set, Ord);
impl_as_value_collection!(HashSet, Value::Set, Eq, Hash);

macro_rules! impl_as_value_map {
    ($source:ident, $($key_trait:ident),+) => {
        impl<K: AsValue $(+ $key_trait)+, V: AsValue> AsValue for $source<K, V> {
            fn as_empty_value() -> Value {
                Value::Map(None, K::as_empty_value().into(), V::as_empty_value().into())
            }
            fn as_value(self) -> Value {
                Value::Map(
                    Some(
                        self.into_iter()
                            .map(|(k, v)| (k.as_value(), v.as_value()))
                            .collect(),
                    ),
                    K::as_empty_value().into(),
                    V::as_empty_value().into(),
                )
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Map(Some(v), ..) => v
                        .into_iter()
                        .map(|(k, v)| {
                            Ok((
                                <K as AsValue>::try_from_value(k)?,
                                <V as AsValue>::try_from_value(v)?,
                            ))
                        })
                        .collect::<Result<_>>(),
                    Value::Map(None, ..) => Ok(Default::default()),
                    _ => Err(cannot_convert::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value_map!(BTreeMap, Ord);
impl_as_value_map!(HashMap, Eq, Hash);
