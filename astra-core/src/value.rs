use rust_decimal::Decimal;
use std::{fmt, net::IpAddr};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

/// Dynamically typed CQL value.
///
/// Every variant carries an `Option` payload so that the same enum describes both
/// a concrete value and a storage type: `Value::BigInt(None)` is the type `bigint`
/// (or a typed null), `Value::BigInt(Some(1))` is a value of that type.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    TinyInt(Option<i8>),
    SmallInt(Option<i16>),
    Int(Option<i32>),
    BigInt(Option<i64>),
    Varint(Option<i128>),
    Float(Option<f32>),
    Double(Option<f64>),
    Decimal(Option<Decimal>),
    Text(Option<String>),
    Blob(Option<Box<[u8]>>),
    Uuid(Option<Uuid>),
    Inet(Option<IpAddr>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<OffsetDateTime>),
    List(Option<Vec<Value>>, /* type: */ Box<Value>),
    Set(Option<Vec<Value>>, /* type: */ Box<Value>),
    Map(
        Option<Vec<(Value, Value)>>,
        /* key: */ Box<Value>,
        /* value: */ Box<Value>,
    ),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::TinyInt(l), Self::TinyInt(r)) => l == r,
            (Self::SmallInt(l), Self::SmallInt(r)) => l == r,
            (Self::Int(l), Self::Int(r)) => l == r,
            (Self::BigInt(l), Self::BigInt(r)) => l == r,
            (Self::Varint(l), Self::Varint(r)) => l == r,
            (Self::Float(l), Self::Float(r)) => l == r,
            (Self::Double(l), Self::Double(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Text(l), Self::Text(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            (Self::Inet(l), Self::Inet(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::List(l, ..), Self::List(r, ..)) => l == r && self.same_type(other),
            (Self::Set(l, ..), Self::Set(r, ..)) => l == r && self.same_type(other),
            (Self::Map(l, ..), Self::Map(r, ..)) => l == r && self.same_type(other),
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl Value {
    /// True for `Null` and for any typed variant without a payload.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::TinyInt(v) => v.is_none(),
            Value::SmallInt(v) => v.is_none(),
            Value::Int(v) => v.is_none(),
            Value::BigInt(v) => v.is_none(),
            Value::Varint(v) => v.is_none(),
            Value::Float(v) => v.is_none(),
            Value::Double(v) => v.is_none(),
            Value::Decimal(v) => v.is_none(),
            Value::Text(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
            Value::Inet(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::List(v, ..) => v.is_none(),
            Value::Set(v, ..) => v.is_none(),
            Value::Map(v, ..) => v.is_none(),
        }
    }

    /// Compare the storage types, ignoring the payloads.
    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(.., l), Self::List(.., r)) => l.same_type(r),
            (Self::Set(.., l), Self::Set(.., r)) => l.same_type(r),
            (Self::Map(.., l_key, l_value), Self::Map(.., r_key, r_value)) => {
                l_key.same_type(r_key) && l_value.same_type(r_value)
            }
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }

    /// The CQL name of the storage type.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Boolean(..) => "boolean".into(),
            Value::TinyInt(..) => "tinyint".into(),
            Value::SmallInt(..) => "smallint".into(),
            Value::Int(..) => "int".into(),
            Value::BigInt(..) => "bigint".into(),
            Value::Varint(..) => "varint".into(),
            Value::Float(..) => "float".into(),
            Value::Double(..) => "double".into(),
            Value::Decimal(..) => "decimal".into(),
            Value::Text(..) => "text".into(),
            Value::Blob(..) => "blob".into(),
            Value::Uuid(..) => "uuid".into(),
            Value::Inet(..) => "inet".into(),
            Value::Date(..) => "date".into(),
            Value::Time(..) => "time".into(),
            Value::Timestamp(..) => "timestamp".into(),
            Value::List(.., ty) => format!("list<{}>", ty.type_name()),
            Value::Set(.., ty) => format!("set<{}>", ty.type_name()),
            Value::Map(.., key, value) => {
                format!("map<{}, {}>", key.type_name(), value.type_name())
            }
        }
    }

    /// Same type, payload dropped.
    pub fn as_null(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::TinyInt(..) => Value::TinyInt(None),
            Value::SmallInt(..) => Value::SmallInt(None),
            Value::Int(..) => Value::Int(None),
            Value::BigInt(..) => Value::BigInt(None),
            Value::Varint(..) => Value::Varint(None),
            Value::Float(..) => Value::Float(None),
            Value::Double(..) => Value::Double(None),
            Value::Decimal(..) => Value::Decimal(None),
            Value::Text(..) => Value::Text(None),
            Value::Blob(..) => Value::Blob(None),
            Value::Uuid(..) => Value::Uuid(None),
            Value::Inet(..) => Value::Inet(None),
            Value::Date(..) => Value::Date(None),
            Value::Time(..) => Value::Time(None),
            Value::Timestamp(..) => Value::Timestamp(None),
            Value::List(.., ty) => Value::List(None, ty.clone()),
            Value::Set(.., ty) => Value::Set(None, ty.clone()),
            Value::Map(.., key, value) => Value::Map(None, key.clone(), value.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        macro_rules! write_option {
            ($v:expr) => {
                match $v {
                    Some(v) => write!(f, "{}", v),
                    None => f.write_str("null"),
                }
            };
        }
        macro_rules! write_items {
            ($open:literal, $items:expr, $close:literal) => {{
                f.write_str($open)?;
                for (i, v) in $items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str($close)
            }};
        }
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(v) => write_option!(v),
            Value::TinyInt(v) => write_option!(v),
            Value::SmallInt(v) => write_option!(v),
            Value::Int(v) => write_option!(v),
            Value::BigInt(v) => write_option!(v),
            Value::Varint(v) => write_option!(v),
            Value::Float(v) => write_option!(v),
            Value::Double(v) => write_option!(v),
            Value::Decimal(v) => write_option!(v),
            Value::Text(Some(v)) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Blob(Some(v)) => {
                f.write_str("0x")?;
                for b in v.iter() {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            Value::Uuid(v) => write_option!(v),
            Value::Inet(Some(v)) => write!(f, "'{}'", v),
            Value::Date(Some(v)) => write!(f, "'{}'", v),
            Value::Time(Some(v)) => write!(f, "'{}'", v),
            Value::Timestamp(Some(v)) => write!(f, "{}", v.unix_timestamp_nanos() / 1_000_000),
            Value::List(Some(v), ..) => write_items!("[", v, "]"),
            Value::Set(Some(v), ..) => write_items!("{", v, "}"),
            Value::Map(Some(v), ..) => {
                f.write_str("{")?;
                for (i, (k, v)) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            _ => f.write_str("null"),
        }
    }
}
