use crate::{Error, Result, TypeConverter};
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use time::OffsetDateTime;
use uuid::Uuid;

/// Stores an instant as milliseconds since the Unix epoch (`bigint`).
///
/// Sub millisecond precision is floored away.
#[derive(Default, Debug, Clone, Copy)]
pub struct OffsetDateTimeEpochConverter;

impl TypeConverter<OffsetDateTime, i64> for OffsetDateTimeEpochConverter {
    fn to_storage(&self, source: &OffsetDateTime) -> Result<i64> {
        let millis = source.unix_timestamp_nanos().div_euclid(1_000_000);
        i64::try_from(millis)
            .map_err(|_| Error::msg(format!("Instant {source} is out of the epoch millis range")))
    }
    fn from_storage(&self, value: i64) -> Result<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(value as i128 * 1_000_000).map_err(Into::into)
    }
}

/// Stores a UUID as its 16 big endian bytes (`blob`).
#[derive(Default, Debug, Clone, Copy)]
pub struct UuidBytesConverter;

impl TypeConverter<Uuid, Box<[u8]>> for UuidBytesConverter {
    fn to_storage(&self, source: &Uuid) -> Result<Box<[u8]>> {
        Ok(Box::from(source.as_bytes().as_slice()))
    }
    fn from_storage(&self, value: Box<[u8]>) -> Result<Uuid> {
        Uuid::from_slice(&value).map_err(|e| {
            Error::new(e).context(format!("Expected 16 bytes, found {}", value.len()))
        })
    }
}

/// Stores any serde type as its JSON text (`text`).
pub struct JsonStringConverter<T> {
    _type: PhantomData<fn() -> T>,
}

impl<T> JsonStringConverter<T> {
    pub fn new() -> Self {
        Self { _type: PhantomData }
    }
}

impl<T> Default for JsonStringConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TypeConverter<T, String> for JsonStringConverter<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    fn to_storage(&self, source: &T) -> Result<String> {
        serde_json::to_string(source).map_err(Into::into)
    }
    fn from_storage(&self, value: String) -> Result<T> {
        serde_json::from_str(&value).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use time::macros::datetime;

    #[test]
    fn epoch_millis() {
        let converter = OffsetDateTimeEpochConverter;
        let instant = datetime!(2024-01-02 03:04:05.678 UTC);
        assert_eq!(converter.to_storage(&instant).unwrap(), 1_704_164_645_678);
        assert_eq!(converter.from_storage(1_704_164_645_678).unwrap(), instant);
        let new_year = datetime!(2021-01-01 00:00 UTC);
        assert_eq!(converter.to_storage(&new_year).unwrap(), 1_609_459_200_000);
        assert_eq!(converter.from_storage(1_609_459_200_000).unwrap(), new_year);
        let before_epoch = datetime!(1969-12-31 23:59:59.9995 UTC);
        assert_eq!(converter.to_storage(&before_epoch).unwrap(), -1);
    }

    #[test]
    fn uuid_bytes() {
        let converter = UuidBytesConverter;
        let id = Uuid::from_u128(0x0011_2233_4455_6677_8899_aabb_ccdd_eeff);
        let bytes = converter.to_storage(&id).unwrap();
        assert_eq!(bytes[0], 0x00);
        assert_eq!(bytes[15], 0xff);
        assert_eq!(converter.from_storage(bytes).unwrap(), id);
        assert!(converter.from_storage(Box::new([1, 2, 3])).is_err());
    }

    #[test]
    fn json_text() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Address {
            street: String,
            zip: u32,
        }
        let converter = JsonStringConverter::<Address>::new();
        let address = Address {
            street: "Main".into(),
            zip: 12345,
        };
        let text = converter.to_storage(&address).unwrap();
        assert_eq!(text, r#"{"street":"Main","zip":12345}"#);
        assert_eq!(converter.from_storage(text).unwrap(), address);
        assert!(converter.from_storage("not json".into()).is_err());
    }
}
