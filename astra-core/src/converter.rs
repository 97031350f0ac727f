use crate::{AsValue, Error, MappingError, Result, Value};
use std::{
    any::{self, Any, TypeId},
    collections::HashMap,
    marker::PhantomData,
    sync::Arc,
};

/// Bidirectional conversion between a source type `S` and a storage type `T`.
///
/// `T` must have a native CQL representation, `S` does not need one. Several
/// converters can be registered for the same `S`, they are tried in
/// registration order.
pub trait TypeConverter<S, T>: Send + Sync + 'static {
    /// Source value to its storage representation.
    fn to_storage(&self, source: &S) -> Result<T>;
    /// Storage representation back to the source value.
    fn from_storage(&self, value: T) -> Result<S>;
}

/// A converter with its storage type erased, only the source type remains.
trait SourceRule<S>: Send + Sync {
    fn storage_type(&self) -> Value;
    fn to_storage(&self, source: &S) -> Result<Value>;
    fn from_storage(&self, value: Value) -> Result<S>;
}

struct Rule<S, T, C> {
    converter: C,
    _types: PhantomData<fn(S) -> T>,
}

impl<S, T, C> SourceRule<S> for Rule<S, T, C>
where
    S: 'static,
    T: AsValue + 'static,
    C: TypeConverter<S, T>,
{
    fn storage_type(&self) -> Value {
        T::as_empty_value()
    }
    fn to_storage(&self, source: &S) -> Result<Value> {
        Ok(self.converter.to_storage(source)?.as_value())
    }
    fn from_storage(&self, value: Value) -> Result<S> {
        self.converter.from_storage(T::try_from_value(value)?)
    }
}

type Rules<S> = Vec<Arc<dyn SourceRule<S>>>;

/// Per source type list of conversion rules.
///
/// Mutated only while configuring (`&mut self`), then shared read-only.
#[derive(Default)]
pub struct ConverterRegistry {
    rules: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    names: HashMap<TypeId, Vec<String>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Register `converter` for the source type `S`, storing values as `T`.
    pub fn register<S, T, C>(&mut self, converter: C) -> &mut Self
    where
        S: 'static,
        T: AsValue + 'static,
        C: TypeConverter<S, T>,
    {
        let rule: Arc<dyn SourceRule<S>> = Arc::new(Rule::<S, T, C> {
            converter,
            _types: PhantomData,
        });
        let id = TypeId::of::<S>();
        let entry = self
            .rules
            .entry(id)
            .or_insert_with(|| Box::new(Rules::<S>::new()));
        if let Some(rules) = entry.downcast_mut::<Rules<S>>() {
            rules.push(rule);
        }
        self.names.entry(id).or_default().push(format!(
            "{} -> {}",
            any::type_name::<S>(),
            any::type_name::<T>()
        ));
        log::debug!(
            "Registered converter {} -> {}",
            any::type_name::<S>(),
            any::type_name::<T>()
        );
        self
    }

    /// Whether at least one converter exists for `S`.
    pub fn contains<S: 'static>(&self) -> bool {
        !self.rules::<S>().is_empty()
    }

    /// Human readable `source -> storage` pairs registered for `S`.
    pub fn describe<S: 'static>(&self) -> &[String] {
        self.names
            .get(&TypeId::of::<S>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn rules<S: 'static>(&self) -> &[Arc<dyn SourceRule<S>>] {
        self.rules
            .get(&TypeId::of::<S>())
            .and_then(|v| v.downcast_ref::<Rules<S>>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Storage value of a natively representable type.
    ///
    /// Without converters the native value is returned unchanged, otherwise the
    /// first converter that succeeds wins.
    pub fn to_storage<S: AsValue + Clone + 'static>(&self, value: &S) -> Result<Value> {
        let rules = self.rules::<S>();
        if rules.is_empty() {
            return Ok(value.clone().as_value());
        }
        Self::apply_to_storage(rules, value)
    }

    /// Storage value of a type that can only be stored through a converter.
    pub fn to_storage_converted<S: 'static>(&self, value: &S) -> Result<Value> {
        let rules = self.rules::<S>();
        if rules.is_empty() {
            return Err(MappingError::NoConverter {
                source_type: any::type_name::<S>(),
            }
            .into());
        }
        Self::apply_to_storage(rules, value)
    }

    fn apply_to_storage<S: 'static>(rules: &[Arc<dyn SourceRule<S>>], value: &S) -> Result<Value> {
        let mut last = None;
        for rule in rules {
            match rule.to_storage(value) {
                Ok(v) => return Ok(v),
                Err(e) => last = Some(e),
            }
        }
        let source = last.unwrap_or_else(|| Error::msg("No converter succeeded"));
        Err(MappingError::ToStorage {
            source_type: any::type_name::<S>(),
            source: source.into(),
        }
        .into())
    }

    /// Convert a stored value back into a natively representable type.
    ///
    /// A value already of the native storage type is taken as is. Otherwise the
    /// converters whose storage type matches the value are tried first, then every
    /// converter, then the representational conversion of [`AsValue`].
    pub fn from_storage<S: AsValue + 'static>(&self, value: Value) -> Result<S> {
        if S::as_empty_value().same_type(&value) {
            return S::try_from_value(value).map_err(Self::conversion_error::<S>);
        }
        if let Some(Ok(v)) = Self::apply_from_storage(self.rules::<S>(), &value) {
            return Ok(v);
        }
        S::try_from_value(value).map_err(Self::conversion_error::<S>)
    }

    /// Convert a stored value back into a type only reachable through converters.
    pub fn from_storage_converted<S: 'static>(&self, value: Value) -> Result<S> {
        match Self::apply_from_storage(self.rules::<S>(), &value) {
            Some(Ok(v)) => Ok(v),
            Some(Err(e)) => Err(Self::conversion_error::<S>(e)),
            None => Err(MappingError::NoConverter {
                source_type: any::type_name::<S>(),
            }
            .into()),
        }
    }

    /// `None` when there are no rules, otherwise the first success or the last error.
    fn apply_from_storage<S: 'static>(
        rules: &[Arc<dyn SourceRule<S>>],
        value: &Value,
    ) -> Option<Result<S>> {
        if rules.is_empty() {
            return None;
        }
        let (preferred, others): (Vec<_>, Vec<_>) = rules
            .iter()
            .partition(|rule| rule.storage_type().same_type(value));
        let mut last = None;
        for rule in preferred.into_iter().chain(others) {
            match rule.from_storage(value.clone()) {
                Ok(v) => return Some(Ok(v)),
                Err(e) => last = Some(e),
            }
        }
        last.map(Err)
    }

    fn conversion_error<S>(source: Error) -> Error {
        MappingError::Conversion {
            target: any::type_name::<S>(),
            source: source.into(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Celsius(f64);

    struct CelsiusAsText;
    impl TypeConverter<Celsius, String> for CelsiusAsText {
        fn to_storage(&self, source: &Celsius) -> Result<String> {
            Ok(format!("{}C", source.0))
        }
        fn from_storage(&self, value: String) -> Result<Celsius> {
            let number = value
                .strip_suffix('C')
                .ok_or_else(|| Error::msg("Missing unit"))?;
            Ok(Celsius(number.parse()?))
        }
    }

    struct CelsiusAsDouble;
    impl TypeConverter<Celsius, f64> for CelsiusAsDouble {
        fn to_storage(&self, source: &Celsius) -> Result<f64> {
            Ok(source.0)
        }
        fn from_storage(&self, value: f64) -> Result<Celsius> {
            Ok(Celsius(value))
        }
    }

    struct Failing;
    impl TypeConverter<i32, String> for Failing {
        fn to_storage(&self, _source: &i32) -> Result<String> {
            Err(Error::msg("always fails"))
        }
        fn from_storage(&self, _value: String) -> Result<i32> {
            Err(Error::msg("always fails"))
        }
    }

    #[test]
    fn native_values_pass_through() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.to_storage(&5i32).unwrap(), Value::Int(Some(5)));
        assert_eq!(registry.from_storage::<i64>(Value::Int(Some(5))).unwrap(), 5);
        assert!(!registry.contains::<i32>());
    }

    #[test]
    fn first_rule_wins_on_write() {
        let mut registry = ConverterRegistry::new();
        registry
            .register(CelsiusAsText)
            .register(CelsiusAsDouble);
        assert_eq!(
            registry.to_storage_converted(&Celsius(21.5)).unwrap(),
            Value::Text(Some("21.5C".into()))
        );
        assert_eq!(registry.describe::<Celsius>().len(), 2);
    }

    #[test]
    fn read_prefers_matching_storage_type() {
        let mut registry = ConverterRegistry::new();
        registry
            .register(CelsiusAsText)
            .register(CelsiusAsDouble);
        let from_double: Celsius = registry
            .from_storage_converted(Value::Double(Some(3.0)))
            .unwrap();
        assert_eq!(from_double, Celsius(3.0));
        let from_text: Celsius = registry
            .from_storage_converted(Value::Text(Some("4C".into())))
            .unwrap();
        assert_eq!(from_text, Celsius(4.0));
    }

    #[test]
    fn failures_are_mapping_errors() {
        let mut registry = ConverterRegistry::new();
        registry.register(Failing);
        let error = registry.to_storage(&1i32).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<MappingError>(),
            Some(MappingError::ToStorage { .. })
        ));

        let error = registry
            .from_storage::<i32>(Value::Text(Some("x".into())))
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<MappingError>(),
            Some(MappingError::Conversion { target, .. }) if *target == "i32"
        ));

        let error = registry
            .to_storage_converted(&Celsius(1.0))
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<MappingError>(),
            Some(MappingError::NoConverter { .. })
        ));
    }

    #[test]
    fn native_type_short_circuits_rules() {
        let mut registry = ConverterRegistry::new();
        registry.register(Failing);
        // The stored value is already an int, the failing converter is never consulted
        assert_eq!(registry.from_storage::<i32>(Value::Int(Some(7))).unwrap(), 7);
        // Widening fallback after the rule fails
        assert_eq!(registry.from_storage::<i32>(Value::SmallInt(Some(7))).unwrap(), 7);
    }
}
