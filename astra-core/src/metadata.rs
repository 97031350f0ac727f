use crate::{ConverterRegistry, Entity, Getter, Result, Setter, Value, snake_case};
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

/// A property bound to its default column name.
pub struct ColumnBinding<E: 'static> {
    pub property: &'static str,
    /// Declared column or the snake cased property name.
    pub column: String,
    pub nullable: bool,
    get: Getter<E>,
    set: Setter<E>,
}

impl<E> ColumnBinding<E> {
    /// Storage value of this property of `entity`.
    pub fn get(&self, entity: &E, converters: &ConverterRegistry) -> Result<Value> {
        (self.get)(entity, converters)
    }
    /// Assign this property of `entity` from a storage value, `None` is null.
    pub fn set(&self, entity: &mut E, value: Option<Value>, converters: &ConverterRegistry) -> Result<()> {
        (self.set)(entity, value, converters)
    }
}

impl<E> fmt::Debug for ColumnBinding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnBinding")
            .field("property", &self.property)
            .field("column", &self.column)
            .field("nullable", &self.nullable)
            .finish()
    }
}

/// Default table name and column bindings of an entity type, sorted by column name.
#[derive(Debug)]
pub struct TypeMetadata<E: 'static> {
    pub table: String,
    pub columns: Vec<ColumnBinding<E>>,
}

impl<E: Entity> TypeMetadata<E> {
    pub fn build() -> Self {
        let table = E::declared_table()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| snake_case(E::type_name()));
        let mut columns: Vec<_> = E::properties()
            .iter()
            .map(|p| ColumnBinding {
                property: p.name,
                column: p
                    .column
                    .map(ToOwned::to_owned)
                    .unwrap_or_else(|| snake_case(p.name)),
                nullable: p.nullable,
                get: p.get,
                set: p.set,
            })
            .collect();
        columns.sort_by(|a, b| a.column.cmp(&b.column));
        Self { table, columns }
    }

    pub fn column(&self, property: &str) -> Option<&ColumnBinding<E>> {
        self.columns.iter().find(|c| c.property == property)
    }
}

/// Process wide memo of [`TypeMetadata`], built once per entity type.
///
/// Concurrent first requests may build twice, the first inserted entry is kept and
/// every caller ends up with that same instance.
#[derive(Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get<E: Entity>(&self) -> Arc<TypeMetadata<E>> {
        let id = TypeId::of::<E>();
        let found = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned();
        let entry = match found {
            Some(entry) => entry,
            None => {
                let built: Arc<dyn Any + Send + Sync> = Arc::new(TypeMetadata::<E>::build());
                log::debug!("Built the mapping metadata of `{}`", E::type_name());
                self.entries
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entry(id)
                    .or_insert(built)
                    .clone()
            }
        };
        entry
            .downcast()
            .unwrap_or_else(|_| Arc::new(TypeMetadata::build()))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PropertyDef;

    #[derive(Default)]
    struct UserProfile {
        display_name: String,
        age: Option<i32>,
    }

    impl Entity for UserProfile {
        fn type_name() -> &'static str {
            "UserProfile"
        }
        fn declared_table() -> Option<&'static str> {
            None
        }
        fn properties() -> &'static [PropertyDef<Self>] {
            static PROPERTIES: &[PropertyDef<UserProfile>] = &[
                PropertyDef {
                    name: "displayName",
                    column: None,
                    type_name: "String",
                    nullable: false,
                    get: |e, c| c.to_storage(&e.display_name),
                    set: |e, v, c| {
                        if let Some(v) = v {
                            e.display_name = c.from_storage(v)?;
                        }
                        Ok(())
                    },
                },
                PropertyDef {
                    name: "Age",
                    column: Some("years"),
                    type_name: "Option<i32>",
                    nullable: true,
                    get: |e, c| match &e.age {
                        Some(v) => c.to_storage(v),
                        None => Ok(Value::Null),
                    },
                    set: |e, v, c| {
                        e.age = v.map(|v| c.from_storage(v)).transpose()?;
                        Ok(())
                    },
                },
            ];
            PROPERTIES
        }
    }

    #[test]
    fn default_names_and_order() {
        let metadata = TypeMetadata::<UserProfile>::build();
        assert_eq!(metadata.table, "user_profile");
        let columns: Vec<_> = metadata.columns.iter().map(|c| c.column.as_str()).collect();
        assert_eq!(columns, ["display_name", "years"]);
        assert!(metadata.column("Age").unwrap().nullable);
    }

    #[test]
    fn bindings_read_and_write() {
        let metadata = TypeMetadata::<UserProfile>::build();
        let converters = ConverterRegistry::new();
        let mut profile = UserProfile::default();
        let age = metadata.column("Age").unwrap();
        age.set(&mut profile, Some(Value::Int(Some(30))), &converters)
            .unwrap();
        assert_eq!(profile.age, Some(30));
        assert_eq!(age.get(&profile, &converters).unwrap(), Value::Int(Some(30)));
        age.set(&mut profile, None, &converters).unwrap();
        assert_eq!(age.get(&profile, &converters).unwrap(), Value::Null);
    }

    #[test]
    fn cache_builds_once() {
        let cache = MetadataCache::new();
        assert!(cache.is_empty());
        let a = cache.get::<UserProfile>();
        let b = cache.get::<UserProfile>();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_first_access() {
        let cache = Arc::new(MetadataCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.get::<UserProfile>())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
