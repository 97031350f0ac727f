use crate::{
    AsValue, ConverterRegistry, Entity, EntityType, PropertyRef, TypeConverter, snake_case,
};
use serde::Deserialize;
use std::{
    any::{self, TypeId},
    collections::HashMap,
    fmt,
};

/// Immutable naming overrides and converters, shared by the mapper and the client.
#[derive(Default)]
pub struct MappingRegistry {
    tables: HashMap<TypeId, String>,
    keyspaces: HashMap<TypeId, String>,
    columns: HashMap<TypeId, HashMap<&'static str, String>>,
    converters: ConverterRegistry,
}

impl MappingRegistry {
    /// Configure a registry in place.
    ///
    /// ```rust
    /// use astra_core::MappingRegistry;
    /// let registry = MappingRegistry::configure(|_config| {});
    /// assert!(!registry.has_overrides());
    /// ```
    pub fn configure(f: impl FnOnce(&mut MappingConfigurator)) -> Self {
        let mut configurator = MappingConfigurator::new();
        f(&mut configurator);
        configurator.build()
    }

    /// Table of `E`, `default` unless overridden.
    pub fn resolve_table<'a, E: Entity>(&'a self, default: &'a str) -> &'a str {
        self.tables
            .get(&TypeId::of::<E>())
            .map(String::as_str)
            .unwrap_or(default)
    }

    /// Column of the property `property` of `E`, `default` unless overridden.
    pub fn resolve_column<'a, E: Entity>(&'a self, property: &str, default: &'a str) -> &'a str {
        self.columns
            .get(&TypeId::of::<E>())
            .and_then(|v| v.get(property))
            .map(String::as_str)
            .unwrap_or(default)
    }

    /// Keyspace configured for `E`, falling back to the one declared on the type.
    pub fn resolve_keyspace<E: Entity>(&self) -> Option<&str> {
        self.keyspaces
            .get(&TypeId::of::<E>())
            .map(String::as_str)
            .or(E::declared_keyspace())
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn has_overrides(&self) -> bool {
        !self.tables.is_empty() || !self.keyspaces.is_empty() || !self.columns.is_empty()
    }
}

impl fmt::Debug for MappingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingRegistry")
            .field("tables", &self.tables.len())
            .field("keyspaces", &self.keyspaces.len())
            .field("columns", &self.columns.values().map(HashMap::len).sum::<usize>())
            .finish()
    }
}

/// A reusable set of mapping definitions.
pub trait Mappings {
    fn define(&self, config: &mut MappingConfigurator);
}

/// Naming conventions applied by [`MappingConfigurator::add_convention_maps`].
pub struct ConventionOptions<'a> {
    pub keyspace: Option<String>,
    pub table_name: Box<dyn Fn(&str) -> String + 'a>,
    pub column_name: Box<dyn Fn(&str) -> String + 'a>,
}

impl<'a> ConventionOptions<'a> {
    pub fn new() -> Self {
        Self {
            keyspace: None,
            table_name: Box::new(snake_case),
            column_name: Box::new(snake_case),
        }
    }
    pub fn keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }
    pub fn table_name(mut self, f: impl Fn(&str) -> String + 'a) -> Self {
        self.table_name = Box::new(f);
        self
    }
    pub fn column_name(mut self, f: impl Fn(&str) -> String + 'a) -> Self {
        self.column_name = Box::new(f);
        self
    }
}

impl Default for ConventionOptions<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Explicit keyspace, table and column names for one entity type.
#[derive(Debug, Clone)]
pub struct TypeOverride {
    pub entity: EntityType,
    pub keyspace: Option<String>,
    pub table: Option<String>,
    /// Property name to column name.
    pub columns: HashMap<String, String>,
}

impl TypeOverride {
    pub fn of<E: Entity>() -> Self {
        Self {
            entity: EntityType::of::<E>(),
            keyspace: None,
            table: None,
            columns: HashMap::new(),
        }
    }
    pub fn keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
    pub fn column(mut self, property: impl Into<String>, column: impl Into<String>) -> Self {
        self.columns.insert(property.into(), column.into());
        self
    }
}

/// Serializable form of [`TypeOverride`] naming the entity by its simple type name,
/// as found in configuration files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TypeOverrideConfig {
    #[serde(rename = "type")]
    pub type_name: String,
    pub keyspace: Option<String>,
    pub table: Option<String>,
    pub columns: HashMap<String, String>,
}

impl TypeOverrideConfig {
    /// Match against `known` by simple type name.
    pub fn resolve(self, known: &[EntityType]) -> Option<TypeOverride> {
        let entity = known.iter().find(|v| v.name == self.type_name).copied();
        if entity.is_none() {
            log::warn!(
                "Mapping override for unknown type `{}` is ignored",
                self.type_name
            );
        }
        Some(TypeOverride {
            entity: entity?,
            keyspace: self.keyspace,
            table: self.table,
            columns: self.columns,
        })
    }
}

/// Mutable configuration phase of a [`MappingRegistry`].
///
/// ```rust
/// use astra_core::{MappingConfigurator, OffsetDateTimeEpochConverter};
/// let mut config = MappingConfigurator::new();
/// config.add_converter(OffsetDateTimeEpochConverter);
/// let registry = config.build();
/// assert!(registry.converters().contains::<time::OffsetDateTime>());
/// ```
#[derive(Default)]
pub struct MappingConfigurator {
    registry: MappingRegistry,
}

impl MappingConfigurator {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn map_table<E: Entity>(&mut self, table: impl Into<String>) -> &mut Self {
        self.registry
            .tables
            .insert(TypeId::of::<E>(), table.into());
        self
    }

    pub fn map_keyspace<E: Entity>(&mut self, keyspace: impl Into<String>) -> &mut Self {
        self.registry
            .keyspaces
            .insert(TypeId::of::<E>(), keyspace.into());
        self
    }

    pub fn map_column<E: Entity>(
        &mut self,
        property: PropertyRef<E>,
        column: impl Into<String>,
    ) -> &mut Self {
        self.registry
            .columns
            .entry(TypeId::of::<E>())
            .or_default()
            .insert(property.name(), column.into());
        self
    }

    pub fn add_converter<S, T, C>(&mut self, converter: C) -> &mut Self
    where
        S: 'static,
        T: AsValue + 'static,
        C: TypeConverter<S, T>,
    {
        self.registry.converters.register(converter);
        self
    }

    pub fn add_mappings<M: Mappings + Default>(&mut self) -> &mut Self {
        self.apply(&M::default())
    }

    pub fn apply(&mut self, mappings: &impl Mappings) -> &mut Self {
        mappings.define(self);
        self
    }

    /// Derive table and column names for every type without a declared table.
    ///
    /// Names already set (declared on the field, or overridden before) are kept.
    pub fn add_convention_maps(
        &mut self,
        types: &[EntityType],
        options: &ConventionOptions<'_>,
    ) -> &mut Self {
        for ty in types {
            (ty.apply_convention)(self, options);
        }
        self
    }

    pub fn add_overrides(&mut self, overrides: impl IntoIterator<Item = TypeOverride>) -> &mut Self {
        for item in overrides {
            (item.entity.apply_override)(self, &item);
        }
        self
    }

    pub(crate) fn apply_convention<E: Entity>(&mut self, options: &ConventionOptions<'_>) {
        if let Some(table) = E::declared_table() {
            log::debug!(
                "`{}` declares the table `{}`, conventions skipped",
                E::type_name(),
                table
            );
            return;
        }
        let id = TypeId::of::<E>();
        self.registry
            .tables
            .entry(id)
            .or_insert_with(|| (options.table_name)(E::type_name()));
        if let Some(keyspace) = &options.keyspace {
            self.registry
                .keyspaces
                .entry(id)
                .or_insert_with(|| keyspace.clone());
        }
        let columns = self.registry.columns.entry(id).or_default();
        for property in E::properties().iter().filter(|p| p.column.is_none()) {
            columns
                .entry(property.name)
                .or_insert_with(|| (options.column_name)(property.name));
        }
    }

    pub(crate) fn apply_override<E: Entity>(&mut self, item: &TypeOverride) {
        let id = TypeId::of::<E>();
        if let Some(keyspace) = &item.keyspace {
            self.registry.keyspaces.insert(id, keyspace.clone());
        }
        if let Some(table) = &item.table {
            self.registry.tables.insert(id, table.clone());
        }
        for (name, column) in &item.columns {
            match E::properties().iter().find(|p| p.name == name) {
                Some(property) => {
                    self.registry
                        .columns
                        .entry(id)
                        .or_default()
                        .insert(property.name, column.clone());
                }
                None => log::warn!(
                    "`{}` has no property `{}`, column override ignored",
                    any::type_name::<E>(),
                    name
                ),
            }
        }
    }

    pub fn build(self) -> MappingRegistry {
        self.registry
    }
}
