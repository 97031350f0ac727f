use crate::{Context, Entity, Fields, MappingRegistry, MetadataCache, Result, Row, TypeMetadata};
use std::sync::Arc;

/// Converts entities to column maps and rows back to entities.
///
/// Column names go through the registry overrides before falling back to the
/// names baked into the type metadata.
pub struct Mapper {
    registry: Arc<MappingRegistry>,
    metadata: MetadataCache,
}

impl Mapper {
    pub fn new(registry: Arc<MappingRegistry>) -> Self {
        Self {
            registry,
            metadata: MetadataCache::new(),
        }
    }

    pub fn registry(&self) -> &Arc<MappingRegistry> {
        &self.registry
    }

    pub fn metadata<E: Entity>(&self) -> Arc<TypeMetadata<E>> {
        self.metadata.get::<E>()
    }

    /// Table of `E` after overrides.
    pub fn table_name<E: Entity>(&self) -> String {
        let metadata = self.metadata::<E>();
        self.registry.resolve_table::<E>(&metadata.table).to_owned()
    }

    /// Columns of `E` after overrides, in metadata order.
    pub fn column_names<E: Entity>(&self) -> Vec<String> {
        let metadata = self.metadata::<E>();
        metadata
            .columns
            .iter()
            .map(|c| {
                self.registry
                    .resolve_column::<E>(c.property, &c.column)
                    .to_owned()
            })
            .collect()
    }

    /// One entry per mapped property, nulls kept as nulls.
    pub fn to_fields<E: Entity>(&self, entity: &E) -> Result<Fields> {
        let metadata = self.metadata::<E>();
        let converters = self.registry.converters();
        let mut fields = Fields::with_capacity(metadata.columns.len());
        for binding in &metadata.columns {
            let value = binding.get(entity, converters).with_context(|| {
                format!(
                    "While reading the property `{}` of `{}`",
                    binding.property,
                    E::type_name()
                )
            })?;
            let column = self
                .registry
                .resolve_column::<E>(binding.property, &binding.column);
            fields.insert(column, value);
        }
        Ok(fields)
    }

    /// Build an entity from a row.
    ///
    /// Columns outside `available` (compared ignoring ASCII case) and columns the
    /// row does not have are skipped, the property keeps its default value.
    pub fn from_row<E: Entity>(&self, row: &impl Row, available: Option<&[String]>) -> Result<E> {
        let metadata = self.metadata::<E>();
        let converters = self.registry.converters();
        let mut entity = E::default();
        for binding in &metadata.columns {
            let column = self
                .registry
                .resolve_column::<E>(binding.property, &binding.column);
            if let Some(available) = available
                && !available.iter().any(|v| v.eq_ignore_ascii_case(column))
            {
                continue;
            }
            if !row.contains(column) {
                continue;
            }
            let value = row.get_value(column).filter(|v| !v.is_null());
            binding.set(&mut entity, value, converters).with_context(|| {
                format!(
                    "While assigning the column `{}` to the property `{}` of `{}`",
                    column,
                    binding.property,
                    E::type_name()
                )
            })?;
        }
        Ok(entity)
    }
}
