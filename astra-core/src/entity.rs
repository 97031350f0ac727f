use crate::{ConventionOptions, ConverterRegistry, MappingConfigurator, Result, TypeOverride, Value};
use std::{any::TypeId, fmt, marker::PhantomData};

/// Reads a property and converts it to its storage value.
pub type Getter<E> = fn(&E, &ConverterRegistry) -> Result<Value>;
/// Converts a storage value and assigns the property, `None` is a null column.
pub type Setter<E> = fn(&mut E, Option<Value>, &ConverterRegistry) -> Result<()>;

/// A record type mapped to a CQL table.
///
/// Usually implemented with `#[derive(Entity)]`, which exposes every public field
/// not marked `#[cql(skip)]` as a property. Instances read back from rows start
/// from `Default::default()` and then have each available column assigned.
pub trait Entity: Default + Send + Sync + 'static {
    /// Simple name of the type, the input of table naming conventions.
    fn type_name() -> &'static str;
    /// Table declared on the type itself (`#[cql(table = "...")]`).
    fn declared_table() -> Option<&'static str>;
    /// Keyspace declared on the type itself (`#[cql(keyspace = "...")]`).
    fn declared_keyspace() -> Option<&'static str> {
        None
    }
    /// The mapped properties, in declaration order.
    fn properties() -> &'static [PropertyDef<Self>];
}

/// Accessors and naming of a single mapped property.
pub struct PropertyDef<E: 'static> {
    pub name: &'static str,
    /// Column declared on the field (`#[cql(column = "...")]`).
    pub column: Option<&'static str>,
    /// The Rust type as written in the source.
    pub type_name: &'static str,
    /// Whether null is a representable value (`Option` fields).
    pub nullable: bool,
    pub get: Getter<E>,
    pub set: Setter<E>,
}

impl<E> fmt::Debug for PropertyDef<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("type_name", &self.type_name)
            .field("nullable", &self.nullable)
            .finish()
    }
}

/// Typed handle to a property of `E`.
///
/// The derive generates one per property as an associated constant of the
/// `{Type}Properties` trait, so that `User::email` selects a property in a type
/// checked way.
pub struct PropertyRef<E> {
    name: &'static str,
    _entity: PhantomData<fn() -> E>,
}

impl<E> PropertyRef<E> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _entity: PhantomData,
        }
    }
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<E> Clone for PropertyRef<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for PropertyRef<E> {}

impl<E> fmt::Debug for PropertyRef<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyRef({})", self.name)
    }
}

/// Type erased entity type, used where a list of heterogeneous types is expected
/// (convention scanning, overrides loaded from configuration).
#[derive(Clone, Copy)]
pub struct EntityType {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) declared_table: Option<&'static str>,
    pub(crate) apply_convention: fn(&mut MappingConfigurator, &ConventionOptions<'_>),
    pub(crate) apply_override: fn(&mut MappingConfigurator, &TypeOverride),
}

impl EntityType {
    pub fn of<E: Entity>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: E::type_name(),
            declared_table: E::declared_table(),
            apply_convention: MappingConfigurator::apply_convention::<E>,
            apply_override: MappingConfigurator::apply_override::<E>,
        }
    }
    pub fn name(&self) -> &'static str {
        self.name
    }
    pub fn declared_table(&self) -> Option<&'static str> {
        self.declared_table
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityType({})", self.name)
    }
}
