use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Programmer and input errors raised by the mapping layer.
///
/// These are never swallowed or retried. They travel inside an [`anyhow::Error`]
/// like every other error of the crate and can be recovered with
/// `error.downcast_ref::<MappingError>()`.
#[derive(Error, Debug)]
pub enum MappingError {
    /// Missing identifiers, empty field sets, null filter values.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A stored value could not be converted into the requested type.
    #[error("Cannot convert the stored value to `{target}`")]
    Conversion {
        target: &'static str,
        #[source]
        source: BoxError,
    },

    /// Every converter registered for the type failed.
    #[error("Cannot convert `{source_type}` to its storage representation")]
    ToStorage {
        source_type: &'static str,
        #[source]
        source: BoxError,
    },

    /// The type has no native representation and no converter was registered.
    #[error("No converter registered for `{source_type}`")]
    NoConverter { source_type: &'static str },

    /// The operation is not supported by the store.
    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl MappingError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        MappingError::InvalidArgument(message.into())
    }
    pub fn not_supported(message: impl Into<String>) -> Self {
        MappingError::NotSupported(message.into())
    }
}
