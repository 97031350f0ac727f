mod invoices;
mod memory;
mod users;

pub use invoices::*;
pub use memory::*;
pub use users::*;

use astra::{
    ConventionOptions, CqlClient, EntityType, JsonStringConverter, MappingRegistry,
    OffsetDateTimeEpochConverter, RequestDefaults, Session,
};
use log::LevelFilter;
use std::{env, sync::Arc};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Registry of the fixture entities: instants as epoch millis, addresses as JSON,
/// conventions for the types without a declared table.
pub fn registry() -> MappingRegistry {
    MappingRegistry::configure(|config| {
        config
            .add_converter(OffsetDateTimeEpochConverter)
            .add_converter(JsonStringConverter::<Address>::new())
            .add_convention_maps(
                &[EntityType::of::<User>(), EntityType::of::<Invoice>()],
                &ConventionOptions::new().keyspace("billing"),
            );
    })
}

/// A memory session knowing the primary keys of the fixture tables.
pub fn memory_session() -> MemorySession {
    MemorySession::new()
        .with_keyspace("testing")
        .with_primary_key("users", ["user_id"])
        .with_primary_key("invoice", ["invoice_id"])
}

pub async fn execute_tests<S: Session>(session: S) {
    let client = CqlClient::new(session, Arc::new(registry()), RequestDefaults::default());
    users(&client).await;
    invoices(&client).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
