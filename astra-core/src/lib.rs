mod as_value;
mod client;
mod config;
mod converter;
mod converters;
mod entity;
mod error;
mod fields;
mod mapper;
mod metadata;
mod options;
mod prepared_cache;
mod registry;
mod row;
mod session;
mod util;
mod value;
mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use client::*;
pub use config::*;
pub use converter::*;
pub use converters::*;
pub use entity::*;
pub use error::*;
pub use fields::*;
pub use mapper::*;
pub use metadata::*;
pub use options::*;
pub use prepared_cache::*;
pub use registry::*;
pub use row::*;
pub use session::*;
pub use util::*;
pub use value::*;
pub use writer::*;
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
