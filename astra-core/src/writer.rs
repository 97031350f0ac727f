mod cql_writer;

pub use cql_writer::*;
