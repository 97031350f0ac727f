pub use astra_core::*;
pub use astra_macros::*;
