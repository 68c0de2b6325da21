pub mod adapters;
pub mod files;
pub mod keys;
pub mod prelude;
pub mod query;

pub use bpi_core as core;
