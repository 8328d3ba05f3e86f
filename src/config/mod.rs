//! Configuration: a compile-time schema of typed options grouped into
//! sections, and a flat `key=value` text loader validated against it.

pub mod loader;
pub mod schema;

pub use loader::{Config, ConfigError};
pub use schema::{OptionRange, OptionSpec, OptionType, SCHEMA};
