//! Configuration module for the shader build
//!
//! Provides types and parsing for `glslbuild.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::{default_config, load_config, ConfigError};
pub use schema::*;
