//! glslbuild - Incremental GLSL to SPIR-V shader builds
//!
//! This library provides functionality to:
//! - Classify shader sources by their `.<stage>.glsl` suffix
//! - Resolve transitive `#include` dependencies
//! - Decide which compiled shaders are out of date
//! - Compile stale shaders in parallel with an external compiler

pub mod build;
pub mod cli;
pub mod config;
pub mod include;
