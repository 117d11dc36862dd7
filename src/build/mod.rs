//! Build pipeline module for glslbuild
//!
//! Compiles GLSL shader sources into SPIR-V, recompiling only what changed.
//!
//! # Overview
//!
//! The build pipeline consists of:
//! - **Discovery**: Find shader sources by their `.<stage>.glsl` suffix
//! - **Planning**: Map each source to its mirrored output path
//! - **Staleness**: Compare output timestamps with the source and its includes
//! - **Execution**: Compile stale shaders in parallel
//!
//! # Example
//!
//! ```no_run
//! use glslbuild::build::{BuildContext, BuildPipeline};
//! use glslbuild::config::default_config;
//! use std::path::PathBuf;
//!
//! let context = BuildContext::new(default_config(), PathBuf::from("."));
//! let result = BuildPipeline::new(context).build()?;
//! println!("{}", result.summary());
//! # Ok::<(), glslbuild::build::BuildError>(())
//! ```

pub mod cancel;
pub mod compiler;
pub mod context;
pub mod discovery;
pub mod incremental;
pub mod kind;
pub mod parallel;
pub mod pipeline;
pub mod progress;
pub mod result;
pub mod target;

pub use cancel::*;
pub use compiler::*;
pub use context::*;
pub use discovery::*;
pub use incremental::*;
pub use kind::*;
pub use parallel::*;
pub use pipeline::*;
pub use progress::*;
pub use result::*;
pub use target::*;
