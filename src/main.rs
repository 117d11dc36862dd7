//! glslb - Command-line tool for incremental GLSL shader builds

use std::process::ExitCode;

use glslbuild::cli;

fn main() -> ExitCode {
    cli::run()
}
