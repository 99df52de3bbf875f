//! Argument parsing (spec.md §6.2): `schemec [options] <input.scm> [output.c]`.

use std::path::PathBuf;

use clap::Parser;

/// Compiles a schemec source file to C, or builds and runs it directly
/// when no output path is given.
#[derive(Parser, Debug)]
#[command(name = "schemec", version, about, long_about = None)]
pub struct Cli {
    /// Source file to compile.
    pub input: PathBuf,

    /// Write generated C here instead of building and running it.
    pub output: Option<PathBuf>,

    /// Show info-level diagnostics in addition to warnings and errors.
    #[arg(short, long)]
    pub verbose: bool,

    /// Show every diagnostic, including debug-level ones (implies --verbose).
    #[arg(short, long)]
    pub debug: bool,

    /// Colorize diagnostic output.
    #[arg(long, value_name = "WHEN", default_value = "auto", value_parser = ["auto", "always", "never"])]
    pub color: String,
}

impl Cli {
    pub fn should_colorize(&self) -> bool {
        match self.color.as_str() {
            "always" => true,
            "never" => false,
            _ => std::io::IsTerminal::is_terminal(&std::io::stdout()) && std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }

    pub fn min_severity(&self) -> schemec::diagnostics::Severity {
        use schemec::diagnostics::Severity;
        if self.debug {
            Severity::Debug
        } else if self.verbose {
            Severity::Info
        } else {
            Severity::Warning
        }
    }
}
