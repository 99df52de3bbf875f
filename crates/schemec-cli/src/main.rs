mod cli;

use std::path::{Path, PathBuf};
use std::process::Command;

use clap::Parser;
use schemec::Compilation;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let source = match std::fs::read_to_string(&cli.input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: couldn't read {}: {e}", cli.input.display());
            std::process::exit(1);
        }
    };

    let (compilation, mut diagnostics) = Compilation::from_source(&source);
    let result = compilation.emit_c(&mut diagnostics);

    if !diagnostics.is_empty() {
        let path_str = cli.input.to_string_lossy();
        let rendered = diagnostics
            .printer()
            .source(&source)
            .path(&path_str)
            .colored(cli.should_colorize())
            .min_severity(cli.min_severity())
            .render();
        if !rendered.is_empty() {
            eprintln!("{rendered}");
        }
    }

    let c_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    match &cli.output {
        Some(output_path) => {
            if let Err(e) = std::fs::write(output_path, c_code) {
                eprintln!("error: couldn't write {}: {e}", output_path.display());
                std::process::exit(1);
            }
        }
        None => std::process::exit(build_and_run(&cli.input, &c_code)),
    }
}

/// No output path was given: write the generated C beside the input,
/// build it with `cc` (or `$CC`), run the resulting executable, and
/// propagate its exit code (spec.md §6.2).
fn build_and_run(input: &Path, c_code: &str) -> i32 {
    let c_path = input.with_extension("c");
    if let Err(e) = std::fs::write(&c_path, c_code) {
        eprintln!("error: couldn't write {}: {e}", c_path.display());
        return 1;
    }

    let exe_path = temp_exe_path(input);
    let cc = std::env::var("CC").unwrap_or_else(|_| "cc".to_string());

    let status = Command::new(&cc).arg(&c_path).arg("-o").arg(&exe_path).arg("-lm").status();
    let status = match status {
        Ok(status) => status,
        Err(e) => {
            eprintln!("error: couldn't run `{cc}`: {e}");
            return 1;
        }
    };
    if !status.success() {
        return status.code().unwrap_or(1);
    }

    match Command::new(&exe_path).status() {
        Ok(status) => status.code().unwrap_or(1),
        Err(e) => {
            eprintln!("error: couldn't run {}: {e}", exe_path.display());
            1
        }
    }
}

fn temp_exe_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("schemec_out");
    std::env::temp_dir().join(stem)
}
