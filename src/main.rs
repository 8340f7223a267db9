// pseudoc: pseudocode to C++ translator

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use env_logger::Builder;
use log::{debug, info, LevelFilter};

use pseudoc::translate;

/// Translate a pseudocode program to C++ and compile it
#[derive(Parser, Debug)]
#[command(name = "pseudoc", version, about, long_about = None)]
struct Cli {
    /// Pseudocode source file
    input: PathBuf,

    /// Where to write the generated C++
    #[arg(short, long, value_name = "FILE", default_value = "output.cpp")]
    output: PathBuf,

    /// Write the C++ file but do not invoke the compiler
    #[arg(long)]
    emit_only: bool,

    /// C++ compiler used to build the generated file
    #[arg(long, value_name = "CMD", default_value = "g++")]
    compiler: String,

    /// Name of the executable the compiler produces
    #[arg(long, value_name = "NAME", default_value = "output")]
    binary: PathBuf,

    /// Fail if any error diagnostic was reported
    #[arg(long)]
    strict: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .parse_default_env();
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Read source code
    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("could not open file {}", cli.input.display()))?;

    // Diagnostics are logged as they are recorded
    info!("translating {}", cli.input.display());
    let translation = translate(&source)
        .with_context(|| format!("failed to translate {}", cli.input.display()))?;

    let errors = translation.diagnostics.error_count();
    let warnings = translation.diagnostics.warning_count();
    if !translation.diagnostics.is_empty() {
        eprintln!(
            "{}: {} error(s), {} warning(s)",
            cli.input.display(),
            errors,
            warnings
        );
    }

    if cli.strict && errors > 0 {
        bail!(
            "translation of {} reported {} error(s)",
            cli.input.display(),
            errors
        );
    }

    fs::write(&cli.output, &translation.output)
        .with_context(|| format!("could not write {}", cli.output.display()))?;
    debug!(
        "wrote {} bytes to {}",
        translation.output.len(),
        cli.output.display()
    );

    if cli.emit_only {
        println!("Generated {}", cli.output.display());
        return Ok(());
    }

    // Compile the generated C++ code
    let status = Command::new(&cli.compiler)
        .arg(&cli.output)
        .arg("-o")
        .arg(&cli.binary)
        .status()
        .with_context(|| format!("could not run compiler '{}'", cli.compiler))?;

    if !status.success() {
        bail!("could not compile the generated C++ code ({})", status);
    }

    println!(
        "Compilation successful! Run the program with './{}'",
        cli.binary.display()
    );
    Ok(())
}
