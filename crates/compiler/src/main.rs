//! mcc CLI
//!
//! Command-line driver: compiles each listed source file to x86-64 assembly,
//! one translation unit per file. Debug channels map onto `tracing` targets
//! and are enabled per-channel with `-d` or by level with `-v`.

use clap::{CommandFactory, Parser as ClapParser};
use std::path::PathBuf;
use std::process;

#[derive(ClapParser)]
#[command(name = "mcc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "mini C compiler - compile C sources to x86-64 assembly", long_about = None)]
struct Cli {
    /// Enable a debug channel: l (scanner), p (parser), s (symbol)
    #[arg(short = 'd', value_name = "CHANNEL")]
    debug: Vec<char>,

    /// Verbose level 0-3 (1: symbols, 2: + tokens, 3: + parser trace)
    #[arg(short = 'v', value_name = "N", default_value_t = 0)]
    verbose: u8,

    /// Source files to compile
    files: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if cli.files.is_empty() {
        let _ = Cli::command().print_help();
        return;
    }

    let mut failed = 0i32;
    for file in &cli.files {
        if let Err(e) = mcc::compile_file(file) {
            eprintln!("{}", e);
            failed += 1;
        }
    }
    process::exit(failed);
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::EnvFilter;

    let mut directives: Vec<&str> = Vec::new();
    for &channel in &cli.debug {
        match channel {
            'l' => directives.push("scanner=debug"),
            'p' => directives.push("parser=trace"),
            's' => directives.push("symbol=debug"),
            other => eprintln!("unknown debug channel '{}'", other),
        }
    }
    if cli.verbose >= 1 {
        directives.push("symbol=debug");
    }
    if cli.verbose >= 2 {
        directives.push("scanner=debug");
    }
    if cli.verbose >= 3 {
        directives.push("parser=trace");
    }

    let mut filter = EnvFilter::from_default_env();
    for directive in directives {
        filter = filter.add_directive(directive.parse().unwrap());
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
