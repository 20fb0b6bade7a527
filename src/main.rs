use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use junco::driver::{self, Settings};

/// An ahead-of-time compiler for a small Scheme subset.
#[derive(Debug, Parser)]
#[command(name = "junco", version)]
struct Args {
    /// Compile the given expression, load it, and run it in-process.
    #[arg(short = 'e', value_name = "EXPR", conflicts_with = "input")]
    evaluate: Option<String>,

    /// Compile the program at this path to an executable.
    #[arg(short = 'c', value_name = "PATH")]
    input: Option<PathBuf>,

    /// Where to place the executable produced by -c.
    #[arg(short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Dump the generated assembly to standard output.
    #[arg(short = 'd')]
    dump_asm: bool,

    /// Keep temporary files after the run.
    #[arg(short = 's')]
    keep_temps: bool,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("JUNCO_LOG").unwrap_or_else(|_| EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings {
        dump_asm: args.dump_asm,
        keep_temps: args.keep_temps,
    };

    let result = if let Some(expr) = args.evaluate {
        driver::evaluate(&expr, &settings)
    } else if let Some(input) = args.input {
        let output = args.output.unwrap_or_else(|| PathBuf::from("a.out"));
        driver::compile_file(&input, &output, &settings)
    } else {
        eprintln!("error: one of -e <expr> or -c <path> is required (see -h)");
        process::exit(1);
    };

    if let Err(error) = result {
        eprintln!("error: {}", error);
        process::exit(1);
    }
}
