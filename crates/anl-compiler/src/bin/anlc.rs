//! `anlc`: transpile an ANL kernel document to C++.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anl_codegen::{CodegenOptions, DEFAULT_MAX_DEPTH};
use anl_compiler::{transpile_json, CompileError, CompileResult, TranspileOptions};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "anlc", version, about = "Transpile an ANL noise kernel to C++")]
struct Args {
    /// Kernel document (JSON)
    input: PathBuf,

    /// Output C++ file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum lowering recursion depth
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: u32,

    /// Emit only the generated blocks, without header or skeleton
    #[arg(long)]
    blocks: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("anlc: {}: {e}", args.input.display());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> CompileResult<()> {
    let json = fs::read_to_string(&args.input).map_err(|source| io_error(&args.input, source))?;
    let options = TranspileOptions {
        codegen: CodegenOptions {
            max_depth: args.max_depth,
        },
        blocks_only: args.blocks,
    };
    let output = transpile_json(&json, &options)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &output.source).map_err(|source| io_error(path, source))?;
            log::info!("wrote {}", path.display());
        }
        None => print!("{}", output.source),
    }
    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> CompileError {
    CompileError::Io {
        path: path.to_path_buf(),
        source,
    }
}
