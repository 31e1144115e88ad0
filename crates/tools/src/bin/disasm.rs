//! Prints a compiled program as readable instructions.
//!
//! Usage: `lanes-disasm <program.json>` (a bare program or a job file)

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "lanes-disasm")]
#[command(about = "Disassemble a compiled expression program")]
struct Args {
    /// Path to a program or job file (JSON)
    path: PathBuf,
}

fn main() {
    lanes_tools::init_logging();

    let args = Args::parse();

    let program = match lanes_tools::load_program(&args.path) {
        Ok(program) => program,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    match program.disassemble() {
        Ok(text) => print!("{text}"),
        Err(e) => {
            error!("Malformed program '{}': {}", args.path.display(), e);
            process::exit(1);
        }
    }
}
