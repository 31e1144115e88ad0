//! Executes a lanes job file.
//!
//! Loads a JSON job (program plus input data), runs it, and prints or saves
//! the output streams.
//!
//! Usage: `lanes-run <job.json> [--output FILE] [--parallel] [--chunk-size N]`

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info};

use lanes_tools::{JobFile, write_results};
use lanes_vm::ChunkConfig;

#[derive(Parser, Debug)]
#[command(name = "lanes-run")]
#[command(about = "Evaluate a compiled expression program over a batch of instances")]
struct Args {
    /// Path to the job file (JSON)
    job: PathBuf,

    /// Write results to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Run chunked on all cores, overriding the job's setting
    #[arg(long)]
    parallel: bool,

    /// Instances per parallel chunk (implies --parallel)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Override the job's instance count
    #[arg(long)]
    instances: Option<usize>,
}

fn main() {
    lanes_tools::init_logging();

    let args = Args::parse();

    let mut job = match JobFile::load(&args.job) {
        Ok(job) => job,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    if let Some(instances) = args.instances {
        job.instance_count = instances;
    }
    if let Some(chunk_size) = args.chunk_size {
        job.parallel = Some(ChunkConfig::new(chunk_size));
    } else if args.parallel && job.parallel.is_none() {
        job.parallel = Some(ChunkConfig::auto(job.instance_count));
    }

    info!(
        "Running {} ({} instances, {} outputs)",
        args.job.display(),
        job.instance_count,
        job.output_names().len()
    );

    let results = match job.run() {
        Ok(results) => results,
        Err(e) => {
            error!("Execution failed: {}", e);
            process::exit(1);
        }
    };

    match args.output {
        Some(path) => {
            if let Err(e) = write_results(&path, &results) {
                error!("{}", e);
                process::exit(1);
            }
            info!("Results written to {}", path.display());
        }
        None => {
            for (name, values) in &results {
                println!("{name}: {values:?}");
            }
        }
    }
}
