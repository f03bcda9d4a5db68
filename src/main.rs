//! # Queue Sweep - Sweep Driver
//!
//! Runs the external queue benchmark once for every valid
//! (queue type, queue size, message size) grid point and streams the results
//! as CSV to standard output. Redirect stdout to keep them:
//!
//! ```text
//! queue-sweep > stats.csv
//! queue-plot stats.csv
//! ```
//!
//! ## Error Handling
//!
//! The first failing grid point aborts the sweep with a non-zero exit code.
//! Rows written before the failure stay in the output, which remains a valid
//! (partial) report.

use anyhow::{Context, Result};
use clap::Parser;
use queue_sweep::{cli::SweepArgs, logging, ExternalBenchmark, GridConfig, ReportWriter, SweepRunner};
use tracing::{error, info};

fn main() -> Result<()> {
    let args = SweepArgs::parse();
    logging::init(args.verbose);

    info!("Starting Queue Sweep {}", queue_sweep::VERSION);
    info!("Configuration: {:?}", args);

    let config = GridConfig::default();
    let program = ExternalBenchmark::new(&args.benchmark);

    let stdout = std::io::stdout();
    let mut report =
        ReportWriter::new(stdout.lock()).context("Failed to write CSV header to stdout")?;

    let mut runner = SweepRunner::new(&config, program);
    match runner.run(|sample| report.write_record(sample)) {
        Ok(samples) => {
            info!("Wrote {} rows", samples.len());
            Ok(())
        }
        Err(e) => {
            error!("Sweep aborted after {} rows: {}", report.rows(), e);
            Err(e).with_context(|| format!("Sweep failed using {}", args.benchmark.display()))
        }
    }
}
