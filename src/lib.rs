//! # Queue Sweep Library
//!
//! A parameter-sweep harness and results visualizer for comparing the throughput
//! of interchangeable message queue implementations.
//!
//! The actual queues live in an external benchmark executable. This crate
//! drives that executable over a grid of buffer capacities and message sizes,
//! records one throughput sample per grid point as CSV, and later turns the CSV
//! back into per-implementation heatmaps that share one color scale.
//!
//! ## Phases
//!
//! - **Sweep** (`queue-sweep` binary): enumerate valid grid points, run the
//!   benchmark once per point, stream `queue_type, queue_size, message_size, time_us`
//!   rows to standard output.
//! - **Plot** (`queue-plot` binary): load a saved CSV into result matrices and
//!   render one panel per queue type as an SVG document and in the terminal.
//!
//! ## Architecture Overview
//!
//! - `grid`: Grid definition shared by both phases and the valid point enumeration
//! - `benchmark`: Benchmark program abstraction and the sweep runner
//! - `results`: CSV report writer and the loader that rebuilds result matrices
//! - `heatmap`: Shared color scale and the SVG/terminal panel renderers
//! - `cli`: Command-line interfaces of both binaries
//! - `logging`: Tracing subscriber setup and the colorized formatter
//! - `utils`: Formatting helpers
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use queue_sweep::{ExternalBenchmark, GridConfig, ReportWriter, SweepRunner};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = GridConfig::default();
//!     let program = ExternalBenchmark::new("./build/benchmark");
//!     let mut report = ReportWriter::new(std::io::stdout().lock())?;
//!
//!     let mut runner = SweepRunner::new(&config, program);
//!     let samples = runner.run(|sample| report.write_record(sample))?;
//!
//!     eprintln!("collected {} samples", samples.len());
//!     Ok(())
//! }
//! ```

/// Benchmark program abstraction and sweep execution
///
/// Contains the `BenchmarkProgram` trait that isolates the external executable,
/// the subprocess-backed `ExternalBenchmark`, and the `SweepRunner` that walks
/// the grid, derives the throughput metric and fails fast on the first error.
pub mod benchmark;

/// Command-line interfaces for the sweep and plot binaries
pub mod cli;

/// Parameter grid definition
///
/// Holds the queue types, the capacity and message size sequences, and the
/// per-message overhead used to filter out points where a message cannot fit.
pub mod grid;

/// Heatmap rendering
///
/// Converts result matrices to MiB/s, maps them through one shared color scale
/// and lays out one panel per queue type with a single color bar.
pub mod heatmap;

pub mod logging;

/// CSV report output and loading
///
/// The report writer is the only producer of the sweep's persisted output and
/// the loader its only consumer; they agree on the format defined here.
pub mod results;

pub mod utils;

pub use benchmark::{
    BenchmarkError, BenchmarkProgram, ExternalBenchmark, SampleRecord, SweepError, SweepRunner,
};
pub use grid::{AxisIndex, GridConfig, GridPoint, QueueType};
pub use heatmap::{ColorScale, Heatmap};
pub use results::{LoadError, ReportWriter, ResultMatrix, ResultSet, ResultsLoader};

/// The current version of the queue sweep harness
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fixed grid and invocation constants
///
/// These define the sweep that `GridConfig::default()` describes. Both
/// binaries build their configuration from here so a plot always matches the
/// sweep that produced its CSV.
pub mod defaults {
    use crate::grid::QueueType;

    /// Queue implementations swept, in panel order
    pub const QUEUE_TYPES: [QueueType; 2] = [QueueType::BasicQueue, QueueType::VmQueue];

    /// Repetitions the benchmark program averages over for each grid point
    pub const NUM_RUNS: usize = 10000;

    /// Queue sizes are `QUEUE_SIZE_UNIT * 1 ..= QUEUE_SIZE_UNIT * QUEUE_SIZE_COUNT`
    pub const QUEUE_SIZE_UNIT: usize = 4096;
    pub const QUEUE_SIZE_COUNT: usize = 15;

    /// Message sizes are `MESSAGE_SIZE_UNIT * 1 ..= MESSAGE_SIZE_UNIT * MESSAGE_SIZE_COUNT`
    pub const MESSAGE_SIZE_UNIT: usize = 256;
    pub const MESSAGE_SIZE_COUNT: usize = 31;

    /// Bytes of bookkeeping stored in the buffer alongside every message
    pub const MESSAGE_OVERHEAD: usize = 16;

    /// Location of the benchmark executable relative to the working directory
    pub const BENCHMARK_PROGRAM: &str = "./build/benchmark";

    /// Header line of the CSV report
    pub const CSV_HEADER: &str = "queue_type, queue_size, message_size, time_us";

    /// Field delimiter of the CSV report
    pub const CSV_DELIMITER: &str = ", ";
}
