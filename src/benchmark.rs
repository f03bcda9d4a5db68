//! # Benchmark Execution Module
//!
//! This module runs the external benchmark program across the parameter grid
//! and turns each run's output into a throughput sample.
//!
//! ## Key Components
//!
//! - **BenchmarkProgram**: The capability boundary around the external executable.
//!   One call per grid point, one raw measurement back.
//! - **ExternalBenchmark**: Subprocess-backed implementation of that boundary
//! - **SweepRunner**: Walks the valid grid points and collects `SampleRecord`s
//! - **SampleRecord**: One `(queue type, queue size, message size, metric)` row
//!
//! ## Invocation Contract
//!
//! The benchmark program receives four positional arguments: queue type,
//! repetition count, queue size in bytes and message size in bytes. It prints
//! the average elapsed time per message (in microseconds) on standard output
//! and exits with status zero.
//!
//! ## Failure Policy
//!
//! The sweep is fail-fast. A program that cannot be launched, exits non-zero,
//! or prints something other than one non-zero finite number aborts the whole
//! sweep at that grid point. Nothing is retried and nothing after the failing
//! point is run.
//!
//! ## Concurrency
//!
//! Grid points are run strictly one after another with the parent blocked on
//! each child. Benchmarks need an uncontended machine, and a single ordered
//! stream of rows is what the report format expects. No timeout is applied to
//! the child.

use crate::grid::{GridConfig, GridPoint, QueueType};
use crate::utils::{create_progress_indicator, format_duration};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Reasons a single benchmark invocation can fail
#[derive(Debug, Error)]
pub enum BenchmarkError {
    /// The program could not be started at all (missing, not executable, ...)
    #[error("failed to launch benchmark program '{}': {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but did not exit successfully
    #[error("benchmark program {}", describe_exit(*code))]
    ExitStatus { code: Option<i32> },

    /// Standard output was not a single floating-point number
    #[error("benchmark output {output:?} is not a number")]
    UnparseableOutput { output: String },

    /// A number was printed but no metric can be derived from it
    #[error("benchmark reported {value}, expected a non-zero finite elapsed time")]
    InvalidMeasurement { value: f64 },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

/// Errors that abort a sweep
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("benchmark failed for {point}: {source}")]
    Benchmark {
        point: GridPoint,
        #[source]
        source: BenchmarkError,
    },

    #[error("failed to write sample for {point}: {source}")]
    Report {
        point: GridPoint,
        #[source]
        source: std::io::Error,
    },
}

impl SweepError {
    /// The grid point the sweep stopped at
    pub fn point(&self) -> GridPoint {
        match self {
            SweepError::Benchmark { point, .. } | SweepError::Report { point, .. } => *point,
        }
    }
}

/// Capability boundary around the benchmark executable
///
/// The sweep only needs "arguments in, one number out". Keeping that behind a
/// trait lets the runner be exercised with an in-process fake.
pub trait BenchmarkProgram {
    /// Run one measurement and return the raw value the program reported
    fn run(
        &mut self,
        queue_type: QueueType,
        num_runs: usize,
        queue_size: usize,
        message_size: usize,
    ) -> Result<f64, BenchmarkError>;
}

impl<F> BenchmarkProgram for F
where
    F: FnMut(QueueType, usize, usize, usize) -> Result<f64, BenchmarkError>,
{
    fn run(
        &mut self,
        queue_type: QueueType,
        num_runs: usize,
        queue_size: usize,
        message_size: usize,
    ) -> Result<f64, BenchmarkError> {
        self(queue_type, num_runs, queue_size, message_size)
    }
}

/// Benchmark program launched as a child process for every grid point
#[derive(Debug, Clone)]
pub struct ExternalBenchmark {
    program: PathBuf,
}

impl ExternalBenchmark {
    pub fn new<P: AsRef<Path>>(program: P) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl BenchmarkProgram for ExternalBenchmark {
    fn run(
        &mut self,
        queue_type: QueueType,
        num_runs: usize,
        queue_size: usize,
        message_size: usize,
    ) -> Result<f64, BenchmarkError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(queue_type.as_str())
            .arg(num_runs.to_string())
            .arg(queue_size.to_string())
            .arg(message_size.to_string());

        // The program's own diagnostics go straight to the user; stdout is
        // the measurement channel.
        cmd.stdin(Stdio::null());
        cmd.stderr(Stdio::inherit());

        debug!("Spawning benchmark: {:?}", cmd);
        let output = cmd.output().map_err(|source| BenchmarkError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(BenchmarkError::ExitStatus {
                code: output.status.code(),
            });
        }

        parse_raw_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse the benchmark's standard output as one floating-point number
///
/// Surrounding whitespace, including the trailing newline, is ignored.
pub fn parse_raw_output(output: &str) -> Result<f64, BenchmarkError> {
    output
        .trim()
        .parse::<f64>()
        .map_err(|_| BenchmarkError::UnparseableOutput {
            output: output.to_string(),
        })
}

/// Derive the throughput metric for one grid point
///
/// `raw_output` is the average time per message reported by the benchmark,
/// so the metric is bytes per unit of that time.
pub fn derive_metric(message_size: usize, raw_output: f64) -> Result<f64, BenchmarkError> {
    if !raw_output.is_finite() || raw_output == 0.0 {
        return Err(BenchmarkError::InvalidMeasurement { value: raw_output });
    }
    Ok(message_size as f64 / raw_output)
}

/// One measured grid point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRecord {
    pub queue_type: QueueType,
    pub queue_size: usize,
    pub message_size: usize,
    pub metric: f64,
}

impl SampleRecord {
    pub fn point(&self) -> GridPoint {
        GridPoint {
            queue_type: self.queue_type,
            queue_size: self.queue_size,
            message_size: self.message_size,
        }
    }
}

/// Drives a benchmark program across every valid grid point
pub struct SweepRunner<'a, B> {
    config: &'a GridConfig,
    program: B,
}

impl<'a, B: BenchmarkProgram> SweepRunner<'a, B> {
    pub fn new(config: &'a GridConfig, program: B) -> Self {
        Self { config, program }
    }

    /// Measure a single grid point
    pub fn measure(&mut self, point: GridPoint) -> Result<SampleRecord, BenchmarkError> {
        let raw = self.program.run(
            point.queue_type,
            self.config.num_runs,
            point.queue_size,
            point.message_size,
        )?;
        let metric = derive_metric(point.message_size, raw)?;

        Ok(SampleRecord {
            queue_type: point.queue_type,
            queue_size: point.queue_size,
            message_size: point.message_size,
            metric,
        })
    }

    /// Run the full sweep.
    ///
    /// `on_sample` is called with each record as soon as it is measured, in
    /// grid order, so output can be streamed while the sweep is still running.
    /// The first failure stops the sweep; records gathered before it have
    /// already been passed to `on_sample`.
    pub fn run<F>(&mut self, mut on_sample: F) -> Result<Vec<SampleRecord>, SweepError>
    where
        F: FnMut(&SampleRecord) -> std::io::Result<()>,
    {
        let total = self.config.valid_point_count();
        let start = Instant::now();
        let mut samples = Vec::with_capacity(total);

        info!(
            "Sweeping {} grid points ({} queue types, {} runs each)",
            total,
            self.config.queue_types.len(),
            self.config.num_runs
        );

        let config = self.config;
        for point in config.points() {
            let sample = self
                .measure(point)
                .map_err(|source| SweepError::Benchmark { point, source })?;

            on_sample(&sample).map_err(|source| SweepError::Report { point, source })?;
            samples.push(sample);

            debug!(
                "{} {}/{} {} -> {:.3}",
                create_progress_indicator(samples.len(), total, 20),
                samples.len(),
                total,
                point,
                sample.metric
            );
        }

        info!(
            "Sweep finished: {} samples in {}",
            samples.len(),
            format_duration(start.elapsed())
        );
        Ok(samples)
    }
}
