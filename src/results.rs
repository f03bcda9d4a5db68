//! # Results Module
//!
//! The CSV report is the only artifact the sweep leaves behind and the only
//! input of the visualization. This module owns both ends of that contract.
//!
//! ## Report Format
//!
//! ```text
//! queue_type, queue_size, message_size, time_us
//! basic_queue, 4096, 256, 131.072000
//! ...
//! ```
//!
//! Fields are separated by exactly `", "`. The metric is written with six
//! fractional digits. Rows appear in sweep order and each one is flushed as it
//! is written, so an interrupted sweep still leaves a loadable prefix.
//!
//! ## Loading
//!
//! The loader is strict: the first line must exist but is skipped whatever it
//! contains, and every following line must name a configured queue type and
//! sizes that are part of the configured grid. Any deviation fails the whole
//! load with the offending line number.

use crate::benchmark::SampleRecord;
use crate::defaults::{CSV_DELIMITER, CSV_HEADER};
use crate::grid::{GridConfig, QueueType};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Streaming writer for the CSV report
pub struct ReportWriter<W: Write> {
    writer: W,
    rows: usize,
}

impl<W: Write> ReportWriter<W> {
    /// Create the writer and emit the header line
    pub fn new(mut writer: W) -> std::io::Result<Self> {
        writeln!(writer, "{}", CSV_HEADER)?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }

    /// Append one record and flush it
    pub fn write_record(&mut self, record: &SampleRecord) -> std::io::Result<()> {
        writeln!(self.writer, "{}", format_record(record))?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Append every record in order
    pub fn write_all(&mut self, records: &[SampleRecord]) -> std::io::Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// Number of data rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Format one record as a CSV row, without the line terminator
pub fn format_record(record: &SampleRecord) -> String {
    format!(
        "{}{d}{}{d}{}{d}{:.6}",
        record.queue_type,
        record.queue_size,
        record.message_size,
        record.metric,
        d = CSV_DELIMITER
    )
}

/// Errors raised while loading a report
///
/// Line numbers are 1-based and count the header line.
/// Input without a header line is rejected with `MissingHeader`.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("report is empty, expected a header line")]
    MissingHeader,

    #[error("line {line}: expected 4 fields separated by \", \", got {content:?}")]
    Malformed { line: usize, content: String },

    #[error("line {line}: invalid {field} {value:?}")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: unknown queue type {name:?}")]
    UnknownQueueType { line: usize, name: String },

    #[error("line {line}: queue size {value} is not part of the grid")]
    UnknownQueueSize { line: usize, value: usize },

    #[error("line {line}: message size {value} is not part of the grid")]
    UnknownMessageSize { line: usize, value: usize },
}

/// Dense 2-D matrix of metric values, indexed by (queue size index, message size index)
///
/// Cells that were never written hold zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl ResultMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![0.0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.cols + col] = value;
    }

    /// Largest value in the matrix; zero for an all-zero matrix
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Coordinates and value of the largest cell, if any cell is non-zero
    pub fn argmax(&self) -> Option<(usize, usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, &v)| (i / self.cols, i % self.cols, v))
    }
}

/// One matrix per configured queue type, in configuration order
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    series: Vec<(QueueType, ResultMatrix)>,
}

impl ResultSet {
    /// An all-zero set shaped by the grid
    pub fn empty(config: &GridConfig) -> Self {
        let series = config
            .queue_types
            .iter()
            .map(|&queue_type| {
                (
                    queue_type,
                    ResultMatrix::zeros(config.queue_sizes.len(), config.message_sizes.len()),
                )
            })
            .collect();
        Self { series }
    }

    pub fn get(&self, queue_type: QueueType) -> Option<&ResultMatrix> {
        self.series
            .iter()
            .find(|(q, _)| *q == queue_type)
            .map(|(_, matrix)| matrix)
    }

    fn get_mut(&mut self, queue_type: QueueType) -> Option<&mut ResultMatrix> {
        self.series
            .iter_mut()
            .find(|(q, _)| *q == queue_type)
            .map(|(_, matrix)| matrix)
    }

    pub fn iter(&self) -> impl Iterator<Item = (QueueType, &ResultMatrix)> {
        self.series.iter().map(|(q, matrix)| (*q, matrix))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Largest metric across every matrix
    pub fn global_max(&self) -> f64 {
        self.series
            .iter()
            .map(|(_, matrix)| matrix.max())
            .fold(0.0, f64::max)
    }

    /// Queue type holding the single highest metric
    pub fn fastest_queue_type(&self) -> Option<QueueType> {
        self.series
            .iter()
            .filter(|(_, matrix)| matrix.max() > 0.0)
            .max_by(|a, b| a.1.max().total_cmp(&b.1.max()))
            .map(|(q, _)| *q)
    }
}

/// Rebuilds result matrices from a CSV report
pub struct ResultsLoader<'a> {
    config: &'a GridConfig,
}

impl<'a> ResultsLoader<'a> {
    pub fn new(config: &'a GridConfig) -> Self {
        Self { config }
    }

    /// Load a report from a file
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<ResultSet, LoadError> {
        let path = path.as_ref();
        let io_error = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_error)?;
        let set = self.load(BufReader::new(file)).map_err(|e| match e {
            LoadError::Io { source, .. } => io_error(source),
            other => other,
        })?;

        info!("Loaded results from {}", path.display());
        Ok(set)
    }

    /// Load a report from any buffered reader
    pub fn load<R: BufRead>(&self, reader: R) -> Result<ResultSet, LoadError> {
        let mut set = ResultSet::empty(self.config);
        let mut lines = reader.lines();
        let mut rows = 0;

        let io_error = |source| LoadError::Io {
            path: PathBuf::new(),
            source,
        };
        lines.next().ok_or(LoadError::MissingHeader)?.map_err(io_error)?;

        for (offset, line) in lines.enumerate() {
            let line_no = offset + 2;
            let line = line.map_err(io_error)?;

            let record = self.parse_line(line_no, &line)?;
            let row = self
                .config
                .queue_sizes
                .index_of(record.queue_size)
                .ok_or(LoadError::UnknownQueueSize {
                    line: line_no,
                    value: record.queue_size,
                })?;
            let col = self
                .config
                .message_sizes
                .index_of(record.message_size)
                .ok_or(LoadError::UnknownMessageSize {
                    line: line_no,
                    value: record.message_size,
                })?;
            let matrix =
                set.get_mut(record.queue_type)
                    .ok_or_else(|| LoadError::UnknownQueueType {
                        line: line_no,
                        name: record.queue_type.to_string(),
                    })?;

            matrix.set(row, col, record.metric);
            rows += 1;
        }

        debug!("Parsed {} result rows", rows);
        Ok(set)
    }

    /// Parse one data line into a record
    pub fn parse_line(&self, line_no: usize, line: &str) -> Result<SampleRecord, LoadError> {
        let fields: Vec<&str> = line.trim().split(CSV_DELIMITER).collect();
        let [queue_type, queue_size, message_size, metric] = fields.as_slice() else {
            return Err(LoadError::Malformed {
                line: line_no,
                content: line.to_string(),
            });
        };

        let invalid = |field: &'static str, value: &str| LoadError::InvalidField {
            line: line_no,
            field,
            value: value.to_string(),
        };

        Ok(SampleRecord {
            queue_type: queue_type
                .parse()
                .map_err(|_| LoadError::UnknownQueueType {
                    line: line_no,
                    name: queue_type.to_string(),
                })?,
            queue_size: queue_size
                .parse()
                .map_err(|_| invalid("queue_size", queue_size))?,
            message_size: message_size
                .parse()
                .map_err(|_| invalid("message_size", message_size))?,
            metric: metric.parse().map_err(|_| invalid("time_us", metric))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    fn config() -> GridConfig {
        GridConfig::new(
            vec![QueueType::BasicQueue, QueueType::VmQueue],
            10,
            vec![4096, 8192],
            vec![256, 512, 4096],
        )
        .unwrap()
    }

    fn record(
        queue_type: QueueType,
        queue_size: usize,
        message_size: usize,
        metric: f64,
    ) -> SampleRecord {
        SampleRecord {
            queue_type,
            queue_size,
            message_size,
            metric,
        }
    }

    #[test]
    fn test_report_writer_format() {
        let mut writer = ReportWriter::new(Vec::new()).unwrap();
        writer
            .write_record(&record(QueueType::BasicQueue, 4096, 256, 128.0))
            .unwrap();
        writer
            .write_record(&record(QueueType::VmQueue, 8192, 512, 1.0 / 3.0))
            .unwrap();
        assert_eq!(writer.rows(), 2);

        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            text,
            "queue_type, queue_size, message_size, time_us\n\
             basic_queue, 4096, 256, 128.000000\n\
             vm_queue, 8192, 512, 0.333333\n"
        );
    }

    #[test]
    fn test_header_only_report_loads_as_zeros() {
        let loader_config = config();
        let set = ResultsLoader::new(&loader_config)
            .load(Cursor::new("queue_type, queue_size, message_size, time_us\n"))
            .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.global_max(), 0.0);
        assert_eq!(set.fastest_queue_type(), None);
    }

    #[test]
    fn test_empty_report_is_rejected() {
        let config = config();
        let err = ResultsLoader::new(&config)
            .load(Cursor::new(""))
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingHeader));

        let file = NamedTempFile::new().unwrap();
        let err = ResultsLoader::new(&config)
            .load_file(file.path())
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingHeader));
    }

    #[test]
    fn test_first_line_is_skipped_unconditionally() {
        let config = config();
        let text = "not, a, header, at all, really\nvm_queue, 8192, 512, 2.5\n";
        let set = ResultsLoader::new(&config).load(Cursor::new(text)).unwrap();

        let matrix = set.get(QueueType::VmQueue).unwrap();
        assert_eq!(matrix.get(1, 1), 2.5);
        assert_eq!(set.get(QueueType::BasicQueue).unwrap().max(), 0.0);
    }

    #[test]
    fn test_unknown_values_are_fatal() {
        let config = config();
        let loader = ResultsLoader::new(&config);
        let load = |row: &str| loader.load(Cursor::new(format!("{}\n{}\n", CSV_HEADER, row)));

        assert!(matches!(
            load("spsc_queue, 4096, 256, 1.0"),
            Err(LoadError::UnknownQueueType { line: 2, .. })
        ));
        assert!(matches!(
            load("basic_queue, 4000, 256, 1.0"),
            Err(LoadError::UnknownQueueSize { line: 2, value: 4000 })
        ));
        assert!(matches!(
            load("basic_queue, 4096, 300, 1.0"),
            Err(LoadError::UnknownMessageSize { line: 2, value: 300 })
        ));
        assert!(matches!(
            load("basic_queue, 4096, 256, fast"),
            Err(LoadError::InvalidField { field: "time_us", .. })
        ));
        assert!(matches!(
            load("basic_queue, 4k, 256, 1.0"),
            Err(LoadError::InvalidField { field: "queue_size", .. })
        ));
        assert!(matches!(
            load("basic_queue,4096,256,1.0"),
            Err(LoadError::Malformed { line: 2, .. })
        ));
        assert!(matches!(load(""), Err(LoadError::Malformed { .. })));
    }

    #[test]
    fn test_configured_subset_rejects_other_queue_types() {
        let config = GridConfig::new(vec![QueueType::BasicQueue], 10, vec![4096], vec![256]).unwrap();
        let text = format!("{}\nvm_queue, 4096, 256, 1.0\n", CSV_HEADER);

        let err = ResultsLoader::new(&config)
            .load(Cursor::new(text))
            .unwrap_err();
        assert!(matches!(err, LoadError::UnknownQueueType { line: 2, .. }));
    }

    #[test]
    fn test_load_file_round_trip() {
        let config = config();
        let records = vec![
            record(QueueType::BasicQueue, 4096, 256, 10.5),
            record(QueueType::BasicQueue, 8192, 4096, 20.25),
            record(QueueType::VmQueue, 8192, 512, 30.125),
        ];

        let file = NamedTempFile::new().unwrap();
        let mut writer = ReportWriter::new(file.reopen().unwrap()).unwrap();
        writer.write_all(&records).unwrap();
        drop(writer);

        let set = ResultsLoader::new(&config).load_file(file.path()).unwrap();
        assert_eq!(set.get(QueueType::BasicQueue).unwrap().get(0, 0), 10.5);
        assert_eq!(set.get(QueueType::BasicQueue).unwrap().get(1, 2), 20.25);
        assert_eq!(set.get(QueueType::VmQueue).unwrap().get(1, 1), 30.125);
        assert_eq!(set.get(QueueType::VmQueue).unwrap().get(0, 0), 0.0);
        assert_eq!(set.global_max(), 30.125);
        assert_eq!(set.fastest_queue_type(), Some(QueueType::VmQueue));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let config = config();
        let err = ResultsLoader::new(&config)
            .load_file("/nonexistent/results.csv")
            .unwrap_err();

        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/results.csv"));
    }

    #[test]
    fn test_matrix_argmax() {
        let mut matrix = ResultMatrix::zeros(2, 3);
        assert_eq!(matrix.argmax(), None);

        matrix.set(1, 2, 4.0);
        matrix.set(0, 1, 3.0);
        assert_eq!(matrix.argmax(), Some((1, 2, 4.0)));
        assert_eq!(matrix.max(), 4.0);
    }
}
