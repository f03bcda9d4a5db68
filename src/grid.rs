//! # Parameter Grid Module
//!
//! Defines the benchmark parameter space: which queue implementations are
//! swept, over which buffer capacities and which message sizes.
//!
//! ## Key Components
//!
//! - **QueueType**: The queue implementations understood by the benchmark program
//! - **AxisIndex**: Dense, bidirectional index over one ascending size sequence
//! - **GridConfig**: The one configuration value shared by the sweep and the plot
//! - **GridPoint**: A single (queue type, queue size, message size) combination
//!
//! ## Validity
//!
//! A message can only be benchmarked if it fits in the buffer together with
//! the per-message bookkeeping the queue stores next to it. Points where
//! `message_size > queue_size - overhead` are never produced by
//! [`GridConfig::points`].

use anyhow::{bail, ensure, Result};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Queue implementations accepted by the benchmark program
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueueType {
    /// Ring buffer that copies around the wrap point
    BasicQueue,
    /// Ring buffer mapped twice into virtual memory
    VmQueue,
}

impl QueueType {
    /// Every known queue type, in declaration order
    pub const ALL: [QueueType; 2] = [QueueType::BasicQueue, QueueType::VmQueue];

    /// Identifier passed to the benchmark program and written to the CSV
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueType::BasicQueue => "basic_queue",
            QueueType::VmQueue => "vm_queue",
        }
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueueType::ALL
            .iter()
            .copied()
            .find(|queue_type| queue_type.as_str() == s)
            .ok_or_else(|| format!("unknown queue type '{}'", s))
    }
}

/// Bidirectional mapping between the values of a size sequence and their
/// position in it.
///
/// Both the writer and the reader of a result matrix resolve coordinates
/// through the same `AxisIndex`, so a value always lands in the same cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AxisIndex {
    values: Vec<usize>,
    positions: HashMap<usize, usize>,
}

impl AxisIndex {
    /// Build an index over a strictly ascending sequence of positive values
    pub fn new(values: Vec<usize>) -> Result<Self> {
        ensure!(!values.is_empty(), "size sequence cannot be empty");
        ensure!(values[0] > 0, "sizes must be positive");
        if let Some(pair) = values.windows(2).find(|pair| pair[0] >= pair[1]) {
            bail!(
                "size sequence must be strictly ascending ({} is followed by {})",
                pair[0],
                pair[1]
            );
        }

        Ok(Self::from_ascending(values))
    }

    fn from_ascending(values: Vec<usize>) -> Self {
        let positions = values
            .iter()
            .enumerate()
            .map(|(index, &value)| (value, index))
            .collect();

        Self { values, positions }
    }

    /// `unit * 1`, `unit * 2`, ..., `unit * count`
    pub fn multiples(unit: usize, count: usize) -> Result<Self> {
        Self::new((1..=count).map(|k| k * unit).collect())
    }

    pub fn index_of(&self, value: usize) -> Option<usize> {
        self.positions.get(&value).copied()
    }

    pub fn value_at(&self, index: usize) -> Option<usize> {
        self.values.get(index).copied()
    }

    pub fn values(&self) -> &[usize] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> usize {
        self.values[0]
    }

    pub fn last(&self) -> usize {
        self.values[self.values.len() - 1]
    }
}

/// One combination considered for benchmarking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridPoint {
    pub queue_type: QueueType,
    pub queue_size: usize,
    pub message_size: usize,
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (queue_size={}, message_size={})",
            self.queue_type, self.queue_size, self.message_size
        )
    }
}

/// Grid definition shared by the sweep and the visualization
///
/// Construct it once and hand the same value to every component; the loader
/// rejects rows the sweep could not have produced under this configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridConfig {
    pub queue_types: Vec<QueueType>,
    pub num_runs: usize,
    pub queue_sizes: AxisIndex,
    pub message_sizes: AxisIndex,
    pub overhead: usize,
}

impl GridConfig {
    /// Create a validated configuration with the default message overhead
    pub fn new(
        queue_types: Vec<QueueType>,
        num_runs: usize,
        queue_sizes: Vec<usize>,
        message_sizes: Vec<usize>,
    ) -> Result<Self> {
        ensure!(!queue_types.is_empty(), "at least one queue type is required");
        ensure!(num_runs > 0, "repetition count must be positive");
        for (i, queue_type) in queue_types.iter().enumerate() {
            ensure!(
                !queue_types[..i].contains(queue_type),
                "queue type '{}' listed twice",
                queue_type
            );
        }

        Ok(Self {
            queue_types,
            num_runs,
            queue_sizes: AxisIndex::new(queue_sizes)?,
            message_sizes: AxisIndex::new(message_sizes)?,
            overhead: crate::defaults::MESSAGE_OVERHEAD,
        })
    }

    /// Whether a message of `message_size` bytes fits in a `queue_size` buffer
    pub fn is_valid(&self, queue_size: usize, message_size: usize) -> bool {
        message_size + self.overhead <= queue_size
    }

    /// Lazily enumerate every valid grid point.
    ///
    /// Order: queue type as configured, then queue size ascending, then
    /// message size ascending.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        self.queue_types.iter().flat_map(move |&queue_type| {
            self.queue_sizes
                .values()
                .iter()
                .flat_map(move |&queue_size| {
                    self.message_sizes
                        .values()
                        .iter()
                        .filter(move |&&message_size| self.is_valid(queue_size, message_size))
                        .map(move |&message_size| GridPoint {
                            queue_type,
                            queue_size,
                            message_size,
                        })
                })
        })
    }

    /// Number of points [`points`](Self::points) yields
    pub fn valid_point_count(&self) -> usize {
        let per_type: usize = self
            .queue_sizes
            .values()
            .iter()
            .map(|&q| {
                self.message_sizes
                    .values()
                    .iter()
                    .filter(|&&m| self.is_valid(q, m))
                    .count()
            })
            .sum();
        per_type * self.queue_types.len()
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        use crate::defaults::*;

        Self {
            queue_types: QUEUE_TYPES.to_vec(),
            num_runs: NUM_RUNS,
            queue_sizes: AxisIndex::from_ascending(
                (1..=QUEUE_SIZE_COUNT).map(|k| k * QUEUE_SIZE_UNIT).collect(),
            ),
            message_sizes: AxisIndex::from_ascending(
                (1..=MESSAGE_SIZE_COUNT).map(|k| k * MESSAGE_SIZE_UNIT).collect(),
            ),
            overhead: MESSAGE_OVERHEAD,
        }
    }
}
