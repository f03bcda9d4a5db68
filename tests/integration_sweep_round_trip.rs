use anyhow::Result;
use queue_sweep::{
    BenchmarkError, GridConfig, QueueType, ReportWriter, ResultsLoader, SampleRecord,
    SweepError, SweepRunner,
};
use std::io::Cursor;
use tempfile::NamedTempFile;

/// Benchmark stand-in that reports an elapsed time equal to the message size,
/// so every derived metric is exactly 1.0.
fn unit_program(
    _queue_type: QueueType,
    _num_runs: usize,
    _queue_size: usize,
    message_size: usize,
) -> Result<f64, BenchmarkError> {
    Ok(message_size as f64)
}

/// Two queue types, a single 4 KiB buffer, one message that fits and one that does not.
#[test]
fn end_to_end_single_buffer_scenario() -> Result<()> {
    let config = GridConfig::new(
        vec![QueueType::BasicQueue, QueueType::VmQueue],
        10000,
        vec![4096],
        vec![256, 4096],
    )?;

    let mut report = ReportWriter::new(Vec::new())?;
    let samples = SweepRunner::new(&config, unit_program).run(|s| report.write_record(s))?;
    let csv = String::from_utf8(report.into_inner())?;

    assert_eq!(
        csv,
        "queue_type, queue_size, message_size, time_us\n\
         basic_queue, 4096, 256, 1.000000\n\
         vm_queue, 4096, 256, 1.000000\n"
    );
    assert_eq!(samples.len(), 2);

    let results = ResultsLoader::new(&config).load(Cursor::new(csv))?;
    for queue_type in [QueueType::BasicQueue, QueueType::VmQueue] {
        let matrix = results.get(queue_type).expect("matrix for every queue type");
        assert_eq!((matrix.rows(), matrix.cols()), (1, 2));
        assert_eq!(matrix.get(0, 0), 1.0);
        assert_eq!(matrix.get(0, 1), 0.0);
    }
    Ok(())
}

/// Every valid point of the default grid survives a write/load cycle and every
/// invalid point stays zero.
#[test]
fn default_grid_round_trip_through_file() -> Result<()> {
    let config = GridConfig::default();
    // Elapsed time grows with the buffer so each cell carries a distinct metric.
    let program = |_: QueueType, _: usize, queue_size: usize, message_size: usize| {
        Ok::<f64, BenchmarkError>(0.5 + (queue_size + message_size) as f64 / 8192.0)
    };

    let file = NamedTempFile::new()?;
    let mut report = ReportWriter::new(file.reopen()?)?;
    let samples = SweepRunner::new(&config, program).run(|s| report.write_record(s))?;
    drop(report);

    assert_eq!(samples.len(), config.valid_point_count());

    let results = ResultsLoader::new(&config).load_file(file.path())?;
    for sample in &samples {
        let matrix = results.get(sample.queue_type).unwrap();
        let row = config.queue_sizes.index_of(sample.queue_size).unwrap();
        let col = config.message_sizes.index_of(sample.message_size).unwrap();
        assert!((matrix.get(row, col) - sample.metric).abs() <= 1e-6);
    }

    for (_, matrix) in results.iter() {
        for (row, &queue_size) in config.queue_sizes.values().iter().enumerate() {
            for (col, &message_size) in config.message_sizes.values().iter().enumerate() {
                let value = matrix.get(row, col);
                if config.is_valid(queue_size, message_size) {
                    assert!(value.is_finite() && value > 0.0);
                } else {
                    assert_eq!(value, 0.0);
                }
            }
        }
    }
    Ok(())
}

#[test]
fn rows_follow_grid_order() -> Result<()> {
    let config = GridConfig::new(
        vec![QueueType::VmQueue, QueueType::BasicQueue],
        10,
        vec![4096, 8192, 12288],
        vec![256, 4096, 8192],
    )?;

    let mut report = ReportWriter::new(Vec::new())?;
    SweepRunner::new(&config, unit_program).run(|s| report.write_record(s))?;
    let csv = String::from_utf8(report.into_inner())?;

    let keys: Vec<(String, usize, usize)> = csv
        .lines()
        .skip(1)
        .map(|line| {
            let fields: Vec<&str> = line.split(", ").collect();
            (
                fields[0].to_string(),
                fields[1].parse().unwrap(),
                fields[2].parse().unwrap(),
            )
        })
        .collect();

    let mut expected = Vec::new();
    for queue_type in ["vm_queue", "basic_queue"] {
        expected.push((queue_type.to_string(), 4096, 256));
        expected.push((queue_type.to_string(), 8192, 256));
        expected.push((queue_type.to_string(), 8192, 4096));
        expected.push((queue_type.to_string(), 12288, 256));
        expected.push((queue_type.to_string(), 12288, 4096));
        expected.push((queue_type.to_string(), 12288, 8192));
    }
    assert_eq!(keys, expected);
    Ok(())
}

/// A failing benchmark stops the sweep; nothing later in grid order runs,
/// and what was written so far still loads.
#[test]
fn failing_point_aborts_sweep() -> Result<()> {
    let config = GridConfig::new(
        vec![QueueType::BasicQueue, QueueType::VmQueue],
        10,
        vec![4096, 8192],
        vec![256],
    )?;

    let mut seen: Vec<(QueueType, usize)> = Vec::new();
    let program = |queue_type: QueueType, _: usize, queue_size: usize, _: usize| {
        seen.push((queue_type, queue_size));
        if queue_type == QueueType::VmQueue {
            Err(BenchmarkError::ExitStatus { code: Some(1) })
        } else {
            Ok(2.0)
        }
    };

    let mut report = ReportWriter::new(Vec::new())?;
    let err = SweepRunner::new(&config, program)
        .run(|s| report.write_record(s))
        .unwrap_err();

    assert!(matches!(err, SweepError::Benchmark { .. }));
    assert_eq!(err.point().queue_type, QueueType::VmQueue);
    assert_eq!(err.point().queue_size, 4096);
    assert_eq!(
        seen,
        vec![
            (QueueType::BasicQueue, 4096),
            (QueueType::BasicQueue, 8192),
            (QueueType::VmQueue, 4096),
        ]
    );

    let csv = String::from_utf8(report.into_inner())?;
    let results = ResultsLoader::new(&config).load(Cursor::new(csv))?;
    assert_eq!(results.get(QueueType::BasicQueue).unwrap().get(1, 0), 128.0);
    assert_eq!(results.get(QueueType::VmQueue).unwrap().max(), 0.0);
    Ok(())
}

#[test]
fn metric_is_message_size_over_raw_output() -> Result<()> {
    let config = GridConfig::new(vec![QueueType::BasicQueue], 10, vec![4096], vec![256])?;
    let program = |_: QueueType, _: usize, _: usize, _: usize| Ok::<f64, BenchmarkError>(2.0);

    let samples = SweepRunner::new(&config, program).run(|_| Ok(()))?;
    assert_eq!(
        samples,
        vec![SampleRecord {
            queue_type: QueueType::BasicQueue,
            queue_size: 4096,
            message_size: 256,
            metric: 128.0,
        }]
    );
    Ok(())
}
