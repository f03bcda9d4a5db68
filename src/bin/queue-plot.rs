//! # Queue Plot - Visualization Driver
//!
//! Loads a CSV report written by `queue-sweep` and shows one throughput
//! heatmap per queue type, all on a shared color scale. The figure is drawn
//! in the terminal and saved as SVG.

use anyhow::{Context, Result};
use clap::Parser;
use queue_sweep::{
    cli::PlotArgs,
    heatmap::{to_kib, to_mib_per_s},
    logging,
    utils::format_mib_per_s,
    GridConfig, Heatmap, ResultsLoader,
};
use std::io::{BufRead, IsTerminal, Write};
use tracing::info;

fn main() -> Result<()> {
    let args = PlotArgs::parse();
    logging::init(args.verbose);

    let config = GridConfig::default();

    // Nothing is drawn unless the whole report loads.
    let results = ResultsLoader::new(&config)
        .load_file(&args.csv_file)
        .with_context(|| format!("Failed to load {}", args.csv_file.display()))?;

    for (queue_type, matrix) in results.iter() {
        match matrix.argmax() {
            Some((row, col, metric)) => info!(
                "{}: peak {} at {} KiB buffer, {} B messages",
                queue_type,
                format_mib_per_s(to_mib_per_s(metric)),
                to_kib(config.queue_sizes.value_at(row).unwrap_or_default()),
                config.message_sizes.value_at(col).unwrap_or_default()
            ),
            None => info!("{}: no samples", queue_type),
        }
    }
    if let Some(fastest) = results.fastest_queue_type() {
        info!("Highest throughput: {}", fastest);
    }

    let heatmap = Heatmap::new(&config, &results);
    info!("Color scale: 0 to {:.6}", heatmap.scale().vmax());

    let svg_path = args.svg_path();
    heatmap
        .write_svg(&svg_path)
        .with_context(|| format!("Failed to write {}", svg_path.display()))?;
    info!("Figure written to {}", svg_path.display());

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(heatmap.render_terminal().as_bytes())?;
    stdout.flush()?;
    drop(stdout);

    let stdin = std::io::stdin();
    if !args.no_wait && stdin.is_terminal() {
        eprint!("Press Enter to close...");
        let mut line = String::new();
        stdin.lock().read_line(&mut line)?;
    }

    Ok(())
}
