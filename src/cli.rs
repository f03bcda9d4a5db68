use clap::Parser;
use std::path::PathBuf;

/// Queue Sweep - run the queue benchmark over the buffer size / message size grid
///
/// Writes one CSV row per valid grid point to standard output.
#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
pub struct SweepArgs {
    /// Benchmark executable to invoke for each grid point
    #[clap(short = 'b', long, default_value = crate::defaults::BENCHMARK_PROGRAM)]
    pub benchmark: PathBuf,

    /// Verbose output (per grid point progress on stderr)
    #[clap(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

/// Queue Plot - render throughput heatmaps from a sweep's CSV output
#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
pub struct PlotArgs {
    /// CSV file produced by queue-sweep
    pub csv_file: PathBuf,

    /// Return immediately instead of waiting for Enter after drawing
    #[clap(long, default_value_t = false)]
    pub no_wait: bool,

    /// Verbose output
    #[clap(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

impl PlotArgs {
    /// SVG figure path: the CSV path with an `.svg` extension
    pub fn svg_path(&self) -> PathBuf {
        self.csv_file.with_extension("svg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_args_defaults() {
        let args = SweepArgs::try_parse_from(["queue-sweep"]).unwrap();
        assert_eq!(args.benchmark, PathBuf::from("./build/benchmark"));
        assert!(!args.verbose);

        let args = SweepArgs::try_parse_from(["queue-sweep", "-b", "/opt/bench", "-v"]).unwrap();
        assert_eq!(args.benchmark, PathBuf::from("/opt/bench"));
        assert!(args.verbose);
    }

    #[test]
    fn test_sweep_args_reject_positional() {
        assert!(SweepArgs::try_parse_from(["queue-sweep", "results.csv"]).is_err());
    }

    #[test]
    fn test_plot_args() {
        let args = PlotArgs::try_parse_from(["queue-plot", "out/stats.csv"]).unwrap();
        assert_eq!(args.csv_file, PathBuf::from("out/stats.csv"));
        assert_eq!(args.svg_path(), PathBuf::from("out/stats.svg"));
        assert!(!args.no_wait);

        let args = PlotArgs::try_parse_from(["queue-plot", "stats", "--no-wait"]).unwrap();
        assert_eq!(args.svg_path(), PathBuf::from("stats.svg"));
        assert!(args.no_wait);

        assert!(PlotArgs::try_parse_from(["queue-plot"]).is_err());
    }

    #[test]
    fn test_plot_args_reject_output_overrides() {
        assert!(PlotArgs::try_parse_from(["queue-plot", "stats.csv", "--svg", "fig.svg"]).is_err());
        assert!(PlotArgs::try_parse_from(["queue-plot", "a.csv", "b.csv"]).is_err());
    }
}
