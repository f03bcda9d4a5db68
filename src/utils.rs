//! # Utility Functions
//!
//! Small formatting helpers shared by the sweep and the plot binaries.
//!
//! ## Key Functionality Categories
//!
//! - **Formatting**: Human-readable durations and throughput values
//! - **Display Helpers**: Progress indicator for sweep logging
//! - **Markup**: Escaping text for SVG output
//!
//! ## Usage Examples
//!
//! ```rust
//! use queue_sweep::utils::*;
//! use std::time::Duration;
//!
//! let duration_str = format_duration(Duration::from_micros(1500));
//! assert_eq!(duration_str, "1.50ms");
//!
//! let rate_str = format_mib_per_s(1536.0);
//! assert_eq!(rate_str, "1.50 GiB/s");
//! ```

use std::time::Duration;

/// Format a duration in a human-readable way
///
/// Converts a Duration to a human-readable string, automatically selecting
/// the most appropriate unit based on the magnitude.
///
/// ## Unit Selection Logic
///
/// - **Nanoseconds**: < 1,000 ns (e.g., "500ns")
/// - **Microseconds**: < 1,000,000 ns (e.g., "1.50μs")
/// - **Milliseconds**: < 1,000,000,000 ns (e.g., "25.75ms")
/// - **Seconds**: < 60 seconds (e.g., "5.25s")
/// - **Minutes and Hours**: For longer durations (e.g., "5m 30s", "2h 15m 30s")
///
/// A full default sweep runs for minutes to hours, so the compound format is
/// what usually ends up in the completion log line.
///
/// ## Examples
///
/// ```rust
/// # use queue_sweep::utils::format_duration;
/// # use std::time::Duration;
/// assert_eq!(format_duration(Duration::from_nanos(750)), "750ns");
/// assert_eq!(format_duration(Duration::from_nanos(1250)), "1.25μs");
/// assert_eq!(format_duration(Duration::from_micros(2500)), "2.50ms");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ns = duration.as_nanos();

    if total_ns < 1_000 {
        format!("{}ns", total_ns)
    } else if total_ns < 1_000_000 {
        format!("{:.2}μs", total_ns as f64 / 1_000.0)
    } else if total_ns < 1_000_000_000 {
        format!("{:.2}ms", total_ns as f64 / 1_000_000.0)
    } else if total_ns < 60_000_000_000 {
        format!("{:.2}s", total_ns as f64 / 1_000_000_000.0)
    } else {
        let seconds = duration.as_secs();
        let minutes = seconds / 60;
        let remaining_seconds = seconds % 60;

        if minutes < 60 {
            format!("{}m {}s", minutes, remaining_seconds)
        } else {
            let hours = minutes / 60;
            let remaining_minutes = minutes % 60;
            format!("{}h {}m {}s", hours, remaining_minutes, remaining_seconds)
        }
    }
}

/// Format a throughput given in MiB/s, switching to GiB/s above 1024
///
/// ```rust
/// # use queue_sweep::utils::format_mib_per_s;
/// assert_eq!(format_mib_per_s(512.0), "512.00 MiB/s");
/// assert_eq!(format_mib_per_s(2048.0), "2.00 GiB/s");
/// ```
pub fn format_mib_per_s(mib_per_s: f64) -> String {
    if mib_per_s < 1024.0 {
        format!("{:.2} MiB/s", mib_per_s)
    } else {
        format!("{:.2} GiB/s", mib_per_s / 1024.0)
    }
}

/// Compact tick label: integers without a fractional part, otherwise up to
/// two decimals with trailing zeros removed.
pub fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Create a progress indicator string
///
/// Generates a visual progress bar using Unicode block characters, used in the
/// per-point sweep log lines.
///
/// ## Examples
///
/// ```rust
/// # use queue_sweep::utils::create_progress_indicator;
/// assert_eq!(create_progress_indicator(0, 100, 10), "░░░░░░░░░░");
/// assert_eq!(create_progress_indicator(50, 100, 10), "█████░░░░░");
/// assert_eq!(create_progress_indicator(100, 100, 10), "██████████");
/// ```
pub fn create_progress_indicator(current: usize, total: usize, width: usize) -> String {
    if total == 0 {
        return "░".repeat(width);
    }

    let progress = (current as f64 / total as f64).min(1.0);
    let filled = (progress * width as f64) as usize;
    let empty = width - filled;

    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Escape text for inclusion in SVG/XML content or attribute values
pub fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
