//! # Heatmap Rendering Module
//!
//! Turns a loaded [`ResultSet`] into a side-by-side comparison of queue
//! implementations: one panel per queue type, each a color-mapped grid over
//! (buffer size, message size), all sharing a single color scale and a single
//! color bar.
//!
//! ## Units
//!
//! - Buffer sizes are shown in KiB (`bytes / 1024`).
//! - Metric values are bytes per microsecond; they are shown as MiB/s
//!   (`metric * 1e6 / 1024 / 1024`).
//!
//! ## Outputs
//!
//! - [`Heatmap::render_svg`]: a standalone SVG figure with axis ticks at every
//!   grid value and axis limits at the first and last grid values.
//! - [`Heatmap::render_terminal`]: the same panels drawn with truecolor block
//!   characters. Cell glyphs also encode the shade, so the picture is still
//!   readable when colors are disabled.
//!
//! The color map is viridis with the lower bound fixed at zero and the upper
//! bound at the largest metric of any queue type. The bound is the raw metric
//! while cells are compared after conversion to MiB/s.

use crate::grid::{GridConfig, QueueType};
use crate::results::{ResultMatrix, ResultSet};
use crate::utils::{format_tick, xml_escape};
use colored::Colorize;
use std::path::Path;

pub const X_LABEL: &str = "Buffer Size (KiB)";
pub const Y_LABEL: &str = "Message Size (B)";
pub const COLORBAR_TITLE: &str = "Throughput (MiB/s)";

const PLOT_WIDTH: f64 = 420.0;
const PLOT_HEIGHT: f64 = 360.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 70.0;
const PANEL_GAP: f64 = 90.0;
const COLORBAR_WIDTH: f64 = 24.0;
const COLORBAR_AREA: f64 = 130.0;
const COLORBAR_STEPS: usize = 64;
const COLORBAR_TICKS: usize = 5;

/// Convert a metric in bytes per microsecond to MiB/s
pub fn to_mib_per_s(metric: f64) -> f64 {
    metric * 1e6 / 1024.0 / 1024.0
}

/// Convert a byte count to KiB
pub fn to_kib(bytes: usize) -> f64 {
    bytes as f64 / 1024.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

// Evenly spaced samples of matplotlib's viridis.
const VIRIDIS: [Rgb; 9] = [
    Rgb(0x44, 0x01, 0x54),
    Rgb(0x47, 0x2d, 0x7b),
    Rgb(0x3b, 0x52, 0x8b),
    Rgb(0x2c, 0x72, 0x8e),
    Rgb(0x21, 0x91, 0x8c),
    Rgb(0x28, 0xae, 0x80),
    Rgb(0x5e, 0xc9, 0x62),
    Rgb(0xad, 0xdc, 0x30),
    Rgb(0xfd, 0xe7, 0x25),
];

/// Viridis color for `t` in `[0, 1]` (values outside are clamped)
pub fn viridis(t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - lower as f64;

    let (a, b) = (VIRIDIS[lower], VIRIDIS[lower + 1]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
    Rgb(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Linear mapping from throughput to color, shared by every panel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorScale {
    vmin: f64,
    vmax: f64,
}

impl ColorScale {
    /// Scale from zero to `vmax`
    pub fn new(vmax: f64) -> Self {
        Self { vmin: 0.0, vmax }
    }

    pub fn vmin(&self) -> f64 {
        self.vmin
    }

    pub fn vmax(&self) -> f64 {
        self.vmax
    }

    /// Position of `value` within the scale, clamped to `[0, 1]`
    pub fn normalize(&self, value: f64) -> f64 {
        if self.vmax <= self.vmin {
            return 0.0;
        }
        ((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0)
    }

    pub fn color(&self, value: f64) -> Rgb {
        viridis(self.normalize(value))
    }

    /// `count + 1` evenly spaced values from `vmin` to `vmax`
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let count = count.max(1);
        (0..=count)
            .map(|i| self.vmin + (self.vmax - self.vmin) * i as f64 / count as f64)
            .collect()
    }
}

/// Cell extents along one axis as fractions of the axis length.
///
/// Each value owns the span halfway to its neighbours; the outer cells are
/// cut at the first and last value, which are the axis limits.
fn cell_spans(values: &[f64]) -> Vec<(f64, f64)> {
    if values.len() < 2 {
        return vec![(0.0, 1.0); values.len()];
    }

    let lo = values[0];
    let span = values[values.len() - 1] - lo;
    let frac = |v: f64| (v - lo) / span;

    (0..values.len())
        .map(|i| {
            let start = if i == 0 {
                lo
            } else {
                (values[i - 1] + values[i]) / 2.0
            };
            let end = if i + 1 == values.len() {
                values[i]
            } else {
                (values[i] + values[i + 1]) / 2.0
            };
            (frac(start), frac(end))
        })
        .collect()
}

/// Tick positions along one axis as fractions of the axis length
fn tick_fractions(values: &[f64]) -> Vec<f64> {
    match values {
        [] => Vec::new(),
        [_] => vec![0.5],
        [first, .., last] => values
            .iter()
            .map(|v| (v - first) / (last - first))
            .collect(),
    }
}

/// Multi-panel throughput heatmap
pub struct Heatmap<'a> {
    config: &'a GridConfig,
    results: &'a ResultSet,
    scale: ColorScale,
}

impl<'a> Heatmap<'a> {
    /// Prepare a figure; the color scale spans zero to the global maximum metric
    pub fn new(config: &'a GridConfig, results: &'a ResultSet) -> Self {
        let scale = ColorScale::new(results.global_max());
        Self {
            config,
            results,
            scale,
        }
    }

    pub fn scale(&self) -> ColorScale {
        self.scale
    }

    /// Queue types in the order their panels are drawn
    pub fn panels(&self) -> Vec<QueueType> {
        self.results.iter().map(|(queue_type, _)| queue_type).collect()
    }

    fn x_values(&self) -> Vec<f64> {
        self.config
            .queue_sizes
            .values()
            .iter()
            .map(|&q| to_kib(q))
            .collect()
    }

    fn y_values(&self) -> Vec<f64> {
        self.config
            .message_sizes
            .values()
            .iter()
            .map(|&m| m as f64)
            .collect()
    }

    /// Render the whole figure as an SVG document
    pub fn render_svg(&self) -> String {
        let panel_count = self.results.len().max(1) as f64;
        let width = MARGIN_LEFT
            + panel_count * PLOT_WIDTH
            + (panel_count - 1.0) * PANEL_GAP
            + COLORBAR_AREA;
        let height = MARGIN_TOP + PLOT_HEIGHT + MARGIN_BOTTOM;

        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\">",
            w = width,
            h = height
        ));
        svg.push_str(&format!(
            "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"#ffffff\"/>",
            width, height
        ));

        for (index, (queue_type, matrix)) in self.results.iter().enumerate() {
            let left = MARGIN_LEFT + index as f64 * (PLOT_WIDTH + PANEL_GAP);
            self.svg_panel(&mut svg, left, queue_type, matrix);
        }

        let bar_left = width - COLORBAR_AREA + 40.0;
        self.svg_colorbar(&mut svg, bar_left);

        svg.push_str("</svg>");
        svg
    }

    fn svg_panel(&self, svg: &mut String, left: f64, queue_type: QueueType, matrix: &ResultMatrix) {
        let top = MARGIN_TOP;
        let bottom = top + PLOT_HEIGHT;
        let x_values = self.x_values();
        let y_values = self.y_values();

        svg.push_str(&format!(
            "<g class=\"panel\" data-queue-type=\"{}\">",
            xml_escape(queue_type.as_str())
        ));

        for (row, &(x0, x1)) in cell_spans(&x_values).iter().enumerate() {
            for (col, &(y0, y1)) in cell_spans(&y_values).iter().enumerate() {
                let value = to_mib_per_s(matrix.get(row, col));
                svg.push_str(&format!(
                    "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"><title>{:.2}</title></rect>",
                    left + x0 * PLOT_WIDTH,
                    bottom - y1 * PLOT_HEIGHT,
                    (x1 - x0) * PLOT_WIDTH,
                    (y1 - y0) * PLOT_HEIGHT,
                    self.scale.color(value).hex(),
                    value
                ));
            }
        }

        svg.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"#000000\"/>",
            left, top, PLOT_WIDTH, PLOT_HEIGHT
        ));

        for (fraction, value) in tick_fractions(&x_values).iter().zip(&x_values) {
            let x = left + fraction * PLOT_WIDTH;
            svg.push_str(&format!(
                "<line class=\"xtick\" x1=\"{x:.2}\" y1=\"{b}\" x2=\"{x:.2}\" y2=\"{e}\" stroke=\"#000000\"/>\
                 <text x=\"{x:.2}\" y=\"{t}\" font-size=\"10\" text-anchor=\"middle\">{l}</text>",
                x = x,
                b = bottom,
                e = bottom + 4.0,
                t = bottom + 16.0,
                l = format_tick(*value)
            ));
        }

        for (fraction, value) in tick_fractions(&y_values).iter().zip(&y_values) {
            let y = bottom - fraction * PLOT_HEIGHT;
            svg.push_str(&format!(
                "<line class=\"ytick\" x1=\"{s}\" y1=\"{y:.2}\" x2=\"{l}\" y2=\"{y:.2}\" stroke=\"#000000\"/>\
                 <text x=\"{t}\" y=\"{ty:.2}\" font-size=\"8\" text-anchor=\"end\">{v}</text>",
                s = left - 4.0,
                l = left,
                y = y,
                t = left - 6.0,
                ty = y + 3.0,
                v = format_tick(*value)
            ));
        }

        let center_x = left + PLOT_WIDTH / 2.0;
        svg.push_str(&format!(
            "<text x=\"{cx}\" y=\"{ty}\" font-size=\"14\" text-anchor=\"middle\">{title}</text>\
             <text x=\"{cx}\" y=\"{xy}\" font-size=\"12\" text-anchor=\"middle\">{xl}</text>\
             <text x=\"{yx}\" y=\"{cy}\" font-size=\"12\" text-anchor=\"middle\" transform=\"rotate(-90 {yx} {cy})\">{yl}</text>",
            cx = center_x,
            ty = top - 16.0,
            title = xml_escape(queue_type.as_str()),
            xy = bottom + 40.0,
            xl = X_LABEL,
            yx = left - 52.0,
            cy = top + PLOT_HEIGHT / 2.0,
            yl = Y_LABEL
        ));

        svg.push_str("</g>");
    }

    fn svg_colorbar(&self, svg: &mut String, left: f64) {
        let top = MARGIN_TOP;
        let step = PLOT_HEIGHT / COLORBAR_STEPS as f64;

        svg.push_str("<g class=\"colorbar\">");
        for i in 0..COLORBAR_STEPS {
            let t = (i as f64 + 0.5) / COLORBAR_STEPS as f64;
            svg.push_str(&format!(
                "<rect x=\"{}\" y=\"{:.2}\" width=\"{}\" height=\"{:.2}\" fill=\"{}\"/>",
                left,
                top + PLOT_HEIGHT - (i + 1) as f64 * step,
                COLORBAR_WIDTH,
                step + 0.5,
                viridis(t).hex()
            ));
        }
        svg.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"#000000\"/>",
            left, top, COLORBAR_WIDTH, PLOT_HEIGHT
        ));

        for (i, value) in self.scale.ticks(COLORBAR_TICKS).iter().enumerate() {
            let y = top + PLOT_HEIGHT - PLOT_HEIGHT * i as f64 / COLORBAR_TICKS as f64;
            svg.push_str(&format!(
                "<text x=\"{}\" y=\"{:.2}\" font-size=\"10\">{}</text>",
                left + COLORBAR_WIDTH + 6.0,
                y + 3.0,
                format_tick((value * 100.0).round() / 100.0)
            ));
        }
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"12\" text-anchor=\"middle\">{}</text>",
            left + COLORBAR_WIDTH / 2.0,
            top - 16.0,
            COLORBAR_TITLE
        ));
        svg.push_str("</g>");
    }

    /// Write the SVG figure to `path`
    pub fn write_svg<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.render_svg())
    }

    /// Render all panels side by side for a terminal, followed by one legend line
    pub fn render_terminal(&self) -> String {
        let panels: Vec<(usize, Vec<String>)> = self
            .results
            .iter()
            .map(|(queue_type, matrix)| self.terminal_panel(queue_type, matrix))
            .collect();

        let height = panels.iter().map(|(_, lines)| lines.len()).max().unwrap_or(0);
        let mut out = String::new();
        for line in 0..height {
            let mut row = String::new();
            for (index, (width, lines)) in panels.iter().enumerate() {
                if index > 0 {
                    row.push_str("    ");
                }
                match lines.get(line) {
                    Some(text) => row.push_str(text),
                    None => row.push_str(&" ".repeat(*width)),
                }
            }
            out.push_str(row.trim_end());
            out.push('\n');
        }

        out.push('\n');
        out.push_str(&self.terminal_legend());
        out.push('\n');
        out
    }

    /// Lines of one panel and their visible width
    fn terminal_panel(&self, queue_type: QueueType, matrix: &ResultMatrix) -> (usize, Vec<String>) {
        let x_values = self.x_values();
        let y_values = self.y_values();
        let label_width = y_values
            .iter()
            .map(|v| format_tick(*v).chars().count())
            .max()
            .unwrap_or(0);
        let grid_width = 2 * x_values.len();
        let width = label_width + 2 + grid_width;

        let mut lines = Vec::new();
        lines.push(format!("{:^w$}", queue_type.as_str(), w = width).bold().to_string());

        for (col, value) in y_values.iter().enumerate().rev() {
            let mut line = format!("{:>w$} │", format_tick(*value), w = label_width);
            for row in 0..x_values.len() {
                let throughput = to_mib_per_s(matrix.get(row, col));
                line.push_str(&self.terminal_cell(throughput));
            }
            lines.push(line);
        }

        lines.push(format!(
            "{} └{}",
            " ".repeat(label_width),
            "─".repeat(grid_width)
        ));

        // Tick labels are placed under their column when there is room.
        let mut ticks = vec![' '; grid_width];
        let mut free_from = 0;
        for (index, value) in x_values.iter().enumerate() {
            let label: Vec<char> = format_tick(*value).chars().collect();
            let start = 2 * index;
            if start >= free_from && start + label.len() <= grid_width {
                ticks[start..start + label.len()].copy_from_slice(&label);
                free_from = start + label.len() + 1;
            }
        }
        lines.push(format!(
            "{}  {}",
            " ".repeat(label_width),
            ticks.into_iter().collect::<String>()
        ));
        lines.push(format!("{:^w$}", X_LABEL, w = width));

        (width, lines)
    }

    fn terminal_cell(&self, throughput: f64) -> String {
        const SHADES: [&str; 5] = ["··", "░░", "▒▒", "▓▓", "██"];
        let t = self.scale.normalize(throughput);
        let shade = SHADES[(t * (SHADES.len() - 1) as f64).round() as usize];
        let Rgb(r, g, b) = viridis(t);
        shade.truecolor(r, g, b).to_string()
    }

    fn terminal_legend(&self) -> String {
        let mut legend = format!("{}  {} ", COLORBAR_TITLE, format_tick(self.scale.vmin()));
        for i in 0..=20 {
            let throughput = self.scale.vmin()
                + (self.scale.vmax() - self.scale.vmin()) * i as f64 / 20.0;
            legend.push_str(&self.terminal_cell(throughput));
        }
        legend.push_str(&format!(" {:.2}", self.scale.vmax()));
        legend
    }
}
