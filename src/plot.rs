//! ==============================================================================
//! plot.rs - optional live chart of recent readings
//! ==============================================================================
//!
//! purpose:
//!     keeps the last N readings in a bounded buffer and redraws an svg chart
//!     (scatter points joined by a line) after every sample. open the file in
//!     a browser with auto-refresh to watch the temperature live.
//!
//! relationships:
//!     - used by: sampler.rs (only when [plot] enabled = true)
//!     - configured by: config.rs (PlotConfig)
//!
//! the chart is written to a sibling temp file and renamed into place, so a
//! viewer never loads half a document.
//!
//! ==============================================================================

use crate::domain::{Reading, TIMESTAMP_FORMAT};

use anyhow::{Context, Result};
use chrono::TimeDelta;
use plotters::prelude::*;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 400;
const MARGIN: u32 = 20;

const BACKGROUND: RGBColor = RGBColor(0x1a, 0x1a, 0x2e);
const FOREGROUND: RGBColor = RGBColor(0xee, 0xee, 0xee);
const AXIS: RGBColor = RGBColor(0x88, 0x88, 0x88);
const SERIES: RGBColor = RGBColor(0xff, 0x6b, 0x6b);

// ==============================================================================
// bounded history
// ==============================================================================

/// ring buffer of the most recent readings, oldest first
#[derive(Debug, Clone)]
pub struct PlotBuffer {
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl PlotBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { readings: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, reading: Reading) {
        if self.readings.len() == self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }
}

// ==============================================================================
// svg output
// ==============================================================================

#[derive(Debug)]
pub struct Plotter {
    buffer: PlotBuffer,
    output: PathBuf,
}

impl Plotter {
    pub fn new(capacity: usize, output: impl Into<PathBuf>) -> Self {
        Self { buffer: PlotBuffer::new(capacity), output: output.into() }
    }

    /// add a reading and redraw the chart
    pub fn plot(&mut self, reading: Reading) -> Result<()> {
        self.buffer.push(reading);
        let svg = render_svg(&self.buffer)?;
        write_atomic(&self.output, &svg)?;
        tracing::debug!("chart redrawn with {} readings", self.buffer.len());
        Ok(())
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, contents)
        .with_context(|| format!("failed to write chart {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to move chart into {}", path.display()))?;
    Ok(())
}

/// scatter + line chart, seconds on x (labelled as wall clock), temperature on y
pub fn render_svg(buffer: &PlotBuffer) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&BACKGROUND).context("failed to draw chart background")?;

        if let (Some(first), Some(last)) = (buffer.iter().next(), buffer.iter().last()) {
            let t0 = first.timestamp;
            let span = (last.timestamp - t0).num_seconds().max(1) as f64;

            let (mut lo, mut hi) = buffer.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
                (lo.min(r.value), hi.max(r.value))
            });
            // flat series still needs a visible band
            if hi - lo < 1.0 {
                let mid = (hi + lo) / 2.0;
                lo = mid - 0.5;
                hi = mid + 0.5;
            }

            let caption = format!(
                "CPU temperature {} .. {}",
                first.timestamp.format(TIMESTAMP_FORMAT),
                last.timestamp.format(TIMESTAMP_FORMAT)
            );
            let mut chart = ChartBuilder::on(&root)
                .margin(MARGIN)
                .caption(caption, ("sans-serif", 16).into_font().color(&FOREGROUND))
                .x_label_area_size(30)
                .y_label_area_size(50)
                .build_cartesian_2d(0f64..span, lo..hi)
                .context("failed to lay out chart")?;

            let x_label = |offset: &f64| {
                (t0 + TimeDelta::seconds(*offset as i64)).format("%H:%M:%S").to_string()
            };
            let y_label = |value: &f64| format!("{:.1}", value);
            chart
                .configure_mesh()
                .disable_mesh()
                .axis_style(&AXIS)
                .label_style(("sans-serif", 12).into_font().color(&FOREGROUND))
                .x_labels(5)
                .x_label_formatter(&x_label)
                .y_label_formatter(&y_label)
                .draw()
                .context("failed to draw chart axes")?;

            let points: Vec<(f64, f64)> = buffer
                .iter()
                .map(|r| ((r.timestamp - t0).num_seconds() as f64, r.value))
                .collect();

            // line
            chart
                .draw_series(LineSeries::new(points.iter().copied(), &SERIES))
                .context("failed to draw chart line")?;
            // scatter
            chart
                .draw_series(points.iter().map(|&point| Circle::new(point, 3, SERIES.filled())))
                .context("failed to draw chart points")?;
        }

        root.present().context("failed to finish chart")?;
    }
    Ok(svg)
}
