//! SVG line charts via plotters.

use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;

use super::{Chart, ChartHandle, ChartRenderer, DisplayMode, Rgb};
use crate::{Error, Result};

const DEFAULT_SIZE: (u32, u32) = (1300, 1100);

/// Renders each chart to one SVG file.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    path: PathBuf,
    size: (u32, u32),
    mode: DisplayMode,
}

impl SvgRenderer {
    /// Headless renderer writing to `path` at the default size.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::builder(path).build()
    }

    /// Builder for size and display mode.
    #[must_use]
    pub fn builder(path: impl Into<PathBuf>) -> SvgRendererBuilder {
        SvgRendererBuilder::new(path)
    }

    /// Output file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display mode this renderer was created with.
    #[must_use]
    pub const fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    fn draw(&self, chart: &Chart) -> Result<()> {
        let root = SVGBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let (x0, x1, y0, y1) = chart.bounds().unwrap_or((0.0, 1.0, 0.0, 1.0));
        let (x0, x1) = padded(x0, x1);
        let (y0, y1) = padded(y0, y1);

        {
            let mut builder = ChartBuilder::on(&root);
            builder
                .margin(20)
                .x_label_area_size(60)
                .y_label_area_size(70);
            if !chart.title.is_empty() {
                builder.caption(&chart.title, ("sans-serif", 28));
            }
            let mut ctx = builder
                .build_cartesian_2d(x0..x1, y0..y1)
                .map_err(render_error)?;

            ctx.configure_mesh()
                .x_desc(chart.x_label.as_str())
                .y_desc(chart.y_label.as_str())
                .axis_desc_style(("sans-serif", 24))
                .label_style(("sans-serif", 20))
                .draw()
                .map_err(render_error)?;

            for (index, series) in chart.series.iter().enumerate() {
                let color = series.color.map_or_else(
                    || Palette99::pick(index).to_rgba(),
                    |Rgb(r, g, b)| RGBColor(r, g, b).to_rgba(),
                );
                let style = color.stroke_width(stroke_px(series.line_width));
                ctx.draw_series(LineSeries::new(series.points.iter().copied(), style))
                    .map_err(render_error)?
                    .label(series.label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
            }

            if !chart.series.is_empty() {
                ctx.configure_series_labels()
                    .background_style(WHITE.mix(0.8))
                    .border_style(BLACK)
                    .draw()
                    .map_err(render_error)?;
            }
        }

        root.present().map_err(render_error)?;
        Ok(())
    }
}

impl ChartRenderer for SvgRenderer {
    fn render(&mut self, chart: &Chart) -> Result<ChartHandle> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        self.draw(chart)?;

        let displayed = chart.show && self.mode == DisplayMode::Interactive;
        if displayed {
            tracing::info!(path = %self.path.display(), "chart ready for display");
        } else {
            tracing::debug!(path = %self.path.display(), "chart saved");
        }
        Ok(ChartHandle::new(
            Some(self.path.clone()),
            chart.series.len(),
            displayed,
        ))
    }
}

/// Builder for `SvgRenderer`.
#[derive(Debug)]
pub struct SvgRendererBuilder {
    path: PathBuf,
    size: (u32, u32),
    mode: DisplayMode,
}

impl SvgRendererBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: DEFAULT_SIZE,
            mode: DisplayMode::Headless,
        }
    }

    /// Canvas size in pixels.
    #[must_use]
    pub const fn size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Display mode, normally from [`DisplayMode::detect`].
    #[must_use]
    pub const fn display_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the `SvgRenderer`.
    #[must_use]
    pub fn build(self) -> SvgRenderer {
        SvgRenderer {
            path: self.path,
            size: self.size,
            mode: self.mode,
        }
    }
}

fn render_error<E: std::fmt::Display>(err: E) -> Error {
    Error::Render(err.to_string())
}

fn padded(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        let pad = (hi - lo) * 0.02;
        (lo - pad, hi + pad)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn stroke_px(width: f64) -> u32 {
    width.round().max(1.0) as u32
}
