//! Chart construction and rendering
//!
//! Collections turn their series into a backend-neutral [`Chart`]; a
//! [`ChartRenderer`] draws it. The renderer is told explicitly whether a
//! display is available ([`DisplayMode`]), detected once at startup rather
//! than as a side effect of loading this module.
//!
//! ```rust
//! use trainlog::plot::{Chart, ChartHandle, ChartRenderer, Series};
//!
//! struct CountOnly;
//!
//! impl ChartRenderer for CountOnly {
//!     fn render(&mut self, chart: &Chart) -> trainlog::Result<ChartHandle> {
//!         Ok(ChartHandle::new(None, chart.series.len(), false))
//!     }
//! }
//!
//! let mut chart = Chart::new("acc");
//! chart.series.push(Series::new("run dev", vec![(0.0, 0.1), (1.0, 0.4)]));
//! assert_eq!(CountOnly.render(&chart)?.series_count(), 1);
//! # Ok::<(), trainlog::Error>(())
//! ```

#[cfg(feature = "svg")]
mod svg;

use std::path::{Path, PathBuf};

#[cfg(feature = "svg")]
pub use svg::{SvgRenderer, SvgRendererBuilder};

use crate::Result;

/// Environment variable consulted by [`DisplayMode::detect`].
pub const DISPLAY_VAR: &str = "DISPLAY";

/// Whether charts can be shown on screen or only written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// A display surface is available.
    Interactive,
    /// No display; charts are only saved.
    #[default]
    Headless,
}

impl DisplayMode {
    /// Detect the mode from the `DISPLAY` environment variable.
    ///
    /// Call once at startup and pass the result to renderers.
    #[must_use]
    pub fn detect() -> Self {
        let mode = Self::from_display_value(std::env::var(DISPLAY_VAR).ok().as_deref());
        if mode == Self::Headless {
            tracing::warn!("no display found, using non-interactive chart backend");
        }
        mode
    }

    /// Mode for a given `DISPLAY` value; unset or empty means headless.
    #[must_use]
    pub fn from_display_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => Self::Interactive,
            _ => Self::Headless,
        }
    }
}

/// 24-bit line color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// One line of a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Legend label.
    pub label: String,
    /// `(x, y)` points in drawing order.
    pub points: Vec<(f64, f64)>,
    /// Fixed color; `None` lets the renderer pick from its palette.
    pub color: Option<Rgb>,
    /// Stroke width.
    pub line_width: f64,
}

impl Series {
    /// Series with default color and a 1.0 stroke.
    #[must_use]
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
            color: None,
            line_width: 1.0,
        }
    }
}

/// Backend-neutral line chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    /// Chart title.
    pub title: String,
    /// X axis caption.
    pub x_label: String,
    /// Y axis caption.
    pub y_label: String,
    /// Lines to draw.
    pub series: Vec<Series>,
    /// Whether the caller wants the chart shown.
    pub show: bool,
}

impl Chart {
    /// Empty chart with the given y axis caption.
    #[must_use]
    pub fn new(y_label: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            x_label: DEFAULT_X_LABEL.to_string(),
            y_label: y_label.into(),
            series: Vec::new(),
            show: true,
        }
    }

    /// Bounding box `(x_min, x_max, y_min, y_max)` of all points.
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.series
            .iter()
            .flat_map(|s| s.points.iter())
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .fold(None, |acc, &(x, y)| match acc {
                None => Some((x, x, y, y)),
                Some((x0, x1, y0, y1)) => Some((x0.min(x), x1.max(x), y0.min(y), y1.max(y))),
            })
    }
}

/// What a renderer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartHandle {
    path: Option<PathBuf>,
    series_count: usize,
    displayed: bool,
}

impl ChartHandle {
    /// Create a handle.
    #[must_use]
    pub const fn new(path: Option<PathBuf>, series_count: usize, displayed: bool) -> Self {
        Self {
            path,
            series_count,
            displayed,
        }
    }

    /// File the chart was written to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of lines drawn.
    #[must_use]
    pub const fn series_count(&self) -> usize {
        self.series_count
    }

    /// Whether the chart was handed to a display.
    #[must_use]
    pub const fn displayed(&self) -> bool {
        self.displayed
    }
}

/// Charting backend.
pub trait ChartRenderer {
    /// Draw `chart`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Render` or `Error::Io` on backend failure.
    fn render(&mut self, chart: &Chart) -> Result<ChartHandle>;
}

/// Default X axis caption.
pub const DEFAULT_X_LABEL: &str = "Epochs";

type ColorGroup<'f> = Box<dyn Fn(&str, &str) -> Rgb + 'f>;

/// Rendering options for [`LogCollection::plot_metric`] and
/// [`LogCollection::plot_groups`].
///
/// [`LogCollection::plot_metric`]: crate::collection::LogCollection::plot_metric
/// [`LogCollection::plot_groups`]: crate::collection::LogCollection::plot_groups
pub struct PlotOptions<'f> {
    pub(crate) title: String,
    pub(crate) x_label: String,
    pub(crate) y_label: Option<String>,
    pub(crate) line_width: Option<f64>,
    pub(crate) color_group: Option<ColorGroup<'f>>,
    pub(crate) end_of_range: Option<isize>,
    pub(crate) step_divisor: f64,
    pub(crate) show: bool,
}

impl Default for PlotOptions<'_> {
    fn default() -> Self {
        Self {
            title: String::new(),
            x_label: DEFAULT_X_LABEL.to_string(),
            y_label: None,
            line_width: None,
            color_group: None,
            end_of_range: None,
            step_divisor: 1.0,
            show: true,
        }
    }
}

impl<'f> PlotOptions<'f> {
    /// Default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chart title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// X axis caption.
    #[must_use]
    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = label.into();
        self
    }

    /// Y axis caption (defaults depend on the plot kind).
    #[must_use]
    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = Some(label.into());
        self
    }

    /// Stroke width for every line.
    #[must_use]
    pub const fn line_width(mut self, width: f64) -> Self {
        self.line_width = Some(width);
        self
    }

    /// Color each line by `(log or group name, dataset)`.
    #[must_use]
    pub fn color_group(mut self, f: impl Fn(&str, &str) -> Rgb + 'f) -> Self {
        self.color_group = Some(Box::new(f));
        self
    }

    /// Slice end applied to steps and values; negative counts from the end.
    #[must_use]
    pub const fn end_of_range(mut self, end: isize) -> Self {
        self.end_of_range = Some(end);
        self
    }

    /// Divide every step by `divisor` (e.g. batches per epoch).
    #[must_use]
    pub const fn step_divisor(mut self, divisor: f64) -> Self {
        self.step_divisor = divisor;
        self
    }

    /// Whether the chart should be shown when a display is available.
    #[must_use]
    pub const fn show(mut self, show: bool) -> Self {
        self.show = show;
        self
    }

    pub(crate) fn effective_line_width(&self) -> f64 {
        match (self.line_width, &self.color_group) {
            (Some(width), _) => width,
            (None, Some(_)) => 3.0,
            (None, None) => 1.0,
        }
    }

    pub(crate) fn color_for(&self, name: &str, dataset: &str) -> Option<Rgb> {
        self.color_group.as_ref().map(|f| f(name, dataset))
    }

    pub(crate) fn chart(&self, default_y_label: &str) -> Chart {
        Chart {
            title: self.title.clone(),
            x_label: self.x_label.clone(),
            y_label: self
                .y_label
                .clone()
                .unwrap_or_else(|| default_y_label.to_string()),
            series: Vec::new(),
            show: self.show,
        }
    }
}

impl std::fmt::Debug for PlotOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotOptions")
            .field("title", &self.title)
            .field("x_label", &self.x_label)
            .field("y_label", &self.y_label)
            .field("line_width", &self.line_width)
            .field("color_group", &self.color_group.is_some())
            .field("end_of_range", &self.end_of_range)
            .field("step_divisor", &self.step_divisor)
            .field("show", &self.show)
            .finish()
    }
}

/// Slice `items[..end]` with Python semantics: negative `end` counts from
/// the back, out-of-range ends clamp.
pub(crate) fn truncate<T>(items: &[T], end: Option<isize>) -> &[T] {
    let len = items.len();
    let cut = match end {
        None => len,
        Some(end) if end >= 0 => end.unsigned_abs().min(len),
        Some(end) => len.saturating_sub(end.unsigned_abs()),
    };
    &items[..cut]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mode_from_value() {
        assert_eq!(DisplayMode::from_display_value(None), DisplayMode::Headless);
        assert_eq!(DisplayMode::from_display_value(Some("")), DisplayMode::Headless);
        assert_eq!(
            DisplayMode::from_display_value(Some(":0")),
            DisplayMode::Interactive
        );
    }

    #[test]
    fn test_truncate_python_semantics() {
        let items = [1, 2, 3, 4];
        assert_eq!(truncate(&items, None), &[1, 2, 3, 4]);
        assert_eq!(truncate(&items, Some(-1)), &[1, 2, 3]);
        assert_eq!(truncate(&items, Some(2)), &[1, 2]);
        assert_eq!(truncate(&items, Some(10)), &[1, 2, 3, 4]);
        assert!(truncate(&items, Some(-10)).is_empty());
    }

    #[test]
    fn test_line_width_defaults() {
        assert!((PlotOptions::new().effective_line_width() - 1.0).abs() < f64::EPSILON);
        let grouped = PlotOptions::new().color_group(|_, _| Rgb(0, 0, 0));
        assert!((grouped.effective_line_width() - 3.0).abs() < f64::EPSILON);
        let explicit = grouped.line_width(2.0);
        assert!((explicit.effective_line_width() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_chart_bounds() {
        let mut chart = Chart::new("acc");
        assert!(chart.bounds().is_none());
        chart.series.push(Series::new("a", vec![(0.0, 1.0), (2.0, -1.0)]));
        chart.series.push(Series::new("b", vec![(5.0, 0.5), (1.0, f64::NAN)]));
        assert_eq!(chart.bounds(), Some((0.0, 5.0, -1.0, 1.0)));
    }
}
