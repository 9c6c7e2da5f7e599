//! Training Log - per-dataset scalar time series
//!
//! A [`Log`] accumulates named scalar series during training and persists
//! them in a small line-oriented text format.
//!
//! ## Layout
//!
//! ```text
//! Log
//!  ├── steps: [i64]                      (one per checkpoint)
//!  └── data: dataset ──< metric ──< f64  (ordered, aligned with steps)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use trainlog::log::{Log, NamedValue};
//!
//! let mut log = Log::new();
//! let acc = NamedValue::new("acc", 0.75);
//! let nll = NamedValue::new("nll", 1.2);
//!
//! log.record_step(0);
//! log.record("train", &[&acc], &[&nll], 0);
//!
//! assert_eq!(log.get_steps(), &[0]);
//! assert_eq!(log.series("train", "acc"), Some(&[0.75][..]));
//! ```

mod format;

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Metric name → ordered values.
pub type MetricSeries = IndexMap<String, Vec<f64>>;

/// Dataset name → metrics.
pub type DatasetMap = IndexMap<String, MetricSeries>;

/// Anything that can report a named scalar at the current checkpoint.
///
/// Metrics and losses from the training side implement this so that
/// [`Log::record`] can read their current value.
pub trait Recordable {
    /// Key under which the value is stored.
    fn log_name(&self) -> &str;

    /// Current scalar value.
    fn value(&self) -> f64;
}

/// A plain name/value pair implementing [`Recordable`].
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    name: String,
    value: f64,
}

impl NamedValue {
    /// Create a new named value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Replace the current value.
    pub fn set(&mut self, value: f64) {
        self.value = value;
    }
}

impl Recordable for NamedValue {
    fn log_name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> f64 {
        self.value
    }
}

/// Scalar training log.
///
/// Values are only ever appended while recording; loading from a file
/// replaces whole series (see [`Log::read_from_file`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Log {
    steps: Vec<i64>,
    data: DatasetMap,
}

impl Log {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a log from a file written by [`Log::write_to_file`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and
    /// `Error::ParseError` if it is malformed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut log = Self::new();
        log.read_from_file(path)?;
        Ok(log)
    }

    /// Record the current value of every metric, then every loss, under
    /// `dataset`.
    ///
    /// `step` is not checked against [`Log::get_steps`]; keeping steps and
    /// values aligned is the caller's job.
    pub fn record(
        &mut self,
        dataset: &str,
        metrics: &[&dyn Recordable],
        losses: &[&dyn Recordable],
        step: i64,
    ) {
        for item in metrics.iter().chain(losses) {
            let value = item.value();
            tracing::trace!(dataset, metric = item.log_name(), step, value, "record");
            self.push_value(dataset, item.log_name(), value);
        }
    }

    /// Append a single value to `data[dataset][metric]`, creating both
    /// levels on first use.
    pub fn push_value(&mut self, dataset: &str, metric: &str, value: f64) {
        self.data
            .entry(dataset.to_owned())
            .or_default()
            .entry(metric.to_owned())
            .or_default()
            .push(value);
    }

    /// Append a checkpoint step. No ordering or uniqueness check.
    pub fn record_step(&mut self, step: i64) {
        self.steps.push(step);
    }

    /// Write the log to `path`, creating or truncating the file.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if any series is empty (the file is
    /// left untouched) and `Error::Io` on any create/write/flush failure.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        format::write_file(self, path.as_ref())
    }

    /// Write the log in text format to any writer.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if any series is empty, since a metric
    /// line without values cannot be read back, and `Error::Io` if the
    /// writer fails.
    pub fn write_to<W: std::io::Write>(&self, writer: W) -> Result<()> {
        format::write(self, writer)
    }

    /// Fill this log from a file.
    ///
    /// Steps are replaced; each parsed series replaces the series stored
    /// under the same dataset and metric, other series are kept. Nothing
    /// changes if parsing fails.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and
    /// `Error::ParseError` if it is malformed.
    pub fn read_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let parsed = format::read_file(path.as_ref())?;
        self.merge_parsed(parsed);
        Ok(())
    }

    /// Fill this log from any buffered reader. Same semantics as
    /// [`Log::read_from_file`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails and `Error::ParseError` if the
    /// content is malformed.
    pub fn read_from<R: std::io::BufRead>(&mut self, reader: R) -> Result<()> {
        let parsed = format::read(reader)?;
        self.merge_parsed(parsed);
        Ok(())
    }

    fn merge_parsed(&mut self, parsed: Self) {
        self.steps = parsed.steps;
        for (dataset, metrics) in parsed.data {
            let slot = self.data.entry(dataset).or_default();
            for (metric, values) in metrics {
                slot.insert(metric, values);
            }
        }
    }

    /// All series, keyed by dataset then metric.
    #[must_use]
    pub const fn get_logs(&self) -> &DatasetMap {
        &self.data
    }

    /// Recorded checkpoint steps.
    #[must_use]
    pub fn get_steps(&self) -> &[i64] {
        &self.steps
    }

    /// A single series, if present.
    #[must_use]
    pub fn series(&self, dataset: &str, metric: &str) -> Option<&[f64]> {
        self.data
            .get(dataset)
            .and_then(|metrics| metrics.get(metric))
            .map(Vec::as_slice)
    }

    /// Dataset names in insertion order.
    pub fn datasets(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// True if no steps and no series were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_appends_metrics_then_losses() {
        let mut log = Log::new();
        let acc = NamedValue::new("acc", 0.5);
        let loss = NamedValue::new("nll", 2.0);

        log.record("train", &[&acc], &[&loss], 0);
        log.record("train", &[&acc], &[&loss], 1);

        let metrics = &log.get_logs()["train"];
        let keys: Vec<_> = metrics.keys().collect();
        assert_eq!(keys, ["acc", "nll"]);
        assert_eq!(metrics["acc"], vec![0.5, 0.5]);
        assert_eq!(metrics["nll"], vec![2.0, 2.0]);
    }

    #[test]
    fn test_record_step_keeps_duplicates_and_order() {
        let mut log = Log::new();
        log.record_step(5);
        log.record_step(2);
        log.record_step(2);
        assert_eq!(log.get_steps(), &[5, 2, 2]);
    }

    #[test]
    fn test_named_value_set() {
        let mut value = NamedValue::new("acc", 0.1);
        value.set(0.9);
        assert!((value.value() - 0.9).abs() < f64::EPSILON);
        assert_eq!(value.log_name(), "acc");
    }

    #[test]
    fn test_read_from_replaces_series_and_keeps_others() {
        let mut log = Log::new();
        log.record_step(99);
        log.push_value("train", "acc", 0.1);
        log.push_value("train", "nll", 3.0);

        log.read_from("steps 1 2\ntrain\n\tacc 0.7 0.8\n".as_bytes())
            .unwrap();

        assert_eq!(log.get_steps(), &[1, 2]);
        assert_eq!(log.series("train", "acc"), Some(&[0.7, 0.8][..]));
        assert_eq!(log.series("train", "nll"), Some(&[3.0][..]));
    }

    #[test]
    fn test_failed_read_leaves_log_untouched() {
        let mut log = Log::new();
        log.record_step(1);
        log.push_value("train", "acc", 0.1);
        let before = log.clone();

        let result = log.read_from("steps 1\ntrain\n\tacc 0.2 oops\n".as_bytes());

        assert!(result.is_err());
        assert_eq!(log, before);
    }

    #[test]
    fn test_json_export() {
        let mut log = Log::new();
        log.record_step(0);
        log.push_value("dev", "acc", 0.25);

        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["steps"], serde_json::json!([0]));
        assert_eq!(json["data"]["dev"]["acc"], serde_json::json!([0.25]));
    }
}
