//! Chart assembly for collections

use super::{LogCollection, Selection};
use crate::plot::{truncate, ChartHandle, ChartRenderer, PlotOptions, Series};
use crate::{Error, Result};

const GROUPS_Y_LABEL: &str = "Loss";

impl LogCollection {
    /// Plot `metric` for every selected `(log, dataset)` pair, one line each,
    /// labelled `"<log name> <dataname>"`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingMetric` if a selected dataset has no `metric`,
    /// `Error::InvalidInput` if a series and its log's steps differ in
    /// length after truncation, and any renderer error.
    pub fn plot_metric(
        &self,
        metric: &str,
        selection: &Selection<'_>,
        options: &PlotOptions<'_>,
        renderer: &mut dyn ChartRenderer,
    ) -> Result<ChartHandle> {
        let mut chart = options.chart(metric);

        for (name, log) in self.iter() {
            if !selection.accepts_model(name) {
                continue;
            }
            let xs = scaled_steps(log.get_steps(), options);
            for (dataset, metrics) in log.get_logs() {
                if !selection.accepts_dataset(dataset) {
                    continue;
                }
                let values = metrics.get(metric).ok_or_else(|| Error::MissingMetric {
                    log: name.to_owned(),
                    dataset: dataset.clone(),
                    metric: metric.to_owned(),
                })?;
                let label = format!("{name} {}", selection.dataname_of(dataset));
                let points = zip_points(&xs, truncate(values, options.end_of_range), &label)?;

                let mut series = Series::new(label, points);
                series.color = options.color_for(name, dataset);
                series.line_width = options.effective_line_width();
                chart.series.push(series);
            }
        }

        tracing::debug!(metric, series = chart.series.len(), "plotting metric");
        renderer.render(&chart)
    }

    /// Plot the point-wise mean curve of `metric` per `(basename, dataname)`
    /// bucket, labelled `basename + dataname`. The x axis comes from the
    /// first log's steps.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for an empty collection, ragged runs or
    /// a curve/step length mismatch, `Error::MissingMetric` if a selected
    /// dataset has no `metric`, and any renderer error.
    pub fn plot_groups(
        &self,
        metric: &str,
        selection: &Selection<'_>,
        options: &PlotOptions<'_>,
        renderer: &mut dyn ChartRenderer,
    ) -> Result<ChartHandle> {
        let first = self
            .logs()
            .first()
            .ok_or_else(|| Error::InvalidInput("cannot plot groups of an empty collection".into()))?;
        let xs = scaled_steps(first.get_steps(), options);

        let mut chart = options.chart(GROUPS_Y_LABEL);
        for (basename, curves) in self.mean_curves(metric, selection)? {
            for (dataname, curve) in curves {
                let label = format!("{basename}{dataname}");
                let points = zip_points(&xs, truncate(&curve, options.end_of_range), &label)?;

                let mut series = Series::new(label, points);
                series.color = options.color_for(&basename, &dataname);
                series.line_width = options.effective_line_width();
                chart.series.push(series);
            }
        }

        tracing::debug!(metric, series = chart.series.len(), "plotting groups");
        renderer.render(&chart)
    }
}

#[allow(clippy::cast_precision_loss)]
fn scaled_steps(steps: &[i64], options: &PlotOptions<'_>) -> Vec<f64> {
    truncate(steps, options.end_of_range)
        .iter()
        .map(|&step| step as f64 / options.step_divisor)
        .collect()
}

fn zip_points(xs: &[f64], ys: &[f64], label: &str) -> Result<Vec<(f64, f64)>> {
    if xs.len() != ys.len() {
        return Err(Error::InvalidInput(format!(
            "series '{label}' has {} values but {} steps",
            ys.len(),
            xs.len()
        )));
    }
    Ok(xs.iter().copied().zip(ys.iter().copied()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::Log;
    use crate::plot::{Chart, Rgb};

    #[derive(Default)]
    struct Capture {
        charts: Vec<Chart>,
    }

    impl ChartRenderer for Capture {
        fn render(&mut self, chart: &Chart) -> Result<ChartHandle> {
            self.charts.push(chart.clone());
            Ok(ChartHandle::new(None, chart.series.len(), false))
        }
    }

    fn run(values: &[f64]) -> Log {
        let mut log = Log::new();
        for (step, &v) in values.iter().enumerate() {
            log.record_step(i64::try_from(step).unwrap() * 100);
            log.push_value("dev", "acc", v);
        }
        log
    }

    #[test]
    fn test_plot_metric_one_series_per_run_and_dataset() {
        let mut collection = LogCollection::new();
        collection.add_log("m_1", run(&[0.1, 0.2, 0.3]));
        collection.add_log("m_2", run(&[0.4, 0.5, 0.6]));
        let mut capture = Capture::default();

        let options = PlotOptions::new()
            .title("acc")
            .step_divisor(100.0)
            .end_of_range(-1);
        let handle = collection
            .plot_metric("acc", &Selection::new(), &options, &mut capture)
            .unwrap();

        assert_eq!(handle.series_count(), 2);
        let chart = &capture.charts[0];
        assert_eq!(chart.y_label, "acc");
        assert_eq!(chart.x_label, "Epochs");
        assert_eq!(chart.series[0].label, "m_1 dev");
        assert_eq!(chart.series[0].points, vec![(0.0, 0.1), (1.0, 0.2)]);
        assert!(chart.series[0].color.is_none());
    }

    #[test]
    fn test_plot_metric_color_group() {
        let mut collection = LogCollection::new();
        collection.add_log("m_1", run(&[0.1]));
        let mut capture = Capture::default();

        let options = PlotOptions::new().color_group(|name, dataset| {
            if name == "m_1" && dataset == "dev" {
                Rgb(1, 2, 3)
            } else {
                Rgb(0, 0, 0)
            }
        });
        collection
            .plot_metric("acc", &Selection::new(), &options, &mut capture)
            .unwrap();

        let series = &capture.charts[0].series[0];
        assert_eq!(series.color, Some(Rgb(1, 2, 3)));
        assert!((series.line_width - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_plot_metric_misaligned_steps() {
        let mut log = run(&[0.1, 0.2]);
        log.push_value("dev", "acc", 0.3);
        let mut collection = LogCollection::new();
        collection.add_log("m", log);

        let result = collection.plot_metric(
            "acc",
            &Selection::new(),
            &PlotOptions::new(),
            &mut Capture::default(),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_plot_groups_averages_runs() {
        let mut collection = LogCollection::new();
        collection.add_log("m_1", run(&[0.0, 0.2]));
        collection.add_log("m_2", run(&[0.4, 0.6]));
        let selection =
            Selection::new().basename(|name| name.split('_').next().unwrap_or(name).to_string());
        let mut capture = Capture::default();

        collection
            .plot_groups("acc", &selection, &PlotOptions::new(), &mut capture)
            .unwrap();

        let chart = &capture.charts[0];
        assert_eq!(chart.y_label, "Loss");
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].label, "mdev");
        let ys: Vec<f64> = chart.series[0].points.iter().map(|p| p.1).collect();
        assert!((ys[0] - 0.2).abs() < 1e-12);
        assert!((ys[1] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_plot_groups_empty_collection() {
        let result = LogCollection::new().plot_groups(
            "acc",
            &Selection::new(),
            &PlotOptions::new(),
            &mut Capture::default(),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
