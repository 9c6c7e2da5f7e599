//! Cross-run aggregation
//!
//! Runs are bucketed by `(basename, dataname)` as decided by a
//! [`Selection`]. Within a bucket:
//!
//! - [`LogCollection::group_by`] keeps every run's full series
//! - [`LogCollection::find_highest_average`] averages the per-run maxima
//! - [`LogCollection::mean_curves`] averages the series point-wise

use indexmap::IndexMap;
use serde::Serialize;

use super::{LogCollection, Selection};
use crate::topk::{select_top_k, SortOrder};
use crate::{Error, Result};

/// basename → dataname → one series per run.
pub type Grouped = IndexMap<String, IndexMap<String, Vec<Vec<f64>>>>;

/// basename → dataname → score.
pub type Scores = IndexMap<String, IndexMap<String, f64>>;

/// One row of a ranked average-of-maxima table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedScore {
    /// Group key of the runs.
    pub basename: String,
    /// Bucket key of the dataset.
    pub dataname: String,
    /// Average of the per-run maxima.
    pub score: f64,
}

impl LogCollection {
    /// Visit every selected `(name, dataset, series)` in collection order,
    /// failing on the first selected dataset without `metric`.
    fn for_each_selected<'a, F>(
        &'a self,
        metric: &str,
        selection: &Selection<'_>,
        mut visit: F,
    ) -> Result<()>
    where
        F: FnMut(&'a str, &'a str, &'a [f64]) -> Result<()>,
    {
        for (name, log) in self.iter() {
            if !selection.accepts_model(name) {
                continue;
            }
            for (dataset, metrics) in log.get_logs() {
                if !selection.accepts_dataset(dataset) {
                    continue;
                }
                let series = metrics.get(metric).ok_or_else(|| Error::MissingMetric {
                    log: name.to_owned(),
                    dataset: dataset.clone(),
                    metric: metric.to_owned(),
                })?;
                visit(name, dataset.as_str(), series.as_slice())?;
            }
        }
        Ok(())
    }

    /// Collect the full `metric` series of every selected run into
    /// `grouped[basename][dataname]`, one entry per run.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingMetric` if a selected dataset has no `metric`.
    pub fn group_by(&self, metric: &str, selection: &Selection<'_>) -> Result<Grouped> {
        let mut grouped = Grouped::new();
        self.for_each_selected(metric, selection, |name, dataset, series| {
            grouped
                .entry(selection.basename_of(name))
                .or_default()
                .entry(selection.dataname_of(dataset))
                .or_default()
                .push(series.to_vec());
            Ok(())
        })?;
        Ok(grouped)
    }

    /// Average of per-run maxima of `metric`, per `(basename, dataname)`.
    ///
    /// Each run contributes its peak value first; peaks are then averaged
    /// over the runs in the bucket. This is not the peak of the averaged
    /// curve.
    ///
    /// A NaN anywhere in a run makes its peak NaN, wherever it appears, so
    /// the bucket's score is NaN too. Diverged runs are not silently ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingMetric` if a selected dataset has no `metric`
    /// and `Error::EmptySeries` if a selected series has no values.
    pub fn find_highest_average(&self, metric: &str, selection: &Selection<'_>) -> Result<Scores> {
        let mut sums: IndexMap<String, IndexMap<String, (f64, usize)>> = IndexMap::new();

        self.for_each_selected(metric, selection, |name, dataset, series| {
            let peak = series
                .iter()
                .copied()
                .reduce(nan_max)
                .ok_or_else(|| Error::EmptySeries {
                    log: name.to_owned(),
                    dataset: dataset.to_owned(),
                    metric: metric.to_owned(),
                })?;
            let slot = sums
                .entry(selection.basename_of(name))
                .or_default()
                .entry(selection.dataname_of(dataset))
                .or_insert((0.0, 0));
            slot.0 += peak;
            slot.1 += 1;
            Ok(())
        })?;

        #[allow(clippy::cast_precision_loss)]
        let scores = sums
            .into_iter()
            .map(|(basename, buckets)| {
                let averages = buckets
                    .into_iter()
                    .map(|(dataname, (sum, count))| (dataname, sum / count as f64))
                    .collect();
                (basename, averages)
            })
            .collect();
        Ok(scores)
    }

    /// Point-wise mean of the grouped `metric` series per bucket.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingMetric` if a selected dataset has no `metric`
    /// and `Error::InvalidInput` if runs in one bucket differ in length.
    pub fn mean_curves(
        &self,
        metric: &str,
        selection: &Selection<'_>,
    ) -> Result<IndexMap<String, IndexMap<String, Vec<f64>>>> {
        self.group_by(metric, selection)?
            .into_iter()
            .map(|(basename, buckets)| {
                let curves = buckets
                    .into_iter()
                    .map(|(dataname, runs)| {
                        let curve = mean_curve(&runs).map_err(|len| {
                            Error::InvalidInput(format!(
                                "runs of '{basename}'/'{dataname}' differ in length \
                                 ({} vs {len}), cannot average '{metric}'",
                                runs[0].len()
                            ))
                        })?;
                        Ok::<_, Error>((dataname, curve))
                    })
                    .collect::<Result<IndexMap<_, _>>>()?;
                Ok::<_, Error>((basename, curves))
            })
            .collect()
    }

    /// The `k` best `(basename, dataname)` buckets by average of maxima.
    ///
    /// # Errors
    ///
    /// Same as [`LogCollection::find_highest_average`], plus
    /// `Error::InvalidInput` if `k` is zero.
    pub fn rank_highest_average(
        &self,
        metric: &str,
        selection: &Selection<'_>,
        k: usize,
        order: SortOrder,
    ) -> Result<Vec<RankedScore>> {
        let rows: Vec<RankedScore> = self
            .find_highest_average(metric, selection)?
            .into_iter()
            .flat_map(|(basename, buckets)| {
                buckets.into_iter().map(move |(dataname, score)| RankedScore {
                    basename: basename.clone(),
                    dataname,
                    score,
                })
            })
            .collect();

        let scores: Vec<f64> = rows.iter().map(|row| row.score).collect();
        let indices = select_top_k(&scores, k, order)?;
        Ok(indices.into_iter().map(|i| rows[i].clone()).collect())
    }
}

/// `f64::max` that propagates NaN instead of discarding it.
fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// Point-wise mean; on ragged input returns the first mismatching length.
fn mean_curve(runs: &[Vec<f64>]) -> std::result::Result<Vec<f64>, usize> {
    let Some(first) = runs.first() else {
        return Ok(Vec::new());
    };
    if let Some(other) = runs.iter().find(|run| run.len() != first.len()) {
        return Err(other.len());
    }

    #[allow(clippy::cast_precision_loss)]
    let count = runs.len() as f64;
    Ok((0..first.len())
        .map(|i| runs.iter().map(|run| run[i]).sum::<f64>() / count)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::Log;

    fn run(dataset: &str, metric: &str, values: &[f64]) -> Log {
        let mut log = Log::new();
        for &v in values {
            log.push_value(dataset, metric, v);
        }
        log
    }

    fn prefix_basename(name: &str) -> String {
        name.split('_').next().unwrap_or(name).to_owned()
    }

    #[test]
    fn test_highest_average_is_mean_of_maxima() {
        let mut collection = LogCollection::new();
        collection.add_log("modelA_1", run("dev", "acc", &[0.1, 0.5, 0.3]));
        collection.add_log("modelA_2", run("dev", "acc", &[0.2, 0.4, 0.6]));
        let selection = Selection::new().basename(prefix_basename);

        let scores = collection.find_highest_average("acc", &selection).unwrap();
        assert!((scores["modelA"]["dev"] - 0.55).abs() < 1e-12);

        // Peak of the averaged curve is 0.45, which must not be what we report.
        let curves = collection.mean_curves("acc", &selection).unwrap();
        let peak_of_mean = curves["modelA"]["dev"].iter().copied().fold(f64::MIN, f64::max);
        assert!((peak_of_mean - 0.45).abs() < 1e-12);
        assert!((scores["modelA"]["dev"] - peak_of_mean).abs() > 0.05);
    }

    #[test]
    fn test_group_by_keeps_each_run() {
        let mut collection = LogCollection::new();
        collection.add_log("lstm_1", run("dev", "acc", &[0.1, 0.2]));
        collection.add_log("lstm_2", run("dev", "acc", &[0.3, 0.4]));
        collection.add_log("gru_1", run("dev", "acc", &[0.5]));

        let grouped = collection
            .group_by("acc", &Selection::new().basename(prefix_basename))
            .unwrap();

        assert_eq!(grouped["lstm"]["dev"], vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
        assert_eq!(grouped["gru"]["dev"].len(), 1);
    }

    #[test]
    fn test_filters_and_dataname_mapping() {
        let mut log = run("dev_clean", "acc", &[0.7]);
        log.push_value("train", "acc", 0.9);
        let mut collection = LogCollection::new();
        collection.add_log("keep", log);
        collection.add_log("skip", run("dev_clean", "acc", &[0.1]));

        let selection = Selection::new()
            .restrict_model(|name| name == "keep")
            .restrict_data(|dataset| dataset.starts_with("dev"))
            .data_name(|dataset| dataset.trim_end_matches("_clean").to_string());
        let scores = collection.find_highest_average("acc", &selection).unwrap();

        assert_eq!(scores.len(), 1);
        assert_eq!(scores["keep"].len(), 1);
        assert!((scores["keep"]["dev"] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_missing_metric_propagates() {
        let mut collection = LogCollection::new();
        collection.add_log("a", run("dev", "nll", &[1.0]));

        let err = collection.group_by("acc", &Selection::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingMetric { ref log, ref dataset, ref metric }
                if log == "a" && dataset == "dev" && metric == "acc"
        ));
        assert!(collection.find_highest_average("acc", &Selection::new()).is_err());
    }

    #[test]
    fn test_missing_metric_in_filtered_dataset_is_ignored() {
        let mut log = run("dev", "acc", &[0.4]);
        log.push_value("train", "nll", 1.0);
        let mut collection = LogCollection::new();
        collection.add_log("a", log);

        let selection = Selection::new().restrict_data(|d| d == "dev");
        assert!(collection.group_by("acc", &selection).is_ok());
    }

    #[test]
    fn test_empty_series_has_no_maximum() {
        let empty: Log =
            serde_json::from_str(r#"{"steps":[],"data":{"dev":{"acc":[]}}}"#).unwrap();
        let mut collection = LogCollection::new();
        collection.add_log("a", run("dev", "acc", &[0.3]));
        collection.add_log("b", empty);

        assert!(matches!(
            collection.find_highest_average("acc", &Selection::new()),
            Err(Error::EmptySeries { ref log, .. }) if log == "b"
        ));
        // grouping still works, an empty run is still a run
        let grouped = collection.group_by("acc", &Selection::new()).unwrap();
        assert!(grouped["b"]["dev"][0].is_empty());
    }

    #[test]
    fn test_nan_poisons_peak_wherever_it_appears() {
        let mut collection = LogCollection::new();
        collection.add_log("a_1", run("dev", "acc", &[f64::NAN, 0.3]));
        collection.add_log("b_1", run("dev", "acc", &[0.3, f64::NAN]));
        collection.add_log("c_1", run("dev", "acc", &[0.3, 0.4]));
        collection.add_log("c_2", run("dev", "acc", &[0.6]));
        let selection = Selection::new().basename(prefix_basename);

        let scores = collection.find_highest_average("acc", &selection).unwrap();

        assert!(scores["a"]["dev"].is_nan());
        assert!(scores["b"]["dev"].is_nan());
        assert!((scores["c"]["dev"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_mean_curve_rejects_ragged_runs() {
        let mut collection = LogCollection::new();
        collection.add_log("m_1", run("dev", "acc", &[0.1, 0.2]));
        collection.add_log("m_2", run("dev", "acc", &[0.3]));

        let err = collection
            .mean_curves("acc", &Selection::new().basename(prefix_basename))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_rank_highest_average_orders_buckets() {
        let mut collection = LogCollection::new();
        collection.add_log("a_1", run("dev", "acc", &[0.2]));
        collection.add_log("b_1", run("dev", "acc", &[0.9]));
        collection.add_log("c_1", run("dev", "acc", &[0.5]));
        let selection = Selection::new().basename(prefix_basename);

        let top = collection
            .rank_highest_average("acc", &selection, 2, SortOrder::Descending)
            .unwrap();
        let names: Vec<_> = top.iter().map(|row| row.basename.as_str()).collect();
        assert_eq!(names, ["b", "c"]);

        let bottom = collection
            .rank_highest_average("acc", &selection, 1, SortOrder::Ascending)
            .unwrap();
        assert_eq!(bottom[0].basename, "a");

        assert!(collection
            .rank_highest_average("acc", &selection, 0, SortOrder::Descending)
            .is_err());
    }
}
