//! Subcommand arguments.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank model groups by the average of their per-run maxima
    Best(BestArgs),
    /// Show how many runs fall into each group and bucket
    Groups(QueryArgs),
    /// Chart the metric of every run
    Plot(PlotArgs),
    /// Chart the mean curve of every group
    PlotGroups(PlotArgs),
}

/// Which metric to look at and how runs are grouped.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Metric name as written in the log files
    #[arg(short, long)]
    pub metric: String,

    /// Only include these datasets (repeatable; default: all)
    #[arg(short, long = "dataset")]
    pub datasets: Vec<String>,

    /// Cut model folder names at the last occurrence of this character to
    /// group repeated runs (e.g. `_` turns `lstm_3` into `lstm`)
    #[arg(long)]
    pub basename_separator: Option<char>,
}

/// Arguments for `best`.
#[derive(Args, Debug)]
pub struct BestArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Number of rows to print
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Rank lowest first (for losses)
    #[arg(long)]
    pub ascending: bool,

    /// Print the full basename → dataset → score table as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `plot` and `plot-groups`.
#[derive(Args, Debug)]
pub struct PlotArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Output SVG file
    #[arg(short, long, default_value = "chart.svg")]
    pub out: PathBuf,

    /// Chart title
    #[arg(long, default_value = "")]
    pub title: String,

    /// Y axis caption
    #[arg(long)]
    pub ylabel: Option<String>,

    /// Python-style slice end for steps and values (negative counts from the end)
    #[arg(long, allow_hyphen_values = true)]
    pub eor: Option<isize>,

    /// Divide steps by this value on the x axis (e.g. batches per epoch)
    #[arg(long, default_value_t = 1.0)]
    pub step_divisor: f64,
}
