//! Command line front end.
//!
//! Every immediate subdirectory of the models directory is one model
//! folder; every matching file below it is one run. Runs are grouped by
//! their model folder name.

pub mod commands;

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use commands::{BestArgs, Commands, PlotArgs, QueryArgs};
use trainlog::topk::SortOrder;
use trainlog::{LogCollection, Selection};

/// Summarize and chart training logs.
#[derive(Parser, Debug)]
#[command(name = "trainlog", version, about)]
pub struct Cli {
    /// Directory holding one folder per model
    pub models_dir: PathBuf,

    /// Only load files whose name ends with this (empty: all files)
    #[arg(long, default_value = ".log")]
    pub ext: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Load the collection and dispatch to the subcommand.
    pub fn run(self) -> Result<()> {
        let collection = load_models(&self.models_dir, &self.ext)?;
        if collection.is_empty() {
            bail!(
                "no '{}' logs found under {}",
                self.ext,
                self.models_dir.display()
            );
        }

        let mut out = io::stdout().lock();
        match &self.command {
            Commands::Best(args) => self.run_best(&collection, args, &mut out),
            Commands::Groups(args) => self.run_groups(&collection, args, &mut out),
            Commands::Plot(args) => self.run_plot(&collection, args, false, &mut out),
            Commands::PlotGroups(args) => self.run_plot(&collection, args, true, &mut out),
        }
    }

    fn selection<'a>(&'a self, query: &'a QueryArgs) -> Selection<'a> {
        let mut selection = Selection::new().basename(move |name| {
            model_basename(&self.models_dir, name, query.basename_separator)
        });
        if !query.datasets.is_empty() {
            selection = selection.restrict_data(move |dataset| {
                query.datasets.iter().any(|wanted| wanted == dataset)
            });
        }
        selection
    }

    fn run_best(
        &self,
        collection: &LogCollection,
        args: &BestArgs,
        out: &mut dyn Write,
    ) -> Result<()> {
        let selection = self.selection(&args.query);
        let metric = &args.query.metric;

        if args.json {
            let scores = collection.find_highest_average(metric, &selection)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&scores)?)?;
            return Ok(());
        }

        let order = if args.ascending {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        };
        let rows = collection.rank_highest_average(metric, &selection, args.top, order)?;
        for row in rows {
            writeln!(out, "{:<40} {:<20} {:.6}", row.basename, row.dataname, row.score)?;
        }
        Ok(())
    }

    fn run_groups(
        &self,
        collection: &LogCollection,
        args: &QueryArgs,
        out: &mut dyn Write,
    ) -> Result<()> {
        let selection = self.selection(args);
        let grouped = collection.group_by(&args.metric, &selection)?;
        for (basename, buckets) in &grouped {
            for (dataname, runs) in buckets {
                let longest = runs.iter().map(Vec::len).max().unwrap_or(0);
                writeln!(
                    out,
                    "{basename:<40} {dataname:<20} runs={} points={longest}",
                    runs.len()
                )?;
            }
        }
        Ok(())
    }

    #[cfg(feature = "svg")]
    fn run_plot(
        &self,
        collection: &LogCollection,
        args: &PlotArgs,
        groups: bool,
        out: &mut dyn Write,
    ) -> Result<()> {
        use trainlog::plot::{DisplayMode, PlotOptions, SvgRenderer};

        let selection = self.selection(&args.query);
        let mut options = PlotOptions::new()
            .title(args.title.as_str())
            .step_divisor(args.step_divisor);
        if let Some(ylabel) = &args.ylabel {
            options = options.y_label(ylabel.as_str());
        }
        if let Some(eor) = args.eor {
            options = options.end_of_range(eor);
        }

        let mut renderer = SvgRenderer::builder(&args.out)
            .display_mode(DisplayMode::detect())
            .build();
        let result = if groups {
            collection.plot_groups(&args.query.metric, &selection, &options, &mut renderer)
        } else {
            collection.plot_metric(&args.query.metric, &selection, &options, &mut renderer)
        };
        let handle = result.with_context(|| format!("failed to plot '{}'", args.query.metric))?;

        writeln!(
            out,
            "wrote {} series to {}",
            handle.series_count(),
            args.out.display()
        )?;
        Ok(())
    }

    #[cfg(not(feature = "svg"))]
    fn run_plot(
        &self,
        _: &LogCollection,
        _: &PlotArgs,
        _: bool,
        _: &mut dyn Write,
    ) -> Result<()> {
        bail!("trainlog was built without the `svg` feature")
    }
}

/// Load every model folder below `models_dir`.
fn load_models(models_dir: &Path, ext: &str) -> Result<LogCollection> {
    let mut model_dirs = fs::read_dir(models_dir)
        .and_then(|entries| {
            entries
                .map(|entry| entry.map(|e| e.path()))
                .collect::<io::Result<Vec<_>>>()
        })
        .with_context(|| format!("cannot list {}", models_dir.display()))?;
    model_dirs.retain(|path| path.is_dir());
    model_dirs.sort();

    let mut collection = LogCollection::new();
    for dir in &model_dirs {
        collection
            .add_log_from_directory(dir, ext, None)
            .with_context(|| format!("failed to load logs from {}", dir.display()))?;
    }
    Ok(collection)
}

/// Model folder of a log path, optionally cut at the last `separator`.
fn model_basename(models_dir: &Path, log_name: &str, separator: Option<char>) -> String {
    let path = Path::new(log_name);
    let folder = path
        .strip_prefix(models_dir)
        .ok()
        .and_then(|rel| rel.components().next())
        .and_then(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .unwrap_or_else(|| log_name.to_owned());

    match separator.and_then(|sep| folder.rfind(sep)) {
        Some(cut) if cut > 0 => folder[..cut].to_owned(),
        _ => folder,
    }
}
