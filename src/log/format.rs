//! Line-oriented log file format
//!
//! ```text
//! steps 0 100 200
//! train
//! 	acc 0.1 0.5 0.7
//! 	nll 2.3 1.1 0.9
//! dev
//! 	acc 0.1 0.4 0.6
//! ```
//!
//! Tokens are whitespace separated. A single unindented token opens a
//! dataset; indented lines carry a metric name followed by its values.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::{DatasetMap, Log};
use crate::{Error, Result};

const STEPS_TOKEN: &str = "steps";

pub(super) fn write_file(log: &Log, path: &Path) -> Result<()> {
    check_writable(log)?;
    let file = File::create(path)?;
    write(log, BufWriter::new(file))?;
    tracing::debug!(path = %path.display(), "log written");
    Ok(())
}

pub(super) fn write<W: Write>(log: &Log, mut writer: W) -> Result<()> {
    check_writable(log)?;
    writer.write_all(STEPS_TOKEN.as_bytes())?;
    writer.write_all(b" ")?;
    writer.write_all(join(log.steps.iter().map(ToString::to_string)).as_bytes())?;
    writer.write_all(b"\n")?;

    for (dataset, metrics) in &log.data {
        writeln!(writer, "{dataset}")?;
        for (metric, values) in metrics {
            let values = join(values.iter().map(|v| format!("{v:?}")));
            writeln!(writer, "\t{metric} {values}")?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// A metric line needs at least one value to be read back.
fn check_writable(log: &Log) -> Result<()> {
    for (dataset, metrics) in &log.data {
        if let Some((metric, _)) = metrics.iter().find(|(_, values)| values.is_empty()) {
            return Err(Error::InvalidInput(format!(
                "series '{metric}' in dataset '{dataset}' is empty and cannot be written"
            )));
        }
    }
    Ok(())
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(" ")
}

pub(super) fn read_file(path: &Path) -> Result<Log> {
    let file = File::open(path)?;
    let log = read(BufReader::new(file))?;
    tracing::debug!(
        path = %path.display(),
        steps = log.steps.len(),
        datasets = log.data.len(),
        "log loaded"
    );
    Ok(log)
}

pub(super) fn read<R: BufRead>(reader: R) -> Result<Log> {
    let mut lines = reader.lines();

    let steps = match lines.next() {
        None => return Ok(Log::default()),
        Some(first) => parse_steps(&first?)?,
    };

    let mut data = DatasetMap::new();
    let mut current: Option<String> = None;

    for (index, line) in lines.enumerate() {
        let line = line?;
        let line_no = index + 2;
        let mut tokens = line.split_whitespace();

        let Some(head) = tokens.next() else {
            continue;
        };
        let rest: Vec<&str> = tokens.collect();

        if rest.is_empty() {
            if line.starts_with(char::is_whitespace) {
                return Err(Error::parse(
                    line_no,
                    format!("metric '{head}' has no values"),
                ));
            }
            data.entry(head.to_owned()).or_default();
            current = Some(head.to_owned());
            continue;
        }

        let Some(dataset) = current.as_deref() else {
            return Err(Error::parse(
                line_no,
                format!("metric '{head}' appears before any dataset name"),
            ));
        };

        let values = rest
            .iter()
            .map(|token| {
                token.parse::<f64>().map_err(|_| {
                    Error::parse(line_no, format!("invalid value '{token}' for metric '{head}'"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        data.entry(dataset.to_owned())
            .or_default()
            .insert(head.to_owned(), values);
    }

    Ok(Log { steps, data })
}

fn parse_steps(line: &str) -> Result<Vec<i64>> {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some(STEPS_TOKEN) => {}
        Some(other) => {
            return Err(Error::parse(
                1,
                format!("expected '{STEPS_TOKEN}', found '{other}'"),
            ))
        }
        None => return Err(Error::parse(1, "missing steps line")),
    }

    tokens
        .map(|token| {
            token
                .parse::<i64>()
                .map_err(|_| Error::parse(1, format!("invalid step '{token}'")))
        })
        .collect()
}
