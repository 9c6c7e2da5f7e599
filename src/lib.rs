//! # trainlog: training-metric logs and cross-run analysis
//!
//! trainlog records scalar metrics during model training, stores them in a
//! plain text format and answers questions across many runs: which model
//! configuration peaks highest on average, what the mean learning curve of
//! a group of runs looks like.
//!
//! ## Components
//!
//! - [`log::Log`]: dataset → metric → values, plus checkpoint steps
//! - [`collection::LogCollection`]: named logs loaded from files or
//!   directory trees, with grouping, average-of-maxima and ranking queries
//! - [`plot`]: backend-neutral charts and an SVG renderer
//!
//! ## Example
//!
//! ```rust,no_run
//! use trainlog::collection::{LogCollection, Selection};
//!
//! let mut collection = LogCollection::new();
//! collection.add_log_from_directory("models/", ".log", None)?;
//!
//! let best = collection.find_highest_average("seq_acc", &Selection::new())?;
//! for (model, datasets) in &best {
//!     println!("{model}: {datasets:?}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod collection;
pub mod error;
pub mod log;
pub mod plot;
pub mod topk;

pub use collection::{LogCollection, Selection};
pub use error::{Error, Result};
pub use log::{Log, Recordable};
