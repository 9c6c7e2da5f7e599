//! Run/dataset selection for collection queries

/// Predicate that accepts every name.
#[must_use]
pub fn accept_all(_name: &str) -> bool {
    true
}

/// Mapper that returns the name unchanged.
#[must_use]
pub fn identity(name: &str) -> String {
    name.to_owned()
}

type Predicate<'f> = Box<dyn Fn(&str) -> bool + 'f>;
type Mapper<'f> = Box<dyn Fn(&str) -> String + 'f>;

/// Which runs and datasets a query looks at, and how they are bucketed.
///
/// - `basename` maps a log name to its group key (runs sharing a basename
///   are aggregated together)
/// - `model_filter` decides which log names take part
/// - `dataset_filter` decides which dataset names take part
/// - `dataname` maps a dataset name to its bucket key inside a group
///
/// Every part defaults to [`accept_all`] / [`identity`].
///
/// ```rust
/// use trainlog::collection::Selection;
///
/// let selection = Selection::new()
///     .basename(|name| name.split('_').next().unwrap_or(name).to_string())
///     .restrict_data(|dataset| dataset != "train");
///
/// assert_eq!(selection.basename_of("lstm_run2"), "lstm");
/// assert!(!selection.accepts_dataset("train"));
/// assert!(selection.accepts_model("anything"));
/// ```
pub struct Selection<'f> {
    basename: Mapper<'f>,
    model_filter: Predicate<'f>,
    dataset_filter: Predicate<'f>,
    dataname: Mapper<'f>,
}

impl Default for Selection<'_> {
    fn default() -> Self {
        Self {
            basename: Box::new(identity),
            model_filter: Box::new(accept_all),
            dataset_filter: Box::new(accept_all),
            dataname: Box::new(identity),
        }
    }
}

impl<'f> Selection<'f> {
    /// Select everything, grouping each log by its own name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log name → group key mapper.
    #[must_use]
    pub fn basename(mut self, f: impl Fn(&str) -> String + 'f) -> Self {
        self.basename = Box::new(f);
        self
    }

    /// Only include logs whose name passes `f`.
    #[must_use]
    pub fn restrict_model(mut self, f: impl Fn(&str) -> bool + 'f) -> Self {
        self.model_filter = Box::new(f);
        self
    }

    /// Only include datasets whose name passes `f`.
    #[must_use]
    pub fn restrict_data(mut self, f: impl Fn(&str) -> bool + 'f) -> Self {
        self.dataset_filter = Box::new(f);
        self
    }

    /// Set the dataset name → bucket key mapper.
    #[must_use]
    pub fn data_name(mut self, f: impl Fn(&str) -> String + 'f) -> Self {
        self.dataname = Box::new(f);
        self
    }

    /// Group key for a log name.
    #[must_use]
    pub fn basename_of(&self, log_name: &str) -> String {
        (self.basename)(log_name)
    }

    /// Bucket key for a dataset name.
    #[must_use]
    pub fn dataname_of(&self, dataset: &str) -> String {
        (self.dataname)(dataset)
    }

    /// Whether a log takes part.
    #[must_use]
    pub fn accepts_model(&self, log_name: &str) -> bool {
        (self.model_filter)(log_name)
    }

    /// Whether a dataset takes part.
    #[must_use]
    pub fn accepts_dataset(&self, dataset: &str) -> bool {
        (self.dataset_filter)(dataset)
    }
}

impl std::fmt::Debug for Selection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection").finish_non_exhaustive()
    }
}
