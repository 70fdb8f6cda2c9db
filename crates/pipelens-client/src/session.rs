// Project session: last fetched collection for one project/tool + current selection

use crate::error::Result;
use crate::source::{LogQuery, LogSource};
use pipelens_core::{AnalysisView, FilterSelection, Granularity, LogRecord};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ProjectSession<S> {
    source: S,
    project: String,
    tool: String,
    selection: FilterSelection,
    granularity: Granularity,

    // replaced wholesale on each successful fetch
    logs: Arc<[LogRecord]>,
    fetched_with: Option<FilterSelection>,
}

impl<S: LogSource> ProjectSession<S> {
    pub fn new(source: S, project: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            source,
            project: project.into(),
            tool: tool.into(),
            selection: FilterSelection::default(),
            granularity: Granularity::default(),
            logs: Arc::from(Vec::new()),
            fetched_with: None,
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Current collection; cheap to clone
    pub fn logs(&self) -> Arc<[LogRecord]> {
        Arc::clone(&self.logs)
    }

    /// Selection forwarded with the fetch that produced `logs()`, `None` before the first
    /// successful refresh.
    pub fn fetched_selection(&self) -> Option<&FilterSelection> {
        self.fetched_with.as_ref()
    }

    /// Store a new selection. Does not refetch.
    ///
    /// The held collection was narrowed server-side by `fetched_selection()`, so a wider
    /// selection only shows the wider set after the next `refresh()`.
    pub fn set_selection(&mut self, selection: FilterSelection) {
        self.selection = selection;
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        self.granularity = granularity;
    }

    /// Fetch the project/tool logs with the selection forwarded server-side.
    /// On failure the previous collection is kept.
    pub async fn refresh(&mut self) -> Result<usize> {
        let query = LogQuery::new(&self.project, &self.tool).with_filters(&self.selection);
        match self.source.logs(&query).await {
            Ok(records) => {
                let count = records.len();
                self.logs = Arc::from(records);
                self.fetched_with = Some(self.selection.clone());
                info!(project = %self.project, tool = %self.tool, count, "session refreshed");
                Ok(count)
            }
            Err(e) => {
                warn!(project = %self.project, tool = %self.tool, error = %e, "refresh failed");
                Err(e)
            }
        }
    }

    /// Whether the held collection may be missing records the current selection allows
    pub fn needs_refresh(&self) -> bool {
        self.fetched_with.as_ref() != Some(&self.selection)
    }

    /// Recompute everything from the held collection
    pub fn view(&self) -> AnalysisView<'_> {
        debug!(records = self.logs.len(), "recomputing analysis view");
        AnalysisView::compute(&self.logs, &self.selection, self.granularity)
    }
}
