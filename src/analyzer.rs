use crate::error::{AnalyzerError, Result};
use crate::metrics::{MetricsSnapshot, RunMetrics};
use crate::partition::{partition, Segment};
use crate::source::{ByteSource, FileSource};
use crate::store::{StoreKind, WordEntry};
use crate::table::{FrequencyTable, DEFAULT_CAPACITY};
use crate::tokenizer::DEFAULT_MIN_WORD_LEN;
use crate::topk::{select_top_k, DEFAULT_TOP_K};
use crate::worker::{self, BoundaryPolicy, WorkerContext, WorkerReport};
use crossbeam::thread::{Scope, ScopedJoinHandle};
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Validated settings for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzerConfig {
    pub workers: usize,
    pub min_word_len: usize,
    pub capacity: usize,
    pub top_k: usize,
    pub boundary: BoundaryPolicy,
    pub store: StoreKind,
}

/// Builder for constructing analyzers
#[derive(Debug, Clone)]
pub struct AnalyzerBuilder {
    workers: Option<usize>,
    min_word_len: usize,
    capacity: usize,
    top_k: usize,
    boundary: BoundaryPolicy,
    store: StoreKind,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            workers: None,
            min_word_len: DEFAULT_MIN_WORD_LEN,
            capacity: DEFAULT_CAPACITY,
            top_k: DEFAULT_TOP_K,
            boundary: BoundaryPolicy::default(),
            store: StoreKind::default(),
        }
    }

    /// Number of workers, one per segment
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Minimum token length in characters
    pub fn min_word_len(mut self, len: usize) -> Self {
        self.min_word_len = len;
        self
    }

    /// Maximum number of distinct words in the table
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Number of entries in the report
    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn store(mut self, store: StoreKind) -> Self {
        self.store = store;
        self
    }

    /// Build the analyzer
    pub fn build(self) -> Result<Analyzer> {
        let workers = self
            .workers
            .ok_or_else(|| AnalyzerError::Config("worker count is required".into()))?;
        if workers == 0 {
            return Err(AnalyzerError::Config(
                "worker count must be at least 1".into(),
            ));
        }
        if self.min_word_len == 0 {
            return Err(AnalyzerError::Config(
                "minimum word length must be at least 1".into(),
            ));
        }
        if self.capacity == 0 {
            return Err(AnalyzerError::Config(
                "table capacity must be at least 1".into(),
            ));
        }

        Ok(Analyzer {
            config: AnalyzerConfig {
                workers,
                min_word_len: self.min_word_len,
                capacity: self.capacity,
                top_k: self.top_k,
                boundary: self.boundary,
                store: self.store,
            },
        })
    }
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A worker that exited without contributing
#[derive(Debug, Clone, Serialize)]
pub struct WorkerFailure {
    pub id: usize,
    pub segment: Segment,
    pub error: String,
}

/// Result of one run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Highest-count entries, count descending then word ascending
    pub top: Vec<WordEntry>,
    /// Time spent partitioning, running workers and selecting
    pub elapsed: Duration,
    pub total_bytes: u64,
    pub bytes_processed: u64,
    pub distinct_words: usize,
    /// Distinct words dropped because the table was full
    pub rejected_words: usize,
    pub rejected_occurrences: u64,
    pub workers: Vec<WorkerReport>,
    pub failures: Vec<WorkerFailure>,
    pub metrics: MetricsSnapshot,
}

impl Report {
    /// Whether some part of the input was not counted
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty() || self.bytes_processed < self.total_bytes
    }
}

/// Handle to a launched worker
pub struct TaskHandle<'scope> {
    id: usize,
    segment: Segment,
    inner: Option<ScopedJoinHandle<'scope, Result<WorkerReport>>>,
    spawn_error: Option<String>,
}

/// Outcome of joining a worker
#[derive(Debug)]
pub enum TaskStatus {
    Completed(WorkerReport),
    Failed(WorkerFailure),
}

/// Start `ctx` on its own thread inside `scope`
fn launch<'env, 'scope, S: ByteSource + ?Sized>(
    scope: &'scope Scope<'env>,
    ctx: WorkerContext,
    source: &'env S,
    file_size: u64,
    table: &'env FrequencyTable,
    metrics: &'env RunMetrics,
) -> TaskHandle<'scope> {
    let id = ctx.id;
    let segment = ctx.segment;
    let spawned = scope
        .builder()
        .name(format!("segment-worker-{}", id))
        .spawn(move |_| worker::run(&ctx, source, file_size, table, metrics));

    match spawned {
        Ok(handle) => TaskHandle {
            id,
            segment,
            inner: Some(handle),
            spawn_error: None,
        },
        Err(e) => TaskHandle {
            id,
            segment,
            inner: None,
            spawn_error: Some(AnalyzerError::Thread(e.to_string()).to_string()),
        },
    }
}

/// Block until the worker behind `handle` finishes
fn join(handle: TaskHandle<'_>) -> TaskStatus {
    let failure = |error: String| {
        TaskStatus::Failed(WorkerFailure {
            id: handle.id,
            segment: handle.segment,
            error,
        })
    };

    match handle.inner {
        Some(inner) => match inner.join() {
            Ok(Ok(report)) => TaskStatus::Completed(report),
            Ok(Err(e)) => failure(e.to_string()),
            Err(_) => failure(AnalyzerError::Thread("worker panicked".into()).to_string()),
        },
        None => failure(handle.spawn_error.unwrap_or_default()),
    }
}

/// Runs one worker per segment against a shared frequency table
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Open `path` and analyze it
    pub fn run_path(&self, path: impl AsRef<Path>) -> Result<Report> {
        let source = FileSource::open(path)?;
        let file_size = source.file_size()?;
        debug!(path = %source.path().display(), bytes = file_size, "Opened input");
        self.run_sized(&source, file_size)
    }

    /// Analyze `source`
    pub fn run<S: ByteSource + ?Sized>(&self, source: &S) -> Result<Report> {
        let file_size = source
            .size()
            .map_err(|e| AnalyzerError::SourceUnavailable {
                path: "<source>".into(),
                source: e,
            })?;
        self.run_sized(source, file_size)
    }

    fn run_sized<S: ByteSource + ?Sized>(&self, source: &S, file_size: u64) -> Result<Report> {
        let started = Instant::now();
        let segments = partition(file_size, self.config.workers)?;
        let table = FrequencyTable::with_kind(self.config.store, self.config.capacity);
        let metrics = RunMetrics::new();

        let statuses = crossbeam::thread::scope(|s| {
            let handles: Vec<_> = segments
                .iter()
                .enumerate()
                .map(|(id, &segment)| {
                    let ctx = WorkerContext {
                        id,
                        segment,
                        min_word_len: self.config.min_word_len,
                        boundary: self.config.boundary,
                    };
                    launch(s, ctx, source, file_size, &table, &metrics)
                })
                .collect();

            // Every worker is joined, including ones that failed early
            handles.into_iter().map(join).collect::<Vec<_>>()
        })
        .map_err(|_| AnalyzerError::Thread("worker scope panicked".into()))?;

        let mut workers = Vec::with_capacity(statuses.len());
        let mut failures = Vec::new();
        for status in statuses {
            match status {
                TaskStatus::Completed(report) => workers.push(report),
                TaskStatus::Failed(failure) => {
                    warn!(worker = failure.id, error = %failure.error, "Worker failed");
                    metrics.record_failure();
                    failures.push(failure);
                }
            }
        }

        let top = select_top_k(table.snapshot(), self.config.top_k);
        let elapsed = started.elapsed();

        let report = Report {
            top,
            elapsed,
            total_bytes: file_size,
            bytes_processed: workers.iter().map(|w| w.bytes_processed).sum(),
            distinct_words: table.len(),
            rejected_words: table.rejected_words(),
            rejected_occurrences: table.rejected_occurrences(),
            workers,
            failures,
            metrics: metrics.snapshot(),
        };

        info!(
            workers = self.config.workers,
            store = %table.store_name(),
            distinct = report.distinct_words,
            rejected = report.rejected_words,
            processed = report.bytes_processed,
            total = report.total_bytes,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Analysis complete"
        );

        Ok(report)
    }
}
