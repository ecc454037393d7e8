//! A parallel word-frequency analyzer over fixed byte-range segments.
//!
//! An input is split into one contiguous byte range per worker. Each worker
//! reads its range with a positioned read, tokenizes it, and counts every
//! qualifying token into a single shared frequency table. Once all workers
//! have been joined, the table is reduced to a top-K report.
//!
//! # Features
//!
//! - Exact partitioning: segments are disjoint and cover the whole input
//! - One coarse-grained lock around each find-or-increment
//! - Pluggable table storage (linear scan or hashed index)
//! - Boundary realignment so words straddling segments are counted once
//! - Deterministic top-K: count descending, then word ascending
//! - Per-worker failure and short-read reporting
//!
//! # Example
//!
//! ```no_run
//! use segfreq::Analyzer;
//!
//! let analyzer = Analyzer::builder().workers(4).build()?;
//! let report = analyzer.run_path("book.txt")?;
//! for entry in &report.top {
//!     println!("{} {}", entry.word, entry.count);
//! }
//! # Ok::<(), segfreq::AnalyzerError>(())
//! ```

pub mod analyzer;
pub mod error;
pub mod metrics;
pub mod partition;
pub mod source;
pub mod store;
pub mod table;
pub mod tokenizer;
pub mod topk;
pub mod worker;

// Re-exports for convenience
pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerConfig, Report, WorkerFailure};
pub use error::{AnalyzerError, Result};
pub use metrics::{MetricsSnapshot, RunMetrics};
pub use partition::{partition, Segment};
pub use source::{ByteSource, FileSource};
pub use store::{FrequencyStore, HashedStore, Increment, LinearStore, StoreKind, WordEntry};
pub use table::FrequencyTable;
pub use tokenizer::{is_delimiter, tokens, Word};
pub use topk::select_top_k;
pub use worker::{BoundaryPolicy, WorkerContext, WorkerReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
