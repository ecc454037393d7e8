//! Processing of a single segment.
//!
//! A worker reads its own byte window into a private buffer, tokenizes the
//! part of it that it owns, and performs one locked increment per
//! qualifying token. It never sees another worker's buffer.

use crate::error::{AnalyzerError, Result};
use crate::metrics::RunMetrics;
use crate::partition::Segment;
use crate::source::{read_full_at, ByteSource};
use crate::table::FrequencyTable;
use crate::tokenizer::{is_delimiter, qualifies, tokens, MAX_WORD_CHARS};
use serde::Serialize;
use std::borrow::Cow;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Bytes read before a segment to find the character preceding its first byte
const LOOKBEHIND: u64 = 4;

/// Bytes read past a segment to finish its last word
const LOOKAHEAD: u64 = ((MAX_WORD_CHARS + 1) * 4) as u64;

/// How words that straddle segment boundaries are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// A word belongs to the segment holding its first byte. The owner reads
    /// past its end to finish the word; the next segment skips the fragment.
    #[default]
    Realign,
    /// Each segment is tokenized in isolation, so a straddling word is split
    /// into two fragments that are counted (or discarded) independently.
    Approximate,
}

impl FromStr for BoundaryPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "realign" => Ok(BoundaryPolicy::Realign),
            "approximate" => Ok(BoundaryPolicy::Approximate),
            other => Err(format!(
                "unknown boundary policy '{}', expected realign or approximate",
                other
            )),
        }
    }
}

/// Private state of one worker
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub id: usize,
    pub segment: Segment,
    pub min_word_len: usize,
    pub boundary: BoundaryPolicy,
}

/// What a finished worker contributed
#[derive(Debug, Clone, Serialize)]
pub struct WorkerReport {
    pub id: usize,
    pub segment: Segment,
    /// Bytes of the segment that were actually read
    pub bytes_processed: u64,
    pub short_read: bool,
    pub tokens_scanned: u64,
    /// Qualifying tokens submitted to the table
    pub tokens_counted: u64,
    pub elapsed: Duration,
}

/// Byte range a worker reads, which may extend past its segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    offset: u64,
    len: u64,
}

fn plan_window(segment: Segment, file_size: u64, policy: BoundaryPolicy) -> Window {
    match policy {
        BoundaryPolicy::Approximate => Window {
            offset: segment.start,
            len: segment.length,
        },
        BoundaryPolicy::Realign => {
            let offset = segment.start.saturating_sub(LOOKBEHIND);
            let end = segment.end().saturating_add(LOOKAHEAD).min(file_size.max(segment.end()));
            Window {
                offset,
                len: end - offset,
            }
        }
    }
}

fn allocate(worker: usize, len: u64) -> Result<Vec<u8>> {
    let err = || AnalyzerError::Allocation { worker, bytes: len };
    let size = usize::try_from(len).map_err(|_| err())?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(size).map_err(|_| err())?;
    buf.resize(size, 0);
    Ok(buf)
}

/// Best-effort read of bytes next to the segment, returning how many were obtained
fn read_edge<S: ByteSource + ?Sized>(
    worker: usize,
    source: &S,
    buf: &mut [u8],
    offset: u64,
    edge: &str,
) -> usize {
    if buf.is_empty() {
        return 0;
    }
    match read_full_at(source, buf, offset) {
        Ok(n) => n,
        Err(e) => {
            warn!(worker, offset, edge, error = %e, "Boundary read failed, treating edge as unaligned");
            0
        }
    }
}

/// Advance `idx` past UTF-8 continuation bytes, at most three
fn align_to_char(buf: &[u8], mut idx: usize) -> usize {
    let mut steps = 0;
    while idx < buf.len() && steps < 3 && buf[idx] & 0xC0 == 0x80 {
        idx += 1;
        steps += 1;
    }
    idx
}

/// The text a worker tokenizes, given its buffer and the segment's position in it.
///
/// `body_start..body_end` is the segment inside `buf`. Bytes before it are
/// lookbehind and bytes after it are lookahead; both are only consulted
/// under [`BoundaryPolicy::Realign`].
fn owned_text(buf: &[u8], body_start: usize, body_end: usize, policy: BoundaryPolicy) -> Cow<'_, str> {
    if policy == BoundaryPolicy::Approximate {
        return String::from_utf8_lossy(&buf[body_start..body_end]);
    }

    let body_start = align_to_char(buf, body_start);
    let body_end = align_to_char(buf, body_end).max(body_start);

    let preceded_by_word = body_start > 0
        && String::from_utf8_lossy(&buf[..body_start])
            .chars()
            .next_back()
            .is_some_and(|c| !is_delimiter(c));

    let body = String::from_utf8_lossy(&buf[body_start..body_end]);
    let owned: &str = &body;
    let skip = if preceded_by_word {
        owned.find(is_delimiter).unwrap_or(owned.len())
    } else {
        0
    };
    let ends_in_word = owned[skip..]
        .chars()
        .next_back()
        .is_some_and(|c| !is_delimiter(c));

    if skip == 0 && !ends_in_word {
        return body;
    }

    let mut text = owned[skip..].to_owned();
    if ends_in_word {
        let tail = String::from_utf8_lossy(&buf[body_end..]);
        text.push_str(tail.split(is_delimiter).next().unwrap_or(""));
    }
    Cow::Owned(text)
}

/// Process one segment end to end.
///
/// A failed read of the segment itself, or a failed allocation, abandons the
/// segment before any token reaches the table. A short read is logged and the
/// bytes obtained are processed. Failing to read the bytes around the segment
/// only affects how its first and last words are resolved.
pub fn run<S: ByteSource + ?Sized>(
    ctx: &WorkerContext,
    source: &S,
    file_size: u64,
    table: &FrequencyTable,
    metrics: &RunMetrics,
) -> Result<WorkerReport> {
    let started = Instant::now();
    debug!(
        worker = ctx.id,
        start = ctx.segment.start,
        length = ctx.segment.length,
        "Worker started"
    );

    if ctx.segment.is_empty() {
        return Ok(WorkerReport {
            id: ctx.id,
            segment: ctx.segment,
            bytes_processed: 0,
            short_read: false,
            tokens_scanned: 0,
            tokens_counted: 0,
            elapsed: started.elapsed(),
        });
    }

    let window = plan_window(ctx.segment, file_size, ctx.boundary);
    let mut buf = allocate(ctx.id, window.len)?;
    let head_len = (ctx.segment.start - window.offset) as usize;
    let body_len = ctx.segment.length as usize;
    let (head, rest) = buf.split_at_mut(head_len);
    let (body, tail) = rest.split_at_mut(body_len);

    let filled = read_full_at(source, body, ctx.segment.start).map_err(|source| {
        warn!(worker = ctx.id, offset = ctx.segment.start, error = %source, "Segment read failed");
        AnalyzerError::Read {
            worker: ctx.id,
            offset: ctx.segment.start,
            source,
        }
    })?;
    let bytes_processed = filled as u64;
    let short_read = filled < body_len;
    if short_read {
        warn!(
            worker = ctx.id,
            expected = ctx.segment.length,
            obtained = bytes_processed,
            "Short read, processing the bytes obtained"
        );
        metrics.record_short_read();
    }

    // Lookbehind and lookahead only refine the edges. When they cannot be
    // read in full, that edge is tokenized as if the segment stood alone.
    let head_used = match read_edge(ctx.id, source, head, window.offset, "lookbehind") {
        n if n == head_len => head_len,
        _ => 0,
    };
    let tail_used = if short_read {
        0
    } else {
        read_edge(ctx.id, source, tail, ctx.segment.end(), "lookahead")
    };

    let view = &buf[head_len - head_used..head_len + filled + tail_used];
    let body_start = head_used;
    let body_end = head_used + filled;

    let text = owned_text(view, body_start, body_end, ctx.boundary);
    let mut tokens_scanned = 0u64;
    let mut tokens_counted = 0u64;
    for token in tokens(&text) {
        tokens_scanned += 1;
        if qualifies(token, ctx.min_word_len) {
            table.increment(token);
            tokens_counted += 1;
        }
    }

    let elapsed = started.elapsed();
    metrics.record_bytes_read(bytes_processed);
    metrics.record_tokens(tokens_scanned, tokens_counted);
    metrics.record_worker_time(elapsed);
    debug!(
        worker = ctx.id,
        bytes = bytes_processed,
        tokens = tokens_scanned,
        counted = tokens_counted,
        "Worker finished"
    );

    Ok(WorkerReport {
        id: ctx.id,
        segment: ctx.segment,
        bytes_processed,
        short_read,
        tokens_scanned,
        tokens_counted,
        elapsed,
    })
}
