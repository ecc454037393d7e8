use crate::error::{AnalyzerError, Result};
use serde::Serialize;

/// A contiguous byte range of the input owned by exactly one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub start: u64,
    pub length: u64,
}

impl Segment {
    /// Exclusive end offset
    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Split `file_size` bytes into `workers` disjoint segments.
///
/// Every segment but the last is `file_size / workers` bytes long. The last
/// segment also takes the `file_size % workers` trailing bytes, so the
/// segments cover `[0, file_size)` exactly.
pub fn partition(file_size: u64, workers: usize) -> Result<Vec<Segment>> {
    if workers == 0 {
        return Err(AnalyzerError::Config(
            "worker count must be at least 1".into(),
        ));
    }
    let count = workers as u64;
    if count > file_size {
        return Err(AnalyzerError::Config(format!(
            "worker count {} exceeds input size of {} bytes",
            workers, file_size
        )));
    }

    let segment_size = file_size / count;
    let mut segments: Vec<Segment> = (0..count)
        .map(|i| Segment {
            start: i * segment_size,
            length: segment_size,
        })
        .collect();

    if let Some(last) = segments.last_mut() {
        last.length = file_size - last.start;
    }

    Ok(segments)
}
