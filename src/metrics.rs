use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Percentiles over the wall time of finished workers
#[derive(Debug, Default)]
pub struct WorkerTimes {
    nanos: Mutex<Vec<u64>>,
}

impl WorkerTimes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one worker's elapsed time
    pub fn record(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.lock().push(nanos);
    }

    /// Median worker time in microseconds
    pub fn p50_us(&self) -> f64 {
        self.percentile(0.50)
    }

    /// Slowest-worker-leaning percentile in microseconds
    pub fn p99_us(&self) -> f64 {
        self.percentile(0.99)
    }

    fn percentile(&self, p: f64) -> f64 {
        let mut sorted = self.nanos.lock().clone();
        if sorted.is_empty() {
            return 0.0;
        }
        sorted.sort_unstable();

        let idx = ((sorted.len() as f64 * p).ceil() as usize).saturating_sub(1);
        sorted[idx] as f64 / 1000.0
    }

    pub fn count(&self) -> usize {
        self.nanos.lock().len()
    }
}

/// Counters shared by all workers of one run.
///
/// Workers tally locally and publish once when they finish.
#[derive(Debug)]
pub struct RunMetrics {
    bytes_read: AtomicU64,
    tokens_scanned: AtomicU64,
    tokens_counted: AtomicU64,
    short_reads: AtomicU64,
    failed_workers: AtomicU64,
    worker_times: WorkerTimes,
    start_time: Instant,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            bytes_read: AtomicU64::new(0),
            tokens_scanned: AtomicU64::new(0),
            tokens_counted: AtomicU64::new(0),
            short_reads: AtomicU64::new(0),
            failed_workers: AtomicU64::new(0),
            worker_times: WorkerTimes::new(),
            start_time: Instant::now(),
        }
    }

    pub fn record_bytes_read(&self, bytes: u64) {
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_tokens(&self, scanned: u64, counted: u64) {
        self.tokens_scanned.fetch_add(scanned, Ordering::Relaxed);
        self.tokens_counted.fetch_add(counted, Ordering::Relaxed);
    }

    pub fn record_short_read(&self) {
        self.short_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_workers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_worker_time(&self, elapsed: Duration) {
        self.worker_times.record(elapsed);
    }

    pub fn total_bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    pub fn total_tokens_scanned(&self) -> u64 {
        self.tokens_scanned.load(Ordering::Relaxed)
    }

    pub fn total_tokens_counted(&self) -> u64 {
        self.tokens_counted.load(Ordering::Relaxed)
    }

    pub fn total_short_reads(&self) -> u64 {
        self.short_reads.load(Ordering::Relaxed)
    }

    pub fn total_failures(&self) -> u64 {
        self.failed_workers.load(Ordering::Relaxed)
    }

    /// Bytes read per second since the metrics were created
    pub fn throughput_bps(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed == 0.0 {
            0.0
        } else {
            self.total_bytes_read() as f64 / elapsed
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bytes_read: self.total_bytes_read(),
            tokens_scanned: self.total_tokens_scanned(),
            tokens_counted: self.total_tokens_counted(),
            short_reads: self.total_short_reads(),
            failed_workers: self.total_failures(),
            throughput_bps: self.throughput_bps(),
            worker_p50_us: self.worker_times.p50_us(),
            worker_p99_us: self.worker_times.p99_us(),
            elapsed: self.start_time.elapsed(),
        }
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of run metrics at a point in time
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub bytes_read: u64,
    pub tokens_scanned: u64,
    pub tokens_counted: u64,
    pub short_reads: u64,
    pub failed_workers: u64,
    pub throughput_bps: f64,
    pub worker_p50_us: f64,
    pub worker_p99_us: f64,
    pub elapsed: Duration,
}

impl MetricsSnapshot {
    /// Format metrics as a human-readable string
    pub fn format(&self) -> String {
        format!(
            "Read: {} bytes, Tokens: {} scanned / {} counted, Short reads: {}, \
             Failed workers: {}, Throughput: {:.2} MB/s, Worker P50: {:.2}µs, P99: {:.2}µs",
            self.bytes_read,
            self.tokens_scanned,
            self.tokens_counted,
            self.short_reads,
            self.failed_workers,
            self.throughput_bps / 1_000_000.0,
            self.worker_p50_us,
            self.worker_p99_us,
        )
    }
}
