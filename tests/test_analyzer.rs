use segfreq::{
    Analyzer, AnalyzerError, BoundaryPolicy, ByteSource, FrequencyTable, StoreKind, WordEntry,
};
use std::io::{self, Write};
use std::thread;

fn pairs(top: &[WordEntry]) -> Vec<(&str, u64)> {
    top.iter().map(|e| (e.word.as_str(), e.count)).collect()
}

/// Fails every read that touches `[fail_from, ..)`
struct FlakySource {
    data: Vec<u8>,
    fail_from: u64,
}

impl ByteSource for FlakySource {
    fn size(&self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if offset + buf.len() as u64 > self.fail_from {
            return Err(io::Error::new(io::ErrorKind::Other, "bad sector"));
        }
        self.data.read_at(buf, offset)
    }
}

#[test]
fn test_short_words_only_gives_empty_result() {
    let data = b"alpha alpha beta beta beta gamma".to_vec();
    for workers in [1, 2, 4] {
        let report = Analyzer::builder()
            .workers(workers)
            .build()
            .expect("Build failed")
            .run(&data)
            .expect("Run failed");
        assert!(report.top.is_empty());
        assert_eq!(report.distinct_words, 0);
    }
}

#[test]
fn test_single_worker_scenario() {
    let data = b"elephant elephant giraffe crocodile elephant".to_vec();
    let report = Analyzer::builder()
        .workers(1)
        .build()
        .expect("Build failed")
        .run(&data)
        .expect("Run failed");

    assert_eq!(
        pairs(&report.top),
        vec![("elephant", 3), ("crocodile", 1), ("giraffe", 1)]
    );
}

#[test]
fn test_split_word_regression() {
    let data = b"abcdefgh abcdefgh".to_vec();

    let approximate = Analyzer::builder()
        .workers(3)
        .boundary(BoundaryPolicy::Approximate)
        .build()
        .expect("Build failed")
        .run(&data)
        .expect("Run failed");
    // The first occurrence is cut into "abcde" and "fgh", the second into "a" and "bcdefgh"
    assert_eq!(pairs(&approximate.top), vec![("bcdefgh", 1)]);

    let realigned = Analyzer::builder()
        .workers(3)
        .build()
        .expect("Build failed")
        .run(&data)
        .expect("Run failed");
    assert_eq!(pairs(&realigned.top), vec![("abcdefgh", 2)]);
}

#[test]
fn test_result_independent_of_worker_count_and_store() {
    let mut text = String::new();
    for i in 0..400 {
        text.push_str(&format!(
            "“Quotation{}” — elephants, crocodiles; giraffe{}! rhinoceros\n",
            i % 7,
            i % 13
        ));
    }
    let data = text.into_bytes();

    let baseline = Analyzer::builder()
        .workers(1)
        .top_k(50)
        .build()
        .expect("Build failed")
        .run(&data)
        .expect("Run failed");
    assert_eq!(baseline.top[0].count, 400);

    for store in [StoreKind::Linear, StoreKind::Hashed] {
        for workers in [2, 3, 5, 8, 16, 31] {
            let report = Analyzer::builder()
                .workers(workers)
                .top_k(50)
                .store(store)
                .build()
                .expect("Build failed")
                .run(&data)
                .expect("Run failed");
            assert_eq!(report.top, baseline.top, "{:?} with {} workers", store, workers);
        }
    }
}

#[test]
fn test_top_k_bounded() {
    let mut text = String::new();
    for i in 0..30 {
        for _ in 0..=i {
            text.push_str(&format!("wordnumber{:02} ", i));
        }
    }
    let data = text.into_bytes();

    let report = Analyzer::builder()
        .workers(4)
        .build()
        .expect("Build failed")
        .run(&data)
        .expect("Run failed");

    assert_eq!(report.top.len(), 10);
    assert_eq!(report.top[0].word.as_str(), "wordnumber29");
    assert_eq!(report.top[0].count, 30);
    assert!(report.top.windows(2).all(|w| w[0].count >= w[1].count));
    assert_eq!(report.distinct_words, 30);
}

#[test]
fn test_capacity_exhaustion_reported() {
    let text: String = (0..20).map(|i| format!("distinct{:02} ", i)).collect();
    let report = Analyzer::builder()
        .workers(1)
        .capacity(15)
        .build()
        .expect("Build failed")
        .run(&text.into_bytes())
        .expect("Run failed");

    assert_eq!(report.distinct_words, 15);
    assert_eq!(report.rejected_words, 5);
    assert_eq!(report.rejected_occurrences, 5);
}

#[test]
fn test_failed_worker_reported_as_partial() {
    let data = b"elephant elephant giraffe crocodile elephant rhinoceros".repeat(4);
    let source = FlakySource {
        fail_from: data.len() as u64 - 10,
        data,
    };

    let report = Analyzer::builder()
        .workers(4)
        .boundary(BoundaryPolicy::Approximate)
        .build()
        .expect("Build failed")
        .run(&source)
        .expect("Run failed");

    assert!(report.is_partial());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, 3);
    assert_eq!(report.workers.len(), 3);
    assert!(report.bytes_processed < report.total_bytes);
    assert_eq!(report.metrics.failed_workers, 1);
}

#[test]
fn test_failed_worker_does_not_spread_to_neighbor() {
    let data = b"elephant elephant giraffe crocodile elephant rhinoceros ".repeat(40);
    assert_eq!(data.len(), 2240);
    let source = FlakySource {
        fail_from: data.len() as u64 - 10,
        data,
    };

    let report = Analyzer::builder()
        .workers(8)
        .build()
        .expect("Build failed")
        .run(&source)
        .expect("Run failed");

    // Only the last segment [1960, 2240) touches the bad bytes; worker 6
    // loses its lookahead but keeps its own segment
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, 7);
    assert_eq!(report.workers.len(), 7);
    assert_eq!(report.bytes_processed, 1960);
    assert!(report.is_partial());
}

#[test]
fn test_file_input() {
    let mut tmp = tempfile::NamedTempFile::new().expect("Temp file failed");
    for _ in 0..100 {
        writeln!(tmp, "The quick brown foxes jumped over sleeping elephants.").unwrap();
    }
    tmp.flush().unwrap();

    let report = Analyzer::builder()
        .workers(7)
        .build()
        .expect("Build failed")
        .run_path(tmp.path())
        .expect("Run failed");

    assert_eq!(
        pairs(&report.top),
        vec![("elephants", 100), ("jumped", 100), ("sleeping", 100)]
    );
    assert!(!report.is_partial());
}

#[test]
fn test_missing_file() {
    let analyzer = Analyzer::builder().workers(2).build().expect("Build failed");
    let result = analyzer.run_path("/definitely/not/here.txt");
    assert!(matches!(result, Err(AnalyzerError::SourceUnavailable { .. })));
}

#[test]
fn test_shared_table_commutes() {
    const WORKERS: usize = 6;
    const PER_WORKER: u64 = 5_000;

    let table = FrequencyTable::default();
    thread::scope(|s| {
        for _ in 0..WORKERS {
            s.spawn(|| {
                for _ in 0..PER_WORKER {
                    table.increment("banana!");
                }
            });
        }
    });

    let entries = table.snapshot();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].count, WORKERS as u64 * PER_WORKER);
}
