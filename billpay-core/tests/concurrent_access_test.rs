//! Concurrency tests
//!
//! Parsing is shared-nothing apart from the compiled pattern catalog, and the
//! record store serializes access to its connection. These tests hammer both
//! from several threads at once.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;
use chrono::{DateTime, Utc};
use tempfile::TempDir;

use billpay_core::adapters::duckdb::DuckDbRepository;
use billpay_core::services::IngestService;
use billpay_core::{parse, Family, Provider, Record, RecordStore};

/// Number of concurrent threads for stress tests.
const THREAD_COUNT: usize = 8;

/// Number of iterations per thread
const ITERATIONS_PER_THREAD: usize = 25;

const SAMPLES: [&str; 4] = [
    "BREB Prepaid Token... Meter No: 12345678 Token: 1234-5678-9012-3456-7890 SquNo: 1 Enrg Cost: 500.00 Tk Meter Rent: 10.00 Tk Demand Charge: 5.00 Tk VAT: 25.75 Tk Rebate: -2.00 Tk Vending Amt: 538.75 Tk Trx ID: ABC123",
    "bKash: TrxID ABC12345 confirmed. Tk 500.00 sent to 01712345678",
    "Nagad: Money Received. Amount: Tk 1,250.50 Sender: 01911223344 TxnID: 7A1B2C3D",
    "Hello, your package has shipped.",
];

/// Parse with the timestamp zeroed so results compare by content
fn parse_untimed(sms: &str) -> Option<Record> {
    parse(sms).map(|mut record| {
        record.occurred_at = DateTime::<Utc>::default();
        record
    })
}

/// Test: many threads parsing the same inputs get identical results
/// to a single-threaded run.
#[test]
fn test_parallel_parsing_matches_sequential() {
    let expected: Vec<_> = SAMPLES.iter().map(|sms| parse_untimed(sms)).collect();
    let expected = Arc::new(expected);
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let mismatches = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let expected = Arc::clone(&expected);
            let barrier = Arc::clone(&barrier);
            let mismatches = Arc::clone(&mismatches);

            thread::spawn(move || {
                barrier.wait();
                for i in 0..ITERATIONS_PER_THREAD {
                    let index = (thread_id + i) % SAMPLES.len();
                    let actual = parse_untimed(SAMPLES[index]);
                    if actual != expected[index] {
                        eprintln!("Thread {}: mismatch on sample {}", thread_id, index);
                        mismatches.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    println!(
        "Parsed {} messages in {:?}",
        THREAD_COUNT * ITERATIONS_PER_THREAD,
        start.elapsed()
    );

    assert_eq!(mismatches.load(Ordering::SeqCst), 0);
}

/// Test: one shared store written and read from many threads.
#[test]
fn test_concurrent_ingest_into_shared_store() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("concurrent.duckdb");
    let repo = Arc::new(DuckDbRepository::new(&db_path).unwrap());
    repo.ensure_schema().unwrap();

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let error_count = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|thread_id| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            let error_count = Arc::clone(&error_count);

            thread::spawn(move || {
                let ingest = IngestService::new(repo.clone());
                barrier.wait();

                for i in 0..ITERATIONS_PER_THREAD {
                    let sms = SAMPLES[i % SAMPLES.len()];
                    if let Err(e) = ingest.ingest(sms) {
                        eprintln!("Thread {}: write error: {}", thread_id, e);
                        error_count.fetch_add(1, Ordering::SeqCst);
                    }
                    if let Err(e) = repo.list_records_by_family(Family::MobilePayment) {
                        eprintln!("Thread {}: read error: {}", thread_id, e);
                        error_count.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(error_count.load(Ordering::SeqCst), 0);

    // Every fourth sample is unrecognized and never stored
    let per_thread = (0..ITERATIONS_PER_THREAD)
        .filter(|i| i % SAMPLES.len() != SAMPLES.len() - 1)
        .count();
    let expected = (THREAD_COUNT * per_thread) as i64;
    assert_eq!(repo.count_records().unwrap(), expected);

    let bkash = repo.list_records_by_provider(Provider::Bkash).unwrap();
    let electricity = repo.list_records_by_family(Family::ElectricityToken).unwrap();
    assert!(!bkash.is_empty());
    assert!(!electricity.is_empty());
    assert!(bkash.iter().all(|s| s.record.amount.to_string() == "500.00"));
}
