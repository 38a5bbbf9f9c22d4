//! Combining reports of sessions that ran on different threads.
//!
//! Each worker thread runs its own session. Their reports are merged into one overview.
//!
//! Run with: `cargo run --example call_timer_threaded_reports`

use std::hint::black_box;
use std::io;
use std::sync::Arc;
use std::thread;

use call_timer::{Report, Session, WriterSink, instrument};
use tracing::Level;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let hash = Arc::new(instrument("worker.hash", "cpu", |input: u64| {
        (0..10_000_u64).fold(input, |acc, x| acc.rotate_left(5) ^ x)
    }));

    let handles: Vec<_> = ["worker-1", "worker-2"]
        .into_iter()
        .map(|name| {
            let hash = Arc::clone(&hash);

            thread::spawn(move || {
                // Per-thread reports are only printed once merged.
                let session = Session::builder(name)
                    .sink(WriterSink::new(io::sink()))
                    .build();

                let active = session.begin();

                for seed in 0..100 {
                    black_box(hash.call(seed));
                }

                active.finish()
            })
        })
        .collect();

    let reports: Vec<Report> = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker threads do not panic"))
        .collect();

    let merged = reports
        .iter()
        .skip(1)
        .fold(reports.first().cloned().expect("two workers were started"), |acc, report| {
            Report::merge(&acc, report)
        });

    merged.print_to_stdout();
}
