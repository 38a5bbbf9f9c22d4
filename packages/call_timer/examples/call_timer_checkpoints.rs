//! Finding the slow part of a function with checkpoints.
//!
//! Run with: `cargo run --example call_timer_checkpoints`

use std::hint::black_box;

use call_timer::{checkpoint, checkpointed, profile_checkpoints};
use tracing::Level;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // Scoped form: statistics are logged when the region ends.
    let checksum = profile_checkpoints("checksum", |probe| {
        let data: Vec<u64> = (0..200_000).collect();
        checkpoint!(probe);

        let mut checksum = 0_u64;
        for chunk in data.chunks(1000) {
            checksum = checksum.wrapping_add(chunk.iter().copied().fold(0, u64::wrapping_add));
            checkpoint!(probe);
        }

        black_box(checksum)
    });
    println!("checksum: {checksum}");

    // Wrapping form: every call is its own region.
    let render = checkpointed("render", |probe, rows: usize| {
        let lines: Vec<String> = (0..rows).map(|row| format!("row {row}")).collect();
        probe.mark("format");

        let text = lines.join("\n");
        probe.mark("join");

        text.len()
    });

    println!("rendered {} bytes", render(1000));
    println!("rendered {} bytes", render(10_000));
}
