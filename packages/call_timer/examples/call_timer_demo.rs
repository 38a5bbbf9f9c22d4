//! Profiling a request handler that talks to an HTTP service and a key-value store.
//!
//! The "remote" calls are simulated with sleeps. Every call through the instrumented client
//! types is timed, grouped by category and reported at the end of the session.
//!
//! Run with: `cargo run --example call_timer_demo`

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use call_timer::{MethodKind, Session, Target};
use tracing::Level;

struct HttpClient;

impl HttpClient {
    fn get(&self, url: &str) -> u16 {
        thread::sleep(Duration::from_millis(120));

        if url.ends_with("/missing") { 404 } else { 200 }
    }
}

#[derive(Default)]
struct KeyValueStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore {
    fn set(&mut self, (key, value): (&str, &str)) {
        thread::sleep(Duration::from_millis(15));
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn get(&self, key: &str) -> Option<String> {
        thread::sleep(Duration::from_millis(10));
        self.entries.get(key).cloned()
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let http = Target::class("demo", "HttpClient", "http");
    let store = Target::class("demo", "KeyValueStore", "kv");

    let http_get = http.method("get", MethodKind::Instance, HttpClient::get);
    let store_set = store.method("set", MethodKind::Instance, KeyValueStore::set);
    let store_get = store.method("get", MethodKind::Instance, KeyValueStore::get);

    let session = Session::builder("Custom profiler demo").verbose(true).build();

    let active = session.begin();

    let client = HttpClient;
    let status = http_get.call_on(&client, "http://example.com");
    println!("status: {status}");

    let mut kv = KeyValueStore::default();
    store_set.call_on_mut(&mut kv, ("foo", "bar"));
    println!("foo = {:?}", store_get.call_on(&kv, "foo"));

    let status = http_get.call_on(&client, "http://example.com/missing");
    println!("status: {status}");

    // The report is logged by the session. It is also returned for further inspection.
    let report = active.finish();
    println!(
        "{} calls took {:.4}s in total",
        report.calls().iter().map(|row| row.calls()).sum::<u64>(),
        report.total().as_secs_f64()
    );
}
