//! Tests for the public report API: ordering, rendering, sinks and report policies.

use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use call_timer::{
    MethodKind, Report, ReportPolicy, Session, Target, TimerState, WriterSink, instrument,
    with_timer_state,
};

/// A writer whose contents stay reachable after it has been handed to a session.
#[derive(Clone, Debug, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn report_of(entries: &[(&str, &str, u64)]) -> Report {
    let mut state = TimerState::default();
    state.reset("api", false);

    for (name, category, millis) in entries {
        state.record(name, category, Duration::from_millis(*millis), "", "");
    }

    state.to_report()
}

#[test]
fn rows_sorted_by_total_descending() {
    let report = report_of(&[
        ("a.small", "a", 10),
        ("b.large", "b", 300),
        ("c.medium", "c", 50),
        ("b.other", "b", 5),
    ]);

    let categories: Vec<&str> = report
        .categories()
        .iter()
        .map(|row| row.category())
        .collect();
    assert_eq!(categories, ["b", "c", "a"]);

    let calls: Vec<&str> = report.calls().iter().map(|row| row.name()).collect();
    assert_eq!(calls, ["b.large", "c.medium", "a.small", "b.other"]);
}

#[test]
fn ties_keep_first_seen_order() {
    let report = report_of(&[("second", "y", 10), ("first", "x", 10), ("third", "z", 10)]);

    let calls: Vec<&str> = report.calls().iter().map(|row| row.name()).collect();
    assert_eq!(calls, ["second", "first", "third"]);

    let categories: Vec<&str> = report
        .categories()
        .iter()
        .map(|row| row.category())
        .collect();
    assert_eq!(categories, ["y", "x", "z"]);
}

#[test]
fn same_name_in_two_categories_gives_two_rows() {
    let report = report_of(&[("shared", "x", 10), ("shared", "y", 20)]);

    assert_eq!(report.calls().len(), 2);
    assert_eq!(report.calls().first().unwrap().category(), "y");
}

#[test]
fn rendered_report_uses_four_decimal_seconds() {
    let text = report_of(&[("http.fetch", "http", 250), ("redis.set", "redis", 100)]).to_string();

    assert!(text.starts_with("Performance stats for api\n"));
    assert!(text.contains("http.fetch"));
    assert!(text.contains("0.2500"));
    assert!(text.contains("0.1000"));
    assert!(!text.contains("CALL HISTORY"));
}

#[test]
fn empty_report_renders_headers_only() {
    let report = report_of(&[]);

    assert!(report.is_empty());
    assert_eq!(report.total(), Duration::ZERO);

    let text = report.to_string();
    assert!(text.contains("CATEGORY"));
    assert!(text.contains("CALL"));
}

#[test]
fn merge_combines_matching_calls() {
    let a = report_of(&[("work", "cpu", 10), ("io", "disk", 40)]);
    let b = report_of(&[("work", "cpu", 50)]);

    let merged = Report::merge(&a, &b);

    assert_eq!(merged.session_name(), "api + api");
    let first = merged.calls().first().unwrap();
    assert_eq!(first.name(), "work");
    assert_eq!(first.calls(), 2);
    assert_eq!(first.total(), Duration::from_millis(60));
    assert!(merged.history().is_none());
}

#[test]
fn writer_sink_receives_finished_report() {
    let buffer = SharedBuffer::default();
    let add = instrument("math.add", "cpu", |(a, b): (u32, u32)| a + b);

    let session = Session::builder("to writer")
        .sink(WriterSink::new(buffer.clone()))
        .build();

    let report = {
        let active = session.begin();
        add.call((1, 2));
        active.finish()
    };

    assert_eq!(buffer.contents(), report.to_string());
    assert!(buffer.contents().contains("math.add"));
}

#[test]
fn verbose_report_lists_call_history() {
    let buffer = SharedBuffer::default();
    let greet = instrument("greet", "text", |name: &str| name.len());
    let configure = instrument("configure", "setup", |(): (), retries: u8| retries);

    let session = Session::builder("verbose")
        .verbose(true)
        .sink(WriterSink::new(buffer.clone()))
        .build();

    session.run(|| {
        greet.call("ada");
        configure.call_kw((), 3);
    });

    let text = buffer.contents();
    assert!(text.contains("CALL HISTORY"));
    assert!(text.contains(r#"greet[args="ada" kwargs={}]"#));
    assert!(text.contains("configure[args=() kwargs=3]"));
}

#[test]
fn failed_session_discarded_by_default() {
    let buffer = SharedBuffer::default();
    let session = Session::builder("fails")
        .sink(WriterSink::new(buffer.clone()))
        .build();

    let result: Result<(), &str> = session.try_run(|| Err("bad input"));

    assert_eq!(result, Err("bad input"));
    assert!(buffer.contents().is_empty());
}

#[test]
fn failed_session_reported_when_always() {
    let buffer = SharedBuffer::default();
    let session = Session::builder("fails loudly")
        .report_policy(ReportPolicy::Always)
        .sink(WriterSink::new(buffer.clone()))
        .build();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        session.run::<()>(|| panic!("body failed"));
    }));

    assert!(result.is_err());
    assert!(buffer.contents().starts_with("Performance stats for fails loudly"));
    assert!(!with_timer_state(|state| state.is_locked()));
}

#[test]
fn target_names_members_and_skips_private_ones() {
    struct Client;

    impl Client {
        fn fetch(&self, path: &str) -> usize {
            path.len()
        }
    }

    let target = Target::class("api", "Client", "http");
    assert!(target.is_selected("fetch"));
    assert!(!target.is_selected("_connect"));

    let fetch = target.method("fetch", MethodKind::Instance, |client: &Client, path: &str| {
        client.fetch(path)
    });
    let connect = target.method("_connect", MethodKind::Instance, |_: &Client, (): ()| {});

    let report = {
        let active = Session::builder("targets").build().begin();
        assert_eq!(fetch.call_on(&Client, "/index"), 6);
        connect.call_on(&Client, ());
        active.finish()
    };

    assert_eq!(report.calls().len(), 1);
    let row = report.calls().first().unwrap();
    assert_eq!(row.name(), "api.Client.fetch");
    assert_eq!(row.category(), "http");
}

#[test]
fn only_list_restricts_module_functions() {
    let target = Target::module("storage", "disk").only(["read"]);

    let read = target.function("read", |len: usize| vec![0_u8; len]);
    let write = target.function("write", |data: &[u8]| data.len());

    assert!(read.is_enabled());
    assert!(!write.is_enabled());

    let report = {
        let active = Session::builder("only").build().begin();
        assert_eq!(read.call(4).len(), 4);
        assert_eq!(write.call(&[1_u8, 2, 3][..]), 3);
        active.finish()
    };

    let names: Vec<&str> = report.calls().iter().map(|row| row.name()).collect();
    assert_eq!(names, ["storage.read"]);
}

#[test]
#[should_panic(expected = "is not an instance method")]
fn static_method_cannot_take_receiver() {
    let target = Target::class("api", "Client", "http");
    let build = target.method("build", MethodKind::Static, |_: &(), (): ()| {});

    build.call_on(&(), ());
}
