use std::io;
use std::sync::{Arc, Mutex};

use std::time::Duration;

use http::Method;
use serde_json::Value as Json;
use tsu_reqlog::log::{Field, Level, Logger, TracingSink};
use tsu_reqlog::middleware::RequestLogger;
use tsu_reqlog::{Chain, Error, Request, Response};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

impl Captured {
    fn output(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

fn subscriber(out: Captured) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || out.clone())
        .finish()
}

fn json_subscriber(out: Captured) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || out.clone())
        .finish()
}

impl Captured {
    fn json_lines(&self) -> Vec<Json> {
        self.output().lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }
}

#[test]
fn records_become_tracing_events() {
    let out = Captured::default();

    tracing::subscriber::with_default(subscriber(out.clone()), || {
        let log = Logger::new(TracingSink).with([Field::str("method", "GET"), Field::int("status", 200)]);
        log.info("completed handling request");
        log.warn("slow");
    });

    let output = out.output();
    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines.len(), 2, "{output}");
    assert!(lines[0].contains("INFO"));
    assert!(lines[0].contains("tsu_reqlog"));
    assert!(lines[0].contains("completed handling request"));
    assert!(lines[0].contains(r#"method="GET""#), "{output}");
    assert!(lines[0].contains("status=200"), "{output}");
    assert!(!lines[0].contains("fields="), "{output}");
    assert!(lines[1].contains("WARN"));
}

#[test]
fn json_output_keeps_field_types() {
    let out = Captured::default();

    tracing::subscriber::with_default(json_subscriber(out.clone()), || {
        let log = Logger::new(TracingSink).with([
            Field::str("request", "/widgets"),
            Field::int("status", 200),
            Field::str("text_status", "OK"),
            Field::duration("took", Duration::from_micros(1500)),
            Field::str("user", "alice"),
        ]);
        log.info("completed handling request");
    });

    let lines = out.json_lines();
    assert_eq!(lines.len(), 1);
    let event = &lines[0];
    assert_eq!(event["level"], "INFO");
    assert_eq!(event["target"], "tsu_reqlog");
    assert_eq!(event["fields"]["message"], "completed handling request");
    assert_eq!(event["fields"]["request"], "/widgets");
    assert_eq!(event["fields"]["status"], 200);
    assert_eq!(event["fields"]["text_status"], "OK");
    assert_eq!(event["fields"]["took"].as_u64(), Some(1_500_000));
    assert_eq!(event["fields"]["fields"], r#"user="alice""#);
    assert!(event["fields"].get("request_id").is_none());
}

#[test]
fn panic_level_records_carry_their_severity() {
    let out = Captured::default();

    tracing::subscriber::with_default(json_subscriber(out.clone()), || {
        let log = Logger::builder().level(Level::Fatal).build(TracingSink);
        let outcome: std::thread::Result<()> =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| log.panic("gave up")));
        assert!(outcome.is_err());
    });

    let lines = out.json_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], "ERROR");
    assert_eq!(lines[0]["fields"]["severity"], "panic");
    assert_eq!(lines[0]["fields"]["message"], "gave up");
}

#[test]
fn default_request_logger_writes_through_tracing() {
    async fn ok(_req: Request) -> Result<Response, Error> {
        Ok(Response::text("ok"))
    }

    let out = Captured::default();
    let chain = Chain::new(ok).wrap(tsu_reqlog::middleware::request_logger());
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

    tracing::subscriber::with_default(subscriber(out.clone()), || {
        runtime.block_on(chain.handle(Request::new(Method::GET, "/widgets")));
    });

    let output = out.output();
    assert!(output.contains("started handling request"), "{output}");
    assert!(output.contains("completed handling request"), "{output}");
    assert!(output.contains(r#"request="/widgets""#), "{output}");
    assert!(output.contains(r#"text_status="OK""#), "{output}");
}

#[test]
fn explicit_logger_and_default_helper_are_interchangeable() {
    let explicit = RequestLogger::new(Logger::new(TracingSink));
    let helper = tsu_reqlog::middleware::request_logger();
    assert_eq!(format!("{explicit:?}"), format!("{helper:?}"));
}
