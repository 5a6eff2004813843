//! Record destinations.
//!
//! A sink is chosen once, when the root [`Logger`](super::Logger) is built,
//! and every handle derived from that root writes to it. Sinks swallow their
//! own I/O failures: logging is a side channel and must never change the
//! outcome of the request being logged.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::field::{DisplayValue, display};

use super::{Field, Level, Record, Value};

/// Where records go.
pub trait Sink: Send + Sync + 'static {
    fn write(&self, record: &Record);

    /// Pushes buffered output to its destination. Called before a fatal exit.
    fn flush(&self) {}
}

// ── TracingSink ───────────────────────────────────────────────────────────────

/// Forwards records to the `tracing` dispatcher as events with target
/// `tsu_reqlog`.
///
/// The request fields keep their types on the event: `status` is an integer,
/// `took` is an integer count of nanoseconds, the rest are strings. Fields
/// without a slot of their own are rendered together into `fields` as
/// `key=value` pairs. Panic- and fatal-level records are emitted as `ERROR`
/// events with a `severity` field naming the original level.
///
/// Output format is the subscriber's business; `tracing_subscriber::fmt().json()`
/// gives one JSON object per record.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

macro_rules! emit {
    ($level:expr, $message:expr, $slots:ident) => {
        tracing::event!(
            target: "tsu_reqlog",
            $level,
            request = $slots.request,
            method = $slots.method,
            remote = $slots.remote,
            request_id = $slots.request_id,
            status = $slots.status,
            text_status = $slots.text_status,
            took = $slots.took,
            severity = $slots.severity,
            fields = $slots.rest(),
            "{}",
            $message
        )
    };
}

impl Sink for TracingSink {
    fn write(&self, record: &Record) {
        let mut slots = Slots::from(record.fields.as_slice());
        let message = record.message.as_str();
        match record.level {
            Level::Debug => emit!(tracing::Level::DEBUG, message, slots),
            Level::Info  => emit!(tracing::Level::INFO, message, slots),
            Level::Warn  => emit!(tracing::Level::WARN, message, slots),
            Level::Error => emit!(tracing::Level::ERROR, message, slots),
            Level::Panic | Level::Fatal => {
                slots.severity = Some(record.level.as_str());
                emit!(tracing::Level::ERROR, message, slots)
            }
        }
    }
}

/// Record fields sorted into the event's named slots. A field takes a slot
/// only when both its key and its value type match; a later field with the
/// same key wins, as in [`Record::field`].
#[derive(Default)]
struct Slots<'a> {
    request: Option<&'a str>,
    method: Option<&'a str>,
    remote: Option<&'a str>,
    request_id: Option<&'a str>,
    status: Option<i64>,
    text_status: Option<&'a str>,
    took: Option<u64>,
    severity: Option<&'static str>,
    rest: Vec<&'a Field>,
}

impl<'a> From<&'a [Field]> for Slots<'a> {
    fn from(fields: &'a [Field]) -> Self {
        let mut slots = Slots::default();
        for field in fields {
            match (field.key(), field.value()) {
                ("request", Value::Str(s))     => slots.request = Some(s.as_str()),
                ("method", Value::Str(s))      => slots.method = Some(s.as_str()),
                ("remote", Value::Str(s))      => slots.remote = Some(s.as_str()),
                ("request_id", Value::Str(s))  => slots.request_id = Some(s.as_str()),
                ("status", Value::Int(n))      => slots.status = Some(*n),
                ("text_status", Value::Str(s)) => slots.text_status = Some(s.as_str()),
                ("took", Value::Duration(d))   => {
                    slots.took = Some(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX));
                }
                _ => slots.rest.push(field),
            }
        }
        slots
    }
}

impl Slots<'_> {
    fn rest(&self) -> Option<DisplayValue<Rendered<'_>>> {
        (!self.rest.is_empty()).then(|| display(Rendered(&self.rest)))
    }
}

struct Rendered<'a>(&'a [&'a Field]);

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match field.value() {
                Value::Str(s) => write!(f, "{}={s:?}", field.key())?,
                other         => write!(f, "{}={other}", field.key())?,
            }
        }
        Ok(())
    }
}

// ── MemorySink ────────────────────────────────────────────────────────────────

/// Keeps every record in memory. Clones share the same buffer, so keep one
/// clone to inspect what a logger built over another clone wrote.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far, in emission order.
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }
}

impl Sink for MemorySink {
    fn write(&self, record: &Record) {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).push(record.clone());
    }
}
