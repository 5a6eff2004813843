//! Structured, leveled logger handles.
//!
//! A [`Logger`] is a cheap-to-clone handle over a shared [`Sink`] plus an
//! ordered list of [`Field`]s that ride along on every record emitted
//! through it. Handles are never mutated: [`Logger::with`] returns a new
//! handle and leaves the receiver untouched, so one root logger can be
//! shared by every in-flight request without any locking.
//!
//! ```rust
//! use tsu_reqlog::log::{Field, Logger, MemorySink};
//!
//! let sink = MemorySink::new();
//! let root = Logger::new(sink.clone());
//! let scoped = root.with([Field::str("user", "alice")]);
//!
//! scoped.info("signed in");
//! root.info("unrelated");
//!
//! let records = sink.records();
//! assert_eq!(records[0].field("user").map(ToString::to_string).as_deref(), Some("alice"));
//! assert!(records[1].field("user").is_none());
//! ```

mod sink;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, SystemTime};

pub use sink::{MemorySink, Sink, TracingSink};

// ── Level ─────────────────────────────────────────────────────────────────────

/// Native severity, ordered from least to most severe.
///
/// `Panic` and `Fatal` are not just labels: after the record is written,
/// a panic-level call unwinds and a fatal-level call exits the process.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum Level {
    Debug = 0,
    Info  = 1,
    Warn  = 2,
    Error = 3,
    Panic = 4,
    Fatal = 5,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info  => "info",
            Self::Warn  => "warn",
            Self::Error => "error",
            Self::Panic => "panic",
            Self::Fatal => "fatal",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Debug,
            1 => Self::Info,
            2 => Self::Warn,
            3 => Self::Error,
            4 => Self::Panic,
            _ => Self::Fatal,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Fields ────────────────────────────────────────────────────────────────────

/// A typed field value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Uint(u64),
    Bool(bool),
    Duration(Duration),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s)      => f.write_str(s),
            Self::Int(n)      => write!(f, "{n}"),
            Self::Uint(n)     => write!(f, "{n}"),
            Self::Bool(b)     => write!(f, "{b}"),
            Self::Duration(d) => write!(f, "{d:?}"),
        }
    }
}

/// A key/value pair attached to a record.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    key: Cow<'static, str>,
    value: Value,
}

impl Field {
    pub fn new(key: impl Into<Cow<'static, str>>, value: Value) -> Self {
        Self { key: key.into(), value }
    }

    pub fn str(key: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        Self::new(key, Value::Str(value.into()))
    }

    pub fn int(key: impl Into<Cow<'static, str>>, value: i64) -> Self {
        Self::new(key, Value::Int(value))
    }

    pub fn uint(key: impl Into<Cow<'static, str>>, value: u64) -> Self {
        Self::new(key, Value::Uint(value))
    }

    pub fn bool(key: impl Into<Cow<'static, str>>, value: bool) -> Self {
        Self::new(key, Value::Bool(value))
    }

    pub fn duration(key: impl Into<Cow<'static, str>>, value: Duration) -> Self {
        Self::new(key, Value::Duration(value))
    }

    pub fn key(&self) -> &str { &self.key }
    pub fn value(&self) -> &Value { &self.value }
}

// ── Record ────────────────────────────────────────────────────────────────────

/// One emitted log entry. Handle fields come first, call-site fields after.
#[derive(Clone, Debug)]
pub struct Record {
    pub level: Level,
    pub message: String,
    pub fields: Vec<Field>,
    pub time: SystemTime,
}

impl Record {
    /// The last field named `key`, if any.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.iter().rev().find(|f| f.key() == key).map(Field::value)
    }
}

// ── Logger ────────────────────────────────────────────────────────────────────

struct Core {
    sink: Box<dyn Sink>,
    level: AtomicU8,
}

/// A structured logging handle.
///
/// Clones and derived handles share the sink and the minimum level; the
/// field list is per handle.
#[derive(Clone)]
pub struct Logger {
    core: Arc<Core>,
    fields: Arc<[Field]>,
}

impl Logger {
    /// Logger writing to `sink` at [`Level::Info`] and above.
    pub fn new(sink: impl Sink) -> Self {
        Self::builder().build(sink)
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { level: Level::Info, fields: Vec::new() }
    }

    /// Returns a new handle carrying this handle's fields followed by `fields`.
    pub fn with(&self, fields: impl IntoIterator<Item = Field>) -> Logger {
        let fields: Arc<[Field]> = self.fields.iter().cloned().chain(fields).collect();
        Logger { core: Arc::clone(&self.core), fields }
    }

    pub fn fields(&self) -> &[Field] { &self.fields }

    pub fn level(&self) -> Level {
        Level::from_u8(self.core.level.load(Ordering::Relaxed))
    }

    /// Sets the minimum level for this handle and every handle sharing its root.
    pub fn set_level(&self, level: Level) {
        self.core.level.store(level as u8, Ordering::Relaxed);
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Writes one record at `level` if it passes the minimum level.
    pub fn log(&self, level: Level, message: impl Into<String>, fields: &[Field]) {
        if self.enabled(level) {
            self.emit(level, message.into(), fields);
        }
    }

    fn emit(&self, level: Level, message: String, fields: &[Field]) {
        let record = Record {
            level,
            message,
            fields: self.fields.iter().chain(fields).cloned().collect(),
            time: SystemTime::now(),
        };
        self.core.sink.write(&record);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message, &[]);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message, &[]);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message, &[]);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message, &[]);
    }

    /// Writes a panic-level record, then panics with `message`.
    ///
    /// Both steps happen regardless of the minimum level.
    pub fn panic(&self, message: impl Into<String>) -> ! {
        let message = message.into();
        self.emit(Level::Panic, message.clone(), &[]);
        panic!("{message}");
    }

    /// Writes a fatal-level record, flushes the sink, then exits with status 1.
    pub fn fatal(&self, message: impl Into<String>) -> ! {
        self.emit(Level::Fatal, message.into(), &[]);
        self.core.sink.flush();
        std::process::exit(1);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Construction-time options for a root [`Logger`].
///
/// The sink is fixed here and cannot be swapped afterwards.
pub struct LoggerBuilder {
    level: Level,
    fields: Vec<Field>,
}

impl LoggerBuilder {
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self, sink: impl Sink) -> Logger {
        Logger {
            core: Arc::new(Core { sink: Box::new(sink), level: AtomicU8::new(self.level as u8) }),
            fields: self.fields.into(),
        }
    }
}

/// The default root logger: [`TracingSink`] at [`Level::Info`].
pub fn default_logger() -> Logger {
    Logger::new(TracingSink)
}
