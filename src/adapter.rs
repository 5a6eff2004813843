//! The framework's logging interface, and an adapter that satisfies it with
//! a structured [`Logger`].
//!
//! The chain logs its own diagnostics through [`FrameworkLog`], a classic
//! print/printf/leveled interface with a six-value [`LogLevel`]. [`wrap`]
//! puts a structured logger behind that interface so framework diagnostics
//! and request records end up in the same sink:
//!
//! ```rust
//! use tsu_reqlog::adapter::{self, FrameworkLog, LogLevel};
//! use tsu_reqlog::log::{Logger, MemorySink};
//!
//! let sink = MemorySink::new();
//! let log = adapter::wrap(Logger::new(sink.clone()));
//!
//! log.set_level(LogLevel::Debug);
//! log.debugf(format_args!("pool size {}", 8));
//! log.print(&[&"a", &"b"]);
//!
//! assert_eq!(sink.messages(), ["pool size 8", "ab"]);
//! ```

use std::fmt::{self, Display, Write as _};
use std::io;

use tracing::warn;

use crate::log::{Level, Logger};

// ── LogLevel ──────────────────────────────────────────────────────────────────

/// The framework's level enumeration, most severe first.
///
/// Discriminants match the raw `u8` values the framework passes around.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum LogLevel {
    Panic = 0,
    Fatal = 1,
    Error = 2,
    Warn  = 3,
    Info  = 4,
    Debug = 5,
}

/// Raw value outside `0..=5`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UnknownLevel(pub u8);

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level {}", self.0)
    }
}

impl std::error::Error for UnknownLevel {}

impl TryFrom<u8> for LogLevel {
    type Error = UnknownLevel;

    fn try_from(raw: u8) -> Result<Self, UnknownLevel> {
        match raw {
            0 => Ok(Self::Panic),
            1 => Ok(Self::Fatal),
            2 => Ok(Self::Error),
            3 => Ok(Self::Warn),
            4 => Ok(Self::Info),
            5 => Ok(Self::Debug),
            _ => Err(UnknownLevel(raw)),
        }
    }
}

/// The translation table into native levels. Total: every framework level
/// has a native counterpart, including `Warn`.
impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Level {
        match level {
            LogLevel::Panic => Level::Panic,
            LogLevel::Fatal => Level::Fatal,
            LogLevel::Error => Level::Error,
            LogLevel::Warn  => Level::Warn,
            LogLevel::Info  => Level::Info,
            LogLevel::Debug => Level::Debug,
        }
    }
}

// ── FrameworkLog ──────────────────────────────────────────────────────────────

/// The logging interface the framework expects for its own diagnostics.
///
/// Unformatted calls take their arguments as a slice of `Display` values
/// and concatenate them with no separator, whatever their types: no space
/// is inserted even between two adjacent numbers, so `&[&1, &2]` logs `12`.
/// Callers wanting spacing pass it explicitly or use the `*f` variants,
/// which take `format_args!` output.
///
/// `print` and `printf` have no level of their own and log at info. Callers
/// that need print output to be distinguishable from info output cannot
/// rely on this interface for it.
pub trait FrameworkLog: Send + Sync + 'static {
    fn print(&self, args: &[&dyn Display]);
    fn printf(&self, args: fmt::Arguments<'_>);

    fn debug(&self, args: &[&dyn Display]);
    fn debugf(&self, args: fmt::Arguments<'_>);
    fn info(&self, args: &[&dyn Display]);
    fn infof(&self, args: fmt::Arguments<'_>);
    fn warn(&self, args: &[&dyn Display]);
    fn warnf(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: &[&dyn Display]);
    fn errorf(&self, args: fmt::Arguments<'_>);

    /// Logs, then terminates the process.
    fn fatal(&self, args: &[&dyn Display]) -> !;
    /// Logs, then terminates the process.
    fn fatalf(&self, args: fmt::Arguments<'_>) -> !;

    fn set_level(&self, level: LogLevel);

    /// Redirects output. Implementations whose destination is fixed must
    /// fail loudly instead of ignoring the call.
    fn set_output(&self, writer: Box<dyn io::Write + Send>) -> !;
}

fn concat(args: &[&dyn Display]) -> String {
    let mut out = String::new();
    for arg in args {
        let _ = write!(out, "{arg}");
    }
    out
}

// ── Wrapped ───────────────────────────────────────────────────────────────────

/// A structured [`Logger`] behind the [`FrameworkLog`] interface.
#[derive(Clone, Debug)]
pub struct Wrapped {
    logger: Logger,
}

/// Wraps `logger` so the framework can log through it.
pub fn wrap(logger: Logger) -> Wrapped {
    Wrapped { logger }
}

impl Wrapped {
    pub fn logger(&self) -> &Logger { &self.logger }

    /// Applies a raw framework level. Values outside the enumeration leave
    /// the current level in effect.
    pub fn set_raw_level(&self, raw: u8) {
        match LogLevel::try_from(raw) {
            Ok(level) => self.set_level(level),
            Err(e) => warn!(level = raw, "ignoring level change: {e}"),
        }
    }
}

impl FrameworkLog for Wrapped {
    fn print(&self, args: &[&dyn Display]) {
        FrameworkLog::info(self, args);
    }

    fn printf(&self, args: fmt::Arguments<'_>) {
        self.infof(args);
    }

    fn debug(&self, args: &[&dyn Display]) {
        self.logger.debug(concat(args));
    }

    fn debugf(&self, args: fmt::Arguments<'_>) {
        self.logger.debug(args.to_string());
    }

    fn info(&self, args: &[&dyn Display]) {
        self.logger.info(concat(args));
    }

    fn infof(&self, args: fmt::Arguments<'_>) {
        self.logger.info(args.to_string());
    }

    fn warn(&self, args: &[&dyn Display]) {
        self.logger.warn(concat(args));
    }

    fn warnf(&self, args: fmt::Arguments<'_>) {
        self.logger.warn(args.to_string());
    }

    fn error(&self, args: &[&dyn Display]) {
        self.logger.error(concat(args));
    }

    fn errorf(&self, args: fmt::Arguments<'_>) {
        self.logger.error(args.to_string());
    }

    fn fatal(&self, args: &[&dyn Display]) -> ! {
        self.logger.fatal(concat(args))
    }

    fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.logger.fatal(args.to_string())
    }

    fn set_level(&self, level: LogLevel) {
        self.logger.set_level(level.into());
    }

    fn set_output(&self, _writer: Box<dyn io::Write + Send>) -> ! {
        self.logger.panic(
            "the output of a structured logger is fixed when it is built; set_output cannot redirect it",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemorySink;

    fn wrapped() -> (Wrapped, MemorySink) {
        let sink = MemorySink::new();
        (wrap(Logger::new(sink.clone())), sink)
    }

    #[test]
    fn print_and_info_are_indistinguishable() {
        let (log, sink) = wrapped();
        log.print(&[&"a", &"b"]);
        FrameworkLog::info(&log, &[&"a", &"b"]);
        log.printf(format_args!("{}-{}", 1, 2));
        log.infof(format_args!("{}-{}", 1, 2));

        let records = sink.records();
        assert_eq!(records.len(), 4);
        for pair in records.chunks(2) {
            assert_eq!(pair[0].level, Level::Info);
            assert_eq!(pair[0].level, pair[1].level);
            assert_eq!(pair[0].message, pair[1].message);
        }
        assert_eq!(records[0].message, "ab");
        assert_eq!(records[2].message, "1-2");
    }

    #[test]
    fn leveled_calls_emit_at_their_level_without_fields() {
        let (log, sink) = wrapped();
        log.set_level(LogLevel::Debug);

        FrameworkLog::debug(&log, &[&"d", &1]);
        FrameworkLog::warn(&log, &[&"w"]);
        log.warnf(format_args!("w{}", 2));
        FrameworkLog::error(&log, &[&"e", &true]);
        log.errorf(format_args!("e{}", 3));

        let records = sink.records();
        let seen: Vec<_> = records.iter().map(|r| (r.level, r.message.as_str())).collect();
        assert_eq!(seen, [
            (Level::Debug, "d1"),
            (Level::Warn, "w"),
            (Level::Warn, "w2"),
            (Level::Error, "etrue"),
            (Level::Error, "e3"),
        ]);
        assert!(records.iter().all(|r| r.fields.is_empty()));
    }

    #[test]
    fn set_level_translates_every_framework_level() {
        let (log, _) = wrapped();
        let table = [
            (LogLevel::Panic, Level::Panic),
            (LogLevel::Fatal, Level::Fatal),
            (LogLevel::Error, Level::Error),
            (LogLevel::Warn,  Level::Warn),
            (LogLevel::Info,  Level::Info),
            (LogLevel::Debug, Level::Debug),
        ];
        for (framework, native) in table {
            log.set_level(framework);
            assert_eq!(log.logger().level(), native, "{framework:?}");
        }
    }

    #[test]
    fn raw_levels_outside_the_enumeration_are_ignored() {
        let (log, _) = wrapped();
        log.set_raw_level(2);
        assert_eq!(log.logger().level(), Level::Error);

        log.set_raw_level(42);
        assert_eq!(log.logger().level(), Level::Error);
        assert_eq!(LogLevel::try_from(6), Err(UnknownLevel(6)));
    }

    #[test]
    fn raw_levels_follow_declaration_order() {
        let parsed: Vec<_> = (0..=5).map(LogLevel::try_from).collect();
        assert_eq!(parsed, [
            Ok(LogLevel::Panic),
            Ok(LogLevel::Fatal),
            Ok(LogLevel::Error),
            Ok(LogLevel::Warn),
            Ok(LogLevel::Info),
            Ok(LogLevel::Debug),
        ]);
        assert_eq!(UnknownLevel(9).to_string(), "unknown log level 9");
    }

    #[test]
    fn adjacent_operands_are_not_separated() {
        let (log, sink) = wrapped();
        log.print(&[&1, &2]);
        log.print(&[&"a", &3, &false, &"b"]);
        log.print(&[&1, &" ", &2]);
        assert_eq!(sink.messages(), ["12", "a3falseb", "1 2"]);
    }

    #[test]
    fn set_level_filters_later_calls() {
        let (log, sink) = wrapped();
        log.set_level(LogLevel::Error);
        FrameworkLog::info(&log, &[&"hidden"]);
        FrameworkLog::error(&log, &[&"shown"]);
        assert_eq!(sink.messages(), ["shown"]);
    }

    #[test]
    #[should_panic(expected = "set_output cannot redirect it")]
    fn set_output_always_fails() {
        let (log, _) = wrapped();
        log.set_output(Box::new(io::sink()));
    }

    #[test]
    fn set_output_leaves_a_panic_record_behind() {
        let (log, sink) = wrapped();
        let outcome: std::thread::Result<()> = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            log.set_output(Box::new(Vec::new()))
        }));

        assert!(outcome.is_err());
        assert_eq!(sink.records()[0].level, Level::Panic);
    }
}
