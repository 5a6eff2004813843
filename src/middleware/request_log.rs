//! Per-request structured logging.
//!
//! ```rust
//! use tsu_reqlog::log::{Field, Logger, MemorySink};
//! use tsu_reqlog::middleware::{RequestLog, RequestLogger};
//! use tsu_reqlog::{Chain, Error, Request, Response};
//!
//! async fn show_widget(req: Request) -> Result<Response, Error> {
//!     if let Some(log) = RequestLog::of(&req) {
//!         log.with([Field::str("user", "alice")]);
//!     }
//!     Ok(Response::text("widget"))
//! }
//!
//! let sink = MemorySink::new();
//! let chain = Chain::new(show_widget).wrap(RequestLogger::new(Logger::new(sink.clone())));
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::chain::{Middleware, Next};
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::log::{Field, Logger, default_logger};
use crate::request::Request;
use crate::response::{Response, status_text};

/// Header carrying a caller-assigned request id. Read, never written.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const STARTED: &str = "started handling request";
pub const COMPLETED: &str = "completed handling request";

// ── RequestLog ────────────────────────────────────────────────────────────────

/// The request-scoped logger slot.
///
/// [`RequestLogger`] puts one into every request's extensions before calling
/// the rest of the chain and reads it back once the chain returns, so
/// whatever handle is stored here when the handler finishes is the one the
/// completion record is written with.
///
/// Enrich through [`RequestLog::set`] or [`RequestLog::with`]. Inserting a
/// fresh `RequestLog` into the extensions detaches it from the middleware.
#[derive(Clone, Debug)]
pub struct RequestLog {
    slot: Arc<Mutex<Logger>>,
}

impl RequestLog {
    fn new(logger: Logger) -> Self {
        Self { slot: Arc::new(Mutex::new(logger)) }
    }

    /// The slot installed on `req`, if a [`RequestLogger`] is in the chain.
    pub fn of(req: &Request) -> Option<&RequestLog> {
        req.extensions().get::<RequestLog>()
    }

    /// The current handle.
    pub fn get(&self) -> Logger {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replaces the current handle.
    pub fn set(&self, logger: Logger) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = logger;
    }

    /// Derives a handle with `fields` added, stores it, and returns it.
    pub fn with(&self, fields: impl IntoIterator<Item = Field>) -> Logger {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = slot.with(fields);
        slot.clone()
    }
}

// ── RequestLogger ─────────────────────────────────────────────────────────────

/// Writes one "started" and one "completed" record per request.
///
/// The started record carries `request` (path and query), `method`,
/// `remote` (peer IP, empty when unknown) and, when the `X-Request-Id`
/// header is present and non-empty, `request_id`. The completed record adds
/// `status`, `text_status` and `took`, plus anything handlers attached
/// through [`RequestLog`].
///
/// Handler errors are handed to the chain's error handler and the
/// completed record logs the status it produced; the middleware itself
/// always returns `Ok`.
#[derive(Clone, Debug)]
pub struct RequestLogger {
    logger: Logger,
}

impl RequestLogger {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    fn entry(&self, req: &Request) -> Logger {
        let remote = req.remote_addr().map(|a| a.ip().to_string()).unwrap_or_default();
        let mut fields = vec![
            Field::str("request", req.request_uri()),
            Field::str("method", req.method().as_str()),
            Field::str("remote", remote),
        ];
        if let Some(id) = req.header(REQUEST_ID_HEADER).filter(|id| !id.is_empty()) {
            fields.push(Field::str("request_id", id));
        }
        self.logger.with(fields)
    }
}

/// A [`RequestLogger`] over [`default_logger`].
pub fn request_logger() -> RequestLogger {
    RequestLogger::new(default_logger())
}

impl Middleware for RequestLogger {
    fn handle(&self, mut req: Request, next: Next) -> BoxFuture<Result<Response, Error>> {
        let start = Instant::now();
        let entry = self.entry(&req);

        Box::pin(async move {
            entry.info(STARTED);

            let log = RequestLog::new(entry);
            req.extensions_mut().insert(log.clone());

            let outcome = next.run(req).await;
            let took = start.elapsed();

            let res = match outcome {
                Ok(res) => res,
                Err(err) => next.report(err),
            };

            let status = res.status_code();
            log.get()
                .with([
                    Field::int("status", i64::from(status.as_u16())),
                    Field::str("text_status", status_text(status)),
                    Field::duration("took", took),
                ])
                .info(COMPLETED);

            Ok(res)
        })
    }
}
