//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns. Built-in middleware:
//!
//! - [`RequestLogger`]: one "started" and one "completed" structured record
//!   per request, with method, URI, peer, request id, status and latency.
//!   Handlers reach the request's logger through [`RequestLog`] and may
//!   enrich it before the completion record is written.

mod request_log;

pub use request_log::{
    COMPLETED, REQUEST_ID_HEADER, RequestLog, RequestLogger, STARTED, request_logger,
};
