//! # tsu-reqlog
//!
//! Structured request logging for a minimal middleware chain.
//!
//! ## What it does
//!
//! - [`middleware::RequestLogger`] writes a "started handling request" and a
//!   "completed handling request" record for every request, carrying the
//!   request URI, method, peer, `X-Request-Id`, status and latency.
//!   Handlers can attach their own fields to the request's logger and they
//!   show up in the completion record.
//! - [`adapter::wrap`] puts the same structured [`log::Logger`] behind the
//!   framework's print/printf/leveled [`adapter::FrameworkLog`] interface so
//!   the chain's own diagnostics land in the same sink.
//!
//! What it leaves to others: transport, routing, TLS, log shipping. Mount a
//! [`Chain`] in any hyper server through [`Service`]; point the logger at
//! whatever [`log::Sink`] your deployment collects.
//!
//! ## Quick start
//!
//! ```rust
//! use http::{Method, StatusCode};
//! use tsu_reqlog::log::{Field, Logger, MemorySink};
//! use tsu_reqlog::middleware::{RequestLog, RequestLogger};
//! use tsu_reqlog::{Chain, Error, Request, Response, adapter};
//!
//! async fn get_widget(req: Request) -> Result<Response, Error> {
//!     if let Some(log) = RequestLog::of(&req) {
//!         log.with([Field::int("widget_id", 42)]);
//!     }
//!     Ok(Response::text("widget 42"))
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let sink = MemorySink::new();
//! let logger = Logger::new(sink.clone());
//!
//! let app = Chain::new(get_widget)
//!     .wrap(RequestLogger::new(logger.clone()))
//!     .logger(adapter::wrap(logger));
//!
//! let res = app.handle(Request::new(Method::GET, "/widgets/42")).await;
//! assert_eq!(res.status_code(), StatusCode::OK);
//! assert_eq!(sink.messages(), ["started handling request", "completed handling request"]);
//! # });
//! ```

mod chain;
mod error;
mod handler;
mod request;
mod response;
mod service;

pub mod adapter;
pub mod log;
pub mod middleware;

pub use chain::{Chain, ErrorHandler, Middleware, Next};
pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder, status_text};
pub use service::Service;
