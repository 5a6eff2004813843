//! Middleware chain.
//!
//! A [`Chain`] is an endpoint handler wrapped by an ordered list of
//! [`Middleware`]. Each middleware receives the request plus a [`Next`]
//! continuation and may act before and after calling it:
//!
//! ```text
//! Chain::new(endpoint).wrap(a).wrap(b)
//!
//!   a ─┐ before
//!      b ─┐ before
//!         endpoint
//!      b ─┘ after
//!   a ─┘ after
//! ```
//!
//! Errors that escape every middleware are turned into a response by the
//! chain's [`ErrorHandler`]. Middleware that wants to keep running after a
//! downstream failure forwards the error itself with [`Next::report`].

use std::future::Future;
use std::sync::Arc;

use tracing::error;

use crate::adapter::FrameworkLog;
use crate::error::Error;
use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::request::Request;
use crate::response::{Response, status_text};

// ── Middleware ────────────────────────────────────────────────────────────────

/// One link in the chain.
///
/// Implemented for any `Fn(Request, Next) -> impl Future<Output =
/// Result<Response, Error>>`, so plain async closures work:
///
/// ```rust
/// use tsu_reqlog::{Chain, Next, Request, Response, Error};
///
/// async fn ok(_req: Request) -> Result<Response, Error> { Ok(Response::text("ok")) }
///
/// let chain = Chain::new(ok).wrap(|req: Request, next: Next| async move {
///     next.run(req).await
/// });
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Result<Response, Error>>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Result<Response, Error>> {
        Box::pin(self(req, next))
    }
}

// ── ErrorHandler ──────────────────────────────────────────────────────────────

/// Turns a handler failure into the response sent to the client.
///
/// Implemented for any `Fn(Error) -> Response`.
pub trait ErrorHandler: Send + Sync + 'static {
    fn handle_error(&self, err: Error) -> Response;
}

impl<F> ErrorHandler for F
where
    F: Fn(Error) -> Response + Send + Sync + 'static,
{
    fn handle_error(&self, err: Error) -> Response {
        self(err)
    }
}

/// The error handler used when none is installed.
///
/// Client errors (4xx) echo the error message. Server errors answer with the
/// bare reason phrase and are logged, through the chain's framework logger
/// if one is installed and through `tracing` otherwise.
fn default_error_response(err: Error, log: Option<&dyn FrameworkLog>) -> Response {
    let status = err.status();
    if !status.is_server_error() {
        return Response::builder().status(status).text(err.message());
    }

    match log {
        Some(log) => log.errorf(format_args!("handler failed: {err}")),
        None => error!(error = %err, "handler failed"),
    }
    Response::builder().status(status).text(status_text(status))
}

// ── Chain ─────────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct Inner {
    middleware: Vec<Arc<dyn Middleware>>,
    endpoint: BoxedHandler,
    on_error: Option<Arc<dyn ErrorHandler>>,
    log: Option<Arc<dyn FrameworkLog>>,
}

impl Inner {
    fn report(&self, err: Error) -> Response {
        match &self.on_error {
            Some(handler) => handler.handle_error(err),
            None => default_error_response(err, self.log.as_deref()),
        }
    }
}

/// An endpoint plus the middleware wrapped around it.
///
/// Build it once at startup; clones are cheap and share everything.
#[derive(Clone)]
pub struct Chain {
    inner: Arc<Inner>,
}

impl Chain {
    pub fn new(endpoint: impl Handler) -> Self {
        Self {
            inner: Arc::new(Inner {
                middleware: Vec::new(),
                endpoint: endpoint.into_boxed_handler(),
                on_error: None,
                log: None,
            }),
        }
    }

    /// Adds a middleware inside every middleware added before it.
    pub fn wrap(mut self, middleware: impl Middleware) -> Self {
        Arc::make_mut(&mut self.inner).middleware.push(Arc::new(middleware));
        self
    }

    /// Replaces the default error handler.
    pub fn on_error(mut self, handler: impl ErrorHandler) -> Self {
        Arc::make_mut(&mut self.inner).on_error = Some(Arc::new(handler));
        self
    }

    /// Installs the logger the chain uses for its own diagnostics.
    pub fn logger(mut self, log: impl FrameworkLog) -> Self {
        Arc::make_mut(&mut self.inner).log = Some(Arc::new(log));
        self
    }

    /// The framework logger installed with [`Chain::logger`], if any.
    pub fn framework_log(&self) -> Option<&dyn FrameworkLog> {
        self.inner.log.as_deref()
    }

    /// Runs `req` through every middleware and the endpoint.
    ///
    /// Always produces a response: an escaping error goes through the error
    /// handler.
    pub async fn handle(&self, req: Request) -> Response {
        let next = Next { chain: Arc::clone(&self.inner), index: 0 };
        match next.run(req).await {
            Ok(res) => res,
            Err(err) => next.report(err),
        }
    }
}

// ── Next ──────────────────────────────────────────────────────────────────────

/// The rest of the chain, as seen from inside a middleware.
#[derive(Clone)]
pub struct Next {
    chain: Arc<Inner>,
    index: usize,
}

impl Next {
    /// Runs the remaining middleware and the endpoint.
    pub async fn run(&self, req: Request) -> Result<Response, Error> {
        match self.chain.middleware.get(self.index) {
            Some(middleware) => {
                let next = Next { chain: Arc::clone(&self.chain), index: self.index + 1 };
                middleware.handle(req, next).await
            }
            None => self.chain.endpoint.call(req).await,
        }
    }

    /// Hands `err` to the chain's error handler and returns the response it
    /// produced.
    pub fn report(&self, err: Error) -> Response {
        self.chain.report(err)
    }
}
