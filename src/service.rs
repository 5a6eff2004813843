//! hyper integration.
//!
//! [`Service`] mounts a [`Chain`] in any hyper 1.x server. One `Service` is
//! built per connection so the chain knows the peer address:
//!
//! ```rust,ignore
//! let (stream, peer) = listener.accept().await?;
//! let svc = tsu_reqlog::Service::new(chain.clone(), Some(peer));
//! hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
//!     .serve_connection(TokioIo::new(stream), svc)
//!     .await?;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use tracing::debug;

use crate::chain::Chain;
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

/// A [`Chain`] as a `hyper::service::Service`.
///
/// The error type is [`Infallible`]: every failure is answered with a
/// response, so hyper never sees an error.
#[derive(Clone)]
pub struct Service {
    chain: Chain,
    remote_addr: Option<SocketAddr>,
}

impl Service {
    pub fn new(chain: Chain, remote_addr: Option<SocketAddr>) -> Self {
        Self { chain, remote_addr }
    }
}

impl<B> hyper::service::Service<http::Request<B>> for Service
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: std::fmt::Display,
{
    type Response = http::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = BoxFuture<Result<Self::Response, Infallible>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let chain = self.chain.clone();
        let remote_addr = self.remote_addr;

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    debug!(peer = ?remote_addr, "failed to read request body: {e}");
                    return Ok(Response::status(StatusCode::BAD_REQUEST).into_http());
                }
            };

            let res = chain.handle(Request::from_parts(parts, body, remote_addr)).await;
            Ok(res.into_http())
        })
    }
}
