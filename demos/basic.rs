//! Request logging in a small hyper server.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/widgets/42
//!   curl -H 'x-request-id: abc123' http://localhost:3000/widgets/7
//!   curl http://localhost:3000/broken
//!
//! Every request prints a "started" and a "completed" JSON line on stdout.
//! The lines come from the tracing subscriber installed in `main`.

use std::net::SocketAddr;

use http::StatusCode;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};
use tsu_reqlog::adapter::{self, FrameworkLog};
use tsu_reqlog::log::{self, Field};
use tsu_reqlog::middleware::{RequestLog, RequestLogger};
use tsu_reqlog::{Chain, Error, Request, Response, Service};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().json().init();

    let logger = log::default_logger();
    let framework_log = adapter::wrap(logger.clone());
    framework_log.printf(format_args!("starting {}", env!("CARGO_PKG_NAME")));

    let app = Chain::new(widgets)
        .wrap(RequestLogger::new(logger))
        .logger(framework_log);

    let addr: SocketAddr = "0.0.0.0:3000".parse().expect("invalid socket address");
    let listener = TcpListener::bind(addr).await.expect("bind failed");
    info!(%addr, "listening");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut tasks = tokio::task::JoinSet::new();
    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, peer) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let svc = Service::new(app.clone(), Some(peer));

                tasks.spawn(async move {
                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(TokioIo::new(stream), svc)
                        .await
                    {
                        error!(%peer, "connection error: {e}");
                    }
                });
            }

            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}
}

// GET /widgets/{id} answers 200; /broken fails and goes through the error
// handler; anything else is a 404.
async fn widgets(req: Request) -> Result<Response, Error> {
    let path = req.uri().path().to_owned();

    if path == "/broken" {
        return Err(std::io::Error::other("widget store unavailable").into());
    }

    let Some(id) = path.strip_prefix("/widgets/") else {
        return Err(Error::new(StatusCode::NOT_FOUND, "no such route"));
    };

    if let Some(log) = RequestLog::of(&req) {
        log.with([Field::str("widget_id", id)]);
    }
    Ok(Response::json(format!(r#"{{"id":"{id}","name":"sprocket"}}"#).into_bytes()))
}
