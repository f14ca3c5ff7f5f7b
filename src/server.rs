//! HTTP server: the transport boundary in front of the pipeline.
//!
//! The server owns sockets and graceful shutdown; everything between "bytes
//! in" and "bytes out" belongs to the [`Pipeline`]. Per request it parses
//! the method, assembles the [`Request`], runs the chain, and writes exactly
//! one response — or tears the connection down when the pipeline says
//! [`Outcome::Abort`].
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the accept loop stops immediately; in-flight
//! connections drain to completion before [`Server::serve`] returns. Under
//! Kubernetes, set `terminationGracePeriodSeconds` longer than your slowest
//! request.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::Error;
use crate::method::Method;
use crate::pipeline::{Context, Outcome, Pipeline};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Accepts connections and feeds every request through `pipeline`.
    ///
    /// Returns only after a full graceful shutdown: a SIGTERM or Ctrl-C
    /// followed by all in-flight connections completing.
    pub async fn serve(self, pipeline: Pipeline) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let pipeline = Arc::new(pipeline);

        info!(addr = %self.addr, "palisade listening");

        // Every connection task lands in the JoinSet so shutdown can wait
        // for all of them.
        let mut connections = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown before accept: a signal stops new
                // connections even when more are already queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = connections.len(), "shutdown signal received, draining");
                    break;
                }

                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let pipeline = Arc::clone(&pipeline);
                    let io = TokioIo::new(stream);

                    connections.spawn(async move {
                        let svc = service_fn(move |req| {
                            let pipeline = Arc::clone(&pipeline);
                            async move { handle_request(pipeline, req).await }
                        });

                        // Speaks HTTP/1.1 or HTTP/2, whichever the client
                        // negotiates. An Outcome::Abort surfaces here as a
                        // service error and drops the connection.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %peer, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connections so the set stays bounded.
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        while connections.join_next().await.is_some() {}

        info!("palisade stopped");
        Ok(())
    }
}

// ── Request handling ──────────────────────────────────────────────────────────

/// Bridges one hyper request into the pipeline and back.
///
/// Failures that happen before the pipeline can run get their own terminal
/// responses here: 405 for a method outside RFC 9110, 400 for a body that
/// cannot be read. Everything else — including handler faults — is the
/// pipeline's problem, and it always produces exactly one outcome.
async fn handle_request(
    pipeline: Arc<Pipeline>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Error> {
    let Ok(method) = Method::try_from(req.method()) else {
        return Ok(Response::status(Status::MethodNotAllowed).into_http());
    };

    let target = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path().to_owned(), ToString::to_string);

    let headers = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (name.as_str().to_owned(), String::from_utf8_lossy(value.as_bytes()).into_owned())
        })
        .collect();

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(e) => {
            error!("failed to read request body: {e}");
            return Ok(Response::status(Status::BadRequest).into_http());
        }
    };

    let request = Request::new(method, &target, headers, body);
    let mut ctx = Context::new();

    match pipeline.handle(&mut ctx, request).await {
        Outcome::Respond(response) => Ok(response.into_http()),
        Outcome::Abort => Err(Error::Aborted),
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal: SIGTERM or SIGINT (Ctrl-C) on
/// Unix, Ctrl-C only elsewhere.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
