//! The fixed-order middleware pipeline.
//!
//! Every request flows through the same stage chain:
//!
//! ```text
//! error boundary ⊃ access log ⊃ timing ⊃ (docs, dev only) ⊃ authn ⊃ authz ⊃ dispatch
//! ```
//!
//! A [`Stage`] receives the request, a `&mut` [`Context`], and a [`Next`]
//! capability over the remainder of the chain. It either delegates
//! (optionally post-processing what comes back) or short-circuits with a
//! terminal [`Outcome`] and never invokes downstream. The composition is an
//! explicit ordered list built once at startup — no closure chains, no
//! shared mutable state between requests.
//!
//! The order is not configurable. What *is* configurable is the behavior
//! inside the stages: the deployment [`Config`], the gate predicates, and
//! the [`ApiDocs`] capability, all injected through [`PipelineBuilder`].

mod access_log;
mod dispatch;
mod docs;
mod gates;
mod recover;
mod timing;

pub use docs::{ApiDocs, RouteDocs};
pub use gates::GatePredicate;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use crate::config::Config;
use crate::error::Fault;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

use access_log::AccessLog;
use dispatch::Dispatcher;
use docs::Docs;
use gates::{Authentication, Authorization};
use recover::Recover;
use timing::Timing;

// ── Stage contract ────────────────────────────────────────────────────────────

/// A boxed future returned by a stage.
pub type StageFuture<'a> = Pin<Box<dyn Future<Output = Result<Outcome, Fault>> + Send + 'a>>;

/// Terminal result of a chain traversal.
#[derive(Debug)]
pub enum Outcome {
    /// Write this response to the client. Exactly one per request.
    Respond(Response),
    /// Tear the connection down without writing. Only valid once the
    /// response has started streaming and can no longer be rewritten.
    Abort,
}

/// One link in the middleware chain.
///
/// A stage must uphold two rules:
/// - invoke `next` at most once — delegating twice would double-write;
/// - never let a [`Fault`] escape undecorated unless re-raising it to the
///   error boundary is the intent. Only the boundary turns faults into
///   responses.
pub trait Stage: Send + Sync + 'static {
    fn handle<'a>(&'a self, ctx: &'a mut Context, req: Request, next: Next<'a>)
    -> StageFuture<'a>;
}

/// Capability to invoke the rest of the chain. Consumed on use, so a stage
/// cannot delegate twice.
pub struct Next<'a> {
    stages: &'a [Arc<dyn Stage>],
    dispatcher: &'a Dispatcher,
}

impl<'a> Next<'a> {
    /// Runs the remaining stages, bottoming out at the route dispatcher.
    pub fn run<'b>(self, ctx: &'b mut Context, req: Request) -> StageFuture<'b>
    where
        'a: 'b,
    {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Next { stages: rest, dispatcher: self.dispatcher };
                stage.handle(ctx, req, next)
            }
            None => self.dispatcher.dispatch(ctx, req),
        }
    }
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Per-request bookkeeping shared by the stages.
///
/// One `Context` exists per request, owned by that request's task and passed
/// by `&mut` through the chain — never cloned, never shared across requests.
#[derive(Debug, Default)]
pub struct Context {
    started: bool,
    elapsed: Option<Duration>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once any byte of the response has been flushed to the client.
    ///
    /// This is the invariant gate for late mutation: while false, a stage may
    /// still replace status, headers, and body; once true, the only legal
    /// move left is [`Outcome::Abort`].
    pub fn response_started(&self) -> bool {
        self.started
    }

    /// Marks the response as started. Called by transports (or streaming
    /// handlers) the instant bytes hit the wire; irreversible.
    pub fn mark_response_started(&mut self) {
        self.started = true;
    }

    /// Wall-clock duration measured by the timing stage, covering everything
    /// downstream of it. `None` until that stage's post-processing has run.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    pub(crate) fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = Some(elapsed);
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// The assembled stage chain plus its dispatcher base case.
///
/// Build with [`Pipeline::builder`], then either hand it to
/// [`Server::serve`](crate::Server::serve) or drive it directly with
/// [`Pipeline::handle`] (which is how the integration tests exercise it,
/// no socket required).
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
    dispatcher: Dispatcher,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Processes one request through the full chain.
    ///
    /// The error boundary sits at the head of the chain, so a fault cannot
    /// normally reach this function; the fallback arm keeps the contract
    /// total anyway — a stray fault still becomes a sanitized 500, or an
    /// abort when the response already started.
    pub async fn handle(&self, ctx: &mut Context, req: Request) -> Outcome {
        let next = Next { stages: &self.stages, dispatcher: &self.dispatcher };
        match next.run(ctx, req).await {
            Ok(outcome) => outcome,
            Err(fault) => {
                error!(kind = fault.kind(), error = fault.message(), "fault escaped the error boundary");
                if ctx.response_started() {
                    Outcome::Abort
                } else {
                    Outcome::Respond(recover::failure_response(false, &fault))
                }
            }
        }
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Configures and assembles a [`Pipeline`].
///
/// The stage order is fixed; the builder only injects behavior into the
/// stages. Defaults: production config, query-flag gate predicates
/// (`authenticated=true` / `authorized=true`), docs generated from the
/// route table.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Config,
    authenticate: Option<GatePredicate>,
    authorize: Option<GatePredicate>,
    docs: Option<Arc<dyn ApiDocs>>,
}

impl PipelineBuilder {
    /// Sets the deployment configuration. Defaults to production.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Replaces the authentication predicate.
    ///
    /// The default checks the query flag `authenticated=true` — a
    /// placeholder, not verified credentials. Real deployments inject a real
    /// check here; the gate's ordering and rejection contract do not change.
    pub fn authenticate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.authenticate = Some(Arc::new(predicate));
        self
    }

    /// Replaces the authorization predicate, evaluated for PUT and POST only.
    ///
    /// The default checks the query flag `authorized=true`.
    pub fn authorize<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.authorize = Some(Arc::new(predicate));
        self
    }

    /// Replaces the API documentation generator used by the dev-only docs
    /// stage. The default describes the registered routes.
    pub fn docs(mut self, docs: impl ApiDocs) -> Self {
        self.docs = Some(Arc::new(docs));
        self
    }

    /// Assembles the chain around `router`, nesting stages right-to-left.
    pub fn build(self, router: Router) -> Pipeline {
        let development = self.config.is_development();

        let mut stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(Recover::new(development)),
            Arc::new(AccessLog),
            Arc::new(Timing),
        ];

        // Docs mount outside the gates: documentation stays reachable
        // without auth signals, and only exists in development.
        if development {
            let docs = self
                .docs
                .unwrap_or_else(|| Arc::new(RouteDocs::from_router(&router)));
            stages.push(Arc::new(Docs::new(docs)));
        }

        stages.push(Arc::new(Authentication::new(
            self.authenticate.unwrap_or_else(gates::authenticated_flag),
        )));
        stages.push(Arc::new(Authorization::new(
            self.authorize.unwrap_or_else(gates::authorized_flag),
        )));

        Pipeline { stages, dispatcher: Dispatcher::new(router) }
    }
}
