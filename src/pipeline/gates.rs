//! Authentication and authorization gates.
//!
//! A gate does exactly one thing: pass or reject, based on an injected
//! predicate over the request. Pass delegates downstream unchanged; reject
//! short-circuits with a fixed 403 body, logged at warning severity — a
//! rejection is expected traffic, not an error.
//!
//! Ordering is a pipeline invariant: authentication always runs before
//! authorization, so a request failing authentication never reaches the
//! authorization check.
//!
//! The default predicates read the query flags `authenticated=true` and
//! `authorized=true`. These are placeholder trust signals kept for wire
//! compatibility with the service this crate ports — swap them out via
//! [`PipelineBuilder`](crate::PipelineBuilder) for anything real.

use std::sync::Arc;

use tracing::warn;

use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

use super::{Context, Next, Outcome, Stage, StageFuture};

/// A pass/reject decision over a request. The gates own no policy beyond
/// calling this.
pub type GatePredicate = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

pub(super) const DENIED_UNAUTHENTICATED: &str = "Access denied: authenticated = false";
// Wire-compatible with the original service, typo included.
pub(super) const DENIED_UNAUTHORIZED: &str =
    "Access denied: only authrized personal can update the data";

pub(super) fn authenticated_flag() -> GatePredicate {
    query_flag("authenticated")
}

pub(super) fn authorized_flag() -> GatePredicate {
    query_flag("authorized")
}

fn query_flag(name: &'static str) -> GatePredicate {
    Arc::new(move |req| req.query(name) == Some("true"))
}

/// Shared rejection path: warn, then 403 — unless the response already
/// started, in which case the only legal move is an abort.
fn reject(ctx: &Context, reason: &'static str, body: &'static str, req: &Request) -> Outcome {
    warn!(
        path = %req.path(),
        query = %req.query_raw(),
        "403 Forbidden - {reason}"
    );

    if ctx.response_started() {
        Outcome::Abort
    } else {
        Outcome::Respond(Response::builder().status(Status::Forbidden).text(body))
    }
}

// ── Authentication ────────────────────────────────────────────────────────────

pub(super) struct Authentication {
    predicate: GatePredicate,
}

impl Authentication {
    pub(super) fn new(predicate: GatePredicate) -> Self {
        Self { predicate }
    }
}

impl Stage for Authentication {
    fn handle<'a>(&'a self, ctx: &'a mut Context, req: Request, next: Next<'a>)
    -> StageFuture<'a> {
        Box::pin(async move {
            if (self.predicate)(&req) {
                next.run(&mut *ctx, req).await
            } else {
                Ok(reject(ctx, "unauthenticated request", DENIED_UNAUTHENTICATED, &req))
            }
        })
    }
}

// ── Authorization ─────────────────────────────────────────────────────────────

pub(super) struct Authorization {
    predicate: GatePredicate,
}

impl Authorization {
    pub(super) fn new(predicate: GatePredicate) -> Self {
        Self { predicate }
    }
}

impl Stage for Authorization {
    fn handle<'a>(&'a self, ctx: &'a mut Context, req: Request, next: Next<'a>)
    -> StageFuture<'a> {
        Box::pin(async move {
            // Only mutating methods (PUT, POST) are gated; everything else
            // passes through unconditionally.
            if !req.method().is_mutating() || (self.predicate)(&req) {
                next.run(&mut *ctx, req).await
            } else {
                Ok(reject(ctx, "unauthorized request", DENIED_UNAUTHORIZED, &req))
            }
        })
    }
}
