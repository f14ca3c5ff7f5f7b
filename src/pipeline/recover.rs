//! Error boundary — the outermost stage and the single point of failure
//! containment.
//!
//! Everything downstream runs inside this stage: a handler returning
//! `Err(Fault)` or panicking, or any inner stage re-raising a fault, ends up
//! here and nowhere else. The transport layer never sees a raw failure.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::json;
use tracing::error;

use crate::error::Fault;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

use super::{Context, Next, Outcome, Stage, StageFuture};

pub(super) struct Recover {
    development: bool,
}

impl Recover {
    pub(super) fn new(development: bool) -> Self {
        Self { development }
    }
}

impl Stage for Recover {
    fn handle<'a>(&'a self, ctx: &'a mut Context, req: Request, next: Next<'a>)
    -> StageFuture<'a> {
        Box::pin(async move {
            // The request moves downstream; keep what the error log needs.
            let method = req.method();
            let path = req.path().to_owned();

            let downstream = AssertUnwindSafe(next.run(&mut *ctx, req)).catch_unwind();
            let fault = match downstream.await {
                Ok(Ok(outcome)) => return Ok(outcome),
                Ok(Err(fault)) => fault,
                Err(panic) => Fault::panic(panic_message(panic.as_ref())),
            };

            error!(
                %method,
                %path,
                kind = fault.kind(),
                error = fault.message(),
                "unhandled failure while processing request"
            );

            if ctx.response_started() {
                // Part of the response is already on the wire; rewriting
                // status or headers is no longer possible.
                return Ok(Outcome::Abort);
            }

            Ok(Outcome::Respond(failure_response(self.development, &fault)))
        })
    }
}

/// The sanitized 500 body. `detail` carries the fault's message only in
/// development; production clients get an empty string, never internal text.
pub(super) fn failure_response(development: bool, fault: &Fault) -> Response {
    let detail = if development { fault.message() } else { "" };
    let body = json!({
        "statusCode": 500,
        "message": "an unexpected error occurred",
        "detail": detail,
    });

    // Serializing a json! literal cannot fail; fall back to no body if the
    // impossible happens rather than panicking inside the boundary.
    let bytes = serde_json::to_vec(&body).unwrap_or_default();
    Response::builder().status(Status::InternalServerError).json(bytes)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_owned()
    }
}
