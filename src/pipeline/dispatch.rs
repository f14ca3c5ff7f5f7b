//! Route dispatcher — the chain's base case.
//!
//! Resolves the request against the route table and invokes the matched
//! handler, adopting its response. A handler fault re-raises to the error
//! boundary. No match produces the fixed 404 fallback; a miss is expected
//! traffic and is not logged as a warning. This stage never delegates
//! further — there is nothing further.

use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

use super::{Context, Outcome, StageFuture};

pub(super) const NOT_FOUND_BODY: &str = "Sorry we couldn't find that page";

pub(super) struct Dispatcher {
    router: Router,
}

impl Dispatcher {
    pub(super) fn new(router: Router) -> Self {
        Self { router }
    }

    pub(super) fn dispatch<'a>(&'a self, _ctx: &'a mut Context, mut req: Request)
    -> StageFuture<'a> {
        Box::pin(async move {
            match self.router.lookup(req.method(), req.path()) {
                Some((handler, params)) => {
                    req.set_params(params);
                    let response = handler.call(req).await?;
                    Ok(Outcome::Respond(response))
                }
                None => Ok(Outcome::Respond(
                    Response::builder().status(Status::NotFound).text(NOT_FOUND_BODY),
                )),
            }
        })
    }
}
