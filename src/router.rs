//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. The router is a pure
//! route table: it resolves method + path to a handler and nothing else.
//! Cross-cutting behavior lives in the [`pipeline`](crate::pipeline), which
//! consults the router only through [`Router::lookup`].

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;

/// The application route table.
///
/// Build it once at startup and hand it to
/// [`PipelineBuilder::build`](crate::PipelineBuilder::build). Each
/// registration call returns `self` so routes chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    // Registration order, kept for the generated API description.
    registered: Vec<(Method, String)>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), registered: Vec::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax — `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use palisade::{Fault, Method, Request, Response, Router};
    /// # async fn get_user(_: Request) -> Result<Response, Fault> { Ok(Response::text("")) }
    /// # async fn create_user(_: Request) -> Result<Response, Fault> { Ok(Response::text("")) }
    /// Router::new()
    ///     .on(Method::Get,  "/users/{id}", get_user)
    ///     .on(Method::Post, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics on an invalid or conflicting path pattern. Routes are
    /// registered at startup, so this fails fast rather than at request time.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self.registered.push((method, path.to_owned()));
        self
    }

    pub(crate) fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// Every registered `(method, path)` pair, in registration order.
    pub fn routes(&self) -> &[(Method, String)] {
        &self.registered
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
