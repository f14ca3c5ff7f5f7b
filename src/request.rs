//! Incoming HTTP request type — the per-request context the pipeline owns.

use std::collections::HashMap;

use crate::method::Method;

/// An incoming HTTP request.
///
/// Built once per request at the server boundary, owned exclusively by that
/// request's task, and moved down the stage chain into the matched handler.
/// Query parameters are parsed eagerly (last-wins on duplicate keys); route
/// parameters are injected by the dispatcher once a route matches.
pub struct Request {
    method: Method,
    path: String,
    query_raw: String,
    query: HashMap<String, String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    params: HashMap<String, String>,
}

impl Request {
    /// Builds a request from a method and a request target (`/path?query`).
    ///
    /// Public so tests and tools can feed the pipeline directly, without a
    /// socket in the loop.
    pub fn new(
        method: Method,
        target: &str,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        let (path, query_raw) = match target.split_once('?') {
            Some((p, q)) => (p.to_owned(), q.to_owned()),
            None => (target.to_owned(), String::new()),
        };

        // form_urlencoded yields pairs in wire order; inserting into the map
        // in that order makes duplicate keys last-wins.
        let query = form_urlencoded::parse(query_raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Self { method, path, query_raw, query, headers, body, params: HashMap::new() }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw query string, without the leading `?`. Empty if none was sent.
    pub fn query_raw(&self) -> &str {
        &self.query_raw
    }

    /// Returns a parsed query parameter. Duplicate keys resolve last-wins.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns a named route parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns
    /// `Some("42")`. Empty until the dispatcher has matched a route.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }
}
