//! Documentation stage — development only.
//!
//! Serves a machine-readable API description at `/docs/api.json` and a
//! human-browsable page at `/docs`. The stage mounts outside the gates, so
//! documentation needs no auth signals; the builder only adds it at all in
//! development configuration, and production deployments have neither path.

use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::request::Request;
use crate::response::{ContentType, Response};
use crate::router::Router;

use super::{Context, Next, Outcome, Stage, StageFuture};

/// API documentation generator: an external capability from the pipeline's
/// point of view. [`RouteDocs`] is the built-in implementation; inject your
/// own via [`PipelineBuilder::docs`](crate::PipelineBuilder::docs) to serve
/// a hand-written spec instead.
pub trait ApiDocs: Send + Sync + 'static {
    /// The machine-readable description, as JSON bytes.
    fn document(&self) -> Vec<u8>;

    /// The human-browsable page, as HTML.
    fn browser(&self) -> String;
}

// ── Stage ─────────────────────────────────────────────────────────────────────

pub(super) struct Docs {
    docs: Arc<dyn ApiDocs>,
}

impl Docs {
    pub(super) fn new(docs: Arc<dyn ApiDocs>) -> Self {
        Self { docs }
    }
}

impl Stage for Docs {
    fn handle<'a>(&'a self, ctx: &'a mut Context, req: Request, next: Next<'a>)
    -> StageFuture<'a> {
        Box::pin(async move {
            match req.path() {
                "/docs" | "/docs/" => {
                    Ok(Outcome::Respond(
                        Response::builder().bytes(ContentType::Html, self.docs.browser().into_bytes()),
                    ))
                }
                "/docs/api.json" => Ok(Outcome::Respond(Response::json(self.docs.document()))),
                _ => next.run(&mut *ctx, req).await,
            }
        })
    }
}

// ── Default generator ─────────────────────────────────────────────────────────

/// The default [`ApiDocs`]: a description generated from the route table at
/// pipeline build time.
pub struct RouteDocs {
    routes: Vec<(String, String)>,
}

impl RouteDocs {
    pub fn from_router(router: &Router) -> Self {
        let routes = router
            .routes()
            .iter()
            .map(|(method, path)| (method.to_string(), path.clone()))
            .collect();
        Self { routes }
    }
}

impl ApiDocs for RouteDocs {
    fn document(&self) -> Vec<u8> {
        let mut paths: Map<String, Value> = Map::new();
        for (method, path) in &self.routes {
            let entry = paths
                .entry(path.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(methods) = entry {
                methods.push(Value::String(method.clone()));
            }
        }

        let doc = json!({
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "paths": paths,
        });

        serde_json::to_vec_pretty(&doc).unwrap_or_default()
    }

    fn browser(&self) -> String {
        let mut rows = String::new();
        for (method, path) in &self.routes {
            rows.push_str(&format!("<li><code>{method} {path}</code></li>\n"));
        }

        format!(
            "<!doctype html>\n<html>\n<head><title>API documentation</title></head>\n\
             <body>\n<h1>Registered routes</h1>\n<ul>\n{rows}</ul>\n\
             <p>Machine-readable description: <a href=\"/docs/api.json\">/docs/api.json</a></p>\n\
             </body>\n</html>\n"
        )
    }
}
