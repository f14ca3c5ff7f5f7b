//! # palisade
//!
//! A fixed-order middleware pipeline for HTTP services.
//! One chain, one order, no surprises.
//!
//! ## The contract
//!
//! Your handlers own the business logic. palisade owns everything that wraps
//! it: failure containment, access logging, timing, and the authentication
//! and authorization gates. The chain order is fixed at build time and cannot
//! be rearranged — every service built on palisade behaves the same way at
//! the edges, which is the whole point of a pipeline.
//!
//! ```text
//! error boundary ⊃ access log ⊃ timing ⊃ (docs, dev only) ⊃ authn ⊃ authz ⊃ dispatch
//! ```
//!
//! Each stage either delegates to the next inner stage or short-circuits
//! with a terminal response. Exactly one terminal write happens per request:
//! a handler response, a gate rejection (403), the not-found fallback (404),
//! or a contained failure (500). Nothing else ever reaches the wire.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use palisade::{Config, Fault, Method, Pipeline, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::new()
//!         .on(Method::Get,  "/users/{id}", get_user)
//!         .on(Method::Post, "/users",      create_user);
//!
//!     let app = Pipeline::builder()
//!         .config(Config::from_env())
//!         .build(router);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Result<Response, Fault> {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Ok(Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes()))
//! }
//!
//! async fn create_user(req: Request) -> Result<Response, Fault> {
//!     // Reaching this handler required authenticated=true and
//!     // authorized=true (or whatever predicates you injected instead).
//!     let body: serde_json::Value = serde_json::from_slice(req.body())?;
//!     Ok(Response::json(serde_json::to_vec(&body)?))
//! }
//! ```
//!
//! ## Trust signals are placeholders
//!
//! The default gate predicates check the query flags `authenticated=true`
//! and `authorized=true`. That is a demo-grade trust signal, not security.
//! Inject real predicates with [`PipelineBuilder::authenticate`] and
//! [`PipelineBuilder::authorize`] before deploying anything that matters —
//! the gate ordering and rejection contract stay the same either way.

mod config;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod pipeline;

pub use config::Config;
pub use error::{Error, Fault};
pub use handler::Handler;
pub use method::Method;
pub use pipeline::{ApiDocs, Context, Next, Outcome, Pipeline, PipelineBuilder, Stage};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
