//! Minimal palisade example — gated CRUD-style JSON endpoints.
//!
//! Run with:
//!   APP_ENV=development RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl 'http://localhost:3000/users/42?authenticated=true'
//!   curl 'http://localhost:3000/users/42'                       # 403: no auth flag
//!   curl -X POST 'http://localhost:3000/users?authenticated=true' \
//!        -H 'content-type: application/json' -d '{"name":"alice"}'   # 403: no authz flag
//!   curl -X POST 'http://localhost:3000/users?authenticated=true&authorized=true' \
//!        -H 'content-type: application/json' -d '{"name":"alice"}'
//!   curl 'http://localhost:3000/docs?x=1'                       # dev-only, no auth needed
//!   curl 'http://localhost:3000/nowhere?authenticated=true'     # the 404 fallback

use palisade::{Config, Fault, Method, Pipeline, Request, Response, Router, Server, Status};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let router = Router::new()
        .on(Method::Get,    "/users/{id}", get_user)
        .on(Method::Post,   "/users",      create_user)
        .on(Method::Delete, "/users/{id}", delete_user);

    let app = Pipeline::builder()
        .config(Config::from_env())
        .build(router);

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// GET /users/{id}
async fn get_user(req: Request) -> Result<Response, Fault> {
    let id = req.param("id").unwrap_or("unknown");
    Ok(Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes()))
}

// POST /users — reaching this required both gate flags.
async fn create_user(req: Request) -> Result<Response, Fault> {
    if req.body().is_empty() {
        return Ok(Response::status(Status::BadRequest));
    }

    // A malformed body is a deliberate 422; a serialization bug anywhere
    // else would surface as a Fault and the pipeline's sanitized 500.
    let Ok(input) = serde_json::from_slice::<serde_json::Value>(req.body()) else {
        return Ok(Response::status(Status::UnprocessableContent));
    };

    let body = serde_json::to_vec(&serde_json::json!({ "id": "99", "input": input }))?;
    Ok(Response::builder()
        .status(Status::Created)
        .header("location", "/users/99")
        .json(body))
}

// DELETE /users/{id} → 204 No Content. Not a mutating method for the
// authorization gate — only the authentication flag is required.
async fn delete_user(_req: Request) -> Result<Response, Fault> {
    Ok(Response::status(Status::NoContent))
}
