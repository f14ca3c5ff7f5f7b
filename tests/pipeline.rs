//! End-to-end pipeline behavior, driven through `Pipeline::handle` directly —
//! no sockets involved.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use palisade::{Config, Context, Fault, Method, Outcome, Pipeline, Request, Response, Router};

const DENIED_UNAUTHENTICATED: &str = "Access denied: authenticated = false";
const DENIED_UNAUTHORIZED: &str = "Access denied: only authrized personal can update the data";
const NOT_FOUND_BODY: &str = "Sorry we couldn't find that page";

// ── Helpers ───────────────────────────────────────────────────────────────────

fn request(method: Method, target: &str) -> Request {
    Request::new(method, target, vec![], vec![])
}

/// A handler that counts its invocations, for verifying short-circuits.
fn counting(counter: &Arc<AtomicUsize>) -> impl Fn(Request) -> HandlerFut + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move |_req: Request| {
        let counter = Arc::clone(&counter);
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Response::text("hit"))
        })
    }
}

type HandlerFut =
    std::pin::Pin<Box<dyn Future<Output = Result<Response, Fault>> + Send + 'static>>;

fn respond(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Respond(resp) => resp,
        Outcome::Abort => panic!("expected a response, got an abort"),
    }
}

async fn run(pipeline: &Pipeline, req: Request) -> Outcome {
    let mut ctx = Context::new();
    pipeline.handle(&mut ctx, req).await
}

// ── Gates ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_authentication_flag_is_rejected_before_the_handler() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new().on(Method::Get, "/users", counting(&hits));
    let pipeline = Pipeline::builder().build(router);

    for target in ["/users", "/users?authenticated=false", "/users?authenticated=yes"] {
        let resp = respond(run(&pipeline, request(Method::Get, target)).await);
        assert_eq!(resp.status_code(), 403, "target {target}");
        assert_eq!(resp.body(), DENIED_UNAUTHENTICATED.as_bytes());
    }

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn mutating_methods_require_the_authorization_flag() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .on(Method::Post, "/users", counting(&hits))
        .on(Method::Put, "/users", counting(&hits));
    let pipeline = Pipeline::builder().build(router);

    for method in [Method::Post, Method::Put] {
        let resp = respond(run(&pipeline, request(method, "/users?authenticated=true")).await);
        assert_eq!(resp.status_code(), 403);
        assert_eq!(resp.body(), DENIED_UNAUTHORIZED.as_bytes());
    }

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_mutating_methods_skip_the_authorization_gate() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .on(Method::Get, "/users", counting(&hits))
        .on(Method::Delete, "/users", counting(&hits));
    let pipeline = Pipeline::builder().build(router);

    // Same query a rejected POST would carry: authenticated but not authorized.
    for method in [Method::Get, Method::Delete] {
        let resp = respond(run(&pipeline, request(method, "/users?authenticated=true")).await);
        assert_eq!(resp.status_code(), 200);
    }

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn authorized_mutations_reach_the_handler() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .on(Method::Post, "/users", counting(&hits))
        .on(Method::Put, "/users", counting(&hits));
    let pipeline = Pipeline::builder().build(router);

    for method in [Method::Post, Method::Put] {
        let resp = respond(
            run(&pipeline, request(method, "/users?authenticated=true&authorized=true")).await,
        );
        assert_eq!(resp.status_code(), 200);
        assert_eq!(resp.body(), b"hit");
    }

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn injected_predicates_replace_the_query_flags() {
    let router = Router::new().on(Method::Get, "/secure", |_req: Request| async {
        Ok::<_, Fault>(Response::text("in"))
    });
    let pipeline = Pipeline::builder()
        .authenticate(|req| req.header("x-user").is_some())
        .build(router);

    let denied = respond(run(&pipeline, request(Method::Get, "/secure")).await);
    assert_eq!(denied.status_code(), 403);

    let req = Request::new(
        Method::Get,
        "/secure",
        vec![("x-user".into(), "alice".into())],
        vec![],
    );
    let allowed = respond(run(&pipeline, req).await);
    assert_eq!(allowed.status_code(), 200);
}

// ── Fallback ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unregistered_paths_fall_back_to_404() {
    let router = Router::new().on(Method::Get, "/users", |_req: Request| async {
        Ok::<_, Fault>(Response::text("hit"))
    });
    let pipeline = Pipeline::builder().build(router);

    let resp = respond(
        run(&pipeline, request(Method::Get, "/nowhere?authenticated=true&authorized=true")).await,
    );
    assert_eq!(resp.status_code(), 404);
    assert_eq!(resp.body(), NOT_FOUND_BODY.as_bytes());
}

// ── Error boundary ────────────────────────────────────────────────────────────

async fn failing(_req: Request) -> Result<Response, Fault> {
    Err(Fault::new("database exploded"))
}

fn error_body(resp: &Response) -> serde_json::Value {
    assert_eq!(resp.header("content-type"), Some("application/json"));
    serde_json::from_slice(resp.body()).unwrap()
}

#[tokio::test]
async fn handler_faults_become_sanitized_500s_in_production() {
    let router = Router::new().on(Method::Get, "/boom", failing);
    let pipeline = Pipeline::builder().config(Config::production()).build(router);

    let resp = respond(run(&pipeline, request(Method::Get, "/boom?authenticated=true")).await);
    assert_eq!(resp.status_code(), 500);

    let body = error_body(&resp);
    assert_eq!(body["statusCode"], 500);
    assert_eq!(body["message"], "an unexpected error occurred");
    assert_eq!(body["detail"], "");
}

#[tokio::test]
async fn development_exposes_the_fault_message_as_detail() {
    let router = Router::new().on(Method::Get, "/boom", failing);
    let pipeline = Pipeline::builder().config(Config::development()).build(router);

    let resp = respond(run(&pipeline, request(Method::Get, "/boom?authenticated=true")).await);
    assert_eq!(resp.status_code(), 500);
    assert_eq!(error_body(&resp)["detail"], "database exploded");
}

#[tokio::test]
async fn panicking_handlers_are_contained() {
    async fn panicking(_req: Request) -> Result<Response, Fault> {
        panic!("unreachable state")
    }

    let router = Router::new().on(Method::Get, "/panic", panicking);
    let pipeline = Pipeline::builder().config(Config::development()).build(router);

    let resp = respond(run(&pipeline, request(Method::Get, "/panic?authenticated=true")).await);
    assert_eq!(resp.status_code(), 500);
    assert_eq!(error_body(&resp)["detail"], "unreachable state");
}

#[tokio::test]
async fn a_started_response_is_aborted_not_rewritten() {
    let router = Router::new().on(Method::Get, "/boom", failing);
    let pipeline = Pipeline::builder().build(router);

    let mut ctx = Context::new();
    ctx.mark_response_started();

    let outcome = pipeline
        .handle(&mut ctx, request(Method::Get, "/boom?authenticated=true"))
        .await;
    assert!(matches!(outcome, Outcome::Abort));
}

#[tokio::test]
async fn a_started_response_turns_gate_rejection_into_abort() {
    let router = Router::new().on(Method::Get, "/users", |_req: Request| async {
        Ok::<_, Fault>(Response::text("hit"))
    });
    let pipeline = Pipeline::builder().build(router);

    let mut ctx = Context::new();
    ctx.mark_response_started();

    let outcome = pipeline.handle(&mut ctx, request(Method::Get, "/users")).await;
    assert!(matches!(outcome, Outcome::Abort));
}

// ── Instrumentation ───────────────────────────────────────────────────────────

#[tokio::test]
async fn measured_duration_covers_the_handler() {
    let router = Router::new().on(Method::Get, "/slow", |_req: Request| async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, Fault>(Response::text("done"))
    });
    let pipeline = Pipeline::builder().build(router);

    let mut ctx = Context::new();
    let outcome = pipeline
        .handle(&mut ctx, request(Method::Get, "/slow?authenticated=true"))
        .await;

    assert_eq!(respond(outcome).status_code(), 200);
    let elapsed = ctx.elapsed().expect("timing stage must record a duration");
    assert!(elapsed >= Duration::from_millis(50), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn gate_rejections_are_still_timed() {
    let router = Router::new().on(Method::Get, "/users", |_req: Request| async {
        Ok::<_, Fault>(Response::text("hit"))
    });
    let pipeline = Pipeline::builder().build(router);

    let mut ctx = Context::new();
    let outcome = pipeline.handle(&mut ctx, request(Method::Get, "/users")).await;

    assert_eq!(respond(outcome).status_code(), 403);
    assert!(ctx.elapsed().is_some());
}

// ── Idempotence ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn identical_requests_produce_identical_outcomes() {
    let router = Router::new().on(Method::Get, "/users/{id}", |req: Request| async move {
        let id = req.param("id").unwrap_or("?").to_owned();
        Ok::<_, Fault>(Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes()))
    });
    let pipeline = Pipeline::builder().build(router);

    let first = respond(run(&pipeline, request(Method::Get, "/users/7?authenticated=true")).await);
    let second = respond(run(&pipeline, request(Method::Get, "/users/7?authenticated=true")).await);

    assert_eq!(first.status_code(), second.status_code());
    assert_eq!(first.body(), second.body());
}

// ── Documentation stage ───────────────────────────────────────────────────────

#[tokio::test]
async fn docs_bypass_the_gates_in_development() {
    let router = Router::new().on(Method::Get, "/users", |_req: Request| async {
        Ok::<_, Fault>(Response::text("hit"))
    });
    let pipeline = Pipeline::builder().config(Config::development()).build(router);

    // No auth signals on either request.
    let browser = respond(run(&pipeline, request(Method::Get, "/docs")).await);
    assert_eq!(browser.status_code(), 200);
    assert_eq!(browser.header("content-type"), Some("text/html; charset=utf-8"));

    let spec = respond(run(&pipeline, request(Method::Get, "/docs/api.json")).await);
    assert_eq!(spec.status_code(), 200);
    let doc: serde_json::Value = serde_json::from_slice(spec.body()).unwrap();
    assert_eq!(doc["paths"]["/users"], serde_json::json!(["GET"]));
}

#[tokio::test]
async fn docs_do_not_exist_in_production() {
    let router = Router::new().on(Method::Get, "/users", |_req: Request| async {
        Ok::<_, Fault>(Response::text("hit"))
    });
    let pipeline = Pipeline::builder().config(Config::production()).build(router);

    // Without auth signals the authentication gate answers first.
    let gated = respond(run(&pipeline, request(Method::Get, "/docs")).await);
    assert_eq!(gated.status_code(), 403);

    // With them, /docs is just an unregistered path.
    let missing = respond(run(&pipeline, request(Method::Get, "/docs?authenticated=true")).await);
    assert_eq!(missing.status_code(), 404);
    assert_eq!(missing.body(), NOT_FOUND_BODY.as_bytes());
}
