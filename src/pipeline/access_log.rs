//! Access log stage — structured request/response logging.
//!
//! Side effect only: this stage never alters the response and never fails
//! the request. Bodies are logged up to [`BODY_LOG_LIMIT`] bytes and
//! truncated past it; binary content degrades to lossy UTF-8.

use tracing::info;

use crate::request::Request;

use super::{Context, Next, Outcome, Stage, StageFuture};

/// Cap on logged request and response body excerpts, in bytes.
pub(super) const BODY_LOG_LIMIT: usize = 4096;

pub(super) struct AccessLog;

impl Stage for AccessLog {
    fn handle<'a>(&'a self, ctx: &'a mut Context, req: Request, next: Next<'a>)
    -> StageFuture<'a> {
        Box::pin(async move {
            let method = req.method();
            let path = req.path().to_owned();

            info!(
                %method,
                %path,
                headers = ?req.headers(),
                body = %excerpt(req.body()),
                "request"
            );

            // A fault propagates to the error boundary before the response
            // line is logged; the boundary's own error record covers it.
            let outcome = next.run(&mut *ctx, req).await?;

            match &outcome {
                Outcome::Respond(resp) => info!(
                    %method,
                    %path,
                    status = resp.status_code(),
                    body = %excerpt(resp.body()),
                    "response"
                ),
                Outcome::Abort => info!(%method, %path, "connection aborted"),
            }

            Ok(outcome)
        })
    }
}

/// Body excerpt for logging: at most [`BODY_LOG_LIMIT`] bytes, lossily
/// decoded. A cut mid-codepoint just yields a replacement character at the
/// end of the excerpt — truncation never fails the request.
fn excerpt(body: &[u8]) -> String {
    let capped = &body[..body.len().min(BODY_LOG_LIMIT)];
    let mut text = String::from_utf8_lossy(capped).into_owned();
    if body.len() > BODY_LOG_LIMIT {
        text.push_str(" …[truncated]");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_passes_short_bodies_through() {
        assert_eq!(excerpt(b"hello"), "hello");
        assert_eq!(excerpt(b""), "");
    }

    #[test]
    fn excerpt_truncates_at_the_cap() {
        let body = vec![b'a'; BODY_LOG_LIMIT + 100];
        let text = excerpt(&body);
        assert!(text.starts_with(&"a".repeat(BODY_LOG_LIMIT)));
        assert!(text.ends_with("…[truncated]"));
    }

    #[test]
    fn excerpt_degrades_binary_to_lossy_utf8() {
        let text = excerpt(&[0xff, 0xfe, b'o', b'k']);
        assert!(text.contains("ok"));
    }
}
