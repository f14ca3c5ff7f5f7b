//! Timing stage — wall-clock measurement of everything downstream.
//!
//! The measurement covers the remaining stages and the route handler,
//! including gate rejections that short-circuit below this point. The
//! duration goes to the console, to the structured logger, and onto the
//! [`Context`] where tests (or a caller-side metrics exporter) can read it.

use std::time::Instant;

use tracing::info;

use crate::request::Request;

use super::{Context, Next, Stage, StageFuture};

pub(super) struct Timing;

impl Stage for Timing {
    fn handle<'a>(&'a self, ctx: &'a mut Context, req: Request, next: Next<'a>)
    -> StageFuture<'a> {
        Box::pin(async move {
            let start = Instant::now();
            // A fault skips the measurement emit on its way to the boundary.
            let outcome = next.run(&mut *ctx, req).await?;
            let elapsed = start.elapsed();

            println!("Execution time: {elapsed:?}");
            info!(elapsed_ms = elapsed.as_millis() as u64, "execution time");
            ctx.set_elapsed(elapsed);

            Ok(outcome)
        })
    }
}
