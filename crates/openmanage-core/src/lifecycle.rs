// ── Per-operation lifecycle ──
//
// Unopened -> Open -> (Executing)* -> Closed. `with_session` acquires the
// session, hands it to the operation, and closes it on every exit path,
// including a panic inside the operation. `run_operation` wraps that in
// the caller's tracing span and maps the outcome onto `OperationResult`.

use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use openmanage_api::{ApiFamily, Session, SessionConfig};
use tracing::{Instrument, Span, debug, info, warn};

use crate::error::CoreError;
use crate::result::OperationResult;

/// Per-invocation context injected by the caller.
///
/// Carries the check-mode flag and the span every log line of the
/// operation is recorded under. The core never installs a subscriber.
#[derive(Debug, Clone)]
pub struct OperationContext {
    check_mode: bool,
    span: Span,
}

impl OperationContext {
    pub fn new(check_mode: bool, span: Span) -> Self {
        Self { check_mode, span }
    }

    pub fn check_mode(&self) -> bool {
        self.check_mode
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new(false, Span::none())
    }
}

/// One logical task against one device.
#[allow(async_fn_in_trait)]
pub trait Operation {
    /// Name used in logs and by the `module` entry point.
    const NAME: &'static str;

    /// The API family this operation speaks.
    fn family(&self) -> ApiFamily;

    /// Run against an open session. Calls are awaited strictly in order.
    async fn run(
        &self,
        session: &mut Session,
        ctx: &OperationContext,
    ) -> Result<OperationResult, CoreError>;
}

/// Open a session, run `op` with it, and close it no matter how `op` ends.
///
/// If `open` fails there is nothing to release and the error is returned
/// as-is. If `op` panics the session is closed before the panic resumes.
pub async fn with_session<T>(
    config: SessionConfig,
    op: impl AsyncFnOnce(&mut Session) -> Result<T, CoreError>,
) -> Result<T, CoreError> {
    let mut session = Session::open(config).await?;
    let outcome = AssertUnwindSafe(op(&mut session)).catch_unwind().await;
    session.close().await;
    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Execute `op` inside its own scoped session and the context's span.
///
/// Never fails: every error is mapped onto the result contract.
pub async fn run_operation<O: Operation>(
    op: &O,
    config: SessionConfig,
    ctx: &OperationContext,
) -> OperationResult {
    async {
        info!(
            operation = O::NAME,
            family = %op.family(),
            check_mode = ctx.check_mode(),
            "starting operation"
        );
        let outcome = with_session(config, async |session: &mut Session| {
            op.run(session, ctx).await
        })
        .await;

        match outcome {
            Ok(result) => {
                debug!(
                    changed = result.is_changed(),
                    failed = result.is_failed(),
                    "operation finished"
                );
                result
            }
            Err(err) => {
                warn!(error = %err, unreachable = err.is_unreachable(), "operation failed");
                OperationResult::from_error(err)
            }
        }
    }
    .instrument(ctx.span().clone())
    .await
}
