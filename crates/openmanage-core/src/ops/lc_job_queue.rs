use openmanage_api::lc_jobs::status;
use openmanage_api::{ApiFamily, Session};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{messages, require_or};
use crate::diff::{Action, plan, state};
use crate::error::CoreError;
use crate::interpret::SuccessPredicate;
use crate::lifecycle::{Operation, OperationContext};
use crate::result::OperationResult;

/// Clear the whole Lifecycle Controller job queue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LcJobQueueDelete {}

impl Operation for LcJobQueueDelete {
    const NAME: &'static str = "idrac_lifecycle_controller_job_queue_delete";

    fn family(&self) -> ApiFamily {
        ApiFamily::Redfish
    }

    async fn run(
        &self,
        session: &mut Session,
        ctx: &OperationContext,
    ) -> Result<OperationResult, CoreError> {
        let current = session.job_manager().pending_jobs().await?;
        let pending = match current.body_str("Status") {
            Some(status::SUCCESS) => current
                .body()
                .get("Jobs")
                .and_then(Value::as_array)
                .map(Vec::len),
            _ => None,
        };
        let observed = pending.map(|n| state([("pending_jobs", Value::from(n))]));

        let desired = state([("pending_jobs", Value::from(0))]);
        let plan = plan(&desired, observed.as_ref(), ctx.check_mode()).map_err(|_| {
            CoreError::indeterminate(format!(
                "unable to read the job queue: {}",
                current.body_str("Message").unwrap_or("unknown error")
            ))
        })?;
        debug!(?pending, action = ?plan.action(), "planned job queue delete");

        match plan.action() {
            Action::Noop => Ok(OperationResult::ok("The job queue is already empty.")),
            Action::WouldChange => Ok(OperationResult::changed(messages::CHANGES_FOUND)),
            Action::Apply => {
                let resp = session.job_manager().delete_all_jobs().await?;
                require_or(
                    &resp,
                    &SuccessPredicate::DriverResult,
                    "Failed to delete the job queue.",
                )?;
                Ok(OperationResult::changed("Successfully deleted the job queue.")
                    .with_payload("status", resp.into_body()))
            }
        }
    }
}
