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

/// Delete one Lifecycle Controller job.
///
/// The job must exist: an unknown id fails with `Invalid Job ID` and
/// `changed = false`.
#[derive(Debug, Clone, Deserialize)]
pub struct LcJobDelete {
    pub job_id: String,
}

impl Operation for LcJobDelete {
    const NAME: &'static str = "idrac_lifecycle_controller_job_delete";

    fn family(&self) -> ApiFamily {
        ApiFamily::Redfish
    }

    async fn run(
        &self,
        session: &mut Session,
        ctx: &OperationContext,
    ) -> Result<OperationResult, CoreError> {
        let job_id = self.job_id.trim();
        let current = session.job_manager().job_status(job_id).await?;
        let reported = current.body_str("Status").map(str::to_owned);
        let observed = match reported.as_deref() {
            Some(status::FOUND_FAULT) => {
                return Err(CoreError::remote_with(
                    format!("Invalid Job ID: {job_id}"),
                    "status",
                    current.into_body(),
                ));
            }
            Some(status::SUCCESS) => Some(state([("job_present", Value::Bool(true))])),
            _ => None,
        };

        let desired = state([("job_present", Value::Bool(false))]);
        let plan = plan(&desired, observed.as_ref(), ctx.check_mode()).map_err(|_| {
            CoreError::indeterminate(format!(
                "unable to read the status of job {job_id}: {}",
                current.body_str("Message").unwrap_or("unknown error")
            ))
        })?;
        debug!(job_id, action = ?plan.action(), "planned job delete");

        match plan.action() {
            Action::Noop => Ok(OperationResult::ok(messages::NO_CHANGES)),
            Action::WouldChange => Ok(OperationResult::changed(messages::CHANGES_FOUND)),
            Action::Apply => {
                let resp = session.job_manager().delete_job(job_id).await?;
                require_or(
                    &resp,
                    &SuccessPredicate::DriverResult,
                    format!("Failed to delete the Job: {job_id}."),
                )?;
                Ok(OperationResult::changed("Successfully deleted the job.")
                    .with_payload("status", resp.into_body()))
            }
        }
    }
}
