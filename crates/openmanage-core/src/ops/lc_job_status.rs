use openmanage_api::lc_jobs::status;
use openmanage_api::{ApiFamily, Session};
use serde::Deserialize;

use super::require_or;
use crate::error::CoreError;
use crate::interpret::SuccessPredicate;
use crate::lifecycle::{Operation, OperationContext};
use crate::result::OperationResult;

/// Read the status of one Lifecycle Controller job.
#[derive(Debug, Clone, Deserialize)]
pub struct LcJobStatus {
    pub job_id: String,
}

impl Operation for LcJobStatus {
    const NAME: &'static str = "idrac_lifecycle_controller_job_status_info";

    fn family(&self) -> ApiFamily {
        ApiFamily::Redfish
    }

    async fn run(
        &self,
        session: &mut Session,
        _ctx: &OperationContext,
    ) -> Result<OperationResult, CoreError> {
        let job_id = self.job_id.trim();
        let resp = session.job_manager().job_status(job_id).await?;

        if resp.body_str("Status") == Some(status::FOUND_FAULT) {
            return Err(CoreError::remote("Job ID is invalid."));
        }
        require_or(
            &resp,
            &SuccessPredicate::DriverResult,
            format!(
                "Unable to fetch the job info: {}",
                resp.body_str("Message").unwrap_or("unknown error")
            ),
        )?;

        Ok(OperationResult::ok("Successfully fetched the job info")
            .with_payload("job_info", resp.into_body()))
    }
}
