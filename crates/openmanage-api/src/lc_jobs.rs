// Lifecycle Controller job driver.
//
// Wraps the iDRAC Redfish OEM job service and reshapes every reply into
// a result dictionary: `{"Status": "Success" | "Error" | "Found Fault",
// "Message": ..., ...}`. Callers judge these by the `Status` key rather
// than by HTTP status.

use reqwest::StatusCode;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::Error;
use crate::request::RequestSpec;
use crate::response::ResponseEnvelope;
use crate::session::Session;

const JOBS_PATH: &str = "/redfish/v1/Managers/iDRAC.Embedded.1/Jobs";
const DELETE_JOB_QUEUE_PATH: &str = "/redfish/v1/Dell/Managers/iDRAC.Embedded.1/DellJobService/Actions/DellJobService.DeleteJobQueue";

/// Job id that asks the job service to clear the whole queue.
pub const CLEAR_ALL_JOBS: &str = "JID_CLEARALL";

/// Job fields copied from a job resource into the result dictionary.
const JOB_FIELDS: &[&str] = &[
    "InstanceID",
    "JobStatus",
    "JobState",
    "Message",
    "MessageID",
    "Name",
    "PercentComplete",
    "JobStartTime",
    "JobUntilTime",
    "JobType",
];

/// Result-dictionary status values.
pub mod status {
    pub const SUCCESS: &str = "Success";
    pub const ERROR: &str = "Error";
    pub const FOUND_FAULT: &str = "Found Fault";
}

/// Job queue operations on one iDRAC session.
pub struct JobManager<'s> {
    session: &'s mut Session,
}

impl Session {
    /// Borrow this session as a Lifecycle Controller job manager.
    pub fn job_manager(&mut self) -> JobManager<'_> {
        JobManager { session: self }
    }
}

impl JobManager<'_> {
    /// Status of one job. A 404 from the device becomes `Found Fault`.
    pub async fn job_status(&mut self, job_id: &str) -> Result<ResponseEnvelope, Error> {
        let job_id = checked_job_id(job_id)?;
        debug!(job_id, "fetching job status");
        let resp = self
            .session
            .execute(&RequestSpec::get(format!("{JOBS_PATH}/{job_id}")))
            .await?;

        if resp.is_success() {
            let mut result = Map::new();
            result.insert("Status".into(), Value::from(status::SUCCESS));
            for field in JOB_FIELDS {
                if let Some(value) = resp.body().get(*field) {
                    result.insert((*field).to_owned(), value.clone());
                }
            }
            if !result.contains_key("InstanceID") {
                if let Some(id) = resp.body().get("Id") {
                    result.insert("InstanceID".into(), id.clone());
                }
            }
            return Ok(ResponseEnvelope::synthesized(resp.status(), Value::Object(result)));
        }

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(ResponseEnvelope::synthesized(
                resp.status(),
                json!({
                    "Status": status::FOUND_FAULT,
                    "Message": format!("Job {job_id} was not found."),
                }),
            ));
        }

        Ok(error_result(&resp))
    }

    /// Ids of every job currently in the queue, as a `Jobs` list.
    pub async fn pending_jobs(&mut self) -> Result<ResponseEnvelope, Error> {
        debug!("listing job queue");
        let resp = self.session.execute(&RequestSpec::get(JOBS_PATH)).await?;
        if !resp.is_success() {
            return Ok(error_result(&resp));
        }

        let jobs: Vec<Value> = resp
            .body()
            .get("Members")
            .and_then(Value::as_array)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|m| m.get("@odata.id").and_then(Value::as_str))
                    .filter_map(|link| link.trim_end_matches('/').rsplit('/').next())
                    .map(Value::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ResponseEnvelope::synthesized(
            resp.status(),
            json!({"Status": status::SUCCESS, "Jobs": jobs}),
        ))
    }

    pub async fn delete_job(&mut self, job_id: &str) -> Result<ResponseEnvelope, Error> {
        let job_id = checked_job_id(job_id)?;
        debug!(job_id, "deleting job");
        self.delete_job_queue_entry(job_id).await
    }

    pub async fn delete_all_jobs(&mut self) -> Result<ResponseEnvelope, Error> {
        debug!("clearing job queue");
        self.delete_job_queue_entry(CLEAR_ALL_JOBS).await
    }

    async fn delete_job_queue_entry(&mut self, job_id: &str) -> Result<ResponseEnvelope, Error> {
        let spec = RequestSpec::post(DELETE_JOB_QUEUE_PATH).body(json!({"JobID": job_id}));
        let resp = self.session.execute(&spec).await?;
        if !resp.is_success() {
            return Ok(error_result(&resp));
        }

        // Success replies carry `@Message.ExtendedInfo` at the top level.
        let info = resp
            .body()
            .get("@Message.ExtendedInfo")
            .and_then(Value::as_array)
            .and_then(|infos| infos.first());
        let message = info
            .and_then(|i| i.get("Message"))
            .and_then(Value::as_str)
            .unwrap_or("The specified job was deleted");
        let message_id = info
            .and_then(|i| i.get("MessageId"))
            .cloned()
            .unwrap_or(Value::Null);

        Ok(ResponseEnvelope::synthesized(
            resp.status(),
            json!({
                "Status": status::SUCCESS,
                "Message": message,
                "MessageID": message_id,
                "ReturnValue": "0",
            }),
        ))
    }
}

/// Trimmed job id, or a configuration error when it is blank or holds a
/// character that would address a different resource once pasted into
/// the job URL.
fn checked_job_id(job_id: &str) -> Result<&str, Error> {
    let id = job_id.trim();
    if id.is_empty() {
        return Err(Error::Configuration {
            message: "job_id must not be empty".into(),
        });
    }
    let reserved = |c: char| {
        matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control()
    };
    if id.chars().any(reserved) {
        return Err(Error::Configuration {
            message: format!("Invalid Job ID: {id}"),
        });
    }
    Ok(id)
}

fn error_result(resp: &ResponseEnvelope) -> ResponseEnvelope {
    let message_id = resp
        .vendor_error()
        .and_then(|v| v.error.extended_info.into_iter().next())
        .and_then(|i| i.message_id)
        .map_or(Value::Null, Value::from);
    ResponseEnvelope::synthesized(
        resp.status(),
        json!({
            "Status": status::ERROR,
            "Message": resp.diagnostic(),
            "MessageID": message_id,
            "ReturnValue": "2",
            "Data": resp.body().clone(),
        }),
    )
}
