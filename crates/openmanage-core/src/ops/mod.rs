// ── Operations ──
//
// One module per managed resource. Each operation reads current state,
// plans against the desired state, and mutates only when the plan says so.

mod csior;
mod lc_job;
mod lc_job_queue;
mod lc_job_status;
mod ome_jobs;
mod omevv;
mod power;

pub use csior::{CSIOR_ATTRIBUTE, Csior, CsiorState};
pub use lc_job::LcJobDelete;
pub use lc_job_queue::LcJobQueueDelete;
pub use lc_job_status::LcJobStatus;
pub use ome_jobs::{OmeJobInfo, SystemQueryOptions};
pub use omevv::OmevvVcenterInfo;
pub use power::{PowerState, ResetType};

use openmanage_api::ResponseEnvelope;

use crate::error::CoreError;
use crate::interpret::{SuccessPredicate, require};

/// Messages shared by every state-changing operation.
pub mod messages {
    pub const CHANGES_FOUND: &str = "Changes found to be applied.";
    pub const NO_CHANGES: &str = "No changes found to be applied.";
}

/// Like [`require`], but replaces the diagnostic with `message` while
/// keeping the raw body payload.
fn require_or(
    envelope: &ResponseEnvelope,
    predicate: &SuccessPredicate,
    message: impl Into<String>,
) -> Result<(), CoreError> {
    require(envelope, predicate).map_err(|err| match err {
        CoreError::RemoteOperation { payload, .. } => CoreError::RemoteOperation {
            message: message.into(),
            payload,
        },
        other => other,
    })
}

/// Like [`require`], but hands the failing body back under `key`.
fn require_as(
    envelope: &ResponseEnvelope,
    predicate: &SuccessPredicate,
    key: &str,
) -> Result<(), CoreError> {
    require(envelope, predicate).map_err(|err| match err {
        CoreError::RemoteOperation { message, payload } => CoreError::RemoteOperation {
            message,
            payload: payload
                .into_iter()
                .map(|(_, value)| (key.to_owned(), value))
                .collect(),
        },
        other => other,
    })
}
