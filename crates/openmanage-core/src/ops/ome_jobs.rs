use std::collections::HashSet;

use openmanage_api::{ApiFamily, RequestSpec, Session, strip_odata};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::require_as;
use crate::error::CoreError;
use crate::interpret::SuccessPredicate;
use crate::lifecycle::{Operation, OperationContext};
use crate::result::OperationResult;

const JOBS_PATH: &str = "JobService/Jobs";
const FETCHED: &str = "Successfully fetched the job info";
const NOT_FETCHED: &str = "Failed to fetch the job info";

/// OData paging and filtering passed straight through to OME.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemQueryOptions {
    #[serde(default)]
    pub top: Option<u64>,
    #[serde(default)]
    pub skip: Option<u64>,
    #[serde(default)]
    pub filter: Option<String>,
}

impl SystemQueryOptions {
    fn is_empty(&self) -> bool {
        self.top.is_none() && self.skip.is_none() && self.filter.is_none()
    }

    fn apply(&self, mut spec: RequestSpec) -> RequestSpec {
        if let Some(top) = self.top {
            spec = spec.query("$top", top.to_string());
        }
        if let Some(skip) = self.skip {
            spec = spec.query("$skip", skip.to_string());
        }
        if let Some(filter) = &self.filter {
            spec = spec.query("$filter", filter.as_str());
        }
        spec
    }
}

/// Read one OME job, a filtered page, or the whole job list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OmeJobInfo {
    #[serde(default)]
    pub job_id: Option<u64>,
    #[serde(default)]
    pub system_query_options: Option<SystemQueryOptions>,
}

impl OmeJobInfo {
    async fn get(session: &mut Session, spec: &RequestSpec) -> Result<Value, CoreError> {
        let resp = session.execute(spec).await?;
        require_as(&resp, &SuccessPredicate::HttpStatus, "job_info")?;
        Ok(resp.into_body())
    }

    /// Walk `@odata.nextLink` until the collection is exhausted.
    async fn all_jobs(session: &mut Session) -> Result<Value, CoreError> {
        let first = Self::get(session, &RequestSpec::get(JOBS_PATH)).await?;
        let context = first.get("@odata.context").cloned().unwrap_or(Value::Null);

        let mut jobs: Vec<Value> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page = first;
        loop {
            if let Some(Value::Array(items)) = page.get_mut("value").map(Value::take) {
                jobs.extend(items.into_iter().map(|item| match item {
                    Value::Object(map) => Value::Object(strip_odata(map)),
                    other => other,
                }));
            }
            let Some(next) = page
                .get("@odata.nextLink")
                .and_then(Value::as_str)
                .map(str::to_owned)
            else {
                break;
            };
            if !seen.insert(next.clone()) {
                warn!(%next, "pagination link repeated, stopping");
                break;
            }
            debug!(%next, fetched = jobs.len(), "following job pagination");
            page = Self::get(session, &RequestSpec::get(next)).await?;
        }

        let mut out = Map::new();
        out.insert("@odata.context".into(), context);
        out.insert("@odata.count".into(), Value::from(jobs.len()));
        out.insert("value".into(), Value::Array(jobs));
        Ok(Value::Object(out))
    }
}

impl Operation for OmeJobInfo {
    const NAME: &'static str = "ome_job_info";

    fn family(&self) -> ApiFamily {
        ApiFamily::Ome
    }

    async fn run(
        &self,
        session: &mut Session,
        _ctx: &OperationContext,
    ) -> Result<OperationResult, CoreError> {
        let info = match (self.job_id, &self.system_query_options) {
            (Some(id), _) => {
                Self::get(session, &RequestSpec::get(format!("{JOBS_PATH}({id})"))).await?
            }
            (None, Some(opts)) if !opts.is_empty() => {
                Self::get(session, &opts.apply(RequestSpec::get(JOBS_PATH))).await?
            }
            (None, _) => {
                let all = Self::all_jobs(session).await?;
                if all["value"].as_array().is_none_or(Vec::is_empty) {
                    return Err(CoreError::remote(NOT_FETCHED));
                }
                all
            }
        };

        Ok(OperationResult::ok(FETCHED).with_payload("job_info", info))
    }
}
