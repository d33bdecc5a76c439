use openmanage_api::{ApiFamily, RequestSpec, Session};
use serde::Deserialize;
use serde_json::Value;

use super::require_as;
use crate::error::CoreError;
use crate::interpret::SuccessPredicate;
use crate::lifecycle::{Operation, OperationContext};
use crate::result::OperationResult;

const CONSOLES_PATH: &str = "Consoles";

/// List the vCenters registered with the OMEVV gateway.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OmevvVcenterInfo {
    /// Restrict the result to the console with this address.
    #[serde(default)]
    pub vcenter_hostname: Option<String>,
}

impl Operation for OmevvVcenterInfo {
    const NAME: &'static str = "omevv_vcenter_info";

    fn family(&self) -> ApiFamily {
        ApiFamily::Omevv
    }

    async fn run(
        &self,
        session: &mut Session,
        _ctx: &OperationContext,
    ) -> Result<OperationResult, CoreError> {
        let resp = session.execute(&RequestSpec::get(CONSOLES_PATH)).await?;
        require_as(&resp, &SuccessPredicate::HttpStatus, "error_info")?;

        let consoles = match resp.into_body() {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                return Err(CoreError::remote_with(
                    "unexpected response listing vCenter consoles",
                    "error_info",
                    other,
                ));
            }
        };

        let Some(host) = &self.vcenter_hostname else {
            return Ok(OperationResult::ok("Successfully retrieved the vCenter information.")
                .with_payload("vcenter_info", Value::Array(consoles)));
        };

        let matching: Vec<Value> = consoles
            .into_iter()
            .filter(|c| c.get("consoleAddress").and_then(Value::as_str) == Some(host.as_str()))
            .collect();
        let msg = if matching.is_empty() {
            format!("'{host}' vCenter is not registered in OME.")
        } else {
            "Successfully retrieved the vCenter information.".to_owned()
        };
        Ok(OperationResult::ok(msg).with_payload("vcenter_info", Value::Array(matching)))
    }
}
