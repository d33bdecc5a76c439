use std::fmt;

use openmanage_api::{ApiFamily, RequestSpec, Session};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value, json};
use tracing::debug;

use super::{messages, require_as};
use crate::diff::{Action, plan, state};
use crate::error::CoreError;
use crate::interpret::SuccessPredicate;
use crate::lifecycle::{Operation, OperationContext};
use crate::result::OperationResult;

/// Lifecycle Controller attribute toggling inventory collection on restart.
pub const CSIOR_ATTRIBUTE: &str = "LCAttributes.1.CollectSystemInventoryOnRestart";

const ATTRIBUTES_PATH: &str = "/redfish/v1/Managers/LifecycleController.Embedded.1/Attributes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsiorState {
    Enabled,
    Disabled,
}

impl CsiorState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::Disabled => "Disabled",
        }
    }

    /// Case-insensitive; `present`/`absent` are accepted as synonyms.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "enabled" | "enable" | "present" => Some(Self::Enabled),
            "disabled" | "disable" | "absent" => Some(Self::Disabled),
            _ => None,
        }
    }
}

impl fmt::Display for CsiorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CsiorState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "value of state must be one of: enabled, disabled, got: {raw}"
            ))
        })
    }
}

/// Enable or disable Collect System Inventory On Restart.
#[derive(Debug, Clone, Deserialize)]
pub struct Csior {
    #[serde(alias = "csior")]
    pub state: CsiorState,
}

impl Operation for Csior {
    const NAME: &'static str = "dellemc_idrac_lc_attributes";

    fn family(&self) -> ApiFamily {
        ApiFamily::Redfish
    }

    async fn run(
        &self,
        session: &mut Session,
        ctx: &OperationContext,
    ) -> Result<OperationResult, CoreError> {
        let current = session.execute(&RequestSpec::get(ATTRIBUTES_PATH)).await?;
        require_as(&current, &SuccessPredicate::HttpStatus, "error_info")?;

        let observed: Option<Map<String, Value>> = current
            .body()
            .get("Attributes")
            .and_then(Value::as_object)
            .filter(|attrs| attrs.contains_key(CSIOR_ATTRIBUTE))
            .cloned();

        let desired = state([(CSIOR_ATTRIBUTE, json!(self.state.as_str()))]);
        let plan = plan(&desired, observed.as_ref(), ctx.check_mode()).map_err(|_| {
            CoreError::indeterminate(format!(
                "the Lifecycle Controller did not report {CSIOR_ATTRIBUTE}"
            ))
        })?;
        debug!(state = %self.state, action = ?plan.action(), "planned csior change");

        match plan.action() {
            Action::Noop => Ok(OperationResult::ok(messages::NO_CHANGES)),
            Action::WouldChange => Ok(OperationResult::changed(messages::CHANGES_FOUND)),
            Action::Apply => {
                let delta = plan.diff().delta_payload(&desired);
                let spec = RequestSpec::patch(ATTRIBUTES_PATH)
                    .body(json!({"Attributes": Value::Object(delta.clone())}));
                let resp = session.execute(&spec).await?;
                require_as(&resp, &SuccessPredicate::HttpStatus, "error_info")?;
                Ok(
                    OperationResult::changed("Successfully configured the iDRAC LC attributes.")
                        .with_payload("lc_attribute_status", Value::Object(delta)),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_accepts_synonyms() {
        assert_eq!(CsiorState::parse("Enabled"), Some(CsiorState::Enabled));
        assert_eq!(CsiorState::parse("present"), Some(CsiorState::Enabled));
        assert_eq!(CsiorState::parse(" DISABLE "), Some(CsiorState::Disabled));
        assert_eq!(CsiorState::parse("on"), None);
    }

    #[test]
    fn deserialize_rejects_unknown_state() {
        let err = serde_json::from_value::<Csior>(json!({"state": "maybe"})).expect_err("unknown state");
        assert!(err.to_string().contains("enabled, disabled"));

        let op: Csior = serde_json::from_value(json!({"csior": "Disabled"})).expect("csior alias");
        assert_eq!(op.state, CsiorState::Disabled);
    }
}
