use std::fmt;
use std::str::FromStr;

use openmanage_api::{ApiFamily, RequestSpec, Session};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{messages, require_as};
use crate::diff::{Action, plan, state};
use crate::error::CoreError;
use crate::interpret::SuccessPredicate;
use crate::lifecycle::{Operation, OperationContext};
use crate::result::OperationResult;

const RESET_ACTION: &str = "#ComputerSystem.Reset";
const NOT_SUPPORTED: &str =
    "The target device does not support the system reset feature using Redfish API.";

/// Redfish `ComputerSystem.Reset` types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ResetType {
    ForceOff,
    ForceOn,
    ForceRestart,
    GracefulRestart,
    GracefulShutdown,
    Nmi,
    On,
    PowerCycle,
    PushPowerButton,
}

impl ResetType {
    pub const ALL: [ResetType; 9] = [
        Self::ForceOff,
        Self::ForceOn,
        Self::ForceRestart,
        Self::GracefulRestart,
        Self::GracefulShutdown,
        Self::Nmi,
        Self::On,
        Self::PowerCycle,
        Self::PushPowerButton,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ForceOff => "ForceOff",
            Self::ForceOn => "ForceOn",
            Self::ForceRestart => "ForceRestart",
            Self::GracefulRestart => "GracefulRestart",
            Self::GracefulShutdown => "GracefulShutdown",
            Self::Nmi => "Nmi",
            Self::On => "On",
            Self::PowerCycle => "PowerCycle",
            Self::PushPowerButton => "PushPowerButton",
        }
    }

    /// Whether this reset does anything from `current` power state.
    pub fn applies_to(self, current: &str) -> bool {
        let on = matches!(current, "On" | "PoweringOn");
        let off = matches!(current, "Off" | "PoweringOff");
        match self {
            Self::On | Self::ForceOn => off,
            Self::PushPowerButton => true,
            Self::ForceOff
            | Self::ForceRestart
            | Self::GracefulRestart
            | Self::GracefulShutdown
            | Self::Nmi
            | Self::PowerCycle => on,
        }
    }

    /// `GracefulRestart` -> `graceful restart`.
    fn words(self) -> String {
        let mut out = String::new();
        for (i, ch) in self.as_str().char_indices() {
            if ch.is_ascii_uppercase() && i > 0 {
                out.push(' ');
            }
            out.push(ch.to_ascii_lowercase());
        }
        out
    }
}

impl fmt::Display for ResetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResetType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| {
                let choices: Vec<&str> = Self::ALL.iter().map(|r| r.as_str()).collect();
                CoreError::configuration(format!(
                    "value of reset_type must be one of: {}, got: {s}",
                    choices.join(", ")
                ))
            })
    }
}

/// Apply a reset type to a Redfish system.
#[derive(Debug, Clone, Deserialize)]
pub struct PowerState {
    pub reset_type: ResetType,
    /// Required when the service exposes more than one system.
    #[serde(default)]
    pub resource_id: Option<String>,
}

/// What the system resource says about resetting it.
struct ResetTarget {
    current_state: String,
    uri: String,
    allowable: Vec<String>,
}

impl PowerState {
    async fn locate(&self, session: &mut Session) -> Result<ResetTarget, CoreError> {
        let systems = session.execute(&RequestSpec::get("Systems")).await?;
        require_as(&systems, &SuccessPredicate::HttpStatus, "error_info")?;

        let members: Vec<String> = systems
            .body()
            .get("Members")
            .and_then(Value::as_array)
            .map(|m| {
                m.iter()
                    .filter_map(|s| s.get("@odata.id").and_then(Value::as_str))
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        if members.len() > 1 && self.resource_id.is_none() {
            return Err(CoreError::remote(
                "Multiple devices exists in the system, but option 'resource_id' is not specified.",
            ));
        }

        let system_uri = match (&self.resource_id, members.first()) {
            (_, None) => return Err(CoreError::remote(NOT_SUPPORTED)),
            (Some(id), Some(_)) => {
                let wanted = format!("{}/Systems/{id}", ApiFamily::Redfish.root());
                if !members.contains(&wanted) {
                    return Err(CoreError::remote(format!(
                        "Invalid device Id '{id}' is provided"
                    )));
                }
                wanted
            }
            (None, Some(first)) => first.clone(),
        };

        let system = session.execute(&RequestSpec::get(system_uri)).await?;
        if matches!(system.status_code(), 404 | 405) {
            return Err(CoreError::remote_with(
                NOT_SUPPORTED,
                "error_info",
                system.into_body(),
            ));
        }
        require_as(&system, &SuccessPredicate::HttpStatus, "error_info")?;

        let body = system.body();
        let Some(action) = body.get("Actions").and_then(|a| a.get(RESET_ACTION)) else {
            return Err(CoreError::remote(NOT_SUPPORTED));
        };
        let uri = action
            .get("target")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::remote(NOT_SUPPORTED))?
            .to_owned();
        let allowable = action
            .get("ResetType@Redfish.AllowableValues")
            .and_then(Value::as_array)
            .map(|v| {
                v.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        let current_state = body
            .get("PowerState")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::indeterminate("the system did not report a PowerState"))?
            .to_owned();

        Ok(ResetTarget {
            current_state,
            uri,
            allowable,
        })
    }
}

impl Operation for PowerState {
    const NAME: &'static str = "redfish_powerstate";

    fn family(&self) -> ApiFamily {
        ApiFamily::Redfish
    }

    async fn run(
        &self,
        session: &mut Session,
        ctx: &OperationContext,
    ) -> Result<OperationResult, CoreError> {
        let target = self.locate(session).await?;
        let reset = self.reset_type;

        // An empty list means the service did not advertise restrictions.
        if !target.allowable.is_empty() && !target.allowable.iter().any(|a| a == reset.as_str()) {
            return Err(CoreError::remote(format!(
                "The target device does not support a {} operation.The acceptable values for device reset types are {}.",
                reset.words(),
                target.allowable.join(", ")
            )));
        }

        // A reset that does nothing from the current state is observed as
        // already satisfied.
        let applicable = reset.applies_to(&target.current_state);
        let desired = state([("power_state", json!(reset.as_str()))]);
        let observed = state([(
            "power_state",
            if applicable {
                json!(target.current_state)
            } else {
                json!(reset.as_str())
            },
        )]);
        let plan = plan(&desired, Some(&observed), ctx.check_mode())?;
        debug!(
            current = %target.current_state,
            %reset,
            action = ?plan.action(),
            "planned power change"
        );

        match plan.action() {
            Action::Noop if ctx.check_mode() => {
                Ok(OperationResult::ok("No Changes found to be applied."))
            }
            Action::Noop => Ok(OperationResult::ok(format!(
                "The device is already powered {}.",
                target.current_state.to_lowercase()
            ))),
            Action::WouldChange => Ok(OperationResult::changed(messages::CHANGES_FOUND)),
            Action::Apply => {
                let spec =
                    RequestSpec::post(target.uri).body(json!({"ResetType": reset.as_str()}));
                let resp = session.execute(&spec).await?;
                require_as(&resp, &SuccessPredicate::HttpStatus, "error_info")?;
                Ok(OperationResult::changed(format!(
                    "Successfully performed the reset type operation '{reset}'."
                )))
            }
        }
    }
}
