// ── Runtime connection configuration ──
//
// The option record an orchestrator hands in for every operation. These
// types carry credential data and connection tuning but never touch disk
// or the environment; `openmanage-config` resolves those sources first.

use std::path::PathBuf;
use std::time::Duration;

use openmanage_api::{
    ApiFamily, Credentials, DEFAULT_PORT, DEFAULT_TIMEOUT, Endpoint, SessionConfig, TlsMode,
};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::error::CoreError;

/// Recognized connection options, named as the Ansible collection names them.
///
/// Legacy iDRAC and Redfish spellings (`idrac_ip`, `baseuri`, ...) are
/// accepted as aliases.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleParams {
    #[serde(alias = "idrac_ip", alias = "baseuri")]
    pub hostname: String,

    #[serde(default = "default_port", alias = "idrac_port")]
    pub port: u16,

    #[serde(default, alias = "idrac_user", alias = "vcenter_username")]
    pub username: Option<String>,

    #[serde(
        default,
        alias = "idrac_password",
        alias = "idrac_pwd",
        alias = "vcenter_password",
        deserialize_with = "secret_opt"
    )]
    pub password: Option<SecretString>,

    #[serde(default, alias = "x_auth_token", deserialize_with = "secret_opt")]
    pub auth_token: Option<SecretString>,

    #[serde(default = "default_validate_certs")]
    pub validate_certs: bool,

    #[serde(default)]
    pub ca_path: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default, alias = "_ansible_check_mode")]
    pub check_mode: bool,

    /// vCenter identifier for OMEVV requests.
    #[serde(default)]
    pub vcenter_uuid: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_validate_certs() -> bool {
    true
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn secret_opt<'de, D: Deserializer<'de>>(de: D) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(de)?.map(SecretString::from))
}

impl ModuleParams {
    /// Options for `hostname` with every other field at its default.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: default_port(),
            username: None,
            password: None,
            auth_token: None,
            validate_certs: default_validate_certs(),
            ca_path: None,
            timeout: default_timeout(),
            check_mode: false,
            vcenter_uuid: None,
        }
    }

    pub fn credentials(&self) -> Result<Credentials, CoreError> {
        Ok(Credentials::from_parts(
            self.username.as_deref(),
            self.password.clone(),
            self.auth_token.clone(),
        )?)
    }

    /// `validate_certs: false` wins over any CA path.
    pub fn tls_mode(&self) -> TlsMode {
        match (self.validate_certs, &self.ca_path) {
            (false, _) => TlsMode::DangerAcceptInvalid,
            (true, Some(path)) => TlsMode::CustomCa(path.clone()),
            (true, None) => TlsMode::System,
        }
    }

    pub fn endpoint(&self) -> Result<Endpoint, CoreError> {
        Ok(Endpoint::new(
            &self.hostname,
            self.port,
            self.tls_mode(),
            Duration::from_secs(self.timeout),
        )?)
    }

    pub fn session_config(&self, family: ApiFamily) -> Result<SessionConfig, CoreError> {
        Ok(SessionConfig {
            endpoint: self.endpoint()?,
            credentials: self.credentials()?,
            family,
            vcenter_uuid: self.vcenter_uuid.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_follow_the_collection() {
        let params: ModuleParams =
            serde_json::from_value(json!({"hostname": "192.168.0.1"})).expect("params");
        assert_eq!(params.port, 443);
        assert!(params.validate_certs);
        assert_eq!(params.timeout, 30);
        assert!(!params.check_mode);
        assert_eq!(params.tls_mode(), TlsMode::System);
    }

    #[test]
    fn legacy_aliases_are_accepted() {
        let params: ModuleParams = serde_json::from_value(json!({
            "idrac_ip": "10.0.0.5",
            "idrac_user": "root",
            "idrac_password": "calvin",
            "_ansible_check_mode": true
        }))
        .expect("params");
        assert_eq!(params.hostname, "10.0.0.5");
        assert!(params.check_mode);
        assert_eq!(params.credentials().expect("creds").mode(), "basic");
    }

    #[test]
    fn validate_certs_false_ignores_ca_path() {
        let mut params = ModuleParams::new("h");
        params.validate_certs = false;
        params.ca_path = Some(PathBuf::from("/tmp/ca.pem"));
        assert_eq!(params.tls_mode(), TlsMode::DangerAcceptInvalid);
    }

    #[test]
    fn password_and_token_together_is_configuration_error() {
        let mut params = ModuleParams::new("h");
        params.username = Some("root".into());
        params.password = Some(SecretString::from("calvin".to_owned()));
        params.auth_token = Some(SecretString::from("tok".to_owned()));
        let err = params
            .session_config(ApiFamily::Redfish)
            .expect_err("mutually exclusive");
        assert!(matches!(err, CoreError::Configuration { .. }));
    }

    #[test]
    fn omevv_vcenter_uuid_is_optional() {
        let mut params = ModuleParams::new("ome.example");
        params.username = Some("admin".into());
        params.password = Some(SecretString::from("pw".to_owned()));
        let config = params.session_config(ApiFamily::Omevv).expect("no uuid");
        assert_eq!(config.vcenter_uuid, None);

        params.vcenter_uuid = Some("uuid-1".into());
        let config = params.session_config(ApiFamily::Omevv).expect("with uuid");
        assert_eq!(config.vcenter_uuid.as_deref(), Some("uuid-1"));
    }

    #[test]
    fn omevv_vcenter_credentials_map_onto_basic_auth() {
        let params: ModuleParams = serde_json::from_value(json!({
            "hostname": "ome.example",
            "vcenter_username": "administrator@vsphere.local",
            "vcenter_password": "pw",
            "vcenter_uuid": "uuid-1"
        }))
        .expect("params");
        assert_eq!(params.username.as_deref(), Some("administrator@vsphere.local"));
        assert_eq!(params.credentials().expect("creds").mode(), "basic");
    }
}
