use std::fmt;

use secrecy::SecretString;

use crate::error::Error;

/// Credentials for authenticating with a management endpoint.
///
/// Exactly one mode is active. Secret material is held in [`SecretString`],
/// so the derived `Debug` output never contains it.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Username and password. Session-capable families exchange these for
    /// a session token on open; OMEVV sends them as basic auth per request.
    Basic {
        username: String,
        password: SecretString,
    },

    /// Pre-issued session token, sent as `X-Auth-Token` on every request.
    Token { token: SecretString },
}

impl Credentials {
    /// Build credentials from the loosely-typed option set a caller supplies.
    ///
    /// Username+password and token are mutually exclusive; supplying both,
    /// neither, or half of a username/password pair is a configuration error.
    pub fn from_parts(
        username: Option<&str>,
        password: Option<SecretString>,
        token: Option<SecretString>,
    ) -> Result<Self, Error> {
        let username = username.map(str::trim).filter(|u| !u.is_empty());
        match (username, password, token) {
            (None, None, Some(token)) => Ok(Self::Token { token }),
            (Some(_), _, Some(_)) | (_, Some(_), Some(_)) => Err(Error::Configuration {
                message: "parameters are mutually exclusive: username|auth_token, password|auth_token"
                    .into(),
            }),
            (Some(username), Some(password), None) => Ok(Self::Basic {
                username: username.to_owned(),
                password,
            }),
            (Some(_), None, None) => Err(Error::Configuration {
                message: "missing required argument: password".into(),
            }),
            (None, Some(_), None) => Err(Error::Configuration {
                message: "missing required argument: username".into(),
            }),
            (None, None, None) => Err(Error::Configuration {
                message: "one of the following is required: username, auth_token".into(),
            }),
        }
    }

    /// Short label for logs. Never includes secret material.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "basic",
            Self::Token { .. } => "token",
        }
    }
}

/// The API family a session talks to.
///
/// Selected at configuration time. Determines the resource root, whether
/// a server-side session is created, and the session endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFamily {
    /// iDRAC and generic Redfish services.
    Redfish,
    /// OpenManage Enterprise.
    Ome,
    /// OpenManage Enterprise integration for VMware vCenter.
    Omevv,
}

impl ApiFamily {
    /// Resource root that relative request paths are joined onto.
    pub fn root(&self) -> &'static str {
        match self {
            Self::Redfish => "/redfish/v1",
            Self::Ome => "/api",
            Self::Omevv => "/omevv/GatewayService/v1",
        }
    }

    /// The session collection endpoint.
    ///
    /// Returns `None` for [`Omevv`](Self::Omevv), which authenticates
    /// every request with basic auth instead of a session.
    pub fn session_path(&self) -> Option<&'static str> {
        match self {
            Self::Redfish => Some("/redfish/v1/SessionService/Sessions"),
            Self::Ome => Some("/api/SessionService/Sessions"),
            Self::Omevv => None,
        }
    }

    /// The endpoint that deletes the session with the given id.
    pub fn session_delete_path(&self, id: &str) -> Option<String> {
        match self {
            Self::Redfish => Some(format!("/redfish/v1/SessionService/Sessions/{id}")),
            Self::Ome => Some(format!("/api/SessionService/Sessions('{id}')")),
            Self::Omevv => None,
        }
    }

    /// Extra fields OME expects in the session-create body.
    pub(crate) fn session_type(&self) -> Option<&'static str> {
        match self {
            Self::Ome => Some("API"),
            Self::Redfish | Self::Omevv => None,
        }
    }
}

impl fmt::Display for ApiFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Redfish => "redfish",
            Self::Ome => "ome",
            Self::Omevv => "omevv",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> Option<SecretString> {
        Some(SecretString::from(s.to_owned()))
    }

    #[test]
    fn password_and_token_are_mutually_exclusive() {
        let err = Credentials::from_parts(Some("root"), secret("calvin"), secret("tok"))
            .expect_err("both modes supplied");
        assert!(err.is_configuration());
    }

    #[test]
    fn token_alone_is_accepted() {
        let creds = Credentials::from_parts(None, None, secret("tok")).expect("token creds");
        assert_eq!(creds.mode(), "token");
    }

    #[test]
    fn username_requires_password() {
        assert!(Credentials::from_parts(Some("root"), None, None).is_err());
        assert!(Credentials::from_parts(Some("  "), secret("calvin"), None).is_err());
    }

    #[test]
    fn debug_output_redacts_password() {
        let creds = Credentials::from_parts(Some("root"), secret("calvin"), None).expect("basic");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("root"));
        assert!(!rendered.contains("calvin"));
    }

    #[test]
    fn session_paths_per_family() {
        assert_eq!(
            ApiFamily::Ome.session_delete_path("42").as_deref(),
            Some("/api/SessionService/Sessions('42')")
        );
        assert_eq!(
            ApiFamily::Redfish.session_delete_path("7").as_deref(),
            Some("/redfish/v1/SessionService/Sessions/7")
        );
        assert!(ApiFamily::Omevv.session_path().is_none());
    }
}
