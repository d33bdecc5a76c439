// Session lifecycle: open, execute, close.
//
// A `Session` owns one HTTP client bound to one endpoint and one set of
// credentials. Session-capable families exchange username/password for a
// token on open and delete the server-side session on close. Requests go
// out one at a time: `execute` takes `&mut self`.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::{ApiFamily, Credentials};
use crate::error::Error;
use crate::request::RequestSpec;
use crate::response::ResponseEnvelope;
use crate::transport::Endpoint;

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const VCENTER_HEADER: &str = "x_omivv-api-vcenter-identifier";

/// Everything needed to open a session against one device.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub endpoint: Endpoint,
    pub credentials: Credentials,
    pub family: ApiFamily,
    /// vCenter identifier sent with every OMEVV request.
    pub vcenter_uuid: Option<String>,
}

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

enum Auth {
    /// `X-Auth-Token` value, marked sensitive.
    Token(HeaderValue),
    Basic {
        username: String,
        password: SecretString,
    },
}

/// A live connection to one management endpoint.
pub struct Session {
    http: reqwest::Client,
    base_url: Url,
    family: ApiFamily,
    auth: Auth,
    /// Id of the server-side session this process created, if any.
    remote_id: Option<String>,
    vcenter_uuid: Option<String>,
    timeout: Duration,
    state: SessionState,
}

impl Session {
    /// Connect and authenticate.
    ///
    /// With username+password on Redfish or OME this creates a server-side
    /// session. Token credentials and OMEVV basic auth do no I/O here.
    pub async fn open(config: SessionConfig) -> Result<Self, Error> {
        let SessionConfig {
            endpoint,
            credentials,
            family,
            vcenter_uuid,
        } = config;

        let http = endpoint.build_client()?;
        let base_url = endpoint.base_url()?;
        let timeout = endpoint.timeout();

        debug!(
            host = %endpoint.host(),
            port = endpoint.port(),
            %family,
            auth = credentials.mode(),
            "opening session"
        );

        let mut remote_id = None;
        let auth = match credentials {
            Credentials::Token { token } => Auth::Token(token_header(&token)?),
            Credentials::Basic { username, password } => match family.session_path() {
                Some(path) => {
                    let url = base_url.join(path)?;
                    let (token, id) =
                        create_session(&http, url, family, &username, &password, timeout).await?;
                    remote_id = id;
                    Auth::Token(token_header(&token)?)
                }
                None => Auth::Basic { username, password },
            },
        };

        let vcenter_uuid = match family {
            ApiFamily::Omevv => vcenter_uuid.filter(|u| !u.is_empty()),
            ApiFamily::Redfish | ApiFamily::Ome => None,
        };

        Ok(Self {
            http,
            base_url,
            family,
            auth,
            remote_id,
            vcenter_uuid,
            timeout,
            state: SessionState::Open,
        })
    }

    pub fn family(&self) -> ApiFamily {
        self.family
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send one request and return its envelope.
    ///
    /// Remote error statuses (4xx/5xx) still produce `Ok`. Only transport
    /// failures, timeouts, and use after close are errors.
    pub async fn execute(&mut self, spec: &RequestSpec) -> Result<ResponseEnvelope, Error> {
        if self.state == SessionState::Closed {
            return Err(Error::SessionClosed);
        }

        let url = spec.resolve(&self.base_url, self.family.root())?;
        debug!("{} {}", spec.method(), url);

        let mut builder = self
            .authorize(self.http.request(spec.method().clone(), url))
            .header(ACCEPT, "application/json");

        if let Some(ref uuid) = self.vcenter_uuid {
            builder = builder.header(VCENTER_HEADER, uuid.as_str());
        }
        for (name, value) in spec.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = spec.json_body() {
            trace!(body = %body, "request body");
            builder = builder.json(body);
        }

        let timeout = spec.timeout_override().unwrap_or(self.timeout);
        if let Some(t) = spec.timeout_override() {
            builder = builder.timeout(t);
        }

        let resp = builder.send().await.map_err(|e| send_error(e, timeout))?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let text = resp.text().await.map_err(|e| send_error(e, timeout))?;

        debug!(status = status.as_u16(), "response");
        trace!(body = %text, "response body");

        Ok(ResponseEnvelope::new(status, headers, text))
    }

    /// Release the session. Idempotent and infallible.
    ///
    /// Deletes the server-side session if this process created one.
    /// A failed delete is logged and otherwise ignored.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            trace!("session already closed");
            return;
        }
        self.state = SessionState::Closed;

        let Some(id) = self.remote_id.take() else {
            debug!("session closed");
            return;
        };
        let Some(path) = self.family.session_delete_path(&id) else {
            return;
        };
        let url = match self.base_url.join(&path) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "cannot build session delete URL");
                return;
            }
        };

        debug!("DELETE {}", url);
        match self.authorize(self.http.delete(url)).send().await {
            Ok(resp) if resp.status().is_success() => debug!("session deleted"),
            Ok(resp) => warn!(status = resp.status().as_u16(), "failed to delete session"),
            Err(e) => warn!(error = %e, "failed to delete session"),
        }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Token(value) => builder.header(AUTH_TOKEN_HEADER, value.clone()),
            Auth::Basic { username, password } => {
                builder.basic_auth(username, Some(password.expose_secret()))
            }
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .field("family", &self.family)
            .field("state", &self.state)
            .field("remote_session", &self.remote_id.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state == SessionState::Open && self.remote_id.is_some() {
            warn!(family = %self.family, "session dropped without close; remote session left open");
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn token_header(token: &SecretString) -> Result<HeaderValue, Error> {
    let mut value =
        HeaderValue::from_str(token.expose_secret()).map_err(|_| Error::Configuration {
            message: "auth token contains characters not allowed in an HTTP header".into(),
        })?;
    value.set_sensitive(true);
    Ok(value)
}

fn send_error(err: reqwest::Error, timeout: Duration) -> Error {
    if err.is_timeout() && !err.is_connect() {
        Error::Timeout {
            timeout_secs: timeout.as_secs(),
        }
    } else {
        Error::Transport(err)
    }
}

/// POST the session collection and return the token plus the session id.
async fn create_session(
    http: &reqwest::Client,
    url: Url,
    family: ApiFamily,
    username: &str,
    password: &SecretString,
    timeout: Duration,
) -> Result<(SecretString, Option<String>), Error> {
    debug!("creating session at {}", url);

    let mut body = json!({
        "UserName": username,
        "Password": password.expose_secret(),
    });
    if let Some(session_type) = family.session_type() {
        body["SessionType"] = Value::from(session_type);
    }

    let resp = http
        .post(url)
        .header(ACCEPT, "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| send_error(e, timeout))?;

    let status = resp.status();
    let headers = resp.headers().clone();
    let text = resp.text().await.map_err(|e| send_error(e, timeout))?;
    let envelope = ResponseEnvelope::new(status, headers, text);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: format!("HTTP {}: {}", status.as_u16(), envelope.diagnostic()),
        });
    }
    if !status.is_success() {
        return Err(Error::SessionCreate {
            status: status.as_u16(),
            message: envelope.diagnostic(),
        });
    }

    let token = envelope
        .header(AUTH_TOKEN_HEADER)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Authentication {
            message: "session created without an X-Auth-Token header".into(),
        })?;
    let token = SecretString::from(token.to_owned());

    let id = match envelope.body().get("Id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => envelope
            .header("Location")
            .and_then(|loc| loc.trim_end_matches('/').rsplit('/').next())
            .filter(|seg| !seg.is_empty())
            .map(str::to_owned),
    };
    if id.is_none() {
        warn!("session id missing from create response; it cannot be deleted on close");
    }

    debug!("session created");
    Ok((token, id))
}
