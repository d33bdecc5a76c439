// Endpoint description and reqwest::Client construction.
//
// Every session builds its own client from an `Endpoint`; TLS policy and
// the default timeout live here so the session code only deals with
// requests and responses.

use std::net::Ipv6Addr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::Error;

const USER_AGENT: &str = concat!("openmanage/", env!("CARGO_PKG_VERSION"));

/// Default HTTPS port for every API family.
pub const DEFAULT_PORT: u16 = 443;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// TLS verification mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate bundle from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (`validate_certs: false`).
    DangerAcceptInvalid,
}

/// URL scheme used to reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Https,
    /// Plain HTTP. Only meaningful against local mock services.
    Http,
}

impl Protocol {
    fn scheme(self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }
}

/// One target device: where it lives and how to talk to it.
///
/// Immutable once constructed. The host is normalized on construction, so
/// a bare IPv6 literal such as `fe80::1` is stored as `[fe80::1]`.
#[derive(Debug, Clone)]
pub struct Endpoint {
    host: String,
    port: u16,
    protocol: Protocol,
    tls: TlsMode,
    timeout: Duration,
}

impl Endpoint {
    pub fn new(host: &str, port: u16, tls: TlsMode, timeout: Duration) -> Result<Self, Error> {
        let host = normalize_host(host)?;
        if port == 0 {
            return Err(Error::Configuration {
                message: "port must be between 1 and 65535".into(),
            });
        }
        if timeout.is_zero() {
            return Err(Error::Configuration {
                message: "timeout must be greater than zero".into(),
            });
        }
        Ok(Self {
            host,
            port,
            protocol: Protocol::Https,
            tls,
            timeout,
        })
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn tls(&self) -> &TlsMode {
        &self.tls
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `{scheme}://{host}:{port}` with no path.
    pub fn base_url(&self) -> Result<Url, Error> {
        Ok(Url::parse(&format!(
            "{}://{}:{}",
            self.protocol.scheme(),
            self.host,
            self.port
        ))?)
    }

    /// Build a `reqwest::Client` honoring this endpoint's TLS mode and timeout.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    Error::Tls(format!("failed to read CA bundle {}: {e}", path.display()))
                })?;
                let certs = reqwest::Certificate::from_pem_bundle(&pem)
                    .map_err(|e| Error::Tls(format!("invalid CA bundle: {e}")))?;
                if certs.is_empty() {
                    return Err(Error::Tls(format!(
                        "no certificates found in {}",
                        path.display()
                    )));
                }
                for cert in certs {
                    builder = builder.add_root_certificate(cert);
                }
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Trim the host and bracket IPv6 literals for URL construction.
fn normalize_host(host: &str) -> Result<String, Error> {
    let host = host.trim();
    if host.is_empty() {
        return Err(Error::Configuration {
            message: "missing required argument: hostname".into(),
        });
    }
    if host.contains("://") || host.contains('/') {
        return Err(Error::Configuration {
            message: format!("hostname must not contain a scheme or path: {host}"),
        });
    }

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<Ipv6Addr>().is_ok() {
        return Ok(format!("[{bare}]"));
    }
    Ok(host.to_owned())
}
