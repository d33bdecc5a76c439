// openmanage-api: Async REST session transport for Dell iDRAC Redfish, OME and OMEVV

pub mod auth;
pub mod error;
pub mod lc_jobs;
pub mod request;
pub mod response;
pub mod session;
pub mod transport;

pub use auth::{ApiFamily, Credentials};
pub use error::Error;
pub use lc_jobs::JobManager;
pub use request::RequestSpec;
pub use response::{ExtendedInfo, ResponseEnvelope, VendorError, strip_odata};
pub use session::{Session, SessionConfig, SessionState};
pub use transport::{DEFAULT_PORT, DEFAULT_TIMEOUT, Endpoint, Protocol, TlsMode};

// Re-exported so callers can name methods and status codes without a
// direct reqwest dependency.
pub use reqwest::{Method, StatusCode};
