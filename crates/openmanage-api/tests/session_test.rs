#![allow(clippy::unwrap_used)]
// Integration tests for `Session` and the job driver using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{basic_auth, body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use openmanage_api::{
    ApiFamily, Credentials, DEFAULT_TIMEOUT, Endpoint, Error, Protocol, RequestSpec, Session,
    SessionConfig, SessionState, TlsMode,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn endpoint_for(server: &MockServer) -> Endpoint {
    let url = Url::parse(&server.uri()).unwrap();
    Endpoint::new(
        url.host_str().unwrap(),
        url.port().unwrap(),
        TlsMode::System,
        DEFAULT_TIMEOUT,
    )
    .unwrap()
    .with_protocol(Protocol::Http)
}

fn basic() -> Credentials {
    Credentials::Basic {
        username: "root".into(),
        password: SecretString::from("calvin".to_owned()),
    }
}

fn token() -> Credentials {
    Credentials::Token {
        token: SecretString::from("preissued-token".to_owned()),
    }
}

fn config(server: &MockServer, family: ApiFamily, credentials: Credentials) -> SessionConfig {
    SessionConfig {
        endpoint: endpoint_for(server),
        credentials,
        family,
        vcenter_uuid: None,
    }
}

async fn mount_redfish_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/redfish/v1/SessionService/Sessions"))
        .and(body_json(json!({"UserName": "root", "Password": "calvin"})))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Auth-Token", "tok-123")
                .set_body_json(json!({"Id": "7", "UserName": "root"})),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/redfish/v1/SessionService/Sessions/7"))
        .and(header("X-Auth-Token", "tok-123"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(server)
        .await;
}

// ── Session lifecycle ───────────────────────────────────────────────

#[tokio::test]
async fn test_redfish_session_created_and_deleted_once() {
    let server = MockServer::start().await;
    mount_redfish_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1/Systems"))
        .and(header("X-Auth-Token", "tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Members": []})))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::open(config(&server, ApiFamily::Redfish, basic()))
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::Open);

    let resp = session.execute(&RequestSpec::get("Systems")).await.unwrap();
    assert!(resp.is_success());
    assert_eq!(resp.body(), &json!({"Members": []}));

    session.close().await;
    session.close().await;
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_ome_session_uses_api_session_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/SessionService/Sessions"))
        .and(body_partial_json(json!({"SessionType": "API"})))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Auth-Token", "ome-token")
                .set_body_json(json!({"Id": "d6d1b8e1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/SessionService/Sessions('d6d1b8e1')"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::open(config(&server, ApiFamily::Ome, basic()))
        .await
        .unwrap();
    session.close().await;
}

#[tokio::test]
async fn test_rejected_login_is_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/redfish/v1/SessionService/Sessions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "code": "Base.1.5.NoValidSession",
                "message": "There is no valid session established with the implementation."
            }
        })))
        .mount(&server)
        .await;

    let result = Session::open(config(&server, ApiFamily::Redfish, basic())).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_session_create_server_error_is_not_authentication() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/SessionService/Sessions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = Session::open(config(&server, ApiFamily::Ome, basic())).await;
    assert!(
        matches!(result, Err(Error::SessionCreate { status: 503, .. })),
        "expected SessionCreate error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_token_credentials_skip_session_create_and_delete() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/redfish/v1/SessionService/Sessions"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/redfish/v1/Managers"))
        .and(header("X-Auth-Token", "preissued-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Members": []})))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::open(config(&server, ApiFamily::Redfish, token()))
        .await
        .unwrap();
    session.execute(&RequestSpec::get("Managers")).await.unwrap();
    session.close().await;
}

#[tokio::test]
async fn test_omevv_sends_basic_auth_and_vcenter_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/omevv/GatewayService/v1/Consoles"))
        .and(basic_auth("root", "calvin"))
        .and(header("x_omivv-api-vcenter-identifier", "vc-uuid-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = config(&server, ApiFamily::Omevv, basic());
    cfg.vcenter_uuid = Some("vc-uuid-1".into());
    let mut session = Session::open(cfg).await.unwrap();
    let resp = session.execute(&RequestSpec::get("/Consoles")).await.unwrap();
    assert_eq!(resp.body(), &json!([]));
    session.close().await;
}

// ── Execute ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_error_status_still_returns_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/JobService/Jobs(99)"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": "Base.1.0.GeneralError",
                "message": "A general error has occurred.",
                "@Message.ExtendedInfo": [
                    {"MessageId": "CGEN1004", "Message": "Unable to complete the request because the resource URI does not exist."}
                ]
            }
        })))
        .mount(&server)
        .await;

    let mut session = Session::open(config(&server, ApiFamily::Ome, token()))
        .await
        .unwrap();
    let resp = session
        .execute(&RequestSpec::get("JobService/Jobs(99)"))
        .await
        .unwrap();
    assert_eq!(resp.status_code(), 404);
    assert!(!resp.is_success());
    assert_eq!(
        resp.diagnostic(),
        "Unable to complete the request because the resource URI does not exist."
    );
    session.close().await;
}

#[tokio::test]
async fn test_query_parameters_reach_the_server() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/JobService/Jobs"))
        .and(query_param("$filter", "JobType/Id eq 8"))
        .and(query_param("$top", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::open(config(&server, ApiFamily::Ome, token()))
        .await
        .unwrap();
    let spec = RequestSpec::get("JobService/Jobs")
        .query("$filter", "JobType/Id eq 8")
        .query("$top", "2");
    assert!(session.execute(&spec).await.unwrap().is_success());
    session.close().await;
}

#[tokio::test]
async fn test_timeout_override_maps_to_timeout_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1/Systems"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let mut session = Session::open(config(&server, ApiFamily::Redfish, token()))
        .await
        .unwrap();
    let result = session
        .execute(&RequestSpec::get("Systems").timeout(Duration::from_millis(100)))
        .await;
    let err = result.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }), "got: {err:?}");
    assert!(err.is_transport());
    session.close().await;
}

#[tokio::test]
async fn test_execute_after_close_is_rejected() {
    let server = MockServer::start().await;
    let mut session = Session::open(config(&server, ApiFamily::Redfish, token()))
        .await
        .unwrap();
    session.close().await;

    let result = session.execute(&RequestSpec::get("Systems")).await;
    assert!(matches!(result, Err(Error::SessionClosed)));
}

#[tokio::test]
async fn test_unreachable_host_is_connectivity_error_and_close_is_safe() {
    // Port 1 on loopback refuses connections.
    let endpoint = Endpoint::new("127.0.0.1", 1, TlsMode::System, DEFAULT_TIMEOUT)
        .unwrap()
        .with_protocol(Protocol::Http);
    let mut session = Session::open(SessionConfig {
        endpoint,
        credentials: token(),
        family: ApiFamily::Redfish,
        vcenter_uuid: None,
    })
    .await
    .unwrap();

    let err = session
        .execute(&RequestSpec::get("Systems"))
        .await
        .unwrap_err();
    assert!(err.is_connectivity(), "got: {err:?}");

    session.close().await;
    session.close().await;
    assert!(!session.is_open());
}

// ── Lifecycle Controller job driver ─────────────────────────────────

#[tokio::test]
async fn test_job_status_success_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1/Managers/iDRAC.Embedded.1/Jobs/JID_001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.id": "/redfish/v1/Managers/iDRAC.Embedded.1/Jobs/JID_001",
            "Id": "JID_001",
            "JobState": "Completed",
            "Message": "Job completed successfully.",
            "MessageId": "SYS053",
            "Name": "Configure: Import Server Configuration Profile",
            "PercentComplete": 100
        })))
        .mount(&server)
        .await;

    let mut session = Session::open(config(&server, ApiFamily::Redfish, token()))
        .await
        .unwrap();
    let resp = session.job_manager().job_status("JID_001").await.unwrap();
    assert_eq!(resp.body_str("Status"), Some("Success"));
    assert_eq!(resp.body_str("InstanceID"), Some("JID_001"));
    assert_eq!(resp.body()["PercentComplete"], json!(100));
    assert!(resp.body().get("@odata.id").is_none());
    session.close().await;
}

#[tokio::test]
async fn test_job_status_not_found_is_found_fault() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1/Managers/iDRAC.Embedded.1/Jobs/JID_12345"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut session = Session::open(config(&server, ApiFamily::Redfish, token()))
        .await
        .unwrap();
    let resp = session.job_manager().job_status("JID_12345").await.unwrap();
    assert_eq!(resp.body_str("Status"), Some("Found Fault"));
    session.close().await;
}

#[tokio::test]
async fn test_job_status_server_error_is_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1/Managers/iDRAC.Embedded.1/Jobs/JID_1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"code": "Base.1.5.GeneralError", "message": "internal error"}
        })))
        .mount(&server)
        .await;

    let mut session = Session::open(config(&server, ApiFamily::Redfish, token()))
        .await
        .unwrap();
    let resp = session.job_manager().job_status("JID_1").await.unwrap();
    assert_eq!(resp.body_str("Status"), Some("Error"));
    assert_eq!(resp.body_str("Message"), Some("internal error"));
    session.close().await;
}

#[tokio::test]
async fn test_pending_jobs_lists_member_ids() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/redfish/v1/Managers/iDRAC.Embedded.1/Jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Members": [
                {"@odata.id": "/redfish/v1/Managers/iDRAC.Embedded.1/Jobs/JID_1"},
                {"@odata.id": "/redfish/v1/Managers/iDRAC.Embedded.1/Jobs/RID_2"}
            ],
            "Members@odata.count": 2
        })))
        .mount(&server)
        .await;

    let mut session = Session::open(config(&server, ApiFamily::Redfish, token()))
        .await
        .unwrap();
    let resp = session.job_manager().pending_jobs().await.unwrap();
    assert_eq!(resp.body()["Jobs"], json!(["JID_1", "RID_2"]));
    session.close().await;
}

#[tokio::test]
async fn test_delete_all_jobs_posts_clear_all() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/redfish/v1/Dell/Managers/iDRAC.Embedded.1/DellJobService/Actions/DellJobService.DeleteJobQueue",
        ))
        .and(body_json(json!({"JobID": "JID_CLEARALL"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@Message.ExtendedInfo": [
                {"Message": "The specified job was deleted", "MessageId": "IDRAC.2.8.SUP020"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::open(config(&server, ApiFamily::Redfish, token()))
        .await
        .unwrap();
    let resp = session.job_manager().delete_all_jobs().await.unwrap();
    assert_eq!(
        resp.body(),
        &json!({
            "Status": "Success",
            "Message": "The specified job was deleted",
            "MessageID": "IDRAC.2.8.SUP020",
            "ReturnValue": "0"
        })
    );
    session.close().await;
}
