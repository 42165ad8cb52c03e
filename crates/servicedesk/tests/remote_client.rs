//! Wire-level tests for the HTTP gateway to the identity authority.

use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use servicedesk::workflows::control::{
    ControlCodeConverter, ConversionError, ConversionRequest, DateValidator, RemoteCallError,
    ServiceDeskHttpClient,
};

fn conversion_request() -> ConversionRequest {
    ConversionRequest {
        first_name: "Mary".to_string(),
        last_name: "Steward".to_string(),
        day_of_birth: "1995-04-02".to_string(),
        code: "QR34F7".to_string(),
        document_id: "AB12CD".to_string(),
        user_uid: "urn:collab:person:example.com:msteward".to_string(),
    }
}

#[tokio::test]
async fn validate_date_parses_the_boolean_verdict() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sd/validate-date"))
        .and(query_param("dayofbirth", "1995-04-02"))
        .respond_with(ResponseTemplate::new(200).set_body_json(true))
        .mount(&server)
        .await;

    let client = ServiceDeskHttpClient::new(server.uri());
    let verdict = client.validate("1995-04-02").await.expect("call succeeds");
    assert!(verdict);
}

#[tokio::test]
async fn validate_date_surfaces_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sd/validate-date"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = ServiceDeskHttpClient::new(server.uri());
    match client.validate("1995-04-02").await {
        Err(RemoteCallError::UnexpectedResponse(reason)) => {
            assert!(reason.contains("500"));
        }
        other => panic!("expected unexpected-response error, got {other:?}"),
    }
}

#[tokio::test]
async fn convert_sends_the_portal_field_names() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/sd/convert"))
        .and(body_json(serde_json::json!({
            "firstName": "Mary",
            "lastName": "Steward",
            "dayOfBirth": "1995-04-02",
            "code": "QR34F7",
            "documentId": "AB12CD",
            "userUid": "urn:collab:person:example.com:msteward",
        })))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let client = ServiceDeskHttpClient::new(server.uri());
    client
        .convert(conversion_request())
        .await
        .expect("conversion succeeds");
}

#[tokio::test]
async fn convert_parses_the_structured_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/sd/convert"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "error": "Conflict",
            "message": "document id already registered",
            "path": "/api/sd/convert",
            "reference": "4128",
        })))
        .mount(&server)
        .await;

    let client = ServiceDeskHttpClient::new(server.uri());
    match client.convert(conversion_request()).await {
        Err(ConversionError::Rejected(record)) => {
            assert_eq!(record.status, Some(409));
            assert_eq!(record.error.as_deref(), Some("Conflict"));
            assert_eq!(record.message.as_deref(), Some("document id already registered"));
            assert_eq!(
                record.fields().get("reference").map(String::as_str),
                Some("4128")
            );
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn convert_with_an_unreadable_body_is_a_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/sd/convert"))
        .respond_with(ResponseTemplate::new(500).set_body_string("gateway exploded"))
        .mount(&server)
        .await;

    let client = ServiceDeskHttpClient::new(server.uri());
    match client.convert(conversion_request()).await {
        Err(ConversionError::Transport(reason)) => {
            assert!(reason.contains("500"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[test]
fn trailing_slashes_are_trimmed_from_the_base_url() {
    let client = ServiceDeskHttpClient::new("http://idp.example.org/");
    assert_eq!(client.base_url(), "http://idp.example.org");
}
