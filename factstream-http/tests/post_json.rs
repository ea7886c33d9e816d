use factstream_http::{HttpClient, HttpError};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn posts_json_with_bearer_and_decodes_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/echo"))
        .and(header("authorization", "Bearer pplx-test"))
        .and(body_json(json!({"ping": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pong": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&format!("{}/v1", server.uri())).unwrap();
    let got: Value = client
        .post_json("echo", Some(" pplx-test "), &json!({"ping": true}))
        .await
        .unwrap();

    assert_eq!(got, json!({"pong": 1}));
}

#[tokio::test]
async fn non_success_surfaces_api_error_without_retry_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"error": {"message": "overloaded"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .post_json::<_, Value>("chat/completions", None, &json!({}))
        .await
        .unwrap_err();

    match err {
        HttpError::Api { status, message, .. } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(message, "overloaded");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn retries_server_errors_when_asked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap().with_retries(1);
    let got: Value = client
        .post_json("flaky", None, &json!({}))
        .await
        .unwrap();

    assert_eq!(got["ok"], json!(true));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "no key"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap().with_retries(3);
    let err = client
        .post_json::<_, Value>("chat/completions", None, &json!({}))
        .await
        .unwrap_err();
    assert!(!err.is_transient());
    assert!(err.to_string().contains("no key"));
}

#[tokio::test]
async fn undecodable_success_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .post_json::<_, Value>("anything", None, &json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Decode(_, ref snip) if snip == "not json"));
}
