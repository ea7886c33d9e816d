mod common;

use factstream_common::LlmConfig;
use factstream_core::{
    CardRequest, FactService, FeedAction, FeedSession, MockCardSource,
};
use factstream_llm::build_client;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "sonar-pro",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    }))
}

fn service_for(server: &MockServer) -> FactService {
    let client = build_client(
        &LlmConfig::ChatCompletions {
            api_key: Some("pplx-test".into()),
            base_url: server.uri(),
            model: "sonar-pro".into(),
        },
        None,
        0,
    )
    .unwrap();
    FactService::with_fresh_dedup(client)
}

#[tokio::test]
async fn fenced_answer_from_the_wire_becomes_cards() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    let body = "```json\n[{\"headline\":\"Lava can reach 1200 C\",\"detail\":\"Basaltic lava is the hottest.\"},\
                {\"headline\":\"Pumice floats\",\"detail\":\"It is full of gas bubbles.\"}]\n```";
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer pplx-test"))
        .and(body_partial_json(json!({"temperature": 0.7, "max_tokens": 1000})))
        .respond_with(reply(body))
        .expect(1)
        .mount(&server)
        .await;

    let cards = service_for(&server)
        .get_cards(&CardRequest::new("volcanoes"))
        .await;

    assert_eq!(cards.len(), 2);
    assert_eq!(cards[1].headline, "Pumice floats");
}

#[tokio::test]
async fn server_error_yields_no_cards() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let cards = service_for(&server)
        .get_cards(&CardRequest::new("volcanoes"))
        .await;
    assert!(cards.is_empty());
}

#[tokio::test]
async fn feed_over_the_live_service_keeps_reports_apart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"max_tokens": 8000})))
        .respond_with(reply("# Volcanoes\n\nA long report."))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"max_tokens": 1000})))
        .respond_with(reply(r#"[{"headline":"Etna is active","detail":"It erupts often."}]"#))
        .mount(&server)
        .await;

    let mut feed = FeedSession::new(Arc::new(service_for(&server)));
    let first = feed.search("volcanoes").await.to_vec();
    assert_eq!(first.len(), 1);

    let report = feed.apply(&first[0].id, FeedAction::Deep).await;
    assert_eq!(report.len(), 1);
    assert!(report[0].is_deep_research);
    assert_eq!(feed.cards().len(), 1);
    assert_eq!(feed.research().len(), 1);
}

#[tokio::test]
async fn mock_feed_runs_offline() {
    let mut feed = FeedSession::new(Arc::new(MockCardSource::new()));
    let first = feed.search("space").await.to_vec();
    assert_eq!(first.len(), 4);

    let more = feed.apply(&first[0].id, FeedAction::More).await;
    assert_eq!(more.len(), 1);
    assert!(more[0].headline.starts_with("More about "));
    assert_eq!(more[0].parent_card_id.as_deref(), Some(first[0].id.as_str()));

    let asked = feed
        .apply(&first[1].id, FeedAction::Custom("Is Venus hot?".into()))
        .await;
    assert_eq!(asked[0].headline, "About space: Is Venus hot?");

    feed.apply(&first[2].id, FeedAction::Skip).await;
    assert_eq!(feed.page(), 2);
    assert_eq!(feed.cards().len(), 7);
}
