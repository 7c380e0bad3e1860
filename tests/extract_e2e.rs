use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lexcheck::{
    CompletionConfig, CompletionService, ConstraintExtractor, ConstraintKind, ExtractionConfig, ExtractionError,
    Finding, HttpCompletionClient, SourceDocument,
};

fn client_for(server: &MockServer) -> HttpCompletionClient {
    HttpCompletionClient::new(&CompletionConfig {
        base_url: server.uri(),
        api_key: Some("sk-test".to_string()),
        timeout: Duration::from_secs(5),
        ..CompletionConfig::default()
    })
    .unwrap()
}

fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

const REPLY: &str = r#"```json
[
  {"type": "assertion", "subject": "Smith met Jones", "predicate": null,
   "variables": ["smith_met_jones"], "logic_form": "smith_met_jones == True",
   "natural_language": "Smith met Jones at the bank", "confidence": 0.95, "is_hard": true},
  {"type": "negation", "subject": "Smith recalled the name", "predicate": null,
   "variables": ["smith_recalled_name"], "logic_form": "smith_recalled_name == False",
   "natural_language": "Smith did not recall Jones's name", "confidence": 0.9, "is_hard": false}
]
```"#;

#[tokio::test]
async fn http_client_sends_chat_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "deepseek-chat",
            "temperature": 0.1,
            "max_tokens": 1000
        })))
        .respond_with(chat_reply("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let content = client_for(&server).complete("prompt").await.unwrap();
    assert_eq!(content, "[]");
}

#[tokio::test]
async fn http_client_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = client_for(&server).complete("prompt").await.unwrap_err();
    match err {
        ExtractionError::Status { code, message } => {
            assert_eq!(code, 503);
            assert_eq!(message, "overloaded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn http_client_rejects_reply_without_choices() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = client_for(&server).complete("prompt").await.unwrap_err();
    assert!(matches!(err, ExtractionError::EmptyReply));
}

#[tokio::test]
async fn extraction_through_http_keeps_provenance() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_reply(REPLY))
        .mount(&server)
        .await;

    let extractor = ConstraintExtractor::new(Arc::new(client_for(&server)), &ExtractionConfig::default());
    let mut finding = Finding::new("Smith met Jones at the bank but could not recall his name.", "Smith FD-302");
    finding.significance = "Places Smith with Jones".to_string();
    finding.entities = vec!["Smith".to_string(), "Jones".to_string()];
    finding.paragraph = Some(12);
    let source = SourceDocument {
        doc_title: "Smith FD-302".to_string(),
        doc_type: Some("FD-302".to_string()),
        date: Some("2019-04-02".to_string()),
        ..SourceDocument::default()
    };

    let constraints = extractor.extract_constraints(&[finding], &[source]).await;
    assert_eq!(constraints.len(), 2);

    assert_eq!(constraints[0].kind, ConstraintKind::Assertion);
    assert_eq!(constraints[1].kind, ConstraintKind::Negation);
    assert!(!constraints[1].is_hard);
    for c in &constraints {
        assert_eq!(c.provenance.doc_title, "Smith FD-302");
        assert_eq!(c.provenance.paragraph, Some(12));
        assert_eq!(c.provenance.doc_type.as_deref(), Some("FD-302"));
        assert_eq!(c.provenance.date.as_deref(), Some("2019-04-02"));
    }
    assert_ne!(constraints[0].id, constraints[1].id);
}

#[tokio::test]
async fn server_error_falls_back_to_patterns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let extractor = ConstraintExtractor::new(Arc::new(client_for(&server)), &ExtractionConfig::default());
    let constraints = extractor
        .extract_constraints(&[Finding::new("Smith never returned the call.", "Jones 302")], &[])
        .await;

    assert_eq!(constraints.len(), 1);
    assert_eq!(constraints[0].kind, ConstraintKind::Negation);
    assert!(constraints[0].logic_form.ends_with("== False"));
    assert!((constraints[0].confidence - 0.6).abs() < f64::EPSILON);
}

#[tokio::test]
async fn garbage_reply_falls_back_to_patterns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(chat_reply("Sorry, I cannot help with that."))
        .mount(&server)
        .await;

    let extractor = ConstraintExtractor::new(Arc::new(client_for(&server)), &ExtractionConfig::default());
    let constraints = extractor
        .extract_constraints(&[Finding::new("The agent confirmed that the wire was sent.", "Memo")], &[])
        .await;

    assert!(!constraints.is_empty());
    assert!(constraints.iter().all(|c| c.kind == ConstraintKind::Assertion));
}

#[tokio::test]
async fn duplicate_findings_dedup_in_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(chat_reply(REPLY))
        .mount(&server)
        .await;

    let extractor = ConstraintExtractor::new(Arc::new(client_for(&server)), &ExtractionConfig::default());
    let first = Finding::new("Smith met Jones.", "First report");
    let second = Finding::new("Smith met Jones.", "Second report");

    let constraints = extractor.extract_constraints(&[first, second], &[]).await;
    assert_eq!(constraints.len(), 2);
    assert!(constraints.iter().all(|c| c.provenance.doc_title == "First report"));
}
