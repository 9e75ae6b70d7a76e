//! JSON-over-HTTP adapters for remote analysis and spelling services.
//!
//! Both services take `POST {"text": "..."}` and answer with the report
//! shape of the corresponding trait.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{LinguisticAnalyzer, LinguisticReport, SpellChecker, SpellingReport};
use crate::error::{ServiceError, ServiceResult};

/// Longest response body echoed back in a [`ServiceError::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Serialize)]
struct TextRequest<'a> {
    text: &'a str,
}

/// Post `text` to `url` and decode the JSON answer.
pub(crate) async fn post_text<T: DeserializeOwned>(
    client: &reqwest::Client,
    service: &'static str,
    url: &str,
    text: &str,
) -> ServiceResult<T> {
    let response = client.post(url).json(&TextRequest { text }).send().await?;
    decode_response(service, response).await
}

/// Check the status of `response` and decode its JSON body.
///
/// Error bodies are truncated to [`MAX_ERROR_BODY`] bytes.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> ServiceResult<T> {
    let status = response.status();
    if !status.is_success() {
        let mut body = response.text().await.unwrap_or_default();
        truncate_on_char_boundary(&mut body, MAX_ERROR_BODY);
        return Err(ServiceError::Status {
            service,
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode {
        service,
        message: e.to_string(),
    })
}

fn truncate_on_char_boundary(text: &mut String, max: usize) {
    if text.len() > max {
        let mut cut = max;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
}

/// Remote linguistic analysis service.
#[derive(Debug, Clone)]
pub struct HttpAnalyzer {
    client: reqwest::Client,
    url: String,
}

impl HttpAnalyzer {
    /// Create an adapter posting to `url`.
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl LinguisticAnalyzer for HttpAnalyzer {
    fn name(&self) -> &str {
        "analyzer"
    }

    #[tracing::instrument(skip(self, text), fields(url = %self.url, text_len = text.len()))]
    async fn analyze(&self, text: &str) -> ServiceResult<LinguisticReport> {
        post_text(&self.client, "analyzer", &self.url, text).await
    }
}

/// Remote spelling service.
#[derive(Debug, Clone)]
pub struct HttpSpellChecker {
    client: reqwest::Client,
    url: String,
}

impl HttpSpellChecker {
    /// Create an adapter posting to `url`.
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SpellChecker for HttpSpellChecker {
    fn name(&self) -> &str {
        "spelling"
    }

    #[tracing::instrument(skip(self, text), fields(url = %self.url, text_len = text.len()))]
    async fn check(&self, text: &str) -> ServiceResult<SpellingReport> {
        post_text(&self.client, "spelling", &self.url, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::diagnostic::{Category, RawDiagnostic, normalize_all};
    use crate::evaluate::{Evaluator, NoteSource, NoteStatus};
    use crate::services::Services;
    use crate::span::Span;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn analyzer_posts_text_and_decodes_report() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .and(body_json(serde_json::json!({"text": "she go home"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "grammar": [{"type": "subject_verb_agreement",
                             "span": {"start": 4, "end": 6}}],
                "mechanics": ["capitalization", "missing_punctuation"]
            })))
            .mount(&server)
            .await;

        let analyzer = HttpAnalyzer::new(reqwest::Client::new(), format!("{}/analyze", server.uri()));
        let report = analyzer.analyze("she go home").await.unwrap();

        assert_eq!(report.grammar.len(), 1);
        assert_eq!(
            report.mechanics[0],
            RawDiagnostic::Label("capitalization".to_string())
        );
    }

    fn negative_span_payload() -> serde_json::Value {
        serde_json::json!({
            "grammar": [
                {"type": "subject_verb_agreement", "span": {"start": 0, "end": 5}},
                {"type": "tense", "span": {"start": -1, "end": 3}}
            ],
            "mechanics": []
        })
    }

    #[tokio::test]
    async fn negative_span_keeps_the_rest_of_the_report() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(negative_span_payload()))
            .mount(&server)
            .await;

        let analyzer = HttpAnalyzer::new(reqwest::Client::new(), server.uri());
        let report = analyzer.analyze("He go home.").await.unwrap();

        assert_eq!(report.grammar.len(), 2);
        let diags = normalize_all(&report.grammar, Category::Grammar);
        assert_eq!(diags[0].valid_span("He go home."), Some(Span::new(0, 5)));
        assert!(diags[1].has_malformed_span("He go home."));
    }

    #[tokio::test]
    async fn negative_span_is_counted_and_noted_by_the_evaluator() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(negative_span_payload()))
            .mount(&server)
            .await;

        let analyzer = HttpAnalyzer::new(reqwest::Client::new(), server.uri());
        let evaluator = Evaluator::new(Services::default().with_analyzer(Arc::new(analyzer)));
        let result = evaluator.evaluate("He go home.").await.unwrap();

        assert_eq!(result.grammar_diagnostics.len(), 2);
        assert_eq!(result.score.grammar, 75);
        assert_eq!(result.reconciled_diagnostics.len(), 1);
        assert_eq!(result.reconciled_diagnostics[0].kind, "subject_verb_agreement");
        assert!(result.notes.iter().any(|n| n.source == NoteSource::Analyzer
            && n.status == NoteStatus::MalformedSpan
            && n.message.starts_with("tense")));
        assert!(
            !result
                .notes
                .iter()
                .any(|n| n.source == NoteSource::Analyzer && n.status == NoteStatus::Unavailable)
        );
    }

    #[tokio::test]
    async fn missing_lists_default_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let analyzer = HttpAnalyzer::new(reqwest::Client::new(), server.uri());
        let report = analyzer.analyze("fine").await.unwrap();
        assert_eq!(report, LinguisticReport::default());
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let speller = HttpSpellChecker::new(reqwest::Client::new(), server.uri());
        let err = speller.check("text").await.unwrap_err();
        match err {
            ServiceError::Status {
                service,
                status,
                body,
            } => {
                assert_eq!(service, "spelling");
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_payload_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let speller = HttpSpellChecker::new(reqwest::Client::new(), server.uri());
        let err = speller.check("text").await.unwrap_err();
        assert!(matches!(err, ServiceError::Decode { service: "spelling", .. }));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut text = "ééé".to_string();
        truncate_on_char_boundary(&mut text, 3);
        assert_eq!(text, "é");
    }
}
