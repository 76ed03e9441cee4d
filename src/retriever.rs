//! Client for the external document-ranking API.
//!
//! Retrieval is deliberately fail-soft: any network, status, or parse failure
//! degrades to an empty result set. The pipeline treats "no documents found"
//! as a normal outcome, never as an error.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-call timeout for the ranking API.
const RETRIEVE_TIMEOUT: Duration = Duration::from_secs(15);

/// A retrieved document: concatenated best-matching fragments plus source
/// metadata. Identity for deduplication is `content`, not `doc_id` — the
/// backing API can return the same text under different identifiers.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Ranked fragments joined with blank lines, in API order.
    pub content: String,
    /// Source URL of the document.
    pub source: String,
    /// Document title.
    pub title: String,
    /// Backend document id.
    pub doc_id: Option<i64>,
    /// Backend revision id.
    pub mod_id: Option<i64>,
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct RankingApiRequest<'a> {
    query: &'a str,
    alias: &'a str,
}

#[derive(Deserialize)]
struct RankingApiResponse {
    #[serde(default)]
    ranking_dicts: Vec<RankingDict>,
}

#[derive(Deserialize)]
struct RankingDict {
    #[serde(default)]
    best_fragments_scores: Vec<(String, f64)>,
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    doc_id: Option<i64>,
    mod_id: Option<i64>,
}

impl From<RankingDict> for Document {
    fn from(d: RankingDict) -> Self {
        let content = d
            .best_fragments_scores
            .iter()
            .map(|(text, _score)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        Self {
            content,
            source: d.link,
            title: d.title,
            doc_id: d.doc_id,
            mod_id: d.mod_id,
        }
    }
}

// =============================================================================
// RETRIEVER
// =============================================================================

/// HTTP client for the ranking API.
#[derive(Debug, Clone)]
pub struct ApiRetriever {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl ApiRetriever {
    /// Create a retriever for `{base_url}{endpoint}` with a fixed bearer token.
    pub fn new(
        base_url: impl AsRef<str>,
        endpoint: impl AsRef<str>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!(
                "{}{}",
                base_url.as_ref().trim_end_matches('/'),
                endpoint.as_ref()
            ),
            token: token.into(),
        }
    }

    /// Fetch documents for one query against the given corpus alias.
    ///
    /// Returns an empty list on any failure.
    pub async fn retrieve(&self, query: &str, alias: &str) -> Vec<Document> {
        let body = RankingApiRequest { query, alias };

        let response = self
            .client
            .post(&self.url)
            .timeout(RETRIEVE_TIMEOUT)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(query, error = %e, "retrieval request failed");
                return Vec::new();
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(query, status = status.as_u16(), "retrieval returned non-success status");
            return Vec::new();
        }

        match response.json::<RankingApiResponse>().await {
            Ok(parsed) => parsed
                .ranking_dicts
                .into_iter()
                .map(Document::from)
                .collect(),
            Err(e) => {
                tracing::warn!(query, error = %e, "retrieval response was not valid JSON");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_join_with_blank_line_in_api_order() {
        let dict = RankingDict {
            best_fragments_scores: vec![
                ("second-best ranked first".to_string(), 0.4),
                ("then this one".to_string(), 0.9),
            ],
            link: "https://example.com/a".to_string(),
            title: "A".to_string(),
            doc_id: Some(7),
            mod_id: Some(1),
        };

        let doc = Document::from(dict);
        assert_eq!(doc.content, "second-best ranked first\n\nthen this one");
        assert_eq!(doc.source, "https://example.com/a");
    }

    #[test]
    fn response_parses_fragment_score_pairs() {
        let raw = r#"{
            "ranking_dicts": [
                {
                    "best_fragments_scores": [["text one", 0.9], ["text two", 0.5]],
                    "link": "https://example.com/doc",
                    "title": "Doc",
                    "doc_id": 42,
                    "mod_id": 3
                }
            ]
        }"#;

        let parsed: RankingApiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.ranking_dicts.len(), 1);
        assert_eq!(parsed.ranking_dicts[0].best_fragments_scores[0].0, "text one");
    }

    #[test]
    fn missing_fields_default_rather_than_fail() {
        let raw = r#"{"ranking_dicts": [{}]}"#;
        let parsed: RankingApiResponse = serde_json::from_str(raw).unwrap();
        let doc = Document::from(parsed.ranking_dicts.into_iter().next().unwrap());
        assert!(doc.content.is_empty());
        assert!(doc.doc_id.is_none());
    }
}
