//! Candidate-query construction and content-keyed document merging for the
//! multi-query retrieval fan-out.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::retriever::Document;

static QUERY_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*Question\d+:\s*").expect("valid query label regex"));

/// Build the candidate query set: the original query plus every non-empty
/// line of the generated text, each stripped of a leading `Question<N>:`
/// label and surrounding whitespace.
pub fn candidate_queries(original: &str, generated: &str) -> Vec<String> {
    std::iter::once(original)
        .chain(generated.lines())
        .filter_map(|line| {
            let cleaned = QUERY_LABEL_RE.replace(line, "");
            let cleaned = cleaned.trim();
            (!cleaned.is_empty()).then(|| cleaned.to_string())
        })
        .collect()
}

/// Merge per-query result lists, deduplicating by document content.
///
/// Later lists overwrite earlier ones for the same content key. Output order
/// is not significant.
pub fn merge_documents(results: Vec<Vec<Document>>) -> Vec<Document> {
    let mut by_content: HashMap<String, Document> = HashMap::new();
    for docs in results {
        for doc in docs {
            by_content.insert(doc.content.clone(), doc);
        }
    }
    by_content.into_values().collect()
}
