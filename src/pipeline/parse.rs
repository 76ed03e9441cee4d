//! Output parsers for the classifier and voting stages.

use std::sync::LazyLock;

use regex::Regex;

/// Classification assumed when the LLM output contains no digit.
///
/// Fail-open on purpose: an unparseable classification means "go search",
/// never an error.
pub const DEFAULT_CLASSIFICATION: i32 = 3;

static VOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)overall\s+opinion:\s+there\s+is\s+an\s+answer").expect("valid vote regex")
});

/// Extract the intent code: the first decimal digit anywhere in the output.
pub fn parse_classification(text: &str) -> i32 {
    text.chars()
        .find_map(|c| c.to_digit(10))
        .map(|d| d as i32)
        .unwrap_or(DEFAULT_CLASSIFICATION)
}

/// Parse the voting verdict. True only on an explicit affirmative phrase;
/// anything else (refusals, partial matches, garbage) is a rejection.
pub fn parse_vote(text: &str) -> bool {
    VOTE_RE.is_match(text)
}
