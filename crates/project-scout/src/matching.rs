/// Exact and fuzzy keyword matching against free text.
///
/// - Exact: the keyword occurs in the text as a case-insensitive substring.
/// - Fuzzy: the text is lowercased, stripped of punctuation and split into tokens.
///   A one-word keyword matches when some token's similarity to it is above the
///   threshold. An n-word keyword matches when some window of n consecutive tokens
///   has an average per-word similarity above the threshold.
///
/// Similarity is the Sørensen–Dice bigram ratio in [0, 1].
use std::sync::LazyLock;

use regex::Regex;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

/// Text prepared once for repeated matching: a lowercased copy for substring
/// checks and the normalized tokens for fuzzy checks.
#[derive(Debug, Clone)]
pub struct PreparedText {
    lowered: String,
    tokens: Vec<String>,
}

impl PreparedText {
    pub fn new(text: &str) -> Self {
        Self {
            lowered: text.trim().to_lowercase(),
            tokens: tokenize(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lowered.is_empty()
    }
}

/// Lowercase, drop everything that is not a word character or whitespace, split on
/// whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    NON_WORD
        .replace_all(&text.to_lowercase(), "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Test `keyword` against `text`. The exact check runs first; the fuzzy check is
/// only attempted when there is no exact match.
pub fn match_keyword(text: &PreparedText, keyword: &PreparedText, threshold: f64) -> Option<MatchKind> {
    if text.is_empty() || keyword.is_empty() {
        return None;
    }
    if text.lowered.contains(&keyword.lowered) {
        return Some(MatchKind::Exact);
    }
    if fuzzy_match(&text.tokens, &keyword.tokens, threshold) {
        return Some(MatchKind::Fuzzy);
    }
    None
}

fn fuzzy_match(text_tokens: &[String], keyword_tokens: &[String], threshold: f64) -> bool {
    let n = keyword_tokens.len();
    if n == 0 || text_tokens.len() < n {
        return false;
    }
    text_tokens
        .windows(n)
        .any(|window| window_similarity(window, keyword_tokens) > threshold)
}

fn window_similarity(window: &[String], keyword_tokens: &[String]) -> f64 {
    let total: f64 = window
        .iter()
        .zip(keyword_tokens)
        .map(|(word, keyword)| similarity(word, keyword))
        .sum();
    total / keyword_tokens.len() as f64
}

pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::sorensen_dice(a, b)
}
