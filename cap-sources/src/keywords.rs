//! Shared keyword extraction and overlap scoring, used by every adapter.

use std::collections::HashSet;

use once_cell::sync::Lazy;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "have", "has", "had", "do",
        "does", "did", "will", "would", "could", "should", "can", "may", "might", "must", "i",
        "you", "we", "they", "me", "my", "your", "this", "that", "these", "those", "what",
        "which", "who", "how", "why", "when", "where", "and", "or", "but", "if", "for", "of",
        "to", "from", "in", "on", "at", "by", "with", "about", "not", "so", "just", "also",
        "need", "want", "let", "get", "make", "test", "check", "fix", "work",
    ]
    .into_iter()
    .collect()
});

/// Drop stop words and tokens of length <= 2, keep the first five survivors.
pub fn extract_keywords(prompt: &str) -> Vec<String> {
    prompt
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(*w))
        .take(5)
        .map(str::to_string)
        .collect()
}

/// `min(Σ weight(token) for token in prompt_tokens if token in text, 0.5)`,
/// weight 0.2 per token of length > 3 found case-insensitively in `text`.
pub fn keyword_score(prompt_lower: &str, text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let text_lower = text.to_lowercase();
    let mut score: f64 = 0.0;
    for word in prompt_lower.split_whitespace() {
        if word.len() > 3 && text_lower.contains(word) {
            score += 0.2;
        }
    }
    score.min(0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_stop_words_and_short_tokens() {
        let kws = extract_keywords("what did we decide about retry semantics");
        assert_eq!(kws, vec!["decide", "retry", "semantics"]);
    }

    #[test]
    fn caps_at_five_tokens() {
        let kws = extract_keywords("alpha bravo charlie delta echo foxtrot golf");
        assert_eq!(kws.len(), 5);
    }

    #[test]
    fn empty_prompt_yields_no_keywords() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("a an is").is_empty());
    }

    #[test]
    fn keyword_score_counts_matching_long_words_capped_at_half() {
        let score = keyword_score("retries bounded semantics decision", "Retries bounded at 3");
        assert!((score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn keyword_score_caps_at_point_five() {
        let score = keyword_score("alpha bravo charlie delta echo", "alpha bravo charlie delta echo");
        assert_eq!(score, 0.5);
    }
}
