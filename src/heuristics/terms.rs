use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{CLAIM_TOKEN_LIMIT, QUERY_TERM_LIMIT, STOPWORDS};

static TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9%\-]+").expect("valid term regex"));

/// Key terms of a claim: lowercase word runs with stopwords removed.
///
/// If every word is a stopword the unfiltered words are used instead.
fn key_terms(claim_text: &str, max_terms: usize) -> Vec<String> {
    let lowered = claim_text.to_lowercase();
    let tokens: Vec<&str> = TERM.find_iter(&lowered).map(|m| m.as_str()).collect();
    let filtered: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|tok| !STOPWORDS.contains(tok))
        .collect();
    let chosen = if filtered.is_empty() { tokens } else { filtered };
    chosen.into_iter().take(max_terms).map(str::to_string).collect()
}

/// Reduce claim text to a short space-separated string of key query terms
pub fn clean_query_terms(claim_text: &str) -> String {
    key_terms(claim_text, QUERY_TERM_LIMIT).join(" ")
}

/// Token set used for near-duplicate detection between claims
pub fn claim_tokens(claim_text: &str) -> HashSet<String> {
    key_terms(claim_text, CLAIM_TOKEN_LIMIT).into_iter().collect()
}

/// Jaccard similarity of two token sets; 0.0 when either is empty
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_query_terms_drops_stopwords() {
        assert_eq!(
            clean_query_terms("The risk of LDL-C is 20% higher in smokers"),
            "risk ldl-c 20% higher smokers"
        );
    }

    #[test]
    fn test_clean_query_terms_keeps_all_stopword_text() {
        assert_eq!(clean_query_terms("It is what it is"), "what");
        assert_eq!(clean_query_terms("it is"), "it is");
    }

    #[test]
    fn test_term_limits() {
        let text = (0..20).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        assert_eq!(clean_query_terms(&text).split(' ').count(), QUERY_TERM_LIMIT);
        assert_eq!(claim_tokens(&text).len(), CLAIM_TOKEN_LIMIT);
    }

    #[test]
    fn test_jaccard_similarity() {
        let a = claim_tokens("fiber lowers ldl cholesterol");
        let b = claim_tokens("Fiber lowers LDL");
        assert!((jaccard_similarity(&a, &b) - 0.75).abs() < 1e-9);
        assert_eq!(jaccard_similarity(&a, &HashSet::new()), 0.0);
    }
}
