use std::sync::LazyLock;

use regex::Regex;

use crate::models::lenient::collapse_whitespace;

/// Repetitive scaffolding models like to prepend to every query
static CONSENSUS_PREFIXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^what is the current scientific consensus on whether (.+)\??$",
        r"(?i)^what is the current scientific consensus on the claim that (.+)\??$",
        r"(?i)^what is the current scientific consensus on (.+)\??$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid consensus regex"))
    .collect()
});

static AUXILIARY_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(is|are|can|could|should|would|do|does|did|has|have|had|will|was|were)\b")
        .expect("valid auxiliary regex")
});

/// Statement shapes that can be turned around into a question.
/// Each entry is (pattern, leading word, word inserted after the subject).
static STATEMENT_FORMS: LazyLock<Vec<(Regex, &'static str, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)^(.+?)\s+is\s+(.+)$", "Is", ""),
        (r"(?i)^(.+?)\s+are\s+(.+)$", "Are", ""),
        (r"(?i)^(.+?)\s+can\s+(.+)$", "Can", ""),
        (r"(?i)^(.+?)\s+does\s+not\s+(.+)$", "Does", "not "),
        (r"(?i)^(.+?)\s+do\s+not\s+(.+)$", "Do", "not "),
    ]
    .into_iter()
    .map(|(p, lead, infix)| (Regex::new(p).expect("valid statement regex"), lead, infix))
    .collect()
});

/// Turn a query into a short natural question.
///
/// Strips "what is the current scientific consensus on ..." scaffolding,
/// keeps queries that already end in `?`, and otherwise rephrases the
/// statement as a yes/no question. Empty input gives an empty string.
pub fn naturalize_query_question(text: &str) -> String {
    let mut query = collapse_whitespace(text);
    if query.is_empty() {
        return String::new();
    }

    for pattern in CONSENSUS_PREFIXES.iter() {
        if let Some(caps) = pattern.captures(&query) {
            query = caps[1].trim().to_string();
            break;
        }
    }

    let query = query.trim_end_matches([' ', '.']);
    if query.is_empty() {
        return String::new();
    }
    if query.ends_with('?') {
        return query.to_string();
    }
    if AUXILIARY_START.is_match(query) {
        return format!("{query}?");
    }

    for (pattern, lead, infix) in STATEMENT_FORMS.iter() {
        if let Some(caps) = pattern.captures(query) {
            return format!("{} {} {}{}?", lead, caps[1].trim(), infix, caps[2].trim());
        }
    }

    format!("Is it true that {query}?")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrites_repetitive_prefix() {
        let query = "What is the current scientific consensus on whether \
                     LDL cholesterol is an independent risk factor for heart disease?";
        assert_eq!(
            naturalize_query_question(query),
            "LDL cholesterol is an independent risk factor for heart disease?"
        );
    }

    #[test]
    fn test_claim_that_prefix_then_rephrase() {
        let query = "what is the current scientific consensus on the claim that seed oils are inflammatory.";
        assert_eq!(naturalize_query_question(query), "Are seed oils inflammatory?");
    }

    #[test]
    fn test_question_kept_unchanged() {
        for q in [
            "Does fiber lower LDL?",
            "How much protein do older adults need?",
            "Is LDL causal?",
        ] {
            assert_eq!(naturalize_query_question(q), q);
            assert_eq!(naturalize_query_question(&naturalize_query_question(q)), q);
        }
    }

    #[test]
    fn test_auxiliary_start_gets_question_mark() {
        assert_eq!(
            naturalize_query_question("Should adults take vitamin D."),
            "Should adults take vitamin D?"
        );
        // "island" starts with "is" but is not the auxiliary
        assert_eq!(
            naturalize_query_question("island diets are protective"),
            "Are island diets protective?"
        );
    }

    #[test]
    fn test_statement_forms() {
        assert_eq!(
            naturalize_query_question("LDL cholesterol is an independent risk factor"),
            "Is LDL cholesterol an independent risk factor?"
        );
        assert_eq!(
            naturalize_query_question("Statins can reduce cardiovascular events"),
            "Can Statins reduce cardiovascular events?"
        );
        assert_eq!(
            naturalize_query_question("Creatine does not damage kidneys"),
            "Does Creatine not damage kidneys?"
        );
        assert_eq!(
            naturalize_query_question("Saturated fats do not raise LDL"),
            "Do Saturated fats not raise LDL?"
        );
    }

    #[test]
    fn test_fallback_phrasing() {
        assert_eq!(
            naturalize_query_question("Fiber lowers LDL"),
            "Is it true that Fiber lowers LDL?"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(naturalize_query_question("   "), "");
        assert_eq!(naturalize_query_question(" . . "), "");
    }
}
