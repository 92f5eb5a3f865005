use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ClaimRecord, QueryRecord};

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W+").expect("valid non-word regex"));

/// Lowercase text with every run of non-word characters collapsed to one
/// space, trimmed
pub fn normalize_dedupe_text(text: &str) -> String {
    NON_WORD
        .replace_all(&text.to_lowercase(), " ")
        .trim()
        .to_string()
}

/// Format a 1-indexed sequence number as a claim id
pub fn format_claim_id(index: usize) -> String {
    format!("clm_{index:06}")
}

fn claim_dedupe_key(row: &ClaimRecord) -> (String, String, Vec<String>) {
    (
        row.model.clone(),
        normalize_dedupe_text(&row.claim_text),
        row.sorted_seg_ids().into_iter().map(str::to_string).collect(),
    )
}

/// Deduplicate claim rows and assign sequential claim ids.
///
/// Rows are keyed by (model, normalized claim text, sorted evidence seg ids);
/// the first row per key is kept. Ids `clm_000001`, `clm_000002`, ... are
/// assigned in output order, replacing any earlier ids.
pub fn dedupe_and_assign_claim_ids(rows: Vec<ClaimRecord>) -> Vec<ClaimRecord> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(claim_dedupe_key(row)))
        .enumerate()
        .map(|(index, mut row)| {
            row.claim_id = Some(format_claim_id(index + 1));
            row
        })
        .collect()
}

/// Deduplicate query rows by normalized query text; rows whose text
/// normalizes to nothing are dropped
pub fn dedupe_queries(rows: Vec<QueryRecord>) -> Vec<QueryRecord> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| {
            let key = normalize_dedupe_text(&row.query);
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClaimType, EvidenceItem, TimeRange};

    fn claim(model: &str, text: &str, seg_ids: &[&str]) -> ClaimRecord {
        ClaimRecord {
            doc_id: "doc_1".to_string(),
            speaker: "Host".to_string(),
            claim_text: text.to_string(),
            evidence: seg_ids
                .iter()
                .map(|s| EvidenceItem {
                    seg_id: s.to_string(),
                    quote: text.to_string(),
                })
                .collect(),
            time_range_s: TimeRange::default(),
            claim_type: ClaimType::Other,
            boldness_rating: 2,
            model: model.to_string(),
            claim_id: None,
        }
    }

    fn query(text: &str) -> QueryRecord {
        QueryRecord {
            claim_id: "clm_000001".to_string(),
            query: text.to_string(),
            why_this_query: "x".to_string(),
            preferred_sources: vec![],
        }
    }

    #[test]
    fn test_claim_dedupe_and_deterministic_ids() {
        let rows = vec![
            claim("qwen3:4b", "LDL raises risk", &["seg_000001"]),
            claim("qwen3:4b", "LDL raises risk.", &["seg_000001"]),
            claim("qwen3:4b", "Fiber lowers LDL", &["seg_000002"]),
        ];

        let deduped = dedupe_and_assign_claim_ids(rows);

        let ids: Vec<&str> = deduped.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["clm_000001", "clm_000002"]);
        assert_eq!(deduped[0].claim_text, "LDL raises risk");
    }

    #[test]
    fn test_case_and_punctuation_collapse_to_single_row() {
        let rows = vec![
            claim("m", "LDL Raises Risk!!", &["seg_2", "seg_1"]),
            claim("m", "ldl raises risk", &["seg_1", "seg_2"]),
        ];

        let deduped = dedupe_and_assign_claim_ids(rows);

        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].claim_id.as_deref(), Some("clm_000001"));
    }

    #[test]
    fn test_distinct_models_or_evidence_are_kept() {
        let rows = vec![
            claim("qwen3:4b", "LDL raises risk", &["seg_1"]),
            claim("gpt-oss:20b", "LDL raises risk", &["seg_1"]),
            claim("qwen3:4b", "LDL raises risk", &["seg_1", "seg_2"]),
        ];

        assert_eq!(dedupe_and_assign_claim_ids(rows).len(), 3);
    }

    #[test]
    fn test_claim_dedupe_is_idempotent() {
        let rows = vec![
            claim("m", "A claim", &["s1"]),
            claim("m", "a claim", &["s1"]),
            claim("m", "Another claim", &["s2"]),
            claim("n", "A claim", &["s1"]),
        ];

        let once = dedupe_and_assign_claim_ids(rows);
        let twice = dedupe_and_assign_claim_ids(once.clone());

        assert_eq!(once, twice);
    }

    #[test]
    fn test_ids_are_renumbered_from_scratch() {
        let mut row = claim("m", "A claim", &["s1"]);
        row.claim_id = Some("clm_000042".to_string());

        let deduped = dedupe_and_assign_claim_ids(vec![row]);

        assert_eq!(deduped[0].id(), "clm_000001");
    }

    #[test]
    fn test_query_dedupe() {
        let rows = vec![
            query("Is LDL an independent risk factor?"),
            query("is LDL an independent risk factor"),
            query("Does fiber lower LDL?"),
            query("???"),
        ];

        let deduped = dedupe_queries(rows);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].query, "Is LDL an independent risk factor?");
        assert_eq!(deduped[1].query, "Does fiber lower LDL?");
    }

    #[test]
    fn test_format_claim_id() {
        assert_eq!(format_claim_id(1), "clm_000001");
        assert_eq!(format_claim_id(123456), "clm_123456");
    }
}
