use crate::llm::ChatMessage;
use crate::models::lenient::collapse_whitespace;
use crate::models::{ClaimRecord, TranscriptSegment};

/// System prompt for claim extraction (strict JSON output)
pub const CLAIM_SYSTEM_PROMPT: &str = concat!(
    "You extract health and medical claims from transcripts. ",
    "Return JSON only with this shape: ",
    r#"{"claims":[{"speaker":"...","claim_text":"...","evidence":[{"seg_id":"...","quote":"..."}],"#,
    r#""time_range_s":{"start":0,"end":0},"claim_type":"medical_risk","boldness_rating":2}]}. "#,
    "Do not add markdown or commentary."
);

/// System prompt for validation-query generation
pub const QUERY_SYSTEM_PROMPT: &str = concat!(
    "You generate literature-search queries to validate health claims. ",
    "Every `query` must be a single, natural-sounding question that helps evaluate ",
    "scientific consensus for a claim or a small set of similar claims. ",
    "Return JSON only with this shape: ",
    r#"{"queries":[{"claim_id":"clm_000001","query":"...","why_this_query":"...","#,
    r#""preferred_sources":["systematic review","meta-analysis","guideline"]}]}. "#
);

/// Render transcript segments as `seg_id | start | speaker | text` lines.
///
/// Segments missing an id or text are skipped.
pub fn build_segment_block(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .filter_map(|segment| {
            let text = collapse_whitespace(&segment.text);
            if segment.seg_id.trim().is_empty() || text.is_empty() {
                return None;
            }
            Some(format!(
                "{} | {} | {} | {}",
                segment.seg_id.trim(),
                segment.start_time_s,
                segment.speaker.trim(),
                text
            ))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the claim-extraction messages for one transcript chunk
pub fn build_claim_prompt(doc_id: &str, segment_block: &str, chunk_label: &str) -> Vec<ChatMessage> {
    let mut user = String::new();
    user.push_str(&format!("Document ID: {doc_id}\n\n"));
    user.push_str(&format!("Chunk: {chunk_label}\n\n"));
    user.push_str("Task:\n");
    user.push_str("1) Extract as many distinct factual health claims as possible from the transcript snippets below.\n");
    user.push_str("2) Use claim_type from this set only: medical_risk, treatment_effect, nutrition_claim, exercise_claim, epidemiology, other.\n");
    user.push_str("3) Each claim must include at least one evidence item with an exact seg_id and quote.\n");
    user.push_str("4) time_range_s.start and end must be integer seconds; derive from evidence segment starts.\n");
    user.push_str("5) Add boldness_rating on a 1-3 scale for how bold/surprising the claim is:\n");
    user.push_str("   1 = common/unsurprising mainstream statement\n");
    user.push_str("   2 = moderately strong or somewhat surprising statement\n");
    user.push_str("   3 = very bold, counter-intuitive, or highly surprising statement\n");
    user.push_str("6) Prefer recall over precision: include explicit claims about risk, causality, effects, ");
    user.push_str("recommendations, prevalence, biomarkers, or dose-response.\n\n");
    user.push_str("Transcript segments:\n");
    user.push_str(segment_block);
    user.push('\n');

    vec![ChatMessage::system(CLAIM_SYSTEM_PROMPT), ChatMessage::user(user)]
}

/// Render claims as `claim_id | claim_type | claim_text` lines.
///
/// Claims without an id or text are skipped.
pub fn build_claims_block(claims: &[ClaimRecord]) -> String {
    claims
        .iter()
        .filter_map(|claim| {
            let claim_id = claim.id().trim();
            let text = collapse_whitespace(&claim.claim_text);
            if claim_id.is_empty() || text.is_empty() {
                return None;
            }
            Some(format!("{} | {} | {}", claim_id, claim.claim_type, text))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the query-generation messages for one claims chunk
pub fn build_query_prompt(claims_block: &str, chunk_label: &str) -> Vec<ChatMessage> {
    let mut user = String::new();
    user.push_str(&format!("Chunk: {chunk_label}\n\n"));
    user.push_str("Task:\n");
    user.push_str("1) Given the claims below, generate as many high-value validation queries as possible.\n");
    user.push_str("2) You may merge very similar claims into one query and use one representative claim_id.\n");
    user.push_str("3) Phrase each query naturally and directly as a question that a human would type in search.\n");
    user.push_str("   Good: \"Is LDL cholesterol an independent risk factor for heart disease?\"\n");
    user.push_str("   Good: \"Does reducing saturated fat lower LDL cholesterol?\"\n");
    user.push_str("   Bad: \"What is the current scientific consensus on whether LDL cholesterol is an independent risk factor for heart disease?\"\n");
    user.push_str("4) Keep queries concise and optimized for evidence retrieval.\n");
    user.push_str("5) Do not use repetitive scaffolding such as \"What is the current scientific consensus on...\".\n");
    user.push_str("6) Prefer question openings like Is/Are/Does/Do/Can/Should/How much.\n");
    user.push_str("7) Do not append source types inside `query`; keep source types only in `preferred_sources`.\n");
    user.push_str("8) Prefer source types like systematic review, meta-analysis, guideline, mendelian randomisation, RCT.\n");
    user.push_str("9) Return JSON only.\n\n");
    user.push_str("Claims:\n");
    user.push_str(claims_block);
    user.push('\n');

    vec![ChatMessage::system(QUERY_SYSTEM_PROMPT), ChatMessage::user(user)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClaimType, EvidenceItem, TimeRange};

    fn claim(id: Option<&str>, text: &str) -> ClaimRecord {
        ClaimRecord {
            doc_id: "doc_1".to_string(),
            speaker: "Host".to_string(),
            claim_text: text.to_string(),
            evidence: vec![EvidenceItem {
                seg_id: "seg_1".to_string(),
                quote: "q".to_string(),
            }],
            time_range_s: TimeRange::default(),
            claim_type: ClaimType::NutritionClaim,
            boldness_rating: 2,
            model: "m".to_string(),
            claim_id: id.map(str::to_string),
        }
    }

    #[test]
    fn test_build_segment_block_skips_empty_rows() {
        let segments = vec![
            TranscriptSegment::new("seg_000001", "Host", 12, "LDL   matters\n a lot"),
            TranscriptSegment::new("seg_000002", "Guest", 20, "   "),
            TranscriptSegment::new("", "Guest", 25, "orphan"),
            TranscriptSegment::new("seg_000004", "", 31, "Fiber helps"),
        ];

        let block = build_segment_block(&segments);

        assert_eq!(
            block,
            "seg_000001 | 12 | Host | LDL matters a lot\nseg_000004 | 31 |  | Fiber helps"
        );
    }

    #[test]
    fn test_build_claim_prompt() {
        let messages = build_claim_prompt("doc_1", "seg_1 | 0 | A | hi", "2/5");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("\"claims\""));
        assert_eq!(messages[1].role, "user");
        assert!(messages[1].content.contains("Document ID: doc_1"));
        assert!(messages[1].content.contains("Chunk: 2/5"));
        assert!(messages[1].content.ends_with("seg_1 | 0 | A | hi\n"));
    }

    #[test]
    fn test_build_claims_block() {
        let claims = vec![
            claim(Some("clm_000001"), "Fiber  lowers LDL"),
            claim(None, "No id"),
            claim(Some("clm_000003"), " "),
        ];

        assert_eq!(
            build_claims_block(&claims),
            "clm_000001 | nutrition_claim | Fiber lowers LDL"
        );
    }

    #[test]
    fn test_build_query_prompt() {
        let messages = build_query_prompt("clm_000001 | other | x", "1/1");
        assert!(messages[0].content.contains("\"queries\""));
        assert!(messages[1].content.contains("Chunk: 1/1"));
        assert!(messages[1].content.contains("clm_000001 | other | x"));
    }
}
