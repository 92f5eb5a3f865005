use std::collections::HashSet;

use tracing::debug;

use super::{claim_tokens, jaccard_similarity, naturalize_query_question};
use super::{FALLBACK_RATIONALE, NEAR_DUPLICATE_THRESHOLD};
use crate::models::{ClaimRecord, ClaimType, QueryRecord};

/// Preferred evidence source types for a claim category
pub fn sources_for_claim_type(claim_type: ClaimType) -> Vec<String> {
    let sources: &[&str] = match claim_type {
        ClaimType::MedicalRisk => &[
            "systematic review",
            "meta-analysis",
            "guideline",
            "mendelian randomisation",
        ],
        ClaimType::TreatmentEffect | ClaimType::NutritionClaim | ClaimType::ExerciseClaim => {
            &["systematic review", "meta-analysis", "RCT", "guideline"]
        }
        ClaimType::Epidemiology => &["systematic review", "meta-analysis", "cohort study", "guideline"],
        ClaimType::Other => &["systematic review", "meta-analysis", "guideline"],
    };
    sources.iter().map(|s| s.to_string()).collect()
}

/// Synthesize one query per claim for claims the model left uncovered.
///
/// A claim is skipped when its key-term set is a near duplicate of a claim
/// already accepted in this call, or when it lacks an id or text.
pub fn generate_heuristic_queries(claims: &[ClaimRecord]) -> Vec<QueryRecord> {
    let mut rows = Vec::new();
    let mut accepted_token_sets: Vec<HashSet<String>> = Vec::new();

    for claim in claims {
        let claim_id = claim.id().trim();
        let claim_text = claim.claim_text.trim();
        if claim_id.is_empty() || claim_text.is_empty() {
            continue;
        }

        let tokens = claim_tokens(claim_text);
        if accepted_token_sets
            .iter()
            .any(|group| jaccard_similarity(&tokens, group) >= NEAR_DUPLICATE_THRESHOLD)
        {
            debug!("Fallback skipped near-duplicate claim {}", claim_id);
            continue;
        }
        accepted_token_sets.push(tokens);

        let query = naturalize_query_question(claim_text);
        if query.is_empty() {
            continue;
        }
        rows.push(QueryRecord {
            claim_id: claim_id.to_string(),
            query,
            why_this_query: FALLBACK_RATIONALE.to_string(),
            preferred_sources: sources_for_claim_type(claim.claim_type),
        });
    }

    rows
}
