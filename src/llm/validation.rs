use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::heuristics::naturalize_query_question;
use crate::models::lenient::{coerce_int, collapse_whitespace, text_field, text_list};
use crate::models::{
    clamp_boldness, default_preferred_sources, ClaimRecord, ClaimType, EvidenceItem, QueryRecord,
    TimeRange,
};

/// Reasons a raw model row is rejected during normalization
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("row is not a JSON object")]
    NotAnObject,
    #[error("claim_text is empty")]
    EmptyClaimText,
    #[error("claim has no usable evidence")]
    NoEvidence,
    #[error("claim_id {0:?} does not match any known claim")]
    UnknownClaimId(String),
    #[error("query is empty")]
    EmptyQuery,
    #[error("why_this_query is empty")]
    EmptyRationale,
}

/// Rows that survived normalization, plus how many were rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

impl<T> Normalized<T> {
    fn collect<I>(results: I, kind: &str) -> Self
    where
        I: IntoIterator<Item = Result<T, ValidationError>>,
    {
        let mut rows = Vec::new();
        let mut skipped = 0;
        for result in results {
            match result {
                Ok(row) => rows.push(row),
                Err(e) => {
                    debug!("Dropped {} row: {}", kind, e);
                    skipped += 1;
                }
            }
        }
        Self { rows, skipped }
    }
}

/// What the claim validator needs to know about the source document
#[derive(Debug, Clone, Copy)]
pub struct ClaimContext<'a> {
    pub doc_id: &'a str,
    pub model: &'a str,
    pub start_time_by_seg_id: &'a HashMap<String, i64>,
}

/// Keep evidence entries that are objects with non-empty seg_id and quote
pub fn normalize_evidence(evidence: Option<&Value>) -> Vec<EvidenceItem> {
    match evidence {
        Some(Value::Array(items)) => items.iter().filter_map(EvidenceItem::from_raw).collect(),
        _ => Vec::new(),
    }
}

/// Resolve a claim's time range.
///
/// `start`/`end` come from `time_range_s` when they coerce to integers,
/// otherwise from the evidence-derived fallbacks. `end` is clamped up to
/// `start`.
pub fn derive_time_range(claim: &Map<String, Value>, fallback_start: i64, fallback_end: i64) -> TimeRange {
    match claim.get("time_range_s") {
        Some(Value::Object(range)) => {
            let start = range.get("start").and_then(coerce_int).unwrap_or(fallback_start);
            let end = range.get("end").and_then(coerce_int).unwrap_or(fallback_end);
            TimeRange::new(start, end)
        }
        _ => TimeRange::new(fallback_start, fallback_end),
    }
}

/// Read `boldness_rating` (or legacy `surprise_rating`) as a 1-3 score.
/// A present `boldness_rating` key wins even when null.
pub fn normalize_boldness_rating(claim: &Map<String, Value>) -> u8 {
    let raw = claim
        .get("boldness_rating")
        .or_else(|| claim.get("surprise_rating"));
    clamp_boldness(raw.and_then(coerce_int))
}

/// Validate one raw claim payload into a `ClaimRecord` (without claim_id)
pub fn validate_claim(raw: &Value, ctx: &ClaimContext<'_>) -> Result<ClaimRecord, ValidationError> {
    let claim = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let speaker = text_field(claim, "speaker");
    let claim_text = text_field(claim, "claim_text");
    if claim_text.is_empty() {
        return Err(ValidationError::EmptyClaimText);
    }

    let evidence = normalize_evidence(claim.get("evidence"));
    if evidence.is_empty() {
        return Err(ValidationError::NoEvidence);
    }

    let known_starts: Vec<i64> = evidence
        .iter()
        .filter_map(|e| ctx.start_time_by_seg_id.get(&e.seg_id).copied())
        .collect();
    let fallback_start = known_starts.iter().copied().min().unwrap_or(0);
    let fallback_end = known_starts.iter().copied().max().unwrap_or(fallback_start);

    Ok(ClaimRecord {
        doc_id: ctx.doc_id.trim().to_string(),
        speaker,
        claim_text,
        evidence,
        time_range_s: derive_time_range(claim, fallback_start, fallback_end),
        claim_type: ClaimType::parse(&text_field(claim, "claim_type")),
        boldness_rating: normalize_boldness_rating(claim),
        model: ctx.model.trim().to_string(),
        claim_id: None,
    })
}

/// Normalize a batch of raw claims, dropping (and counting) invalid rows
pub fn normalize_claims(
    doc_id: &str,
    model: &str,
    raw_claims: &[Value],
    start_time_by_seg_id: &HashMap<String, i64>,
) -> Normalized<ClaimRecord> {
    let ctx = ClaimContext {
        doc_id,
        model,
        start_time_by_seg_id,
    };
    Normalized::collect(raw_claims.iter().map(|raw| validate_claim(raw, &ctx)), "claim")
}

/// Validate one raw query payload against the set of known claim ids
pub fn validate_query_row(
    raw: &Value,
    valid_claim_ids: &HashSet<String>,
) -> Result<QueryRecord, ValidationError> {
    let row = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let claim_id = text_field(row, "claim_id");
    let query = naturalize_query_question(&text_field(row, "query"));
    let why_this_query = collapse_whitespace(&text_field(row, "why_this_query"));

    if !valid_claim_ids.contains(&claim_id) {
        return Err(ValidationError::UnknownClaimId(claim_id));
    }
    if query.is_empty() {
        return Err(ValidationError::EmptyQuery);
    }
    if why_this_query.is_empty() {
        return Err(ValidationError::EmptyRationale);
    }

    let mut preferred_sources = row.get("preferred_sources").map(text_list).unwrap_or_default();
    if preferred_sources.is_empty() {
        preferred_sources = default_preferred_sources();
    }

    Ok(QueryRecord {
        claim_id,
        query,
        why_this_query,
        preferred_sources,
    })
}

/// Normalize a batch of raw query rows, dropping (and counting) invalid rows
pub fn normalize_query_rows(raw_queries: &[Value], valid_claim_ids: &HashSet<String>) -> Normalized<QueryRecord> {
    Normalized::collect(
        raw_queries.iter().map(|raw| validate_query_row(raw, valid_claim_ids)),
        "query",
    )
}
