//! Deterministic fallbacks that need no model: query phrasing and
//! token-overlap query synthesis for claims the model did not cover.

pub mod fallback;
pub mod naturalize;
pub mod terms;

pub use fallback::*;
pub use naturalize::*;
pub use terms::*;

/// Jaccard similarity at or above which two claims count as near duplicates.
/// Tunable; not derived from any evaluation.
pub const NEAR_DUPLICATE_THRESHOLD: f64 = 0.72;

/// Key terms kept per claim for similarity comparison
pub const CLAIM_TOKEN_LIMIT: usize = 14;

/// Key terms kept by `clean_query_terms`
pub const QUERY_TERM_LIMIT: usize = 12;

/// Rationale attached to every fallback query
pub const FALLBACK_RATIONALE: &str = "Fallback query for claim validation using high-evidence source types matched to claim category.";

/// Words ignored when extracting key terms
pub const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "to", "of", "and", "or", "in", "for", "on",
    "with", "that", "this", "it", "as", "by", "be", "from", "at", "about", "can", "could",
];
