use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{ClaimRecord, QueryRecord, TranscriptDocument};

/// An evidence item resolved against its transcript segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEvidence {
    pub claim_id: String,
    pub doc_id: String,
    pub seg_id: String,
    pub quote: String,
    pub found: bool,
    pub speaker: String,
    pub start_time_s: u64,
    pub segment_text: String,
}

/// Linkage health across claims, queries and transcripts
#[derive(Debug, Clone, Serialize)]
pub struct LinkDiagnostics {
    pub total_claims: usize,
    pub total_queries: usize,
    pub total_transcript_docs: usize,
    /// Queries whose claim_id matches no claim
    pub orphan_queries: Vec<QueryRecord>,
    pub claims_without_queries: Vec<ClaimRecord>,
    /// Claims whose doc_id has no loaded transcript
    pub claims_missing_transcript_doc: Vec<ClaimRecord>,
    pub claims_without_evidence: Vec<ClaimRecord>,
    /// Evidence pointing at segments absent from a loaded transcript
    pub missing_evidence_links: Vec<ResolvedEvidence>,
}

/// Diagnostics as written to a JSON report
#[derive(Debug, Serialize)]
pub struct DiagnosticsReport<'a> {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub diagnostics: &'a LinkDiagnostics,
}

impl LinkDiagnostics {
    pub fn report(&self) -> DiagnosticsReport<'_> {
        DiagnosticsReport {
            generated_at: Utc::now(),
            diagnostics: self,
        }
    }

    /// True when every link resolves
    pub fn is_clean(&self) -> bool {
        self.orphan_queries.is_empty()
            && self.claims_without_queries.is_empty()
            && self.claims_missing_transcript_doc.is_empty()
            && self.claims_without_evidence.is_empty()
            && self.missing_evidence_links.is_empty()
    }

    /// Human-readable summary with one line per gap category
    pub fn format_summary(&self) -> String {
        let mut output = format!(
            "Claims: {}  Queries: {}  Transcripts: {}\n",
            self.total_claims, self.total_queries, self.total_transcript_docs
        );
        output.push_str(&format!("Orphan queries: {}\n", self.orphan_queries.len()));
        output.push_str(&format!(
            "Claims without queries: {}\n",
            self.claims_without_queries.len()
        ));
        output.push_str(&format!(
            "Claims missing transcript doc: {}\n",
            self.claims_missing_transcript_doc.len()
        ));
        output.push_str(&format!(
            "Claims without evidence: {}\n",
            self.claims_without_evidence.len()
        ));
        output.push_str(&format!(
            "Missing evidence links: {}\n",
            self.missing_evidence_links.len()
        ));
        for link in &self.missing_evidence_links {
            output.push_str(&format!(
                "  {} -> {}/{}\n",
                link.claim_id, link.doc_id, link.seg_id
            ));
        }
        output
    }
}

/// Index claims by claim_id; the first claim per id wins
pub fn index_claims_by_id(claims: &[ClaimRecord]) -> HashMap<&str, &ClaimRecord> {
    let mut index = HashMap::new();
    for claim in claims {
        index.entry(claim.id()).or_insert(claim);
    }
    index
}

/// Group queries by the claim they validate, preserving input order
pub fn group_queries_by_claim_id(queries: &[QueryRecord]) -> HashMap<&str, Vec<&QueryRecord>> {
    let mut grouped: HashMap<&str, Vec<&QueryRecord>> = HashMap::new();
    for query in queries {
        grouped.entry(query.claim_id.as_str()).or_default().push(query);
    }
    grouped
}

/// Resolve each evidence item of a claim to its transcript segment.
///
/// Items are marked not found when the claim's document is not loaded or the
/// segment id is absent from it.
pub fn resolve_claim_evidence(
    claim: &ClaimRecord,
    transcripts_by_doc_id: &HashMap<String, TranscriptDocument>,
) -> Vec<ResolvedEvidence> {
    let segments = transcripts_by_doc_id
        .get(&claim.doc_id)
        .map(|doc| doc.segment_index())
        .unwrap_or_default();

    claim
        .evidence
        .iter()
        .map(|evidence| {
            let segment = segments.get(evidence.seg_id.as_str());
            ResolvedEvidence {
                claim_id: claim.id().to_string(),
                doc_id: claim.doc_id.clone(),
                seg_id: evidence.seg_id.clone(),
                quote: evidence.quote.clone(),
                found: segment.is_some(),
                speaker: segment.map(|s| s.speaker.clone()).unwrap_or_default(),
                start_time_s: segment.map(|s| s.start_time_s).unwrap_or_default(),
                segment_text: segment.map(|s| s.text.clone()).unwrap_or_default(),
            }
        })
        .collect()
}

/// Compute cross-artifact link diagnostics. Gaps are reported, never errors.
pub fn compute_link_diagnostics(
    claims: &[ClaimRecord],
    queries: &[QueryRecord],
    transcripts_by_doc_id: &HashMap<String, TranscriptDocument>,
) -> LinkDiagnostics {
    let claim_index = index_claims_by_id(claims);
    let queries_by_claim_id = group_queries_by_claim_id(queries);

    let orphan_queries = queries
        .iter()
        .filter(|q| !claim_index.contains_key(q.claim_id.as_str()))
        .cloned()
        .collect();
    let claims_without_queries = claims
        .iter()
        .filter(|c| !queries_by_claim_id.contains_key(c.id()))
        .cloned()
        .collect();
    let claims_missing_transcript_doc = claims
        .iter()
        .filter(|c| !transcripts_by_doc_id.contains_key(&c.doc_id))
        .cloned()
        .collect();
    let claims_without_evidence = claims
        .iter()
        .filter(|c| c.evidence.is_empty())
        .cloned()
        .collect();

    let missing_evidence_links = claims
        .iter()
        .filter(|c| transcripts_by_doc_id.contains_key(&c.doc_id))
        .flat_map(|c| resolve_claim_evidence(c, transcripts_by_doc_id))
        .filter(|resolved| !resolved.found)
        .collect();

    LinkDiagnostics {
        total_claims: claims.len(),
        total_queries: queries.len(),
        total_transcript_docs: transcripts_by_doc_id.len(),
        orphan_queries,
        claims_without_queries,
        claims_missing_transcript_doc,
        claims_without_evidence,
        missing_evidence_links,
    }
}
