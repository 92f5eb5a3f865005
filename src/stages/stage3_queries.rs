use std::collections::HashSet;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::heuristics::generate_heuristic_queries;
use crate::llm::{
    build_claims_block, build_query_prompt, extract_json_object, normalize_query_rows, ChatGateway,
    Normalized,
};
use crate::models::{build_chunks, ChunkConfig, ChunkError, ClaimRecord, QueryRecord};
use crate::stages::dedupe_queries;

/// Configuration for validation-query generation
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Claims per model call
    pub chunk_size: i64,
    /// Claims shared between adjacent chunks
    pub chunk_overlap: i64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            chunk_size: 25,
            chunk_overlap: 5,
        }
    }
}

impl QueryConfig {
    /// Check the chunk parameters without building any chunks
    pub fn validate(&self) -> Result<(), ChunkError> {
        ChunkConfig::new(self.chunk_size, self.chunk_overlap)
            .validate()
            .map(|_| ())
    }
}

/// Counters describing one query-generation run
#[derive(Debug, Clone, Default)]
pub struct QueryStats {
    pub chunks_attempted: usize,
    pub chunks_failed: usize,
    /// Query rows rejected by validation
    pub rows_rejected: usize,
    /// Queries kept from model output after deduplication
    pub model_queries: usize,
    /// Claims with no model query that went to the fallback generator
    pub uncovered_claims: usize,
    /// Fallback queries that survived the final deduplication
    pub fallback_queries: usize,
}

/// Result of query generation
#[derive(Debug)]
pub struct QueryResult {
    pub queries: Vec<QueryRecord>,
    pub stats: QueryStats,
}

/// Pick the model for query generation.
///
/// An explicit choice wins; otherwise the first requested model that is
/// installed, then the first installed model. `None` when nothing is
/// available.
pub fn choose_query_model(
    query_model: Option<&str>,
    model_list: &[String],
    available_models: &[String],
) -> Option<String> {
    if let Some(model) = query_model.map(str::trim).filter(|m| !m.is_empty()) {
        return Some(model.to_string());
    }
    model_list
        .iter()
        .find(|m| available_models.contains(m))
        .or_else(|| available_models.first())
        .cloned()
}

/// Generate deduplicated validation queries for a claim set.
///
/// Claims are chunked and sent to the model one chunk at a time; failed
/// chunks are logged and skipped. Claims that no model query covers get a
/// heuristic fallback query. Returns immediately, without any request, when
/// no claim carries an id.
pub async fn generate_validation_queries<G: ChatGateway>(
    gateway: &G,
    claims: &[ClaimRecord],
    query_model: &str,
    config: &QueryConfig,
) -> Result<QueryResult> {
    let mut stats = QueryStats::default();
    let valid_claim_ids: HashSet<String> = claims
        .iter()
        .map(|c| c.id().trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    if valid_claim_ids.is_empty() {
        return Ok(QueryResult {
            queries: Vec::new(),
            stats,
        });
    }

    let chunks = build_chunks(claims, config.chunk_size, config.chunk_overlap)
        .context("Invalid query chunk parameters")?;
    let mut raw_rows = Vec::new();

    for (index, chunk) in chunks.iter().enumerate() {
        let label = format!("{}/{}", index + 1, chunks.len());
        let claims_block = build_claims_block(chunk);
        if claims_block.is_empty() {
            continue;
        }
        stats.chunks_attempted += 1;

        match process_chunk(gateway, query_model, &claims_block, &label, &valid_claim_ids).await {
            Ok(Some(normalized)) => {
                info!("{} query chunk {}: {} queries", query_model, label, normalized.rows.len());
                stats.rows_rejected += normalized.skipped;
                raw_rows.extend(normalized.rows);
            }
            Ok(None) => {
                warn!("Query chunk {} returned no queries list.", label);
            }
            Err(e) => {
                warn!("Query generation failed for chunk {}: {:#}", label, e);
                stats.chunks_failed += 1;
            }
        }
    }

    let mut queries = dedupe_queries(raw_rows);
    stats.model_queries = queries.len();

    let covered: HashSet<&str> = queries.iter().map(|q| q.claim_id.as_str()).collect();
    let missing: Vec<ClaimRecord> = claims
        .iter()
        .filter(|c| {
            let id = c.id().trim();
            !id.is_empty() && !covered.contains(id)
        })
        .cloned()
        .collect();

    if !missing.is_empty() {
        info!("Adding fallback queries for {} uncovered claims.", missing.len());
        stats.uncovered_claims = missing.len();
        queries.extend(generate_heuristic_queries(&missing));
    }

    let queries = dedupe_queries(queries);
    stats.fallback_queries = queries.len() - stats.model_queries;
    Ok(QueryResult { queries, stats })
}

/// Prompt the model with one claims chunk; `None` when the response has no
/// `queries` list
async fn process_chunk<G: ChatGateway>(
    gateway: &G,
    model: &str,
    claims_block: &str,
    label: &str,
    valid_claim_ids: &HashSet<String>,
) -> Result<Option<Normalized<QueryRecord>>> {
    let messages = build_query_prompt(claims_block, label);
    let response = gateway
        .chat(model, &messages)
        .await
        .context("Model request failed")?;
    let payload = extract_json_object(&response).context("Invalid query JSON")?;

    match payload.get("queries") {
        Some(Value::Array(raw)) => Ok(Some(normalize_query_rows(raw, valid_claim_ids))),
        None => Ok(Some(Normalized {
            rows: Vec::new(),
            skipped: 0,
        })),
        Some(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::FALLBACK_RATIONALE;
    use crate::models::{ClaimType, EvidenceItem, TimeRange};
    use crate::stages::testing::ScriptedGateway;

    fn claim(id: &str, text: &str) -> ClaimRecord {
        ClaimRecord {
            doc_id: "doc_1".to_string(),
            speaker: "Host".to_string(),
            claim_text: text.to_string(),
            evidence: vec![EvidenceItem {
                seg_id: "seg_1".to_string(),
                quote: text.to_string(),
            }],
            time_range_s: TimeRange::default(),
            claim_type: ClaimType::MedicalRisk,
            boldness_rating: 2,
            model: "qwen3:4b".to_string(),
            claim_id: (!id.is_empty()).then(|| id.to_string()),
        }
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_query_config_default() {
        let config = QueryConfig::default();
        assert_eq!(config.chunk_size, 25);
        assert_eq!(config.chunk_overlap, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_choose_query_model() {
        let requested = strings(&["gpt-oss:20b", "qwen3:4b"]);
        let available = strings(&["llama3:8b", "qwen3:4b"]);

        assert_eq!(
            choose_query_model(Some("mistral"), &requested, &available).as_deref(),
            Some("mistral")
        );
        assert_eq!(
            choose_query_model(None, &requested, &available).as_deref(),
            Some("qwen3:4b")
        );
        assert_eq!(
            choose_query_model(None, &strings(&["x"]), &available).as_deref(),
            Some("llama3:8b")
        );
        assert_eq!(choose_query_model(Some("  "), &requested, &[]), None);
    }

    #[tokio::test]
    async fn test_no_claim_ids_means_no_requests() {
        let gateway = ScriptedGateway::new(vec![]);
        let claims = vec![claim("", "LDL raises risk")];

        let result = generate_validation_queries(&gateway, &claims, "m", &QueryConfig::default())
            .await
            .unwrap();

        assert!(result.queries.is_empty());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_model_queries_plus_fallback_for_gaps() {
        let response = serde_json::json!({"queries": [
            {
                "claim_id": "clm_000001",
                "query": "What is the current scientific consensus on whether LDL is causal for heart disease?",
                "why_this_query": "Tests causality",
                "preferred_sources": ["mendelian randomisation"]
            },
            {"claim_id": "clm_000001", "query": "ldl is causal for heart disease?", "why_this_query": "dupe"},
            {"claim_id": "clm_999999", "query": "Is this an orphan?", "why_this_query": "x"}
        ]});
        let gateway = ScriptedGateway::new(vec![Ok(response.to_string())]);
        let claims = vec![
            claim("clm_000001", "LDL is causal for heart disease"),
            claim("clm_000002", "Statins can reduce cardiovascular events"),
        ];

        let result = generate_validation_queries(&gateway, &claims, "m", &QueryConfig::default())
            .await
            .unwrap();

        assert_eq!(result.queries.len(), 2);
        assert_eq!(result.queries[0].claim_id, "clm_000001");
        assert_eq!(result.queries[0].query, "LDL is causal for heart disease?");
        assert_eq!(result.queries[1].claim_id, "clm_000002");
        assert_eq!(result.queries[1].query, "Can Statins reduce cardiovascular events?");
        assert_eq!(result.queries[1].why_this_query, FALLBACK_RATIONALE);
        assert_eq!(result.stats.rows_rejected, 1);
        assert_eq!(result.stats.model_queries, 1);
        assert_eq!(result.stats.uncovered_claims, 1);
        assert_eq!(result.stats.fallback_queries, 1);
    }

    #[tokio::test]
    async fn test_failed_chunks_fall_back_to_heuristics() {
        let gateway = ScriptedGateway::new(vec![
            Err("timeout".to_string()),
            Ok("```json\n{\"queries\": {}}\n```".to_string()),
        ]);
        let claims = vec![
            claim("clm_000001", "Fiber lowers LDL cholesterol"),
            claim("clm_000002", "Fiber lowers LDL cholesterol."),
            claim("clm_000003", "Sauna use reduces all-cause mortality"),
        ];
        let config = QueryConfig {
            chunk_size: 2,
            chunk_overlap: 0,
        };

        let result = generate_validation_queries(&gateway, &claims, "m", &config)
            .await
            .unwrap();

        assert_eq!(gateway.calls().len(), 2);
        assert_eq!(result.stats.chunks_failed, 1);
        let ids: Vec<&str> = result.queries.iter().map(|q| q.claim_id.as_str()).collect();
        assert_eq!(ids, vec!["clm_000001", "clm_000003"]);
    }

    #[tokio::test]
    async fn test_invalid_chunk_parameters_are_fatal() {
        let gateway = ScriptedGateway::new(vec![]);
        let claims = vec![claim("clm_000001", "x")];
        let config = QueryConfig {
            chunk_size: 0,
            chunk_overlap: 0,
        };

        assert!(
            generate_validation_queries(&gateway, &claims, "m", &config)
                .await
                .is_err()
        );
        assert!(gateway.calls().is_empty());
    }
}
