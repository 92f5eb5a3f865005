use serde::{Deserialize, Serialize};

use super::lenient::{de_text, de_text_list};

/// Source types suggested when a query names none
pub const DEFAULT_PREFERRED_SOURCES: [&str; 3] = ["systematic review", "meta-analysis", "guideline"];

/// A literature-search validation query linked to a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// The claim this query validates
    #[serde(default, deserialize_with = "de_text")]
    pub claim_id: String,
    /// Natural-language search question
    #[serde(default, deserialize_with = "de_text")]
    pub query: String,
    /// Rationale for the query
    #[serde(default, deserialize_with = "de_text")]
    pub why_this_query: String,
    /// Preferred evidence source types
    #[serde(default, deserialize_with = "de_text_list")]
    pub preferred_sources: Vec<String>,
}

/// The default preferred source list as owned strings
pub fn default_preferred_sources() -> Vec<String> {
    DEFAULT_PREFERRED_SOURCES.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_record_loads_loose_row() {
        let json = r#"{"claim_id": " clm_000001 ", "query": "Does fiber lower LDL?",
            "preferred_sources": "RCT", "extra": 1}"#;

        let row: QueryRecord = serde_json::from_str(json).unwrap();

        assert_eq!(row.claim_id, "clm_000001");
        assert_eq!(row.why_this_query, "");
        assert!(row.preferred_sources.is_empty());
    }
}
