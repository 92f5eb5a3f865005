use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::lenient::{coerce_int, de_text, value_to_text};

/// Rating assigned when a claim carries no usable boldness score
pub const DEFAULT_BOLDNESS: u8 = 2;

/// Claim category - restricted enum, anything unrecognised collapses to `Other`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    MedicalRisk,
    TreatmentEffect,
    NutritionClaim,
    ExerciseClaim,
    Epidemiology,
    #[default]
    Other,
}

impl ClaimType {
    pub const ALL: [ClaimType; 6] = [
        ClaimType::MedicalRisk,
        ClaimType::TreatmentEffect,
        ClaimType::NutritionClaim,
        ClaimType::ExerciseClaim,
        ClaimType::Epidemiology,
        ClaimType::Other,
    ];

    /// Parse a claim type label; unknown or blank labels map to `Other`
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == label)
            .unwrap_or(ClaimType::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::MedicalRisk => "medical_risk",
            ClaimType::TreatmentEffect => "treatment_effect",
            ClaimType::NutritionClaim => "nutrition_claim",
            ClaimType::ExerciseClaim => "exercise_claim",
            ClaimType::Epidemiology => "epidemiology",
            ClaimType::Other => "other",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ClaimType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(ClaimType::parse(&value_to_text(&value)))
    }
}

/// A (segment id, quote) pair supporting a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    #[serde(default, deserialize_with = "de_text")]
    pub seg_id: String,
    #[serde(default, deserialize_with = "de_text")]
    pub quote: String,
}

impl EvidenceItem {
    /// Build an evidence item from a raw payload.
    ///
    /// Returns `None` unless the payload is an object with non-empty
    /// `seg_id` and `quote` after trimming.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let object = raw.as_object()?;
        let seg_id = object.get("seg_id").map(value_to_text).unwrap_or_default();
        let quote = object.get("quote").map(value_to_text).unwrap_or_default();
        if seg_id.is_empty() || quote.is_empty() {
            return None;
        }
        Some(Self { seg_id, quote })
    }
}

/// Time range in seconds. `end` is never before `start`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTimeRange")]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    /// Build a range, clamping `end` up to `start` when it is earlier
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }
}

#[derive(Deserialize)]
struct RawTimeRange {
    #[serde(default)]
    start: Value,
    #[serde(default)]
    end: Value,
}

impl From<RawTimeRange> for TimeRange {
    fn from(raw: RawTimeRange) -> Self {
        TimeRange::new(
            coerce_int(&raw.start).unwrap_or(0),
            coerce_int(&raw.end).unwrap_or(0),
        )
    }
}

/// A normalized claim row, as written to the claims JSONL artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    #[serde(default, deserialize_with = "de_text")]
    pub doc_id: String,
    #[serde(default, deserialize_with = "de_text")]
    pub speaker: String,
    #[serde(default, deserialize_with = "de_text")]
    pub claim_text: String,
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
    #[serde(default)]
    pub time_range_s: TimeRange,
    #[serde(default)]
    pub claim_type: ClaimType,
    #[serde(default = "default_boldness", deserialize_with = "de_boldness")]
    pub boldness_rating: u8,
    #[serde(default, deserialize_with = "de_text")]
    pub model: String,
    /// Assigned by deduplication; absent until then
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_claim_id"
    )]
    pub claim_id: Option<String>,
}

impl ClaimRecord {
    /// The assigned claim id, or "" when unassigned
    pub fn id(&self) -> &str {
        self.claim_id.as_deref().unwrap_or("")
    }

    /// Evidence segment ids, sorted
    pub fn sorted_seg_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .evidence
            .iter()
            .map(|e| e.seg_id.as_str())
            .filter(|id| !id.is_empty())
            .collect();
        ids.sort_unstable();
        ids
    }
}

/// Clamp a boldness rating to 1..=3; `None` yields the default
pub fn clamp_boldness(raw: Option<i64>) -> u8 {
    raw.map(|v| v.clamp(1, 3) as u8).unwrap_or(DEFAULT_BOLDNESS)
}

fn default_boldness() -> u8 {
    DEFAULT_BOLDNESS
}

fn de_boldness<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(clamp_boldness(coerce_int(&value)))
}

fn de_claim_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let id = value_to_text(&value);
    Ok((!id.is_empty()).then_some(id))
}
