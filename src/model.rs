//! Domain and wire types
//!
//! These are the JSON shapes exchanged with the frontend. Field names match
//! the REST contract exactly, so the same structs serve as API payloads, CLI
//! output and (with the `ts-rs` feature) TypeScript declarations.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest accepted decision title, in characters
pub const MAX_TITLE_LEN: usize = 255;

/// Current time as an RFC 3339 UTC string.
///
/// Microsecond precision with a `Z` suffix keeps the strings fixed-width,
/// so ordering by the text column is ordering by time.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Generate a new record id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ============================================================================
// Enumerations
// ============================================================================

/// What kind of decision was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts-rs", derive(ts_rs::TS))]
pub enum DecisionType {
    Architecture,
    Technology,
    Process,
}

/// How sure the team was when deciding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts-rs", derive(ts_rs::TS))]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

/// Coarse classification of a drift score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts-rs", derive(ts_rs::TS))]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl DecisionType {
    pub const ALL: [DecisionType; 3] = [Self::Architecture, Self::Technology, Self::Process];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Architecture => "architecture",
            Self::Technology => "technology",
            Self::Process => "process",
        }
    }
}

impl ConfidenceLevel {
    pub const ALL: [ConfidenceLevel; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

macro_rules! text_enum_impls {
    ($ty:ident, $label:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                Self::ALL
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| {
                        let allowed: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        format!(
                            "Invalid {} '{}'. Expected one of: {}",
                            $label,
                            s,
                            allowed.join(", ")
                        )
                    })
            }
        }
    };
}

text_enum_impls!(DecisionType, "decision type");
text_enum_impls!(ConfidenceLevel, "confidence level");
text_enum_impls!(RiskLevel, "risk level");

// ============================================================================
// Decisions
// ============================================================================

/// A recorded decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-rs", derive(ts_rs::TS))]
pub struct Decision {
    pub id: String,
    pub title: String,
    pub description: String,
    pub decision_type: DecisionType,
    pub confidence_level: ConfidenceLevel,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-rs", derive(ts_rs::TS))]
pub struct DecisionCreate {
    pub title: String,
    pub description: String,
    pub decision_type: DecisionType,
    pub confidence_level: ConfidenceLevel,
}

/// Offset/limit window for listing decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_page_limit")]
    pub limit: i64,
}

/// Largest page the store will return in one call
pub const MAX_PAGE_LIMIT: i64 = 1000;

fn default_page_limit() -> i64 {
    100
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_page_limit(),
        }
    }
}

impl Page {
    /// Clamp to sane bounds: no negative offsets, limit within 0..=MAX_PAGE_LIMIT
    pub fn normalized(self) -> Self {
        Self {
            skip: self.skip.max(0),
            limit: self.limit.clamp(0, MAX_PAGE_LIMIT),
        }
    }
}

// ============================================================================
// Project context
// ============================================================================

/// The project's current ground truth. At most one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-rs", derive(ts_rs::TS))]
pub struct ProjectContext {
    pub id: String,
    pub team_size: i32,
    pub expected_users: i32,
    pub timeline_months: i32,
    pub constraints: Option<String>,
    pub updated_at: String,
}

/// Partial update for the project context.
///
/// `constraints` is doubly optional: absent leaves the stored value alone,
/// an explicit `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-rs", derive(ts_rs::TS))]
pub struct ProjectContextUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-rs", ts(optional))]
    pub team_size: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-rs", ts(optional))]
    pub expected_users: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-rs", ts(optional))]
    pub timeline_months: Option<i32>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "ts-rs", ts(optional))]
    pub constraints: Option<Option<String>>,
}

/// Present-but-null becomes `Some(None)` instead of collapsing to `None`
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

// ============================================================================
// Snapshots and evaluations
// ============================================================================

/// Frozen copy of the project context, taken for one decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-rs", derive(ts_rs::TS))]
pub struct DecisionContextSnapshot {
    pub id: String,
    pub decision_id: String,
    pub team_size_at_decision: i32,
    pub expected_users_at_decision: i32,
    pub timeline_at_decision: i32,
    pub assumptions: Option<String>,
    pub created_at: String,
}

/// Request body for creating a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-rs", derive(ts_rs::TS))]
pub struct DecisionContextSnapshotCreate {
    pub team_size_at_decision: i32,
    pub expected_users_at_decision: i32,
    pub timeline_at_decision: i32,
    #[serde(default)]
    #[cfg_attr(feature = "ts-rs", ts(optional))]
    pub assumptions: Option<String>,
}

impl DecisionContextSnapshotCreate {
    /// Snapshot body carrying the context's current values
    pub fn from_context(context: &ProjectContext, assumptions: Option<String>) -> Self {
        Self {
            team_size_at_decision: context.team_size,
            expected_users_at_decision: context.expected_users,
            timeline_at_decision: context.timeline_months,
            assumptions,
        }
    }
}

/// One drift evaluation result. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-rs", derive(ts_rs::TS))]
pub struct DecisionEvaluation {
    pub id: String,
    pub decision_id: String,
    pub drift_score: i32,
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub evaluated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trip_through_text() {
        for t in DecisionType::ALL {
            assert_eq!(t.as_str().parse::<DecisionType>().unwrap(), t);
        }
        for c in ConfidenceLevel::ALL {
            assert_eq!(c.to_string().parse::<ConfidenceLevel>().unwrap(), c);
        }
        assert_eq!("HIGH".parse::<RiskLevel>().unwrap(), RiskLevel::High);
    }

    #[test]
    fn test_enum_parse_error_lists_choices() {
        let err = "strategy".parse::<DecisionType>().unwrap_err();
        assert!(err.contains("architecture, technology, process"));
    }

    #[test]
    fn test_enums_serialize_lowercase() {
        let json = serde_json::to_string(&DecisionType::Technology).unwrap();
        assert_eq!(json, "\"technology\"");
        let risk: RiskLevel = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(risk, RiskLevel::Medium);
    }

    #[test]
    fn test_risk_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }

    #[test]
    fn test_context_update_distinguishes_null_from_absent() {
        let absent: ProjectContextUpdate = serde_json::from_str(r#"{"team_size": 4}"#).unwrap();
        assert_eq!(absent.team_size, Some(4));
        assert_eq!(absent.constraints, None);

        let cleared: ProjectContextUpdate =
            serde_json::from_str(r#"{"constraints": null}"#).unwrap();
        assert_eq!(cleared.constraints, Some(None));

        let set: ProjectContextUpdate =
            serde_json::from_str(r#"{"constraints": "EU data residency"}"#).unwrap();
        assert_eq!(set.constraints, Some(Some("EU data residency".to_string())));
    }

    #[test]
    fn test_snapshot_create_assumptions_optional() {
        let body: DecisionContextSnapshotCreate = serde_json::from_str(
            r#"{"team_size_at_decision": 3, "expected_users_at_decision": 50, "timeline_at_decision": 2}"#,
        )
        .unwrap();
        assert_eq!(body.assumptions, None);
    }

    #[test]
    fn test_page_defaults_and_clamping() {
        let page: Page = serde_urlencoded::from_str("").unwrap();
        assert_eq!(page, Page::default());

        let page: Page = serde_urlencoded::from_str("skip=-5&limit=50000").unwrap();
        let page = page.normalized();
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, MAX_PAGE_LIMIT);

        let page = Page { skip: 0, limit: -1 }.normalized();
        assert_eq!(page.limit, 0);
    }

    #[test]
    fn test_timestamps_sort_chronologically() {
        let a = now_timestamp();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = now_timestamp();
        assert!(a < b);
        assert!(a.ends_with('Z'));
    }
}
