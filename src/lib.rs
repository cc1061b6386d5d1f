//! Decisio - Decision tracking with drift evaluation
//!
//! Record why you chose something, then find out when the ground shifted under it.
//!
//! # Overview
//!
//! Every decision is recorded with one or more context snapshots: the team
//! size, expected user count and timeline the team believed in when it
//! decided. A single project context holds the current values. Evaluating a
//! decision compares its latest snapshot with the current context, scores
//! the drift from 0 to 100 and appends the result to the decision's history.
//!
//! # Risk Levels
//!
//! | Score | Risk |
//! |-------|------|
//! | 0-30 | `low` |
//! | 31-70 | `medium` |
//! | 71-100 | `high` |
//!
//! # Quick Start
//!
//! ```no_run
//! use decisio::{
//!     ConfidenceLevel, Database, DecisionCreate, DecisionService, DecisionType,
//!     ProjectContextService, ProjectContextUpdate,
//! };
//!
//! let db = Database::open_at("decisio.db").unwrap();
//! let decisions = DecisionService::new(db.clone());
//! let contexts = ProjectContextService::new(db);
//!
//! contexts.update(ProjectContextUpdate {
//!     team_size: Some(3),
//!     expected_users: Some(1_000),
//!     timeline_months: Some(6),
//!     ..Default::default()
//! }).unwrap();
//!
//! let decision = decisions.create_decision(DecisionCreate {
//!     title: "Single SQLite file".into(),
//!     description: "Small team, low write volume".into(),
//!     decision_type: DecisionType::Architecture,
//!     confidence_level: ConfidenceLevel::High,
//! }).unwrap();
//! decisions.snapshot_from_context(&decision.id, None).unwrap();
//!
//! // ...months later, after the context has been updated
//! let evaluation = decisions.evaluate(&decision.id).unwrap();
//! println!("{} ({})", evaluation.drift_score, evaluation.risk_level);
//! ```

pub mod config;
pub mod db;
pub mod drift;
pub mod error;
pub mod model;
pub mod schema;
pub mod serve;
pub mod service;

pub use config::Config;
pub use db::{Database, DbSummary, StoredSchema, CURRENT_SCHEMA};
pub use drift::{evaluate, DriftReport};
pub use error::{Error, Result};
pub use model::{
    ConfidenceLevel, Decision, DecisionContextSnapshot, DecisionContextSnapshotCreate,
    DecisionCreate, DecisionEvaluation, DecisionType, Page, ProjectContext, ProjectContextUpdate,
    RiskLevel,
};
pub use service::{DecisionService, ProjectContextService};

// Re-export TS trait for downstream use
#[cfg(feature = "ts-rs")]
pub use ts_rs::TS;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        let _ = CURRENT_SCHEMA;
        let _ = Page::default();
        assert_eq!(RiskLevel::High.as_str(), "high");
    }
}
