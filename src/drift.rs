//! Decision drift scoring
//!
//! Compares the context a decision was made in (its latest snapshot) against
//! the project's current context and turns the difference into a 0-100 score.
//!
//! # Scoring
//!
//! Each dimension's relative change is `|current - then| / max(then, 1)`, in
//! percent. A dimension earns the points of the first tier whose threshold the
//! change strictly exceeds:
//!
//! | Dimension | Tiers (change > threshold → points) |
//! |-----------|-------------------------------------|
//! | Team size | 50% → 30, 25% → 15 |
//! | Expected users | 100% → 35, 50% → 20, 25% → 10 |
//! | Timeline | 50% → 35, 25% → 20 |
//!
//! The score is the sum, capped at 100. Risk is `low` up to 30, `medium` up to
//! 70 and `high` above that.
//!
//! Everything here is pure: no clock, no storage, no randomness.

use crate::model::{DecisionContextSnapshot, ProjectContext, RiskLevel};
use serde::Serialize;

/// Highest possible drift score
pub const MAX_DRIFT_SCORE: u32 = 100;

/// Scores at or below this are low risk
pub const LOW_RISK_MAX: u32 = 30;

/// Scores at or below this (and above `LOW_RISK_MAX`) are medium risk
pub const MEDIUM_RISK_MAX: u32 = 70;

/// A project context dimension tracked for drift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    TeamSize,
    ExpectedUsers,
    Timeline,
}

impl Dimension {
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::TeamSize => "Team size",
            Dimension::ExpectedUsers => "Expected users",
            Dimension::Timeline => "Timeline",
        }
    }

    /// Point tiers, highest threshold first
    fn tiers(&self) -> &'static [Tier] {
        match self {
            Dimension::TeamSize => TEAM_SIZE_TIERS,
            Dimension::ExpectedUsers => EXPECTED_USERS_TIERS,
            Dimension::Timeline => TIMELINE_TIERS,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Tier {
    above_pct: f64,
    points: u32,
}

const fn tier(above_pct: f64, points: u32) -> Tier {
    Tier { above_pct, points }
}

const TEAM_SIZE_TIERS: &[Tier] = &[tier(50.0, 30), tier(25.0, 15)];

const EXPECTED_USERS_TIERS: &[Tier] = &[tier(100.0, 35), tier(50.0, 20), tier(25.0, 10)];

const TIMELINE_TIERS: &[Tier] = &[tier(50.0, 35), tier(25.0, 20)];

/// One dimension that moved enough to earn points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftFactor {
    pub dimension: Dimension,
    pub at_decision: i32,
    pub current: i32,
    pub change_pct: f64,
    pub points: u32,
}

impl DriftFactor {
    pub fn describe(&self) -> String {
        format!("{} changed by {:.1}%", self.dimension.label(), self.change_pct)
    }
}

/// Outcome of comparing a snapshot against the current context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftReport {
    pub drift_score: u32,
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub factors: Vec<DriftFactor>,
}

/// Relative change from `then` to `now`, in percent of `then`.
///
/// A zero or negative baseline is treated as 1.
pub fn relative_change_pct(then: i32, now: i32) -> f64 {
    let delta = (i64::from(now) - i64::from(then)).abs();
    let base = i64::from(then).max(1);
    (delta as f64 * 100.0) / base as f64
}

/// Points a dimension earns for a given percentage change
fn points_for(dimension: Dimension, change_pct: f64) -> u32 {
    dimension
        .tiers()
        .iter()
        .find(|tier| change_pct > tier.above_pct)
        .map(|tier| tier.points)
        .unwrap_or(0)
}

/// Map a drift score onto a risk tier
pub fn risk_for_score(score: u32) -> RiskLevel {
    if score <= LOW_RISK_MAX {
        RiskLevel::Low
    } else if score <= MEDIUM_RISK_MAX {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

/// Score the drift between a decision's snapshot and the current context
pub fn evaluate(snapshot: &DecisionContextSnapshot, current: &ProjectContext) -> DriftReport {
    let dimensions = [
        (Dimension::TeamSize, snapshot.team_size_at_decision, current.team_size),
        (
            Dimension::ExpectedUsers,
            snapshot.expected_users_at_decision,
            current.expected_users,
        ),
        (Dimension::Timeline, snapshot.timeline_at_decision, current.timeline_months),
    ];

    let factors: Vec<DriftFactor> = dimensions
        .into_iter()
        .filter_map(|(dimension, at_decision, now)| {
            let change_pct = relative_change_pct(at_decision, now);
            let points = points_for(dimension, change_pct);
            (points > 0).then_some(DriftFactor {
                dimension,
                at_decision,
                current: now,
                change_pct,
                points,
            })
        })
        .collect();

    let drift_score = factors
        .iter()
        .map(|f| f.points)
        .sum::<u32>()
        .min(MAX_DRIFT_SCORE);
    let risk_level = risk_for_score(drift_score);

    let explanation = if factors.is_empty() {
        format!("No significant drift detected. Score: {}/{}.", drift_score, MAX_DRIFT_SCORE)
    } else {
        let reasons: Vec<String> = factors.iter().map(DriftFactor::describe).collect();
        format!(
            "Drift detected due to: {}. Score: {}/{}.",
            reasons.join(", "),
            drift_score,
            MAX_DRIFT_SCORE
        )
    };

    DriftReport {
        drift_score,
        risk_level,
        explanation,
        factors,
    }
}
