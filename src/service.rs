//! Decision and project context services
//!
//! Validation and orchestration on top of [`Database`]. The HTTP API and the
//! CLI both go through these; neither touches the store directly.

use crate::db::{self, Database};
use crate::drift;
use crate::error::{Error, Result};
use crate::model::{
    new_id, now_timestamp, Decision, DecisionContextSnapshot, DecisionContextSnapshotCreate,
    DecisionCreate, DecisionEvaluation, Page, ProjectContext, ProjectContextUpdate, MAX_TITLE_LEN,
};

/// Decisions, their snapshots and their evaluations
#[derive(Clone)]
pub struct DecisionService {
    db: Database,
}

impl DecisionService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record a new decision
    pub fn create_decision(&self, input: DecisionCreate) -> Result<Decision> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(Error::Validation("Title must not be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(Error::Validation(format!(
                "Title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }
        if input.description.trim().is_empty() {
            return Err(Error::Validation("Description must not be empty".to_string()));
        }

        let now = now_timestamp();
        let decision = Decision {
            id: new_id(),
            title: title.to_string(),
            description: input.description,
            decision_type: input.decision_type,
            confidence_level: input.confidence_level,
            created_at: now.clone(),
            updated_at: now,
        };
        self.db.write(|conn| db::insert_decision(conn, &decision))?;

        tracing::info!(
            decision_id = %decision.id,
            decision_type = %decision.decision_type,
            "decision created"
        );
        Ok(decision)
    }

    pub fn get_decision(&self, id: &str) -> Result<Decision> {
        self.db
            .read(|conn| db::find_decision(conn, id))?
            .ok_or_else(|| Error::decision_not_found(id))
    }

    /// Decisions in creation order
    pub fn list_decisions(&self, page: Page) -> Result<Vec<Decision>> {
        self.db.read(|conn| db::list_decisions(conn, page))
    }

    /// Freeze a set of context values against a decision
    pub fn create_snapshot(
        &self,
        decision_id: &str,
        input: DecisionContextSnapshotCreate,
    ) -> Result<DecisionContextSnapshot> {
        require_positive("team_size_at_decision", input.team_size_at_decision)?;
        require_positive("expected_users_at_decision", input.expected_users_at_decision)?;
        require_positive("timeline_at_decision", input.timeline_at_decision)?;

        let snapshot = self.db.write(|conn| {
            if db::find_decision(conn, decision_id)?.is_none() {
                return Err(Error::decision_not_found(decision_id));
            }
            let snapshot = DecisionContextSnapshot {
                id: new_id(),
                decision_id: decision_id.to_string(),
                team_size_at_decision: input.team_size_at_decision,
                expected_users_at_decision: input.expected_users_at_decision,
                timeline_at_decision: input.timeline_at_decision,
                assumptions: non_blank(input.assumptions),
                created_at: now_timestamp(),
            };
            db::insert_snapshot(conn, &snapshot)?;
            Ok(snapshot)
        })?;

        tracing::info!(decision_id, snapshot_id = %snapshot.id, "snapshot created");
        Ok(snapshot)
    }

    /// Snapshot the current project context for a decision
    pub fn snapshot_from_context(
        &self,
        decision_id: &str,
        assumptions: Option<String>,
    ) -> Result<DecisionContextSnapshot> {
        let context = self
            .db
            .read(db::find_project_context)?
            .ok_or_else(missing_context)?;
        self.create_snapshot(
            decision_id,
            DecisionContextSnapshotCreate::from_context(&context, assumptions),
        )
    }

    /// Snapshots for a decision, newest first
    pub fn list_snapshots(&self, decision_id: &str) -> Result<Vec<DecisionContextSnapshot>> {
        self.db.read(|conn| {
            if db::find_decision(conn, decision_id)?.is_none() {
                return Err(Error::decision_not_found(decision_id));
            }
            db::list_snapshots(conn, decision_id)
        })
    }

    /// Score the decision's latest snapshot against the current context and
    /// append the result to its evaluation history.
    ///
    /// The reads and the append share one immediate transaction, so a
    /// concurrent snapshot or evaluation cannot slip in between.
    pub fn evaluate(&self, decision_id: &str) -> Result<DecisionEvaluation> {
        let (evaluation, factors) = self.db.write(|conn| {
            if db::find_decision(conn, decision_id)?.is_none() {
                return Err(Error::decision_not_found(decision_id));
            }
            let context = db::find_project_context(conn)?.ok_or_else(missing_context)?;
            let snapshot = db::latest_snapshot(conn, decision_id)?.ok_or_else(|| {
                Error::Precondition(format!(
                    "No context snapshot found for decision {}. Please create a snapshot first.",
                    decision_id
                ))
            })?;

            let report = drift::evaluate(&snapshot, &context);
            let evaluation = DecisionEvaluation {
                id: new_id(),
                decision_id: decision_id.to_string(),
                drift_score: report.drift_score as i32,
                risk_level: report.risk_level,
                explanation: report.explanation,
                evaluated_at: now_timestamp(),
            };
            db::insert_evaluation(conn, &evaluation)?;
            Ok((evaluation, report.factors.len()))
        })?;

        tracing::info!(
            decision_id,
            drift_score = evaluation.drift_score,
            risk_level = %evaluation.risk_level,
            factors,
            "decision evaluated"
        );
        Ok(evaluation)
    }

    /// Evaluation history for a decision, newest first
    pub fn list_evaluations(&self, decision_id: &str) -> Result<Vec<DecisionEvaluation>> {
        self.db.read(|conn| db::list_evaluations(conn, decision_id))
    }
}

/// The project context singleton
#[derive(Clone)]
pub struct ProjectContextService {
    db: Database,
}

impl ProjectContextService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn get(&self) -> Result<ProjectContext> {
        self.db
            .read(db::find_project_context)?
            .ok_or_else(|| Error::NotFound("No project context found".to_string()))
    }

    /// Create the context, or merge the provided fields into it.
    ///
    /// Creation needs all three numeric fields. Every call refreshes
    /// `updated_at`; last writer wins.
    pub fn update(&self, update: ProjectContextUpdate) -> Result<ProjectContext> {
        if let Some(v) = update.team_size {
            require_positive("team_size", v)?;
        }
        if let Some(v) = update.expected_users {
            require_positive("expected_users", v)?;
        }
        if let Some(v) = update.timeline_months {
            require_positive("timeline_months", v)?;
        }

        let context = self.db.write(|conn| {
            let context = match db::find_project_context(conn)? {
                Some(existing) => merge_context(existing, update),
                None => create_context(update)?,
            };
            db::save_project_context(conn, &context)?;
            Ok(context)
        })?;

        tracing::info!(
            team_size = context.team_size,
            expected_users = context.expected_users,
            timeline_months = context.timeline_months,
            "project context updated"
        );
        Ok(context)
    }
}

fn create_context(update: ProjectContextUpdate) -> Result<ProjectContext> {
    match (update.team_size, update.expected_users, update.timeline_months) {
        (Some(team_size), Some(expected_users), Some(timeline_months)) => Ok(ProjectContext {
            id: new_id(),
            team_size,
            expected_users,
            timeline_months,
            constraints: update.constraints.flatten(),
            updated_at: now_timestamp(),
        }),
        _ => Err(Error::Validation(
            "First context creation requires team_size, expected_users, and timeline_months"
                .to_string(),
        )),
    }
}

fn merge_context(existing: ProjectContext, update: ProjectContextUpdate) -> ProjectContext {
    ProjectContext {
        id: existing.id,
        team_size: update.team_size.unwrap_or(existing.team_size),
        expected_users: update.expected_users.unwrap_or(existing.expected_users),
        timeline_months: update.timeline_months.unwrap_or(existing.timeline_months),
        constraints: match update.constraints {
            Some(value) => value,
            None => existing.constraints,
        },
        updated_at: now_timestamp(),
    }
}

fn missing_context() -> Error {
    Error::Precondition("No project context found. Please set project context first.".to_string())
}

fn require_positive(field: &str, value: i32) -> Result<()> {
    if value <= 0 {
        return Err(Error::Validation(format!(
            "{} must be greater than 0",
            field
        )));
    }
    Ok(())
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
