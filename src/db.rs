//! SQLite database with Diesel ORM
//!
//! Stores decisions, the project context singleton, context snapshots and
//! drift evaluations. Tables are created on open.
//!
//! Reads and writes go through [`Database::read`] and [`Database::write`].
//! `write` runs inside `BEGIN IMMEDIATE`, so a read-then-append sequence
//! (load the latest snapshot, append an evaluation) cannot interleave with
//! another writer.

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::model::{
    ConfidenceLevel, Decision, DecisionContextSnapshot, DecisionEvaluation, DecisionType, Page,
    ProjectContext, RiskLevel,
};
use crate::schema::*;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Walk up directory tree to find .decisio folder (like git finds .git)
/// Can be overridden with DECISIO_DB_PATH env var
fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("DECISIO_DB_PATH") {
        return PathBuf::from(path);
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let mut dir = current_dir.as_path();
        loop {
            let decisio_dir = dir.join(".decisio");
            if decisio_dir.is_dir() {
                return decisio_dir.join("decisio.db");
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
    }

    PathBuf::from(".decisio/decisio.db")
}

/// Current schema version for decisio
pub const CURRENT_SCHEMA: StoreSchema = StoreSchema {
    major: 1,
    minor: 0,
    patch: 0,
    name: "decision-drift",
    features: &[
        "decisions",
        "project_context",
        "decision_context_snapshots",
        "decision_evaluations",
    ],
};

/// Describes the version and capabilities of the schema
#[derive(Debug, Clone)]
pub struct StoreSchema {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub name: &'static str,
    pub features: &'static [&'static str],
}

impl StoreSchema {
    pub fn version_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl std::fmt::Display for StoreSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{} ({})", self.version_string(), self.name)
    }
}

// ============================================================================
// Diesel Models
// ============================================================================

#[derive(Insertable)]
#[diesel(table_name = schema_versions)]
struct NewSchemaVersion<'a> {
    version: &'a str,
    name: &'a str,
    features: &'a str,
    introduced_at: &'a str,
}

/// Queryable schema version
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = schema_versions)]
pub struct StoredSchema {
    pub id: i32,
    pub version: String,
    pub name: String,
    pub features: String,
    pub introduced_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = decisions)]
struct NewDecisionRow<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    decision_type: &'a str,
    confidence_level: &'a str,
    created_at: &'a str,
    updated_at: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = decisions)]
struct DecisionRow {
    #[allow(dead_code)]
    seq: i32,
    id: String,
    title: String,
    description: String,
    decision_type: String,
    confidence_level: String,
    created_at: String,
    updated_at: String,
}

#[derive(Insertable, Queryable, Selectable, Debug)]
#[diesel(table_name = project_context)]
struct ProjectContextRow {
    #[allow(dead_code)]
    slot: i32,
    id: String,
    team_size: i32,
    expected_users: i32,
    timeline_months: i32,
    constraints: Option<String>,
    updated_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = decision_context_snapshots)]
struct NewSnapshotRow<'a> {
    id: &'a str,
    decision_id: &'a str,
    team_size_at_decision: i32,
    expected_users_at_decision: i32,
    timeline_at_decision: i32,
    assumptions: Option<&'a str>,
    created_at: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = decision_context_snapshots)]
struct SnapshotRow {
    #[allow(dead_code)]
    seq: i32,
    id: String,
    decision_id: String,
    team_size_at_decision: i32,
    expected_users_at_decision: i32,
    timeline_at_decision: i32,
    assumptions: Option<String>,
    created_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = decision_evaluations)]
struct NewEvaluationRow<'a> {
    id: &'a str,
    decision_id: &'a str,
    drift_score: i32,
    risk_level: &'a str,
    explanation: &'a str,
    evaluated_at: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = decision_evaluations)]
struct EvaluationRow {
    #[allow(dead_code)]
    seq: i32,
    id: String,
    decision_id: String,
    drift_score: i32,
    risk_level: String,
    explanation: String,
    evaluated_at: String,
}

/// Stored enum text that no longer parses is a corrupt row, not a bad request
fn parse_stored<T>(column: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse::<T>().map_err(|e| {
        Error::Query(diesel::result::Error::DeserializationError(
            format!("{}: {}", column, e).into(),
        ))
    })
}

impl TryFrom<DecisionRow> for Decision {
    type Error = Error;

    fn try_from(row: DecisionRow) -> Result<Self> {
        Ok(Decision {
            decision_type: parse_stored::<DecisionType>("decision_type", &row.decision_type)?,
            confidence_level: parse_stored::<ConfidenceLevel>(
                "confidence_level",
                &row.confidence_level,
            )?,
            id: row.id,
            title: row.title,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<ProjectContextRow> for ProjectContext {
    fn from(row: ProjectContextRow) -> Self {
        ProjectContext {
            id: row.id,
            team_size: row.team_size,
            expected_users: row.expected_users,
            timeline_months: row.timeline_months,
            constraints: row.constraints,
            updated_at: row.updated_at,
        }
    }
}

impl From<SnapshotRow> for DecisionContextSnapshot {
    fn from(row: SnapshotRow) -> Self {
        DecisionContextSnapshot {
            id: row.id,
            decision_id: row.decision_id,
            team_size_at_decision: row.team_size_at_decision,
            expected_users_at_decision: row.expected_users_at_decision,
            timeline_at_decision: row.timeline_at_decision,
            assumptions: row.assumptions,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<EvaluationRow> for DecisionEvaluation {
    type Error = Error;

    fn try_from(row: EvaluationRow) -> Result<Self> {
        Ok(DecisionEvaluation {
            risk_level: parse_stored::<RiskLevel>("risk_level", &row.risk_level)?,
            id: row.id,
            decision_id: row.decision_id,
            drift_score: row.drift_score,
            explanation: row.explanation,
            evaluated_at: row.evaluated_at,
        })
    }
}

// ============================================================================
// Database Connection
// ============================================================================

type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Fixed key of the project context row
const PROJECT_CONTEXT_SLOT: i32 = 1;

/// Per-connection pragmas applied whenever the pool hands out a connection
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout_ms: u64,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout_ms
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Database connection wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    path: PathBuf,
}

/// Row counts, for `decisio status`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DbSummary {
    pub decisions: i64,
    pub snapshots: i64,
    pub evaluations: i64,
    pub has_project_context: bool,
}

impl Database {
    /// Open database at specified path with default pool settings
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = DatabaseConfig {
            path: Some(path.as_ref().to_path_buf()),
            ..DatabaseConfig::default()
        };
        Self::open_with(&config)
    }

    /// Open database using storage configuration
    pub fn open_with(config: &DatabaseConfig) -> Result<Self> {
        let path = config.path.clone().unwrap_or_else(get_db_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = ConnectionManager::<SqliteConnection>::new(path.to_string_lossy());
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_timeout(Duration::from_millis(config.busy_timeout_ms.max(1)))
            .connection_customizer(Box::new(ConnectionOptions {
                busy_timeout_ms: config.busy_timeout_ms,
            }))
            .build(manager)
            .map_err(|e| Error::Connection(e.to_string()))?;

        let db = Self { pool, path };
        db.init_schema()?;
        tracing::debug!(path = %db.path.display(), "database ready");
        Ok(db)
    }

    /// File backing this database
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn get_conn(&self) -> Result<DbConn> {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }

    /// Run read-only work on a pooled connection
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T>,
    {
        let mut conn = self.get_conn()?;
        f(&mut conn)
    }

    /// Run work inside an immediate transaction. Rolled back if `f` fails.
    pub fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T>,
    {
        let mut conn = self.get_conn()?;
        conn.immediate_transaction(f)
    }

    fn init_schema(&self) -> Result<()> {
        let mut conn = self.get_conn()?;

        conn.batch_execute("PRAGMA journal_mode = WAL;")?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS schema_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                version TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                features TEXT NOT NULL,
                introduced_at TEXT NOT NULL
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS decisions (
                seq INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                decision_type TEXT NOT NULL
                    CHECK (decision_type IN ('architecture', 'technology', 'process')),
                confidence_level TEXT NOT NULL
                    CHECK (confidence_level IN ('low', 'medium', 'high')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS project_context (
                slot INTEGER PRIMARY KEY NOT NULL CHECK (slot = 1),
                id TEXT NOT NULL,
                team_size INTEGER NOT NULL CHECK (team_size > 0),
                expected_users INTEGER NOT NULL CHECK (expected_users > 0),
                timeline_months INTEGER NOT NULL CHECK (timeline_months > 0),
                constraints TEXT,
                updated_at TEXT NOT NULL
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS decision_context_snapshots (
                seq INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                id TEXT NOT NULL UNIQUE,
                decision_id TEXT NOT NULL,
                team_size_at_decision INTEGER NOT NULL CHECK (team_size_at_decision > 0),
                expected_users_at_decision INTEGER NOT NULL CHECK (expected_users_at_decision > 0),
                timeline_at_decision INTEGER NOT NULL CHECK (timeline_at_decision > 0),
                assumptions TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (decision_id) REFERENCES decisions(id)
            )
        "#).execute(&mut conn)?;

        diesel::sql_query(r#"
            CREATE TABLE IF NOT EXISTS decision_evaluations (
                seq INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                id TEXT NOT NULL UNIQUE,
                decision_id TEXT NOT NULL,
                drift_score INTEGER NOT NULL CHECK (drift_score BETWEEN 0 AND 100),
                risk_level TEXT NOT NULL CHECK (risk_level IN ('low', 'medium', 'high')),
                explanation TEXT NOT NULL,
                evaluated_at TEXT NOT NULL,
                FOREIGN KEY (decision_id) REFERENCES decisions(id)
            )
        "#).execute(&mut conn)?;

        // Create indexes
        diesel::sql_query(
            "CREATE INDEX IF NOT EXISTS idx_decisions_created ON decisions(created_at)",
        )
        .execute(&mut conn)?;
        diesel::sql_query(
            "CREATE INDEX IF NOT EXISTS idx_snapshots_decision_created \
             ON decision_context_snapshots(decision_id, created_at)",
        )
        .execute(&mut conn)?;
        diesel::sql_query(
            "CREATE INDEX IF NOT EXISTS idx_evaluations_decision_evaluated \
             ON decision_evaluations(decision_id, evaluated_at)",
        )
        .execute(&mut conn)?;

        register_schema(&mut conn, &CURRENT_SCHEMA)?;
        Ok(())
    }

    /// Schema versions this database has seen, oldest first
    pub fn schema_versions(&self) -> Result<Vec<StoredSchema>> {
        self.read(|conn| {
            Ok(schema_versions::table
                .order(schema_versions::id.asc())
                .select(StoredSchema::as_select())
                .load::<StoredSchema>(conn)?)
        })
    }

    /// Row counts across all tables
    pub fn summary(&self) -> Result<DbSummary> {
        self.read(|conn| {
            Ok(DbSummary {
                decisions: decisions::table.count().get_result(conn)?,
                snapshots: decision_context_snapshots::table.count().get_result(conn)?,
                evaluations: decision_evaluations::table.count().get_result(conn)?,
                has_project_context: find_project_context(conn)?.is_some(),
            })
        })
    }
}

fn register_schema(conn: &mut SqliteConnection, schema: &StoreSchema) -> Result<()> {
    let now = crate::model::now_timestamp();
    let features_json = serde_json::to_string(&schema.features)?;

    let new_schema = NewSchemaVersion {
        version: &schema.version_string(),
        name: schema.name,
        features: &features_json,
        introduced_at: &now,
    };

    diesel::insert_or_ignore_into(schema_versions::table)
        .values(&new_schema)
        .execute(conn)?;

    Ok(())
}

// ============================================================================
// Decision Operations
// ============================================================================

/// Insert a fully-formed decision
pub fn insert_decision(conn: &mut SqliteConnection, decision: &Decision) -> Result<()> {
    let row = NewDecisionRow {
        id: &decision.id,
        title: &decision.title,
        description: &decision.description,
        decision_type: decision.decision_type.as_str(),
        confidence_level: decision.confidence_level.as_str(),
        created_at: &decision.created_at,
        updated_at: &decision.updated_at,
    };

    diesel::insert_into(decisions::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}

/// Look up a decision by id
pub fn find_decision(conn: &mut SqliteConnection, id: &str) -> Result<Option<Decision>> {
    decisions::table
        .filter(decisions::id.eq(id))
        .select(DecisionRow::as_select())
        .first::<DecisionRow>(conn)
        .optional()?
        .map(Decision::try_from)
        .transpose()
}

/// Decisions in creation order
pub fn list_decisions(conn: &mut SqliteConnection, page: Page) -> Result<Vec<Decision>> {
    let page = page.normalized();
    decisions::table
        .order((decisions::created_at.asc(), decisions::seq.asc()))
        .offset(page.skip)
        .limit(page.limit)
        .select(DecisionRow::as_select())
        .load::<DecisionRow>(conn)?
        .into_iter()
        .map(Decision::try_from)
        .collect()
}

// ============================================================================
// Project Context Operations
// ============================================================================

/// The current project context, if one has been set
pub fn find_project_context(conn: &mut SqliteConnection) -> Result<Option<ProjectContext>> {
    Ok(project_context::table
        .filter(project_context::slot.eq(PROJECT_CONTEXT_SLOT))
        .select(ProjectContextRow::as_select())
        .first::<ProjectContextRow>(conn)
        .optional()?
        .map(ProjectContext::from))
}

/// Create or overwrite the project context row
pub fn save_project_context(conn: &mut SqliteConnection, context: &ProjectContext) -> Result<()> {
    let row = ProjectContextRow {
        slot: PROJECT_CONTEXT_SLOT,
        id: context.id.clone(),
        team_size: context.team_size,
        expected_users: context.expected_users,
        timeline_months: context.timeline_months,
        constraints: context.constraints.clone(),
        updated_at: context.updated_at.clone(),
    };

    diesel::replace_into(project_context::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}

// ============================================================================
// Snapshot Operations
// ============================================================================

pub fn insert_snapshot(
    conn: &mut SqliteConnection,
    snapshot: &DecisionContextSnapshot,
) -> Result<()> {
    let row = NewSnapshotRow {
        id: &snapshot.id,
        decision_id: &snapshot.decision_id,
        team_size_at_decision: snapshot.team_size_at_decision,
        expected_users_at_decision: snapshot.expected_users_at_decision,
        timeline_at_decision: snapshot.timeline_at_decision,
        assumptions: snapshot.assumptions.as_deref(),
        created_at: &snapshot.created_at,
    };

    diesel::insert_into(decision_context_snapshots::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}

/// Snapshots for a decision, newest first
pub fn list_snapshots(
    conn: &mut SqliteConnection,
    decision_id: &str,
) -> Result<Vec<DecisionContextSnapshot>> {
    Ok(decision_context_snapshots::table
        .filter(decision_context_snapshots::decision_id.eq(decision_id))
        .order((
            decision_context_snapshots::created_at.desc(),
            decision_context_snapshots::seq.desc(),
        ))
        .select(SnapshotRow::as_select())
        .load::<SnapshotRow>(conn)?
        .into_iter()
        .map(DecisionContextSnapshot::from)
        .collect())
}

/// Most recently created snapshot for a decision
pub fn latest_snapshot(
    conn: &mut SqliteConnection,
    decision_id: &str,
) -> Result<Option<DecisionContextSnapshot>> {
    Ok(decision_context_snapshots::table
        .filter(decision_context_snapshots::decision_id.eq(decision_id))
        .order((
            decision_context_snapshots::created_at.desc(),
            decision_context_snapshots::seq.desc(),
        ))
        .select(SnapshotRow::as_select())
        .first::<SnapshotRow>(conn)
        .optional()?
        .map(DecisionContextSnapshot::from))
}

// ============================================================================
// Evaluation Operations
// ============================================================================

pub fn insert_evaluation(
    conn: &mut SqliteConnection,
    evaluation: &DecisionEvaluation,
) -> Result<()> {
    let row = NewEvaluationRow {
        id: &evaluation.id,
        decision_id: &evaluation.decision_id,
        drift_score: evaluation.drift_score,
        risk_level: evaluation.risk_level.as_str(),
        explanation: &evaluation.explanation,
        evaluated_at: &evaluation.evaluated_at,
    };

    diesel::insert_into(decision_evaluations::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}

/// Evaluations for a decision, newest first
pub fn list_evaluations(
    conn: &mut SqliteConnection,
    decision_id: &str,
) -> Result<Vec<DecisionEvaluation>> {
    decision_evaluations::table
        .filter(decision_evaluations::decision_id.eq(decision_id))
        .order((
            decision_evaluations::evaluated_at.desc(),
            decision_evaluations::seq.desc(),
        ))
        .select(EvaluationRow::as_select())
        .load::<EvaluationRow>(conn)?
        .into_iter()
        .map(DecisionEvaluation::try_from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{new_id, now_timestamp};
    use tempfile::TempDir;

    fn temp_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open_at(dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn decision(title: &str) -> Decision {
        let now = now_timestamp();
        Decision {
            id: new_id(),
            title: title.to_string(),
            description: "why".to_string(),
            decision_type: DecisionType::Architecture,
            confidence_level: ConfidenceLevel::High,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn snapshot(decision_id: &str, team: i32) -> DecisionContextSnapshot {
        DecisionContextSnapshot {
            id: new_id(),
            decision_id: decision_id.to_string(),
            team_size_at_decision: team,
            expected_users_at_decision: 100,
            timeline_at_decision: 6,
            assumptions: None,
            created_at: now_timestamp(),
        }
    }

    #[test]
    fn test_schema_registered_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        Database::open_at(&path).unwrap();
        let db = Database::open_at(&path).unwrap();

        let versions = db.schema_versions().unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, CURRENT_SCHEMA.version_string());
        assert_eq!(versions[0].name, "decision-drift");
    }

    #[test]
    fn test_schema_display() {
        assert_eq!(CURRENT_SCHEMA.to_string(), "v1.0.0 (decision-drift)");
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(".decisio").join("decisio.db");
        let db = Database::open_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path.as_path());
    }

    #[test]
    fn test_decision_round_trip() {
        let (_dir, db) = temp_db();
        let d = decision("Use Postgres");
        db.write(|conn| insert_decision(conn, &d)).unwrap();

        let loaded = db.read(|conn| find_decision(conn, &d.id)).unwrap();
        assert_eq!(loaded, Some(d));
        assert_eq!(db.read(|conn| find_decision(conn, "missing")).unwrap(), None);
    }

    #[test]
    fn test_decisions_listed_in_creation_order_with_paging() {
        let (_dir, db) = temp_db();
        for title in ["first", "second", "third"] {
            let d = decision(title);
            db.write(|conn| insert_decision(conn, &d)).unwrap();
        }

        let all = db.read(|conn| list_decisions(conn, Page::default())).unwrap();
        let titles: Vec<&str> = all.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);

        let page = db
            .read(|conn| list_decisions(conn, Page { skip: 1, limit: 1 }))
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "second");
    }

    #[test]
    fn test_project_context_is_singleton() {
        let (_dir, db) = temp_db();
        assert_eq!(db.read(find_project_context).unwrap(), None);

        let mut ctx = ProjectContext {
            id: new_id(),
            team_size: 5,
            expected_users: 1000,
            timeline_months: 6,
            constraints: Some("budget".to_string()),
            updated_at: now_timestamp(),
        };
        db.write(|conn| save_project_context(conn, &ctx)).unwrap();
        ctx.team_size = 8;
        db.write(|conn| save_project_context(conn, &ctx)).unwrap();

        let loaded = db.read(find_project_context).unwrap().unwrap();
        assert_eq!(loaded, ctx);
        assert!(db.summary().unwrap().has_project_context);
    }

    #[test]
    fn test_latest_snapshot_breaks_timestamp_ties_by_insertion() {
        let (_dir, db) = temp_db();
        let d = decision("Adopt gRPC");
        db.write(|conn| insert_decision(conn, &d)).unwrap();

        let mut older = snapshot(&d.id, 2);
        let mut newer = snapshot(&d.id, 3);
        newer.created_at = older.created_at.clone();
        older.assumptions = Some("older".to_string());
        db.write(|conn| insert_snapshot(conn, &older)).unwrap();
        db.write(|conn| insert_snapshot(conn, &newer)).unwrap();

        let latest = db.read(|conn| latest_snapshot(conn, &d.id)).unwrap().unwrap();
        assert_eq!(latest.id, newer.id);

        let listed = db.read(|conn| list_snapshots(conn, &d.id)).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }

    #[test]
    fn test_snapshot_requires_existing_decision() {
        let (_dir, db) = temp_db();
        let orphan = snapshot("no-such-decision", 2);
        let result = db.write(|conn| insert_snapshot(conn, &orphan));
        assert!(matches!(result, Err(Error::Query(_))));
    }

    #[test]
    fn test_evaluations_newest_first() {
        let (_dir, db) = temp_db();
        let d = decision("Monorepo");
        db.write(|conn| insert_decision(conn, &d)).unwrap();

        let mut ids = Vec::new();
        for score in [10, 50, 90] {
            let evaluation = DecisionEvaluation {
                id: new_id(),
                decision_id: d.id.clone(),
                drift_score: score,
                risk_level: crate::drift::risk_for_score(score as u32),
                explanation: format!("Score: {}/100.", score),
                evaluated_at: now_timestamp(),
            };
            ids.push(evaluation.id.clone());
            db.write(|conn| insert_evaluation(conn, &evaluation)).unwrap();
        }

        let listed = db.read(|conn| list_evaluations(conn, &d.id)).unwrap();
        let listed_ids: Vec<String> = listed.iter().map(|e| e.id.clone()).collect();
        ids.reverse();
        assert_eq!(listed_ids, ids);
        assert_eq!(listed[0].risk_level, RiskLevel::High);
        assert_eq!(db.summary().unwrap().evaluations, 3);
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let (_dir, db) = temp_db();
        let d = decision("Rolled back");
        let result: Result<()> = db.write(|conn| {
            insert_decision(conn, &d)?;
            Err(Error::Validation("abort".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(db.summary().unwrap().decisions, 0);
    }
}
