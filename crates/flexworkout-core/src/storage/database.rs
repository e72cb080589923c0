//! SQLite-based plan storage.
//!
//! Provides persistent storage for:
//! - Named saved plans
//! - The active plan record (which plan is loaded, and where it came from)
//! - A key-value store for application state

use std::path::Path;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::error::{CoreError, DatabaseError};
use crate::plan::Plan;

const ACTIVE_PLAN_KEY: &str = "active_plan";

/// A plan the user saved under a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlan {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub data: Plan,
}

/// The currently loaded plan, and the saved plan it came from if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivePlanRecord {
    pub plan: Plan,
    #[serde(default)]
    pub id: Option<String>,
}

/// Persistence for saved plans and the active plan record.
///
/// Reads never fail on bad stored data: an unreadable record is treated as
/// absent, and a dangling active-plan id resolves to `None`.
pub trait PlanStore {
    fn load_active_plan(&self) -> Result<Option<ActivePlanRecord>, DatabaseError>;

    fn save_active_plan(&self, plan: &Plan, id: Option<&str>) -> Result<(), DatabaseError>;

    fn clear_active_plan(&self) -> Result<(), DatabaseError>;

    /// Newest first.
    fn list_saved_plans(&self) -> Result<Vec<SavedPlan>, DatabaseError>;

    fn get_saved_plan(&self, id: &str) -> Result<Option<SavedPlan>, DatabaseError>;

    /// Store `plan` under a fresh id. A blank title becomes
    /// `Untitled plan YYYY-MM-DD`.
    fn save_plan(&self, title: &str, plan: &Plan) -> Result<SavedPlan, DatabaseError>;

    /// Deleting an id that is not stored is a no-op.
    fn delete_plan(&self, id: &str) -> Result<(), DatabaseError>;
}

/// SQLite database for plan storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/flexworkout.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("flexworkout.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS saved_plans (
                    id          TEXT PRIMARY KEY,
                    title       TEXT NOT NULL,
                    created_at  TEXT NOT NULL,
                    data        TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_saved_plans_created_at ON saved_plans(created_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn saved_plan_exists(&self, id: &str) -> Result<bool, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT 1 FROM saved_plans WHERE id = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()
            .map(|row| row.is_some())
    }
}

/// Decode one `saved_plans` row, `None` if its timestamp or plan JSON is
/// unreadable.
fn decode_saved_plan(id: String, title: String, created_at: &str, data: &str) -> Option<SavedPlan> {
    let created_at = DateTime::parse_from_rfc3339(created_at)
        .ok()?
        .with_timezone(&Utc);
    match serde_json::from_str(data) {
        Ok(data) => Some(SavedPlan {
            id,
            title,
            created_at,
            data,
        }),
        Err(e) => {
            tracing::warn!(%id, error = %e, "skipping unreadable saved plan");
            None
        }
    }
}

fn untitled(now: DateTime<Utc>) -> String {
    format!("Untitled plan {}", now.format("%Y-%m-%d"))
}

impl PlanStore for Database {
    fn load_active_plan(&self) -> Result<Option<ActivePlanRecord>, DatabaseError> {
        let Some(raw) = self.kv_get(ACTIVE_PLAN_KEY)? else {
            return Ok(None);
        };
        let mut record: ActivePlanRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable active plan record");
                return Ok(None);
            }
        };
        if let Some(id) = record.id.as_deref() {
            if !self.saved_plan_exists(id)? {
                tracing::debug!(id, "active plan points at a deleted saved plan");
                record.id = None;
            }
        }
        Ok(Some(record))
    }

    fn save_active_plan(&self, plan: &Plan, id: Option<&str>) -> Result<(), DatabaseError> {
        let record = ActivePlanRecord {
            plan: plan.clone(),
            id: id.map(str::to_string),
        };
        let raw = serde_json::to_string(&record)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.kv_set(ACTIVE_PLAN_KEY, &raw)?;
        Ok(())
    }

    fn clear_active_plan(&self) -> Result<(), DatabaseError> {
        self.kv_delete(ACTIVE_PLAN_KEY)?;
        Ok(())
    }

    fn list_saved_plans(&self) -> Result<Vec<SavedPlan>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, created_at, data
             FROM saved_plans
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut plans = Vec::new();
        for row in rows {
            let (id, title, created_at, data) = row?;
            plans.extend(decode_saved_plan(id, title, &created_at, &data));
        }
        Ok(plans)
    }

    fn get_saved_plan(&self, id: &str) -> Result<Option<SavedPlan>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, created_at, data FROM saved_plans WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        Ok(row.and_then(|(id, title, created_at, data)| {
            decode_saved_plan(id, title, &created_at, &data)
        }))
    }

    fn save_plan(&self, title: &str, plan: &Plan) -> Result<SavedPlan, DatabaseError> {
        // Stored at microsecond precision.
        let now = Utc::now().trunc_subsecs(6);
        let title = match title.trim() {
            "" => untitled(now),
            t => t.to_string(),
        };
        let saved = SavedPlan {
            id: Uuid::new_v4().to_string(),
            title,
            created_at: now,
            data: plan.clone(),
        };
        let data = serde_json::to_string(&saved.data)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO saved_plans (id, title, created_at, data) VALUES (?1, ?2, ?3, ?4)",
            params![
                saved.id,
                saved.title,
                now.to_rfc3339_opts(SecondsFormat::Micros, true),
                data,
            ],
        )?;
        tracing::debug!(id = %saved.id, title = %saved.title, "plan saved");
        Ok(saved)
    }

    fn delete_plan(&self, id: &str) -> Result<(), DatabaseError> {
        let removed = self
            .conn
            .execute("DELETE FROM saved_plans WHERE id = ?1", params![id])?;
        if removed == 0 {
            tracing::debug!(id, "delete skipped: no such saved plan");
        } else {
            tracing::debug!(id, "plan deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::default_plan;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn blank_title_gets_dated_default() {
        let db = Database::open_memory().unwrap();
        let saved = db.save_plan("   ", &default_plan()).unwrap();
        assert!(saved.title.starts_with("Untitled plan "));
        assert_eq!(saved.title.len(), "Untitled plan 2024-01-01".len());
        assert_eq!(Uuid::parse_str(&saved.id).unwrap().get_version_num(), 4);
    }

    #[test]
    fn unreadable_active_record_is_absent() {
        let db = Database::open_memory().unwrap();
        db.kv_set(ACTIVE_PLAN_KEY, "{not json").unwrap();
        assert_eq!(db.load_active_plan().unwrap(), None);
    }

    #[test]
    fn corrupt_saved_plan_is_skipped() {
        let db = Database::open_memory().unwrap();
        let good = db.save_plan("Good", &default_plan()).unwrap();
        db.conn()
            .execute(
                "INSERT INTO saved_plans (id, title, created_at, data) VALUES ('bad', 'Bad', ?1, '[{')",
                params![Utc::now().to_rfc3339()],
            )
            .unwrap();
        let plans = db.list_saved_plans().unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, good.id);
        assert_eq!(db.get_saved_plan("bad").unwrap(), None);
    }
}
