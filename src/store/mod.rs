//! Session store
//!
//! SQLite persistence for users, practice templates, pitching sessions,
//! feedback and notification preferences. Referential integrity is enforced
//! with foreign keys; multi-row writes run inside a single transaction.

mod feedback;
mod models;
mod preferences;
mod sessions;
mod templates;
mod users;

pub use feedback::FeedbackRecord;
pub use models::{
    AdminStats, Difficulty, FeedbackId, FeedbackRow, IdentityProfile, Page, PitchingSession,
    PracticeTemplate, Role, SessionId, SessionStatus, SessionSummary, StoredNotificationPreference,
    TemplateDraft, TemplateFilter, TemplateId, TemplateRow, User, UserId,
};
pub use sessions::{
    complete_session_in, credit_balance, deduct_credit, increment_template_usage, insert_session,
};

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// How long a writer waits for a competing write transaction to finish.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the practice database. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if needed) the SQLite database at `path` and make sure
    /// all tables exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }

        debug!("Connecting to database: {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .context("Failed to open database")?;

        let store = Self { pool };
        store.init_tables().await?;

        info!("Database ready at {}", path.display());

        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_tables(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to initialize schema")?;
        }

        Ok(())
    }
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        external_id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        image_url TEXT NOT NULL DEFAULT '',
        credit INTEGER NOT NULL DEFAULT 5 CHECK (credit >= 0),
        role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS practice_templates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        questions TEXT NOT NULL,
        difficulty TEXT NOT NULL CHECK (difficulty IN ('Beginner', 'Intermediate', 'Advanced')),
        duration_minutes INTEGER NOT NULL,
        industry TEXT NOT NULL,
        target_market TEXT NOT NULL,
        target_market_code TEXT NOT NULL,
        image_url TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        usage_count INTEGER NOT NULL DEFAULT 0 CHECK (usage_count >= 0),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pitching_sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        template_id INTEGER NOT NULL REFERENCES practice_templates(id),
        status TEXT NOT NULL CHECK (status IN ('in_progress', 'completed')),
        created_at TEXT NOT NULL,
        completed_at TEXT,
        CHECK ((status = 'completed') = (completed_at IS NOT NULL))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON pitching_sessions(user_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS pitch_feedback (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id INTEGER NOT NULL REFERENCES pitching_sessions(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        total_score REAL NOT NULL,
        category_scores TEXT NOT NULL,
        strengths TEXT NOT NULL,
        areas_for_improvement TEXT NOT NULL,
        final_assessment TEXT NOT NULL,
        transcript TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_feedback_session ON pitch_feedback(session_id)",
    r#"
    CREATE TABLE IF NOT EXISTS notification_preferences (
        user_id INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
        email_notifications INTEGER NOT NULL DEFAULT 1,
        feedback_alerts INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
];
