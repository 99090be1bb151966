// src/core/saved_jobs.rs
//! The user/job bookmark relation

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::info;

use crate::core::jobs::JOB_COLUMNS;
use crate::error::{JobBoardError, Result};
use crate::types::{
    CompanyBrief, Job, JobId, JobWithCompany, SaveState, SavedJob, SavedJobEntry,
};

#[derive(Debug, sqlx::FromRow)]
struct SavedJobRow {
    saved_id: i64,
    saved_user_id: String,
    saved_job_id: JobId,
    saved_created_at: chrono::DateTime<Utc>,
    #[sqlx(flatten)]
    job: Job,
    company_name: String,
    company_logo_url: String,
}

impl From<SavedJobRow> for SavedJobEntry {
    fn from(row: SavedJobRow) -> Self {
        Self {
            saved: SavedJob {
                id: row.saved_id,
                user_id: row.saved_user_id,
                job_id: row.saved_job_id,
                created_at: row.saved_created_at,
            },
            job: JobWithCompany {
                job: row.job,
                company: CompanyBrief {
                    name: row.company_name,
                    logo_url: row.company_logo_url,
                },
            },
        }
    }
}

pub(crate) async fn insert_saved<'e, E>(
    executor: E,
    user_id: &str,
    job_id: JobId,
) -> Result<Vec<SavedJob>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, SavedJob>(
        r#"
        INSERT INTO saved_jobs (user_id, job_id, created_at)
        VALUES (?, ?, ?)
        RETURNING id, user_id, job_id, created_at
        "#,
    )
    .bind(user_id)
    .bind(job_id)
    .bind(Utc::now())
    .fetch_all(executor)
    .await
    .map_err(JobBoardError::insert("saved_jobs"))
}

/// Removes every row for the pair, not just one
pub(crate) async fn delete_saved<'e, E>(
    executor: E,
    user_id: &str,
    job_id: JobId,
) -> Result<Vec<SavedJob>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, SavedJob>(
        r#"
        DELETE FROM saved_jobs
        WHERE job_id = ? AND user_id = ?
        RETURNING id, user_id, job_id, created_at
        "#,
    )
    .bind(job_id)
    .bind(user_id)
    .fetch_all(executor)
    .await
    .map_err(JobBoardError::delete("saved_jobs"))
}

pub(crate) async fn find_saved<'e, E>(
    executor: E,
    user_id: &str,
    job_id: JobId,
) -> Result<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT id FROM saved_jobs
        WHERE job_id = ? AND user_id = ?
        ORDER BY id ASC
        LIMIT 1
        "#,
    )
    .bind(job_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(JobBoardError::query("saved_jobs"))?;

    Ok(row.map(|(id,)| id))
}

/// Insert the pair if absent, otherwise delete every row for it.
/// Run inside a transaction so the read and the write see the same state.
pub(crate) async fn toggle_on(
    conn: &mut SqliteConnection,
    user_id: &str,
    job_id: JobId,
) -> Result<SaveState> {
    if find_saved(&mut *conn, user_id, job_id).await?.is_some() {
        let removed = delete_saved(&mut *conn, user_id, job_id).await?;
        return Ok(SaveState::Unsaved {
            removed: removed.len() as u64,
        });
    }

    let row = insert_saved(&mut *conn, user_id, job_id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| JobBoardError::NotFound {
            entity: "saved job",
            id: job_id.to_string(),
        })?;

    Ok(SaveState::Saved { row })
}

pub struct SavedJobRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SavedJobRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, user_id: &str, job_id: JobId) -> Result<Vec<SavedJob>> {
        let rows = insert_saved(self.pool, user_id, job_id).await?;
        info!("User {} saved job {}", user_id, job_id);
        Ok(rows)
    }

    pub async fn delete(&self, user_id: &str, job_id: JobId) -> Result<Vec<SavedJob>> {
        let rows = delete_saved(self.pool, user_id, job_id).await?;
        info!(
            "User {} unsaved job {} ({} row(s) removed)",
            user_id,
            job_id,
            rows.len()
        );
        Ok(rows)
    }

    /// Saved rows of `user_id`, each with its job and company
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<SavedJobEntry>> {
        let sql = format!(
            "SELECT s.id AS saved_id, s.user_id AS saved_user_id, s.job_id AS saved_job_id, \
             s.created_at AS saved_created_at, {}, \
             c.name AS company_name, c.logo_url AS company_logo_url \
             FROM saved_jobs s \
             JOIN jobs j ON j.id = s.job_id \
             JOIN companies c ON c.id = j.company_id \
             WHERE s.user_id = ? \
             ORDER BY s.id ASC",
            JOB_COLUMNS
        );

        let rows = sqlx::query_as::<_, SavedJobRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await
            .map_err(JobBoardError::query("saved_jobs"))?;

        Ok(rows.into_iter().map(SavedJobEntry::from).collect())
    }
}
