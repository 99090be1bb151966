// src/core/jobs.rs
//! Job reads and writes, including the dynamic filter query

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{JobBoardError, Result};
use crate::filter::{JobFilter, Predicate};
use crate::types::{
    Application, CompanyBrief, Job, JobDetail, JobId, JobListing, JobWithCompany, NewJob,
    SavedRef,
};

/// Job columns for statements that alias `jobs` as `j`
pub(crate) const JOB_COLUMNS: &str = "j.id, j.title, j.description, j.location, j.company_id, \
     j.recruiter_id, j.requirements, j.is_open, j.created_at";

const RETURNING_JOB: &str = "RETURNING id, title, description, location, company_id, \
     recruiter_id, requirements, is_open, created_at";

/// A job joined with its company projection
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct JobRow {
    #[sqlx(flatten)]
    pub job: Job,
    pub company_name: String,
    pub company_logo_url: String,
}

impl JobRow {
    fn company(&self) -> CompanyBrief {
        CompanyBrief {
            name: self.company_name.clone(),
            logo_url: self.company_logo_url.clone(),
        }
    }

    pub fn into_with_company(self) -> JobWithCompany {
        let company = self.company();
        JobWithCompany {
            job: self.job,
            company,
        }
    }
}

fn select_with_company() -> String {
    format!(
        "SELECT {}, c.name AS company_name, c.logo_url AS company_logo_url \
         FROM jobs j JOIN companies c ON c.id = j.company_id",
        JOB_COLUMNS
    )
}

pub struct JobRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> JobRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Jobs matching every predicate of `filter`, annotated with `viewer_id`'s saved rows
    pub async fn list(&self, filter: &JobFilter, viewer_id: &str) -> Result<Vec<JobListing>> {
        let predicates = filter.predicates();
        debug!(
            "Listing jobs with filters on: {:?}",
            predicates.iter().map(Predicate::column).collect::<Vec<_>>()
        );

        // SQLite `LIKE` only folds ASCII case, so title search runs on the
        // fetched rows through `Predicate::matches`.
        let mut builder = QueryBuilder::<Sqlite>::new(select_with_company());
        let mut in_memory = Vec::new();
        let mut clause = " WHERE ";
        for predicate in predicates {
            match predicate {
                Predicate::LocationEq(location) => {
                    builder.push(clause).push("j.location = ").push_bind(location);
                }
                Predicate::CompanyEq(company_id) => {
                    builder.push(clause).push("j.company_id = ").push_bind(company_id);
                }
                title @ Predicate::TitleContains(_) => {
                    in_memory.push(title);
                    continue;
                }
            }
            clause = " AND ";
        }
        builder.push(" ORDER BY j.id ASC");

        let mut rows: Vec<JobRow> = builder
            .build_query_as()
            .fetch_all(self.pool)
            .await
            .map_err(JobBoardError::query("jobs"))?;

        rows.retain(|row| in_memory.iter().all(|p| p.matches(&row.job)));

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let saved: Vec<(i64, JobId)> = sqlx::query_as(
            r#"
            SELECT id, job_id
            FROM saved_jobs
            WHERE user_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(viewer_id)
        .fetch_all(self.pool)
        .await
        .map_err(JobBoardError::query("saved_jobs"))?;

        let mut saved_by_job: HashMap<JobId, Vec<SavedRef>> = HashMap::new();
        for (id, job_id) in saved {
            saved_by_job.entry(job_id).or_default().push(SavedRef { id });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let saved = saved_by_job.remove(&row.job.id).unwrap_or_default();
                let JobWithCompany { job, company } = row.into_with_company();
                JobListing {
                    job,
                    saved,
                    company,
                }
            })
            .collect())
    }

    /// Single job with company and applications
    pub async fn get(&self, job_id: JobId) -> Result<Option<JobDetail>> {
        let sql = format!("{} WHERE j.id = ?", select_with_company());
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(job_id)
            .fetch_optional(self.pool)
            .await
            .map_err(JobBoardError::query("jobs"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let applications = sqlx::query_as::<_, Application>(
            r#"
            SELECT id, job_id, candidate_id, name, status, resume, created_at
            FROM applications
            WHERE job_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(self.pool)
        .await
        .map_err(JobBoardError::query("applications"))?;

        let JobWithCompany { job, company } = row.into_with_company();
        Ok(Some(JobDetail {
            job,
            company,
            applications,
        }))
    }

    pub async fn insert(&self, recruiter_id: &str, job: &NewJob) -> Result<Vec<Job>> {
        let sql = format!(
            "INSERT INTO jobs (title, description, location, company_id, recruiter_id, \
             requirements, is_open, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?) {}",
            RETURNING_JOB
        );

        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind(&job.title)
            .bind(&job.description)
            .bind(&job.location)
            .bind(job.company_id)
            .bind(recruiter_id)
            .bind(&job.requirements)
            .bind(job.is_open)
            .bind(Utc::now())
            .fetch_all(self.pool)
            .await
            .map_err(JobBoardError::insert("jobs"))?;

        info!("Created job '{}' for recruiter {}", job.title, recruiter_id);
        Ok(jobs)
    }

    /// Set `is_open` on a job owned by `recruiter_id`
    pub async fn update_hiring_status(
        &self,
        job_id: JobId,
        recruiter_id: &str,
        is_open: bool,
    ) -> Result<Vec<Job>> {
        let sql = format!(
            "UPDATE jobs SET is_open = ? WHERE id = ? AND recruiter_id = ? {}",
            RETURNING_JOB
        );

        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind(is_open)
            .bind(job_id)
            .bind(recruiter_id)
            .fetch_all(self.pool)
            .await
            .map_err(JobBoardError::update("jobs"))?;

        info!(
            "Hiring status of job {} set to {} ({} row(s))",
            job_id,
            if is_open { "open" } else { "closed" },
            jobs.len()
        );
        Ok(jobs)
    }

    pub async fn list_by_recruiter(&self, recruiter_id: &str) -> Result<Vec<JobWithCompany>> {
        let sql = format!(
            "{} WHERE j.recruiter_id = ? ORDER BY j.id ASC",
            select_with_company()
        );

        let rows = sqlx::query_as::<_, JobRow>(&sql)
            .bind(recruiter_id)
            .fetch_all(self.pool)
            .await
            .map_err(JobBoardError::query("jobs"))?;

        Ok(rows.into_iter().map(JobRow::into_with_company).collect())
    }

    /// Delete a job owned by `recruiter_id`; saved rows and applications cascade
    pub async fn delete(&self, job_id: JobId, recruiter_id: &str) -> Result<Vec<Job>> {
        let sql = format!(
            "DELETE FROM jobs WHERE id = ? AND recruiter_id = ? {}",
            RETURNING_JOB
        );

        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind(job_id)
            .bind(recruiter_id)
            .fetch_all(self.pool)
            .await
            .map_err(JobBoardError::delete("jobs"))?;

        if !jobs.is_empty() {
            info!("Deleted job {} for recruiter {}", job_id, recruiter_id);
        }
        Ok(jobs)
    }
}
