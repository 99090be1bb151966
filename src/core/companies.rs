// src/core/companies.rs
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{JobBoardError, Result};
use crate::types::Company;

pub struct CompanyRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CompanyRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Full table projection
    pub async fn list(&self) -> Result<Vec<Company>> {
        let companies = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, logo_url, created_at
            FROM companies
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.pool)
        .await
        .map_err(JobBoardError::query("companies"))?;

        Ok(companies)
    }

    pub async fn insert(&self, name: &str, logo_url: &str) -> Result<Vec<Company>> {
        let companies = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, logo_url, created_at)
            VALUES (?, ?, ?)
            RETURNING id, name, logo_url, created_at
            "#,
        )
        .bind(name)
        .bind(logo_url)
        .bind(Utc::now())
        .fetch_all(self.pool)
        .await
        .map_err(JobBoardError::insert("companies"))?;

        info!("Created company: {}", name);
        Ok(companies)
    }
}
