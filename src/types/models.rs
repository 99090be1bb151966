// src/types/models.rs
//! Entities and projections exchanged with the job store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{JobBoardError, Result};
use crate::utils;

pub type CompanyId = i64;
pub type JobId = i64;

/// Logo extensions accepted by `createCompany`
pub const LOGO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "svg", "webp"];

// ===== Companies =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub logo_url: String,
    pub created_at: DateTime<Utc>,
}

/// `company: {name, logo_url}` projection embedded in job results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyBrief {
    pub name: String,
    pub logo_url: String,
}

#[derive(Debug, Clone)]
pub struct LogoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub logo: LogoUpload,
}

impl NewCompany {
    pub fn new(name: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            logo: LogoUpload {
                file_name: file_name.into(),
                bytes,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(JobBoardError::Validation("Company name is required".into()));
        }
        if self.logo.bytes.is_empty() {
            return Err(JobBoardError::Validation("Company logo is empty".into()));
        }
        utils::validate_file_extension(&self.logo.file_name, LOGO_EXTENSIONS)
    }
}

// ===== Jobs =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub company_id: CompanyId,
    pub recruiter_id: String,
    pub requirements: String,
    #[serde(rename = "isOpen")]
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

/// A saved-job row reduced to its id, as embedded in `saved: [{id}]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRef {
    pub id: i64,
}

/// Row returned by `listJobs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    #[serde(flatten)]
    pub job: Job,
    pub saved: Vec<SavedRef>,
    pub company: CompanyBrief,
}

impl JobListing {
    /// Whether the viewer has bookmarked this job
    pub fn is_saved(&self) -> bool {
        !self.saved.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobWithCompany {
    #[serde(flatten)]
    pub job: Job,
    pub company: CompanyBrief,
}

/// Row returned by `getJob`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub company: CompanyBrief,
    pub applications: Vec<Application>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub location: String,
    pub company_id: CompanyId,
    pub requirements: String,
    #[serde(rename = "isOpen", default = "default_open")]
    pub is_open: bool,
}

fn default_open() -> bool {
    true
}

impl NewJob {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
        company_id: CompanyId,
        requirements: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            location: location.into(),
            company_id,
            requirements: requirements.into(),
            is_open: true,
        }
    }

    /// Shape checks run before anything is sent to the store
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("title", &self.title),
            ("description", &self.description),
            ("location", &self.location),
            ("requirements", &self.requirements),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(JobBoardError::Validation(format!("{} is required", field)));
            }
        }

        if self.company_id <= 0 {
            return Err(JobBoardError::Validation(
                "Select or add a company".to_string(),
            ));
        }

        Ok(())
    }
}

// ===== Saved jobs =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SavedJob {
    pub id: i64,
    pub user_id: String,
    pub job_id: JobId,
    pub created_at: DateTime<Utc>,
}

/// Row returned by `listSavedJobs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedJobEntry {
    #[serde(flatten)]
    pub saved: SavedJob,
    pub job: JobWithCompany,
}

/// Outcome of the server-side save toggle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SaveState {
    Saved { row: SavedJob },
    Unsaved { removed: u64 },
}

impl SaveState {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveState::Saved { .. })
    }
}

// ===== Applications =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Application {
    pub id: i64,
    pub job_id: JobId,
    pub candidate_id: String,
    pub name: String,
    pub status: String,
    pub resume: Option<String>,
    pub created_at: DateTime<Utc>,
}
