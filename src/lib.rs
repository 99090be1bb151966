// src/lib.rs
//! Job board data layer: companies, jobs, saved jobs and applications, with
//! filtered listing, a saved-job toggle and tracked async operations.

use anyhow::{Context, Result};

pub mod board;
pub mod cli;
pub mod core;
pub mod environment;
pub mod error;
pub mod filter;
pub mod operation;
pub mod types;
pub mod utils;

pub use board::{JobBoard, SavedJobKey};
pub use environment::AppConfig;
pub use error::JobBoardError;
pub use filter::{JobFilter, JobSearch, Pagination};
pub use operation::{AsyncOperation, Loading, RunOutcome};
pub use types::{Credential, Role, Session};

use crate::core::{Database, HttpLogoStorage};

/// Open the configured database and logo storage
pub async fn open_board(config: &AppConfig) -> Result<JobBoard<HttpLogoStorage>> {
    let db = Database::new(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database: {}", config.database_path.display()))?;
    let storage = HttpLogoStorage::new(&config.storage)?;
    Ok(JobBoard::new(db, storage))
}
