// src/error.rs
use thiserror::Error;

use crate::types::session::Role;

#[derive(Error, Debug)]
pub enum JobBoardError {
    #[error("Logo upload failed for {file_name}: {message}")]
    Storage { file_name: String, message: String },

    #[error("Insert into {table} rejected: {source}")]
    Insert {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Update of {table} rejected: {source}")]
    Update {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Delete from {table} rejected: {source}")]
    Delete {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Query on {table} rejected: {source}")]
    Query {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Role '{role}' is not allowed to {action}")]
    Forbidden { role: Role, action: &'static str },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl JobBoardError {
    pub(crate) fn insert(table: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Insert { table, source }
    }

    pub(crate) fn update(table: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Update { table, source }
    }

    pub(crate) fn delete(table: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Delete { table, source }
    }

    pub(crate) fn query(table: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Query { table, source }
    }

    /// Stable code for logs and CLI output
    pub fn code(&self) -> &'static str {
        match self {
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::Insert { .. } => "INSERT_ERROR",
            Self::Update { .. } => "UPDATE_ERROR",
            Self::Delete { .. } => "DELETE_ERROR",
            Self::Query { .. } => "QUERY_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, JobBoardError>;
