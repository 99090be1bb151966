// src/core/mod.rs
//! Store access: connection, repositories and logo storage

pub mod companies;
pub mod database;
pub mod jobs;
pub mod saved_jobs;
pub mod storage;

pub use companies::CompanyRepository;
pub use database::Database;
pub use jobs::JobRepository;
pub use saved_jobs::SavedJobRepository;
pub use storage::{HttpLogoStorage, LogoStorage, MemoryLogoStorage};
