// src/types/mod.rs
pub mod models;
pub mod session;

pub use models::*;
pub use session::{Credential, Identity, Role, Session};
