// src/types/session.rs
//! Caller identity as handed over by the external identity provider

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque access token. Forwarded unmodified to remote calls, never inspected.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Recruiter,
    Candidate,
}

impl Role {
    /// Anything other than "recruiter" is treated as a candidate
    pub fn parse(role: &str) -> Self {
        if role.trim().eq_ignore_ascii_case("recruiter") {
            Role::Recruiter
        } else {
            Role::Candidate
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Recruiter => f.write_str("recruiter"),
            Role::Candidate => f.write_str("candidate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub credential: Credential,
    pub identity: Identity,
}

impl Session {
    pub fn new(credential: Credential, user_id: impl Into<String>, role: Role) -> Self {
        Self {
            credential,
            identity: Identity {
                user_id: user_id.into(),
                role,
            },
        }
    }

    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    pub fn role(&self) -> Role {
        self.identity.role
    }

    pub fn is_recruiter(&self) -> bool {
        self.identity.role == Role::Recruiter
    }
}
