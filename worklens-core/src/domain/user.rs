//! User and profile domain models

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account holder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Unique across all users. Matching is exact and case-sensitive.
    pub email: String,
    /// Argon2id PHC string. The raw password is never stored.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with required fields
    pub fn new(
        id: Uuid,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Check whether a string looks like an email address.
    ///
    /// Deliberately loose: one '@', at least one character on each side,
    /// a dot somewhere in the domain part. Real validation happens when
    /// mail actually gets sent, which this system never does.
    pub fn is_plausible_email(email: &str) -> bool {
        let re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
        re.is_match(email)
    }

    /// Validate signup fields
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.first_name.trim().is_empty() {
            return Err("first name cannot be empty");
        }
        if self.last_name.trim().is_empty() {
            return Err("last name cannot be empty");
        }
        if !Self::is_plausible_email(&self.email) {
            return Err("email address is not valid");
        }
        Ok(())
    }
}

/// Optional profile attributes, one-to-one with [`User`].
///
/// Created lazily on the first profile save, mutated in place afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location: Option<String>,
    pub degree_type: Option<String>,
    pub school: Option<String>,
    pub expected_graduation: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserDetails {
    /// Create empty details for a user
    pub fn new(id: Uuid, user_id: Uuid) -> Self {
        Self {
            id,
            user_id,
            location: None,
            degree_type: None,
            school: None,
            expected_graduation: None,
            updated_at: Utc::now(),
        }
    }
}

/// Normalize a free-form profile field: trim whitespace, map empty to None
pub fn normalize_field(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
