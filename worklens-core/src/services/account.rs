//! Account service - signup, login, and profile management

use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::info;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{normalize_field, User, UserDetails};
use crate::ports::Repository;

/// Fields submitted on the signup form
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Fields submitted on the profile form
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub location: Option<String>,
    pub degree_type: Option<String>,
    pub school: Option<String>,
    pub expected_graduation: Option<String>,
}

/// Account service for signup, login and profile management
pub struct AccountService {
    repository: Arc<dyn Repository>,
}

impl AccountService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Register a new user.
    ///
    /// The password is hashed before anything touches the store. A duplicate
    /// email surfaces as [`Error::EmailTaken`] and leaves the users table
    /// unchanged.
    pub fn signup(&self, request: SignupRequest) -> Result<User> {
        if request.password.is_empty() {
            return Err(Error::validation("password cannot be empty"));
        }

        let password_hash = hash_password(&request.password)?;
        let user = User::new(
            Uuid::new_v4(),
            request.first_name.trim(),
            request.last_name.trim(),
            request.email.trim(),
            password_hash,
        );
        user.validate().map_err(Error::validation)?;

        self.repository.add_user(&user)?;
        info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Authenticate by email and password.
    ///
    /// Unknown email and wrong password are distinct failures because the
    /// login page reports them differently.
    pub fn login(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim();
        let user = self
            .repository
            .get_user_by_email(email)?
            .ok_or_else(|| Error::UnknownEmail(email.to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(Error::WrongPassword);
        }

        Ok(user)
    }

    /// Get a user by id, failing if the id is stale
    pub fn get_user(&self, user_id: Uuid) -> Result<User> {
        self.repository
            .get_user_by_id(user_id)?
            .ok_or_else(|| Error::not_found(format!("User not found: {}", user_id)))
    }

    /// Get the profile row for a user, if one was ever saved
    pub fn profile(&self, user_id: Uuid) -> Result<Option<UserDetails>> {
        self.repository.get_user_details(user_id)
    }

    /// Save the profile form: create the details row on first save,
    /// mutate it in place afterwards.
    pub fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<UserDetails> {
        // Make sure the session's user still exists before writing
        self.get_user(user_id)?;

        let mut details = self
            .repository
            .get_user_details(user_id)?
            .unwrap_or_else(|| UserDetails::new(Uuid::new_v4(), user_id));

        details.location = normalize_field(update.location.as_deref());
        details.degree_type = normalize_field(update.degree_type.as_deref());
        details.school = normalize_field(update.school.as_deref());
        details.expected_graduation = normalize_field(update.expected_graduation.as_deref());
        details.updated_at = chrono::Utc::now();

        self.repository.upsert_user_details(&details)?;
        Ok(details)
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
