//! Repository port - database abstraction

use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Company, RatingSummary, Review, User, UserDetails};

/// Database repository abstraction
///
/// This trait defines all database operations. Implementations (adapters)
/// provide the actual database access logic. All queries are blocking;
/// callers run to completion on their own thread of control.
pub trait Repository: Send + Sync {
    // === Schema ===

    /// Run any pending migrations
    fn ensure_schema(&self) -> Result<()>;

    // === Users ===

    /// Insert a new user.
    ///
    /// A uniqueness violation on the email column maps to
    /// [`Error::EmailTaken`](crate::domain::result::Error::EmailTaken);
    /// the failed insert leaves the table unchanged.
    fn add_user(&self, user: &User) -> Result<()>;

    /// Get user by ID
    fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Get user by exact email
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Count users with the given email (0 or 1 given the unique constraint)
    fn count_users_with_email(&self, email: &str) -> Result<i64>;

    // === User details ===

    /// Insert or update the profile row for a user
    fn upsert_user_details(&self, details: &UserDetails) -> Result<()>;

    /// Get the profile row for a user, if one was ever saved
    fn get_user_details(&self, user_id: Uuid) -> Result<Option<UserDetails>>;

    // === Companies ===

    /// Insert a new company listing
    fn add_company(&self, company: &Company) -> Result<()>;

    /// Get all companies, newest first
    fn get_companies(&self) -> Result<Vec<Company>>;

    /// Get company by ID
    fn get_company_by_id(&self, id: Uuid) -> Result<Option<Company>>;

    // === Reviews ===

    /// Insert a review AND refresh the company's derived
    /// `review_count` / `average_rating` columns in the same logical
    /// operation. There is no separate aggregator call to forget.
    fn add_review(&self, review: &Review) -> Result<()>;

    /// Get all reviews for a company, newest first
    fn get_reviews_by_company(&self, company_id: Uuid) -> Result<Vec<Review>>;

    /// Compute the live aggregate over the review set (ground truth for
    /// the materialized columns)
    fn rating_summary(&self, company_id: Uuid) -> Result<RatingSummary>;
}
