//! Review domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lowest allowed star rating
pub const MIN_RATING: i32 = 1;
/// Highest allowed star rating
pub const MAX_RATING: i32 = 5;

/// A star rating with optional free text, tied to one company and one user.
///
/// Reviews are append-only: there are no edit or delete operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    /// Star rating, 1 through 5
    pub rating: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Create a new review with required fields
    pub fn new(id: Uuid, company_id: Uuid, user_id: Uuid, rating: i32) -> Self {
        Self {
            id,
            company_id,
            user_id,
            rating,
            description: None,
            created_at: Utc::now(),
        }
    }

    /// Validate the rating range
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.rating < MIN_RATING || self.rating > MAX_RATING {
            return Err("rating must be between 1 and 5");
        }
        Ok(())
    }

    /// Normalize free text: trim whitespace, map empty to None
    pub fn normalize_description(text: Option<&str>) -> Option<String> {
        text.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_range() {
        let mut review = Review::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), 3);
        assert!(review.validate().is_ok());

        review.rating = 0;
        assert!(review.validate().is_err());

        review.rating = 6;
        assert!(review.validate().is_err());

        review.rating = MIN_RATING;
        assert!(review.validate().is_ok());
        review.rating = MAX_RATING;
        assert!(review.validate().is_ok());
    }

    #[test]
    fn test_description_normalization() {
        assert_eq!(
            Review::normalize_description(Some("  great place  ")),
            Some("great place".to_string())
        );
        assert_eq!(Review::normalize_description(Some("   ")), None);
        assert_eq!(Review::normalize_description(None), None);
    }
}
