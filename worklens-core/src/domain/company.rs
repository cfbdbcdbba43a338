//! Company domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An employer listing users can review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub website: String,
    /// Derived: number of reviews referencing this company.
    /// Kept in sync by the repository on every review insert.
    pub review_count: i64,
    /// Derived: arithmetic mean of the review ratings, 0.0 with no reviews.
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
}

impl Company {
    /// Create a new listing with zero reviews
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        location: impl Into<String>,
        website: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            location: location.into(),
            website: website.into(),
            review_count: 0,
            average_rating: 0.0,
            created_at: Utc::now(),
        }
    }

    /// Validate listing data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("company name cannot be empty");
        }
        if self.location.trim().is_empty() {
            return Err("location cannot be empty");
        }
        if self.website.trim().is_empty() {
            return Err("website cannot be empty");
        }
        Ok(())
    }
}

/// Live aggregate computed from the review set.
///
/// This is the ground truth the materialized `review_count` /
/// `average_rating` columns on [`Company`] must agree with after every
/// review submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub review_count: i64,
    pub average_rating: f64,
}

impl RatingSummary {
    /// An empty review set averages to exactly 0.0, not NaN
    pub fn empty() -> Self {
        Self {
            review_count: 0,
            average_rating: 0.0,
        }
    }

    /// Compute the summary from raw rating values
    pub fn from_ratings(ratings: &[i32]) -> Self {
        if ratings.is_empty() {
            return Self::empty();
        }
        let total: i64 = ratings.iter().map(|r| *r as i64).sum();
        Self {
            review_count: ratings.len() as i64,
            average_rating: total as f64 / ratings.len() as f64,
        }
    }

    /// Compare against stored values, tolerating float representation noise
    pub fn matches(&self, stored_count: i64, stored_average: f64) -> bool {
        self.review_count == stored_count && (self.average_rating - stored_average).abs() < 1e-9
    }
}
