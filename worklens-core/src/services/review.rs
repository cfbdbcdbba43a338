//! Review service - review submission and aggregate verification

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::Review;
use crate::ports::Repository;

/// Fields submitted on the review form
#[derive(Debug, Clone)]
pub struct NewReview {
    pub rating: i32,
    pub description: Option<String>,
}

/// A company whose materialized aggregates disagree with its review set
#[derive(Debug, Clone, Serialize)]
pub struct AggregateMismatch {
    pub company_id: Uuid,
    pub company_name: String,
    pub stored_count: i64,
    pub actual_count: i64,
    pub stored_average: f64,
    pub actual_average: f64,
}

/// Review service for submitting reviews
pub struct ReviewService {
    repository: Arc<dyn Repository>,
}

impl ReviewService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Submit a review for a company.
    ///
    /// The repository refreshes the company's review_count and
    /// average_rating within the same operation, so once this returns Ok
    /// any read of the company sees statistics consistent with the new
    /// review.
    pub fn submit(&self, user_id: Uuid, company_id: Uuid, form: NewReview) -> Result<Review> {
        if self.repository.get_company_by_id(company_id)?.is_none() {
            return Err(Error::not_found(format!("Company not found: {}", company_id)));
        }

        let mut review = Review::new(Uuid::new_v4(), company_id, user_id, form.rating);
        review.description = Review::normalize_description(form.description.as_deref());
        review.validate().map_err(Error::validation)?;

        self.repository.add_review(&review)?;
        info!(
            "Review {} submitted for company {} (rating {})",
            review.id, company_id, review.rating
        );
        Ok(review)
    }

    /// Health check: compare every company's materialized aggregates
    /// against the live summary of its review set.
    ///
    /// An empty result means the invariant holds across the whole store.
    pub fn verify_aggregates(&self) -> Result<Vec<AggregateMismatch>> {
        let mut mismatches = Vec::new();

        for company in self.repository.get_companies()? {
            let live = self.repository.rating_summary(company.id)?;
            if !live.matches(company.review_count, company.average_rating) {
                mismatches.push(AggregateMismatch {
                    company_id: company.id,
                    company_name: company.name.clone(),
                    stored_count: company.review_count,
                    actual_count: live.review_count,
                    stored_average: company.average_rating,
                    actual_average: live.average_rating,
                });
            }
        }

        Ok(mismatches)
    }
}
