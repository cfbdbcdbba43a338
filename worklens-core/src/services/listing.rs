//! Listing service - company directory

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Company, Review};
use crate::ports::Repository;

/// Fields submitted on the create-listing form
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub location: String,
    pub website: String,
}

/// Everything the company page renders
#[derive(Debug, Clone)]
pub struct CompanyPage {
    pub company: Company,
    pub reviews: Vec<Review>,
}

/// Listing service for browsing and creating company listings
pub struct ListingService {
    repository: Arc<dyn Repository>,
}

impl ListingService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Create a new listing with zero reviews and an average of 0.0
    pub fn create_company(&self, form: NewCompany) -> Result<Company> {
        let company = Company::new(
            Uuid::new_v4(),
            form.name.trim(),
            form.location.trim(),
            form.website.trim(),
        );
        company.validate().map_err(Error::validation)?;

        self.repository.add_company(&company)?;
        info!("Created listing {} ({})", company.name, company.id);
        Ok(company)
    }

    /// All companies for the home page, newest first
    pub fn list_companies(&self) -> Result<Vec<Company>> {
        self.repository.get_companies()
    }

    /// The company plus its reviews, newest first
    pub fn company_page(&self, company_id: Uuid) -> Result<CompanyPage> {
        let company = self
            .repository
            .get_company_by_id(company_id)?
            .ok_or_else(|| Error::not_found(format!("Company not found: {}", company_id)))?;
        let reviews = self.repository.get_reviews_by_company(company_id)?;

        Ok(CompanyPage { company, reviews })
    }
}
