//! Worklens Core - Business logic for employer reviews
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (User, Company, Review, etc.)
//! - **ports**: Trait definitions for external dependencies (Repository)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use adapters::DuckDbRepository;
use config::Config;
use ports::Repository;
use services::{AccountService, ListingService, ReviewService, SessionService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{Company, RatingSummary, Review, User, UserDetails};

/// Main context for Worklens operations
///
/// This is the primary entry point for all business logic. It holds the
/// database connection, configuration, and all services. Handlers receive
/// it explicitly; there is no module-level global state.
pub struct WorklensContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub account_service: AccountService,
    pub listing_service: ListingService,
    pub review_service: ReviewService,
    pub session_service: SessionService,
}

impl WorklensContext {
    /// Create a new Worklens context rooted at a data directory
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;

        let db_path = data_dir.join(config.db_filename());
        let repository = Arc::new(DuckDbRepository::new(&db_path)?);

        // Initialize schema
        repository.ensure_schema()?;

        Self::with_repository(config, repository)
    }

    /// Build a context around an existing repository (tests use this with
    /// an in-memory database)
    pub fn with_repository(config: Config, repository: Arc<DuckDbRepository>) -> Result<Self> {
        let repo: Arc<dyn Repository> = repository.clone();

        let account_service = AccountService::new(Arc::clone(&repo));
        let listing_service = ListingService::new(Arc::clone(&repo));
        let review_service = ReviewService::new(Arc::clone(&repo));
        let session_service = SessionService::new(Duration::from_secs(config.session_ttl_secs));

        Ok(Self {
            config,
            repository,
            account_service,
            listing_service,
            review_service,
            session_service,
        })
    }
}
