//! Integration tests for worklens-core services
//!
//! These tests verify the critical data integrity scenarios using real
//! DuckDB. All database operations are real; only the HTTP layer is absent.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use worklens_core::adapters::DuckDbRepository;
use worklens_core::config::Config;
use worklens_core::domain::result::Error;
use worklens_core::ports::Repository;
use worklens_core::services::{NewCompany, NewReview, ProfileUpdate, SignupRequest};
use worklens_core::WorklensContext;

// ============================================================================
// Test Helpers
// ============================================================================

/// Create a test context backed by a file database in a temp dir
fn create_test_context(temp_dir: &TempDir) -> WorklensContext {
    let db_path = temp_dir.path().join("test.duckdb");
    let repository = Arc::new(DuckDbRepository::new(&db_path).expect("Failed to create repository"));
    repository.ensure_schema().expect("Failed to initialize schema");

    let config = Config {
        session_ttl_secs: 60,
        ..Config::default()
    };
    WorklensContext::with_repository(config, repository).expect("Failed to build context")
}

fn signup_request(email: &str, password: &str) -> SignupRequest {
    SignupRequest {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn new_company(name: &str) -> NewCompany {
    NewCompany {
        name: name.to_string(),
        location: "Boston".to_string(),
        website: "https://example.test".to_string(),
    }
}

// ============================================================================
// Aggregate Consistency Tests
// ============================================================================

/// End-to-end flow: two reviews on a fresh listing must leave count=2
/// and average=3.0 visible on the company row.
#[test]
fn test_review_submission_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    let user = ctx
        .account_service
        .signup(signup_request("a@x.com", "pw1"))
        .unwrap();
    let logged_in = ctx.account_service.login("a@x.com", "pw1").unwrap();
    assert_eq!(logged_in.id, user.id);

    let company = ctx.listing_service.create_company(new_company("Acme")).unwrap();
    assert_eq!(company.review_count, 0);
    assert_eq!(company.average_rating, 0.0);

    ctx.review_service
        .submit(
            user.id,
            company.id,
            NewReview {
                rating: 4,
                description: Some("Solid place to work".to_string()),
            },
        )
        .unwrap();

    let page = ctx.listing_service.company_page(company.id).unwrap();
    assert_eq!(page.company.review_count, 1);
    assert_eq!(page.company.average_rating, 4.0);
    assert_eq!(page.reviews.len(), 1);

    ctx.review_service
        .submit(
            user.id,
            company.id,
            NewReview {
                rating: 2,
                description: None,
            },
        )
        .unwrap();

    let page = ctx.listing_service.company_page(company.id).unwrap();
    assert_eq!(page.company.review_count, 2);
    assert_eq!(page.company.average_rating, 3.0);
    assert_eq!(page.reviews.len(), 2);
}

/// After any successful submission the materialized columns must agree
/// with a live aggregate over the review rows.
#[test]
fn test_aggregates_consistent_after_every_submission() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    let user = ctx
        .account_service
        .signup(signup_request("reviewer@x.com", "pw"))
        .unwrap();
    let company = ctx.listing_service.create_company(new_company("Acme")).unwrap();

    for rating in [5, 1, 3, 4, 2] {
        ctx.review_service
            .submit(
                user.id,
                company.id,
                NewReview {
                    rating,
                    description: None,
                },
            )
            .unwrap();

        let stored = ctx.repository.get_company_by_id(company.id).unwrap().unwrap();
        let live = ctx.repository.rating_summary(company.id).unwrap();
        assert!(
            live.matches(stored.review_count, stored.average_rating),
            "stored ({}, {}) diverged from live ({}, {})",
            stored.review_count,
            stored.average_rating,
            live.review_count,
            live.average_rating
        );
    }

    assert!(ctx.review_service.verify_aggregates().unwrap().is_empty());
}

#[test]
fn test_review_on_unknown_company_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    let user = ctx
        .account_service
        .signup(signup_request("reviewer@x.com", "pw"))
        .unwrap();

    let err = ctx
        .review_service
        .submit(
            user.id,
            Uuid::new_v4(),
            NewReview {
                rating: 4,
                description: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_out_of_range_rating_is_rejected_without_side_effects() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    let user = ctx
        .account_service
        .signup(signup_request("reviewer@x.com", "pw"))
        .unwrap();
    let company = ctx.listing_service.create_company(new_company("Acme")).unwrap();

    for rating in [0, 6, -1] {
        let err = ctx
            .review_service
            .submit(
                user.id,
                company.id,
                NewReview {
                    rating,
                    description: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    let stored = ctx.repository.get_company_by_id(company.id).unwrap().unwrap();
    assert_eq!(stored.review_count, 0);
    assert_eq!(stored.average_rating, 0.0);
}

// ============================================================================
// Signup / Login Tests
// ============================================================================

/// Signing up twice with one email must fail the second attempt and leave
/// exactly one user row.
#[test]
fn test_duplicate_signup_leaves_single_row() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    ctx.account_service
        .signup(signup_request("dup@x.com", "pw1"))
        .unwrap();

    let err = ctx
        .account_service
        .signup(signup_request("dup@x.com", "pw2"))
        .unwrap_err();
    assert!(matches!(err, Error::EmailTaken(_)));
    assert_eq!(err.to_string(), "Email address already registered!");

    assert_eq!(ctx.repository.count_users_with_email("dup@x.com").unwrap(), 1);
}

#[test]
fn test_login_failures_are_distinguished() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    ctx.account_service
        .signup(signup_request("known@x.com", "right"))
        .unwrap();

    let err = ctx.account_service.login("unknown@x.com", "right").unwrap_err();
    assert!(matches!(err, Error::UnknownEmail(_)));

    let err = ctx.account_service.login("known@x.com", "wrong").unwrap_err();
    assert!(matches!(err, Error::WrongPassword));
}

#[test]
fn test_password_is_stored_hashed() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    ctx.account_service
        .signup(signup_request("hashed@x.com", "supersecret"))
        .unwrap();

    let stored = ctx.repository.get_user_by_email("hashed@x.com").unwrap().unwrap();
    assert_ne!(stored.password_hash, "supersecret");
    assert!(stored.password_hash.starts_with("$argon2"));
}

// ============================================================================
// Session Tests
// ============================================================================

/// Login establishes a session that grants protected access; logout
/// invalidates it.
#[test]
fn test_session_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    let user = ctx
        .account_service
        .signup(signup_request("session@x.com", "pw"))
        .unwrap();
    let logged_in = ctx.account_service.login("session@x.com", "pw").unwrap();

    let token = ctx.session_service.create(logged_in.id);
    assert_eq!(ctx.session_service.resolve(&token), Some(user.id));

    // The resolved id reaches a real user, i.e. the protected route works
    let current = ctx.account_service.get_user(user.id).unwrap();
    assert_eq!(current.email, "session@x.com");

    ctx.session_service.revoke(&token);
    assert_eq!(ctx.session_service.resolve(&token), None);
}

// ============================================================================
// Profile Tests
// ============================================================================

#[test]
fn test_profile_upsert_creates_then_mutates() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    let user = ctx
        .account_service
        .signup(signup_request("student@x.com", "pw"))
        .unwrap();

    // No details until the first save
    assert!(ctx.account_service.profile(user.id).unwrap().is_none());

    let saved = ctx
        .account_service
        .update_profile(
            user.id,
            ProfileUpdate {
                location: Some("Boston".to_string()),
                degree_type: Some("BS".to_string()),
                school: Some("MIT".to_string()),
                expected_graduation: Some("2027".to_string()),
            },
        )
        .unwrap();
    assert_eq!(saved.location.as_deref(), Some("Boston"));

    // Second save mutates the same row
    let resaved = ctx
        .account_service
        .update_profile(
            user.id,
            ProfileUpdate {
                location: Some("NYC".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(resaved.id, saved.id);
    assert_eq!(resaved.location.as_deref(), Some("NYC"));
    assert_eq!(resaved.degree_type, None);

    let stored = ctx.account_service.profile(user.id).unwrap().unwrap();
    assert_eq!(stored.location.as_deref(), Some("NYC"));
}

#[test]
fn test_profile_update_for_unknown_user_fails() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    let err = ctx
        .account_service
        .update_profile(Uuid::new_v4(), ProfileUpdate::default())
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

// ============================================================================
// Listing Tests
// ============================================================================

#[test]
fn test_company_page_for_unknown_id_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    let err = ctx.listing_service.company_page(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_listings_appear_on_home_listing() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    assert!(ctx.listing_service.list_companies().unwrap().is_empty());

    ctx.listing_service.create_company(new_company("Acme")).unwrap();
    ctx.listing_service.create_company(new_company("Globex")).unwrap();

    let companies = ctx.listing_service.list_companies().unwrap();
    assert_eq!(companies.len(), 2);
}

#[test]
fn test_blank_listing_fields_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    let err = ctx
        .listing_service
        .create_company(NewCompany {
            name: "   ".to_string(),
            location: "Boston".to_string(),
            website: "https://example.test".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(ctx.listing_service.list_companies().unwrap().is_empty());
}
