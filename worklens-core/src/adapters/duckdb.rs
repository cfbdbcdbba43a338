//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, Connection};
use tracing::warn;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Company, RatingSummary, Review, User, UserDetails};
use crate::ports::Repository;
use crate::services::MigrationService;

/// Maximum number of retries when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// Check if an error message indicates a uniqueness-constraint violation.
/// The only unique column in the schema besides primary keys is users.email.
fn is_unique_violation(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("duplicate key") || lower.contains("unique constraint")
}

/// DuckDB repository implementation
///
/// A single connection behind a mutex serializes all readers and writers,
/// which is what keeps the insert-plus-aggregate-refresh in `add_review`
/// indivisible from the point of view of other requests.
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Create a new DuckDB repository
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which can occur when another process still holds the database file
    /// (e.g. a previous server instance shutting down).
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        warn!(
                            "Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// Open an in-memory repository (tests and demo tooling)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Error::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading is unnecessary for this schema and can fail
        // on macOS due to code signing of cached extensions.
        let config = duckdb::Config::default()
            .enable_autoload_extension(false)
            .map_err(Error::from)?;
        Connection::open_with_flags(db_path, config).map_err(Error::from)
    }

    /// Path of the backing database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<crate::services::MigrationResult> {
        let conn = self.conn.lock().unwrap();
        let migration_service = MigrationService::new(&conn);
        migration_service
            .run_pending()
            .map_err(|e| Error::database(e.to_string()))
    }

    fn row_to_user(&self, row: &duckdb::Row) -> User {
        // Column indices from SELECT:
        // 0: user_id, 1: first_name, 2: last_name, 3: email, 4: password_hash, 5: created_at
        let id_str: String = row.get(0).unwrap_or_default();
        let created_str: String = row.get(5).unwrap_or_default();

        User {
            id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::new_v4()),
            first_name: row.get(1).unwrap_or_default(),
            last_name: row.get(2).unwrap_or_default(),
            email: row.get(3).unwrap_or_default(),
            password_hash: row.get(4).unwrap_or_default(),
            created_at: parse_timestamp(&created_str),
        }
    }

    fn row_to_user_details(&self, row: &duckdb::Row) -> UserDetails {
        // 0: detail_id, 1: user_id, 2: location, 3: degree_type, 4: school,
        // 5: expected_graduation, 6: updated_at
        let id_str: String = row.get(0).unwrap_or_default();
        let user_id_str: String = row.get(1).unwrap_or_default();
        let updated_str: String = row.get(6).unwrap_or_default();

        UserDetails {
            id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::new_v4()),
            user_id: Uuid::parse_str(&user_id_str).unwrap_or_else(|_| Uuid::new_v4()),
            location: row.get(2).ok().flatten(),
            degree_type: row.get(3).ok().flatten(),
            school: row.get(4).ok().flatten(),
            expected_graduation: row.get(5).ok().flatten(),
            updated_at: parse_timestamp(&updated_str),
        }
    }

    fn row_to_company(&self, row: &duckdb::Row) -> Company {
        // 0: company_id, 1: name, 2: location, 3: website, 4: review_count,
        // 5: average_rating, 6: created_at
        let id_str: String = row.get(0).unwrap_or_default();
        let created_str: String = row.get(6).unwrap_or_default();

        Company {
            id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::new_v4()),
            name: row.get(1).unwrap_or_default(),
            location: row.get(2).unwrap_or_default(),
            website: row.get(3).unwrap_or_default(),
            review_count: row.get(4).unwrap_or(0),
            average_rating: row.get(5).unwrap_or(0.0),
            created_at: parse_timestamp(&created_str),
        }
    }

    fn row_to_review(&self, row: &duckdb::Row) -> Review {
        // 0: review_id, 1: company_id, 2: user_id, 3: rating, 4: description, 5: created_at
        let id_str: String = row.get(0).unwrap_or_default();
        let company_id_str: String = row.get(1).unwrap_or_default();
        let user_id_str: String = row.get(2).unwrap_or_default();
        let created_str: String = row.get(5).unwrap_or_default();

        Review {
            id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::new_v4()),
            company_id: Uuid::parse_str(&company_id_str).unwrap_or_else(|_| Uuid::new_v4()),
            user_id: Uuid::parse_str(&user_id_str).unwrap_or_else(|_| Uuid::new_v4()),
            rating: row.get(3).unwrap_or(0),
            description: row.get(4).ok().flatten(),
            created_at: parse_timestamp(&created_str),
        }
    }
}

impl Repository for DuckDbRepository {
    fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    // === Users ===

    fn add_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO users (user_id, first_name, last_name, email, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                user.id.to_string(),
                user.first_name,
                user.last_name,
                user.email,
                user.password_hash,
                user.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let msg = e.to_string();
                if is_unique_violation(&msg) {
                    // Single-statement insert: the conflict leaves no partial row
                    Err(Error::EmailTaken(user.email.clone()))
                } else {
                    Err(Error::Database(msg))
                }
            }
        }
    }

    fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, first_name, last_name, email, password_hash, created_at::VARCHAR
             FROM users WHERE user_id = ?",
        )?;

        let user = stmt
            .query_row([id.to_string()], |row| Ok(self.row_to_user(row)))
            .ok();

        Ok(user)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, first_name, last_name, email, password_hash, created_at::VARCHAR
             FROM users WHERE email = ?",
        )?;

        let user = stmt.query_row([email], |row| Ok(self.row_to_user(row))).ok();

        Ok(user)
    }

    fn count_users_with_email(&self, email: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?",
            params![email],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // === User details ===

    fn upsert_user_details(&self, details: &UserDetails) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_details (detail_id, user_id, location, degree_type, school,
                                       expected_graduation, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (user_id) DO UPDATE SET
                location = EXCLUDED.location,
                degree_type = EXCLUDED.degree_type,
                school = EXCLUDED.school,
                expected_graduation = EXCLUDED.expected_graduation,
                updated_at = EXCLUDED.updated_at",
            params![
                details.id.to_string(),
                details.user_id.to_string(),
                details.location,
                details.degree_type,
                details.school,
                details.expected_graduation,
                details.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_user_details(&self, user_id: Uuid) -> Result<Option<UserDetails>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT detail_id, user_id, location, degree_type, school, expected_graduation,
                    updated_at::VARCHAR
             FROM user_details WHERE user_id = ?",
        )?;

        let details = stmt
            .query_row([user_id.to_string()], |row| Ok(self.row_to_user_details(row)))
            .ok();

        Ok(details)
    }

    // === Companies ===

    fn add_company(&self, company: &Company) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO companies (company_id, name, location, website, review_count,
                                    average_rating, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                company.id.to_string(),
                company.name,
                company.location,
                company.website,
                company.review_count,
                company.average_rating,
                company.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_companies(&self) -> Result<Vec<Company>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT company_id, name, location, website, review_count, average_rating,
                    created_at::VARCHAR
             FROM companies
             ORDER BY created_at DESC, name",
        )?;

        let companies = stmt
            .query_map([], |row| Ok(self.row_to_company(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(companies)
    }

    fn get_company_by_id(&self, id: Uuid) -> Result<Option<Company>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT company_id, name, location, website, review_count, average_rating,
                    created_at::VARCHAR
             FROM companies WHERE company_id = ?",
        )?;

        let company = stmt
            .query_row([id.to_string()], |row| Ok(self.row_to_company(row)))
            .ok();

        Ok(company)
    }

    // === Reviews ===

    fn add_review(&self, review: &Review) -> Result<()> {
        // Both statements run under one lock acquisition so no other caller
        // can observe the insert without the refreshed aggregates.
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO reviews (review_id, company_id, user_id, rating, description, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                review.id.to_string(),
                review.company_id.to_string(),
                review.user_id.to_string(),
                review.rating,
                review.description,
                review.created_at.to_rfc3339(),
            ],
        )?;

        let company_id = review.company_id.to_string();
        conn.execute(
            "UPDATE companies SET
                review_count = (SELECT COUNT(*) FROM reviews WHERE company_id = ?),
                average_rating = (SELECT COALESCE(AVG(rating), 0.0) FROM reviews WHERE company_id = ?)
             WHERE company_id = ?",
            params![company_id, company_id, company_id],
        )?;

        Ok(())
    }

    fn get_reviews_by_company(&self, company_id: Uuid) -> Result<Vec<Review>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT review_id, company_id, user_id, rating, description, created_at::VARCHAR
             FROM reviews
             WHERE company_id = ?
             ORDER BY created_at DESC",
        )?;

        let reviews = stmt
            .query_map([company_id.to_string()], |row| Ok(self.row_to_review(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(reviews)
    }

    fn rating_summary(&self, company_id: Uuid) -> Result<RatingSummary> {
        let conn = self.conn.lock().unwrap();
        let summary = conn.query_row(
            "SELECT COUNT(*), COALESCE(AVG(rating), 0.0) FROM reviews WHERE company_id = ?",
            params![company_id.to_string()],
            |row| {
                Ok(RatingSummary {
                    review_count: row.get(0)?,
                    average_rating: row.get(1)?,
                })
            },
        )?;
        Ok(summary)
    }
}

// Helper functions

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    // RFC 3339 is what we write; DuckDB's VARCHAR cast of a TIMESTAMP
    // comes back as "YYYY-MM-DD HH:MM:SS[.ffffff]" without an offset.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(|_| Utc::now())
}
