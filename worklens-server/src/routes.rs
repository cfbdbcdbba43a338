//! HTTP route handlers
//!
//! Handlers validate the form, call one service, and redirect. Recoverable
//! failures (duplicate email, bad credentials) become redirects carrying a
//! human-readable message; everything else bubbles up as [`AppError`].

use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use url::form_urlencoded;
use uuid::Uuid;
use worklens_core::services::{NewCompany, NewReview, ProfileUpdate, SignupRequest};
use worklens_core::Error as CoreError;

use crate::auth::{self, AuthUser};
use crate::error::AppError;
use crate::state::AppState;
use crate::views;

#[derive(Deserialize)]
pub struct MessageQuery {
    message: Option<String>,
}

#[derive(Deserialize)]
pub struct SignupForm {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct ProfileForm {
    location: Option<String>,
    degree_type: Option<String>,
    school: Option<String>,
    expected_graduation: Option<String>,
}

#[derive(Deserialize)]
pub struct ListingForm {
    company_name: String,
    location: String,
    website: String,
}

#[derive(Deserialize)]
pub struct ReviewForm {
    rating: i32,
    review_text: Option<String>,
}

/// Redirect carrying a message the target page will render
fn redirect_with_message(path: &str, message: &str) -> Redirect {
    let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
    Redirect::to(&format!("{path}?message={encoded}"))
}

fn with_cookie(response: Response, cookie: &str) -> Result<Response, AppError> {
    let mut response = response;
    let value =
        HeaderValue::from_str(cookie).map_err(|e| AppError::Internal(e.to_string()))?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(response)
}

// === Home ===

/// `GET /` - company directory when signed in, login page otherwise
pub async fn home(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessageQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    match auth::current_user(&state, &headers) {
        Some(user_id) => {
            let user = state.ctx.account_service.get_user(user_id)?;
            let companies = state.ctx.listing_service.list_companies()?;
            Ok(views::home_page(&user, &companies).into_response())
        }
        None => Ok(views::login_page(query.message.as_deref()).into_response()),
    }
}

// === Signup ===

/// `GET /signup`
pub async fn signup_form(Query(query): Query<MessageQuery>) -> Response {
    views::signup_page(query.message.as_deref()).into_response()
}

/// `POST /signup` - create the user, or bounce back with the reason
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let request = SignupRequest {
        first_name: form.first_name,
        last_name: form.last_name,
        email: form.email,
        password: form.password,
    };

    match state.ctx.account_service.signup(request) {
        Ok(_) => Ok(redirect_with_message("/login", "Successfully Signed Up!").into_response()),
        Err(e @ CoreError::EmailTaken(_)) | Err(e @ CoreError::Validation(_)) => {
            Ok(redirect_with_message("/signup", &e.to_string()).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// === Login / logout ===

/// `GET /login`
pub async fn login_form(Query(query): Query<MessageQuery>) -> Response {
    views::login_page(query.message.as_deref()).into_response()
}

/// `POST /login` - establish the session cookie, or bounce home with the
/// specific failure
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match state.ctx.account_service.login(&form.email, &form.password) {
        Ok(user) => {
            let token = state.ctx.session_service.create(user.id);
            let response = redirect_with_message("/", "Successfully logged in").into_response();
            with_cookie(response, &auth::session_cookie(&token))
        }
        Err(e @ CoreError::UnknownEmail(_)) | Err(e @ CoreError::WrongPassword) => {
            Ok(redirect_with_message("/", &e.to_string()).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// `GET /logout` - revoke the session and clear the cookie
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = auth::session_token(&headers) {
        state.ctx.session_service.revoke(&token);
    }
    let response = Redirect::to("/").into_response();
    with_cookie(response, &auth::clear_session_cookie())
}

// === Profile ===

/// `GET /profile`
pub async fn profile_form(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Response, AppError> {
    let user = state.ctx.account_service.get_user(user_id)?;
    let details = state.ctx.account_service.profile(user_id)?;
    Ok(views::profile_page(&user, details.as_ref()).into_response())
}

/// `POST /profile` - upsert the details row, then re-render via GET
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let update = ProfileUpdate {
        location: form.location,
        degree_type: form.degree_type,
        school: form.school,
        expected_graduation: form.expected_graduation,
    };
    state.ctx.account_service.update_profile(user_id, update)?;
    Ok(Redirect::to("/profile").into_response())
}

// === Listings ===

/// `GET /create_listing`
pub async fn create_listing_form(AuthUser(_): AuthUser) -> Response {
    views::create_listing_page().into_response()
}

/// `POST /create_listing` - create the company and land on its page
pub async fn create_listing(
    State(state): State<Arc<AppState>>,
    AuthUser(_user_id): AuthUser,
    Form(form): Form<ListingForm>,
) -> Result<Response, AppError> {
    let company = state.ctx.listing_service.create_company(NewCompany {
        name: form.company_name,
        location: form.location,
        website: form.website,
    })?;
    Ok(Redirect::to(&format!("/company/{}", company.id)).into_response())
}

// === Company page & reviews ===

/// `GET /company/{id}` - listing details, aggregate stats, reviews
pub async fn company_page(
    State(state): State<Arc<AppState>>,
    AuthUser(_user_id): AuthUser,
    Path(company_id): Path<Uuid>,
    Query(query): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let page = state.ctx.listing_service.company_page(company_id)?;
    Ok(views::company_page(&page.company, &page.reviews, query.message.as_deref()).into_response())
}

/// `POST /company/{id}` - submit a review, refresh aggregates, bounce back
pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(company_id): Path<Uuid>,
    Form(form): Form<ReviewForm>,
) -> Result<Response, AppError> {
    let review = NewReview {
        rating: form.rating,
        description: form.review_text,
    };

    match state.ctx.review_service.submit(user_id, company_id, review) {
        Ok(_) => Ok(Redirect::to(&format!("/company/{}", company_id)).into_response()),
        Err(e @ CoreError::Validation(_)) => Ok(redirect_with_message(
            &format!("/company/{}", company_id),
            &e.to_string(),
        )
        .into_response()),
        Err(e) => Err(e.into()),
    }
}
