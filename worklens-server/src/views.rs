//! Server-rendered HTML
//!
//! Plain format!-built markup, unstyled on purpose. Every user-supplied
//! string goes through [`escape`] before it reaches a page.

use axum::response::Html;
use worklens_core::{Company, Review, User, UserDetails};

/// Escape text for interpolation into HTML
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Shared page shell
fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{} - Worklens</title></head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    ))
}

fn message_banner(message: Option<&str>) -> String {
    match message {
        Some(msg) => format!("<p class=\"message\">{}</p>\n", escape(msg)),
        None => String::new(),
    }
}

/// Login form, the entry point for signed-out visitors
pub fn login_page(message: Option<&str>) -> Html<String> {
    let body = format!(
        "{}<h1>Log in</h1>\n\
         <form method=\"post\" action=\"/login\">\n\
         <label>Email <input type=\"email\" name=\"email\" required></label><br>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label><br>\n\
         <button type=\"submit\">Log in</button>\n\
         </form>\n\
         <p><a href=\"/signup\">Sign up</a></p>",
        message_banner(message)
    );
    page("Log in", &body)
}

pub fn signup_page(message: Option<&str>) -> Html<String> {
    let body = format!(
        "{}<h1>Sign up</h1>\n\
         <form method=\"post\" action=\"/signup\">\n\
         <label>First name <input name=\"first_name\" required></label><br>\n\
         <label>Last name <input name=\"last_name\" required></label><br>\n\
         <label>Email <input type=\"email\" name=\"email\" required></label><br>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label><br>\n\
         <button type=\"submit\">Sign up</button>\n\
         </form>\n\
         <p><a href=\"/login\">Log in</a></p>",
        message_banner(message)
    );
    page("Sign up", &body)
}

/// Signed-in home: greeting plus the company directory
pub fn home_page(user: &User, companies: &[Company]) -> Html<String> {
    let mut rows = String::new();
    for company in companies {
        rows.push_str(&format!(
            "<li><a href=\"/company/{}\">{}</a> - {} - {:.1} stars ({} reviews)</li>\n",
            company.id,
            escape(&company.name),
            escape(&company.location),
            company.average_rating,
            company.review_count
        ));
    }
    if rows.is_empty() {
        rows = "<li>No companies listed yet.</li>\n".to_string();
    }

    let body = format!(
        "<h1>Welcome, {}!</h1>\n\
         <p><a href=\"/profile\">Profile</a> | <a href=\"/create_listing\">Add a company</a> | <a href=\"/logout\">Log out</a></p>\n\
         <h2>Companies</h2>\n<ul>\n{}</ul>",
        escape(&user.full_name()),
        rows
    );
    page("Home", &body)
}

pub fn profile_page(user: &User, details: Option<&UserDetails>) -> Html<String> {
    let field = |value: Option<&String>| escape(value.map(String::as_str).unwrap_or(""));
    let (location, degree_type, school, expected_graduation) = match details {
        Some(d) => (
            field(d.location.as_ref()),
            field(d.degree_type.as_ref()),
            field(d.school.as_ref()),
            field(d.expected_graduation.as_ref()),
        ),
        None => Default::default(),
    };

    let body = format!(
        "<h1>Profile of {}</h1>\n\
         <form method=\"post\" action=\"/profile\">\n\
         <label>Location <input name=\"location\" value=\"{location}\"></label><br>\n\
         <label>Degree type <input name=\"degree_type\" value=\"{degree_type}\"></label><br>\n\
         <label>School <input name=\"school\" value=\"{school}\"></label><br>\n\
         <label>Expected graduation <input name=\"expected_graduation\" value=\"{expected_graduation}\"></label><br>\n\
         <button type=\"submit\">Save</button>\n\
         </form>\n\
         <p><a href=\"/\">Home</a></p>",
        escape(&user.full_name()),
    );
    page("Profile", &body)
}

pub fn create_listing_page() -> Html<String> {
    let body = "<h1>Add a company</h1>\n\
         <form method=\"post\" action=\"/create_listing\">\n\
         <label>Company name <input name=\"company_name\" required></label><br>\n\
         <label>Location <input name=\"location\" required></label><br>\n\
         <label>Website <input name=\"website\" required></label><br>\n\
         <button type=\"submit\">Create</button>\n\
         </form>\n\
         <p><a href=\"/\">Home</a></p>"
        .to_string();
    page("Add a company", &body)
}

/// Company page: details, derived statistics, the review form, and every
/// review newest first
pub fn company_page(company: &Company, reviews: &[Review], message: Option<&str>) -> Html<String> {
    let mut review_items = String::new();
    for review in reviews {
        let text = review
            .description
            .as_deref()
            .map(escape)
            .unwrap_or_else(|| "<em>(no comment)</em>".to_string());
        review_items.push_str(&format!(
            "<li>{} / 5 - {} <small>({})</small></li>\n",
            review.rating,
            text,
            review.created_at.format("%Y-%m-%d")
        ));
    }
    if review_items.is_empty() {
        review_items = "<li>No reviews yet.</li>\n".to_string();
    }

    let body = format!(
        "{}<h1>{}</h1>\n\
         <p>{} - <a href=\"{}\">{}</a></p>\n\
         <p>Average rating: {:.1} out of 5 ({} reviews)</p>\n\
         <h2>Leave a review</h2>\n\
         <form method=\"post\" action=\"/company/{}\">\n\
         <label>Rating <select name=\"rating\">\
         <option>5</option><option>4</option><option>3</option><option>2</option><option>1</option>\
         </select></label><br>\n\
         <label>Review <textarea name=\"review_text\"></textarea></label><br>\n\
         <button type=\"submit\">Submit</button>\n\
         </form>\n\
         <h2>Reviews</h2>\n<ul>\n{}</ul>\n\
         <p><a href=\"/\">Home</a></p>",
        message_banner(message),
        escape(&company.name),
        escape(&company.location),
        escape(&company.website),
        escape(&company.website),
        company.average_rating,
        company.review_count,
        company.id,
        review_items
    );
    page(&company.name, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_user_content_is_escaped_on_company_page() {
        let company = Company::new(
            Uuid::new_v4(),
            "<script>alert(1)</script>",
            "Boston",
            "https://x.test",
        );
        let Html(html) = company_page(&company, &[], None);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_home_page_lists_companies() {
        let user = User::new(Uuid::new_v4(), "Ada", "Lovelace", "a@x.com", "hash");
        let company = Company::new(Uuid::new_v4(), "Acme", "Boston", "https://acme.test");
        let Html(html) = home_page(&user, std::slice::from_ref(&company));
        assert!(html.contains("Welcome, Ada Lovelace!"));
        assert!(html.contains(&format!("/company/{}", company.id)));
    }

    #[test]
    fn test_login_page_shows_message() {
        let Html(html) = login_page(Some("Incorrect password"));
        assert!(html.contains("Incorrect password"));

        let Html(html) = login_page(None);
        assert!(!html.contains("class=\"message\""));
    }
}
