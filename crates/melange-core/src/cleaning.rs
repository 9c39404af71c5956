//! Form field cleaners.
//!
//! Every `clean_*` function takes the name of the field it guards (plus any
//! rule parameters) and returns a closure. The closure reads that one field
//! out of the submitted [`FormData`] and answers with the normalized value,
//! `None` when the field is empty or absent, or a [`ValidationError`]
//! attached to the field. Submitted data is never modified.

use crate::accounts::{normalize_account, Account};
use crate::error::ValidationError;
use crate::feed::FeedFetcher;
use crate::system::RequestContext;
use crate::user::{User, UserDirectory};
use crate::validate;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Submitted form values keyed by field name.
pub type FormData = BTreeMap<String, String>;

pub type Cleaned<T> = Result<Option<T>, ValidationError>;

static TAG_RE: OnceLock<Regex> = OnceLock::new();

fn tag_re() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"^[0-9A-Za-z_\-+. ]+$").unwrap())
}

/// The field's value, `None` when absent or empty.
fn value<'a>(form: &'a FormData, field: &str) -> Option<&'a str> {
    form.get(field).map(String::as_str).filter(|v| !v.is_empty())
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::new(field, message)
}

// ---------------------------------------------------------------------------
// Text cleaners
// ---------------------------------------------------------------------------

pub fn clean_empty_field(field: &str) -> impl Fn(&FormData) -> Cleaned<String> + '_ {
    move |form| Ok(value(form, field).map(str::to_string))
}

/// A syntactically valid email, returned as submitted.
pub fn clean_email(field: &str) -> impl Fn(&FormData) -> Cleaned<String> + '_ {
    move |form| {
        let Some(email) = value(form, field) else {
            return Ok(None);
        };
        if !validate::is_email_valid(email) {
            return Err(invalid(field, "Enter a valid email address."));
        }
        Ok(Some(email.to_string()))
    }
}

pub fn clean_link_id(field: &str) -> impl Fn(&FormData) -> Cleaned<String> + '_ {
    move |form| {
        let Some(link_id) = value(form, field) else {
            return Ok(None);
        };
        if !validate::is_link_id_format_valid(link_id) {
            return Err(invalid(
                field,
                "This link ID is in wrong format. It must start with a lowercase letter \
                 and contain only lowercase letters, digits and underscores.",
            ));
        }
        Ok(Some(link_id.to_string()))
    }
}

pub fn clean_scope_path(field: &str) -> impl Fn(&FormData) -> Cleaned<String> + '_ {
    move |form| {
        let Some(scope_path) = value(form, field) else {
            return Ok(None);
        };
        if !validate::is_scope_path_format_valid(scope_path) {
            return Err(invalid(field, "This scope path is in wrong format."));
        }
        Ok(Some(scope_path.to_string()))
    }
}

/// Only ASCII characters survive a shipping label.
pub fn clean_valid_shipping_chars(field: &str) -> impl Fn(&FormData) -> Cleaned<String> + '_ {
    move |form| {
        let Some(text) = value(form, field) else {
            return Ok(None);
        };
        if !text.is_ascii() {
            return Err(invalid(
                field,
                "Invalid characters, only ASCII characters are allowed.",
            ));
        }
        Ok(Some(text.to_string()))
    }
}

/// Character count within `min..=max`.
pub fn clean_content_length(
    field: &str,
    min: usize,
    max: usize,
) -> impl Fn(&FormData) -> Cleaned<String> + '_ {
    move |form| {
        let Some(text) = value(form, field) else {
            return Ok(None);
        };
        let len = text.chars().count();
        if len < min || len > max {
            return Err(invalid(
                field,
                format!("Field must be between {min} and {max} characters long, got {len}."),
            ));
        }
        Ok(Some(text.to_string()))
    }
}

/// Digits only. A leading `+` is rewritten to the `00` international prefix.
pub fn clean_phone_number(field: &str) -> impl Fn(&FormData) -> Cleaned<String> + '_ {
    move |form| {
        let Some(raw) = value(form, field) else {
            return Ok(None);
        };
        let number = match raw.strip_prefix('+') {
            Some(rest) => format!("00{rest}"),
            None => raw.to_string(),
        };
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid(
                field,
                "Only numerical characters are allowed, with an optional leading +.",
            ));
        }
        Ok(Some(number))
    }
}

pub fn clean_url(field: &str) -> impl Fn(&FormData) -> Cleaned<String> + '_ {
    move |form| {
        let Some(url) = value(form, field) else {
            return Ok(None);
        };
        if !validate::is_url_valid(url) {
            return Err(invalid(field, "Enter a valid URL."));
        }
        Ok(Some(url.to_string()))
    }
}

/// A reachable URL serving an RSS, Atom or RDF feed.
pub fn clean_feed_url<'a>(
    field: &'a str,
    fetcher: &'a dyn FeedFetcher,
) -> impl Fn(&FormData) -> Cleaned<String> + 'a {
    move |form| {
        let Some(url) = value(form, field) else {
            return Ok(None);
        };
        if !validate::is_feed_url_valid(url, fetcher) {
            return Err(invalid(field, "This URL is not a valid ATOM or RSS feed."));
        }
        Ok(Some(url.to_string()))
    }
}

/// Strip an outer `<html>` wrapper and refuse scripts from non-developers.
pub fn clean_html_content(
    field: &str,
    developer: bool,
) -> impl Fn(&FormData) -> Cleaned<String> + '_ {
    move |form| {
        let Some(html) = value(form, field) else {
            return Ok(None);
        };
        let content = html
            .strip_prefix("<html>")
            .and_then(|inner| inner.strip_suffix("</html>"))
            .unwrap_or(html);
        if !developer && content.to_ascii_lowercase().contains("<script") {
            return Err(invalid(field, "Scripts are not allowed in this content."));
        }
        Ok(Some(content.to_string()))
    }
}

/// Split on `separator`, trim, drop empty pieces and keep first occurrences.
pub fn str_to_set<'a>(
    field: &'a str,
    separator: &'a str,
) -> impl Fn(&FormData) -> Result<Vec<String>, ValidationError> + 'a {
    move |form| {
        let Some(text) = value(form, field) else {
            return Ok(Vec::new());
        };
        let mut items: Vec<String> = Vec::new();
        for piece in text.split(separator).map(str::trim) {
            if !piece.is_empty() && !items.iter().any(|i| i == piece) {
                items.push(piece.to_string());
            }
        }
        Ok(items)
    }
}

// ---------------------------------------------------------------------------
// User reference cleaners
// ---------------------------------------------------------------------------

pub fn clean_existing_user<'a>(
    field: &'a str,
    users: &'a dyn UserDirectory,
) -> impl Fn(&FormData) -> Cleaned<User> + 'a {
    move |form| {
        let Some(link_id) = value(form, field) else {
            return Ok(None);
        };
        users
            .user_by_link_id(link_id)
            .map(Some)
            .ok_or_else(|| invalid(field, "This user does not exist."))
    }
}

/// The named user must be whoever is logged in.
pub fn clean_user_is_current<'a>(
    field: &'a str,
    users: &'a dyn UserDirectory,
    ctx: &'a RequestContext,
) -> impl Fn(&FormData) -> Cleaned<User> + 'a {
    let existing = clean_existing_user(field, users);
    move |form| {
        let Some(user) = existing(form)? else {
            return Ok(None);
        };
        match users.current_user(ctx) {
            Some(current) if current.link_id == user.link_id => Ok(Some(user)),
            _ => Err(invalid(field, "Enter your own link ID.")),
        }
    }
}

/// The link id must not be taken.
pub fn clean_user_not_exist<'a>(
    field: &'a str,
    users: &'a dyn UserDirectory,
) -> impl Fn(&FormData) -> Cleaned<String> + 'a {
    move |form| {
        let Some(link_id) = value(form, field) else {
            return Ok(None);
        };
        if users.user_by_link_id(link_id).is_some() {
            return Err(invalid(field, "This link ID is already in use."));
        }
        Ok(Some(link_id.to_string()))
    }
}

/// An existing user other than whoever is logged in.
pub fn clean_users_not_same<'a>(
    field: &'a str,
    users: &'a dyn UserDirectory,
    ctx: &'a RequestContext,
) -> impl Fn(&FormData) -> Cleaned<User> + 'a {
    let existing = clean_existing_user(field, users);
    move |form| {
        let Some(user) = existing(form)? else {
            return Ok(None);
        };
        match users.current_user(ctx) {
            Some(current) if current.link_id == user.link_id => {
                Err(invalid(field, "You cannot enter yourself here."))
            }
            _ => Ok(Some(user)),
        }
    }
}

/// The registered account for the email, or a fresh account when nobody
/// uses it. The email is not syntax-checked.
pub fn clean_user_account<'a>(
    field: &'a str,
    users: &'a dyn UserDirectory,
) -> impl Fn(&FormData) -> Cleaned<Account> + 'a {
    move |form| {
        let Some(email) = value(form, field) else {
            return Ok(None);
        };
        let account = normalize_account(&Account::new(email));
        Ok(Some(
            users
                .user_by_account(&account)
                .map(|u| u.account)
                .unwrap_or(account),
        ))
    }
}

pub fn clean_user_account_not_in_use<'a>(
    field: &'a str,
    users: &'a dyn UserDirectory,
) -> impl Fn(&FormData) -> Cleaned<Account> + 'a {
    move |form| {
        let Some(email) = value(form, field) else {
            return Ok(None);
        };
        let account = normalize_account(&Account::new(email));
        if users.user_by_account(&account).is_some() {
            return Err(invalid(
                field,
                format!("There is already a user with this email address: {email}"),
            ));
        }
        Ok(Some(account))
    }
}

// ---------------------------------------------------------------------------
// GSoC
// ---------------------------------------------------------------------------

/// Newline separated tags, each trimmed and limited to plain characters.
pub fn clean_tags_list(field: &str) -> impl Fn(&FormData) -> Result<Vec<String>, ValidationError> + '_ {
    move |form| {
        let Some(text) = value(form, field) else {
            return Ok(Vec::new());
        };
        let tags: Vec<String> = text
            .split('\n')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if let Some(bad) = tags.iter().find(|t| !tag_re().is_match(t)) {
            return Err(invalid(field, format!("Invalid tag: {bad}")));
        }
        Ok(tags)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MelangeError, Result};
    use crate::feed::FeedResponse;

    fn form(field: &str, value: &str) -> FormData {
        BTreeMap::from([(field.to_string(), value.to_string())])
    }

    fn users() -> Vec<User> {
        vec![
            User::new("current_user", "test@example.com", "Current User"),
            User::new("another_user", "another_user@email.com", "Another User"),
        ]
    }

    fn logged_in() -> RequestContext {
        RequestContext {
            user_email: "test@example.com".into(),
            ..RequestContext::default()
        }
    }

    #[test]
    fn empty_field_passes_through() {
        let clean = clean_empty_field("field");
        let data = form("field", "v1_@?");
        assert_eq!(clean(&data).unwrap().as_deref(), Some("v1_@?"));
        assert_eq!(data, form("field", "v1_@?"));
        assert_eq!(clean(&form("field", "")).unwrap(), None);
        assert_eq!(clean(&FormData::new()).unwrap(), None);
    }

    #[test]
    fn email() {
        let clean = clean_email("email");
        assert_eq!(
            clean(&form("email", "test@example.com")).unwrap().as_deref(),
            Some("test@example.com")
        );
        let data = form("email", "#$test&*(");
        let err = clean(&data).unwrap_err();
        assert_eq!(err.field, "email");
        assert_eq!(data, form("email", "#$test&*("));
    }

    #[test]
    fn link_id_and_scope_path() {
        let link_id = clean_link_id("link_id");
        assert_eq!(
            link_id(&form("link_id", "valid_link_id")).unwrap().as_deref(),
            Some("valid_link_id")
        );
        assert!(link_id(&form("link_id", "v1_@?")).is_err());
        assert!(link_id(&form("link_id", "aBc")).is_err());

        let scope = clean_scope_path("scope_path");
        assert_eq!(
            scope(&form("scope_path", "valid_scope_path")).unwrap().as_deref(),
            Some("valid_scope_path")
        );
        assert_eq!(
            scope(&form("scope_path", "google/gsoc2013")).unwrap().as_deref(),
            Some("google/gsoc2013")
        );
        assert!(scope(&form("scope_path", "v1_@?")).is_err());
        assert!(scope(&form("scope_path", "abc/")).is_err());
    }

    #[test]
    fn existing_user() {
        let users = users();
        let clean = clean_existing_user("user", &users);
        assert_eq!(
            clean(&form("user", "current_user")).unwrap().unwrap().link_id,
            "current_user"
        );
        assert!(clean(&form("user", "non_existent_user")).is_err());
    }

    #[test]
    fn user_is_current() {
        let users = users();
        let ctx = logged_in();
        let clean = clean_user_is_current("user", &users, &ctx);
        assert_eq!(
            clean(&form("user", "current_user")).unwrap().unwrap().link_id,
            "current_user"
        );
        assert!(clean(&form("user", "another_user")).is_err());
        assert!(clean(&form("user", "non_existent_user")).is_err());
    }

    #[test]
    fn user_not_exist() {
        let users = users();
        let clean = clean_user_not_exist("user", &users);
        assert_eq!(
            clean(&form("user", "non_existent_user")).unwrap().as_deref(),
            Some("non_existent_user")
        );
        assert!(clean(&form("user", "current_user")).is_err());
    }

    #[test]
    fn users_not_same() {
        let users = users();
        let ctx = logged_in();
        let clean = clean_users_not_same("not_current_user", &users, &ctx);
        assert!(clean(&form("not_current_user", "current_user")).is_err());
        assert_eq!(
            clean(&form("not_current_user", "another_user"))
                .unwrap()
                .unwrap()
                .link_id,
            "another_user"
        );
        assert!(clean(&form("not_current_user", "non_existent_user")).is_err());
    }

    #[test]
    fn user_account() {
        let users = users();
        let clean = clean_user_account("user_account", &users);
        assert_eq!(
            clean(&form("user_account", "user_name@email.com"))
                .unwrap()
                .unwrap()
                .email,
            "user_name@email.com"
        );
        let existing = clean(&form("user_account", "test@example.com"))
            .unwrap()
            .unwrap();
        assert_eq!(existing, users[0].account);
        assert_eq!(
            clean(&form("user_account", "invalid_*mail"))
                .unwrap()
                .unwrap()
                .email,
            "invalid_*mail"
        );
    }

    #[test]
    fn user_account_not_in_use() {
        let users = users();
        let clean = clean_user_account_not_in_use("user_account_not_in_use", &users);
        assert_eq!(
            clean(&form("user_account_not_in_use", "user_name@email.com"))
                .unwrap()
                .unwrap()
                .email,
            "user_name@email.com"
        );
        assert!(clean(&form("user_account_not_in_use", "test@example.com")).is_err());
        assert_eq!(
            clean(&form("user_account_not_in_use", "invalid_*mail"))
                .unwrap()
                .unwrap()
                .email,
            "invalid_*mail"
        );
    }

    #[test]
    fn shipping_chars() {
        let clean = clean_valid_shipping_chars("ascii");
        assert_eq!(clean(&form("ascii", "ab12")).unwrap().as_deref(), Some("ab12"));
        assert!(clean(&form("ascii", "\u{a000}")).is_err());
    }

    #[test]
    fn content_length() {
        let clean = clean_content_length("content_length", 3, 5);
        assert_eq!(
            clean(&form("content_length", "a1&")).unwrap().as_deref(),
            Some("a1&")
        );
        assert!(clean(&form("content_length", "ab")).is_err());
        assert!(clean(&form("content_length", "ab12&*")).is_err());
    }

    #[test]
    fn phone_number() {
        let clean = clean_phone_number("phone");
        assert_eq!(
            clean(&form("phone", "0010208636479")).unwrap().as_deref(),
            Some("0010208636479")
        );
        assert!(clean(&form("phone", "001-020-8636479")).is_err());
        assert_eq!(
            clean(&form("phone", "+10208636479")).unwrap().as_deref(),
            Some("0010208636479")
        );
        assert!(clean(&form("phone", "1+0208636479")).is_err());
        assert!(clean(&form("phone", "10208636479+")).is_err());
    }

    struct Feeds;

    impl FeedFetcher for Feeds {
        fn fetch(&self, url: &str) -> Result<FeedResponse> {
            match url {
                "http://rss.cnn.com/rss/edition.rss" => Ok(FeedResponse {
                    status: 200,
                    body: "<rss version=\"2.0\"></rss>".into(),
                }),
                "http://example.com/invalidfeed/" => Ok(FeedResponse {
                    status: 404,
                    body: String::new(),
                }),
                _ => Err(MelangeError::Fetch("unreachable".into())),
            }
        }
    }

    #[test]
    fn feed_url() {
        let clean = clean_feed_url("feed_url", &Feeds);
        assert_eq!(
            clean(&form("feed_url", "http://rss.cnn.com/rss/edition.rss"))
                .unwrap()
                .as_deref(),
            Some("http://rss.cnn.com/rss/edition.rss")
        );
        assert_eq!(clean(&form("feed_url", "")).unwrap(), None);
        assert!(clean(&form("feed_url", "http://example.com/invalidfeed/")).is_err());
    }

    #[test]
    fn html_content() {
        let clean = clean_html_content("html", false);
        assert_eq!(
            clean(&form("html", "<div>f9-+@4</div>")).unwrap().as_deref(),
            Some("<div>f9-+@4</div>")
        );
        assert_eq!(
            clean(&form("html", "<html>f9-+@4</html>")).unwrap().as_deref(),
            Some("f9-+@4")
        );
        assert_eq!(
            clean(&form("html", "\u{a000}")).unwrap().as_deref(),
            Some("\u{a000}")
        );
        assert!(clean(&form("html", "<script></script>")).is_err());

        let mut users = users();
        users[0].is_developer = true;
        let developer = users.current_user_is_developer(&logged_in());
        let clean = clean_html_content("html", developer);
        assert_eq!(
            clean(&form("html", "<script></script>")).unwrap().as_deref(),
            Some("<script></script>")
        );
    }

    #[test]
    fn url() {
        let clean = clean_url("url");
        assert_eq!(
            clean(&form("url", "http://exampleabc.com/")).unwrap().as_deref(),
            Some("http://exampleabc.com/")
        );
        assert_eq!(clean(&form("url", "")).unwrap(), None);
        assert!(clean(&form("url", "exampleabc")).is_err());
    }

    #[test]
    fn string_to_set() {
        let comma = str_to_set("string_field", ",");
        assert_eq!(
            comma(&form("string_field", "a,b,c")).unwrap(),
            vec!["a", "b", "c"]
        );
        assert_eq!(comma(&form("string_field", "a")).unwrap(), vec!["a"]);
        assert_eq!(
            comma(&form("string_field", "a, b, c, a")).unwrap(),
            vec!["a", "b", "c"]
        );

        let space = str_to_set("string_field", " ");
        assert_eq!(
            space(&form("string_field", "a b c")).unwrap(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn tags_list() {
        let clean = clean_tags_list("tags");
        assert_eq!(
            clean(&form("tags", "python\ndjango\ntesting")).unwrap(),
            vec!["python", "django", "testing"]
        );
        assert_eq!(
            clean(&form("tags", "python  \n  django\n testing")).unwrap(),
            vec!["python", "django", "testing"]
        );
        assert!(clean(&form("tags", "python\n &%tag \n#^ase")).is_err());
    }
}
