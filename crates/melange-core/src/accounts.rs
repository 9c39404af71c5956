use crate::system::RequestContext;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_AUTH_DOMAIN: &str = "gmail.com";

/// A login account, identified by its email.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_domain: Option<String>,
}

impl Account {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            auth_domain: None,
        }
    }

    pub fn with_auth_domain(mut self, domain: impl Into<String>) -> Self {
        self.auth_domain = Some(domain.into());
        self
    }

    pub fn auth_domain(&self) -> &str {
        self.auth_domain.as_deref().unwrap_or(DEFAULT_AUTH_DOMAIN)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

/// Lowercase the email. Malformed emails pass through untouched otherwise.
pub fn normalize_account(account: &Account) -> Account {
    Account {
        email: account.email.to_lowercase(),
        auth_domain: account.auth_domain.clone(),
    }
}

/// Qualify a bare account name with its auth domain.
pub fn denormalize_account(account: &Account) -> Account {
    let email = if account.email.contains('@') {
        account.email.clone()
    } else {
        format!("{}@{}", account.email, account.auth_domain())
    };
    Account {
        email,
        auth_domain: account.auth_domain.clone(),
    }
}

/// True only when someone is logged in and the request carries the admin flag.
///
/// With `account` given, it must also be the logged-in account.
pub fn is_developer(ctx: &RequestContext, account: Option<&Account>) -> bool {
    let Some(current) = ctx.current_account(false) else {
        return false;
    };
    if !ctx.user_is_admin {
        return false;
    }
    match account {
        Some(account) => normalize_account(account) == normalize_account(&current),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(email: &str, admin: bool) -> RequestContext {
        RequestContext {
            user_email: email.to_string(),
            user_is_admin: admin,
            ..RequestContext::default()
        }
    }

    #[test]
    fn normalize_lowercases() {
        let account = Account::new("TEST1@example.com");
        assert_eq!(normalize_account(&account).email, "test1@example.com");

        for invalid in ["test", "test@example", "test#/1$@example.com"] {
            assert_eq!(normalize_account(&Account::new(invalid)).email, invalid);
        }
    }

    #[test]
    fn denormalize_appends_domain() {
        assert_eq!(
            denormalize_account(&Account::new("test@example.com")).email,
            "test@example.com"
        );
        assert_eq!(
            denormalize_account(&Account::new("test")).email,
            "test@gmail.com"
        );
        let scoped = Account::new("test").with_auth_domain("example.com");
        assert_eq!(denormalize_account(&scoped).email, "test@example.com");
    }

    #[test]
    fn developer_requires_login_and_admin() {
        let account = Account::new("test@example.com");

        let c = ctx("test@example.com", false);
        assert!(!is_developer(&c, None));
        assert!(!is_developer(&c, Some(&account)));

        let c = ctx("test@example.com", true);
        assert!(is_developer(&c, None));
        assert!(is_developer(&c, Some(&account)));
        assert!(!is_developer(&c, Some(&Account::new("other@example.com"))));

        assert!(!is_developer(&ctx("", false), None));
        assert!(!is_developer(&ctx("", true), None));
    }
}
