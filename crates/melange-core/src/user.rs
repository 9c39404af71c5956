use crate::accounts::{is_developer, normalize_account, Account};
use crate::system::RequestContext;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub link_id: String,
    pub account: Account,
    pub name: String,
    #[serde(default)]
    pub is_developer: bool,
}

impl User {
    pub fn new(link_id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            link_id: link_id.into(),
            account: Account::new(email),
            name: name.into(),
            is_developer: false,
        }
    }
}

/// Read access to the registered users.
pub trait UserDirectory {
    fn user_by_link_id(&self, link_id: &str) -> Option<User>;

    /// Matches on the normalized account email.
    fn user_by_account(&self, account: &Account) -> Option<User>;

    /// The user record of whoever is logged in.
    fn current_user(&self, ctx: &RequestContext) -> Option<User> {
        ctx.current_account(true)
            .and_then(|account| self.user_by_account(&account))
    }

    /// Developer status from either the request's admin flag or the user record.
    fn current_user_is_developer(&self, ctx: &RequestContext) -> bool {
        is_developer(ctx, None) || self.current_user(ctx).is_some_and(|u| u.is_developer)
    }
}

impl UserDirectory for [User] {
    fn user_by_link_id(&self, link_id: &str) -> Option<User> {
        self.iter().find(|u| u.link_id == link_id).cloned()
    }

    fn user_by_account(&self, account: &Account) -> Option<User> {
        let wanted = normalize_account(account);
        self.iter()
            .find(|u| normalize_account(&u.account).email == wanted.email)
            .cloned()
    }
}

impl UserDirectory for Vec<User> {
    fn user_by_link_id(&self, link_id: &str) -> Option<User> {
        self.as_slice().user_by_link_id(link_id)
    }

    fn user_by_account(&self, account: &Account) -> Option<User> {
        self.as_slice().user_by_account(account)
    }
}
