//! Request-scoped system facts.
//!
//! Everything the hosting environment would otherwise expose through process
//! state (logged-in user, host header, application id, deployed version) is
//! carried in a [`RequestContext`] value and passed in explicitly.

use crate::accounts::{normalize_account, Account};
use crate::error::{MelangeError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Email of the logged-in user, empty when nobody is logged in.
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_is_admin: bool,
    #[serde(default)]
    pub application_id: String,
    /// Raw `Host` header of the request.
    #[serde(default)]
    pub host: String,
    /// Deployed version identifier, `<melange version>.<deploy suffix>`.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub server_software: String,
    #[serde(default)]
    pub debug: bool,
}

/// Site-wide settings relevant to host resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub link_id: String,
    #[serde(default)]
    pub hostname: String,
}

impl RequestContext {
    /// The logged-in account, lowercased when `normalize` is set.
    pub fn current_account(&self, normalize: bool) -> Option<Account> {
        if self.user_email.is_empty() {
            return None;
        }
        let account = Account::new(self.user_email.clone());
        Some(if normalize {
            normalize_account(&account)
        } else {
            account
        })
    }

    pub fn current_user_id(&self) -> Option<&str> {
        (!self.user_id.is_empty()).then_some(self.user_id.as_str())
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// `<name>@<app id>.appspotmail.com`. Fails without an application id.
    pub fn application_email(&self, name: &str) -> Result<String> {
        if self.application_id.is_empty() {
            return Err(MelangeError::MissingApplicationId);
        }
        Ok(format!("{name}@{}.appspotmail.com", self.application_id))
    }

    pub fn application_no_reply_email(&self) -> Result<String> {
        self.application_email("no-reply")
    }

    pub fn raw_hostname(&self) -> &str {
        &self.host
    }

    /// The site's configured hostname, falling back to the raw host.
    pub fn hostname<'a>(&'a self, site: Option<&'a Site>) -> &'a str {
        match site {
            Some(site) if !site.hostname.is_empty() => &site.hostname,
            _ => self.raw_hostname(),
        }
    }

    pub fn secure_hostname(&self) -> String {
        format!("{}.appspot.com", self.application_id)
    }

    /// The request arrived through the site's configured alternate hostname.
    pub fn is_secondary_hostname(&self, site: Option<&Site>) -> bool {
        match site {
            Some(site) if !site.hostname.is_empty() => self.host.contains(&site.hostname),
            _ => false,
        }
    }

    pub fn app_version(&self) -> &str {
        &self.version
    }

    /// The version up to the first `.`.
    pub fn melange_version(&self) -> &str {
        self.version.split('.').next().unwrap_or_default()
    }

    pub fn is_local(&self) -> bool {
        self.server_software.starts_with("Development")
    }

    pub fn is_debug(&self) -> bool {
        self.debug || self.is_local()
    }
}
