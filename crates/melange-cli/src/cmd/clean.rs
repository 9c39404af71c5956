use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use melange_core::cleaning::{self, FormData};
use melange_core::error::ValidationError;
use melange_core::feed::HttpFeedFetcher;
use melange_core::store::Registry;
use melange_core::user::{User, UserDirectory};
use serde_json::{json, Value};
use std::path::Path;

const FIELD: &str = "value";

const CLEANERS: &[&str] = &[
    "empty",
    "email",
    "link_id",
    "scope_path",
    "shipping_chars",
    "content_length",
    "phone_number",
    "url",
    "feed_url",
    "html_content",
    "set",
    "tags",
    "existing_user",
    "user_is_current",
    "user_not_exist",
    "users_not_same",
    "user_account",
    "user_account_not_in_use",
];

#[derive(Args)]
pub struct CleanArgs {
    /// Cleaner to run, e.g. link_id, email, phone_number, tags
    pub cleaner: String,
    /// Submitted value; an empty string counts as not submitted
    #[arg(default_value = "")]
    pub value: String,
    /// Minimum length for content_length
    #[arg(long, default_value_t = 0)]
    pub min: usize,
    /// Maximum length for content_length
    #[arg(long, default_value_t = 500)]
    pub max: usize,
    /// Separator for set
    #[arg(long, default_value = ",")]
    pub separator: String,
    /// Allow scripts in html_content
    #[arg(long)]
    pub developer: bool,
}

pub fn run(root: &Path, args: CleanArgs, json: bool) -> anyhow::Result<()> {
    let form: FormData = [(FIELD.to_string(), args.value.clone())].into();

    // Cleaners that look users up read them from the program if there is one.
    let registry = Registry::load(root).ok();
    let no_users: Vec<User> = Vec::new();
    let users: &dyn UserDirectory = match &registry {
        Some(reg) => reg,
        None => &no_users,
    };
    let config = melange_core::config::Config::load(root).unwrap_or_default();
    let ctx = super::request_context(&config);

    let result: Result<Value, ValidationError> = match args.cleaner.replace('-', "_").as_str() {
        "empty" => cleaning::clean_empty_field(FIELD)(&form).map(|v| json!(v)),
        "email" => cleaning::clean_email(FIELD)(&form).map(|v| json!(v)),
        "link_id" => cleaning::clean_link_id(FIELD)(&form).map(|v| json!(v)),
        "scope_path" => cleaning::clean_scope_path(FIELD)(&form).map(|v| json!(v)),
        "shipping_chars" => cleaning::clean_valid_shipping_chars(FIELD)(&form).map(|v| json!(v)),
        "content_length" => {
            cleaning::clean_content_length(FIELD, args.min, args.max)(&form).map(|v| json!(v))
        }
        "phone_number" => cleaning::clean_phone_number(FIELD)(&form).map(|v| json!(v)),
        "url" => cleaning::clean_url(FIELD)(&form).map(|v| json!(v)),
        "feed_url" => {
            let fetcher = HttpFeedFetcher::new().context("failed to build HTTP client")?;
            let clean = cleaning::clean_feed_url(FIELD, &fetcher);
            let cleaned = clean(&form).map(|v| json!(v));
            cleaned
        }
        "html_content" => {
            cleaning::clean_html_content(FIELD, args.developer)(&form).map(|v| json!(v))
        }
        "set" => cleaning::str_to_set(FIELD, &args.separator)(&form).map(|v| json!(v)),
        "tags" => cleaning::clean_tags_list(FIELD)(&form).map(|v| json!(v)),
        "existing_user" => {
            cleaning::clean_existing_user(FIELD, users)(&form).map(|u| json!(u.map(|u| u.link_id)))
        }
        "user_is_current" => cleaning::clean_user_is_current(FIELD, users, &ctx)(&form)
            .map(|u| json!(u.map(|u| u.link_id))),
        "user_not_exist" => cleaning::clean_user_not_exist(FIELD, users)(&form).map(|v| json!(v)),
        "users_not_same" => cleaning::clean_users_not_same(FIELD, users, &ctx)(&form)
            .map(|u| json!(u.map(|u| u.link_id))),
        "user_account" => cleaning::clean_user_account(FIELD, users)(&form)
            .map(|a| json!(a.map(|a| a.email))),
        "user_account_not_in_use" => cleaning::clean_user_account_not_in_use(FIELD, users)(&form)
            .map(|a| json!(a.map(|a| a.email))),
        other => anyhow::bail!("unknown cleaner: {other} (known: {})", CLEANERS.join(", ")),
    };

    match result {
        Ok(cleaned) => {
            if json {
                print_json(&json!({ "valid": true, "cleaned": cleaned }))?;
            } else {
                match &cleaned {
                    Value::Null => println!("(empty)"),
                    Value::String(s) => println!("{s}"),
                    other => println!("{other}"),
                }
            }
            Ok(())
        }
        Err(e) => {
            if json {
                print_json(&json!({ "valid": false, "error": e.message }))?;
            }
            Err(anyhow::Error::new(e).context(format!("{} rejected the value", args.cleaner)))
        }
    }
}
