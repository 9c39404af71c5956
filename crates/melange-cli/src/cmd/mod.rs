pub mod accept;
pub mod clean;
pub mod config;
pub mod init;
pub mod mail;
pub mod org;
pub mod profile;
pub mod proposal;
pub mod request;
pub mod task;
pub mod timeline;

use anyhow::Context;
use chrono::{DateTime, Utc};
use melange_core::{config::Config, store::Registry, system::RequestContext};
use std::path::Path;

/// Per-invocation settings shared by every subcommand.
pub struct Invocation {
    /// Profile key given with `--as`.
    pub actor: Option<String>,
    pub now: DateTime<Utc>,
}

pub fn load(root: &Path) -> anyhow::Result<(Registry, Config)> {
    let registry = Registry::load(root).context("failed to load .melange/state.yaml")?;
    let config = Config::load(root).context("failed to load .melange/config.yaml")?;
    Ok((registry, config))
}

pub fn save(root: &Path, registry: &mut Registry) -> anyhow::Result<()> {
    registry
        .save(root)
        .context("failed to write .melange/state.yaml")
}

/// The configured request context with `MELANGE_*` environment overrides.
pub fn request_context(config: &Config) -> RequestContext {
    let mut ctx = config.context.clone();
    let env = |name: &str| std::env::var(name).ok();
    if let Some(v) = env("MELANGE_USER_EMAIL") {
        ctx.user_email = v;
    }
    if let Some(v) = env("MELANGE_USER_ID") {
        ctx.user_id = v;
    }
    if let Some(v) = env("MELANGE_USER_IS_ADMIN") {
        ctx.user_is_admin = matches!(v.as_str(), "1" | "true" | "yes");
    }
    if let Some(v) = env("MELANGE_APPLICATION_ID") {
        ctx.application_id = v;
    }
    if let Some(v) = env("MELANGE_HOST") {
        ctx.host = v;
    }
    if let Some(v) = env("MELANGE_VERSION") {
        ctx.version = v;
    }
    if let Some(v) = env("MELANGE_SERVER_SOFTWARE") {
        ctx.server_software = v;
    }
    ctx
}

/// Profile key to act as: `--as`, else the logged-in user's profile.
pub fn actor(registry: &Registry, config: &Config, inv: &Invocation) -> anyhow::Result<String> {
    if let Some(key) = &inv.actor {
        registry.profile(key)?;
        return Ok(key.clone());
    }
    let ctx = request_context(config);
    let profile = registry
        .profile_for_context(&ctx)
        .context("no acting profile: pass --as <profile> or set MELANGE_USER_EMAIL")?;
    Ok(profile.key.clone())
}
