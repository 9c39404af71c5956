use super::Invocation;
use crate::output::{fmt_time, print_json, print_table};
use clap::Subcommand;
use melange_core::request::RequestAction;
use melange_core::types::{RequestKind, Role};
use std::path::Path;

#[derive(Subcommand)]
pub enum RequestSubcommand {
    /// Ask for a role (request) or offer one (invitation)
    Create {
        /// request or invitation
        #[arg(long, default_value = "request")]
        kind: String,
        /// mentor or org_admin
        #[arg(long)]
        role: String,
        #[arg(long)]
        org: String,
        /// Profile that would receive the role (default: the acting profile)
        #[arg(long)]
        user: Option<String>,
    },

    /// Accept, reject, withdraw or resubmit a request
    Act {
        id: String,
        /// accept, reject, withdraw or resubmit
        action: String,
    },

    /// List requests and invitations
    List {
        #[arg(long)]
        org: Option<String>,
        /// Only requests concerning this profile
        #[arg(long)]
        user: Option<String>,
    },
}

pub fn run(
    root: &Path,
    subcmd: RequestSubcommand,
    inv: &Invocation,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        RequestSubcommand::Create {
            kind,
            role,
            org,
            user,
        } => create(root, &kind, &role, &org, user.as_deref(), inv, json),
        RequestSubcommand::Act { id, action } => act(root, &id, &action, inv, json),
        RequestSubcommand::List { org, user } => list(root, org.as_deref(), user.as_deref(), json),
    }
}

fn create(
    root: &Path,
    kind: &str,
    role: &str,
    org: &str,
    user: Option<&str>,
    inv: &Invocation,
    json: bool,
) -> anyhow::Result<()> {
    let (mut reg, config) = super::load(root)?;
    let kind: RequestKind = kind.parse()?;
    let role: Role = role.parse()?;
    let sender = super::actor(&reg, &config, inv)?;
    let user = user.unwrap_or(&sender).to_string();

    let id = reg.create_request(kind, role, &sender, &user, org, inv.now)?;
    super::save(root, &mut reg)?;

    if json {
        return print_json(reg.request(&id)?);
    }
    println!("Created {kind} {id}: {user} as {role} of {org}");
    Ok(())
}

fn act(root: &Path, id: &str, action: &str, inv: &Invocation, json: bool) -> anyhow::Result<()> {
    let (mut reg, config) = super::load(root)?;
    let action: RequestAction = action.parse()?;
    let actor = super::actor(&reg, &config, inv)?;

    let status = reg.act_on_request(id, &actor, action, inv.now)?;
    super::save(root, &mut reg)?;

    if json {
        return print_json(reg.request(id)?);
    }
    println!("{id} is now {status}");
    Ok(())
}

fn list(root: &Path, org: Option<&str>, user: Option<&str>, json: bool) -> anyhow::Result<()> {
    let (reg, _) = super::load(root)?;
    let requests: Vec<_> = reg
        .requests
        .iter()
        .filter(|r| org.map_or(true, |o| r.org == o))
        .filter(|r| user.map_or(true, |u| r.user == u))
        .collect();

    if json {
        return print_json(&requests);
    }

    let rows: Vec<Vec<String>> = requests
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                r.kind.to_string(),
                r.user.clone(),
                r.role.to_string(),
                r.org.clone(),
                r.status.to_string(),
                fmt_time(r.modified_at.or(Some(r.created_at))),
            ]
        })
        .collect();
    print_table(
        &["ID", "KIND", "USER", "ROLE", "ORG", "STATUS", "UPDATED"],
        &rows,
        "No requests.",
    );
    Ok(())
}
