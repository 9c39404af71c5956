use crate::output::{print_json, print_table};
use clap::Subcommand;
use melange_core::types::Role;
use std::path::Path;

#[derive(Subcommand)]
pub enum ProfileSubcommand {
    /// Register a user and their profile in the program
    Add {
        /// Profile key, also used as the user's link id
        key: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        /// Register as a student
        #[arg(long)]
        student: bool,
    },

    /// Grant an organization role directly
    Grant {
        profile: String,
        #[arg(long)]
        org: String,
        /// mentor or org_admin
        #[arg(long)]
        role: String,
    },

    /// List profiles
    List {
        /// Only mentors and admins of this organization
        #[arg(long)]
        org: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: ProfileSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProfileSubcommand::Add {
            key,
            email,
            name,
            student,
        } => add(root, &key, &email, &name, student, json),
        ProfileSubcommand::Grant { profile, org, role } => grant(root, &profile, &org, &role, json),
        ProfileSubcommand::List { org } => list(root, org.as_deref(), json),
    }
}

fn add(
    root: &Path,
    key: &str,
    email: &str,
    name: &str,
    student: bool,
    json: bool,
) -> anyhow::Result<()> {
    let (mut reg, _) = super::load(root)?;
    reg.register(key, email, name, student)?;
    super::save(root, &mut reg)?;

    if json {
        return print_json(reg.profile(key)?);
    }
    let kind = if student { "student" } else { "member" };
    println!("Registered {kind} {key}");
    Ok(())
}

fn grant(root: &Path, profile: &str, org: &str, role: &str, json: bool) -> anyhow::Result<()> {
    let (mut reg, _) = super::load(root)?;
    let role: Role = role.parse()?;
    reg.grant_role(profile, org, role)?;
    super::save(root, &mut reg)?;

    if json {
        return print_json(reg.profile(profile)?);
    }
    println!("Granted {role} of {org} to {profile}");
    Ok(())
}

fn list(root: &Path, org: Option<&str>, json: bool) -> anyhow::Result<()> {
    let (reg, _) = super::load(root)?;
    let profiles: Vec<_> = match org {
        Some(org) => {
            reg.org(org)?;
            let keys = melange_core::profile::all_mentor_keys_for_org(&reg.profiles, org);
            reg.profiles.iter().filter(|p| keys.contains(&p.key)).collect()
        }
        None => reg.profiles.iter().collect(),
    };

    if json {
        return print_json(&profiles);
    }

    let rows: Vec<Vec<String>> = profiles
        .iter()
        .map(|p| {
            let roles = if p.is_student {
                "student".to_string()
            } else {
                let mut roles: Vec<String> =
                    p.org_admin_for.iter().map(|o| format!("{o}:org_admin")).collect();
                roles.extend(
                    p.mentor_for
                        .iter()
                        .filter(|o| !p.is_org_admin_for(o))
                        .map(|o| format!("{o}:mentor")),
                );
                roles.join(",")
            };
            vec![p.key.clone(), p.name.clone(), p.email.clone(), roles]
        })
        .collect();
    print_table(&["KEY", "NAME", "EMAIL", "ROLES"], &rows, "No profiles.");
    Ok(())
}
