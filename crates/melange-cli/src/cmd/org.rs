use crate::output::{print_json, print_table};
use clap::Subcommand;
use melange_core::dicts::to_dict;
use melange_core::organization::Organization;
use melange_core::slots::{accepted_slots_transferred, slot_transfers_for_org};
use melange_core::types::OrgStatus;
use std::path::Path;

const ORG_FIELDS: &[&str] = &["key", "name", "status", "slots", "task_quota_limit"];

#[derive(Subcommand)]
pub enum OrgSubcommand {
    /// Register an organization in the program
    Add {
        /// Organization key (link id)
        key: String,
        #[arg(long)]
        name: String,
        /// GSoC proposal slots
        #[arg(long, default_value_t = 0)]
        slots: u32,
        /// GCI task quota
        #[arg(long, default_value_t = 0)]
        quota: u32,
        /// Register the organization as inactive
        #[arg(long)]
        inactive: bool,
    },

    /// List organizations
    List {
        /// Only organizations participating in the program
        #[arg(long)]
        participating: bool,
    },

    /// File or settle a slot transfer
    Transfer {
        org: String,
        /// Number of slots handed back (filing a new transfer)
        #[arg(long, conflicts_with_all = ["accept", "reject"])]
        slots: Option<u32>,
        #[arg(long, default_value = "")]
        remarks: String,
        /// Accept the oldest pending transfer
        #[arg(long, conflicts_with = "reject")]
        accept: bool,
        /// Reject the oldest pending transfer
        #[arg(long)]
        reject: bool,
    },

    /// List slot transfers of an organization
    Transfers { org: String },
}

pub fn run(root: &Path, subcmd: OrgSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        OrgSubcommand::Add {
            key,
            name,
            slots,
            quota,
            inactive,
        } => add(root, &key, &name, slots, quota, inactive, json),
        OrgSubcommand::List { participating } => list(root, participating, json),
        OrgSubcommand::Transfer {
            org,
            slots,
            remarks,
            accept,
            reject,
        } => transfer(root, &org, slots, &remarks, accept, reject, json),
        OrgSubcommand::Transfers { org } => transfers(root, &org, json),
    }
}

fn add(
    root: &Path,
    key: &str,
    name: &str,
    slots: u32,
    quota: u32,
    inactive: bool,
    json: bool,
) -> anyhow::Result<()> {
    let (mut reg, _) = super::load(root)?;
    let mut org = Organization::new(key, reg.program.key.clone(), name);
    org.slots = slots;
    org.task_quota_limit = quota;
    if inactive {
        org.status = OrgStatus::Inactive;
    }
    reg.add_org(org)?;
    super::save(root, &mut reg)?;

    if json {
        return print_json(&to_dict(reg.org(key)?, ORG_FIELDS));
    }
    println!("Added organization {key}");
    Ok(())
}

fn list(root: &Path, participating: bool, json: bool) -> anyhow::Result<()> {
    let (reg, _) = super::load(root)?;
    let orgs: Vec<&Organization> = if participating {
        reg.participating_orgs()
    } else {
        reg.orgs.iter().collect()
    };

    if json {
        let dicts: Vec<_> = orgs.iter().map(|o| to_dict(*o, ORG_FIELDS)).collect();
        return print_json(&dicts);
    }

    let rows: Vec<Vec<String>> = orgs
        .iter()
        .map(|o| {
            let quota = reg
                .remaining_task_quota(&o.key)
                .map(|q| q.to_string())
                .unwrap_or_default();
            vec![
                o.key.clone(),
                o.name.clone(),
                o.status.to_string(),
                o.slots.to_string(),
                format!("{quota}/{}", o.task_quota_limit),
            ]
        })
        .collect();
    print_table(
        &["KEY", "NAME", "STATUS", "SLOTS", "QUOTA LEFT"],
        &rows,
        "No organizations.",
    );
    Ok(())
}

fn transfer(
    root: &Path,
    org: &str,
    slots: Option<u32>,
    remarks: &str,
    accept: bool,
    reject: bool,
    json: bool,
) -> anyhow::Result<()> {
    let (mut reg, _) = super::load(root)?;
    let verb = match (slots, accept, reject) {
        (Some(n), _, _) => {
            reg.request_slot_transfer(org, n, remarks)?;
            "requested"
        }
        (None, true, _) => {
            reg.resolve_slot_transfer(org, true)?;
            "accepted"
        }
        (None, _, true) => {
            reg.resolve_slot_transfer(org, false)?;
            "rejected"
        }
        _ => anyhow::bail!("pass --slots to file a transfer, or --accept/--reject to settle one"),
    };
    super::save(root, &mut reg)?;

    let slots_left = reg.org(org)?.slots;
    if json {
        return print_json(&serde_json::json!({
            "org": org,
            "transfer": verb,
            "slots": slots_left,
        }));
    }
    println!("Slot transfer {verb} for {org} ({slots_left} slots)");
    Ok(())
}

fn transfers(root: &Path, org: &str, json: bool) -> anyhow::Result<()> {
    let (reg, _) = super::load(root)?;
    reg.org(org)?;
    let list = slot_transfers_for_org(&reg.slot_transfers, org);

    if json {
        return print_json(&serde_json::json!({
            "transfers": list,
            "accepted_slots": accepted_slots_transferred(&reg.slot_transfers, org),
        }));
    }
    let rows: Vec<Vec<String>> = list
        .iter()
        .map(|t| vec![t.nr_slots.to_string(), t.status.to_string(), t.remarks.clone()])
        .collect();
    print_table(&["SLOTS", "STATUS", "REMARKS"], &rows, "No slot transfers.");
    Ok(())
}
