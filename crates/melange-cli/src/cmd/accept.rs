use crate::output::{print_json, print_table};
use clap::Subcommand;
use melange_core::acceptance::AcceptanceBatch;
use melange_core::proposal::proposals_to_be_accepted_for_org;
use std::path::Path;

#[derive(Subcommand)]
pub enum AcceptSubcommand {
    /// Show which proposals each organization would accept, changing nothing
    Preview,

    /// Accept the chosen proposals and reject the rest
    Run,
}

pub fn run(root: &Path, subcmd: AcceptSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        AcceptSubcommand::Preview => preview(root, json),
        AcceptSubcommand::Run => run_batch(root, json),
    }
}

fn preview(root: &Path, json: bool) -> anyhow::Result<()> {
    let (reg, _) = super::load(root)?;
    let mut rows = Vec::new();
    for org in reg.participating_orgs() {
        for p in proposals_to_be_accepted_for_org(org, &reg.proposals) {
            rows.push(vec![org.key.clone(), p.id.clone(), p.student.clone(), p.score.to_string()]);
        }
    }

    if json {
        let value: Vec<_> = rows
            .iter()
            .map(|r| serde_json::json!({ "org": r[0], "proposal": r[1], "student": r[2] }))
            .collect();
        return print_json(&value);
    }
    print_table(
        &["ORG", "PROPOSAL", "STUDENT", "SCORE"],
        &rows,
        "No proposals would be accepted.",
    );
    Ok(())
}

fn run_batch(root: &Path, json: bool) -> anyhow::Result<()> {
    let (mut reg, config) = super::load(root)?;
    let report = AcceptanceBatch::new().run(&mut reg, &config)?;
    super::save(root, &mut reg)?;

    if json {
        return print_json(&report);
    }
    println!(
        "Accepted {} proposal(s), rejected {}, in {} step(s)",
        report.accepted.len(),
        report.rejected.len(),
        report.steps
    );
    for (proposal, project) in report.accepted.iter().zip(&report.projects) {
        println!("  {proposal} -> project {project}");
    }
    Ok(())
}
