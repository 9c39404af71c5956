use super::Invocation;
use crate::output::{fmt_opt, fmt_time, print_json, print_table};
use clap::Subcommand;
use melange_core::proposal::{proposals_for_student, proposals_to_be_accepted_for_org};
use std::path::Path;

#[derive(Subcommand)]
pub enum ProposalSubcommand {
    /// Submit a proposal to an organization as the acting student
    Add {
        #[arg(long)]
        org: String,
        #[arg(long)]
        title: String,
    },

    /// Score a proposal, flag it for a slot or assign its mentor
    Review {
        id: String,
        #[arg(long, allow_negative_numbers = true)]
        score: Option<i64>,
        /// Spend a slot on this proposal (true/false)
        #[arg(long)]
        accept: Option<bool>,
        #[arg(long)]
        mentor: Option<String>,
    },

    /// List proposals
    List {
        #[arg(long)]
        org: Option<String>,
        #[arg(long)]
        student: Option<String>,
        /// Only the proposals that would fill the org's remaining slots
        #[arg(long, requires = "org")]
        to_accept: bool,
    },

    /// Recompute students with more than one proposal flagged for acceptance
    Duplicates,
}

pub fn run(
    root: &Path,
    subcmd: ProposalSubcommand,
    inv: &Invocation,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        ProposalSubcommand::Add { org, title } => add(root, &org, &title, inv, json),
        ProposalSubcommand::Review {
            id,
            score,
            accept,
            mentor,
        } => review(root, &id, score, accept, mentor.as_deref(), json),
        ProposalSubcommand::List {
            org,
            student,
            to_accept,
        } => list(root, org.as_deref(), student.as_deref(), to_accept, json),
        ProposalSubcommand::Duplicates => duplicates(root, inv, json),
    }
}

fn add(root: &Path, org: &str, title: &str, inv: &Invocation, json: bool) -> anyhow::Result<()> {
    let (mut reg, config) = super::load(root)?;
    let student = super::actor(&reg, &config, inv)?;
    let id = reg.add_proposal(org, &student, title, inv.now)?;
    super::save(root, &mut reg)?;

    if json {
        return print_json(&serde_json::json!({ "id": id, "org": org, "student": student }));
    }
    println!("Submitted proposal {id} to {org}");
    Ok(())
}

fn review(
    root: &Path,
    id: &str,
    score: Option<i64>,
    accept: Option<bool>,
    mentor: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let (mut reg, _) = super::load(root)?;
    reg.review_proposal(id, score, accept, mentor)?;
    super::save(root, &mut reg)?;

    let Some(p) = reg.proposals.iter().find(|p| p.id == id) else {
        anyhow::bail!("proposal {id} vanished after review");
    };
    if json {
        return print_json(p);
    }
    println!(
        "{id}: score {}, accept_as_project {}, mentor {}",
        p.score,
        p.accept_as_project,
        fmt_opt(p.mentor.as_deref())
    );
    Ok(())
}

fn list(
    root: &Path,
    org: Option<&str>,
    student: Option<&str>,
    to_accept: bool,
    json: bool,
) -> anyhow::Result<()> {
    let (reg, _) = super::load(root)?;
    let proposals: Vec<_> = match (org, student, to_accept) {
        (Some(org), _, true) => proposals_to_be_accepted_for_org(reg.org(org)?, &reg.proposals),
        (_, Some(student), _) => proposals_for_student(&reg.proposals, student),
        _ => reg.proposals.iter().collect(),
    };
    let proposals: Vec<_> = proposals
        .into_iter()
        .filter(|p| org.map_or(true, |o| p.org == o))
        .collect();

    if json {
        return print_json(&proposals);
    }
    let rows: Vec<Vec<String>> = proposals
        .iter()
        .map(|p| {
            vec![
                p.id.clone(),
                p.org.clone(),
                p.student.clone(),
                p.score.to_string(),
                p.status.to_string(),
                if p.accept_as_project { "yes" } else { "no" }.to_string(),
                fmt_opt(p.mentor.as_deref()),
                p.title.clone(),
            ]
        })
        .collect();
    print_table(
        &["ID", "ORG", "STUDENT", "SCORE", "STATUS", "ACCEPT", "MENTOR", "TITLE"],
        &rows,
        "No proposals.",
    );
    Ok(())
}

fn duplicates(root: &Path, inv: &Invocation, json: bool) -> anyhow::Result<()> {
    let (mut reg, _) = super::load(root)?;
    let count = reg.recalculate_duplicates(inv.now);
    super::save(root, &mut reg)?;

    let program = reg.program.key.clone();
    let records: Vec<_> = reg
        .duplicates
        .iter()
        .filter(|d| d.program == program)
        .collect();
    let calculated_on = reg
        .duplicate_statuses
        .iter()
        .find(|s| s.program == program)
        .and_then(|s| s.calculated_on);

    if json {
        return print_json(&serde_json::json!({
            "duplicates": count,
            "calculated_on": calculated_on,
            "records": records,
        }));
    }
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|d| {
            vec![
                d.student.clone(),
                d.orgs.join(","),
                d.duplicates.join(","),
            ]
        })
        .collect();
    print_table(
        &["STUDENT", "ORGS", "PROPOSALS"],
        &rows,
        "No duplicates.",
    );
    println!("{count} duplicate(s), calculated {}", fmt_time(calculated_on));
    Ok(())
}
