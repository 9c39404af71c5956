use crate::output::{print_json, print_table};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum MailSubcommand {
    /// List notifications in send order
    List {
        /// Only mail addressed to this email (to or bcc)
        #[arg(long)]
        to: Option<String>,
    },

    /// Discard every recorded notification
    Clear,
}

pub fn run(root: &Path, subcmd: MailSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        MailSubcommand::List { to } => list(root, to.as_deref(), json),
        MailSubcommand::Clear => clear(root, json),
    }
}

fn list(root: &Path, to: Option<&str>, json: bool) -> anyhow::Result<()> {
    let (reg, _) = super::load(root)?;
    let mail: Vec<_> = match to {
        Some(email) => reg.outbox.sent_to(email),
        None => reg.outbox.sent().iter().collect(),
    };

    if json {
        return print_json(&mail);
    }
    let rows: Vec<Vec<String>> = mail
        .iter()
        .map(|n| {
            let recipients = if n.to.is_empty() {
                format!("bcc:{}", n.bcc.join(","))
            } else {
                n.to.join(",")
            };
            vec![recipients, n.subject.clone()]
        })
        .collect();
    print_table(&["TO", "SUBJECT"], &rows, "No mail.");
    Ok(())
}

fn clear(root: &Path, json: bool) -> anyhow::Result<()> {
    let (mut reg, _) = super::load(root)?;
    let count = reg.outbox.len();
    reg.outbox.clear();
    super::save(root, &mut reg)?;

    if json {
        return print_json(&serde_json::json!({ "cleared": count }));
    }
    println!("Cleared {count} notification(s)");
    Ok(())
}
