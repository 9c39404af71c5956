mod cmd;
mod output;
mod root;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use cmd::{
    accept::AcceptSubcommand, config::ConfigSubcommand, mail::MailSubcommand,
    org::OrgSubcommand, profile::ProfileSubcommand, proposal::ProposalSubcommand,
    request::RequestSubcommand, task::TaskSubcommand, timeline::TimelineSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "melange",
    about = "GSoC/GCI program operations: timelines, requests, proposals and tasks",
    version,
    propagate_version = true
)]
struct Cli {
    /// Program root (default: auto-detect from .melange/)
    #[arg(long, global = true, env = "MELANGE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Act as this profile (default: the profile of MELANGE_USER_EMAIL)
    #[arg(long = "as", global = true, env = "MELANGE_AS", value_name = "PROFILE")]
    actor: Option<String>,

    /// Evaluate everything at this instant instead of the current time (RFC 3339)
    #[arg(long, global = true, env = "MELANGE_NOW")]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a program in the current directory
    Init {
        /// Program key, e.g. gci2013
        #[arg(long)]
        program: String,
        /// Display name used in mail subjects
        #[arg(long)]
        name: String,
        /// Program kind: gsoc or gci
        #[arg(long)]
        kind: String,
        /// Lay the timeline out so the program starts in this phase
        #[arg(long)]
        phase: Option<String>,
    },

    /// Inspect and rewrite the program timeline
    Timeline {
        #[command(subcommand)]
        subcommand: TimelineSubcommand,
    },

    /// Manage organizations and slot transfers
    Org {
        #[command(subcommand)]
        subcommand: OrgSubcommand,
    },

    /// Manage users' program profiles and roles
    Profile {
        #[command(subcommand)]
        subcommand: ProfileSubcommand,
    },

    /// Create and act on role requests and invitations
    Request {
        #[command(subcommand)]
        subcommand: RequestSubcommand,
    },

    /// Create and act on GCI tasks
    Task {
        #[command(subcommand)]
        subcommand: TaskSubcommand,
    },

    /// Manage GSoC proposals
    Proposal {
        #[command(subcommand)]
        subcommand: ProposalSubcommand,
    },

    /// Run the GSoC proposal acceptance batch
    Accept {
        #[command(subcommand)]
        subcommand: AcceptSubcommand,
    },

    /// Run a form field cleaner against a value
    Clean(cmd::clean::CleanArgs),

    /// Inspect mail that would have been sent
    Mail {
        #[command(subcommand)]
        subcommand: MailSubcommand,
    },

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let inv = cmd::Invocation {
        actor: cli.actor,
        now: cli.now.unwrap_or_else(Utc::now),
    };

    let result = match cli.command {
        Commands::Init {
            program,
            name,
            kind,
            phase,
        } => cmd::init::run(&root, &program, &name, &kind, phase.as_deref(), &inv),
        Commands::Timeline { subcommand } => cmd::timeline::run(&root, subcommand, &inv, cli.json),
        Commands::Org { subcommand } => cmd::org::run(&root, subcommand, cli.json),
        Commands::Profile { subcommand } => cmd::profile::run(&root, subcommand, cli.json),
        Commands::Request { subcommand } => cmd::request::run(&root, subcommand, &inv, cli.json),
        Commands::Task { subcommand } => cmd::task::run(&root, subcommand, &inv, cli.json),
        Commands::Proposal { subcommand } => cmd::proposal::run(&root, subcommand, &inv, cli.json),
        Commands::Accept { subcommand } => cmd::accept::run(&root, subcommand, cli.json),
        Commands::Clean(args) => cmd::clean::run(&root, args, cli.json),
        Commands::Mail { subcommand } => cmd::mail::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
