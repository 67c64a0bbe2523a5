//! Linkreach main entry point
//!
//! This is the command-line interface for Linkreach.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use linkreach::automation::default_launcher;
use linkreach::config::{load_settings_with_hash, resolve_settings};
use linkreach::output::{generate_markdown_report, print_statistics, RunReport, RunStatistics};
use linkreach::search::NetworkDistance;
use linkreach::session::{Credentials, PASSWORD_VAR, USERNAME_VAR};
use linkreach::{Client, EngagementOutcome, ProfileRecord, SearchParams, Settings};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Linkreach: paced automation for a professional network
///
/// Logs in with a cached session when possible, searches for people and
/// visits, connects with or messages them, waiting a randomized cooldown
/// between every action.
#[derive(Parser, Debug)]
#[command(name = "linkreach")]
#[command(version = "1.0.0")]
#[command(about = "Paced automation for a professional network", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults plus environment when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Write a markdown report of the engagement outcomes to this path
    #[arg(long, value_name = "PATH", global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Clone)]
struct SearchArgs {
    /// Free-text keywords
    #[arg(short, long)]
    keywords: String,

    /// Network distance filter: F (1st), S (2nd), B (3rd+); repeatable
    #[arg(short, long, value_parser = parse_network)]
    network: Vec<NetworkDistance>,

    /// Geography URN id; repeatable
    #[arg(long)]
    geo_urn: Vec<String>,

    /// Maximum number of profiles
    #[arg(short, long, default_value_t = 10)]
    limit: usize,
}

impl SearchArgs {
    fn params(&self) -> SearchParams {
        SearchParams::new(self.keywords.clone())
            .with_network(self.network.iter().copied())
            .with_geo_urn(self.geo_urn.iter().cloned())
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and cache the session
    Login,

    /// Search for people and print the results as JSON lines
    Search(SearchArgs),

    /// Search for people and send each a connection request
    Connect {
        #[command(flatten)]
        search: SearchArgs,

        /// Personal note attached to every request
        #[arg(long)]
        note: Option<String>,
    },

    /// Visit profiles by id
    Visit {
        #[arg(required = true)]
        profiles: Vec<String>,

        /// Scroll through each profile to load lazy content
        #[arg(long)]
        scroll: bool,
    },

    /// Send a message to an existing connection
    Message {
        profile: String,

        #[arg(short, long)]
        body: String,
    },

    /// Print a profile, experiences included, as JSON
    Profile { profile: String },

    /// Company page administration
    Company {
        #[command(subcommand)]
        command: CompanyCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CompanyCommand {
    /// Print the company's dashboard details as JSON
    Details { company: String },

    /// Invite people to follow the company page
    Invite {
        company: String,

        /// Names to search for in the invite dialog
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn parse_network(value: &str) -> Result<NetworkDistance, String> {
    NetworkDistance::from_code(value).ok_or_else(|| format!("unknown network distance '{}' (use F, S or B)", value))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (settings, config_hash) = load_configuration(cli.config.as_deref())?;
    let credentials = Credentials::from_lookup(|key| std::env::var(key).ok())
        .with_context(|| format!("set {} and {} to log in", USERNAME_VAR, PASSWORD_VAR))?;

    let launcher = default_launcher(&settings)?;
    let client = Arc::new(Client::new(settings, launcher));

    // Ctrl-C cancels every pending wait; the current action then winds down
    let cancel = client.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            cancel.cancel();
        }
    });

    let result = run(&client, &credentials, cli.command, cli.report.as_deref(), config_hash).await;

    if let Err(e) = client.shutdown().await {
        tracing::warn!("Failed to close browser: {}", e);
    }
    result
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkreach=info,warn"),
            1 => EnvFilter::new("linkreach=debug,info"),
            2 => EnvFilter::new("linkreach=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Resolves settings once; the hash is only available for a config file
fn load_configuration(path: Option<&Path>) -> anyhow::Result<(Settings, Option<String>)> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (settings, hash) = load_settings_with_hash(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok((settings, Some(hash)))
        }
        None => {
            let settings = resolve_settings(None).context("invalid configuration")?;
            tracing::info!("Using default configuration with environment overrides");
            Ok((settings, None))
        }
    }
}

async fn run(
    client: &Client,
    credentials: &Credentials,
    command: Command,
    report_path: Option<&Path>,
    config_hash: Option<String>,
) -> anyhow::Result<()> {
    let outcome = client.login(credentials).await?;
    tracing::info!("Logged in ({:?})", outcome);

    let mut report = RunReport::start(command_name(&command));
    if let Some(hash) = config_hash {
        report = report.with_config_hash(hash);
    }

    match command {
        Command::Login => return Ok(()),
        Command::Search(args) => {
            let profiles = client.search_people(args.params(), args.limit).await?;
            for profile in &profiles {
                println!("{}", serde_json::to_string(profile)?);
            }
            tracing::info!("Search complete: {} profiles", profiles.len());
            return Ok(());
        }
        Command::Profile { profile } => {
            let record = client.fetch_profile(&profile).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            return Ok(());
        }
        Command::Company {
            command: CompanyCommand::Details { company },
        } => {
            let record = client.fetch_company(&company).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            return Ok(());
        }
        Command::Connect { search, note } => {
            let profiles = client.search_people(search.params(), search.limit).await?;
            tracing::info!("Connecting with {} profiles", profiles.len());
            for profile in &profiles {
                let outcome = client.connect(profile, note.clone()).await;
                record_outcome(&mut report, profile, "connect", &outcome);
                if client.cancellation_token().is_cancelled() {
                    break;
                }
            }
        }
        Command::Visit { profiles, scroll } => {
            for id in profiles {
                let profile = ProfileRecord::from_id(&id, client.settings().profile_url(&id));
                let outcome = client.visit(&profile, scroll).await;
                record_outcome(&mut report, &profile, "visit", &outcome);
                if client.cancellation_token().is_cancelled() {
                    break;
                }
            }
        }
        Command::Message { profile, body } => {
            let profile = ProfileRecord::from_id(&profile, client.settings().profile_url(&profile));
            let outcome = client.message(&profile, body).await;
            record_outcome(&mut report, &profile, "message", &outcome);
        }
        Command::Company {
            command: CompanyCommand::Invite { company, names },
        } => {
            let record = client.fetch_company(&company).await?;
            for name in names {
                let outcome = client.invite_to_follow(&record, &name).await;
                report.record(&record.id, &name, "invite", &outcome);
                if client.cancellation_token().is_cancelled() {
                    break;
                }
            }
        }
    }

    report.finish();
    print_statistics(&RunStatistics::from_report(&report));

    if let Some(path) = report_path {
        generate_markdown_report(&report, path)?;
        println!("\n✓ Report written to: {}", path.display());
    }

    if client.cancellation_token().is_cancelled() {
        bail!("run cancelled");
    }
    Ok(())
}

fn record_outcome(report: &mut RunReport, profile: &ProfileRecord, action: &str, outcome: &EngagementOutcome) {
    if let EngagementOutcome::Failed(err) = outcome {
        let err = err.clone().into_error(&profile.id);
        tracing::error!("{} {}: {}", action, profile.display_name(), err);
    }
    report.record(&profile.id, profile.display_name(), action, outcome);
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Login => "login",
        Command::Search(_) => "search",
        Command::Connect { .. } => "connect",
        Command::Visit { .. } => "visit",
        Command::Message { .. } => "message",
        Command::Profile { .. } => "profile",
        Command::Company {
            command: CompanyCommand::Details { .. },
        } => "company-details",
        Command::Company {
            command: CompanyCommand::Invite { .. },
        } => "company-invite",
    }
}
