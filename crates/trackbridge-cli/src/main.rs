//! trackbridge CLI - command-line front end for the YouTrack adapter.

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use trackbridge_core::{
    Config, CreateIssueInput, CustomField, FieldValue, LinkDirection, TagAction,
    UpdateIssueInput, YouTrackConfig,
};
use trackbridge_youtrack::{YouTrackClient, YouTrackService};
use tracing_subscriber::EnvFilter;

const TOKEN_ENV: &str = "YOUTRACK_TOKEN";

#[derive(Parser)]
#[command(name = "trackbridge")]
#[command(author, version, about = "trackbridge - YouTrack from the command line", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PageArgs {
    /// Number of items to skip
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<i64>,

    /// Page size (1-200)
    #[arg(long, allow_hyphen_values = true)]
    limit: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    #[command(flatten)]
    Tracker(TrackerCommand),
}

#[derive(Subcommand)]
enum TrackerCommand {
    /// Search issues with a YouTrack query
    Search {
        /// Query, e.g. "project: DEMO #Unresolved"
        #[arg(default_value = "")]
        query: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one issue
    Issue {
        /// Issue id, e.g. DEMO-12
        id: String,
    },

    /// Create an issue
    Create {
        /// Summary line
        summary: String,

        /// Project id or short name (defaults to youtrack.project)
        #[arg(short, long)]
        project: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Custom field as Name=Value; Value may be JSON
        #[arg(short, long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,

        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Assignee login
        #[arg(short, long)]
        assignee: Option<String>,

        /// Create as a draft
        #[arg(long)]
        draft: bool,
    },

    /// Update an issue
    Update {
        id: String,

        #[arg(short, long)]
        summary: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Custom field as Name=Value; Value may be JSON
        #[arg(short, long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,

        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Change the assignee of an issue
    Assign { id: String, login: String },

    /// Change the state of an issue
    Status { id: String, status: String },

    /// Add a comment to an issue
    Comment { id: String, text: String },

    /// List comments of an issue
    Comments {
        id: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Add a tag to an issue
    Tag { id: String, tag: String },

    /// Remove a tag from an issue
    Untag { id: String, tag: String },

    /// Link two issues
    Link {
        from: String,
        to: String,

        /// Link type name, e.g. "Relates" or "Depend"
        #[arg(short = 't', long = "type", default_value = "Relates")]
        link_type: String,

        /// OUTWARD, INWARD or BOTH
        #[arg(short, long, default_value = "OUTWARD")]
        direction: String,
    },

    /// Show the custom field schema of a project
    Schema {
        /// Project id or short name (defaults to youtrack.project)
        project: Option<String>,
    },

    /// Find projects
    Projects {
        #[arg(default_value = "")]
        query: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one project
    Project { id: String },

    /// Find users
    Users {
        #[arg(default_value = "")]
        query: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show the authenticated user
    Me,

    /// List saved searches
    Searches {
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set a value, e.g. `config set youtrack.url https://youtrack.example.com`
    Set { key: String, value: String },

    /// Print one value
    Get { key: String },

    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load().context("Failed to load configuration")?;

    match cli.command {
        Commands::Config { command } => run_config(&mut config, command),
        Commands::Tracker(command) => run_tracker(&config, command).await,
    }
}

async fn run_tracker(config: &Config, command: TrackerCommand) -> anyhow::Result<()> {
    let youtrack = youtrack_config(config)?;
    let default_project = youtrack.project.clone();
    let client = YouTrackClient::from_config(&youtrack)?;
    let service = YouTrackService::new(client);

    match command {
        TrackerCommand::Search { query, page } => {
            print_json(&service.search_issues(&query, page.offset, page.limit).await?)
        }
        TrackerCommand::Issue { id } => print_json(&service.get_issue(&id).await?),
        TrackerCommand::Create {
            summary,
            project,
            description,
            fields,
            tags,
            assignee,
            draft,
        } => {
            let input = CreateIssueInput {
                project: pick_project(project, default_project)?,
                summary,
                description,
                custom_fields: parse_fields(&fields)?,
                tags,
                assignee,
                draft,
            };
            print_json(&service.create_issue(&input).await?)
        }
        TrackerCommand::Update {
            id,
            summary,
            description,
            fields,
            tags,
        } => {
            let input = UpdateIssueInput {
                summary,
                description,
                custom_fields: parse_fields(&fields)?,
                tags,
            };
            print_json(&service.update_issue(&id, &input).await?)
        }
        TrackerCommand::Assign { id, login } => {
            print_json(&service.change_assignee(&id, &login).await?)
        }
        TrackerCommand::Status { id, status } => {
            print_json(&service.change_issue_status(&id, &status).await?)
        }
        TrackerCommand::Comment { id, text } => {
            print_json(&service.add_comment(&id, &text).await?)
        }
        TrackerCommand::Comments { id, page } => {
            print_json(&service.get_comments(&id, page.offset, page.limit).await?)
        }
        TrackerCommand::Tag { id, tag } => {
            print_json(&service.manage_issue_tags(&id, &tag, TagAction::Add).await?)
        }
        TrackerCommand::Untag { id, tag } => {
            print_json(&service.manage_issue_tags(&id, &tag, TagAction::Remove).await?)
        }
        TrackerCommand::Link {
            from,
            to,
            link_type,
            direction,
        } => {
            let direction: LinkDirection = direction.parse()?;
            print_json(&service.link_issues(&from, &to, &link_type, direction).await?)
        }
        TrackerCommand::Schema { project } => {
            let project = pick_project(project, default_project)?;
            print_json(&service.get_issue_fields_schema(&project).await?)
        }
        TrackerCommand::Projects { query, page } => {
            print_json(&service.find_projects(&query, page.offset, page.limit).await?)
        }
        TrackerCommand::Project { id } => print_json(&service.get_project(&id).await?),
        TrackerCommand::Users { query, page } => {
            print_json(&service.find_users(&query, page.offset, page.limit).await?)
        }
        TrackerCommand::Me => print_json(&service.get_current_user().await?),
        TrackerCommand::Searches { page } => {
            print_json(&service.get_saved_searches(page.offset, page.limit).await?)
        }
    }
}

fn run_config(config: &mut Config, command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            tracing::info!("Set {}", key);
        }
        ConfigCommands::Get { key } => match config.get(&key)? {
            Some(value) => println!("{}", value),
            None => bail!("{} is not set", key),
        },
        ConfigCommands::Show => {
            let mut shown = config.clone();
            if let Some(youtrack) = shown.youtrack.as_mut() {
                if youtrack.token.is_some() {
                    youtrack.token = Some("***".to_string());
                }
            }
            print_json(&shown)?;
        }
    }
    Ok(())
}

/// Connection settings with the token taken from the environment when set.
fn youtrack_config(config: &Config) -> anyhow::Result<YouTrackConfig> {
    let mut youtrack = config.youtrack.clone().ok_or_else(|| {
        anyhow!("YouTrack is not configured. Run `trackbridge config set youtrack.url <url>`")
    })?;
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            youtrack.token = Some(token);
        }
    }
    Ok(youtrack)
}

fn pick_project(explicit: Option<String>, default: Option<String>) -> anyhow::Result<String> {
    explicit
        .or(default)
        .ok_or_else(|| anyhow!("No project given and youtrack.project is not set"))
}

fn parse_fields(raw: &[String]) -> anyhow::Result<Vec<CustomField>> {
    raw.iter().map(|item| parse_field(item)).collect()
}

/// Parse `Name=Value`. Valid JSON values are kept as JSON, anything else is text.
fn parse_field(raw: &str) -> anyhow::Result<CustomField> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Field name is empty in '{}'", raw);
    }

    let value = match serde_json::from_str::<serde_json::Value>(value) {
        Ok(json) => FieldValue::from(json),
        Err(_) => FieldValue::from(value),
    };
    Ok(CustomField::new(name, value))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
