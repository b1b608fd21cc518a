//! `ChargeOps` operator console
//!
//! Command-line front end over the users, charging-points, feedback and
//! command services of an EV-charging network.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

mod commands;
mod output;

use chargeops_client::ClientError;
use chargeops_core::{ChargerCommand, Config, EntityKind};
use chargeops_view::Direction;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{debug, info};

/// Command line interface for the operator console
#[derive(Parser)]
#[command(
    name = "chargeops",
    version = env!("CARGO_PKG_VERSION"),
    about = "Operator console for an EV-charging network",
    long_about = "Browse and manage users, charging points, feedback and transactions, send charger commands and watch live charger status."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Sign in as an admin or operator
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password; prompted when omitted
        #[arg(long, env = "CHARGEOPS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Create an end-user account
    Register {
        /// Display name
        #[arg(long)]
        name: String,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password; prompted when omitted
        #[arg(long, env = "CHARGEOPS_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Vehicle type
        #[arg(long)]
        car_type: Option<String>,
    },

    /// Show the signed-in user
    Whoami,

    /// Show network KPIs
    Dashboard,

    /// Manage user accounts
    Users {
        /// Action
        #[command(subcommand)]
        action: EntityAction,
    },

    /// Manage charging points
    Chargers {
        /// Action
        #[command(subcommand)]
        action: ChargerAction,
    },

    /// Manage user feedback
    Feedback {
        /// Action
        #[command(subcommand)]
        action: EntityAction,
    },

    /// Browse transactions
    Transactions {
        /// Action
        #[command(subcommand)]
        action: EntityAction,
    },

    /// Inspect configuration
    Config {
        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,

        /// Validate configuration
        #[arg(short, long)]
        validate: bool,
    },
}

/// Record actions shared by every entity
#[derive(Subcommand, Debug, Clone)]
enum EntityAction {
    /// List one page of records
    List(ListArgs),

    /// Show one record
    Show {
        /// Record id
        id: String,
    },

    /// Create a record
    Create {
        /// Field assignment, repeatable
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment, required = true)]
        set: Vec<(String, String)>,
    },

    /// Update fields of a record
    Update {
        /// Record id
        id: String,

        /// Field assignment, repeatable
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment, required = true)]
        set: Vec<(String, String)>,
    },

    /// Delete a record
    Delete {
        /// Record id
        id: String,
    },
}

/// Charging-point actions
#[derive(Subcommand, Debug, Clone)]
enum ChargerAction {
    /// Record actions
    #[command(flatten)]
    Record(EntityAction),

    /// Enable or disable a charger
    Toggle {
        /// Charger id
        id: String,
    },

    /// Send a remote start or stop
    Command {
        /// Charger id
        id: String,

        /// `start` or `stop`
        #[arg(value_parser = parse_command)]
        command: ChargerCommand,
    },

    /// Poll charger status until interrupted
    Watch {
        /// Poll interval in seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// View options
        #[command(flatten)]
        list: ListArgs,
    },
}

/// Filter, sort and paging options for a list
#[derive(Args, Debug, Clone, Default)]
struct ListArgs {
    /// Case-insensitive search term
    #[arg(short, long)]
    search: Option<String>,

    /// Categorical filter, repeatable (`all` clears it)
    #[arg(short, long = "filter", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    filters: Vec<(String, String)>,

    /// Field to sort by
    #[arg(long)]
    sort: Option<String>,

    /// Sort direction (asc, desc)
    #[arg(long, value_parser = parse_direction)]
    direction: Option<Direction>,

    /// Page to show
    #[arg(short, long, default_value_t = 1)]
    page: usize,

    /// Print statistics over the whole collection
    #[arg(long)]
    stats: bool,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{raw}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((field.to_string(), value.to_string()))
}

fn parse_direction(raw: &str) -> Result<Direction, String> {
    Direction::from_str(raw)
}

fn parse_command(raw: &str) -> Result<ChargerCommand, String> {
    ChargerCommand::from_str(raw).map_err(|e| e.to_string())
}

/// Main entry point for the console
#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if it exists (for development convenience)
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Err(dotenv_err) = dotenv {
                debug!("Note: .env file not loaded: {dotenv_err}");
            }
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    chargeops_core::init_logging(&config.logging)?;
    info!(version = env!("CARGO_PKG_VERSION"), "ChargeOps console starting");

    if let Commands::Config { show, validate } = cli.command {
        return commands::config(&config, show, validate);
    }

    let ctx = commands::Context::new(config, cli.json)?;
    let result = dispatch(&ctx, cli.command).await;

    if let Err(e) = &result
        && matches!(e.downcast_ref::<ClientError>(), Some(ClientError::Unauthorized))
    {
        ctx.forget_session();
    }
    result
}

async fn dispatch(ctx: &commands::Context, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { email, password } => commands::login(ctx, &email, password).await,
        Commands::Logout => commands::logout(ctx),
        Commands::Register {
            name,
            email,
            password,
            car_type,
        } => commands::register(ctx, name, email, password, car_type).await,
        Commands::Whoami => commands::whoami(ctx),
        Commands::Dashboard => commands::dashboard(ctx).await,
        Commands::Users { action } => commands::entity(ctx, EntityKind::User, action).await,
        Commands::Feedback { action } => commands::entity(ctx, EntityKind::Feedback, action).await,
        Commands::Transactions { action } => {
            commands::entity(ctx, EntityKind::Transaction, action).await
        }
        Commands::Chargers { action } => match action {
            ChargerAction::Record(action) => {
                commands::entity(ctx, EntityKind::Charger, action).await
            }
            ChargerAction::Toggle { id } => commands::toggle(ctx, id).await,
            ChargerAction::Command { id, command } => commands::command(ctx, id, command).await,
            ChargerAction::Watch { interval, list } => commands::watch(ctx, interval, &list).await,
        },
        Commands::Config { show, validate } => commands::config(&ctx.config, show, validate),
    }
}

/// Load configuration from file or environment
fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

fn report(error: &anyhow::Error) {
    match error.downcast_ref::<ClientError>() {
        Some(client) => {
            eprintln!("Error: {}", client.user_message());
            if client.requires_login() {
                eprintln!("Run `chargeops login` to sign in again.");
            }
        }
        None => eprintln!("Error: {error:#}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case("status=Available", ("status", "Available"))]
    #[case("name=A=B", ("name", "A=B"))]
    #[case("comment=", ("comment", ""))]
    fn test_parse_assignment(#[case] raw: &str, #[case] expected: (&str, &str)) {
        let (field, value) = parse_assignment(raw).unwrap();
        assert_eq!((field.as_str(), value.as_str()), expected);
    }

    #[rstest]
    #[case("novalue")]
    #[case("=x")]
    fn test_parse_assignment_rejects(#[case] raw: &str) {
        assert!(parse_assignment(raw).is_err());
    }

    #[test]
    fn test_parses_charger_list_with_filters() {
        let cli = Cli::try_parse_from([
            "chargeops", "chargers", "list", "--filter", "status=Charging", "--sort", "ratings",
            "--direction", "desc", "--page", "2",
        ])
        .unwrap();

        let Commands::Chargers {
            action: ChargerAction::Record(EntityAction::List(args)),
        } = cli.command
        else {
            panic!("expected chargers list");
        };
        assert_eq!(args.filters, vec![("status".to_string(), "Charging".to_string())]);
        assert_eq!(args.direction, Some(Direction::Descending));
        assert_eq!(args.page, 2);
    }

    #[test]
    fn test_parses_charger_command() {
        let cli = Cli::try_parse_from(["chargeops", "chargers", "command", "7", "start"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Chargers {
                action: ChargerAction::Command {
                    command: ChargerCommand::Start,
                    ..
                }
            }
        ));
    }

    #[test]
    fn test_create_requires_fields() {
        assert!(Cli::try_parse_from(["chargeops", "users", "create"]).is_err());
    }
}
