//! Discord Commands CLI
//!
//! Command-line interface for validating and reconciling application commands.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use discord_commands::{
    expand_command, requires_replacement, validate_command, ClientConfig, CommandSpec,
    FormatError, Reconciler, DEFAULT_API_ROOT,
};

#[derive(Parser)]
#[command(name = "discord-commands")]
#[command(about = "Validate and reconcile Discord application commands")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Connection {
    /// Discord application id
    #[arg(long, env = "DISCORD_APPLICATION_ID")]
    application_id: String,

    /// Bot token (exclusive with --client-credentials-token)
    #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<String>,

    /// Client credentials token with the applications.commands.update scope
    #[arg(long, env = "DISCORD_CLIENT_TOKEN", hide_env_values = true)]
    client_credentials_token: Option<String>,

    /// API root, only useful for testing or version swaps
    #[arg(long, env = "DISCORD_API_ROOT", default_value = DEFAULT_API_ROOT)]
    api_root: String,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a command file without contacting the registry
    Validate {
        /// Command file (JSON)
        file: PathBuf,
    },

    /// Print the registry payload a command file expands to
    Expand {
        /// Command file (JSON)
        file: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List commands in a scope
    List {
        /// Guild id (global scope if omitted)
        #[arg(long)]
        guild: Option<String>,

        #[command(flatten)]
        connection: Connection,
    },

    /// Create the command described by a file
    Create {
        /// Command file (JSON)
        file: PathBuf,

        #[command(flatten)]
        connection: Connection,
    },

    /// Read a command by id
    Read {
        id: String,

        /// Guild id (global scope if omitted)
        #[arg(long)]
        guild: Option<String>,

        #[command(flatten)]
        connection: Connection,
    },

    /// Update a command in place to match a file
    Update {
        id: String,

        /// Command file (JSON)
        file: PathBuf,

        #[command(flatten)]
        connection: Connection,
    },

    /// Delete a command by id (succeeds if already gone)
    Delete {
        id: String,

        /// Guild id (global scope if omitted)
        #[arg(long)]
        guild: Option<String>,

        #[command(flatten)]
        connection: Connection,
    },

    /// Delete every command whose name starts with a prefix
    Sweep {
        /// Name prefix to match
        #[arg(long)]
        prefix: String,

        /// Guild id (global scope if omitted)
        #[arg(long)]
        guild: Option<String>,

        #[command(flatten)]
        connection: Connection,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Expand { file, pretty } => run_expand(&file, pretty),
        Commands::List { guild, connection } => {
            run_remote(&connection, |r| r.list(guild.as_deref()))
        }
        Commands::Create { file, connection } => {
            load_spec(&file).and_then(|spec| run_remote(&connection, |r| r.create(&spec)))
        }
        Commands::Read {
            id,
            guild,
            connection,
        } => run_read(&connection, guild.as_deref(), &id),
        Commands::Update {
            id,
            file,
            connection,
        } => load_spec(&file).and_then(|spec| run_update(&connection, &id, &spec)),
        Commands::Delete {
            id,
            guild,
            connection,
        } => run_remote(&connection, |r| {
            r.delete(guild.as_deref(), &id)
                .map(|()| serde_json::json!({ "deleted": id }))
        }),
        Commands::Sweep {
            prefix,
            guild,
            connection,
        } => run_remote(&connection, |r| r.sweep(guild.as_deref(), &prefix)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Logs go to stderr so stdout stays machine-readable. Filter with RUST_LOG.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_spec(path: &Path) -> Result<CommandSpec, u8> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: cannot read {}: {}", path.display(), e);
        3u8
    })?;
    serde_json::from_str(&content).map_err(|e| {
        eprintln!("Error: invalid command file {}: {}", path.display(), e);
        2u8
    })
}

fn report_format_error(err: &FormatError) {
    eprintln!("Validation failed:");
    for error in &err.errors {
        eprintln!("  {}", error);
    }
}

fn run_validate(path: &Path) -> Result<(), u8> {
    let spec = load_spec(path)?;
    match validate_command(&spec) {
        Ok(()) => {
            println!("Valid");
            Ok(())
        }
        Err(err) => {
            report_format_error(&err);
            Err(err.exit_code() as u8)
        }
    }
}

fn run_expand(path: &Path, pretty: bool) -> Result<(), u8> {
    let spec = load_spec(path)?;
    validate_command(&spec).map_err(|err| {
        report_format_error(&err);
        err.exit_code() as u8
    })?;
    print_json(&expand_command(&spec, None), pretty)
}

fn run_read(connection: &Connection, guild: Option<&str>, id: &str) -> Result<(), u8> {
    let reconciler = connect(connection)?;
    match reconciler.read(guild, id) {
        Ok(Some(record)) => print_json(&record, connection.pretty),
        Ok(None) => {
            eprintln!("Error: command {} not found", id);
            Err(4)
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            Err(err.exit_code() as u8)
        }
    }
}

fn run_update(connection: &Connection, id: &str, spec: &CommandSpec) -> Result<(), u8> {
    let reconciler = connect(connection)?;

    // A rename or scope change cannot be applied in place.
    let current = reconciler
        .read(spec.guild_id.as_deref(), id)
        .map_err(|err| {
            eprintln!("Error: {}", err);
            err.exit_code() as u8
        })?;
    match current {
        None => {
            eprintln!("Error: command {} not found", id);
            return Err(4);
        }
        Some(current) if requires_replacement(&current.command, spec) => {
            eprintln!(
                "Error: changing name or guild of command {} requires delete + create",
                id
            );
            return Err(2);
        }
        Some(_) => {}
    }

    match reconciler.update(id, spec) {
        Ok(record) => print_json(&record, connection.pretty),
        Err(err) => {
            eprintln!("Error: {}", err);
            Err(err.exit_code() as u8)
        }
    }
}

fn run_remote<R, F>(connection: &Connection, op: F) -> Result<(), u8>
where
    R: Serialize,
    F: FnOnce(&Reconciler) -> Result<R, discord_commands::ReconcileError>,
{
    let reconciler = connect(connection)?;
    match op(&reconciler) {
        Ok(output) => print_json(&output, connection.pretty),
        Err(err) => {
            if let discord_commands::ReconcileError::Format { source, .. } = &err {
                report_format_error(source);
            } else {
                eprintln!("Error: {}", err);
            }
            Err(err.exit_code() as u8)
        }
    }
}

fn connect(connection: &Connection) -> Result<Reconciler, u8> {
    let config = ClientConfig {
        application_id: connection.application_id.clone(),
        bot_token: connection.bot_token.clone(),
        client_credentials_token: connection.client_credentials_token.clone(),
        api_root: Some(connection.api_root.clone()),
        user_agent: None,
    };
    Reconciler::from_config(&config).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), u8> {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", output);
    Ok(())
}
