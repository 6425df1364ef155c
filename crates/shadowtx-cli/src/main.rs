use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use shadowtx_store::{ErrorKind, IdentityStore, StoreConfig, StoreError};
use tracing_subscriber::EnvFilter;

mod completion;
mod dispatch;
mod render;

use completion::CliCompletionShell;
use dispatch::run_cli;
use render::{render_status_line, resolve_output_style, OutputStyle};

const CONFIG_ENV: &str = "SHADOWTX_CONFIG";
const LOG_ENV: &str = "SHADOWTX_LOG";

#[derive(Parser, Debug)]
#[command(name = "shadowtx")]
#[command(about = "Transactional editor for the passwd, shadow and group tables", long_about = None)]
struct Cli {
    /// Operate on <ROOT>/etc instead of /etc.
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// TOML file overriding table paths and lock settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Give up waiting for the database lock after this many milliseconds.
    #[arg(long, global = true)]
    lock_timeout_ms: Option<u64>,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[arg(long, global = true)]
    plain: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account and its credential entry.
    Useradd {
        name: String,
        #[arg(long)]
        uid: u32,
        #[arg(long)]
        gid: u32,
        #[arg(long, default_value = "")]
        comment: String,
        #[arg(long)]
        home: Option<String>,
        #[arg(long, default_value = "/bin/sh")]
        shell: String,
        /// Pre-hashed password; login stays disabled without it.
        #[arg(long)]
        password_hash: Option<String>,
    },
    /// Remove an account and its credential entry.
    Userdel { name: String },
    /// Create a credential entry only.
    Credadd {
        name: String,
        #[arg(long)]
        password_hash: Option<String>,
    },
    /// Remove a credential entry only.
    Creddel { name: String },
    Groupadd {
        name: String,
        #[arg(long)]
        gid: u32,
        #[arg(long, value_delimiter = ',')]
        members: Vec<String>,
    },
    Groupdel { name: String },
    List {
        #[arg(value_enum)]
        table: ListTable,
        #[arg(long)]
        json: bool,
    },
    Completions {
        #[arg(value_enum)]
        shell: CliCompletionShell,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ListTable {
    Users,
    Credentials,
    Groups,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let style = if cli.plain {
        OutputStyle::Plain
    } else {
        resolve_output_style(std::io::stdout().is_terminal())
    };

    match run_cli(cli, style) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", render_status_line(style, "err", &format!("{err:#}")));
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| default_level.into());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(filter)
        .init();
}

fn build_store(cli: &Cli) -> Result<IdentityStore> {
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    let mut config = match config_path {
        Some(path) => StoreConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(timeout) = cli.lock_timeout_ms {
        config.lock_timeout_ms = Some(timeout);
    }
    Ok(IdentityStore::from_config(&config, cli.root.as_deref()))
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    let Some(store_err) = err.downcast_ref::<StoreError>() else {
        return 2;
    };
    match store_err.kind() {
        ErrorKind::PermissionDenied => 1,
        ErrorKind::InvalidInput => 3,
        ErrorKind::NotFound => 6,
        ErrorKind::ValueExists => 9,
        ErrorKind::Internal => 10,
        ErrorKind::System => 11,
        ErrorKind::Cancelled => 130,
    }
}

#[cfg(test)]
mod tests;
