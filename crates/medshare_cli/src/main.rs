//! `medshare` command-line entry point.
//!
//! # Responsibility
//! - Open a share database read-only and print the view for one token.
//! - Map view outcomes to stable exit codes.

use clap::{Parser, Subcommand, ValueEnum};
use log::error;
use medshare_core::db::open_db_read_only;
use medshare_core::{
    core_version, init_logging, sqlite_share_view, CancelFlag, ShareViewConfig,
    ShareViewErrorKind, ViewState,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const EXIT_SETUP_FAILED: u8 = 1;
const EXIT_INVALID_TOKEN: u8 = 2;
const EXIT_TRANSIENT_FAILURE: u8 = 3;

#[derive(Parser)]
#[command(name = "medshare")]
#[command(about = "View medical records shared through a share token", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the consolidated summary for a share token
    View {
        /// SQLite database holding share tokens and records
        #[arg(long)]
        db: PathBuf,

        /// Share token from the link; omit to request nothing
        #[arg(long)]
        token: Option<String>,

        /// TOML config file with timeouts and logging settings
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the core library version
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::View {
            db,
            token,
            config,
            format,
        } => match run_view(&db, token.as_deref(), config.as_deref(), format) {
            Ok(state) => ExitCode::from(exit_code(&state)),
            Err(message) => {
                eprintln!("medshare: {message}");
                ExitCode::from(EXIT_SETUP_FAILED)
            }
        },
        Commands::Version => {
            println!("medshare_core version={}", core_version());
            ExitCode::SUCCESS
        }
    }
}

fn run_view(
    db: &Path,
    token: Option<&str>,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<ViewState, String> {
    let mut config = match config_path {
        Some(path) => ShareViewConfig::load_from_path(path).map_err(|err| err.to_string())?,
        None => ShareViewConfig::default(),
    };
    config.merge_with_env().map_err(|err| err.to_string())?;
    init_logging(&config).map_err(|err| err.to_string())?;

    let conn = open_db_read_only(db).map_err(|err| {
        error!("event=cli_view module=cli status=error error_code=db_open_failed error={err}");
        format!("cannot open `{}`: {err}", db.display())
    })?;
    let service = sqlite_share_view(&conn, &config, CancelFlag::new())
        .map_err(|err| format!("cannot read `{}`: {err}", db.display()))?;

    let state = ViewState::from_outcome(service.aggregate(token));
    print!("{}", render(&state, format));
    Ok(state)
}

fn render(state: &ViewState, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            if let Some(message) = state.message() {
                out.push_str(message);
                out.push('\n');
            }
            if let Some(summary) = state.summary() {
                out.push_str(&summary.to_text());
            }
            out
        }
        OutputFormat::Json => {
            let document = json!({
                "status": status_label(state),
                "message": state.message(),
                "summary": state.summary(),
            });
            format!("{document:#}\n")
        }
    }
}

fn status_label(state: &ViewState) -> &'static str {
    match state {
        ViewState::Pending => "pending",
        ViewState::NoDataRequested => "no_data_requested",
        ViewState::Ready(_) => "ready",
        ViewState::Failed(ShareViewErrorKind::InvalidToken) => "invalid_token",
        ViewState::Failed(ShareViewErrorKind::TransientFailure) => "transient_failure",
        ViewState::Failed(ShareViewErrorKind::Cancelled) => "cancelled",
    }
}

fn exit_code(state: &ViewState) -> u8 {
    match state {
        ViewState::NoDataRequested | ViewState::Ready(_) => 0,
        ViewState::Failed(ShareViewErrorKind::InvalidToken) => EXIT_INVALID_TOKEN,
        ViewState::Failed(ShareViewErrorKind::TransientFailure) => EXIT_TRANSIENT_FAILURE,
        ViewState::Pending | ViewState::Failed(ShareViewErrorKind::Cancelled) => {
            EXIT_SETUP_FAILED
        }
    }
}
