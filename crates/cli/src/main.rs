mod commands;
mod config;
mod error;
mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use crate::commands::Context;
use crate::config::Config;
use crate::error::CliError;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Lead pipeline and revenue forecast.
#[derive(Parser)]
#[command(name = "leadbook", version, about = "Lead pipeline and revenue forecast")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to leadbook.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data file (overrides config and LEADBOOK_DATA)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List leads, newest first
    List {
        /// Only leads in this stage
        #[arg(long)]
        status: Option<String>,
        /// List archived leads instead of active ones
        #[arg(long)]
        archived: bool,
        /// Case-insensitive search over contact fields
        #[arg(long)]
        search: Option<String>,
        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: usize,
        /// Rows per page (default from config)
        #[arg(long)]
        per_page: Option<usize>,
    },

    /// Show a lead with its activity trail and notes
    Show {
        id: String,
    },

    /// Create a lead in stage New
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        service: String,
        #[arg(long)]
        phone: Option<String>,
        /// Expected deal value
        #[arg(long)]
        value: Option<Decimal>,
        /// Win probability, 0-100
        #[arg(long)]
        probability: Option<i64>,
        /// Owner user id
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Change a lead's stage and log it
    Status {
        id: String,
        /// Target stage, e.g. "Proposal Sent" or proposal-sent
        stage: String,
    },

    /// Move a pipeline card; no-op if already in that stage
    Move {
        id: String,
        stage: String,
    },

    /// Edit owner, value, probability and stage
    Update {
        id: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        value: Option<Decimal>,
        #[arg(long)]
        probability: Option<i64>,
        #[arg(long, conflicts_with = "clear_owner")]
        owner: Option<String>,
        /// Remove the current owner
        #[arg(long)]
        clear_owner: bool,
    },

    /// Archive a lead
    Archive {
        id: String,
    },

    /// Restore an archived lead
    Restore {
        id: String,
    },

    /// Permanently delete a lead (its activity trail is kept)
    Delete {
        id: String,
    },

    /// Attach a note to a lead
    Note {
        id: String,
        text: String,
    },

    /// Weighted totals per pipeline stage
    Pipeline,

    /// Weighted pipeline, closed revenue and win rate
    Forecast,

    /// Lead counts for the dashboard cards
    Dashboard,

    /// Start the Leadbook HTTP API server
    Serve {
        /// Port to listen on (default from config)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            report_error(&e.to_string(), cli.output, cli.quiet);
            process::exit(1);
        }
    };
    if let Some(data) = cli.data {
        config.data_file = data;
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("failed to start runtime: {}", e), cli.output, cli.quiet);
            process::exit(1);
        }
    };

    let ctx = Context {
        output: cli.output,
        quiet: cli.quiet,
    };
    if let Err(e) = rt.block_on(run(cli.command, config, ctx)) {
        report_error(&e.to_string(), cli.output, cli.quiet);
        process::exit(1);
    }
}

async fn run(command: Commands, config: Config, ctx: Context) -> Result<(), CliError> {
    let service = commands::open_service(&config).await?;
    match command {
        Commands::List {
            status,
            archived,
            search,
            page,
            per_page,
        } => {
            let query = commands::leads::ListQuery {
                status,
                archived,
                search,
                page,
                per_page: per_page.unwrap_or(config.page_size),
            };
            commands::leads::cmd_list(&service, &query, ctx).await
        }
        Commands::Show { id } => commands::leads::cmd_show(&service, &id, ctx).await,
        Commands::Create {
            name,
            email,
            company,
            service: offering,
            phone,
            value,
            probability,
            owner,
            description,
        } => {
            let input = leadbook_engine::NewLead {
                name,
                email,
                phone,
                company,
                company_domain: None,
                service: offering,
                description,
                owner_id: owner,
                expected_value: value,
                probability,
            };
            commands::leads::cmd_create(&service, &input, ctx).await
        }
        Commands::Status { id, stage } => {
            commands::leads::cmd_status(&service, &id, &stage, ctx).await
        }
        Commands::Move { id, stage } => commands::leads::cmd_move(&service, &id, &stage, ctx).await,
        Commands::Update {
            id,
            status,
            value,
            probability,
            owner,
            clear_owner,
        } => {
            let owner_id = if clear_owner {
                Some(None)
            } else {
                owner.map(Some)
            };
            let update = leadbook_engine::LeadUpdate {
                owner_id,
                expected_value: value,
                probability,
                status,
            };
            commands::leads::cmd_update(&service, &id, &update, ctx).await
        }
        Commands::Archive { id } => commands::leads::cmd_archive(&service, &id, ctx).await,
        Commands::Restore { id } => commands::leads::cmd_restore(&service, &id, ctx).await,
        Commands::Delete { id } => commands::leads::cmd_delete(&service, &id, ctx).await,
        Commands::Note { id, text } => commands::leads::cmd_note(&service, &id, &text, ctx).await,
        Commands::Pipeline => commands::reports::cmd_pipeline(&service, ctx).await,
        Commands::Forecast => commands::reports::cmd_forecast(&service, ctx).await,
        Commands::Dashboard => commands::reports::cmd_dashboard(&service, ctx).await,
        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.port = port;
            }
            serve::start_server(service, config).await
        }
    }
}

/// Log to stderr, filtered by `LEADBOOK_LOG` (default `info`, or `warn`
/// under `--quiet`).
fn init_logging(quiet: bool) {
    let filter = EnvFilter::try_from_env("LEADBOOK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if quiet { "warn" } else { "info" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
