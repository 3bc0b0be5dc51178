mod commands;

use clap::{Parser, Subcommand};
use hookflow_core::ResourceKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hookflow")]
#[command(about = "Custom resource handler for MSK and MSK Connect provisioning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one lifecycle event and report the result to its callback URL
    Handle {
        /// Resource kind (broker-lookup, plugin-registry, connector-registry)
        #[arg(short, long, env = "HOOKFLOW_KIND")]
        kind: ResourceKind,
        /// Event JSON file ("-" or omitted reads stdin)
        #[arg(short, long)]
        event: Option<PathBuf>,
        /// Log stream used as fallback physical id and in failure reasons
        #[arg(long, env = "AWS_LAMBDA_LOG_STREAM_NAME", default_value = "local")]
        log_stream_name: String,
        /// Profile file (defaults to discovery)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the effective backend profiles
    Profiles {
        /// Profile file (defaults to discovery)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Warn about profiles whose worst-case wait exceeds this many seconds
        #[arg(short, long)]
        budget_secs: Option<u64>,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout は応答の出力に使うので、ログは stderr へ
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Handle {
            kind,
            event,
            log_stream_name,
            config,
        } => {
            commands::handle::handle(kind, event.as_deref(), log_stream_name, config.as_deref())
                .await?;
        }
        Commands::Profiles {
            config,
            budget_secs,
        } => {
            commands::profiles::handle(config.as_deref(), budget_secs)?;
        }
        Commands::Version => {
            println!("hookflow {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
