mod bot;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lungfish", about = "Chat bot over the realtime messaging API")]
struct Cli {
    /// Config file (defaults to ~/.lungfish/config.json5)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API token (overrides config and environment)
    #[arg(short, long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and run the demo bot until the stream closes
    Run {
        /// Channel to post replies to (overrides config)
        #[arg(short, long)]
        channel: Option<String>,
    },
    /// Print the identity the token belongs to
    Whoami,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => lungfish_config::load_config_from(path)?,
        None => lungfish_config::load_config()?,
    };
    if let Some(token) = cli.token {
        config.token = Some(token);
    }

    let rt = tokio::runtime::Runtime::new()?;
    match cli.command.unwrap_or(Commands::Run { channel: None }) {
        Commands::Run { channel } => rt.block_on(bot::run_bot(config, channel))?,
        Commands::Whoami => rt.block_on(bot::run_whoami(config))?,
    }

    Ok(())
}
