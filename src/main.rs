use anyhow::Result;
use clap::{Parser, Subcommand};

use ragchat::{commands, logging, ui, Config, ReconcilePolicy};

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(version)]
#[command(about = "Chat with a retrieval-augmented-generation backend", long_about = None)]
struct Cli {
    /// Backend base URL (overrides config and RAGCHAT_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// How server replies update the conversation: full-replace or append-only
    #[arg(long, global = true)]
    policy: Option<ReconcilePolicy>,

    /// Request an evaluation of every answer
    #[arg(long, global = true)]
    evaluate: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the conversation
    Ask { message: String },
    /// Show the effective configuration
    Config {
        /// Write the default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        if let Some(policy) = self.policy {
            config.reconcile_policy = policy;
        }
        if self.evaluate {
            config.evaluate = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    cli.apply(&mut config);

    let _log_guard = logging::init(&config.log_dir())?;

    match cli.command {
        None => ui::run(config).await,
        Some(Commands::Ask { message }) => commands::ask(&config, &message).await,
        Some(Commands::Config { init }) => commands::config(&config, init),
    }
}
