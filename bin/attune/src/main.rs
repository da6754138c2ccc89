mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "attune")]
#[command(about = "A personal assistant that learns how you work", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant
    Chat {
        /// Message to send (interactive mode if not provided)
        #[arg(short, long)]
        message: Option<String>,

        /// User id (overrides config assistant.defaultUserId)
        #[arg(short, long)]
        user: Option<String>,

        /// Display name (overrides config assistant.defaultUserName)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show suggestions based on learned usage
    Suggest {
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Show learned preferences, or set profile preferences
    Preferences {
        #[arg(short, long)]
        user: Option<String>,

        /// Profile preference to store, as key=value (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// List recent conversations
    History {
        #[arg(short, long)]
        user: Option<String>,

        /// Number of conversations (defaults to config assistant.historyLimit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show configuration and data status
    Status,

    /// Start the HTTP gateway
    Gateway {
        /// Port to listen on (overrides config gateway.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config gateway.host)
        #[arg(long)]
        host: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Chat { message, user, name } => {
            commands::chat::run(message, user, name).await?;
        }
        Commands::Suggest { user } => {
            commands::profile::suggest(user).await?;
        }
        Commands::Preferences { user, set } => {
            commands::profile::preferences(user, set).await?;
        }
        Commands::History { user, limit } => {
            commands::profile::history(user, limit).await?;
        }
        Commands::Status => {
            commands::status::run().await?;
        }
        Commands::Gateway { port, host } => {
            commands::gateway::run(host, port).await?;
        }
    }

    Ok(())
}
