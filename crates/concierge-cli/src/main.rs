use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod chat_cmd;
mod tools_cmd;

#[derive(Parser)]
#[command(name = "concierge", about = "Concierge CLI - talk to a running concierge server")]
struct Cli {
    /// Concierge server URL
    #[arg(long, env = "CONCIERGE_URL", default_value = "http://localhost:3000")]
    server_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a chat message and print the assistant's reply
    Chat {
        /// Message content
        message: String,
    },

    /// List the tools exposed by the RPC router
    Tools,

    /// Invoke a single tool and print the raw result
    Call {
        /// Tool name
        name: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { message } => chat_cmd::run(&cli.server_url, &message).await?,
        Commands::Tools => tools_cmd::list(&cli.server_url).await?,
        Commands::Call { name, args } => tools_cmd::call(&cli.server_url, &name, &args).await?,
    }

    Ok(())
}
