//! CLI entry point - the composition root.

use clap::Parser;

use hfmirror_cli::{handlers, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Download { repo_args, output } => {
            handlers::download::execute(&repo_args, output).await?;
        }
        Commands::Plan { repo_args, json } => {
            handlers::plan::execute(&repo_args, json).await?;
        }
        Commands::Serve { output, port, cors_origins } => {
            handlers::serve::execute(output, port, cors_origins).await?;
        }
    }

    Ok(())
}
