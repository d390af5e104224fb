mod cli;
mod commands;
mod config;
mod observability;
mod output;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands, UsersCommands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let dotenv = config::load_dotenv()?;
    let cli = Cli::parse();
    let cfg = config::loader::load_config(cli.config.as_deref())?;
    let format = cli.format.unwrap_or_default();

    observability::init_tracing_with_level(&cfg.logging.level);
    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }
    for warning in cfg.warnings() {
        tracing::warn!("{warning}");
    }

    match &cli.command {
        Commands::Migrate => {
            commands::db::migrate(&cfg).await?;
        }
        Commands::IssueToken(args) => {
            let storage = commands::connect(&cfg).await?;
            let engine = commands::engine(&storage, &cfg);
            commands::token::issue(&engine, args, format).await?;
        }
        Commands::Authenticate(args) => {
            let storage = commands::connect(&cfg).await?;
            let engine = commands::engine(&storage, &cfg);
            commands::token::authenticate(&engine, args, format).await?;
        }
        Commands::Revoke(args) => {
            let storage = commands::connect(&cfg).await?;
            let engine = commands::engine(&storage, &cfg);
            commands::token::revoke(&engine, args).await?;
        }
        Commands::Users(args) => {
            let storage = commands::connect(&cfg).await?;
            match &args.command {
                UsersCommands::List(list_args) => {
                    commands::users::list(&storage.users(), list_args, format).await?;
                }
                UsersCommands::Get(get_args) => {
                    let engine = commands::engine(&storage, &cfg);
                    commands::users::get(&storage.users(), &engine, get_args, format).await?;
                }
            }
        }
    }

    Ok(())
}
