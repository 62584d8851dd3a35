mod cli;
mod commands;
mod config;
mod dispatch;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::*;

/// Default filter for a verbosity count; RUST_LOG overrides it.
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "mechdb=info,mechdb_cli=info",
        1 => "mechdb=debug,mechdb_cli=debug",
        _ => "mechdb=trace,mechdb_cli=trace",
    }
}

fn init_tracing(verbose: u8) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(verbose).into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load()?;
    let db = config.database_path(cli.database);

    match cli.command {
        Commands::Init => commands::init::handle(&db)?,

        Commands::Ingest {
            path,
            enrichment,
            format,
        } => {
            let pipeline_config = config.pipeline_config(enrichment);
            commands::ingest::handle(&db, &path, &pipeline_config, format)?;
        }

        Commands::Reconcile { finalize, top } => {
            let pipeline_config = config.pipeline_config(None);
            commands::reconcile::handle(&db, &pipeline_config, finalize, top)?;
        }

        Commands::Finalize => {
            let pipeline_config = config.pipeline_config(None);
            commands::reconcile::finalize(&db, &pipeline_config)?;
        }

        Commands::Unresolved { limit, format } => {
            commands::reconcile::unresolved(&db, limit, format)?;
        }

        Commands::Catalog { command } => {
            let pipeline_config = config.pipeline_config(None);
            dispatch::dispatch_catalog(command, &db, &pipeline_config)?;
        }

        Commands::Jobs { command } => dispatch::dispatch_jobs(command, &db)?,

        Commands::Stats { format } => commands::stats::stats(&db, format)?,

        Commands::Log { limit, failed } => commands::stats::log(&db, limit, failed)?,

        Commands::Configure {
            set_database,
            enrichment,
            write_rules,
            show,
        } => {
            commands::configure::handle(config, set_database, enrichment, write_rules, show)?;
        }
    }

    Ok(())
}
