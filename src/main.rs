use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod cards;
mod cli;
mod colors;
mod config;
mod history;
mod images;
mod metadata;
mod scrape;
mod selection;
mod storage;
mod templates;
#[cfg(test)]
mod tests;

use app::AppFactory;

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ogcard=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    init_logging();

    let paths = AppFactory::get_paths()?;
    let generator = AppFactory::create_generator(&paths)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match args.command {
            cli::Command::Generate { args } => cli::handle_generate(&generator, args).await,
            cli::Command::History { action } => cli::handle_history(&generator, action),
            cli::Command::Palette { domain } => cli::handle_palette(&generator, domain).await,
        }
    })
}
