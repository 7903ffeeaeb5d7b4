use crate::{
    app::generator::CardGenerator, config::Config, history::CardHistory, scrape::HttpFetcher,
    storage,
};
use anyhow::{Context, Result};
use homedir::my_home;
use std::sync::Arc;

/// Application factory for creating and configuring application components
pub struct AppFactory;

impl AppFactory {
    /// Get application paths with validation
    pub fn get_paths() -> Result<AppPaths> {
        let base_path = Self::get_base_path()?;
        let history_path = format!("{base_path}/history");

        // Ensure base directory exists
        std::fs::create_dir_all(&base_path)
            .context("Failed to create application base directory")?;

        Ok(AppPaths {
            base_path,
            history_path,
        })
    }

    pub fn create_config(base_path: &str) -> Result<Config> {
        Config::load_with(base_path).with_context(|| format!("Failed to load config from {base_path}"))
    }

    pub fn create_history(paths: &AppPaths, config: &Config) -> Result<CardHistory> {
        let storage_mgr = storage::BackendLocal::new(&paths.history_path)
            .context("Failed to create history directory")?;
        Ok(CardHistory::new(Arc::new(storage_mgr), config.history_length))
    }

    /// Generator wired to the network and the on-disk history.
    pub fn create_generator(paths: &AppPaths) -> Result<CardGenerator> {
        let config = Self::create_config(&paths.base_path)?;
        let history = Self::create_history(paths, &config)?;

        let fetcher = HttpFetcher::new(config.fetch_timeout(), config.fetch_retries)
            .context("Failed to create http client")?;

        Ok(CardGenerator::new(config, Arc::new(fetcher), history)?)
    }

    /// Get the base path for the application
    fn get_base_path() -> Result<String> {
        if let Ok(base_path) = std::env::var("OGCARD_BASE_PATH") {
            return Ok(base_path);
        }

        let home = my_home()
            .context("Could not determine home directory")?
            .context("Home directory path is empty")?;
        Ok(format!("{}/.local/share/ogcard", home.to_string_lossy()))
    }
}

/// Application paths structure
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub base_path: String,
    pub history_path: String,
}
