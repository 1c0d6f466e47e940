pub mod commands;
pub mod config;
pub mod logging_system;

pub use config::{Command, Config, ConfigError, LogFormat, LogLevel};
pub use logging_system::{LoggingError, LoggingSystem, setup_logging};

use anyhow::Context;
use tracing::{error, info};

pub struct App {
    config: Config,
}

impl App {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::from_args(args)?;
        Self::from_config(config)
    }

    pub fn from_config(mut config: Config) -> Result<Self, ConfigError> {
        if let Some(config_file) = config.config_file.clone() {
            eprintln!("Loading configuration from file: {}", config_file.display());
            let file_config = Config::from_file(&config_file)?;
            config.merge_file(file_config)?;
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("Starting langprint v{}", crate::VERSION);
        info!(
            corpora_dir = %self.config.corpora_dir.display(),
            max_archive_depth = self.config.max_archive_depth,
            "Configuration loaded"
        );

        match &self.config.command {
            Some(Command::Corpora(args)) => commands::corpora(&self.config, args).await,
            Some(Command::Histogram(args)) => commands::histogram(args).await,
            Some(Command::Score(args)) => commands::score(&self.config, args).await,
            None => {
                commands::list_corpora(&self.config);
                Ok(())
            }
        }
    }
}

// Main entry point for the application
pub async fn main() -> anyhow::Result<()> {
    let app = App::from_args(std::env::args_os()).context("Configuration error")?;
    setup_logging(app.config().log_level, app.config().log_format)
        .context("Failed to initialize logging")?;

    if let Err(e) = app.run().await {
        error!("Application error: {e:#}");
        return Err(e);
    }
    Ok(())
}
