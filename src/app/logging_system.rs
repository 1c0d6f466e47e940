use super::config::{LogFormat, LogLevel};
use std::sync::{Mutex, Once};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {details}")]
    InvalidFilter { filter: String, details: String },
    #[error("Failed to install tracing subscriber: {0}")]
    InstallFailed(String),
}

/// Target/level pairs layered on top of the default level.
pub struct LoggingSystem {
    directives: Vec<(String, LogLevel)>,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self {
            directives: Vec::new(),
        }
    }

    pub fn add_directive(&mut self, target: &str, level: LogLevel) {
        self.directives.push((target.to_string(), level));
    }

    /// Quiet the HTTP stack, which logs every connection at debug.
    pub fn add_default_directives(&mut self) {
        for target in ["hyper", "hyper_util", "reqwest", "h2", "rustls"] {
            self.add_directive(target, LogLevel::Warn);
        }
    }

    pub fn build_filter_string(&self, default_level: LogLevel) -> String {
        let mut filter_parts = Vec::with_capacity(self.directives.len() + 1);
        filter_parts.push(default_level.as_str().to_string());
        for (target, level) in &self.directives {
            filter_parts.push(format!("{target}={}", level.as_str()));
        }
        filter_parts.join(",")
    }

    /// `RUST_LOG` wins over the configured level when it is set.
    pub fn env_filter(&self, default_level: LogLevel) -> Result<EnvFilter, LoggingError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        let filter_string = self.build_filter_string(default_level);
        EnvFilter::try_new(&filter_string).map_err(|e| LoggingError::InvalidFilter {
            filter: filter_string,
            details: e.to_string(),
        })
    }

    pub fn initialize_tracing(&self, default_level: LogLevel, format: LogFormat) -> Result<(), LoggingError> {
        let env_filter = self.env_filter(default_level)?;
        let registry = tracing_subscriber::registry().with(env_filter);

        // Logs go to stderr; stdout carries profiles and score tables.
        let result = match format {
            LogFormat::Compact => registry
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true)
                        .compact(),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .json()
                        .with_current_span(true),
                )
                .try_init(),
        };
        result.map_err(|e| LoggingError::InstallFailed(e.to_string()))
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the global subscriber once; later calls report the first outcome.
pub fn setup_logging(level: LogLevel, format: LogFormat) -> Result<(), LoggingError> {
    static INIT: Once = Once::new();
    static INIT_ERROR: Mutex<Option<String>> = Mutex::new(None);

    INIT.call_once(|| {
        let mut logging_system = LoggingSystem::new();
        logging_system.add_default_directives();
        if let Err(e) = logging_system.initialize_tracing(level, format) {
            if let Ok(mut slot) = INIT_ERROR.lock() {
                *slot = Some(e.to_string());
            }
        }
    });

    match INIT_ERROR.lock().map(|slot| slot.clone()) {
        Ok(None) => Ok(()),
        Ok(Some(message)) => Err(LoggingError::InstallFailed(message)),
        Err(_) => Err(LoggingError::InstallFailed("logging state poisoned".to_string())),
    }
}
