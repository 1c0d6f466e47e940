use super::{Config, ConfigError};

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.corpora_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Corpora directory must not be empty".to_string(),
            ));
        }

        if self.max_archive_depth == 0 {
            return Err(ConfigError::InvalidConfig(
                "Maximum archive depth must be greater than 0".to_string(),
            ));
        }

        if let Some(scratch_dir) = &self.scratch_dir
            && scratch_dir.exists()
            && !scratch_dir.is_dir()
        {
            return Err(ConfigError::InvalidConfig(format!(
                "Scratch directory is not a directory: {}",
                scratch_dir.display()
            )));
        }

        if self.download_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Download timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
