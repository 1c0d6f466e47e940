use super::serde_helpers::{load_env_path, load_env_path_opt, load_env_var};
use super::{ConfigError, LogFormat, LogLevel};
use crate::extract::{DEFAULT_MAX_DEPTH, ExtractOptions};
use crate::similarity::WeightConfig;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CORPORA_DIR: &str = "corpora";
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 1800;

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "langprint", author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Log level
    #[arg(long, env = "LANGPRINT_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, env = "LANGPRINT_LOG_FORMAT", default_value = "compact", global = true)]
    pub log_format: LogFormat,

    /// Root directory of downloaded corpora and built word files
    #[arg(long, env = "LANGPRINT_CORPORA_DIR", default_value = DEFAULT_CORPORA_DIR, global = true)]
    pub corpora_dir: PathBuf,

    /// Parent directory of extraction scratch directories (system temp dir if unset)
    #[arg(long, env = "LANGPRINT_SCRATCH_DIR", global = true)]
    pub scratch_dir: Option<PathBuf>,

    /// Maximum nesting depth of archives
    #[arg(long, env = "LANGPRINT_MAX_ARCHIVE_DEPTH", default_value = "8", global = true)]
    pub max_archive_depth: usize,

    /// Download timeout in seconds
    #[arg(long, env = "LANGPRINT_DOWNLOAD_TIMEOUT_SECS", default_value = "1800", global = true)]
    pub download_timeout_secs: u64,

    /// Configuration file path (optional)
    #[arg(long, env = "LANGPRINT_CONFIG_FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Default scoring weights (configuration file only)
    #[arg(skip)]
    pub weights: Option<WeightConfig>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub download_timeout: Duration,

    #[serde(skip)]
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download corpora and build per-language word files
    Corpora(CorporaArgs),
    /// Build language profiles from word files
    Histogram(HistogramArgs),
    /// Rank language profiles against a text sample
    Score(ScoreArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct CorporaArgs {
    /// Download a corpus archive (corpus name or `all`)
    #[arg(long, value_name = "NAME|all")]
    pub download: Option<String>,

    /// Build word files of a corpus, downloading it first if needed (corpus name or `all`)
    #[arg(long, value_name = "NAME|all")]
    pub preprocess: Option<String>,

    /// Re-download existing archives and rebuild completed corpora
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct HistogramArgs {
    /// Write `<code>.json` profiles here instead of printing them
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Keep raw word frequencies in the profiles
    #[arg(long)]
    pub list: bool,

    /// Count syllables instead of words
    #[arg(long, requires = "hyphenation_dir")]
    pub syllables: bool,

    /// Directory holding installed hyphenation pattern files
    #[arg(long, env = "LANGPRINT_HYPHENATION_DIR")]
    pub hyphenation_dir: Option<PathBuf>,

    /// Word files, or directories of word files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ScoreArgs {
    /// Text sample to identify (stdin if omitted)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Write the JSON score report here instead of printing a table
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Metric weights as JSON, or `@FILE` to read them from a file
    #[arg(long)]
    pub weights: Option<String>,

    /// Candidate language profiles
    #[arg(required = true)]
    pub profiles: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            corpora_dir: PathBuf::from(DEFAULT_CORPORA_DIR),
            scratch_dir: None,
            max_archive_depth: DEFAULT_MAX_DEPTH,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            config_file: None,
            weights: None,
            download_timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            command: None,
        }
    }
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::parse_from(args);
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::from_args`], but reports usage errors instead of exiting.
    pub fn try_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config =
            Config::try_parse_from(args).map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Ok(log_level) = std::env::var("LANGPRINT_LOG_LEVEL") {
            config.log_level = log_level.parse()?;
        }
        if let Ok(log_format) = std::env::var("LANGPRINT_LOG_FORMAT") {
            config.log_format = log_format.parse()?;
        }
        load_env_path("LANGPRINT_CORPORA_DIR", &mut config.corpora_dir);
        load_env_path_opt("LANGPRINT_SCRATCH_DIR", &mut config.scratch_dir);
        load_env_var("LANGPRINT_MAX_ARCHIVE_DEPTH", &mut config.max_archive_depth)?;
        load_env_var("LANGPRINT_DOWNLOAD_TIMEOUT_SECS", &mut config.download_timeout_secs)?;
        load_env_path_opt("LANGPRINT_CONFIG_FILE", &mut config.config_file);

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    /// Fill every setting still at its default from `file`. Values given on
    /// the command line or through the environment win.
    pub fn merge_file(&mut self, file: Config) -> Result<(), ConfigError> {
        let defaults = Config::default();
        if self.log_level == defaults.log_level {
            self.log_level = file.log_level;
        }
        if self.log_format == defaults.log_format {
            self.log_format = file.log_format;
        }
        if self.corpora_dir == defaults.corpora_dir {
            self.corpora_dir = file.corpora_dir;
        }
        if self.scratch_dir.is_none() {
            self.scratch_dir = file.scratch_dir;
        }
        if self.max_archive_depth == defaults.max_archive_depth {
            self.max_archive_depth = file.max_archive_depth;
        }
        if self.download_timeout_secs == defaults.download_timeout_secs {
            self.download_timeout_secs = file.download_timeout_secs;
        }
        if self.weights.is_none() {
            self.weights = file.weights;
        }

        self.post_process()?;
        self.validate()
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.download_timeout = Duration::from_secs(self.download_timeout_secs);
        Ok(())
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            scratch_root: self
                .scratch_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            max_depth: self.max_archive_depth,
        }
    }
}
