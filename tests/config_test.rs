use langprint::App;
use langprint::app::{Command, Config, ConfigError, LogFormat, LogLevel};
use langprint::profile::Metric;
use serial_test::serial;
use std::{env, fs, path::PathBuf, time::Duration};
use tempfile::TempDir;

fn clean_all_env_vars() {
    let env_vars = [
        "LANGPRINT_LOG_LEVEL",
        "LANGPRINT_LOG_FORMAT",
        "LANGPRINT_CORPORA_DIR",
        "LANGPRINT_SCRATCH_DIR",
        "LANGPRINT_MAX_ARCHIVE_DEPTH",
        "LANGPRINT_DOWNLOAD_TIMEOUT_SECS",
        "LANGPRINT_CONFIG_FILE",
        "LANGPRINT_HYPHENATION_DIR",
    ];

    unsafe {
        for var in &env_vars {
            env::remove_var(var);
        }
    }
}

fn write_config_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("langprint.toml");
    fs::write(
        &path,
        r#"
log_level = "debug"
corpora_dir = "/srv/corpora"
max_archive_depth = 3
download_timeout_secs = 60

[weights]
"1-gram lengths" = 1.0
"3-gram lengths" = 0.5
"#,
    )
    .unwrap();
    path
}

#[test]
#[serial]
fn test_defaults_without_arguments() {
    clean_all_env_vars();

    let config = Config::try_from_args(["langprint"]).unwrap();
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.log_format, LogFormat::Compact);
    assert_eq!(config.corpora_dir, PathBuf::from("corpora"));
    assert_eq!(config.max_archive_depth, 8);
    assert_eq!(config.download_timeout, Duration::from_secs(1800));
    assert!(config.command.is_none());
}

#[test]
#[serial]
fn test_subcommands_parse() {
    clean_all_env_vars();

    let config = Config::try_from_args([
        "langprint",
        "--corpora-dir",
        "/tmp/corpora",
        "corpora",
        "--preprocess",
        "all",
        "--overwrite",
    ])
    .unwrap();
    assert_eq!(config.corpora_dir, PathBuf::from("/tmp/corpora"));
    match config.command {
        Some(Command::Corpora(args)) => {
            assert_eq!(args.preprocess.as_deref(), Some("all"));
            assert!(args.download.is_none());
            assert!(args.overwrite);
        }
        other => panic!("unexpected command: {other:?}"),
    }

    // Global options may follow the subcommand.
    let config = Config::try_from_args([
        "langprint",
        "histogram",
        "--list",
        "--output-dir",
        "profiles",
        "data/tatoeba",
        "--log-level",
        "debug",
    ])
    .unwrap();
    assert_eq!(config.log_level, LogLevel::Debug);
    match config.command {
        Some(Command::Histogram(args)) => {
            assert!(args.list);
            assert!(!args.syllables);
            assert_eq!(args.output_dir, Some(PathBuf::from("profiles")));
            assert_eq!(args.files, vec![PathBuf::from("data/tatoeba")]);
        }
        other => panic!("unexpected command: {other:?}"),
    }

    let config = Config::try_from_args([
        "langprint",
        "score",
        "--input",
        "sample.txt",
        "--weights",
        r#"{"1-gram lengths": 1}"#,
        "profiles/eng.json",
        "profiles/deu.json",
    ])
    .unwrap();
    match config.command {
        Some(Command::Score(args)) => {
            assert_eq!(args.input, Some(PathBuf::from("sample.txt")));
            assert_eq!(args.profiles.len(), 2);
            assert!(args.weights.is_some());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
#[serial]
fn test_usage_errors_are_reported() {
    clean_all_env_vars();

    assert!(matches!(
        Config::try_from_args(["langprint", "score"]),
        Err(ConfigError::InvalidConfig(_))
    ));
    assert!(matches!(
        Config::try_from_args(["langprint", "histogram", "--syllables", "data/eng"]),
        Err(ConfigError::InvalidConfig(_))
    ));
    assert!(matches!(
        Config::try_from_args(["langprint", "--max-archive-depth", "0"]),
        Err(ConfigError::InvalidConfig(_))
    ));
}

#[test]
#[serial]
fn test_environment_fallbacks() {
    clean_all_env_vars();
    let hyphenation = TempDir::new().unwrap();

    unsafe {
        env::set_var("LANGPRINT_CORPORA_DIR", "/env/corpora");
        env::set_var("LANGPRINT_MAX_ARCHIVE_DEPTH", "5");
        env::set_var("LANGPRINT_LOG_LEVEL", "warn");
        env::set_var("LANGPRINT_HYPHENATION_DIR", hyphenation.path());
    }

    let from_env = Config::from_env().unwrap();
    assert_eq!(from_env.corpora_dir, PathBuf::from("/env/corpora"));
    assert_eq!(from_env.max_archive_depth, 5);
    assert_eq!(from_env.log_level, LogLevel::Warn);

    // clap reads the same variables; the flag still wins.
    let from_args = Config::try_from_args([
        "langprint",
        "--max-archive-depth",
        "2",
        "histogram",
        "--syllables",
        "data/eng",
    ])
    .unwrap();
    assert_eq!(from_args.corpora_dir, PathBuf::from("/env/corpora"));
    assert_eq!(from_args.max_archive_depth, 2);
    match from_args.command {
        Some(Command::Histogram(args)) => {
            assert!(args.syllables);
            assert_eq!(args.hyphenation_dir.as_deref(), Some(hyphenation.path()));
        }
        other => panic!("unexpected command: {other:?}"),
    }

    unsafe {
        env::set_var("LANGPRINT_MAX_ARCHIVE_DEPTH", "deep");
    }
    assert!(matches!(Config::from_env(), Err(ConfigError::EnvError(_))));

    clean_all_env_vars();
}

#[test]
#[serial]
fn test_config_file() {
    clean_all_env_vars();
    let temp_dir = TempDir::new().unwrap();
    let path = write_config_file(&temp_dir);

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.corpora_dir, PathBuf::from("/srv/corpora"));
    assert_eq!(config.max_archive_depth, 3);
    assert_eq!(config.download_timeout, Duration::from_secs(60));
    let weights = config.weights.unwrap();
    assert_eq!(weights.weight(Metric::OneGramLengths), 1.0);
    assert_eq!(weights.weight(Metric::ThreeGramLengths), 0.5);
    assert_eq!(weights.weight(Metric::UniqueLengths), 0.0);

    let broken = temp_dir.path().join("broken.toml");
    fs::write(&broken, "[weights]\n\"5-gram lengths\" = 1.0\n").unwrap();
    assert!(matches!(
        Config::from_file(&broken),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
#[serial]
fn test_command_line_wins_over_config_file() {
    clean_all_env_vars();
    let temp_dir = TempDir::new().unwrap();
    let path = write_config_file(&temp_dir);

    let app = App::from_args([
        "langprint".to_string(),
        "--config-file".to_string(),
        path.display().to_string(),
        "--corpora-dir".to_string(),
        "/cli/corpora".to_string(),
        "corpora".to_string(),
    ])
    .unwrap();

    let config = app.config();
    assert_eq!(config.corpora_dir, PathBuf::from("/cli/corpora"));
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.max_archive_depth, 3);
    assert!(config.weights.is_some());
    assert!(matches!(config.command, Some(Command::Corpora(_))));
}
