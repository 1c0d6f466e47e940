//! Subcommand implementations behind the CLI.
use anyhow::{Context, bail};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};

use super::config::{Config, CorporaArgs, HistogramArgs, ScoreArgs};
use crate::corpus::fetch::{FetchConfig, HttpFetcher};
use crate::corpus::tokenizer::{Tokenizer, WordPunctTokenizer, normalize_word};
use crate::corpus::{self, BuildOutcome, Corpora, CorpusLayout};
use crate::domain::LangprintError;
use crate::histogram::{self, HistogramOptions};
use crate::profile::{self, LanguageProfile};
use crate::similarity::{self, WeightConfig, report};

pub async fn corpora(config: &Config, args: &CorporaArgs) -> anyhow::Result<()> {
    if args.download.is_none() && args.preprocess.is_none() {
        list_corpora(config);
        return Ok(());
    }

    let registry = Corpora::default();
    let layout = CorpusLayout::new(&config.corpora_dir);
    let fetcher = HttpFetcher::new(&FetchConfig {
        timeout: config.download_timeout,
        ..FetchConfig::default()
    })?;
    let mut failures = 0;

    if let Some(selection) = &args.download {
        let sources = registry.select(selection)?;
        for (name, result) in corpus::download_all(&fetcher, &layout, &sources, args.overwrite).await {
            match result {
                Ok(outcome) => info!(corpus = %name, ?outcome, "Download finished"),
                Err(e) => {
                    error!(corpus = %name, error = %e, "Download failed");
                    failures += 1;
                }
            }
        }
    }

    if let Some(selection) = &args.preprocess {
        let sources = registry.select(selection)?;
        let extract_options = config.extract_options();
        let results =
            corpus::acquire_all(&fetcher, &layout, &sources, &extract_options, args.overwrite).await;
        for (name, result) in results {
            match result {
                Ok(BuildOutcome::Built(report)) => println!(
                    "{name}: {} languages, {} words ({} records kept, {} unknown language, {} malformed)",
                    report.languages(),
                    report.total_words(),
                    report.records_kept,
                    report.unknown_language,
                    report.malformed
                ),
                Ok(BuildOutcome::AlreadyComplete) => println!("{name}: already built"),
                Err(e) => {
                    error!(corpus = %name, error = %e, "Preprocessing failed");
                    failures += 1;
                }
            }
        }
    }

    if failures > 0 {
        bail!("{failures} corpus operation(s) failed");
    }
    Ok(())
}

/// Print supported corpora and their state under the corpora root.
pub fn list_corpora(config: &Config) {
    let layout = CorpusLayout::new(&config.corpora_dir);
    for source in Corpora::default().iter() {
        let downloaded = layout.archive_path(source).is_file();
        let built = layout.is_complete(source);
        println!(
            "{:<12} downloaded: {:<5} built: {:<5} {}",
            source.name, downloaded, built, source.url
        );
    }
}

pub async fn histogram(args: &HistogramArgs) -> anyhow::Result<()> {
    let files = expand_word_files(&args.files)?;
    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let keep_words = args.list;
    let hyphenation_dir = if args.syllables {
        args.hyphenation_dir.clone()
    } else {
        None
    };
    let inputs = files.clone();
    let results = tokio::task::spawn_blocking(move || {
        histogram::histogram_files(&inputs, keep_words, hyphenation_dir.as_deref())
    })
    .await
    .context("Histogram worker failed")?;

    let mut failures = 0;
    let mut written = BTreeMap::new();
    for (path, result) in results {
        let profile = match result {
            Ok(profile) => profile,
            Err(e) => {
                error!(file = %path.display(), error = %e, "Failed to build profile");
                failures += 1;
                continue;
            }
        };

        match &args.output_dir {
            Some(dir) => {
                let output_file = match profile_output_path(dir, &profile, &path, &mut written) {
                    Ok(output_file) => output_file,
                    Err(e) => {
                        error!(file = %path.display(), error = %e, "Refusing to overwrite profile");
                        failures += 1;
                        continue;
                    }
                };
                info!(file = %output_file.display(), "Saving profile");
                profile::save(&profile, &output_file)?;
            }
            None => {
                println!("{}:", path.display());
                println!("{}", serde_json::to_string_pretty(&profile)?);
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} word files failed", files.len());
    }
    Ok(())
}

/// Profiles are named after their language code, so two word files
/// resolving to the same code (`en` and `eng`) would clobber each other.
fn profile_output_path(
    dir: &Path,
    profile: &LanguageProfile,
    source: &Path,
    written: &mut BTreeMap<PathBuf, PathBuf>,
) -> anyhow::Result<PathBuf> {
    let code = profile.language().unwrap_or("unknown");
    let output_file = dir.join(format!("{code}.json"));
    if let Some(previous) = written.get(&output_file) {
        bail!(
            "{} was already written from {}",
            output_file.display(),
            previous.display()
        );
    }
    written.insert(output_file.clone(), source.to_path_buf());
    Ok(output_file)
}

/// Directories expand to the word files they contain.
fn expand_word_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let found = corpus::word_files(path)
                .with_context(|| format!("Failed to list word files in {}", path.display()))?;
            if found.is_empty() {
                warn!(dir = %path.display(), "No word files found");
            }
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

pub async fn score(config: &Config, args: &ScoreArgs) -> anyhow::Result<()> {
    let weights = match &args.weights {
        Some(raw) => parse_weights(raw)?,
        None => config.weights.clone().unwrap_or_default(),
    };

    let text = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input {}", path.display()))?,
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read input from stdin")?;
            text
        }
    };
    let query = query_profile(&text)?;

    let mut candidates = Vec::with_capacity(args.profiles.len());
    for path in &args.profiles {
        candidates.push((candidate_id(path), profile::load(path)?));
    }

    let results = similarity::score(&query, &candidates, &weights)?;
    match &args.output {
        Some(path) => report::write_json(&results, path)
            .with_context(|| format!("Failed to write score report {}", path.display()))?,
        None => print!("{}", report::render_table(&results)),
    }
    Ok(())
}

/// `--weights` takes inline JSON or `@FILE`.
pub fn parse_weights(raw: &str) -> anyhow::Result<WeightConfig> {
    let json = match raw.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read weights file {path}"))?,
        None => raw.to_string(),
    };
    Ok(WeightConfig::from_json(&json)?)
}

/// Profile a free-text sample the same way corpus sentences are processed.
pub fn query_profile(text: &str) -> Result<LanguageProfile, LangprintError> {
    let tokenizer = WordPunctTokenizer::new()?;
    let words = text
        .lines()
        .flat_map(|line| tokenizer.tokenize(line))
        .filter_map(|token| normalize_word(&token));
    Ok(histogram::histogram(words, &HistogramOptions::default())?)
}

fn candidate_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_profile_tokenizes_text() {
        let profile = query_profile("The cat.\nA dog!").unwrap();
        // the, cat, ., a, dog, !
        let one_gram = profile.metric(crate::profile::Metric::OneGramLengths).unwrap();
        assert!((one_gram.probability(&crate::profile::LengthKey::unigram(3)) - 0.5).abs() < 1e-12);
        assert!(profile.language().is_none());
    }

    #[test]
    fn test_empty_query_is_an_error() {
        assert!(matches!(
            query_profile("  \n\t"),
            Err(LangprintError::Histogram(_))
        ));
    }

    #[test]
    fn test_parse_weights_inline_and_file() {
        let inline = parse_weights(r#"{"2-gram lengths": 2}"#).unwrap();
        assert_eq!(inline.weight(crate::profile::Metric::TwoGramLengths), 2.0);

        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("weights.json");
        fs::write(&path, r#"{"unique lengths": 1}"#).unwrap();
        let from_file = parse_weights(&format!("@{}", path.display())).unwrap();
        assert_eq!(from_file.weight(crate::profile::Metric::UniqueLengths), 1.0);
    }

    #[test]
    fn test_profile_output_path_rejects_same_language_twice() {
        let dir = Path::new("/profiles");
        let english = LanguageProfile::new(Some("eng".to_string()));
        let mut written = BTreeMap::new();

        let first = profile_output_path(dir, &english, Path::new("data/en"), &mut written).unwrap();
        assert_eq!(first, dir.join("eng.json"));
        assert!(profile_output_path(dir, &english, Path::new("data/eng"), &mut written).is_err());
        assert_eq!(written[&first], PathBuf::from("data/en"));

        let german = LanguageProfile::new(Some("deu".to_string()));
        let second = profile_output_path(dir, &german, Path::new("data/deu"), &mut written).unwrap();
        assert_eq!(second, dir.join("deu.json"));
    }

    #[tokio::test]
    async fn test_histogram_keeps_first_profile_on_code_collision() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        fs::write(temp_dir.path().join("en"), "cat\ndog\n").unwrap();
        fs::write(temp_dir.path().join("eng"), "a\n").unwrap();
        let output_dir = temp_dir.path().join("profiles");

        let args = HistogramArgs {
            output_dir: Some(output_dir.clone()),
            list: true,
            syllables: false,
            hyphenation_dir: None,
            files: vec![temp_dir.path().join("en"), temp_dir.path().join("eng")],
        };
        assert!(histogram(&args).await.is_err());

        let saved = profile::load(&output_dir.join("eng.json")).unwrap();
        assert_eq!(saved.words().unwrap().get("cat"), Some(&1));
        assert!(saved.words().unwrap().get("a").is_none());
    }

    #[test]
    fn test_candidate_id_is_file_stem() {
        assert_eq!(candidate_id(Path::new("/profiles/eng.json")), "eng");
    }
}
