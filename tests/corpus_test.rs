use bzip2::Compression;
use bzip2::write::BzEncoder;
use langprint::corpus::fetch::{FetchConfig, FetchError, FetchOutcome, Fetcher, HttpFetcher};
use langprint::corpus::format::TatoebaFormat;
use langprint::corpus::{
    self, BuildOutcome, COMPLETE_MARKER, CorpusError, CorpusLayout, CorpusSource,
};
use langprint::extract::ExtractOptions;
use std::fs;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const SENTENCES: &str = "1\teng\tThe cat sat.\n\
2\tdeu\tDer Hund bellt.\n\
3\t\\N\tUnknown words here\n\
4\ten\tA dog!\n\
not a record\n";

fn sentences_tar_bz2() -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_size(SENTENCES.len() as u64);
    header.set_mode(0o644);
    builder
        .append_data(&mut header, "sentences.csv", SENTENCES.as_bytes())
        .unwrap();
    let tar = builder.into_inner().unwrap();

    let mut encoder = BzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

fn test_fetcher() -> HttpFetcher {
    HttpFetcher::new(&FetchConfig {
        timeout: Duration::from_secs(5),
        connection_timeout: Duration::from_secs(2),
        user_agent: "langprint-test/1.0".to_string(),
    })
    .unwrap()
}

fn mock_source(server: &MockServer) -> CorpusSource {
    CorpusSource {
        name: "mock-tatoeba".to_string(),
        url: format!("{}/exports/sentences.tar.bz2", server.uri()),
        archive_name: "sentences.tar.bz2".to_string(),
        target_file: "sentences.csv".to_string(),
        format: Arc::new(TatoebaFormat),
        tokenizer: "word-punct".to_string(),
    }
}

#[tokio::test]
async fn test_fetch_downloads_and_then_skips() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/archive.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive payload".to_vec()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let destination = temp_dir.path().join("nested/dir/archive.bin");
    let url = Url::parse(&format!("{}/archive.bin", mock_server.uri())).unwrap();
    let fetcher = test_fetcher();

    let first = fetcher.fetch(&url, &destination, false).await.unwrap();
    assert_eq!(first, FetchOutcome::Downloaded { bytes: 15 });
    assert_eq!(fs::read(&destination).unwrap(), b"archive payload");

    let second = fetcher.fetch(&url, &destination, false).await.unwrap();
    assert_eq!(second, FetchOutcome::Cached);

    let forced = fetcher.fetch(&url, &destination, true).await.unwrap();
    assert_eq!(forced, FetchOutcome::Downloaded { bytes: 15 });
    assert!(!temp_dir.path().join("nested/dir/archive.bin.part").exists());
}

#[tokio::test]
async fn test_fetch_reports_http_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let destination = temp_dir.path().join("missing.zip");
    let url = Url::parse(&format!("{}/missing.zip", mock_server.uri())).unwrap();

    let result = test_fetcher().fetch(&url, &destination, false).await;
    assert!(matches!(result, Err(FetchError::HttpError { status: 404, .. })));
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_acquire_downloads_builds_and_marks_complete() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exports/sentences.tar.bz2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(sentences_tar_bz2()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let corpora_dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let layout = CorpusLayout::new(corpora_dir.path());
    let source = mock_source(&mock_server);
    let sources = vec![source.clone()];
    let extract_options = ExtractOptions {
        scratch_root: scratch.path().to_path_buf(),
        max_depth: 4,
    };
    let fetcher = test_fetcher();

    let results = corpus::acquire_all(&fetcher, &layout, &sources, &extract_options, false).await;
    let report = match &results["mock-tatoeba"] {
        Ok(BuildOutcome::Built(report)) => report.clone(),
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(report.records_read, 5);
    assert_eq!(report.records_kept, 3);
    assert_eq!(report.unknown_language, 1);
    assert_eq!(report.malformed, 1);
    assert_eq!(report.words["eng"], 7);
    assert_eq!(report.words["deu"], 4);

    let data_dir = layout.data_dir(&source);
    assert_eq!(
        fs::read_to_string(data_dir.join("eng")).unwrap(),
        "the\ncat\nsat\n.\na\ndog\n!\n"
    );
    let marker: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(data_dir.join(COMPLETE_MARKER)).unwrap()).unwrap();
    assert_eq!(marker["records_kept"], 3);
    assert_eq!(marker["words"]["eng"], 7);
    assert_eq!(
        corpus::word_files(&data_dir).unwrap(),
        vec![data_dir.join("deu"), data_dir.join("eng")]
    );
    assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);

    // Second run neither downloads nor rebuilds.
    let rerun = corpus::acquire_all(&fetcher, &layout, &sources, &extract_options, false).await;
    assert!(matches!(
        rerun["mock-tatoeba"],
        Ok(BuildOutcome::AlreadyComplete)
    ));
}

#[tokio::test]
async fn test_incomplete_build_is_redone() {
    let corpora_dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let layout = CorpusLayout::new(corpora_dir.path());
    let mock_server = MockServer::start().await;
    let source = mock_source(&mock_server);

    let archive = layout.archive_path(&source);
    fs::create_dir_all(archive.parent().unwrap()).unwrap();
    fs::write(&archive, sentences_tar_bz2()).unwrap();

    // Leftovers of an interrupted build, without the marker.
    let data_dir = layout.data_dir(&source);
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("eng"), "stale\n").unwrap();
    fs::write(data_dir.join("fra"), "stale\n").unwrap();

    let extract_options = ExtractOptions {
        scratch_root: scratch.path().to_path_buf(),
        max_depth: 4,
    };
    let outcome = corpus::build(&layout, &source, &extract_options, false).unwrap();
    assert!(matches!(outcome, BuildOutcome::Built(_)));
    assert!(!data_dir.join("fra").exists());
    assert!(
        fs::read_to_string(data_dir.join("eng"))
            .unwrap()
            .starts_with("the\n")
    );

    let forced = corpus::build(&layout, &source, &extract_options, true).unwrap();
    assert!(matches!(forced, BuildOutcome::Built(_)));
}

#[tokio::test]
async fn test_failed_download_does_not_stop_other_corpora() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exports/sentences.tar.bz2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(sentences_tar_bz2()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.tar.bz2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let corpora_dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let layout = CorpusLayout::new(corpora_dir.path());
    let good = mock_source(&mock_server);
    let bad = CorpusSource {
        name: "gone".to_string(),
        url: format!("{}/gone.tar.bz2", mock_server.uri()),
        ..good.clone()
    };
    let extract_options = ExtractOptions {
        scratch_root: scratch.path().to_path_buf(),
        max_depth: 4,
    };

    let results = corpus::acquire_all(
        &test_fetcher(),
        &layout,
        &[good, bad],
        &extract_options,
        false,
    )
    .await;
    assert_eq!(results.len(), 2);
    assert!(matches!(results["mock-tatoeba"], Ok(BuildOutcome::Built(_))));
    assert!(matches!(
        results["gone"],
        Err(CorpusError::Fetch {
            source: FetchError::HttpError { status: 500, .. },
            ..
        })
    ));
}

#[tokio::test]
async fn test_completed_corpus_is_skipped_without_archive_or_network() {
    let corpora_dir = TempDir::new().unwrap();
    let layout = CorpusLayout::new(corpora_dir.path());
    let source = CorpusSource {
        name: "offline".to_string(),
        url: "http://127.0.0.1:9/exports/sentences.tar.bz2".to_string(),
        archive_name: "sentences.tar.bz2".to_string(),
        target_file: "sentences.csv".to_string(),
        format: Arc::new(TatoebaFormat),
        tokenizer: "word-punct".to_string(),
    };
    let data_dir = layout.data_dir(&source);
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("eng"), "the\ncat\n").unwrap();
    fs::write(data_dir.join(COMPLETE_MARKER), "{}").unwrap();

    let results = corpus::acquire_all(
        &test_fetcher(),
        &layout,
        &[source.clone()],
        &ExtractOptions::default(),
        false,
    )
    .await;

    assert!(matches!(results["offline"], Ok(BuildOutcome::AlreadyComplete)));
    assert!(!layout.archive_path(&source).exists());
    assert_eq!(fs::read_to_string(data_dir.join("eng")).unwrap(), "the\ncat\n");
}
