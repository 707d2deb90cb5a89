use url2snapshot::config::Config;
use url2snapshot::crawler::Snapshotter;
use url2snapshot::storage::{SnapshotStore, SqliteStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config for a site at blog.test with its database and documents in `dir`
fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::for_site("https://blog.test/");
    config.fetch.timeout_secs = 2;
    config.fetch.connect_timeout_secs = 1;
    config.archive.enabled = false;
    config.storage.database_path = dir.join("snapshots.db").display().to_string();
    config.documents.path = dir.join("documents").display().to_string();
    config
}

#[tokio::test]
async fn test_batch_pass_over_document_directory() {
    let mock_server = MockServer::start().await;
    // 127.0.0.1 is never admitted, so link through the host name
    let page = format!("http://localhost:{}/page.html", mock_server.address().port());

    Mock::given(method("GET"))
        .and(path("/page.html"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<h1>linked</h1>", "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("documents");
    std::fs::create_dir_all(docs.join("2015")).unwrap();
    std::fs::write(
        docs.join("2015").join("first.html"),
        format!(
            "<p>See {page} and <a href=\"{page}\">again</a>, or https://blog.test/about.</p>",
            page = page
        ),
    )
    .unwrap();
    std::fs::write(docs.join("second.md"), format!("Also {}", page)).unwrap();
    std::fs::write(docs.join("empty.txt"), "no links here").unwrap();

    let config = test_config(dir.path());
    let snapshotter = Snapshotter::from_config(&config).unwrap();

    let first = snapshotter.run_batch().await.unwrap();
    assert_eq!(first.documents, 3);
    assert_eq!(first.snapshotted, 1);
    assert_eq!(first.already_snapshotted, 1);

    let second = snapshotter.run_batch().await.unwrap();
    assert_eq!(second.stored(), 0);
    assert_eq!(second.already_snapshotted, 2);

    let store = SqliteStore::new(
        std::path::Path::new(&config.storage.database_path),
        &config.storage.table_prefix,
    )
    .unwrap();
    assert_eq!(store.count().unwrap(), 1);
    let record = store.get(&page).unwrap().unwrap();
    assert_eq!(record.body, b"<h1>linked</h1>");
    assert!(!store.exists("https://blog.test/about"));
}

#[tokio::test]
async fn test_single_document_by_id() {
    let mock_server = MockServer::start().await;
    let page = format!("http://localhost:{}/fresh.html", mock_server.address().port());

    Mock::given(method("GET"))
        .and(path("/fresh.html"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("fresh", "text/plain"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("documents")).unwrap();
    std::fs::write(dir.path().join("documents").join("new-post.html"), &page).unwrap();

    let snapshotter = Snapshotter::from_config(&test_config(dir.path())).unwrap();
    let stats = snapshotter.run_single_id("new-post.html").await.unwrap();
    assert_eq!(stats.documents, 1);
    assert_eq!(stats.snapshotted, 1);

    assert!(snapshotter.run_single_id("missing.html").await.is_err());
}

#[tokio::test]
async fn test_missing_document_directory_fails_batch() {
    let dir = tempfile::tempdir().unwrap();
    let snapshotter = Snapshotter::from_config(&test_config(dir.path())).unwrap();
    assert!(snapshotter.run_batch().await.is_err());
}
