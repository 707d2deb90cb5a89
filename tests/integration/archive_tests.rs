use crate::test_fetcher;
use std::sync::{Arc, Mutex};
use url2snapshot::crawler::{ArchiveFallback, Fetch, Snapshotter, UrlDisposition};
use url2snapshot::documents::DirectorySource;
use url2snapshot::storage::{SnapshotStore, SqliteStore};
use url2snapshot::url::UrlFilter;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn snapshotter_with_archive(
    endpoint: String,
) -> (Snapshotter<SqliteStore>, Arc<Mutex<SqliteStore>>) {
    let fetcher: Arc<dyn Fetch> = Arc::new(test_fetcher());
    let store = Arc::new(Mutex::new(SqliteStore::new_in_memory("wp_").unwrap()));
    let snapshotter = Snapshotter::new(
        UrlFilter::new("blog.test"),
        fetcher.clone(),
        store.clone(),
        Arc::new(DirectorySource::new("/nonexistent")),
    )
    .with_archive(ArchiveFallback::new(fetcher, endpoint));
    (snapshotter, store)
}

#[tokio::test]
async fn test_dead_link_recovered_from_archive() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let dead = format!("{}/gone", base);

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_raw("not here", "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let availability = format!(
        r#"{{"url":"{dead}","archived_snapshots":{{"closest":{{
            "status":"200","available":true,
            "url":"{base}/web/20150101000000/{dead}","timestamp":"20150101000000"}}}}}}"#,
        dead = dead,
        base = base
    );
    Mock::given(method("GET"))
        .and(path("/wayback/available"))
        .and(query_param("url", dead.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(availability, "application/json"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/web/20150101000000id_/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>archived copy</p>", "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (snapshotter, store) = snapshotter_with_archive(format!("{}/wayback/available", base));

    assert_eq!(snapshotter.process_url(&dead).await, UrlDisposition::Archived);

    let record = store.lock().unwrap().get(&dead).unwrap().unwrap();
    assert_eq!(record.url, dead);
    assert_eq!(record.body, b"<p>archived copy</p>");
}

#[tokio::test]
async fn test_unavailable_archive_copy_stores_nothing() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let dead = format!("{}/gone", base);

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410).set_body_raw("", "text/html"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wayback/available"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"archived_snapshots":{"closest":{"status":"200","available":"false",
                "url":"http://web.archive.org/web/1/x","timestamp":"1"}}}"#,
            "application/json",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/web/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("never", "text/html"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (snapshotter, store) = snapshotter_with_archive(format!("{}/wayback/available", base));

    assert_eq!(snapshotter.process_url(&dead).await, UrlDisposition::ArchiveMiss);
    assert_eq!(store.lock().unwrap().count().unwrap(), 0);
}

#[tokio::test]
async fn test_empty_archive_answer_is_a_miss() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_raw("", "text/html"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wayback/available"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"archived_snapshots":{}}"#, "application/json"),
        )
        .mount(&mock_server)
        .await;

    let (snapshotter, _) = snapshotter_with_archive(format!("{}/wayback/available", base));
    assert_eq!(
        snapshotter.process_url(&format!("{}/gone", base)).await,
        UrlDisposition::ArchiveMiss
    );
}

#[tokio::test]
async fn test_server_error_skips_archive() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(502).set_body_raw("", "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wayback/available"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (snapshotter, _) = snapshotter_with_archive(format!("{}/wayback/available", base));
    assert_eq!(
        snapshotter.process_url(&format!("{}/busy", base)).await,
        UrlDisposition::ServerError
    );
}

#[tokio::test]
async fn test_archive_asked_for_original_url_after_redirect() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let original = format!("{}/old", base);

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", "/gone")
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_raw("not here", "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wayback/available"))
        .and(query_param("url", original.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"archived_snapshots":{}}"#, "application/json"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (snapshotter, store) = snapshotter_with_archive(format!("{}/wayback/available", base));

    assert_eq!(snapshotter.process_url(&original).await, UrlDisposition::ArchiveMiss);
    assert_eq!(store.lock().unwrap().count().unwrap(), 0);
}
