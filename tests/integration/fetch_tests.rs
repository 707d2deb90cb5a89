use crate::test_fetcher;
use std::time::Duration;
use url2snapshot::crawler::{Fetch, FetchOutcome};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_text_page_captured_verbatim() {
    let mock_server = MockServer::start().await;
    let body = "<html><body>héllo\r\n\tworld</body></html>";

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body.as_bytes().to_vec(), "text/html; charset=utf-8")
                .insert_header("x-served-by", "mock"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = test_fetcher()
        .fetch(&format!("{}/page", mock_server.uri()))
        .await;

    let FetchOutcome::Success(capture) = outcome else {
        panic!("expected success, got {:?}", outcome);
    };
    assert_eq!(capture.status, 200);
    assert!(capture.status_line.contains("200"));
    assert_eq!(capture.body, body.as_bytes());
    assert_eq!(capture.header("x-served-by"), Some("mock"));
    assert!(capture.content_type().unwrap().starts_with("text/html"));
}

#[tokio::test]
async fn test_not_found_is_client_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_raw("gone", "text/html"))
        .mount(&mock_server)
        .await;

    let outcome = test_fetcher()
        .fetch(&format!("{}/gone", mock_server.uri()))
        .await;
    assert_eq!(outcome, FetchOutcome::ClientError { status: 404 });
}

#[tokio::test]
async fn test_unavailable_is_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503).set_body_raw("busy", "text/plain"))
        .mount(&mock_server)
        .await;

    let outcome = test_fetcher()
        .fetch(&format!("{}/busy", mock_server.uri()))
        .await;
    assert_eq!(outcome, FetchOutcome::ServerError { status: 503 });
}

#[tokio::test]
async fn test_image_is_not_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"))
        .mount(&mock_server)
        .await;

    let outcome = test_fetcher()
        .fetch(&format!("{}/logo.png", mock_server.uri()))
        .await;
    assert_eq!(
        outcome,
        FetchOutcome::NonTextContent {
            content_type: "image/png".to_string()
        }
    );
}

#[tokio::test]
async fn test_missing_content_type_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bare"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let outcome = test_fetcher()
        .fetch(&format!("{}/bare", mock_server.uri()))
        .await;
    assert!(matches!(outcome, FetchOutcome::TransportError { .. }), "{:?}", outcome);
}

#[tokio::test]
async fn test_relative_redirect_followed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", "/new")
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("moved here", "text/plain"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = test_fetcher()
        .fetch(&format!("{}/old", mock_server.uri()))
        .await;

    let FetchOutcome::Success(capture) = outcome else {
        panic!("expected success, got {:?}", outcome);
    };
    assert_eq!(capture.body, b"moved here");
}

#[tokio::test]
async fn test_redirect_loop_stops_after_limit() {
    let mock_server = MockServer::start().await;

    // six follows allowed: the original request plus six more
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", "/loop")
                .insert_header("content-type", "text/html"),
        )
        .expect(7)
        .mount(&mock_server)
        .await;

    let outcome = test_fetcher()
        .fetch(&format!("{}/loop", mock_server.uri()))
        .await;
    assert!(matches!(outcome, FetchOutcome::TransportError { .. }), "{:?}", outcome);
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("late", "text/html")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let outcome = test_fetcher()
        .fetch(&format!("{}/slow", mock_server.uri()))
        .await;
    assert!(matches!(outcome, FetchOutcome::TransportError { .. }), "{:?}", outcome);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let outcome = test_fetcher().fetch("http://127.0.0.1:1/").await;
    assert!(matches!(outcome, FetchOutcome::TransportError { .. }), "{:?}", outcome);
}
