use axum::{
    extract::Path,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tetika_app::application::{ExtractRequest, InstructionAdvisor, InteractiveScraper, ScrapePage};
use tetika_app::config::{ContentConfig, HeuristicsConfig};
use tetika_app::domain::{CreateSessionOptions, ExtractionMode, SessionStatus};
use tetika_app::infrastructure::fetcher::{FetchConfig, PageFetcher};
use tetika_app::infrastructure::security::InputSanitizer;
use tetika_app::infrastructure::session::SessionManager;
use tetika_errors::{AppError, FetchError};

const DIRECTORY_HTML: &str = r#"<html>
<head><title>Exhibitors</title><meta name="description" content="Exhibitor directory"></head>
<body>
  <nav><a href="/">Home</a><a href="/about">About</a></nav>
  <main>
    <h1>Our exhibitors</h1>
    <div class="exhibitor-card">
      <h3>Zylomed</h3>
      <p class="description">Medical imaging for clinics.</p>
      <a href="/exhibitors/zylomed">Profile</a>
    </div>
    <div class="exhibitor-card">
      <h3>Payvolt</h3>
      <p class="description">Payment rails for marketplaces.</p>
      <a href="https://payvolt.example">Website</a>
      <a href="/exhibitors/payvolt">Profile</a>
    </div>
    <div class="exhibitor-card">
      <h3>Greenloop</h3>
      <p class="description">Climate analytics for factories.</p>
      <a href="/exhibitors/greenloop">Profile</a>
    </div>
    <a rel="next" href="/directory?page=2">Next page</a>
  </main>
</body>
</html>"#;

const CHALLENGE_HTML: &str = r#"<html><head><title>Just a moment...</title></head>
<body><p>Checking your browser before accessing the site.</p></body></html>"#;

async fn detail(Path(slug): Path<String>) -> impl IntoResponse {
    match slug.as_str() {
        "zylomed" => (
            StatusCode::OK,
            Html(r#"<html><body><h1>Zylomed</h1><a href="https://www.zylomed.io/">Visit</a></body></html>"#),
        ),
        _ => (StatusCode::NOT_FOUND, Html("<html><body>gone</body></html>")),
    }
}

async fn spawn_fixture() -> String {
    let app = Router::new()
        .route("/directory", get(|| async { Html(DIRECTORY_HTML) }))
        .route("/challenge", get(|| async { (StatusCode::FORBIDDEN, Html(CHALLENGE_HTML)) }))
        .route("/forbidden", get(|| async { (StatusCode::FORBIDDEN, "no") }))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "nope") }))
        .route("/busy", get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }))
        .route("/broken", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
        .route("/moved", get(|| async { Redirect::temporary("/directory") }))
        .route(
            "/metadata-hop",
            get(|| async { Redirect::temporary("http://169.254.169.254/latest/meta-data/") }),
        )
        .route("/exhibitors/{slug}", get(detail));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn session_fetcher() -> PageFetcher {
    PageFetcher::new(FetchConfig {
        allow_error_status: true,
        ..FetchConfig::default().with_timeout(Duration::from_secs(5))
    })
    .unwrap()
}

fn interactive() -> InteractiveScraper {
    InteractiveScraper::new(
        SessionManager::in_memory(),
        session_fetcher(),
        InputSanitizer::new(true),
        HeuristicsConfig::default(),
        InstructionAdvisor::disabled(),
    )
}

// Announces a large body, sends the first `sent` bytes, then stalls.
async fn spawn_stalling_server(sent: usize) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        let head = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 1000000\r\n\r\n";
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all("a".repeat(sent).as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_fetch_classifies_http_failures() {
    let base = spawn_fixture().await;
    let fetcher = PageFetcher::new(
        FetchConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_private_hosts(true),
    )
    .unwrap();

    let cases = [
        ("/forbidden", FetchError::Forbidden),
        ("/missing", FetchError::PageNotFound),
        ("/busy", FetchError::RateLimited),
        ("/broken", FetchError::ServerError(500)),
    ];
    for (path, expected) in cases {
        let err = fetcher.fetch(&format!("{}{}", base, path)).await.unwrap_err();
        assert_eq!(err, expected, "{}", path);
    }

    let page = fetcher.fetch(&format!("{}/moved", base)).await.unwrap();
    assert_eq!(page.status_code, 200);
    assert!(page.final_url.ends_with("/directory"));
    assert!(page.html.contains("Zylomed"));
    assert!(!page.truncated);
}

#[tokio::test]
async fn test_fetch_truncates_large_bodies() {
    let base = spawn_fixture().await;
    let fetcher = PageFetcher::new(FetchConfig {
        max_body_bytes: 64,
        ..FetchConfig::default()
    })
    .unwrap();

    let page = fetcher.fetch(&format!("{}/directory", base)).await.unwrap();
    assert!(page.truncated);
    assert_eq!(page.html.len(), 64);
}

#[tokio::test]
async fn test_fetch_stops_reading_at_the_size_limit() {
    let base = spawn_stalling_server(4096).await;
    let fetcher = PageFetcher::new(FetchConfig {
        max_body_bytes: 64,
        ..FetchConfig::default().with_timeout(Duration::from_secs(3))
    })
    .unwrap();

    let started = Instant::now();
    let page = fetcher.fetch(&format!("{}/huge", base)).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(page.truncated);
    assert_eq!(page.html, "a".repeat(64));
}

#[tokio::test]
async fn test_redirects_into_private_networks_are_refused() {
    let base = spawn_fixture().await;
    let fetcher = PageFetcher::new(FetchConfig::default().with_timeout(Duration::from_secs(5))).unwrap();

    let err = fetcher.fetch(&format!("{}/metadata-hop", base)).await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)), "{:?}", err);

    let err = fetcher.fetch(&format!("{}/moved", base)).await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)), "{:?}", err);

    let scraper = ScrapePage::new(fetcher, InputSanitizer::new(true), ContentConfig::default());
    let err = scraper.execute(&format!("{}/metadata-hop", base)).await.unwrap_err();
    assert_eq!(err.error_code(), "invalid_url");
}

#[tokio::test]
async fn test_one_shot_scrape() {
    let base = spawn_fixture().await;
    let scraper = ScrapePage::new(
        PageFetcher::new(FetchConfig::default()).unwrap(),
        InputSanitizer::new(true),
        ContentConfig::default(),
    );

    let result = scraper.execute(&format!("{}/directory", base)).await.unwrap();
    assert_eq!(result.title, "Exhibitors");
    assert!(result.content.contains("Payvolt"));
    assert!(result.links.iter().any(|link| link.url == "https://payvolt.example"));
    assert_eq!(result.metadata.description.as_deref(), Some("Exhibitor directory"));

    let err = scraper.execute(&format!("{}/missing", base)).await.unwrap_err();
    assert!(matches!(err, AppError::Fetch(FetchError::PageNotFound)));
}

#[tokio::test]
async fn test_private_targets_blocked_by_default() {
    let base = spawn_fixture().await;
    let scraper = ScrapePage::new(
        PageFetcher::new(FetchConfig::default()).unwrap(),
        InputSanitizer::default(),
        ContentConfig::default(),
    );
    let err = scraper.execute(&format!("{}/directory", base)).await.unwrap_err();
    assert_eq!(err.error_code(), "invalid_url");
}

#[tokio::test]
async fn test_interactive_session_flow() {
    let base = spawn_fixture().await;
    let scraper = interactive();

    let started = scraper
        .start(&format!("{}/directory", base), CreateSessionOptions::default())
        .unwrap();
    let id = started.session_id;

    let analysis = scraper.analyze(&id).await.unwrap();
    assert_eq!(analysis.status, SessionStatus::AwaitingInstructions);
    assert_eq!(analysis.title.as_deref(), Some("Exhibitors"));
    assert!(analysis.analysis.has_company_indicators);
    assert!(analysis.analysis.has_pagination);
    assert!(!analysis.analysis.anti_bot_detection);

    let outcome = scraper
        .extract(
            &id,
            ExtractRequest {
                instructions: Some("focus on fintech".to_string()),
                url: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.step_number, 1);
    assert_eq!(outcome.total_results, 3);
    assert_eq!(outcome.extracted_data[0]["name"], "Payvolt");
    assert_eq!(outcome.extracted_data[0]["website"], "https://payvolt.example");
    assert!(outcome.errors.is_empty());

    let session = scraper.sessions().get_session(&id).unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.instructions.as_deref(), Some("focus on fintech"));
    assert_eq!(session.total_companies_found(), 3);
    assert_eq!(session.extraction_history.len(), 1);
    assert_eq!(session.extraction_history[0].action, "extract");
    assert_eq!(session.current_page.unwrap().companies.len(), 3);

    // Re-analysis adds nothing to the history; each extraction adds one step.
    scraper.analyze(&id).await.unwrap();
    let again = scraper.extract(&id, ExtractRequest::default()).await.unwrap();
    assert_eq!(again.step_number, 2);

    let session = scraper.sessions().get_session(&id).unwrap();
    let steps: Vec<usize> = session.extraction_history.iter().map(|s| s.step_number).collect();
    assert_eq!(steps, vec![1, 2]);
    assert_eq!(session.total_companies_found(), 6);
}

#[tokio::test]
async fn test_deep_mode_follows_detail_pages() {
    let base = spawn_fixture().await;
    let scraper = interactive();

    let started = scraper
        .start(
            &format!("{}/directory", base),
            CreateSessionOptions {
                extraction_mode: ExtractionMode::Deep,
                max_results: Some(2),
                instructions: None,
            },
        )
        .unwrap();
    let id = started.session_id;

    scraper.analyze(&id).await.unwrap();
    let outcome = scraper.extract(&id, ExtractRequest::default()).await.unwrap();

    assert_eq!(outcome.total_results, 2);
    let zylomed = &outcome.extracted_data[0];
    assert_eq!(zylomed["name"], "Zylomed");
    assert_eq!(zylomed["website"], "https://www.zylomed.io");
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].contains("/exhibitors/greenloop"));
}

#[tokio::test]
async fn test_bot_challenge_pauses_session() {
    let base = spawn_fixture().await;
    let scraper = interactive();

    let started = scraper
        .start(&format!("{}/challenge", base), CreateSessionOptions::default())
        .unwrap();
    let analysis = scraper.analyze(&started.session_id).await.unwrap();

    assert_eq!(analysis.status, SessionStatus::Paused);
    assert!(analysis.analysis.anti_bot_detection);
}

#[tokio::test]
async fn test_failed_analysis_moves_session_to_error() {
    let base = spawn_fixture().await;
    let scraper = interactive();

    let started = scraper
        .start(&format!("{}/missing", base), CreateSessionOptions::default())
        .unwrap();
    let err = scraper.analyze(&started.session_id).await.unwrap_err();
    assert!(matches!(err, AppError::Fetch(FetchError::PageNotFound)));

    let session = scraper.sessions().get_session(&started.session_id).unwrap();
    assert_eq!(session.status, SessionStatus::Error);
    assert!(session.extraction_history.is_empty());
    assert!(session.last_error.is_some());

    // A failed session can be retried.
    let retry = scraper
        .extract(
            &started.session_id,
            ExtractRequest {
                instructions: None,
                url: Some("/directory".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(retry.step_number, 1);
    assert_eq!(retry.total_results, 3);

    let session = scraper.sessions().get_session(&started.session_id).unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert!(session.last_error.is_none());
}

#[tokio::test]
async fn test_failed_extraction_is_recorded_as_a_step() {
    let base = spawn_fixture().await;
    let scraper = interactive();

    let started = scraper
        .start(&format!("{}/directory", base), CreateSessionOptions::default())
        .unwrap();
    scraper.analyze(&started.session_id).await.unwrap();

    let err = scraper
        .extract(
            &started.session_id,
            ExtractRequest {
                instructions: None,
                url: Some("/broken".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Fetch(FetchError::ServerError(500))));

    let session = scraper.sessions().get_session(&started.session_id).unwrap();
    assert_eq!(session.status, SessionStatus::Error);
    assert_eq!(session.extraction_history.len(), 1);
    assert_eq!(session.extraction_history[0].result.errors.len(), 1);
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_scrape_example_domain() {
    let scraper = ScrapePage::new(
        PageFetcher::new(FetchConfig::default()).unwrap(),
        InputSanitizer::default(),
        ContentConfig::default(),
    );
    let result = scraper.execute("https://example.com").await.unwrap();
    assert_eq!(result.title, "Example Domain");
    assert!(!result.content.is_empty());
}
