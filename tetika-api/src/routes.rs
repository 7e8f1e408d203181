use axum::{
    body::Bytes,
    extract::{ConnectInfo, Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use tetika_app::application::ExtractRequest;
use tetika_app::domain::{CreateSessionOptions, ExtractionMode, ScrapingSession, SessionStatus};
use tetika_app::AppContext;
use tetika_errors::AppError;

#[derive(Debug, Default, Deserialize)]
struct ScrapeRequest {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartSessionRequest {
    #[serde(default)]
    url: String,
    #[serde(flatten)]
    options: CreateSessionOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionSummary {
    id: String,
    url: String,
    status: SessionStatus,
    extraction_mode: ExtractionMode,
    steps: usize,
    total_companies_found: usize,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

impl From<&ScrapingSession> for SessionSummary {
    fn from(session: &ScrapingSession) -> Self {
        Self {
            id: session.id.clone(),
            url: session.url.clone(),
            status: session.status,
            extraction_mode: session.extraction_mode,
            steps: session.extraction_history.len(),
            total_companies_found: session.total_companies_found(),
            created_at: session.created_at,
            last_updated: session.last_updated,
        }
    }
}

pub fn router(ctx: AppContext) -> Router {
    let api = Router::new()
        .route("/scrape", get(scrape_query).post(scrape_body))
        .route("/sessions", get(list_sessions).post(start_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/status", get(session_status))
        .route("/sessions/{id}/analyze", post(analyze_session))
        .route("/sessions/{id}/extract", post(extract_session))
        .route("/sessions/{id}/advise", post(advise_session))
        .route_layer(axum::middleware::from_fn_with_state(ctx.clone(), rate_limit));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(ctx)
}

async fn rate_limit(
    State(ctx): State<AppContext>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = ctx.rate_limiter.check_rate_limit(addr.ip()) {
        tracing::warn!("Rate limited {}: {:?}", addr.ip(), e);
        return AppError::from(e).into_response();
    }
    next.run(request).await
}

async fn health(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "sessions": ctx.sessions.session_count(),
        "timestamp": Utc::now(),
    }))
}

async fn scrape_query(State(ctx): State<AppContext>, Query(request): Query<ScrapeRequest>) -> Response {
    scrape(ctx, request.url).await
}

async fn scrape_body(State(ctx): State<AppContext>, body: Bytes) -> Response {
    match parse_body::<ScrapeRequest>(&body) {
        Ok(request) => scrape(ctx, request.url).await,
        Err(e) => e.into_response(),
    }
}

async fn scrape(ctx: AppContext, url: String) -> Response {
    match ctx.scrape_page.execute(&url).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            tracing::warn!("Scrape of {:?} failed: {}", url, e);
            e.into_response_with(Some(&url), ctx.config.development)
        }
    }
}

async fn start_session(State(ctx): State<AppContext>, body: Bytes) -> Response {
    let request = match parse_body::<StartSessionRequest>(&body) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    match ctx.interactive.start(&request.url, request.options) {
        Ok(started) => (StatusCode::CREATED, Json(started)).into_response(),
        Err(e) => e.into_response_with(Some(&request.url), ctx.config.development),
    }
}

async fn list_sessions(State(ctx): State<AppContext>) -> Json<Vec<SessionSummary>> {
    Json(
        ctx.sessions
            .get_all_active_sessions()
            .iter()
            .map(SessionSummary::from)
            .collect(),
    )
}

async fn get_session(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<ScrapingSession>, AppError> {
    ctx.sessions
        .get_session(&id)
        .map(Json)
        .ok_or(AppError::SessionNotFound(id))
}

async fn delete_session(State(ctx): State<AppContext>, Path(id): Path<String>) -> Response {
    if ctx.sessions.delete_session(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        AppError::SessionNotFound(id).into_response()
    }
}

async fn session_status(State(ctx): State<AppContext>, Path(id): Path<String>) -> Response {
    Json(ctx.sessions.get_session_status(&id)).into_response()
}

async fn analyze_session(State(ctx): State<AppContext>, Path(id): Path<String>) -> Response {
    match ctx.interactive.analyze(&id).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => session_error(&ctx, &id, e),
    }
}

async fn extract_session(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let request = match parse_body::<ExtractRequest>(&body) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    match ctx.interactive.extract(&id, request).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => session_error(&ctx, &id, e),
    }
}

async fn advise_session(State(ctx): State<AppContext>, Path(id): Path<String>) -> Response {
    match ctx.interactive.advise(&id).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => session_error(&ctx, &id, e),
    }
}

fn session_error(ctx: &AppContext, id: &str, error: AppError) -> Response {
    let url = ctx.sessions.get_session(id).map(|session| session.url);
    error.into_response_with(url.as_deref(), ctx.config.development)
}

// An empty body stands for an empty JSON object.
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::InvalidRequest(e.to_string()))
}
