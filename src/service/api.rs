use crate::{
    application::{
        app::{Application, IngestMode, IngestReport},
        view::ChartSnapshot,
    },
    domain::{
        errors::{ApplicationError, SessionError, StorageError},
        models::Granularity,
        session::{SessionContext, TwoFactor},
    },
    infrastructure::{
        backend_records::HistoryPayload,
        shutdown::{Shutdown, ShutdownChannel},
    },
};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub const ACCOUNT_HEADER: &str = "x-wallet-account";
pub const OTP_HEADER: &str = "x-otp-status";

pub fn router<A>(app: Arc<A>) -> Router
where
    A: Application + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/history",
            post(append_history::<A>).put(replace_history::<A>),
        )
        .route("/chart", get(get_chart::<A>))
        .route("/chart/zoom", post(zoom_chart::<A>))
        .route("/chart/reset", post(reset_chart::<A>))
        .with_state(app)
        .layer(CorsLayer::permissive())
}

pub async fn start_server<A>(
    shutdown: ShutdownChannel,
    app: Arc<A>,
    listen_port: u16,
) -> anyhow::Result<()>
where
    A: Application + Send + Sync + 'static,
{
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", listen_port)).await?;
    let server = axum::serve(listener, router(app));

    tracing::info!("API server started on port {}", listen_port);

    let mut shutdown_rx = shutdown.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => {
            tracing::warn!("API server received shutdown signal");
        }
        result = server => {
            if let Err(e) = result {
                tracing::error!("API server error: {:?}", e);
            }
            tracing::warn!("API server stopped unexpectedly");
        }
    }

    Ok(())
}

/// Builds the caller's session from the identity headers.
fn session_from(headers: &HeaderMap) -> Result<SessionContext, StatusCode> {
    let account = headers
        .get(ACCOUNT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let two_factor = match headers.get(OTP_HEADER).and_then(|v| v.to_str().ok()) {
        Some(status) => status
            .parse::<TwoFactor>()
            .map_err(|_| StatusCode::BAD_REQUEST)?,
        None => TwoFactor::Disabled,
    };
    Ok(SessionContext::new(account, two_factor))
}

fn status_of(error: ApplicationError) -> StatusCode {
    tracing::warn!("Request failed: {}", error);
    match error {
        ApplicationError::Session(SessionError::Unauthenticated) => StatusCode::UNAUTHORIZED,
        ApplicationError::Session(SessionError::OtpRequired(_)) => StatusCode::FORBIDDEN,
        ApplicationError::Session(SessionError::InvalidTwoFactor(_)) => StatusCode::BAD_REQUEST,
        ApplicationError::Storage(StorageError::AccountNotFound(_)) => StatusCode::NOT_FOUND,
    }
}

#[derive(Deserialize)]
pub struct ChartQuery {
    granularity: Option<Granularity>,
}

#[derive(Deserialize)]
pub struct ZoomRequest {
    left: String,
    right: String,
}

async fn append_history<A>(
    State(app): State<Arc<A>>,
    headers: HeaderMap,
    Json(payload): Json<HistoryPayload>,
) -> Result<Json<IngestReport>, StatusCode>
where
    A: Application + Send + Sync + 'static,
{
    let session = session_from(&headers)?;
    app.ingest_history(session, payload, IngestMode::Append)
        .await
        .map(Json)
        .map_err(status_of)
}

async fn replace_history<A>(
    State(app): State<Arc<A>>,
    headers: HeaderMap,
    Json(payload): Json<HistoryPayload>,
) -> Result<Json<IngestReport>, StatusCode>
where
    A: Application + Send + Sync + 'static,
{
    let session = session_from(&headers)?;
    app.ingest_history(session, payload, IngestMode::Replace)
        .await
        .map(Json)
        .map_err(status_of)
}

async fn get_chart<A>(
    State(app): State<Arc<A>>,
    headers: HeaderMap,
    Query(params): Query<ChartQuery>,
) -> Result<Json<ChartSnapshot>, StatusCode>
where
    A: Application + Send + Sync + 'static,
{
    let session = session_from(&headers)?;
    app.chart(session, params.granularity)
        .await
        .map(Json)
        .map_err(status_of)
}

async fn zoom_chart<A>(
    State(app): State<Arc<A>>,
    headers: HeaderMap,
    Json(request): Json<ZoomRequest>,
) -> Result<Json<ChartSnapshot>, StatusCode>
where
    A: Application + Send + Sync + 'static,
{
    let session = session_from(&headers)?;
    app.zoom(session, request.left, request.right)
        .await
        .map(Json)
        .map_err(status_of)
}

async fn reset_chart<A>(
    State(app): State<Arc<A>>,
    headers: HeaderMap,
) -> Result<Json<ChartSnapshot>, StatusCode>
where
    A: Application + Send + Sync + 'static,
{
    let session = session_from(&headers)?;
    app.reset(session).await.map(Json).map_err(status_of)
}
