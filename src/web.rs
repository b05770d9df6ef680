//
// web.rs
// Modality-Classifier-rs
//
// Axum-based HTTP server exposing the upload-and-classify endpoint with sanitized error responses.
//
// Thales Matheus Mendonça Santos - December 2025

use std::fmt::Display;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::classify::OnnxClassifier;
use crate::error::PipelineError;
use crate::pipeline;

#[derive(Clone)]
struct AppState {
    classifier: Arc<OnnxClassifier>,
}

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

/// Bootstraps the Axum HTTP server and wires up API routes.
///
/// The classifier artifact is loaded exactly once, before the listener is
/// bound: a missing or broken model keeps the process from serving at all.
pub async fn start_server(host: &str, port: u16, model_path: &Path) -> anyhow::Result<()> {
    let classifier = Arc::new(OnnxClassifier::load(model_path)?);
    let state = AppState { classifier };

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("Server running at http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn predict_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let mut original_name = None;
    let mut data = None;

    // Find the first part named "file" and pull bytes eagerly.
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| reject(StatusCode::BAD_REQUEST, "Malformed multipart request", err))?
    {
        if field.name() == Some("file") {
            original_name = field.file_name().map(|s| s.to_string());
            data = Some(field.bytes().await.map_err(|err| {
                reject(StatusCode::BAD_REQUEST, "Failed to read uploaded file", err)
            })?);
            break;
        }
    }

    let data = data.ok_or_else(|| {
        tracing::error!("request carried no file part");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No file provided" })),
        )
    })?;
    let filename = original_name.unwrap_or_default();

    let outcome = pipeline::classify_bytes(state.classifier.as_ref(), &filename, &data)
        .map_err(sanitize)?;

    Ok(Json(json!({ "classification": outcome.modality })))
}

/// Boundary adapter: every pipeline failure becomes a generic client message.
/// Full diagnostic detail stays in the operational log.
fn sanitize(err: PipelineError) -> (StatusCode, Json<Value>) {
    tracing::error!(error = %err, "classification request failed");

    let (status, message) = match err {
        PipelineError::UnsupportedMedia(_) => (StatusCode::BAD_REQUEST, "Unsupported file type"),
        PipelineError::Decode(_) => (StatusCode::BAD_REQUEST, "Could not decode file"),
        PipelineError::Preprocess(_)
        | PipelineError::Inference(_)
        | PipelineError::ArtifactLoad(_)
        | PipelineError::Io(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal error occurred",
        ),
    };

    (status, Json(json!({ "error": message })))
}

fn reject<E: Display>(
    status: StatusCode,
    message: &'static str,
    err: E,
) -> (StatusCode, Json<Value>) {
    tracing::error!(error = %err, "rejecting request");
    (status, Json(json!({ "error": message })))
}
