// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Web dashboard: upload form, BSDF selector, metrics table and 3D viewer

mod page;

pub use page::{render_index, render_info, Notice, NoticeKind, PageView};

use crate::metrics::MetricsRow;
use crate::pipeline::{Dashboard, UploadOutcome};
use anyhow::{anyhow, Context};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Largest accepted upload request
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub type SharedDashboard = Arc<Mutex<Dashboard>>;

/// Error rendered as an HTML banner with a status code
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn unprocessable(error: impl Into<anyhow::Error>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            error: error.into(),
        }
    }

    pub fn not_found(what: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: anyhow!("{} not found", what),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            log::error!("{:#}", self.error);
        }
        let body = page::render_error(&format!("{:#}", self.error));
        (self.status, Html(body)).into_response()
    }
}

/// Build the router over a dashboard
pub fn router(dashboard: Dashboard) -> Router {
    let state: SharedDashboard = Arc::new(Mutex::new(dashboard));
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload))
        .route("/select", post(select))
        .route("/info", get(info))
        .route("/viz/:file", get(scene))
        .route("/api/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Serve the dashboard until the process is stopped
pub async fn serve(dashboard: Dashboard, addr: &str) -> anyhow::Result<()> {
    let app = router(dashboard);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Serving on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

fn page_view(dashboard: &Dashboard, notices: Vec<Notice>) -> PageView {
    let state = dashboard.state();
    PageView {
        bsdfs: state.bsdfs.clone(),
        active: state.active_bsdf.clone(),
        table_html: state.metrics.to_html(&state.active_bsdf),
        has_scene: dashboard.scene_path(&state.active_bsdf).is_some(),
        notices,
    }
}

#[derive(Debug, Deserialize)]
struct IndexQuery {
    bsdf: Option<String>,
}

async fn index(
    State(dashboard): State<SharedDashboard>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, AppError> {
    let mut dashboard = dashboard.lock().await;
    if let Some(name) = query.bsdf {
        dashboard.select(&name).map_err(AppError::unprocessable)?;
    }
    Ok(Html(render_index(&page_view(&dashboard, Vec::new()))))
}

#[derive(Debug, Deserialize)]
struct SelectForm {
    bsdf: String,
}

async fn select(
    State(dashboard): State<SharedDashboard>,
    Form(form): Form<SelectForm>,
) -> Result<Redirect, AppError> {
    dashboard
        .lock()
        .await
        .select(&form.bsdf)
        .map_err(AppError::unprocessable)?;
    Ok(Redirect::to("/"))
}

async fn upload(
    State(dashboard): State<SharedDashboard>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(AppError::unprocessable)?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if file_name.is_empty() {
            continue;
        }
        let bytes = field.bytes().await.map_err(AppError::unprocessable)?;
        files.push((file_name, bytes.to_vec()));
    }
    log::debug!("Received {} uploaded files", files.len());

    let shared = dashboard.clone();
    let outcomes = tokio::task::spawn_blocking(move || {
        shared.blocking_lock().process_uploads(files)
    })
    .await
    .context("Upload task failed")??;

    let notices: Vec<Notice> = outcomes.iter().map(Notice::from_outcome).collect();
    let status = if outcomes.iter().any(UploadOutcome::is_rejected) {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };

    let dashboard = dashboard.lock().await;
    let body = render_index(&page_view(&dashboard, notices));
    Ok((status, Html(body)).into_response())
}

async fn scene(
    State(dashboard): State<SharedDashboard>,
    Path(file): Path<String>,
) -> Result<Response, AppError> {
    let name = file.strip_suffix(".glb").unwrap_or(&file);
    let path = dashboard
        .lock()
        .await
        .scene_path(name)
        .ok_or_else(|| AppError::not_found(&file))?;
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(([(header::CONTENT_TYPE, "model/gltf-binary")], bytes).into_response())
}

async fn info(State(dashboard): State<SharedDashboard>) -> Result<Html<String>, AppError> {
    let dashboard = dashboard.lock().await;
    Ok(Html(render_info(dashboard.config())))
}

#[derive(Debug, Serialize)]
struct MetricsResponse {
    active: String,
    bsdfs: Vec<String>,
    rows: Vec<MetricsRow>,
}

async fn metrics(State(dashboard): State<SharedDashboard>) -> Result<Json<MetricsResponse>, AppError> {
    let dashboard = dashboard.lock().await;
    let state = dashboard.state();
    Ok(Json(MetricsResponse {
        active: state.active_bsdf.clone(),
        bsdfs: state.bsdfs.clone(),
        rows: state.metrics.rows().to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::SessionError;
    use crate::radiance::{MatrixEngine, ThreePhaseInputs};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "bsdfview-boundary";

    struct UnusedEngine;

    impl MatrixEngine for UnusedEngine {
        fn three_phase(&self, _inputs: &ThreePhaseInputs, _output: &std::path::Path) -> anyhow::Result<Duration> {
            anyhow::bail!("three-phase run was not expected")
        }
    }

    fn app() -> anyhow::Result<(TempDir, Router)> {
        let dir = TempDir::new()?;
        let dashboard = Dashboard::with_engine(AppConfig::with_root(dir.path()), Box::new(UnusedEngine))?;
        Ok((dir, router(dashboard)))
    }

    fn multipart_upload(file_name: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/xml\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::post("/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_rejected_upload_shows_banner() -> anyhow::Result<()> {
        let (_dir, app) = app()?;
        let xml = r#"<WindowElement><Optical><Layer><DataDefinition><AngleBasis><AngleBasisName>LBNL/Klems Half</AngleBasisName></AngleBasis></DataDefinition></Layer></Optical></WindowElement>"#;

        let response = app.oneshot(multipart_upload("half.xml", xml)).await?;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_text(response).await;
        assert!(body.contains("notice error"));
        assert!(body.contains("invalid angle basis"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unsafe_upload_name_is_rejected() -> anyhow::Result<()> {
        let (dir, app) = app()?;

        let response = app
            .oneshot(multipart_upload("a$(touch${IFS}x).xml", "<WindowElement/>"))
            .await?;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("not a valid BSDF name"));
        assert!(!dir.path().join("bsdf").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_select_unknown_bsdf() -> anyhow::Result<()> {
        let (_dir, app) = app()?;
        let request = Request::post("/select")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("bsdf=missing"))?;

        let response = app.oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("missing"));
        Ok(())
    }

    #[tokio::test]
    async fn test_select_redirects_home() -> anyhow::Result<()> {
        let (_dir, app) = app()?;
        let request = Request::post("/select")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("bsdf=clear"))?;

        let response = app.oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_scene_is_not_found() -> anyhow::Result<()> {
        let (_dir, app) = app()?;
        let response = app
            .oneshot(Request::get("/viz/x.glb").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_index_query_selects() -> anyhow::Result<()> {
        let (_dir, app) = app()?;

        let response = app
            .clone()
            .oneshot(Request::get("/?bsdf=clear").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("clear"));

        let response = app
            .oneshot(Request::get("/?bsdf=unknown").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        Ok(())
    }

    #[test]
    fn test_error_status() {
        let error = AppError::unprocessable(SessionError::UnknownBsdf("x".to_string()));
        assert_eq!(error.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let error = AppError::from(anyhow!("rmtxop failed"));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(AppError::not_found("x.glb").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_response() {
        let response = AppError::unprocessable(anyhow!("bad basis")).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
