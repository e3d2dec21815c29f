use std::{sync::Arc, time::Instant};

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mrg_client::{MeasurementRecord, SnapshotStore, StoreError};
use serde::Serialize;

use crate::{
    ingest::ingest_workbook,
    pipeline::PipelineError,
    sources::{SheetFormat, SheetOptions, WorkbookSource},
};

const UPLOAD_OK: &str = "Файл успешно загружен";
const UPLOAD_FAILED: &str = "Ошибка при обработке файла";
const DATA_NOT_FOUND: &str = "Данные не найдены";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SnapshotStore>,
    pub sheet: SheetOptions,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub data: Vec<MeasurementRecord>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    details: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    details: String,
}

impl ApiError {
    fn upload(status: StatusCode, details: impl ToString) -> Self {
        Self {
            status,
            error: UPLOAD_FAILED,
            details: details.to_string(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        let status = match &e {
            PipelineError::MalformedInput(_) | PipelineError::Transform(_) => StatusCode::BAD_REQUEST,
            PipelineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::upload(status, e)
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::upload(e.status(), e.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let status = match e {
            StoreError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            error: DATA_NOT_FOUND,
            details: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let limit = state.max_upload_bytes;

    Router::new()
        .route("/api/upload", post(upload))
        .route("/api/data", get(data))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state).into_make_service()).await
}

struct UploadedFile {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

async fn read_file_field(multipart: &mut Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await?;
        return Ok(UploadedFile {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::upload(
        StatusCode::BAD_REQUEST,
        "multipart body has no 'file' field",
    ))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    metrics::counter!("mrg_uploads_total").increment(1);
    let started = Instant::now();

    let result = async {
        let file = read_file_field(&mut multipart).await?;
        tracing::info!(
            file_name = file.file_name.as_deref().unwrap_or("<unnamed>"),
            bytes = file.bytes.len(),
            "upload received"
        );

        let format = SheetFormat::from_file_name(file.file_name.as_deref());
        let source = WorkbookSource::from_bytes(file.bytes, format, state.sheet.clone());
        Ok::<_, ApiError>(ingest_workbook(source, state.store.clone()).await?)
    }
    .await;

    metrics::histogram!("mrg_upload_duration_seconds").record(started.elapsed().as_secs_f64());

    match result {
        Ok(data) => Ok(Json(UploadResponse {
            message: UPLOAD_OK.to_string(),
            data,
        })),
        Err(e) => {
            metrics::counter!("mrg_upload_failures_total").increment(1);
            tracing::warn!(status = %e.status, details = %e.details, "upload rejected");
            Err(e)
        }
    }
}

async fn data(State(state): State<AppState>) -> Result<Json<Vec<MeasurementRecord>>, ApiError> {
    Ok(Json(state.store.load().await?))
}
