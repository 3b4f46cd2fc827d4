use crate::error::ConvertError;
use crate::models::DateOption;
use crate::service::{ConvertOutcome, ConvertRequest, ConverterService};
use axum::{
    extract::{Json, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const OUTPUT_FILE_NAME: &str = "Ket_Qua_UpSSE_BB.xlsx";

/// JSON body for everything that is not the workbook download
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProcessResponse {
    Error { message: String },
    Ambiguous { opt1: DateOption, opt2: DateOption },
}

impl ProcessResponse {
    fn error(message: impl Into<String>) -> Response {
        (StatusCode::OK, Json(ProcessResponse::Error { message: message.into() })).into_response()
    }
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// Upload form: `file_bkhd` (required), `file_bm19`, `confirmed_date`
pub async fn process(
    State(service): State<Arc<ConverterService>>,
    multipart: Multipart,
) -> Response {
    let req = match read_form(multipart).await {
        Ok(Some(req)) => req,
        Ok(None) => return ProcessResponse::error("Vui lòng chọn tệp BKHD!"),
        Err(message) => return ProcessResponse::error(message),
    };

    let result = tokio::task::spawn_blocking(move || service.convert(&req))
        .await
        .unwrap_or_else(|e| Err(ConvertError::Task(e.to_string())));

    match result {
        Ok(ConvertOutcome::Workbook(bytes)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", OUTPUT_FILE_NAME),
                ),
            ],
            bytes,
        )
            .into_response(),
        Ok(ConvertOutcome::Ambiguous { first, second }) => (
            StatusCode::OK,
            Json(ProcessResponse::Ambiguous { opt1: first, opt2: second }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Conversion failed: {}", e);
            ProcessResponse::error(e.to_string())
        }
    }
}

/// `None` when no BKHD file was sent. Empty parts count as absent.
async fn read_form(mut multipart: Multipart) -> Result<Option<ConvertRequest>, String> {
    let mut bkhd = None;
    let mut bm19 = None;
    let mut confirmed_date = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file_bkhd" => {
                let bytes = field.bytes().await.map_err(|e| e.to_string())?;
                bkhd = Some(bytes.to_vec()).filter(|b| !b.is_empty());
            }
            "file_bm19" => {
                let bytes = field.bytes().await.map_err(|e| e.to_string())?;
                bm19 = Some(bytes.to_vec()).filter(|b| !b.is_empty());
            }
            "confirmed_date" => {
                let text = field.text().await.map_err(|e| e.to_string())?;
                confirmed_date = Some(text.trim().to_string()).filter(|t| !t.is_empty());
            }
            other => tracing::debug!("Ignoring form field '{}'", other),
        }
    }

    Ok(bkhd.map(|bkhd| ConvertRequest {
        bkhd,
        bm19,
        confirmed_date,
    }))
}
