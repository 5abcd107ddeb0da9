use axum::{Json, extract::rejection::JsonRejection};

use super::ApiError;
use crate::domain::WatchStatus;

/// Unwraps a JSON body, turning extractor rejections into a 400 envelope.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::validation(format!("Invalid request body: {}", e.body_text())))
}

/// Parses a path id, accepting only positive integers.
pub fn validate_id(raw: &str, resource: &str) -> Result<i32, ApiError> {
    match raw.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::validation(format!(
            "Invalid {} ID: {}. ID must be a positive integer",
            resource, raw
        ))),
    }
}

pub fn validate_status(raw: &str) -> Result<WatchStatus, ApiError> {
    raw.parse::<WatchStatus>().map_err(|_| {
        ApiError::validation(format!(
            "Invalid status: '{}'. Expected one of: to_watch, watching, completed",
            raw
        ))
    })
}

/// An absent or blank status means "no filter".
pub fn validate_status_filter(raw: Option<&str>) -> Result<Option<WatchStatus>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => validate_status(s).map(Some),
    }
}

pub fn validate_mal_id(mal_id: Option<i64>) -> Result<i32, ApiError> {
    let Some(mal_id) = mal_id else {
        return Err(ApiError::validation("malId is required"));
    };

    i32::try_from(mal_id)
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ApiError::validation(format!(
                "Invalid malId: {}. malId must be a positive integer",
                mal_id
            ))
        })
}

pub fn validate_title(title: Option<&str>) -> Result<String, ApiError> {
    let trimmed = title.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(ApiError::validation("title is required"));
    }
    Ok(trimmed.to_string())
}
