//! Placeholder CRUD handlers.
//!
//! Each request works through its own unit of work, taken from the
//! [`RequestContext`] extractor and disposed when the handler returns.

use axum::{
    extract::{rejection::JsonRejection, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use placekeep_core::placeholder::{validate_placeholder, Placeholder};
use placekeep_core::storage::PlaceholderRepository;

use crate::{context::RequestContext, handlers::AppError};

const ALREADY_EXISTS: &str = "Placeholder with this Name already exists";
const CREATE_FAILED: &str = "Something went wrong while trying to create a new placeholder";

/// Error response with a plain message (for malformed bodies).
fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let msg = message.into();
    tracing::warn!(status = %status, message = %msg, "API error");
    (status, msg).into_response()
}

/// Unwraps a JSON body and checks it, or builds the 400 response.
fn validated(payload: Result<Json<Placeholder>, JsonRejection>) -> Result<Placeholder, Response> {
    let Json(placeholder) =
        payload.map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text()))?;
    checked(placeholder)
}

fn checked(placeholder: Placeholder) -> Result<Placeholder, Response> {
    validate_placeholder(&placeholder).map_err(|failures| {
        tracing::warn!(failures = failures.len(), "Placeholder failed validation");
        (StatusCode::BAD_REQUEST, Json(failures)).into_response()
    })?;
    Ok(placeholder)
}

/// List all placeholders (GET /placeholders).
pub async fn list_placeholders(context: RequestContext) -> Result<Json<Vec<Placeholder>>, AppError> {
    let placeholders = context.placeholders()?.get_all().await?;
    tracing::debug!(request_id = %context.request_id, count = placeholders.len(), "Listed placeholders");
    Ok(Json(placeholders))
}

/// Get a single placeholder by ID (GET /placeholders/{id}).
pub async fn get_placeholder(
    context: RequestContext,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    match context.placeholders()?.get_by_id(id).await? {
        Some(placeholder) => Ok(Json(placeholder).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// Create a new placeholder (POST /placeholders).
pub async fn create_placeholder(
    context: RequestContext,
    payload: Result<Json<Placeholder>, JsonRejection>,
) -> Result<Response, AppError> {
    let placeholder = match validated(payload) {
        Ok(placeholder) => placeholder,
        Err(response) => return Ok(response),
    };
    let repository = context.placeholders()?;

    if repository.get_by_id(placeholder.id).await?.as_ref() == Some(&placeholder) {
        tracing::warn!(placeholder_id = placeholder.id, "Placeholder already exists");
        return Ok((StatusCode::BAD_REQUEST, Json(ALREADY_EXISTS)).into_response());
    }

    if !repository.create(&placeholder).await? {
        return Ok((StatusCode::BAD_REQUEST, Json(CREATE_FAILED)).into_response());
    }

    tracing::info!(
        request_id = %context.request_id,
        placeholder_id = placeholder.id,
        name = %placeholder.name,
        "Created new placeholder"
    );

    let location = format!("/placeholders/{}", placeholder.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(placeholder),
    )
        .into_response())
}

/// Update a placeholder by ID (PUT /placeholders/{id}).
///
/// The path ID replaces whatever ID the body carries.
pub async fn update_placeholder(
    context: RequestContext,
    Path(id): Path<i32>,
    payload: Result<Json<Placeholder>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(mut placeholder) = match payload {
        Ok(json) => json,
        Err(e) => return Ok(error_response(StatusCode::BAD_REQUEST, e.body_text())),
    };
    placeholder.id = id;
    let placeholder = match checked(placeholder) {
        Ok(placeholder) => placeholder,
        Err(response) => return Ok(response),
    };

    if !context.placeholders()?.update(&placeholder).await? {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    tracing::info!(request_id = %context.request_id, placeholder_id = id, "Updated placeholder");

    Ok(Json(placeholder).into_response())
}

/// Delete a placeholder by ID (DELETE /placeholders/{id}).
pub async fn delete_placeholder(
    context: RequestContext,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    tracing::debug!(placeholder_id = id, "Received delete placeholder request");

    if !context.placeholders()?.delete(id).await? {
        return Ok(StatusCode::NOT_FOUND);
    }

    tracing::info!(request_id = %context.request_id, placeholder_id = id, "Deleted placeholder");

    Ok(StatusCode::NO_CONTENT)
}
