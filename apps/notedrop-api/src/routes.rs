use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	middleware,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use uuid::Uuid;

use notedrop_service::{
	CreateNoteRequest, CreateNoteResponse, Error as ServiceError, ListNotesRequest,
	ListNotesResponse, ReplayResponse,
};

use crate::{auth, rate_limit, state::AppState};

pub fn router(state: AppState) -> Router {
	let notes = Router::new()
		.route("/notes", post(create_note).get(list_notes))
		.route("/notes/{id}/replay", post(replay))
		.layer(middleware::from_fn_with_state(state.clone(), rate_limit::rate_limit_middleware))
		.layer(middleware::from_fn_with_state(state.clone(), auth::auth_middleware));

	Router::new().route("/health", get(health)).merge(notes).with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn create_note(
	State(state): State<AppState>,
	Json(payload): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<CreateNoteResponse>), ApiError> {
	let response = state.service.create_note(payload).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn list_notes(
	State(state): State<AppState>,
	Query(query): Query<ListNotesRequest>,
) -> Result<Json<ListNotesResponse>, ApiError> {
	let response = state.service.list_notes(query).await?;

	Ok(Json(response))
}

async fn replay(
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
) -> Result<Json<ReplayResponse>, ApiError> {
	let response = state.service.replay(id).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::Validation { issues } => json_error(
				StatusCode::BAD_REQUEST,
				"validation_failed",
				"Validation failed.",
				Some(issues),
			),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "not_found", message, None),
			ServiceError::Conflict { message } =>
				json_error(StatusCode::CONFLICT, "conflict", message, None),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage error while handling request.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "Internal error.", None)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
