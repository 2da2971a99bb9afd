use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::reminder::{CreateReminder, Reminder, ReminderError};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_reminder_middleware};

#[derive(Debug, Deserialize)]
pub struct ReminderQuery {
    pub task_id: Option<Uuid>,
}

pub async fn get_reminders(
    State(state): State<AppState>,
    Query(query): Query<ReminderQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Reminder>>>, ApiError> {
    let reminders = match query.task_id {
        Some(task_id) => Reminder::find_by_task_id(&state.db().pool, task_id).await?,
        None => Reminder::find_all(&state.db().pool).await?,
    };
    Ok(ResponseJson(ApiResponse::success(reminders)))
}

pub async fn get_reminder(
    Extension(reminder): Extension<Reminder>,
) -> Result<ResponseJson<ApiResponse<Reminder>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(reminder)))
}

pub async fn create_reminder(
    State(state): State<AppState>,
    Json(payload): Json<CreateReminder>,
) -> Result<ResponseJson<ApiResponse<Reminder>>, ApiError> {
    match Reminder::create(&state.db().pool, &payload, Uuid::new_v4()).await {
        Ok(reminder) => Ok(ResponseJson(ApiResponse::success(reminder))),
        Err(ReminderError::TaskNotFound) => Err(ApiError::BadRequest(
            "The referenced task does not exist".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn mark_reminder_sent(
    Extension(reminder): Extension<Reminder>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Reminder>>, ApiError> {
    let reminder = Reminder::mark_sent(&state.db().pool, reminder.id).await?;
    Ok(ResponseJson(ApiResponse::success(reminder)))
}

pub async fn delete_reminder(
    Extension(reminder): Extension<Reminder>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Reminder::delete(&state.db().pool, reminder.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let reminder_id_router = Router::new()
        .route("/", get(get_reminder).delete(delete_reminder))
        .route("/mark-sent", post(mark_reminder_sent))
        .layer(from_fn_with_state(state.clone(), load_reminder_middleware));

    let reminders_router = Router::new()
        .route("/", get(get_reminders).post(create_reminder))
        .nest("/{reminder_id}", reminder_id_router);

    Router::new().nest("/reminders", reminders_router)
}
