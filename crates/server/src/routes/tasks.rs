use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::task::{CreateTask, Task, TaskError, UpdateTask};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_task_middleware};

#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    pub user_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

pub async fn get_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = match (query.user_id, query.category_id) {
        (Some(user_id), None) => Task::find_by_user_id(&state.db().pool, user_id).await?,
        (None, Some(category_id)) => {
            Task::find_by_category_id(&state.db().pool, category_id).await?
        }
        (Some(user_id), Some(category_id)) => {
            let tasks = Task::find_by_category_id(&state.db().pool, category_id).await?;
            tasks.into_iter().filter(|t| t.user_id == user_id).collect()
        }
        (None, None) => Task::find_all(&state.db().pool).await?,
    };
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    tracing::debug!("Creating task '{}'", payload.title);
    match Task::create(&state.db().pool, &payload, Uuid::new_v4()).await {
        Ok(task) => Ok(ResponseJson(ApiResponse::success(task))),
        Err(TaskError::UserNotFound) => Err(ApiError::BadRequest(
            "The referenced user does not exist".to_string(),
        )),
        Err(TaskError::CategoryNotFound) => Err(ApiError::BadRequest(
            "The referenced category does not exist".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn update_task(
    Extension(existing_task): Extension<Task>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = Task::update(&state.db().pool, existing_task.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Task::delete(&state.db().pool, task.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    let tasks_router = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", tasks_router)
}
