use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    category::{Category, CategoryError, CreateCategory, TaskCounts, UpdateCategory},
    task::Task,
};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::load_category_middleware};

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub user_id: Option<Uuid>,
}

pub async fn get_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = match query.user_id {
        Some(user_id) => Category::find_by_user_id(&state.db().pool, user_id).await?,
        None => Category::find_all(&state.db().pool).await?,
    };
    Ok(ResponseJson(ApiResponse::success(categories)))
}

pub async fn get_category(
    Extension(category): Extension<Category>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(category)))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategory>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    tracing::debug!("Creating category '{}'", payload.name);
    match Category::create(&state.db().pool, &payload, Uuid::new_v4()).await {
        Ok(category) => Ok(ResponseJson(ApiResponse::success(category))),
        Err(CategoryError::UserNotFound) => Err(ApiError::BadRequest(
            "The referenced user does not exist".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn update_category(
    Extension(existing_category): Extension<Category>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateCategory>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    let category =
        Category::update(&state.db().pool, existing_category.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(category)))
}

pub async fn get_category_tasks(
    Extension(category): Extension<Category>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Category::find_tasks(&state.db().pool, category.id).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_category_task_counts(
    Extension(category): Extension<Category>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<TaskCounts>>, ApiError> {
    let counts = Category::task_counts(&state.db().pool, category.id).await?;
    Ok(ResponseJson(ApiResponse::success(counts)))
}

pub async fn delete_category(
    Extension(category): Extension<Category>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Category::delete(&state.db().pool, category.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let category_id_router = Router::new()
        .route(
            "/",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
        .route("/tasks", get(get_category_tasks))
        .route("/task-counts", get(get_category_task_counts))
        .layer(from_fn_with_state(state.clone(), load_category_middleware));

    let categories_router = Router::new()
        .route("/", get(get_categories).post(create_category))
        .nest("/{category_id}", category_id_router);

    Router::new().nest("/categories", categories_router)
}
