use axum::{extract::State, response::Json as ResponseJson};
use sea_orm::ConnectionTrait;
use utils::response::ApiResponse;

use crate::AppState;

pub async fn health_check() -> ResponseJson<ApiResponse<&'static str>> {
    ResponseJson(ApiResponse::success("ok"))
}

/// Store connectivity probe. Runs a trivial query and reports the outcome as
/// a plain string; a broken connection is reported, never propagated.
pub async fn db_test(State(state): State<AppState>) -> String {
    match state.db().pool.execute_unprepared("SELECT 1").await {
        Ok(_) => "Database connection is working!".to_string(),
        Err(err) => format!("Database connection failed: {err}"),
    }
}
