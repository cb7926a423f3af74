use axum::{
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
    titles::{dto::CreateTitleRequest, repo_types::Title, services},
};

pub fn title_routes() -> Router<AppState> {
    Router::new()
        .route("/title", get(list_titles).post(create_title))
        .route("/title/:id", delete(delete_title))
}

#[instrument(skip(state))]
pub async fn list_titles(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Title>>, AppError> {
    let titles = services::list_titles(state.titles.as_ref(), user_id).await?;
    Ok(Json(titles))
}

#[instrument(skip(state, payload))]
pub async fn create_title(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateTitleRequest>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<Title>), AppError> {
    let title = services::create_title(state.titles.as_ref(), user_id, &payload.title).await?;
    info!(title_id = %title.id, user_id = %user_id, "title created");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/v1/title/{}", title.id))],
        Json(title),
    ))
}

#[instrument(skip(state))]
pub async fn delete_title(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Title>, AppError> {
    // A malformed id can never match a row.
    let id = Uuid::parse_str(&id).map_err(|_| AppError::NotFound("Title"))?;
    let title = services::delete_title(state.titles.as_ref(), user_id, id).await?;
    info!(title_id = %title.id, user_id = %user_id, "title deleted");
    Ok(Json(title))
}
