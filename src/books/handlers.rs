use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{ListingRequest, MessageResponse},
    repo_types::{Listing, ListingWithSeller},
    services,
};
use crate::{auth::AuthUser, error::AppError, state::AppState};

pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
}

#[instrument(skip(state))]
pub async fn list_books(
    State(state): State<AppState>,
) -> Result<Json<Vec<ListingWithSeller>>, AppError> {
    Ok(Json(services::list_listings(&state).await?))
}

#[instrument(skip(state))]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ListingWithSeller>, AppError> {
    let id = services::parse_listing_id(&id)?;
    Ok(Json(services::get_listing(&state, id).await?))
}

/// POST /books, owner taken from the bearer token.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_book(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<ListingRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<Listing>), AppError> {
    let Json(payload) = payload?;
    let listing = services::create_listing(&state, &user, payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/books/{}", listing.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(listing)))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_book(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<ListingRequest>, JsonRejection>,
) -> Result<Json<Listing>, AppError> {
    let id = services::parse_listing_id(&id)?;
    let payload = payload.map(|Json(p)| p).map_err(AppError::from);
    Ok(Json(services::update_listing(&state, &user, id, payload).await?))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_book(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = services::parse_listing_id(&id)?;
    services::delete_listing(&state, &user, id).await?;
    Ok(Json(MessageResponse {
        message: "Book deleted successfully".into(),
    }))
}
