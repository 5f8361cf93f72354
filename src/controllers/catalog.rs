use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::error::{ApiError, BookingError};
use crate::models::{Movie, Show};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/{id}/shows", get(list_shows_for_movie))
}

// GET /api/v1/movies
async fn list_movies(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let movies = state.cache.get_movies().await?;
    Ok(super::ok("Movies retrieved successfully", movies))
}

// GET /api/v1/movies/{id}/shows
async fn list_shows_for_movie(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let movie_id = super::positive_id(movie_id, "movie ID")?;

    if Movie::find(movie_id, &state.db).await?.is_none() {
        return Err(BookingError::NotFound("movie").into());
    }

    let shows = Show::for_movie(movie_id, &state.db).await?;
    tracing::debug!(movie_id, count = shows.len(), "shows loaded");
    Ok(super::ok("Shows retrieved successfully", shows))
}
