use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use super::{catalog_error, ApiResult};
use crate::middleware::CurrentUser;
use crate::models::{
    filter_by_release, group_by_date, Movie, ReleaseStatus, ShowtimesOnDate, Theater,
};
use crate::AppContext;

pub fn routes() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/{id}", get(get_movie))
        .route("/movies/{id}/showtimes", get(list_showtimes))
        .route("/theaters", get(list_theaters))
}

#[derive(Debug, Deserialize)]
struct MovieListQuery {
    status: Option<ReleaseStatus>,
}

// GET /api/movies?status=now|upcoming
async fn list_movies(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Query(query): Query<MovieListQuery>,
) -> ApiResult<Json<Vec<Movie>>> {
    let movies = ctx.catalog.list_movies(user.auth()).await.map_err(|e| {
        tracing::error!("list_movies failed: {}", e);
        catalog_error(e)
    })?;

    let movies = match query.status {
        Some(status) => filter_by_release(movies, status, Utc::now().date_naive()),
        None => movies,
    };
    Ok(Json(movies))
}

// GET /api/movies/{id}
async fn get_movie(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Movie>> {
    let movie = ctx
        .catalog
        .get_movie(&id, user.auth())
        .await
        .map_err(catalog_error)?;
    Ok(Json(movie))
}

// GET /api/movies/{id}/showtimes - сгруппировано по дням
async fn list_showtimes(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ShowtimesOnDate>>> {
    let showtimes = ctx
        .catalog
        .list_showtimes(&id, user.auth())
        .await
        .map_err(catalog_error)?;
    Ok(Json(group_by_date(showtimes)))
}

// GET /api/theaters
async fn list_theaters(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Theater>>> {
    let theaters = ctx
        .catalog
        .list_theaters(user.auth())
        .await
        .map_err(catalog_error)?;
    Ok(Json(theaters))
}
