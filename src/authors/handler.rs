use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::catalog::parse_id;
use crate::handler::AppState;
use crate::model::{AuthorPatch, NewAuthor};
use crate::{fail, rejected_payload};

pub async fn list_authors(State(state): State<AppState>) -> Response {
    match state.catalog.list_authors().await {
        Ok(authors) => (StatusCode::OK, Json(authors)).into_response(),
        Err(e) => fail("list authors", e),
    }
}

pub async fn get_author(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id, "author") {
        Ok(id) => id,
        Err(e) => return fail("get author", e),
    };
    match state.catalog.get_author(id).await {
        Ok(author) => (StatusCode::OK, Json(author)).into_response(),
        Err(e) => fail("get author", e),
    }
}

pub async fn create_author(
    State(state): State<AppState>,
    payload: Result<Json<NewAuthor>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_payload("create author", rejection),
    };
    match state.catalog.create_author(payload).await {
        Ok(author) => {
            tracing::info!(author = %author.id, "created author");
            (StatusCode::CREATED, Json(author)).into_response()
        }
        Err(e) => fail("create author", e),
    }
}

pub async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AuthorPatch>, JsonRejection>,
) -> Response {
    let id = match parse_id(&id, "author") {
        Ok(id) => id,
        Err(e) => return fail("update author", e),
    };
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_payload("update author", rejection),
    };
    match state.catalog.update_author(id, payload).await {
        Ok(author) => (StatusCode::OK, Json(author)).into_response(),
        Err(e) => fail("update author", e),
    }
}

pub async fn delete_author(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id, "author") {
        Ok(id) => id,
        Err(e) => return fail("delete author", e),
    };
    match state.catalog.delete_author(id).await {
        Ok(author) => {
            tracing::info!(author = %author.id, "deleted author");
            (StatusCode::OK, Json(author)).into_response()
        }
        Err(e) => fail("delete author", e),
    }
}
