use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::BookQueryParams;
use crate::catalog::parse_id;
use crate::handler::AppState;
use crate::model::{BookPatch, NewBook};
use crate::{fail, rejected_payload};

pub async fn list_books(State(state): State<AppState>, Query(params): Query<BookQueryParams>) -> Response {
    match state.catalog.list_books(params).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => fail("list books", e),
    }
}

pub async fn get_book(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id, "book") {
        Ok(id) => id,
        Err(e) => return fail("get book", e),
    };
    match state.catalog.get_book(id).await {
        Ok(book) => (StatusCode::OK, Json(book)).into_response(),
        Err(e) => fail("get book", e),
    }
}

pub async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_payload("create book", rejection),
    };
    match state.catalog.create_book(payload).await {
        Ok(book) => {
            tracing::info!(book = %book.id, author = %book.author, "created book");
            (StatusCode::CREATED, Json(book)).into_response()
        }
        Err(e) => fail("create book", e),
    }
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<BookPatch>, JsonRejection>,
) -> Response {
    let id = match parse_id(&id, "book") {
        Ok(id) => id,
        Err(e) => return fail("update book", e),
    };
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_payload("update book", rejection),
    };
    match state.catalog.update_book(id, payload).await {
        Ok(book) => (StatusCode::OK, Json(book)).into_response(),
        Err(e) => fail("update book", e),
    }
}

pub async fn delete_book(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id, "book") {
        Ok(id) => id,
        Err(e) => return fail("delete book", e),
    };
    match state.catalog.delete_book(id).await {
        Ok(book) => {
            tracing::info!(book = %book.id, "deleted book");
            (StatusCode::OK, Json(book)).into_response()
        }
        Err(e) => fail("delete book", e),
    }
}
