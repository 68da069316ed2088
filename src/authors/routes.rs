use axum::{
    Router,
    routing::get,
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_authors).post(handler::create_author))
        .route(
            "/:id",
            get(handler::get_author)
                .put(handler::update_author)
                .delete(handler::delete_author),
        )
}
