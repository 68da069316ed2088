use serde::{Deserialize, Serialize};

use crate::model::BookRecord;

/// Query parameters accepted by `GET /api/books`. Numeric parameters
/// arrive as raw strings so the catalog controls the coercion rules.
#[derive(Debug, Default, Deserialize)]
pub struct BookQueryParams {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    #[serde(rename = "publishYear")]
    pub publish_year: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// One page of the books listing, with pagination metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookPage {
    #[serde(rename = "totalBooks")]
    pub total_books: usize,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
    #[serde(rename = "currentPage")]
    pub current_page: usize,
    pub books: Vec<BookRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
