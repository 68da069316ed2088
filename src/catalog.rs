//! The catalog repository: book listing (filter/sort/paginate), book
//! mutations with the author book-count synchronizer, author CRUD, and the
//! book-count reconciler.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::api::{BookPage, BookQueryParams};
use crate::error::CatalogError;
use crate::model::{
    Author, AuthorPatch, Book, BookPatch, BookRecord, NewAuthor, NewBook, timestamp_now,
};
use crate::query::{Filter, Query, SortDirection};
use crate::store::Store;

const AUTHORS: &str = "authors";
const BOOKS: &str = "books";

const DEFAULT_PAGE: usize = 1;
const DEFAULT_LIMIT: usize = 10;
const BOOK_COUNT: &str = "bookCount";

/// Book fields the listing endpoint accepts in `sortBy`. Checked against
/// the declared document shape when the catalog is constructed, so a field
/// rename cannot silently detach the enumeration from the schema.
const SORTABLE_FIELDS: &[&str] = &["title", "genre", "publishYear", "createdAt", "author"];

/// Book fields the listing endpoint filters on.
const FILTERABLE_FIELDS: &[&str] = &["title", "author", "genre", "publishYear"];

pub struct Catalog {
    store: Arc<Store>,
}

impl Catalog {
    pub fn new(store: Arc<Store>) -> Result<Self, CatalogError> {
        for field in SORTABLE_FIELDS.iter().chain(FILTERABLE_FIELDS) {
            if !Book::FIELDS.contains(field) {
                return Err(CatalogError::invalid(format!(
                    "field enumeration names {} which is not part of the book shape",
                    field
                )));
            }
        }
        Ok(Catalog { store })
    }

    // ---- books ----

    /// Translates the request parameters into a store query and returns one
    /// page of books with pagination metadata and resolved author names.
    pub async fn list_books(&self, params: BookQueryParams) -> Result<BookPage, CatalogError> {
        let mut filter = Filter::new();
        if let Some(title) = &params.title {
            filter = filter.contains_ignore_case("title", title.as_str());
        }
        if let Some(author) = &params.author {
            let id = parse_id(author, "author")?;
            filter = filter.eq("author", id.to_string());
        }
        if let Some(genre) = &params.genre {
            filter = filter.contains_ignore_case("genre", genre.as_str());
        }
        if let Some(year) = &params.publish_year {
            let year: i64 = year
                .parse()
                .map_err(|_| CatalogError::invalid(format!("publishYear {} is not an integer", year)))?;
            filter = filter.eq("publishYear", year);
        }

        let sort_field = params.sort_by.as_deref().unwrap_or("title");
        if !SORTABLE_FIELDS.contains(&sort_field) {
            return Err(CatalogError::invalid(format!(
                "cannot sort by unknown field {}",
                sort_field
            )));
        }
        let direction = match params.order.as_deref() {
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        };

        let page = positive_or(params.page.as_deref(), DEFAULT_PAGE);
        let limit = positive_or(params.limit.as_deref(), DEFAULT_LIMIT);
        // saturate rather than overflow on absurdly large page numbers;
        // the window just lands past the end of the collection
        let skip = page.saturating_sub(1).saturating_mul(limit);

        let query = Query::new()
            .filter(filter.clone())
            .sort(sort_field, direction)
            .skip(skip)
            .limit(limit);

        let docs = self.store.find(BOOKS, &query).await;
        let total_books = self.store.count(BOOKS, &filter).await;

        let mut books = Vec::with_capacity(docs.len());
        for doc in docs {
            let book: Book = serde_json::from_value(doc)?;
            let author_name = self.author_name(&book.author).await;
            books.push(BookRecord::resolve(book, author_name));
        }

        Ok(BookPage {
            total_books,
            total_pages: total_books.div_ceil(limit),
            current_page: page,
            books,
        })
    }

    pub async fn get_book(&self, id: Uuid) -> Result<Book, CatalogError> {
        match self.store.get(BOOKS, &id.to_string()).await {
            Some(doc) => Ok(serde_json::from_value(doc)?),
            None => Err(CatalogError::NotFound("book")),
        }
    }

    /// Inserts the book, then bumps the author's book count. The counter is
    /// always adjusted after the primary write succeeds; a crash in between
    /// leaves drift for the reconciler to heal.
    pub async fn create_book(&self, new: NewBook) -> Result<Book, CatalogError> {
        self.require_author(&new.author).await?;

        let book = Book {
            id: Uuid::new_v4(),
            title: new.title,
            author: new.author,
            genre: new.genre,
            publish_year: new.publish_year,
            created_at: timestamp_now(),
        };
        self.store
            .insert(BOOKS, &book.id.to_string(), serde_json::to_value(&book)?)
            .await?;
        self.store
            .increment(AUTHORS, &book.author.to_string(), BOOK_COUNT, 1)
            .await?;
        Ok(book)
    }

    /// Applies a partial update. When the patch moves the book to a
    /// different author, the old author's count is decremented and the new
    /// one's incremented, after the book itself is written.
    pub async fn update_book(&self, id: Uuid, patch: BookPatch) -> Result<Book, CatalogError> {
        let existing = self.get_book(id).await?;
        if let Some(new_author) = &patch.author {
            self.require_author(new_author).await?;
        }

        let updated = self
            .store
            .merge(BOOKS, &id.to_string(), serde_json::to_value(&patch)?)
            .await?
            .ok_or(CatalogError::NotFound("book"))?;
        let updated: Book = serde_json::from_value(updated)?;

        if let Some(new_author) = patch.author {
            if new_author != existing.author {
                self.store
                    .increment(AUTHORS, &existing.author.to_string(), BOOK_COUNT, -1)
                    .await?;
                self.store
                    .increment(AUTHORS, &new_author.to_string(), BOOK_COUNT, 1)
                    .await?;
            }
        }

        Ok(updated)
    }

    pub async fn delete_book(&self, id: Uuid) -> Result<Book, CatalogError> {
        let removed = self
            .store
            .remove(BOOKS, &id.to_string())
            .await?
            .ok_or(CatalogError::NotFound("book"))?;
        let book: Book = serde_json::from_value(removed)?;
        self.store
            .increment(AUTHORS, &book.author.to_string(), BOOK_COUNT, -1)
            .await?;
        Ok(book)
    }

    // ---- authors ----

    pub async fn create_author(&self, new: NewAuthor) -> Result<Author, CatalogError> {
        let author = Author {
            id: Uuid::new_v4(),
            name: new.name,
            nationality: new.nationality,
            book_count: 0,
            created_at: timestamp_now(),
        };
        self.store
            .insert(AUTHORS, &author.id.to_string(), serde_json::to_value(&author)?)
            .await?;
        Ok(author)
    }

    pub async fn list_authors(&self) -> Result<Vec<Author>, CatalogError> {
        let query = Query::new().sort("createdAt", SortDirection::Asc);
        let docs = self.store.find(AUTHORS, &query).await;
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(CatalogError::from))
            .collect()
    }

    pub async fn get_author(&self, id: Uuid) -> Result<Author, CatalogError> {
        match self.store.get(AUTHORS, &id.to_string()).await {
            Some(doc) => Ok(serde_json::from_value(doc)?),
            None => Err(CatalogError::NotFound("author")),
        }
    }

    /// Updates name and nationality. The patch type carries no `bookCount`
    /// field, so the aggregate cannot be overwritten through this path.
    pub async fn update_author(&self, id: Uuid, patch: AuthorPatch) -> Result<Author, CatalogError> {
        let updated = self
            .store
            .merge(AUTHORS, &id.to_string(), serde_json::to_value(&patch)?)
            .await?
            .ok_or(CatalogError::NotFound("author"))?;
        Ok(serde_json::from_value(updated)?)
    }

    pub async fn delete_author(&self, id: Uuid) -> Result<Author, CatalogError> {
        let removed = self
            .store
            .remove(AUTHORS, &id.to_string())
            .await?
            .ok_or(CatalogError::NotFound("author"))?;
        Ok(serde_json::from_value(removed)?)
    }

    // ---- reconciliation ----

    /// Recomputes every author's true book count from the books collection
    /// and overwrites any drifted `bookCount`. This is the repair path for
    /// the non-transactional two-write mutations. Returns the number of
    /// authors repaired.
    pub async fn reconcile_book_counts(&self) -> Result<usize, CatalogError> {
        let mut actual: HashMap<String, i64> = HashMap::new();
        for doc in self.store.all(BOOKS).await {
            if let Some(author) = doc.get("author").and_then(Value::as_str) {
                *actual.entry(author.to_string()).or_default() += 1;
            }
        }

        let mut repaired = 0;
        for doc in self.store.all(AUTHORS).await {
            let Some(id) = doc.get("id").and_then(Value::as_str).map(str::to_string) else {
                continue;
            };
            let recorded = doc.get(BOOK_COUNT).and_then(Value::as_i64).unwrap_or(0);
            let expected = actual.get(&id).copied().unwrap_or(0);
            if recorded != expected {
                tracing::warn!(
                    author = %id,
                    recorded,
                    expected,
                    "book count drifted, repairing"
                );
                self.store
                    .merge(AUTHORS, &id, serde_json::json!({ BOOK_COUNT: expected }))
                    .await?;
                repaired += 1;
            }
        }
        Ok(repaired)
    }

    async fn require_author(&self, id: &Uuid) -> Result<(), CatalogError> {
        if self.store.get(AUTHORS, &id.to_string()).await.is_none() {
            return Err(CatalogError::invalid(format!("author {} does not exist", id)));
        }
        Ok(())
    }

    async fn author_name(&self, id: &Uuid) -> Option<String> {
        let doc = self.store.get(AUTHORS, &id.to_string()).await?;
        doc.get("name").and_then(Value::as_str).map(str::to_string)
    }
}

/// Parses a path or query identifier, rejecting malformed ids as client
/// input errors rather than treating them as infrastructure failures.
pub fn parse_id(raw: &str, entity: &str) -> Result<Uuid, CatalogError> {
    Uuid::parse_str(raw)
        .map_err(|_| CatalogError::invalid(format!("{} id {} is not a valid id", entity, raw)))
}

/// Numeric coercion for page and limit: absent, non-numeric, or
/// non-positive values fall back to the default.
fn positive_or(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}
