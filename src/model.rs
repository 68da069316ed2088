use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current time truncated to microseconds, the precision `timestamp`
/// serializes at, so created timestamps round-trip exactly.
pub fn timestamp_now() -> DateTime<Utc> {
    let now = Utc::now();
    now.with_nanosecond(now.nanosecond() / 1_000 * 1_000).unwrap_or(now)
}

/// Serde for `createdAt` fields. Always emits six fractional digits so the
/// stored string form is fixed-width and lexicographic order matches
/// chronological order, which the store's string sort relies on.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub nationality: String,
    /// Derived aggregate: the number of books currently referencing this
    /// author. Maintained by the book mutations, healed by the reconciler,
    /// never writable through the author API.
    #[serde(rename = "bookCount", default)]
    pub book_count: i64,
    #[serde(rename = "createdAt", with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(rename = "publishYear", default, skip_serializing_if = "Option::is_none")]
    pub publish_year: Option<i64>,
    #[serde(rename = "createdAt", with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// The declared document shape, used to validate the filterable and
    /// sortable field enumerations at startup.
    pub const FIELDS: &'static [&'static str] =
        &["id", "title", "author", "genre", "publishYear", "createdAt"];
}

/// A book's author reference resolved for the list endpoint. The name is
/// null when the reference dangles; the read never fails over it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub name: Option<String>,
}

/// List-endpoint shape: a book with its author reference resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: Uuid,
    pub title: String,
    pub author: AuthorRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(rename = "publishYear", default, skip_serializing_if = "Option::is_none")]
    pub publish_year: Option<i64>,
    #[serde(rename = "createdAt", with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl BookRecord {
    pub fn resolve(book: Book, author_name: Option<String>) -> Self {
        BookRecord {
            id: book.id,
            title: book.title,
            author: AuthorRef {
                id: book.author,
                name: author_name,
            },
            genre: book.genre,
            publish_year: book.publish_year,
            created_at: book.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAuthor {
    pub name: String,
    pub nationality: String,
}

/// Author update payload. Deliberately excludes `bookCount`: the aggregate
/// is read-only from the API's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: Uuid,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(rename = "publishYear", default)]
    pub publish_year: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(rename = "publishYear", default, skip_serializing_if = "Option::is_none")]
    pub publish_year: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_serializes_with_wire_field_names() {
        let book = Book {
            id: Uuid::new_v4(),
            title: "Dune".to_string(),
            author: Uuid::new_v4(),
            genre: Some("Science Fiction".to_string()),
            publish_year: Some(1965),
            created_at: Utc::now(),
        };
        let doc = serde_json::to_value(&book).unwrap();
        assert_eq!(doc["publishYear"], 1965);
        assert!(doc.get("createdAt").is_some());
        for field in doc.as_object().unwrap().keys() {
            assert!(Book::FIELDS.contains(&field.as_str()), "undeclared field {field}");
        }
    }

    #[test]
    fn created_at_serializes_at_fixed_width_so_string_order_is_chronological() {
        let whole_second: DateTime<Utc> = "2026-01-01T00:00:00Z".parse().unwrap();
        let half_second = whole_second + chrono::Duration::milliseconds(500);
        let book = |created_at| Book {
            id: Uuid::new_v4(),
            title: "Dune".to_string(),
            author: Uuid::new_v4(),
            genre: None,
            publish_year: None,
            created_at,
        };
        let early = serde_json::to_value(book(whole_second)).unwrap();
        let late = serde_json::to_value(book(half_second)).unwrap();
        let early = early["createdAt"].as_str().unwrap();
        let late = late["createdAt"].as_str().unwrap();
        assert_eq!(early.len(), late.len());
        assert!(early < late);

        let original = book(timestamp_now());
        let reread: Book = serde_json::from_value(serde_json::to_value(&original).unwrap()).unwrap();
        assert_eq!(reread.created_at, original.created_at);
    }

    #[test]
    fn patch_serialization_omits_absent_fields() {
        let patch = BookPatch {
            title: Some("Dune Messiah".to_string()),
            author: None,
            genre: None,
            publish_year: None,
        };
        let doc = serde_json::to_value(&patch).unwrap();
        assert_eq!(doc.as_object().unwrap().len(), 1);
        assert_eq!(doc["title"], "Dune Messiah");
    }
}
