//! Typed records for the two resource kinds.
//!
//! # Design
//! The service guarantees no field is non-null, so text fields are
//! `Option<String>`. `id` defaults to 0 when absent, which is also what
//! create payloads send. `publish_date` stays a string: the harness checks
//! that it is text, it does not own the timestamp format.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(default)]
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub page_count: i64,
    pub excerpt: Option<String>,
    pub publish_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub id_book: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Book {
    pub fn new(title: &str, description: &str, page_count: i64, excerpt: &str, publish_date: &str) -> Self {
        Self {
            id: 0,
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            page_count,
            excerpt: Some(excerpt.to_string()),
            publish_date: Some(publish_date.to_string()),
        }
    }
}

impl Author {
    pub fn new(id_book: i64, first_name: &str, last_name: &str) -> Self {
        Self {
            id: 0,
            id_book,
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_serializes_camel_case() {
        let book = Book::new("T", "D", 10, "E", "2023-01-01T00:00:00.000Z");
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["id"], 0);
        assert_eq!(json["pageCount"], 10);
        assert_eq!(json["publishDate"], "2023-01-01T00:00:00.000Z");
    }

    #[test]
    fn book_tolerates_null_fields() {
        let book: Book = serde_json::from_str(
            r#"{"id":5,"title":null,"description":null,"pageCount":0,"excerpt":null,"publishDate":null}"#,
        )
        .unwrap();
        assert_eq!(book.id, 5);
        assert!(book.title.is_none());
        assert!(book.publish_date.is_none());
    }

    #[test]
    fn author_defaults_missing_ids() {
        let author: Author = serde_json::from_str(r#"{"firstName":"A","lastName":"B"}"#).unwrap();
        assert_eq!(author.id, 0);
        assert_eq!(author.id_book, 0);
        assert_eq!(author.first_name.as_deref(), Some("A"));
    }
}
