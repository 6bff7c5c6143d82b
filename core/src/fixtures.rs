//! Literal payloads and generated test data.
//!
//! Fixture blobs are opaque JSON: the harness sends them as-is and only
//! reads the fields a scenario compares against.

use std::fs;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::FixtureError;

const BOOKS_JSON: &str = include_str!("../fixtures/books.json");
const AUTHORS_JSON: &str = include_str!("../fixtures/authors.json");

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFixtures {
    pub valid_book: Value,
    pub invalid_book: Value,
    pub book_with_long_text: Value,
    pub book_to_update: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorFixtures {
    pub valid_author: Value,
    pub invalid_author: Value,
    pub author_with_long_names: Value,
    pub author_to_update: Value,
}

#[derive(Debug, Clone)]
pub struct Fixtures {
    pub books: BookFixtures,
    pub authors: AuthorFixtures,
}

impl Fixtures {
    /// The fixture set compiled into the crate.
    pub fn embedded() -> Result<Self, FixtureError> {
        Ok(Self {
            books: parse("books", BOOKS_JSON)?,
            authors: parse("authors", AUTHORS_JSON)?,
        })
    }

    /// Read `books.json` and `authors.json` from `dir`, or fall back to the
    /// embedded set when no directory is configured.
    pub fn load(dir: Option<&Path>) -> Result<Self, FixtureError> {
        let Some(dir) = dir else {
            return Self::embedded();
        };
        Ok(Self {
            books: parse("books", &read(&dir.join("books.json"))?)?,
            authors: parse("authors", &read(&dir.join("authors.json"))?)?,
        })
    }
}

fn read(path: &Path) -> Result<String, FixtureError> {
    fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse<T: DeserializeOwned>(name: &str, raw: &str) -> Result<T, FixtureError> {
    serde_json::from_str(raw).map_err(|source| FixtureError::Malformed {
        name: name.to_string(),
        source,
    })
}

/// Shallow object merge: keys in `overrides` replace those in `base`.
/// A non-object on either side yields `overrides` unchanged.
pub fn merge(base: &Value, overrides: Value) -> Value {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            let mut merged = base.clone();
            merged.extend(overrides);
            Value::Object(merged)
        }
        (_, overrides) => overrides,
    }
}

/// A fresh book payload with a timestamped title.
pub fn generate_book_data(overrides: Value) -> Value {
    let now = Utc::now();
    let stamp = now.timestamp_millis();
    let iso = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let base = json!({
        "id": 0,
        "title": format!("Test Book {stamp}"),
        "description": format!("This is a test book description created at {iso}"),
        "pageCount": 100 + random_below(500),
        "excerpt": format!("Test excerpt for book {stamp}"),
        "publishDate": iso,
    });
    merge(&base, overrides)
}

/// A fresh author payload pointing at a book id in `1..=100`.
pub fn generate_author_data(overrides: Value) -> Value {
    let stamp = Utc::now().timestamp_millis();
    let base = json!({
        "id": 0,
        "idBook": 1 + random_below(100),
        "firstName": format!("TestFirstName{stamp}"),
        "lastName": format!("TestLastName{stamp}"),
    });
    merge(&base, overrides)
}

fn random_below(bound: u64) -> u64 {
    (Uuid::new_v4().as_u128() % u128::from(bound)) as u64
}
