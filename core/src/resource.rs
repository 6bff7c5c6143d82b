//! Per-resource helpers: path templates bound to HTTP methods.
//!
//! `ResourceApi` does no validation, transformation or caching. Every call
//! is one `ApiClient::request` against the resource's base path; the only
//! body rewrite is the `id` injected by `update`.

use std::fmt::Display;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpResponse};
use crate::types::{Author, Book};
use crate::validate::{FieldKind, FieldSpec};

/// A resource kind exposed by the service.
pub trait Resource {
    type Record: Serialize + DeserializeOwned;

    /// Path segment under the API prefix, e.g. `Books`.
    const NAME: &'static str;

    /// Fields every returned record carries, with their semantic types.
    const FIELDS: &'static [FieldSpec];

    fn field_names() -> Vec<&'static str> {
        Self::FIELDS.iter().map(|f| f.name).collect()
    }

    fn collection_path() -> String {
        format!("/{}", Self::NAME)
    }

    /// Item path with the id percent-encoded, so malformed ids still form
    /// a valid URL.
    fn item_path(id: impl Display) -> String {
        format!("/{}/{}", Self::NAME, urlencoding::encode(&id.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Books;

#[derive(Debug, Clone, Copy)]
pub struct Authors;

impl Resource for Books {
    type Record = Book;
    const NAME: &'static str = "Books";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id", FieldKind::Integer),
        FieldSpec::new("title", FieldKind::Text),
        FieldSpec::new("description", FieldKind::Text),
        FieldSpec::new("pageCount", FieldKind::Integer),
        FieldSpec::new("excerpt", FieldKind::Text),
        FieldSpec::new("publishDate", FieldKind::Timestamp),
    ];
}

impl Resource for Authors {
    type Record = Author;
    const NAME: &'static str = "Authors";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id", FieldKind::Integer),
        FieldSpec::new("idBook", FieldKind::Integer),
        FieldSpec::new("firstName", FieldKind::Text),
        FieldSpec::new("lastName", FieldKind::Text),
    ];
}

/// CRUD helpers for resource `R`, borrowing the client that executes them.
pub struct ResourceApi<'a, R> {
    client: &'a ApiClient,
    _resource: PhantomData<R>,
}

impl<'a, R: Resource> ResourceApi<'a, R> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    pub fn list(&self) -> Result<HttpResponse, ApiError> {
        Ok(self
            .client
            .request(HttpMethod::Get, &R::collection_path(), None)?)
    }

    pub fn get_by_id(&self, id: impl Display) -> Result<HttpResponse, ApiError> {
        Ok(self.client.request(HttpMethod::Get, &R::item_path(id), None)?)
    }

    pub fn create(&self, record: &impl Serialize) -> Result<HttpResponse, ApiError> {
        let body = serde_json::to_value(record)?;
        Ok(self
            .client
            .request(HttpMethod::Post, &R::collection_path(), Some(&body))?)
    }

    /// Send `record` with `"id": id` set, overriding any id it carries.
    pub fn update(&self, id: i64, record: &impl Serialize) -> Result<HttpResponse, ApiError> {
        let body = with_id(serde_json::to_value(record)?, id);
        Ok(self
            .client
            .request(HttpMethod::Put, &R::item_path(id), Some(&body))?)
    }

    pub fn delete(&self, id: impl Display) -> Result<HttpResponse, ApiError> {
        Ok(self
            .client
            .request(HttpMethod::Delete, &R::item_path(id), None)?)
    }
}

impl ResourceApi<'_, Authors> {
    /// `GET /Authors/authors/books/{book_id}`.
    pub fn list_by_book(&self, book_id: impl Display) -> Result<HttpResponse, ApiError> {
        let path = format!(
            "/{}/authors/books/{}",
            Authors::NAME,
            urlencoding::encode(&book_id.to_string())
        );
        Ok(self.client.request(HttpMethod::Get, &path, None)?)
    }
}

fn with_id(body: Value, id: i64) -> Value {
    match body {
        Value::Object(mut map) => {
            map.insert("id".to_string(), Value::from(id));
            Value::Object(map)
        }
        other => other,
    }
}
