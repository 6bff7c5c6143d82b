//! In-memory stand-in for the FakeREST Books/Authors service.
//!
//! Mirrors the routes and observed behavior of the live API closely enough
//! for the scenario catalogue to run offline: creates echo the stored record
//! with status 200, updates upsert at the path id, deletes answer 200 even
//! for unknown ids, and unknown reads answer 404.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

pub const SEEDED_BOOKS: i64 = 200;
pub const AUTHORS_PER_BOOK: i64 = 3;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
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

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub id_book: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    books: BTreeMap<i64, Book>,
    authors: BTreeMap<i64, Author>,
    next_book_id: i64,
    next_author_id: i64,
}

impl Store {
    /// Seed the store the way the live service presents itself: a fixed
    /// catalogue of books, each with a handful of authors.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let mut store = Store::default();
        for n in 1..=SEEDED_BOOKS {
            let lorem = format!("Lorem ipsum dolor sit amet, book {n}.");
            store.books.insert(
                n,
                Book {
                    id: n,
                    title: Some(format!("Book {n}")),
                    description: Some(lorem.clone()),
                    page_count: n * 100,
                    excerpt: Some(lorem),
                    publish_date: Some(
                        (now - Duration::days(n)).to_rfc3339_opts(SecondsFormat::Millis, true),
                    ),
                },
            );
        }
        for n in 1..=SEEDED_BOOKS * AUTHORS_PER_BOOK {
            let id_book = (n - 1) / AUTHORS_PER_BOOK + 1;
            store.authors.insert(
                n,
                Author {
                    id: n,
                    id_book,
                    first_name: Some(format!("First Name {n}")),
                    last_name: Some(format!("Last Name {n}")),
                },
            );
        }
        store.next_book_id = SEEDED_BOOKS + 1;
        store.next_author_id = SEEDED_BOOKS * AUTHORS_PER_BOOK + 1;
        store
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Store::seeded())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    let api = Router::new()
        .route("/Books", get(list_books).post(create_book))
        .route("/Books/{id}", get(get_book).put(update_book).delete(delete_book))
        .route("/Authors", get(list_authors).post(create_author))
        .route(
            "/Authors/{id}",
            get(get_author).put(update_author).delete(delete_author),
        )
        .route("/Authors/authors/books/{id_book}", get(list_authors_by_book));
    Router::new().nest("/api/v1", api).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_books(State(db): State<Db>) -> Json<Vec<Book>> {
    let store = db.read().await;
    Json(store.books.values().cloned().collect())
}

async fn get_book(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Book>, StatusCode> {
    let store = db.read().await;
    store.books.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn create_book(State(db): State<Db>, Json(mut book): Json<Book>) -> Json<Book> {
    let mut store = db.write().await;
    book.id = store.next_book_id;
    store.next_book_id += 1;
    store.books.insert(book.id, book.clone());
    tracing::debug!(id = book.id, "book created");
    Json(book)
}

async fn update_book(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(mut book): Json<Book>,
) -> Json<Book> {
    book.id = id;
    db.write().await.books.insert(id, book.clone());
    Json(book)
}

async fn delete_book(State(db): State<Db>, Path(id): Path<i64>) -> StatusCode {
    let removed = db.write().await.books.remove(&id).is_some();
    tracing::debug!(id, removed, "book delete");
    StatusCode::OK
}

async fn list_authors(State(db): State<Db>) -> Json<Vec<Author>> {
    let store = db.read().await;
    Json(store.authors.values().cloned().collect())
}

async fn get_author(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Author>, StatusCode> {
    let store = db.read().await;
    store.authors.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn list_authors_by_book(
    State(db): State<Db>,
    Path(id_book): Path<i64>,
) -> Json<Vec<Author>> {
    let store = db.read().await;
    Json(
        store
            .authors
            .values()
            .filter(|author| author.id_book == id_book)
            .cloned()
            .collect(),
    )
}

async fn create_author(State(db): State<Db>, Json(mut author): Json<Author>) -> Json<Author> {
    let mut store = db.write().await;
    author.id = store.next_author_id;
    store.next_author_id += 1;
    store.authors.insert(author.id, author.clone());
    tracing::debug!(id = author.id, "author created");
    Json(author)
}

async fn update_author(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(mut author): Json<Author>,
) -> Json<Author> {
    author.id = id;
    db.write().await.authors.insert(id, author.clone());
    Json(author)
}

async fn delete_author(State(db): State<Db>, Path(id): Path<i64>) -> StatusCode {
    let removed = db.write().await.authors.remove(&id).is_some();
    tracing::debug!(id, removed, "author delete");
    StatusCode::OK
}
