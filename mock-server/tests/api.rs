use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with, Author, Book, Store, AUTHORS_PER_BOOK, SEEDED_BOOKS};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- books ---

#[tokio::test]
async fn list_books_returns_seeded_catalogue() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/v1/Books"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[http::header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.contains("application/json"));
    let books: Vec<Book> = body_json(resp).await;
    assert_eq!(books.len() as i64, SEEDED_BOOKS);
    assert_eq!(books[0].id, 1);
}

#[tokio::test]
async fn list_books_empty_store() {
    let resp = app_with(Store::default())
        .oneshot(empty_request("GET", "/api/v1/Books"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let books: Vec<Book> = body_json(resp).await;
    assert!(books.is_empty());
}

#[tokio::test]
async fn create_book_returns_200_with_assigned_id() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/Books",
            r#"{"id":0,"title":"T","description":"D","pageCount":10,"excerpt":"E","publishDate":"2023-01-01T00:00:00.000Z"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let book: Book = body_json(resp).await;
    assert_eq!(book.id, SEEDED_BOOKS + 1);
    assert_eq!(book.title.as_deref(), Some("T"));
    assert_eq!(book.page_count, 10);
}

#[tokio::test]
async fn create_book_with_wrong_types_returns_422() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/Books",
            r#"{"title":123,"pageCount":"many"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_book_with_malformed_json_returns_400() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/Books", "{not json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_book_not_found() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/v1/Books/999999"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_book_non_numeric_id_returns_400() {
    for uri in ["/api/v1/Books/abc", "/api/v1/Books/1.5"] {
        let resp = app().oneshot(empty_request("GET", uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn delete_unknown_book_still_returns_200() {
    let resp = app()
        .oneshot(empty_request("DELETE", "/api/v1/Books/999999"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn update_book_upserts_at_path_id() {
    let resp = app()
        .oneshot(json_request(
            "PUT",
            "/api/v1/Books/424242",
            r#"{"title":"Partially Updated Title"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let book: Book = body_json(resp).await;
    assert_eq!(book.id, 424242);
    assert_eq!(book.title.as_deref(), Some("Partially Updated Title"));
    assert!(book.description.is_none());
}

// --- authors ---

#[tokio::test]
async fn list_authors_by_book_filters_on_id_book() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/v1/Authors/authors/books/2"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let authors: Vec<Author> = body_json(resp).await;
    assert_eq!(authors.len() as i64, AUTHORS_PER_BOOK);
    assert!(authors.iter().all(|a| a.id_book == 2));
}

#[tokio::test]
async fn list_authors_by_unknown_book_is_empty() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/v1/Authors/authors/books/999999"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let authors: Vec<Author> = body_json(resp).await;
    assert!(authors.is_empty());
}

#[tokio::test]
async fn list_authors_by_missing_book_segment_is_404() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/v1/Authors/authors/books/"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_author_with_fractional_book_id_returns_422() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/Authors",
            r#"{"idBook":1.5,"firstName":"Float Test","lastName":"Author"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn delete_author_invalid_id_returns_400() {
    let resp = app()
        .oneshot(empty_request("DELETE", "/api/v1/Authors/invalid-id"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- full author lifecycle ---

#[tokio::test]
async fn author_crud_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/api/v1/Authors",
            r#"{"id":0,"idBook":5,"firstName":"Jean-Pierre","lastName":"O'Connor-Smith"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Author = body_json(resp).await;
    assert_eq!(created.first_name.as_deref(), Some("Jean-Pierre"));
    let id = created.id;

    // get
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/api/v1/Authors/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Author = body_json(resp).await;
    assert_eq!(fetched, created);

    // update
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "PUT",
            &format!("/api/v1/Authors/{id}"),
            r#"{"idBook":2,"firstName":"Updated First","lastName":"Updated Last"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Author = body_json(resp).await;
    assert_eq!(updated.id, id);
    assert_eq!(updated.id_book, 2);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/api/v1/Authors/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());

    // Gone after delete.
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/api/v1/Authors/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
