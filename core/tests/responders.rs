//! Scenarios and the client against small hand-built services.
//!
//! Each test serves its own axum router on a random port. The routers answer
//! the way a misbehaving deployment might: truncating writes, undecodable
//! bodies, stalling, or never showing a record that was just created.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use fakerest_core::settings::ConsistencySettings;
use fakerest_core::{
    scenarios, ApiClient, Books, Fixtures, HttpMethod, Outcome, RequestOptions, Runner, ScenarioRegistry,
};
use serde_json::{json, Value};

fn serve(app: Router) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            axum::serve(listener, app).await
        })
        .unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> ApiClient {
    ApiClient::new(&format!("http://{addr}/api/v1"))
}

fn quick_rereads(attempts: u32) -> ConsistencySettings {
    ConsistencySettings {
        reread_attempts: attempts,
        reread_delay_ms: 10,
    }
}

/// Echo the payload with every string cut to 255 characters.
async fn truncating_create(Json(mut body): Json<Value>) -> Json<Value> {
    if let Some(record) = body.as_object_mut() {
        for value in record.values_mut() {
            if let Some(text) = value.as_str() {
                *value = Value::String(text.chars().take(255).collect());
            }
        }
        record.insert("id".to_string(), json!(1));
    }
    Json(body)
}

fn truncating_service() -> Router {
    Router::new()
        .route("/api/v1/Books", post(truncating_create))
        .route("/api/v1/Authors", post(truncating_create))
        .route("/api/v1/Books/{id}", delete(|| async { StatusCode::OK }))
        .route("/api/v1/Authors/{id}", delete(|| async { StatusCode::OK }))
}

fn single_outcome(runner: Runner<'_>, filter: &str) -> Outcome {
    let report = runner.run(&scenarios::all(), Some(filter));
    let attempt = report.final_attempt().unwrap();
    assert_eq!(attempt.scenarios.len(), 1, "filter {filter:?} should select one scenario");
    attempt.scenarios[0].outcome.clone()
}

#[test]
fn truncated_long_title_fails_the_echo() {
    let client = client_for(serve(truncating_service()));
    let fixtures = Fixtures::embedded().unwrap();

    let outcome = single_outcome(Runner::new(&client, &fixtures), "handles a very long title");
    let Outcome::Failed(detail) = outcome else {
        panic!("expected a failed echo, got {outcome:?}");
    };
    assert!(detail.contains("title"), "{detail}");
}

#[test]
fn truncated_long_names_fail_the_echo() {
    let client = client_for(serve(truncating_service()));
    let fixtures = Fixtures::embedded().unwrap();

    let outcome = single_outcome(Runner::new(&client, &fixtures), "handles very long names");
    let Outcome::Failed(detail) = outcome else {
        panic!("expected a failed echo, got {outcome:?}");
    };
    assert!(detail.contains("firstName"), "{detail}");
}

#[test]
fn untruncated_long_title_passes() {
    let app = Router::new()
        .route(
            "/api/v1/Books",
            post(|Json(mut body): Json<Value>| async move {
                body["id"] = json!(1);
                Json(body)
            }),
        )
        .route("/api/v1/Books/{id}", delete(|| async { StatusCode::OK }));
    let client = client_for(serve(app));
    let fixtures = Fixtures::embedded().unwrap();

    let outcome = single_outcome(Runner::new(&client, &fixtures), "handles a very long title");
    assert_eq!(outcome, Outcome::Passed);
}

#[test]
fn undecodable_error_body_is_still_a_response() {
    let app = Router::new().route(
        "/api/v1/Books",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, vec![0xffu8, 0xfe, 0xfd]) }),
    );
    let client = client_for(serve(app));

    let resp = client.books().list().unwrap();
    assert_eq!(resp.status, 500);
    assert_eq!(resp.body, Value::String("\u{fffd}\u{fffd}\u{fffd}".to_string()));

    // A wrong status is a failure, not a transport error.
    let fixtures = Fixtures::embedded().unwrap();
    let outcome = single_outcome(Runner::new(&client, &fixtures), "Books API - CRUD Operations > lists all books");
    assert!(matches!(outcome, Outcome::Failed(_)), "{outcome:?}");
}

#[test]
fn per_call_timeout_cuts_a_stalled_response() {
    let app = Router::new().route(
        "/api/v1/Books",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!([]))
        }),
    );
    let client = client_for(serve(app));

    let options = RequestOptions::default().timeout(Duration::from_millis(200));
    let err = client
        .request_with(HttpMethod::Get, "/Books", None, &options)
        .unwrap_err();
    assert!(err.url.ends_with("/api/v1/Books"));
}

#[test]
fn per_call_headers_reach_the_service() {
    let app = Router::new().route(
        "/api/v1/Books",
        get(|headers: axum::http::HeaderMap| async move {
            let tag = headers
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Json(json!({ "tag": tag }))
        }),
    );
    let client = client_for(serve(app));

    let options = RequestOptions::default().header("X-Request-Id", "run-7");
    let resp = client
        .request_with(HttpMethod::Get, "/Books", None, &options)
        .unwrap();
    assert_eq!(resp.body["tag"], "run-7");
}

#[test]
fn read_back_rereads_until_the_record_appears() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let app = Router::new().route(
        "/api/v1/Books/{id}",
        get(move || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    StatusCode::NOT_FOUND.into_response()
                } else {
                    Json(json!({"id": 7, "title": "Late"})).into_response()
                }
            }
        }),
    );
    let client = client_for(serve(app));
    let fixtures = Fixtures::embedded().unwrap();

    let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&seen);
    let mut registry = ScenarioRegistry::new();
    registry.register("Consistency", "reads a late record", move |ctx| {
        let read = ctx.read_back::<Books>(7)?;
        *slot.lock().unwrap() = read.map(|resp| resp.body);
        Ok(())
    });

    let report = Runner::new(&client, &fixtures)
        .consistency(quick_rereads(3))
        .run(&registry, None);
    assert!(report.passed());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(seen.lock().unwrap().as_ref().unwrap()["title"], "Late");
}

/// Accepts creates and deletes, but never finds anything on read.
fn forgetful_service(gets: Arc<AtomicUsize>, deletes: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route(
            "/api/v1/Books",
            post(|Json(mut body): Json<Value>| async move {
                body["id"] = json!(5);
                Json(body)
            }),
        )
        .route(
            "/api/v1/Books/{id}",
            get(move || {
                let gets = Arc::clone(&gets);
                async move {
                    gets.fetch_add(1, Ordering::SeqCst);
                    StatusCode::NOT_FOUND
                }
            })
            .delete(move || {
                let deletes = Arc::clone(&deletes);
                async move {
                    deletes.fetch_add(1, Ordering::SeqCst);
                    StatusCode::OK
                }
            }),
        )
}

#[test]
fn read_back_gives_up_on_a_record_that_never_appears() {
    let gets = Arc::new(AtomicUsize::new(0));
    let client = client_for(serve(forgetful_service(Arc::clone(&gets), Arc::new(AtomicUsize::new(0)))));
    let fixtures = Fixtures::embedded().unwrap();

    let found = Arc::new(Mutex::new(Some(true)));
    let slot = Arc::clone(&found);
    let mut registry = ScenarioRegistry::new();
    registry.register("Consistency", "reads a missing record", move |ctx| {
        *slot.lock().unwrap() = Some(ctx.read_back::<Books>(5)?.is_some());
        Ok(())
    });

    let report = Runner::new(&client, &fixtures)
        .consistency(quick_rereads(2))
        .run(&registry, None);
    assert!(report.passed());
    assert_eq!(*found.lock().unwrap(), Some(false));
    assert_eq!(gets.load(Ordering::SeqCst), 3);
}

#[test]
fn book_round_trip_continues_when_the_write_is_not_visible() {
    let gets = Arc::new(AtomicUsize::new(0));
    let deletes = Arc::new(AtomicUsize::new(0));
    let client = client_for(serve(forgetful_service(Arc::clone(&gets), Arc::clone(&deletes))));
    let fixtures = Fixtures::embedded().unwrap();

    let runner = Runner::new(&client, &fixtures).consistency(quick_rereads(2));
    let outcome = single_outcome(runner, "creates, reads, deletes and misses a book");
    assert_eq!(outcome, Outcome::Passed);

    // Three reads from read_back, then the absence check after the delete.
    assert_eq!(gets.load(Ordering::SeqCst), 4);
    // The scenario's own delete, then teardown's.
    assert_eq!(deletes.load(Ordering::SeqCst), 2);
}

#[test]
fn empty_names_payload_carries_a_zero_book_id() {
    let received: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&received);
    let app = Router::new().route(
        "/api/v1/Authors",
        post(move |Json(body): Json<Value>| {
            let slot = Arc::clone(&slot);
            async move {
                *slot.lock().unwrap() = Some(body);
                StatusCode::BAD_REQUEST
            }
        }),
    );
    let client = client_for(serve(app));
    let fixtures = Fixtures::embedded().unwrap();

    let outcome = single_outcome(Runner::new(&client, &fixtures), "handles empty names");
    assert_eq!(outcome, Outcome::Passed);

    let sent = received.lock().unwrap().clone().unwrap();
    assert_eq!(sent["idBook"], 0);
    assert_eq!(sent["firstName"], "");
    assert_eq!(sent["lastName"], "");
}
