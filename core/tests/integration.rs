//! Harness tests against the mock server over real HTTP.
//!
//! # Design
//! Each test starts its own mock server on a random port, so every test sees
//! a freshly seeded store and none depends on another's writes.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use fakerest_core::{scenarios, ApiClient, ApiError, Books, Fixtures, Runner, ScenarioError, ScenarioRegistry};
use serde_json::json;

fn spawn_mock() -> SocketAddr {
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
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> ApiClient {
    ApiClient::new(&format!("http://{addr}/api/v1"))
}

#[test]
fn book_crud_over_http() {
    let client = client_for(spawn_mock());
    let books = client.books();

    let listed = books.list().unwrap();
    assert_eq!(listed.status, 200);
    assert_eq!(listed.body.as_array().unwrap().len(), 200);

    let created = books
        .create(&json!({"title": "Integration", "pageCount": 12, "publishDate": "2024-01-01T00:00:00.000Z"}))
        .unwrap();
    assert_eq!(created.status, 200);
    let id = created.record_id().unwrap();
    assert_eq!(created.body["title"], "Integration");

    let updated = books.update(id, &json!({"title": "Renamed", "pageCount": 13})).unwrap();
    assert_eq!(updated.status, 200);
    assert_eq!(updated.body["id"], id);

    let read = books.get_by_id(id).unwrap();
    assert_eq!(read.body["title"], "Renamed");

    assert_eq!(books.delete(id).unwrap().status, 200);
    assert_eq!(books.get_by_id(id).unwrap().status, 404);
}

#[test]
fn author_listing_by_book_over_http() {
    let client = client_for(spawn_mock());
    let resp = client.authors().list_by_book(5).unwrap();
    assert_eq!(resp.status, 200);
    let authors = resp.body.as_array().unwrap();
    assert_eq!(authors.len(), 3);
    assert!(authors.iter().all(|a| a["idBook"] == 5));
    assert!(resp.header("content-type").unwrap().contains("application/json"));
}

#[test]
fn malformed_id_is_a_response_not_an_error() {
    let client = client_for(spawn_mock());
    let resp = client.books().get_by_id("abc").unwrap();
    assert_eq!(resp.status, 400);
}

#[test]
fn closed_port_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let err = client_for(addr).books().list().unwrap_err();
    let ApiError::Transport(err) = err else {
        panic!("expected a transport error, got {err}");
    };
    assert!(err.url.ends_with("/api/v1/Books"));
    assert!(ScenarioError::from(err).is_transport());
}

#[test]
fn teardown_runs_after_a_failing_scenario() {
    let client = client_for(spawn_mock());
    let fixtures = Fixtures::embedded().unwrap();
    let created_id = Arc::new(AtomicI64::new(0));

    let mut registry = ScenarioRegistry::new();
    let slot = Arc::clone(&created_id);
    registry.register("Teardown", "creates then fails", move |ctx| {
        let resp = ctx.books().create(&ctx.fixtures().books.valid_book)?;
        if let Some(id) = ctx.track_created::<Books>(&resp) {
            slot.store(id, Ordering::SeqCst);
        }
        Err(ScenarioError::assertion("failing on purpose"))
    });

    let report = Runner::new(&client, &fixtures).run(&registry, None);
    assert!(!report.passed());

    let id = created_id.load(Ordering::SeqCst);
    assert!(id > 0);
    assert_eq!(client.books().get_by_id(id).unwrap().status, 404);
}

#[test]
fn full_catalogue_passes_against_the_mock() {
    let client = client_for(spawn_mock());
    let fixtures = Fixtures::embedded().unwrap();
    let registry = scenarios::all();

    let report = Runner::new(&client, &fixtures).run(&registry, None);
    let attempt = report.final_attempt().unwrap();
    for failure in attempt.failures() {
        eprintln!("{} > {}: {:?}", failure.suite, failure.name, failure.outcome);
    }
    assert!(report.passed());
    assert_eq!(report.summary().total, registry.len());

    // Teardown left the seeded catalogue as it was.
    let listed = client.books().list().unwrap();
    assert_eq!(listed.body.as_array().unwrap().len(), 200);
}
