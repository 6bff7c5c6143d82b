//! End-to-end test harness for the FakeREST Books and Authors API.
//!
//! # Overview
//! `ApiClient` performs blocking HTTP round trips and hands back a uniform
//! `HttpResponse` whatever the status. `ResourceApi` binds the path
//! templates of one resource to HTTP methods. Scenarios are plain functions
//! over a `ScenarioContext`, collected in a `ScenarioRegistry` and executed
//! one after another by the `Runner`.
//!
//! # Design
//! - The service under test is external and opaque. Scenarios assert on what
//!   it returns; nothing here models its storage or its consistency.
//! - Expected statuses are sets where the service's behavior is unspecified,
//!   so a scenario stays stable across the variants it has been seen to take.
//! - Records a scenario creates are tracked on its context and deleted after
//!   it finishes, pass or fail.
//! - Settings come from layered TOML profiles plus environment overrides
//!   named `FAKEREST_<SECTION>__<KEY>` (e.g. `FAKEREST_API__BASE_URL`); see
//!   `settings`.

pub mod assertions;
pub mod client;
pub mod error;
pub mod fixtures;
pub mod http;
pub mod resource;
pub mod scenario;
pub mod scenarios;
pub mod settings;
pub mod types;
pub mod validate;

pub use client::ApiClient;
pub use error::{ApiError, FixtureError, ScenarioError, TransportError};
pub use fixtures::Fixtures;
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestOptions};
pub use resource::{Authors, Books, Resource, ResourceApi};
pub use scenario::{Outcome, RunReport, Runner, ScenarioContext, ScenarioRegistry, ScenarioResult, Summary};
pub use settings::{LogFormat, RunMode, Settings};
pub use types::{Author, Book};
pub use validate::{FieldKind, FieldSpec, ShapeError};
