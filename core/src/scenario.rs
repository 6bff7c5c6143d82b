//! Scenario registration and the sequential runner.
//!
//! # Design
//! A scenario is a named closure over a `ScenarioContext`. The context
//! carries everything the scenario may touch (client, fixtures, budgets)
//! plus a teardown list: records registered with `track` are deleted after
//! the scenario on every exit path, including failures and panics, so no
//! scenario depends on another having run first.
//!
//! Retry policy is run-level: when any scenario in an attempt does not
//! pass, the whole selected run is repeated, up to `retries` more times.

use std::cell::RefCell;
use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

use crate::assertions::expect_status;
use crate::client::ApiClient;
use crate::error::ScenarioError;
use crate::fixtures::Fixtures;
use crate::http::{HttpMethod, HttpResponse};
use crate::resource::{Authors, Books, Resource, ResourceApi};
use crate::settings::{ConsistencySettings, LatencyBudgets, RunMode, Settings};

pub type ScenarioResult = Result<(), ScenarioError>;

type ScenarioFn = Box<dyn Fn(&ScenarioContext<'_>) -> ScenarioResult + Send + Sync>;

pub struct Scenario {
    pub suite: &'static str,
    pub name: &'static str,
    body: ScenarioFn,
}

impl Scenario {
    pub fn full_name(&self) -> String {
        format!("{} > {}", self.suite, self.name)
    }
}

#[derive(Default)]
pub struct ScenarioRegistry {
    scenarios: Vec<Scenario>,
}

impl ScenarioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, suite: &'static str, name: &'static str, body: F) -> &mut Self
    where
        F: Fn(&ScenarioContext<'_>) -> ScenarioResult + Send + Sync + 'static,
    {
        self.scenarios.push(Scenario {
            suite,
            name,
            body: Box::new(body),
        });
        self
    }

    pub fn extend(&mut self, other: ScenarioRegistry) -> &mut Self {
        self.scenarios.extend(other.scenarios);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Scenarios whose full name contains `pattern`, ignoring case.
    pub fn matching<'r>(&'r self, pattern: Option<&'r str>) -> impl Iterator<Item = &'r Scenario> + 'r {
        let pattern = pattern.map(str::to_lowercase);
        self.scenarios.iter().filter(move |scenario| match &pattern {
            Some(p) => scenario.full_name().to_lowercase().contains(p.as_str()),
            None => true,
        })
    }
}

/// What a scenario gets to work with.
pub struct ScenarioContext<'a> {
    client: &'a ApiClient,
    fixtures: &'a Fixtures,
    budgets: &'a LatencyBudgets,
    consistency: &'a ConsistencySettings,
    teardown: RefCell<Vec<String>>,
}

impl<'a> ScenarioContext<'a> {
    pub fn client(&self) -> &'a ApiClient {
        self.client
    }

    pub fn books(&self) -> ResourceApi<'a, Books> {
        self.client.books()
    }

    pub fn authors(&self) -> ResourceApi<'a, Authors> {
        self.client.authors()
    }

    pub fn fixtures(&self) -> &'a Fixtures {
        self.fixtures
    }

    pub fn budgets(&self) -> &'a LatencyBudgets {
        self.budgets
    }

    /// Full URL of a path, for error messages.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.client.base_url())
    }

    /// Delete `R`'s record `id` once the scenario finishes.
    pub fn track<R: Resource>(&self, id: i64) {
        self.teardown.borrow_mut().push(R::item_path(id));
    }

    /// Track the record a successful create returned, if it carries an id.
    pub fn track_created<R: Resource>(&self, resp: &HttpResponse) -> Option<i64> {
        let id = resp.record_id().filter(|_| resp.status == 200)?;
        self.track::<R>(id);
        Some(id)
    }

    /// Read `R`'s record `id`, re-reading while it is absent. `None` means
    /// the service never showed the record within the configured attempts.
    pub fn read_back<R: Resource>(&self, id: impl Display) -> Result<Option<HttpResponse>, ScenarioError> {
        let path = R::item_path(id);
        let url = self.url(&path);
        for attempt in 0..=self.consistency.reread_attempts {
            if attempt > 0 {
                thread::sleep(self.consistency.reread_delay());
            }
            let resp = self.client.request(HttpMethod::Get, &path, None)?;
            expect_status(&resp, &[200, 404])?;
            if resp.status == 200 && !resp.body_is_empty() {
                return Ok(Some(resp));
            }
        }
        tracing::warn!(%url, "record not visible after write; treating service as not persisting");
        Ok(None)
    }

    fn run_teardown(&self) {
        for path in self.teardown.borrow_mut().drain(..) {
            match self.client.request(HttpMethod::Delete, &path, None) {
                Ok(resp) if resp.is_success() || resp.status == 404 => {
                    tracing::debug!(%path, status = resp.status, "teardown");
                }
                Ok(resp) => tracing::warn!(%path, status = resp.status, "teardown delete rejected"),
                Err(err) => tracing::warn!(%path, error = %err, "teardown delete failed"),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed(String),
    Errored(String),
}

impl Outcome {
    fn from_result(result: ScenarioResult) -> Self {
        match result {
            Ok(()) => Outcome::Passed,
            Err(err) if err.is_transport() => Outcome::Errored(err.to_string()),
            Err(err) => Outcome::Failed(err.to_string()),
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub suite: &'static str,
    pub name: &'static str,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptReport {
    pub attempt: u32,
    pub scenarios: Vec<ScenarioReport>,
}

impl AttemptReport {
    pub fn passed(&self) -> bool {
        self.scenarios.iter().all(|s| s.outcome.is_passed())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios.iter().filter(|s| !s.outcome.is_passed())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub attempts: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub attempts: Vec<AttemptReport>,
}

impl RunReport {
    pub fn final_attempt(&self) -> Option<&AttemptReport> {
        self.attempts.last()
    }

    /// The run passes when its last attempt passed.
    pub fn passed(&self) -> bool {
        self.final_attempt().is_some_and(AttemptReport::passed)
    }

    pub fn summary(&self) -> Summary {
        let scenarios = self.final_attempt().map(|a| a.scenarios.as_slice()).unwrap_or(&[]);
        let count = |pred: fn(&Outcome) -> bool| scenarios.iter().filter(|s| pred(&s.outcome)).count();
        Summary {
            total: scenarios.len(),
            passed: count(|o| matches!(o, Outcome::Passed)),
            failed: count(|o| matches!(o, Outcome::Failed(_))),
            errored: count(|o| matches!(o, Outcome::Errored(_))),
            attempts: self.attempts.len(),
        }
    }
}

pub struct Runner<'a> {
    client: &'a ApiClient,
    fixtures: &'a Fixtures,
    budgets: LatencyBudgets,
    consistency: ConsistencySettings,
    retries: u32,
    slow_threshold: Duration,
}

impl<'a> Runner<'a> {
    pub fn new(client: &'a ApiClient, fixtures: &'a Fixtures) -> Self {
        Self {
            client,
            fixtures,
            budgets: LatencyBudgets::default(),
            consistency: ConsistencySettings::default(),
            retries: 0,
            slow_threshold: Settings::default().command_timeout(),
        }
    }

    pub fn from_settings(client: &'a ApiClient, fixtures: &'a Fixtures, settings: &Settings, mode: RunMode) -> Self {
        Self::new(client, fixtures)
            .budgets(settings.budgets.clone())
            .consistency(settings.consistency.clone())
            .retries(settings.retries.for_mode(mode))
            .slow_threshold(settings.command_timeout())
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn budgets(mut self, budgets: LatencyBudgets) -> Self {
        self.budgets = budgets;
        self
    }

    pub fn consistency(mut self, consistency: ConsistencySettings) -> Self {
        self.consistency = consistency;
        self
    }

    /// Scenarios slower than this are logged; nothing is cancelled.
    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    pub fn run(&self, registry: &ScenarioRegistry, filter: Option<&str>) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id);
        let _guard = span.enter();

        let selected: Vec<&Scenario> = registry.matching(filter).collect();
        let mut report = RunReport {
            run_id,
            attempts: Vec::new(),
        };
        for attempt in 1..=self.retries.saturating_add(1) {
            let scenarios = selected.iter().map(|s| self.run_scenario(s)).collect();
            let attempt_report = AttemptReport { attempt, scenarios };
            let passed = attempt_report.passed();
            let failures = attempt_report.failures().count();
            report.attempts.push(attempt_report);
            if passed {
                break;
            }
            if attempt <= self.retries {
                tracing::warn!(attempt, failures, "run had failures; retrying whole run");
            }
        }

        let summary = report.summary();
        tracing::info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            errored = summary.errored,
            attempts = summary.attempts,
            "run finished"
        );
        report
    }

    fn run_scenario(&self, scenario: &Scenario) -> ScenarioReport {
        let ctx = ScenarioContext {
            client: self.client,
            fixtures: self.fixtures,
            budgets: &self.budgets,
            consistency: &self.consistency,
            teardown: RefCell::new(Vec::new()),
        };

        let started = Instant::now();
        let outcome = match catch_unwind(AssertUnwindSafe(|| (scenario.body)(&ctx))) {
            Ok(result) => Outcome::from_result(result),
            Err(payload) => Outcome::Errored(format!("scenario panicked: {}", panic_message(payload.as_ref()))),
        };
        ctx.run_teardown();
        let elapsed = started.elapsed();
        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        if elapsed > self.slow_threshold {
            tracing::warn!(suite = scenario.suite, name = scenario.name, duration_ms, "scenario exceeded command timeout");
        }
        match &outcome {
            Outcome::Passed => tracing::info!(suite = scenario.suite, name = scenario.name, duration_ms, "passed"),
            Outcome::Failed(detail) => {
                tracing::warn!(suite = scenario.suite, name = scenario.name, duration_ms, %detail, "failed")
            }
            Outcome::Errored(detail) => {
                tracing::warn!(suite = scenario.suite, name = scenario.name, duration_ms, %detail, "errored")
            }
        }

        ScenarioReport {
            suite: scenario.suite,
            name: scenario.name,
            outcome,
            duration_ms,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
