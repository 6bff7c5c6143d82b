//! Assertions scenarios make on an `HttpResponse`.
//!
//! Each helper returns `Err(ScenarioError)` instead of panicking, so a
//! failing check ends only the scenario that made it.

use std::time::Duration;

use serde_json::Value;

use crate::error::ScenarioError;
use crate::http::HttpResponse;

/// Return `ScenarioError::Assertion` from the enclosing function unless the
/// condition holds.
#[macro_export]
macro_rules! check {
    ($cond:expr $(,)?) => {
        if !$cond {
            return Err($crate::error::ScenarioError::assertion(concat!(
                "condition failed: ",
                stringify!($cond)
            )));
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::ScenarioError::assertion(format!($($arg)+)));
        }
    };
}

/// Like `check!` for equality, reporting both sides.
#[macro_export]
macro_rules! check_eq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => {
                if left != right {
                    return Err($crate::error::ScenarioError::assertion(format!(
                        "{} == {}: left {:?}, right {:?}",
                        stringify!($left),
                        stringify!($right),
                        left,
                        right
                    )));
                }
            }
        }
    };
}

/// The status must be one of `expected`. Disjunctive sets are deliberate:
/// the service's validation behavior is not pinned down.
pub fn expect_status(resp: &HttpResponse, expected: &[u16]) -> Result<(), ScenarioError> {
    if expected.contains(&resp.status) {
        return Ok(());
    }
    Err(ScenarioError::UnexpectedStatus {
        expected: expected.to_vec(),
        actual: resp.status,
        url: resp.url.clone(),
    })
}

pub fn expect_within(resp: &HttpResponse, budget: Duration) -> Result<(), ScenarioError> {
    let budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
    if resp.duration_ms < budget_ms {
        return Ok(());
    }
    Err(ScenarioError::assertion(format!(
        "response took {} ms, budget is {budget_ms} ms",
        resp.duration_ms
    )))
}

/// A read of a deleted or unknown record: 404, or 200 with an empty body.
pub fn expect_absent(resp: &HttpResponse) -> Result<(), ScenarioError> {
    expect_status(resp, &[200, 404])?;
    if resp.status == 200 && !resp.body_is_empty() {
        return Err(ScenarioError::assertion(format!(
            "{}: expected no record, got {}",
            resp.url, resp.body
        )));
    }
    Ok(())
}

pub fn expect_header_contains(resp: &HttpResponse, name: &str, needle: &str) -> Result<(), ScenarioError> {
    match resp.header(name) {
        Some(value) if value.contains(needle) => Ok(()),
        Some(value) => Err(ScenarioError::assertion(format!(
            "header `{name}` is `{value}`, expected it to contain `{needle}`"
        ))),
        None => Err(ScenarioError::assertion(format!("header `{name}` is missing"))),
    }
}

pub fn expect_array(resp: &HttpResponse) -> Result<&[Value], ScenarioError> {
    resp.body
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| ScenarioError::assertion(format!("expected a JSON array body, got {}", resp.body)))
}

/// `record[field]` must equal `expected` exactly.
pub fn expect_field_eq(record: &Value, field: &str, expected: &Value) -> Result<(), ScenarioError> {
    let actual = record.get(field).unwrap_or(&Value::Null);
    if actual == expected {
        return Ok(());
    }
    Err(ScenarioError::assertion(format!(
        "field `{field}`: expected {expected}, got {actual}"
    )))
}

/// Every field of `sent` listed in `fields` must be echoed by `record`.
pub fn expect_echo(record: &Value, sent: &Value, fields: &[&str]) -> Result<(), ScenarioError> {
    for field in fields {
        expect_field_eq(record, field, sent.get(*field).unwrap_or(&Value::Null))?;
    }
    Ok(())
}
