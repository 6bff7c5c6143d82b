//! Books suites: CRUD against `/Books` and malformed or hostile input.

use chrono::{Duration, SecondsFormat, Utc};
use serde_json::json;

use super::{create, created_id, first_listed_id, try_create, validate_record, ACCEPT_OR_REJECT, BOOKS_CRUD, BOOKS_EDGE_CASES};
use crate::assertions::{
    expect_absent, expect_array, expect_echo, expect_field_eq, expect_header_contains, expect_status, expect_within,
};
use crate::fixtures::{generate_book_data, merge};
use crate::resource::{Books, Resource};
use crate::scenario::{ScenarioContext, ScenarioRegistry, ScenarioResult};
use crate::types::Book;
use crate::validate::{parse_record, validate_response_structure, validate_structure};
use crate::{check, check_eq};

const MISSING_ID: i64 = 999_999;

pub fn books_crud() -> ScenarioRegistry {
    let mut registry = ScenarioRegistry::new();
    registry
        .register(BOOKS_CRUD, "lists all books", list_all)
        .register(BOOKS_CRUD, "lists the same number of books twice", list_is_stable)
        .register(BOOKS_CRUD, "lists the full catalogue within the large dataset budget", list_large_dataset)
        .register(BOOKS_CRUD, "gets a book by id", get_by_id)
        .register(BOOKS_CRUD, "reports an unknown book as absent", get_missing)
        .register(BOOKS_CRUD, "creates a valid book", create_valid)
        .register(BOOKS_CRUD, "creates a book with long text fields", create_long_text)
        .register(BOOKS_CRUD, "handles an invalid book payload", create_invalid)
        .register(BOOKS_CRUD, "creates books sequentially", create_sequential)
        .register(BOOKS_CRUD, "updates an existing book", update_existing)
        .register(BOOKS_CRUD, "keeps untouched fields on a full-record update", update_keeps_fields)
        .register(BOOKS_CRUD, "deletes a book", delete_existing)
        .register(BOOKS_CRUD, "deletes an unknown book", delete_missing);
    registry
}

pub fn books_edge_cases() -> ScenarioRegistry {
    let mut registry = ScenarioRegistry::new();
    registry
        .register(BOOKS_EDGE_CASES, "handles a very long title", long_title)
        .register(BOOKS_EDGE_CASES, "handles empty strings", empty_strings)
        .register(BOOKS_EDGE_CASES, "handles null values", null_values)
        .register(BOOKS_EDGE_CASES, "handles a negative page count", negative_page_count)
        .register(BOOKS_EDGE_CASES, "handles a publish date in the future", future_date)
        .register(BOOKS_EDGE_CASES, "handles a very old publish date", old_date)
        .register(BOOKS_EDGE_CASES, "handles a very large id", large_id)
        .register(BOOKS_EDGE_CASES, "handles malformed ids", malformed_ids)
        .register(BOOKS_EDGE_CASES, "echoes unicode titles", unicode_title)
        .register(BOOKS_EDGE_CASES, "survives SQL injection attempts", sql_injection)
        .register(BOOKS_EDGE_CASES, "echoes script tags verbatim", script_tags)
        .register(BOOKS_EDGE_CASES, "serves rapid sequential lists", rapid_lists)
        .register(BOOKS_EDGE_CASES, "accepts a burst of creates", create_burst)
        .register(BOOKS_EDGE_CASES, "reads back an update", update_read_back)
        .register(BOOKS_EDGE_CASES, "handles a title-only update", title_only_update);
    registry
}

fn list_all(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let resp = ctx.books().list()?;
    expect_status(&resp, &[200])?;
    expect_within(&resp, ctx.budgets().default_budget())?;
    expect_header_contains(&resp, "content-type", "application/json")?;
    let books = expect_array(&resp)?;
    validate_response_structure(&resp.body, &Books::field_names())?;
    if let Some(first) = books.first() {
        validate_record::<Books>(first)?;
    }
    Ok(())
}

fn list_is_stable(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let first = ctx.books().list()?;
    expect_status(&first, &[200])?;
    let second = ctx.books().list()?;
    expect_status(&second, &[200])?;
    check_eq!(expect_array(&first)?.len(), expect_array(&second)?.len());
    Ok(())
}

fn list_large_dataset(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let resp = ctx.books().list()?;
    expect_status(&resp, &[200])?;
    expect_within(&resp, ctx.budgets().large_dataset_budget())?;
    check!(!expect_array(&resp)?.is_empty(), "book catalogue is empty");
    Ok(())
}

fn get_by_id(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let id = first_listed_id::<Books>(ctx)?;
    let resp = ctx.books().get_by_id(id)?;
    expect_status(&resp, &[200])?;
    expect_within(&resp, ctx.budgets().default_budget())?;
    validate_record::<Books>(&resp.body)?;
    let book: Book = parse_record::<Books>(&resp.body)?;
    check_eq!(book.id, id);
    Ok(())
}

fn get_missing(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let resp = ctx.books().get_by_id(MISSING_ID)?;
    expect_absent(&resp)?;
    Ok(())
}

fn create_valid(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let sent = &ctx.fixtures().books.valid_book;
    let resp = create::<Books>(ctx, sent)?;
    expect_status(&resp, &[200])?;
    expect_within(&resp, ctx.budgets().default_budget())?;
    validate_structure(&resp.body, &Books::field_names())?;
    expect_echo(&resp.body, sent, &["title", "description", "pageCount"])?;
    Ok(())
}

fn create_long_text(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let sent = &ctx.fixtures().books.book_with_long_text;
    let resp = create::<Books>(ctx, sent)?;
    expect_status(&resp, &[200])?;
    expect_echo(&resp.body, sent, &["title", "description"])?;
    Ok(())
}

fn create_invalid(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    try_create::<Books>(ctx, &ctx.fixtures().books.invalid_book)?;
    Ok(())
}

fn create_sequential(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let valid = &ctx.fixtures().books.valid_book;
    let first = create::<Books>(ctx, &merge(valid, json!({"title": "Sequential Book 1"})))?;
    expect_status(&first, &[200])?;
    let second_sent = merge(valid, json!({"title": "Sequential Book 2"}));
    let second = create::<Books>(ctx, &second_sent)?;
    expect_status(&second, &[200])?;

    expect_echo(&second.body, &second_sent, &["title"])?;
    check!(
        first.body["title"] != second.body["title"],
        "sequential creates returned the same title {}",
        first.body["title"]
    );
    Ok(())
}

fn update_existing(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let created = create::<Books>(ctx, &ctx.fixtures().books.valid_book)?;
    expect_status(&created, &[200])?;
    let id = created_id(&created)?;

    let sent = &ctx.fixtures().books.book_to_update;
    let resp = ctx.books().update(id, sent)?;
    expect_status(&resp, &[200])?;
    expect_within(&resp, ctx.budgets().default_budget())?;
    expect_field_eq(&resp.body, "id", &json!(id))?;
    expect_echo(&resp.body, sent, &["title", "description"])?;
    Ok(())
}

fn update_keeps_fields(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let created = create::<Books>(ctx, &ctx.fixtures().books.valid_book)?;
    expect_status(&created, &[200])?;
    let id = created_id(&created)?;

    let sent = merge(&created.body, json!({"title": "Partially Updated Title"}));
    let resp = ctx.books().update(id, &sent)?;
    expect_status(&resp, &[200])?;
    expect_echo(&resp.body, &sent, &["title"])?;
    expect_echo(&resp.body, &created.body, &["description"])?;
    Ok(())
}

fn delete_existing(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let created = create::<Books>(ctx, &ctx.fixtures().books.valid_book)?;
    expect_status(&created, &[200])?;
    let id = created_id(&created)?;

    let resp = ctx.books().delete(id)?;
    expect_status(&resp, &[200])?;
    expect_within(&resp, ctx.budgets().default_budget())?;
    expect_absent(&ctx.books().get_by_id(id)?)?;
    Ok(())
}

fn delete_missing(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let resp = ctx.books().delete(MISSING_ID)?;
    expect_status(&resp, &[200, 404])?;
    Ok(())
}

fn long_title(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let body = generate_book_data(json!({"title": "A".repeat(1000)}));
    if let Some(resp) = try_create::<Books>(ctx, &body)? {
        expect_echo(&resp.body, &body, &["title"])?;
    }
    Ok(())
}

fn empty_strings(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let body = json!({
        "id": 0,
        "title": "",
        "description": "",
        "pageCount": 0,
        "excerpt": "",
        "publishDate": "",
    });
    try_create::<Books>(ctx, &body)?;
    Ok(())
}

fn null_values(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let body = json!({
        "id": 0,
        "title": null,
        "description": null,
        "pageCount": null,
        "excerpt": null,
        "publishDate": null,
    });
    try_create::<Books>(ctx, &body)?;
    Ok(())
}

fn negative_page_count(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    try_create::<Books>(ctx, &generate_book_data(json!({"pageCount": -100})))?;
    Ok(())
}

fn future_date(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let future = (Utc::now() + Duration::days(3650)).to_rfc3339_opts(SecondsFormat::Millis, true);
    try_create::<Books>(ctx, &generate_book_data(json!({"publishDate": future})))?;
    Ok(())
}

fn old_date(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let body = generate_book_data(json!({"publishDate": "1800-01-01T00:00:00.000Z"}));
    try_create::<Books>(ctx, &body)?;
    Ok(())
}

fn large_id(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let resp = ctx.books().get_by_id(999_999_999)?;
    expect_status(&resp, &[200, 404])?;
    Ok(())
}

fn malformed_ids(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    for id in ["0", "1.5", "abc"] {
        let resp = ctx.books().get_by_id(id)?;
        expect_status(&resp, &[200, 400, 404])?;
    }
    Ok(())
}

fn unicode_title(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let sent = generate_book_data(json!({"title": "测试书籍 🚀 📚"}));
    if let Some(resp) = try_create::<Books>(ctx, &sent)? {
        expect_echo(&resp.body, &sent, &["title"])?;
    }
    Ok(())
}

fn sql_injection(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let sent = generate_book_data(json!({
        "title": "'; DROP TABLE Books; --",
        "description": "1' OR '1'='1",
    }));
    try_create::<Books>(ctx, &sent)?;
    let resp = ctx.books().list()?;
    expect_status(&resp, &[200])?;
    Ok(())
}

fn script_tags(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let title = "<script>alert(1)</script>";
    let sent = generate_book_data(json!({"title": title}));
    if let Some(resp) = try_create::<Books>(ctx, &sent)? {
        check_eq!(resp.body["title"].as_str(), Some(title));
    }
    Ok(())
}

fn rapid_lists(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    for _ in 0..10 {
        let resp = ctx.books().list()?;
        expect_status(&resp, &[200])?;
    }
    Ok(())
}

fn create_burst(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    for n in 1..=5 {
        let body = generate_book_data(json!({"title": format!("Burst Book {n}")}));
        let resp = create::<Books>(ctx, &body)?;
        expect_status(&resp, &[200, 400, 422, 429])?;
    }
    Ok(())
}

fn update_read_back(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let original = json!({
        "title": "Original Title",
        "description": "Original description",
        "pageCount": 100,
        "excerpt": "Original excerpt",
        "publishDate": "2023-01-01T00:00:00.000Z",
    });
    let Some(created) = try_create::<Books>(ctx, &original)? else {
        return Ok(());
    };
    let id = created_id(&created)?;

    let updated = json!({
        "title": "Updated Title",
        "description": "Updated description",
        "pageCount": 200,
        "excerpt": "Updated excerpt",
        "publishDate": "2023-02-01T00:00:00.000Z",
    });
    let resp = ctx.books().update(id, &updated)?;
    expect_status(&resp, ACCEPT_OR_REJECT)?;
    if resp.status != 200 {
        return Ok(());
    }
    if let Some(read) = ctx.read_back::<Books>(id)? {
        expect_echo(&read.body, &updated, &["title"])?;
    }
    Ok(())
}

fn title_only_update(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let original = json!({
        "title": "Partial Update Test",
        "description": "Original description",
        "pageCount": 100,
        "excerpt": "Original excerpt",
        "publishDate": "2023-01-01T00:00:00.000Z",
    });
    let Some(created) = try_create::<Books>(ctx, &original)? else {
        return Ok(());
    };
    let id = created_id(&created)?;
    let resp = ctx.books().update(id, &json!({"title": "Partially Updated Title"}))?;
    expect_status(&resp, ACCEPT_OR_REJECT)?;
    Ok(())
}

