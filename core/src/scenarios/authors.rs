//! Authors suites, including the by-book listing at `/Authors/authors/books/{id}`.

use serde_json::json;

use super::{
    create, created_id, first_listed_id, try_create, validate_record, ACCEPT_OR_REJECT, AUTHORS_CRUD,
    AUTHORS_EDGE_CASES,
};
use crate::assertions::{
    expect_absent, expect_array, expect_echo, expect_field_eq, expect_header_contains, expect_status, expect_within,
};
use crate::fixtures::{generate_author_data, merge};
use crate::resource::{Authors, Resource};
use crate::scenario::{ScenarioContext, ScenarioRegistry, ScenarioResult};
use crate::types::Author;
use crate::validate::{parse_record, validate_response_structure};
use crate::{check, check_eq};

const MISSING_ID: i64 = 999_999;
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

pub fn authors_crud() -> ScenarioRegistry {
    let mut registry = ScenarioRegistry::new();
    registry
        .register(AUTHORS_CRUD, "lists all authors", list_all)
        .register(AUTHORS_CRUD, "lists every author within the large dataset budget", list_large_dataset)
        .register(AUTHORS_CRUD, "gets an author by id", get_by_id)
        .register(AUTHORS_CRUD, "reports an unknown author as absent", get_missing)
        .register(AUTHORS_CRUD, "lists the authors of a book", list_by_book)
        .register(AUTHORS_CRUD, "lists no authors for an unknown book", list_by_missing_book)
        .register(AUTHORS_CRUD, "handles invalid book ids when listing by book", list_by_invalid_book)
        .register(AUTHORS_CRUD, "creates a valid author", create_valid)
        .register(AUTHORS_CRUD, "creates an author with long names", create_long_names)
        .register(AUTHORS_CRUD, "handles an invalid author payload", create_invalid)
        .register(AUTHORS_CRUD, "creates two authors for the same book", create_same_book)
        .register(AUTHORS_CRUD, "updates an existing author", update_existing)
        .register(AUTHORS_CRUD, "keeps untouched fields on a full-record update", update_keeps_fields)
        .register(AUTHORS_CRUD, "handles an invalid update payload", update_invalid)
        .register(AUTHORS_CRUD, "deletes an author", delete_existing)
        .register(AUTHORS_CRUD, "deletes an unknown author", delete_missing)
        .register(AUTHORS_CRUD, "rejects deleting a malformed id", delete_malformed);
    registry
}

pub fn authors_edge_cases() -> ScenarioRegistry {
    let mut registry = ScenarioRegistry::new();
    registry
        .register(AUTHORS_EDGE_CASES, "handles very long names", long_names)
        .register(AUTHORS_EDGE_CASES, "handles empty names", empty_names)
        .register(AUTHORS_EDGE_CASES, "handles null values", null_values)
        .register(AUTHORS_EDGE_CASES, "handles a negative book id", negative_book_id)
        .register(AUTHORS_EDGE_CASES, "handles a zero book id", zero_book_id)
        .register(AUTHORS_EDGE_CASES, "handles a very large book id", large_book_id)
        .register(AUTHORS_EDGE_CASES, "handles malformed ids", malformed_ids)
        .register(AUTHORS_EDGE_CASES, "handles a very large book id when listing by book", list_by_large_book)
        .register(AUTHORS_EDGE_CASES, "handles book id zero when listing by book", list_by_zero_book)
        .register(AUTHORS_EDGE_CASES, "echoes unicode names", unicode_names)
        .register(AUTHORS_EDGE_CASES, "survives SQL injection attempts", sql_injection)
        .register(AUTHORS_EDGE_CASES, "handles script tags in names", script_tags)
        .register(AUTHORS_EDGE_CASES, "echoes hyphens and apostrophes", punctuated_names)
        .register(AUTHORS_EDGE_CASES, "serves rapid sequential lists", rapid_lists)
        .register(AUTHORS_EDGE_CASES, "accepts a burst of creates", create_burst)
        .register(AUTHORS_EDGE_CASES, "lists a large dataset", large_dataset)
        .register(AUTHORS_EDGE_CASES, "reads back an update", update_read_back)
        .register(AUTHORS_EDGE_CASES, "handles a first-name-only update", first_name_only_update)
        .register(AUTHORS_EDGE_CASES, "handles integer boundary book ids", boundary_book_ids);
    registry
}

fn list_all(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let resp = ctx.authors().list()?;
    expect_status(&resp, &[200])?;
    expect_within(&resp, ctx.budgets().default_budget())?;
    expect_header_contains(&resp, "content-type", "application/json")?;
    let authors = expect_array(&resp)?;
    validate_response_structure(&resp.body, &Authors::field_names())?;
    if let Some(first) = authors.first() {
        validate_record::<Authors>(first)?;
    }
    Ok(())
}

fn list_large_dataset(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let resp = ctx.authors().list()?;
    expect_status(&resp, &[200])?;
    expect_within(&resp, ctx.budgets().large_dataset_budget())?;
    check!(!expect_array(&resp)?.is_empty(), "author list is empty");
    Ok(())
}

fn get_by_id(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let id = first_listed_id::<Authors>(ctx)?;
    let resp = ctx.authors().get_by_id(id)?;
    expect_status(&resp, &[200])?;
    expect_within(&resp, ctx.budgets().default_budget())?;
    validate_record::<Authors>(&resp.body)?;
    let author: Author = parse_record::<Authors>(&resp.body)?;
    check_eq!(author.id, id);
    Ok(())
}

fn get_missing(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    expect_absent(&ctx.authors().get_by_id(MISSING_ID)?)?;
    Ok(())
}

fn list_by_book(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let book_id = 1;
    let resp = ctx.authors().list_by_book(book_id)?;
    expect_status(&resp, &[200])?;
    expect_within(&resp, ctx.budgets().default_budget())?;
    for author in expect_array(&resp)? {
        expect_field_eq(author, "idBook", &json!(book_id))?;
    }
    Ok(())
}

fn list_by_missing_book(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let resp = ctx.authors().list_by_book(MISSING_ID)?;
    expect_status(&resp, &[200])?;
    let authors = expect_array(&resp)?;
    check!(authors.is_empty(), "expected no authors for book {MISSING_ID}, got {}", authors.len());
    Ok(())
}

fn list_by_invalid_book(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    for book_id in ["abc", "!@#", ""] {
        let resp = ctx.authors().list_by_book(book_id)?;
        expect_status(&resp, &[200, 400, 404])?;
    }
    Ok(())
}

fn create_valid(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let sent = &ctx.fixtures().authors.valid_author;
    let resp = create::<Authors>(ctx, sent)?;
    expect_status(&resp, &[200])?;
    expect_within(&resp, ctx.budgets().default_budget())?;
    validate_record::<Authors>(&resp.body)?;
    expect_echo(&resp.body, sent, &["firstName", "lastName", "idBook"])?;
    Ok(())
}

fn create_long_names(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let sent = &ctx.fixtures().authors.author_with_long_names;
    let resp = create::<Authors>(ctx, sent)?;
    expect_status(&resp, &[200])?;
    expect_echo(&resp.body, sent, &["firstName", "lastName"])?;
    Ok(())
}

fn create_invalid(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    try_create::<Authors>(ctx, &ctx.fixtures().authors.invalid_author)?;
    Ok(())
}

fn create_same_book(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let valid = &ctx.fixtures().authors.valid_author;
    let first = create::<Authors>(ctx, &merge(valid, json!({"idBook": 1, "firstName": "Author One"})))?;
    expect_status(&first, &[200])?;
    let second = create::<Authors>(ctx, &merge(valid, json!({"idBook": 1, "firstName": "Author Two"})))?;
    expect_status(&second, &[200])?;

    check_eq!(first.body["idBook"], second.body["idBook"]);
    check!(
        first.body["firstName"] != second.body["firstName"],
        "both authors came back as {}",
        first.body["firstName"]
    );
    Ok(())
}

fn update_existing(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let created = create::<Authors>(ctx, &ctx.fixtures().authors.valid_author)?;
    expect_status(&created, &[200])?;
    let id = created_id(&created)?;

    let sent = &ctx.fixtures().authors.author_to_update;
    let resp = ctx.authors().update(id, sent)?;
    expect_status(&resp, &[200])?;
    expect_within(&resp, ctx.budgets().default_budget())?;
    expect_field_eq(&resp.body, "id", &json!(id))?;
    expect_echo(&resp.body, sent, &["firstName", "lastName", "idBook"])?;
    Ok(())
}

fn update_keeps_fields(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let created = create::<Authors>(ctx, &ctx.fixtures().authors.valid_author)?;
    expect_status(&created, &[200])?;
    let id = created_id(&created)?;

    let sent = merge(&created.body, json!({"firstName": "Partially Updated"}));
    let resp = ctx.authors().update(id, &sent)?;
    expect_status(&resp, &[200])?;
    expect_echo(&resp.body, &sent, &["firstName"])?;
    expect_echo(&resp.body, &created.body, &["lastName", "idBook"])?;
    Ok(())
}

fn update_invalid(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let created = create::<Authors>(ctx, &ctx.fixtures().authors.valid_author)?;
    expect_status(&created, &[200])?;
    let id = created_id(&created)?;

    let resp = ctx
        .authors()
        .update(id, &json!({"firstName": null, "lastName": "", "idBook": -1}))?;
    expect_status(&resp, ACCEPT_OR_REJECT)?;
    Ok(())
}

fn delete_existing(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let created = create::<Authors>(ctx, &ctx.fixtures().authors.valid_author)?;
    expect_status(&created, &[200])?;
    let id = created_id(&created)?;

    let resp = ctx.authors().delete(id)?;
    expect_status(&resp, &[200])?;
    expect_within(&resp, ctx.budgets().default_budget())?;
    expect_absent(&ctx.authors().get_by_id(id)?)?;
    Ok(())
}

fn delete_missing(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    expect_status(&ctx.authors().delete(MISSING_ID)?, &[200, 404])?;
    Ok(())
}

fn delete_malformed(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    expect_status(&ctx.authors().delete("invalid-id")?, &[400, 404])?;
    Ok(())
}

fn long_names(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let body = generate_author_data(json!({
        "firstName": "A".repeat(1000),
        "lastName": "B".repeat(1000),
    }));
    if let Some(resp) = try_create::<Authors>(ctx, &body)? {
        expect_echo(&resp.body, &body, &["firstName", "lastName"])?;
    }
    Ok(())
}

fn empty_names(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    try_create::<Authors>(ctx, &generate_author_data(json!({"idBook": 0, "firstName": "", "lastName": ""})))?;
    Ok(())
}

fn null_values(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let body = json!({"id": 0, "idBook": null, "firstName": null, "lastName": null});
    try_create::<Authors>(ctx, &body)?;
    Ok(())
}

fn negative_book_id(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    try_create::<Authors>(ctx, &generate_author_data(json!({"idBook": -1})))?;
    Ok(())
}

fn zero_book_id(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    try_create::<Authors>(ctx, &generate_author_data(json!({"idBook": 0})))?;
    Ok(())
}

fn large_book_id(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    try_create::<Authors>(ctx, &generate_author_data(json!({"idBook": 999_999_999})))?;
    Ok(())
}

fn malformed_ids(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    for id in ["0", "1.5", "abc"] {
        expect_status(&ctx.authors().get_by_id(id)?, &[200, 400, 404])?;
    }
    Ok(())
}

fn list_by_large_book(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    expect_status(&ctx.authors().list_by_book(999_999_999)?, &[200, 404])?;
    Ok(())
}

fn list_by_zero_book(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    expect_status(&ctx.authors().list_by_book(0)?, &[200, 400, 404])?;
    Ok(())
}

fn unicode_names(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let sent = generate_author_data(json!({"firstName": "José María 🚀", "lastName": "García-López 📚"}));
    if let Some(resp) = try_create::<Authors>(ctx, &sent)? {
        expect_echo(&resp.body, &sent, &["firstName", "lastName"])?;
    }
    Ok(())
}

fn sql_injection(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let sent = generate_author_data(json!({
        "firstName": "'; DROP TABLE Authors; --",
        "lastName": "1' OR '1'='1",
    }));
    try_create::<Authors>(ctx, &sent)?;
    expect_status(&ctx.authors().list()?, &[200])?;
    Ok(())
}

fn script_tags(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let sent = generate_author_data(json!({
        "firstName": "<script>alert('xss')</script>",
        "lastName": "<img src=x onerror=alert(1)>",
    }));
    if let Some(resp) = try_create::<Authors>(ctx, &sent)? {
        expect_echo(&resp.body, &sent, &["firstName", "lastName"])?;
    }
    Ok(())
}

fn punctuated_names(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let sent = generate_author_data(json!({"firstName": "Jean-Pierre", "lastName": "O'Connor-Smith"}));
    if let Some(resp) = try_create::<Authors>(ctx, &sent)? {
        expect_echo(&resp.body, &sent, &["firstName", "lastName"])?;
    }
    Ok(())
}

fn rapid_lists(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    for _ in 0..10 {
        expect_status(&ctx.authors().list()?, &[200])?;
    }
    Ok(())
}

fn create_burst(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    for n in 1..=5 {
        let body = generate_author_data(json!({"firstName": format!("Burst{n}")}));
        let resp = create::<Authors>(ctx, &body)?;
        expect_status(&resp, &[200, 400, 422, 429])?;
    }
    Ok(())
}

fn large_dataset(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let resp = ctx.authors().list()?;
    expect_status(&resp, &[200, 400])?;
    if resp.status == 200 {
        expect_within(&resp, ctx.budgets().large_dataset_budget())?;
        expect_array(&resp)?;
    }
    Ok(())
}

fn update_read_back(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let original = json!({"idBook": 1, "firstName": "Original", "lastName": "Author"});
    let Some(created) = try_create::<Authors>(ctx, &original)? else {
        return Ok(());
    };
    let id = created_id(&created)?;

    let updated = json!({"idBook": 2, "firstName": "Updated", "lastName": "Author"});
    let resp = ctx.authors().update(id, &updated)?;
    expect_status(&resp, ACCEPT_OR_REJECT)?;
    if resp.status != 200 {
        return Ok(());
    }
    if let Some(read) = ctx.read_back::<Authors>(id)? {
        expect_echo(&read.body, &updated, &["firstName"])?;
    }
    Ok(())
}

fn first_name_only_update(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    let original = json!({"idBook": 1, "firstName": "Partial", "lastName": "Update"});
    let Some(created) = try_create::<Authors>(ctx, &original)? else {
        return Ok(());
    };
    let id = created_id(&created)?;
    let resp = ctx.authors().update(id, &json!({"firstName": "Partially Updated"}))?;
    expect_status(&resp, ACCEPT_OR_REJECT)?;
    Ok(())
}

fn boundary_book_ids(ctx: &ScenarioContext<'_>) -> ScenarioResult {
    for id_book in [json!(MAX_SAFE_INTEGER), json!(-MAX_SAFE_INTEGER), json!(1.5)] {
        try_create::<Authors>(ctx, &generate_author_data(json!({"idBook": id_book})))?;
    }
    Ok(())
}
