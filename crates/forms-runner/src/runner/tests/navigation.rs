use serde_json::json;

use super::common::*;
use crate::runner::domain::Application;
use crate::runner::error::RunnerError;
use crate::runner::navigation::{
    calculate_previous_page, flatten_application_data, walk_to_next_invalid_or_unfilled_page,
};
use crate::runner::pages::{DefaultPageHandler, PageHandler};

const BUDGET: usize = 50;

fn answered(application: &mut Application, page_id: &str, submission: serde_json::Value) {
    DefaultPageHandler
        .process(application, page_id, &data(submission), false, &evaluator())
        .expect("process");
}

fn linear_application() -> Application {
    application(vec![
        page("one", vec![component("text", "first")], Some("two")),
        page("two", vec![component("text", "second")], Some("three")),
        page("three", vec![component("text", "third")], Some("summary")),
        terminal("summary", "summary"),
    ])
}

#[test]
fn flattened_data_lets_component_names_win() {
    let mut application = application(vec![
        add_another_page("people", vec![component("text", "full_name")], 1, Some("people_count")),
        page("people_count", vec![component("text", "people")], Some("summary")),
        terminal("summary", "summary"),
    ]);
    application.pages[0].add_another.page_answer = vec![data(json!({ "full_name": "Ada" }))];
    answered(&mut application, "people_count", json!({ "people": "two" }));

    let flattened = flatten_application_data(&application);
    assert_eq!(flattened["people"], json!("two"));
}

#[test]
fn walk_stops_at_first_unfilled_page() {
    let mut application = linear_application();
    answered(&mut application, "one", json!({ "first": "a" }));

    let outcome =
        walk_to_next_invalid_or_unfilled_page(&mut application, "one", None, &evaluator(), BUDGET)
            .expect("walk");
    assert_eq!(outcome.page_id, "two");
    let visited: Vec<&str> = outcome.path.iter().map(|page| page.page_id.as_str()).collect();
    assert_eq!(visited, vec!["one", "two"]);
}

#[test]
fn walk_stops_on_terminal_page_when_everything_is_answered() {
    let mut application = linear_application();
    answered(&mut application, "one", json!({ "first": "a" }));
    answered(&mut application, "two", json!({ "second": "b" }));
    answered(&mut application, "three", json!({ "third": "c" }));

    let outcome =
        walk_to_next_invalid_or_unfilled_page(&mut application, "one", None, &evaluator(), BUDGET)
            .expect("walk");
    assert_eq!(outcome.page_id, "summary");
    assert_eq!(outcome.page_type.as_deref(), Some("summary"));
}

#[test]
fn walk_stops_on_invalid_page_and_records_errors() {
    let mut application = application(vec![
        page("one", vec![component("text", "first")], Some("two")),
        page(
            "two",
            vec![with_rule(
                component("text", "second"),
                "data.second !== data.first",
                "Must differ",
            )],
            Some("summary"),
        ),
        terminal("summary", "summary"),
    ]);
    answered(&mut application, "one", json!({ "first": "a" }));
    answered(&mut application, "two", json!({ "second": "b" }));
    answered(&mut application, "one", json!({ "first": "b" }));

    let outcome =
        walk_to_next_invalid_or_unfilled_page(&mut application, "one", None, &evaluator(), BUDGET)
            .expect("walk");
    assert_eq!(outcome.page_id, "two");
    assert_eq!(application.answers.errors("two", "second"), &["Must differ".to_string()]);
}

#[test]
fn walk_detects_cycles() {
    let mut application = application(vec![
        page("one", vec![component("text", "first")], Some("two")),
        page("two", vec![component("text", "second")], Some("one")),
    ]);
    answered(&mut application, "one", json!({ "first": "a" }));
    answered(&mut application, "two", json!({ "second": "b" }));

    match walk_to_next_invalid_or_unfilled_page(
        &mut application,
        "one",
        None,
        &evaluator(),
        BUDGET,
    ) {
        Err(RunnerError::GraphCycleDetected { page_id }) => assert_eq!(page_id, "one"),
        other => panic!("expected cycle detection, got {other:?}"),
    }
}

#[test]
fn walk_respects_step_budget() {
    let mut application = linear_application();
    answered(&mut application, "one", json!({ "first": "a" }));
    answered(&mut application, "two", json!({ "second": "b" }));
    answered(&mut application, "three", json!({ "third": "c" }));

    match walk_to_next_invalid_or_unfilled_page(&mut application, "one", None, &evaluator(), 2) {
        Err(RunnerError::StepBudgetExceeded { budget }) => assert_eq!(budget, 2),
        other => panic!("expected budget error, got {other:?}"),
    }
}

#[test]
fn walk_fails_when_a_page_has_nowhere_to_go() {
    let mut application = application(vec![page("one", vec![component("text", "first")], None)]);
    answered(&mut application, "one", json!({ "first": "a" }));

    match walk_to_next_invalid_or_unfilled_page(
        &mut application,
        "one",
        None,
        &evaluator(),
        BUDGET,
    ) {
        Err(RunnerError::Configuration(message)) => assert!(message.contains("Page one")),
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn previous_page_follows_the_live_branch() {
    let form = branching_form();
    let mut application = Application::start(form, "applicant-1", chrono::Utc::now());
    answered(&mut application, "name", json!({ "full_name": "Ada" }));
    answered(&mut application, "age", json!({ "age": "12" }));

    let previous = calculate_previous_page(&application, "too-young", None, &evaluator(), BUDGET)
        .expect("previous page")
        .expect("has previous page");
    assert_eq!(previous.page_id, "age");

    let unreachable = calculate_previous_page(&application, "address", None, &evaluator(), BUDGET)
        .expect("previous page");
    assert!(unreachable.is_none());
}

#[test]
fn start_page_has_no_previous_page() {
    let application = linear_application();
    let previous = calculate_previous_page(&application, "one", None, &evaluator(), BUDGET)
        .expect("previous page");
    assert!(previous.is_none());
}

#[test]
fn previous_page_of_the_second_page_is_the_start() {
    let application = linear_application();
    let previous = calculate_previous_page(&application, "two", None, &evaluator(), BUDGET)
        .expect("previous page")
        .expect("has previous page");
    assert_eq!(previous.page_id, "one");
    assert_eq!(previous.address(), "one");
}

#[test]
fn previous_page_resolves_item_addresses_on_repeating_sections() {
    let mut application = application(vec![
        page("p1", vec![component("text", "first")], Some("people")),
        add_another_page("people", vec![component("text", "full_name")], 1, Some("done")),
        terminal("done", "summary"),
    ]);
    answered(&mut application, "p1", json!({ "first": "a" }));

    let plain = calculate_previous_page(&application, "people", None, &evaluator(), BUDGET)
        .expect("previous page")
        .expect("has previous page");
    let item = calculate_previous_page(&application, "people", Some("1"), &evaluator(), BUDGET)
        .expect("previous page")
        .expect("has previous page");
    assert_eq!(plain, item);
    assert_eq!(item.page_id, "p1");

    let later = calculate_previous_page(&application, "people", Some("3"), &evaluator(), BUDGET)
        .expect("previous page")
        .expect("has previous page");
    assert_eq!(later.address(), "people/2");
}

#[test]
fn repeated_walks_over_a_valid_application_agree() {
    let mut application = linear_application();
    answered(&mut application, "one", json!({ "first": "a" }));
    answered(&mut application, "two", json!({ "second": "b" }));
    answered(&mut application, "three", json!({ "third": "c" }));

    let first =
        walk_to_next_invalid_or_unfilled_page(&mut application, "one", None, &evaluator(), BUDGET)
            .expect("first walk");
    let after_first = application.clone();
    let second =
        walk_to_next_invalid_or_unfilled_page(&mut application, "one", None, &evaluator(), BUDGET)
            .expect("second walk");

    assert_eq!(first, second);
    assert_eq!(second.page_id, "summary");
    assert_eq!(application, after_first);
}

#[test]
fn repeated_walks_leave_add_another_errors_unchanged() {
    let mut application = application(vec![
        page("p1", vec![component("text", "first")], Some("people")),
        add_another_page(
            "people",
            vec![with_rule(
                component("text", "full_name"),
                "data.full_name.length > 1",
                "Name too short",
            )],
            2,
            Some("done"),
        ),
        terminal("done", "summary"),
    ]);
    answered(&mut application, "p1", json!({ "first": "a" }));
    application.pages[1].add_another.page_answer = vec![
        data(json!({ "full_name": "Ada" })),
        data(json!({ "full_name": "Grace" })),
    ];

    let first =
        walk_to_next_invalid_or_unfilled_page(&mut application, "p1", None, &evaluator(), BUDGET)
            .expect("first walk");
    let after_first = application.clone();
    let second =
        walk_to_next_invalid_or_unfilled_page(&mut application, "p1", None, &evaluator(), BUDGET)
            .expect("second walk");

    assert_eq!(first, second);
    assert_eq!(second.page_id, "done");
    assert!(application.pages[1].add_another.page_errors.is_empty());
    assert_eq!(application, after_first);
}
