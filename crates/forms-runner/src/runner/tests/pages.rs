use serde_json::json;

use super::common::*;
use crate::runner::answers::AnswerSet;
use crate::runner::domain::PageType;
use crate::runner::error::RunnerError;
use crate::runner::pages::{
    handler_for_page, DefaultPageHandler, MoJAddAnotherPageHandler, PageHandler,
};

fn people_page() -> crate::runner::domain::Page {
    add_another_page(
        "people",
        vec![
            with_rule(
                component("text", "full_name"),
                "data.full_name.length > 1",
                "Name too short",
            ),
            optional(component("text", "nickname")),
        ],
        2,
        Some("summary"),
    )
}

#[test]
fn dispatch_selects_handler_by_page_type() {
    assert_eq!(handler_for_page(PageType::Default).page_type(), PageType::Default);
    assert_eq!(handler_for_page(PageType::Summary).page_type(), PageType::Default);
    assert_eq!(handler_for_page(PageType::MojAddAnother).page_type(), PageType::MojAddAnother);
}

#[test]
fn unsupported_and_missing_page_types_are_configuration_errors() {
    let mut page = page("p1", Vec::new(), None);
    page.page_type = Some("wizard".to_string());
    match page.kind() {
        Err(RunnerError::Configuration(message)) => {
            assert_eq!(message, "Unsupported page type: wizard")
        }
        other => panic!("expected configuration error, got {other:?}"),
    }

    page.page_type = None;
    match page.kind() {
        Err(RunnerError::Configuration(message)) => {
            assert_eq!(message, "Page type is undefined for page ID p1.")
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn process_records_answers_and_errors_in_answer_set() {
    let mut application = application(vec![page(
        "details",
        vec![component("text", "full_name"), component("email", "email")],
        Some("summary"),
    )]);
    let has_errors = DefaultPageHandler
        .process(
            &mut application,
            "details",
            &data(json!({ "full_name": "Ada", "email": "not-an-email" })),
            false,
            &evaluator(),
        )
        .expect("process");

    assert!(has_errors);
    assert!(application.answers.has_errors("details"));
    assert_eq!(application.answers.answer("details", "full_name"), Some(&json!("Ada")));
    assert!(application.answers.errors("details", "full_name").is_empty());
    assert_eq!(application.answers.errors("details", "email").len(), 1);
    assert!(application.pages[0].components.iter().all(|c| c.name.is_some()));
}

#[test]
fn process_skips_html_components() {
    let mut html = component("html", "banner");
    html.name = None;
    let mut application = application(vec![page(
        "intro",
        vec![html, component("text", "full_name")],
        Some("summary"),
    )]);
    let has_errors = DefaultPageHandler
        .process(
            &mut application,
            "intro",
            &data(json!({ "full_name": "Ada" })),
            false,
            &evaluator(),
        )
        .expect("process");
    assert!(!has_errors);
}

#[test]
fn process_rejects_components_without_type_or_name() {
    let mut untyped = component("text", "full_name");
    untyped.kind = None;
    let mut application = application(vec![page("p1", vec![untyped], None)]);
    let form_data = data(json!({}));
    match DefaultPageHandler.process(&mut application, "p1", &form_data, false, &evaluator()) {
        Err(RunnerError::Configuration(message)) => {
            assert_eq!(message, "Component type is undefined for component ID q-full_name.")
        }
        other => panic!("expected configuration error, got {other:?}"),
    }

    let mut unnamed = component("text", "full_name");
    unnamed.name = None;
    let mut application = super::common::application(vec![page("p1", vec![unnamed], None)]);
    let form_data = data(json!({}));
    match DefaultPageHandler.process(&mut application, "p1", &form_data, false, &evaluator()) {
        Err(RunnerError::Configuration(message)) => {
            assert_eq!(message, "Component name is undefined for component ID q-full_name.")
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn process_reports_unknown_page() {
    let mut application = application(vec![page("p1", Vec::new(), None)]);
    let form_data = data(json!({}));
    match DefaultPageHandler.process(&mut application, "missing", &form_data, false, &evaluator()) {
        Err(RunnerError::NotFound { entity, id }) => {
            assert_eq!(entity, "Page");
            assert_eq!(id, "missing");
        }
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn skipping_validation_clears_errors() {
    let mut application = application(vec![page("p1", vec![component("text", "full_name")], None)]);
    let has_errors = DefaultPageHandler
        .process(&mut application, "p1", &data(json!({})), true, &evaluator())
        .expect("process");
    assert!(!has_errors);
    assert!(application.answers.errors("p1", "full_name").is_empty());
}

#[test]
fn rules_see_answers_from_other_pages() {
    let first = page("first", vec![component("email", "email")], Some("second"));
    let second = page(
        "second",
        vec![with_rule(
            component("email", "confirm_email"),
            "data.confirm_email === data.email",
            "Emails must match",
        )],
        Some("summary"),
    );
    let mut application = application(vec![first, second]);
    DefaultPageHandler
        .process(
            &mut application,
            "first",
            &data(json!({ "email": "a@example.com" })),
            false,
            &evaluator(),
        )
        .expect("process first");
    let has_errors = DefaultPageHandler
        .process(
            &mut application,
            "second",
            &data(json!({ "confirm_email": "b@example.com" })),
            false,
            &evaluator(),
        )
        .expect("process second");
    assert!(has_errors);
    assert_eq!(
        application.answers.errors("second", "confirm_email"),
        &["Emails must match".to_string()]
    );
}

#[test]
fn next_page_prefers_first_matching_condition() {
    let age = with_condition(
        with_condition(
            page("age", vec![component("number", "age")], Some("adult")),
            "data.age < 13",
            "child",
        ),
        "data.age < 18",
        "teen",
    );
    let mut application = application(vec![
        age,
        terminal("child", "stop"),
        terminal("teen", "stop"),
        terminal("adult", "summary"),
    ]);
    let evaluator = evaluator();

    for (input, expected) in [("10", "child"), ("15", "teen"), ("40", "adult")] {
        DefaultPageHandler
            .process(&mut application, "age", &data(json!({ "age": input })), false, &evaluator)
            .expect("process");
        let next = DefaultPageHandler
            .next_page(&application, "age", &evaluator)
            .expect("next page");
        assert_eq!(next.next_page_id.as_deref(), Some(expected), "age {input}");
    }
    let next = DefaultPageHandler.next_page(&application, "age", &evaluator).expect("next page");
    assert_eq!(next.next_page_type.as_deref(), Some("summary"));
}

#[test]
fn add_another_items_parse_both_key_orders() {
    let prefixed = data(json!({ "1-full_name": "Ada", "2-full_name": "Grace" }));
    let suffixed = data(json!({ "full_name-1": "Ada", "full_name-2": "Grace" }));
    let mut answers = Vec::new();

    for submission in [prefixed, suffixed] {
        let mut application = application(vec![people_page(), terminal("summary", "summary")]);
        let has_errors = MoJAddAnotherPageHandler
            .process(&mut application, "people", &submission, false, &evaluator())
            .expect("process");
        assert!(!has_errors);
        answers.push(application.pages[0].add_another.page_answer.clone());
    }

    assert_eq!(answers[0], answers[1]);
    assert_eq!(answers[0].len(), 2);
    assert_eq!(answers[0][0]["full_name"], json!("Ada"));
    assert_eq!(answers[0][1]["full_name"], json!("Grace"));
}

#[test]
fn add_another_errors_are_keyed_by_item_number() {
    let mut application = application(vec![people_page(), terminal("summary", "summary")]);
    let has_errors = MoJAddAnotherPageHandler
        .process(
            &mut application,
            "people",
            &data(json!({ "full_name-1": "Ada", "full_name-2": "G" })),
            false,
            &evaluator(),
        )
        .expect("process");

    assert!(has_errors);
    let section = &application.pages[0].add_another;
    assert_eq!(section.page_answer.len(), 2);
    assert_eq!(
        section.page_errors.get("full_name-2"),
        Some(&vec!["Name too short".to_string()])
    );
    assert!(!section.page_errors.contains_key("full_name-1"));
    assert_eq!(application.answers, AnswerSet::default());
}

#[test]
fn add_another_ignores_unrelated_keys() {
    let mut application = application(vec![people_page(), terminal("summary", "summary")]);
    MoJAddAnotherPageHandler
        .process(
            &mut application,
            "people",
            &data(json!({
                "full_name-1": "Ada",
                "full_name-2": "Grace",
                "csrf-1": "token",
                "other": "x"
            })),
            false,
            &evaluator(),
        )
        .expect("process");
    let first = &application.pages[0].add_another.page_answer[0];
    assert_eq!(first.len(), 2);
    assert!(first.contains_key("nickname"));
    assert!(!first.contains_key("csrf"));
}

#[test]
fn add_another_walk_halts_on_missing_item() {
    let mut application = application(vec![people_page(), terminal("summary", "summary")]);
    MoJAddAnotherPageHandler
        .process(
            &mut application,
            "people",
            &data(json!({ "full_name-1": "Ada" })),
            true,
            &evaluator(),
        )
        .expect("process");
    let step = MoJAddAnotherPageHandler
        .walk(&mut application, "people", None, &evaluator())
        .expect("walk");
    assert!(step.stop);
    assert_eq!(step.page_id.as_deref(), Some("people"));
}

#[test]
fn add_another_walk_continues_when_items_are_valid() {
    let mut application = application(vec![people_page(), terminal("summary", "summary")]);
    application.pages[0].add_another.page_answer = vec![
        data(json!({ "full_name": "Ada", "nickname": "A" })),
        data(json!({ "full_name": "Grace", "nickname": "G" })),
    ];
    let step = MoJAddAnotherPageHandler
        .walk(&mut application, "people", None, &evaluator())
        .expect("walk");
    assert!(!step.stop);
    assert_eq!(step.page_id.as_deref(), Some("summary"));
    assert_eq!(step.page_type.as_deref(), Some("summary"));
}

#[test]
fn add_another_items_are_visible_under_page_id() {
    let people = people_page();
    let count = with_condition(
        page("count", vec![component("text", "confirm")], Some("summary")),
        "data.people.length > 1",
        "many",
    );
    let mut application = application(vec![
        people,
        count,
        terminal("many", "stop"),
        terminal("summary", "summary"),
    ]);
    MoJAddAnotherPageHandler
        .process(
            &mut application,
            "people",
            &data(json!({ "full_name-1": "Ada", "full_name-2": "Grace" })),
            false,
            &evaluator(),
        )
        .expect("process");
    let next = DefaultPageHandler
        .next_page(&application, "count", &evaluator())
        .expect("next page");
    assert_eq!(next.next_page_id.as_deref(), Some("many"));
}
