use std::sync::Arc;

use serde_json::{Value, json};

use formwork_core::RegistryError;

use crate::answers::{AnswerStore, MutationSource};
use crate::components::{ComponentEntry, ComponentRegistry, RendererFn};
use crate::functions::FunctionRegistry;
use crate::request::{CookieOptions, ResponseState};

fn renderer() -> RendererFn {
    Arc::new(|block: &Value| {
        let markup = format!("<div>{block}</div>");
        Box::pin(async move { Ok(markup) })
    })
}

#[test]
fn duplicate_function_registration_is_an_error() {
    let mut registry = FunctionRegistry::with_builtins();

    let err = registry
        .register_transformer("trim", |args| Ok(args[0].clone()))
        .unwrap_err();

    assert!(matches!(err, RegistryError::DuplicateFunction(name) if name == "trim"));
}

#[test]
fn register_many_aggregates_duplicates() {
    let mut registry = FunctionRegistry::new();
    registry.register_condition("truthy", |_| Ok(true)).unwrap();

    let errors = registry
        .register_many([
            (
                "truthy".to_owned(),
                crate::functions::Callable::Condition(Arc::new(|_| Ok(false))),
            ),
            (
                "fresh".to_owned(),
                crate::functions::Callable::Condition(Arc::new(|_| Ok(false))),
            ),
            (
                "fresh".to_owned(),
                crate::functions::Callable::Condition(Arc::new(|_| Ok(false))),
            ),
        ])
        .unwrap_err();

    // Both duplicates are reported; the fresh name still registered.
    assert_eq!(errors.len(), 2);
    assert!(registry.has("fresh"));
}

#[test]
fn component_entries_are_validated() {
    let mut registry = ComponentRegistry::new();

    let err = registry
        .register(ComponentEntry {
            variant: String::new(),
            render: renderer(),
        })
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidComponent(_)));

    registry
        .register(ComponentEntry {
            variant: "text-input".to_owned(),
            render: renderer(),
        })
        .unwrap();
    let errors = registry
        .register_many([
            ComponentEntry {
                variant: "text-input".to_owned(),
                render: renderer(),
            },
            ComponentEntry {
                variant: String::new(),
                render: renderer(),
            },
        ])
        .unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(registry.has("text-input"));
}

#[test]
fn answer_history_tracks_sources_and_current() {
    let mut answers = AnswerStore::new();
    answers.seed_post("name", json!("typed"));
    answers.set("name", json!("adjusted"), MutationSource::Submit);

    let history = answers.history("name").unwrap();
    assert_eq!(history.current, json!("adjusted"));
    assert_eq!(history.mutations.len(), 2);
    assert_eq!(history.mutations[0].source, MutationSource::Post);
    assert_eq!(history.mutations[1].source, MutationSource::Submit);
    // Current always equals the last mutation's value.
    assert_eq!(history.current, history.mutations.last().unwrap().value);

    answers.clear("name");
    assert!(!answers.has("name"));
}

#[test]
fn cookie_clear_uses_zero_max_age() {
    let mut response = ResponseState::default();
    response.set_cookie(
        "session",
        "abc",
        CookieOptions {
            max_age: Some(3600),
            http_only: true,
            secure: true,
            same_site: Some("Lax".to_owned()),
        },
    );
    response.set_cookie(
        "session",
        "",
        CookieOptions {
            max_age: Some(0),
            ..CookieOptions::default()
        },
    );

    let (value, options) = response.cookie("session").unwrap();
    assert_eq!(value, "");
    assert_eq!(options.max_age, Some(0));
}
