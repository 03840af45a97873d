use super::*;
use shared::domain::{ModelInfo, Role};

fn store_with(policy: SelectionPolicy) -> SessionStore {
    SessionStore::seeded("sess_X", ModelRegistry::builtin(), policy).expect("seeded store")
}

#[test]
fn new_session_is_seeded_with_start_notice_and_fresh_id() {
    let store =
        SessionStore::new(ModelRegistry::builtin(), SelectionPolicy::default()).expect("store");

    assert!(store.id().starts_with("sess_"));
    assert_eq!(store.id().len(), "sess_".len() + 9);
    assert_eq!(store.messages().len(), 1);
    assert_eq!(store.messages()[0].role, Role::System);
    assert_eq!(store.messages()[0].content, SESSION_START_NOTICE);
    assert!(store.messages()[0].timestamp.is_some());
    assert_eq!(store.selected_model().as_str(), "deepseek");
    assert!(!store.is_pending());
}

#[test]
fn generated_ids_differ_between_sessions() {
    assert_ne!(generate_session_id(), generate_session_id());
}

#[test]
fn empty_seed_id_is_replaced() {
    let store = SessionStore::seeded("", ModelRegistry::builtin(), SelectionPolicy::SINGLE)
        .expect("store");
    assert!(store.id().starts_with("sess_"));
}

#[test]
fn append_returns_new_length_and_stamps_timestamp() {
    let mut store = store_with(SelectionPolicy::SINGLE);
    let len = store.append(Message::user("hello"));
    assert_eq!(len, 2);
    assert!(store.messages()[1].timestamp.is_some());
}

#[test]
fn set_model_rejects_unknown_ids_without_touching_history() {
    let mut store = store_with(SelectionPolicy::SINGLE);
    store.append(Message::user("hello"));
    let before = store.snapshot();

    let err = store
        .set_model(ModelId::new("gpt-4"))
        .expect_err("unknown model");

    assert_eq!(err, SelectionError::InvalidModel(ModelId::new("gpt-4")));
    assert_eq!(store.snapshot(), before);
}

#[test]
fn switching_models_leaves_messages_and_id_alone() {
    let mut store = store_with(SelectionPolicy::SINGLE);
    store.append(Message::user("hello"));
    let messages = store.messages().to_vec();

    store.set_model(ModelId::new("qwen")).expect("qwen");
    store.set_model(ModelId::new("mistral")).expect("mistral");
    store.set_model(ModelId::new("mistral")).expect("mistral again");

    assert_eq!(store.messages(), messages.as_slice());
    assert_eq!(store.id(), "sess_X");
    assert_eq!(store.selected_model().as_str(), "mistral");
}

#[test]
fn pending_toggles_are_idempotent() {
    let mut store = store_with(SelectionPolicy::SINGLE);
    assert!(store.begin_pending());
    assert!(!store.begin_pending());
    assert!(store.is_pending());
    assert!(store.end_pending());
    assert!(!store.end_pending());
    assert!(!store.is_pending());
}

#[test]
fn session_id_adoption_ignores_empty_and_unchanged_ids() {
    let mut store = store_with(SelectionPolicy::SINGLE);
    assert!(!store.adopt_session_id(""));
    assert!(!store.adopt_session_id("sess_X"));
    assert!(store.adopt_session_id("sess_Y"));
    assert!(!store.adopt_session_id(""));
    assert_eq!(store.id(), "sess_Y");
}

#[test]
fn policy_requires_positive_ordered_bounds() {
    assert_eq!(
        SelectionPolicy::new(0, 2),
        Err(SelectionError::InvalidPolicy { min: 0, max: 2 })
    );
    assert!(SelectionPolicy::new(1, 2).is_ok());
}

#[test]
fn set_models_enforces_policy_and_uniqueness() {
    let mut store = store_with(SelectionPolicy::new(1, 2).expect("policy"));

    assert_eq!(
        store.set_models(vec![]),
        Err(SelectionError::TooFewModels { min: 1 })
    );
    assert_eq!(
        store.set_models(vec![ModelId::new("qwen"), ModelId::new("qwen")]),
        Err(SelectionError::DuplicateModel(ModelId::new("qwen")))
    );
    assert_eq!(
        store.set_models(vec![
            ModelId::new("qwen"),
            ModelId::new("mistral"),
            ModelId::new("deepseek"),
        ]),
        Err(SelectionError::TooManyModels { max: 2 })
    );
    store
        .set_models(vec![ModelId::new("qwen"), ModelId::new("mistral")])
        .expect("two models");
    assert_eq!(
        store.selected_models(),
        &[ModelId::new("qwen"), ModelId::new("mistral")]
    );
}

#[test]
fn toggle_replaces_under_single_policy() {
    let mut store = store_with(SelectionPolicy::SINGLE);
    store.toggle_model(ModelId::new("qwen")).expect("toggle");
    assert_eq!(store.selected_models(), &[ModelId::new("qwen")]);
    assert_eq!(
        store.toggle_model(ModelId::new("qwen")),
        Err(SelectionError::TooFewModels { min: 1 })
    );
}

#[test]
fn toggle_adds_and_removes_under_multi_policy() {
    let mut store = store_with(SelectionPolicy::new(1, 2).expect("policy"));
    store.toggle_model(ModelId::new("qwen")).expect("add");
    assert_eq!(
        store.selected_models(),
        &[ModelId::new("deepseek"), ModelId::new("qwen")]
    );
    assert_eq!(
        store.toggle_model(ModelId::new("mistral")),
        Err(SelectionError::TooManyModels { max: 2 })
    );
    store.toggle_model(ModelId::new("deepseek")).expect("remove");
    assert_eq!(store.selected_models(), &[ModelId::new("qwen")]);
}

#[test]
fn replace_registry_prunes_and_refills_selection() {
    let mut store = store_with(SelectionPolicy::SINGLE);
    store.set_model(ModelId::new("qwen")).expect("qwen");

    store
        .replace_registry(ModelRegistry::new(vec![
            ModelInfo::new("mistral", "Mistral", "Mistral Large", "orange"),
            ModelInfo::new("llama", "Llama", "Llama 3", "green"),
        ]))
        .expect("replace");

    assert_eq!(store.selected_models(), &[ModelId::new("mistral")]);
    assert!(store.registry().contains(&ModelId::new("llama")));
    assert_eq!(store.messages().len(), 1);
}

#[test]
fn replace_registry_refuses_registry_that_cannot_meet_minimum() {
    let mut store = store_with(SelectionPolicy::SINGLE);
    assert_eq!(
        store.replace_registry(ModelRegistry::new(vec![])),
        Err(SelectionError::TooFewModels { min: 1 })
    );
    assert_eq!(store.registry(), &ModelRegistry::builtin());
    assert_eq!(store.selected_model().as_str(), "deepseek");
}

#[test]
fn seeding_fails_when_registry_is_smaller_than_minimum() {
    let registry = ModelRegistry::new(vec![ModelInfo::new("solo", "Solo", "only one", "blue")]);
    let err = SessionStore::seeded("sess_X", registry, SelectionPolicy::new(2, 3).expect("policy"))
        .expect_err("too small");
    assert_eq!(err, SelectionError::TooFewModels { min: 2 });
}
