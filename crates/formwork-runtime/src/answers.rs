//! Answer storage with per-field mutation history.
//!
//! Every write records which transition kind caused it, so hosts can apply
//! source precedence when reconciling form posts against effect writes.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use formwork_core::TransitionKind;

/// Which transition kind caused an answer write.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationSource {
    Load,
    Access,
    Action,
    Submit,
    /// Raw form-post write-back, before any transition runs.
    Post,
}

impl From<TransitionKind> for MutationSource {
    fn from(kind: TransitionKind) -> Self {
        match kind {
            TransitionKind::Load => MutationSource::Load,
            TransitionKind::Access => MutationSource::Access,
            TransitionKind::Action => MutationSource::Action,
            TransitionKind::Submit => MutationSource::Submit,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Mutation {
    pub value: Value,
    pub source: MutationSource,
}

/// History for one field code. `current` always equals the last mutation's
/// value.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct AnswerHistory {
    pub current: Value,
    pub mutations: Vec<Mutation>,
}

#[derive(Clone, Debug, Default)]
pub struct AnswerStore {
    answers: IndexMap<String, AnswerHistory>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value, source: MutationSource) {
        let entry = self
            .answers
            .entry(key.into())
            .or_insert_with(|| AnswerHistory {
                current: Value::Null,
                mutations: Vec::new(),
            });
        entry.current = value.clone();
        entry.mutations.push(Mutation { value, source });
    }

    /// Seed a raw form-post value.
    pub fn seed_post(&mut self, key: impl Into<String>, value: Value) {
        self.set(key, value, MutationSource::Post);
    }

    pub fn current(&self, key: &str) -> Option<&Value> {
        self.answers.get(key).map(|entry| &entry.current)
    }

    pub fn has(&self, key: &str) -> bool {
        self.answers.contains_key(key)
    }

    pub fn clear(&mut self, key: &str) {
        self.answers.shift_remove(key);
    }

    pub fn history(&self, key: &str) -> Option<&AnswerHistory> {
        self.answers.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerHistory)> {
        self.answers.iter()
    }

    /// All current values as a JSON object.
    pub fn all_current(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (key, entry) in &self.answers {
            map.insert(key.clone(), entry.current.clone());
        }
        Value::Object(map)
    }

    /// All histories as a JSON object.
    pub fn all_histories(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (key, entry) in &self.answers {
            map.insert(
                key.clone(),
                serde_json::to_value(entry).expect("history serializes"),
            );
        }
        Value::Object(map)
    }
}
