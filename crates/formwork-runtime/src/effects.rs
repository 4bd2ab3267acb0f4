//! The effect context: the only write surface handlers expose to user code.
//!
//! Effects receive an [`EffectScope`] instead of raw stores, so every answer
//! and data write goes through the mutation history and triggers cascading
//! cache invalidation before any dependent is read again.

use serde_json::Value;

use crate::answers::MutationSource;
use crate::context::EvaluationContext;
use crate::engine::StepEngine;
use crate::request::CookieOptions;

pub struct EffectScope<'e> {
    pub(crate) engine: &'e StepEngine,
    pub(crate) ctx: &'e mut EvaluationContext,
}

impl<'e> EffectScope<'e> {
    pub(crate) fn new(engine: &'e StepEngine, ctx: &'e mut EvaluationContext) -> Self {
        Self { engine, ctx }
    }

    // -- answers ----------------------------------------------------------

    pub fn get_answer(&self, key: &str) -> Option<Value> {
        self.ctx.answers.current(key).cloned()
    }

    pub fn has_answer(&self, key: &str) -> bool {
        self.ctx.answers.has(key)
    }

    /// Write an answer, stamped with the running transition's source, and
    /// invalidate every cached result downstream of it.
    pub fn set_answer(&mut self, key: &str, value: Value) {
        let source = self
            .ctx
            .transition_source
            .unwrap_or(MutationSource::Load);
        self.ctx.answers.set(key, value, source);
        self.engine.invalidate_answer(self.ctx, key);
    }

    pub fn clear_answer(&mut self, key: &str) {
        self.ctx.answers.clear(key);
        self.engine.invalidate_answer(self.ctx, key);
    }

    pub fn get_all_answers(&self) -> Value {
        self.ctx.answers.all_current()
    }

    pub fn get_answer_history(&self, key: &str) -> Option<Value> {
        self.ctx
            .answers
            .history(key)
            .map(|history| serde_json::to_value(history).expect("history serializes"))
    }

    pub fn get_all_answer_histories(&self) -> Value {
        self.ctx.answers.all_histories()
    }

    // -- data -------------------------------------------------------------

    pub fn get_data(&self, key: &str) -> Option<Value> {
        self.ctx.data.get(key).cloned()
    }

    pub fn set_data(&mut self, key: &str, value: Value) {
        self.ctx.data.insert(key.to_owned(), value);
        self.engine.invalidate_data(self.ctx, key);
    }

    pub fn get_all_data(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (key, value) in &self.ctx.data {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }

    // -- request (read-only) ----------------------------------------------

    pub fn get_request_url(&self) -> &str {
        &self.ctx.request.url
    }

    pub fn get_request_param(&self, name: &str) -> Option<&str> {
        self.ctx.request.params.get(name).map(String::as_str)
    }

    pub fn get_request_params(&self) -> impl Iterator<Item = (&String, &String)> {
        self.ctx.request.params.iter()
    }

    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.ctx.request.query.get(name).map(String::as_str)
    }

    pub fn get_query_params(&self) -> impl Iterator<Item = (&String, &String)> {
        self.ctx.request.query.iter()
    }

    pub fn get_post_data(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.ctx.request.post.iter()
    }

    pub fn get_session(&self) -> &Value {
        &self.ctx.request.session
    }

    pub fn get_state(&self) -> &Value {
        &self.ctx.request.state
    }

    pub fn get_request_header(&self, name: &str) -> Option<&str> {
        self.ctx.request.headers.get(name).map(String::as_str)
    }

    pub fn get_request_headers(&self) -> impl Iterator<Item = (&String, &String)> {
        self.ctx.request.headers.iter()
    }

    pub fn get_request_cookie(&self, name: &str) -> Option<&str> {
        self.ctx.request.cookies.get(name).map(String::as_str)
    }

    pub fn get_request_cookies(&self) -> impl Iterator<Item = (&String, &String)> {
        self.ctx.request.cookies.iter()
    }

    // -- response ---------------------------------------------------------

    pub fn set_response_header(&mut self, name: &str, value: &str) {
        self.ctx.response.set_header(name, value);
    }

    pub fn get_response_header(&self, name: &str) -> Option<&str> {
        self.ctx.response.header(name)
    }

    pub fn get_all_response_headers(&self) -> impl Iterator<Item = (&String, &String)> {
        self.ctx.response.headers().iter()
    }

    pub fn set_response_cookie(&mut self, name: &str, value: &str, options: CookieOptions) {
        self.ctx.response.set_cookie(name, value, options);
    }

    /// Clear a cookie by setting it with `max_age: 0`.
    pub fn clear_response_cookie(&mut self, name: &str) {
        self.ctx.response.set_cookie(
            name,
            "",
            CookieOptions {
                max_age: Some(0),
                ..CookieOptions::default()
            },
        );
    }

    pub fn get_response_cookie(&self, name: &str) -> Option<&(String, CookieOptions)> {
        self.ctx.response.cookie(name)
    }

    pub fn get_all_response_cookies(
        &self,
    ) -> impl Iterator<Item = (&String, &(String, CookieOptions))> {
        self.ctx.response.cookies().iter()
    }
}
