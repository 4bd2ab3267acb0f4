//! Request and response state, as seen by the engine.
//!
//! The HTTP adapter is an external collaborator; these types are the whole
//! surface it fills in (request side, read-only during evaluation) and reads
//! back out (response side, written by effects).

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Default)]
pub struct RequestInfo {
    pub url: String,
    pub params: IndexMap<String, String>,
    pub query: IndexMap<String, String>,
    pub post: IndexMap<String, Value>,
    pub headers: IndexMap<String, String>,
    pub cookies: IndexMap<String, String>,
    pub session: Value,
    pub state: Value,
}

impl RequestInfo {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session: Value::Null,
            state: Value::Null,
            ..Self::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_post(mut self, name: impl Into<String>, value: Value) -> Self {
        self.post.insert(name.into(), value);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }
}

/// Cookie attributes. `max_age: Some(0)` is the canonical cookie-clear.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieOptions {
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ResponseState {
    headers: IndexMap<String, String>,
    cookies: IndexMap<String, (String, CookieOptions)>,
}

impl ResponseState {
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    pub fn set_cookie(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        options: CookieOptions,
    ) {
        self.cookies.insert(name.into(), (value.into(), options));
    }

    pub fn cookie(&self, name: &str) -> Option<&(String, CookieOptions)> {
        self.cookies.get(name)
    }

    pub fn cookies(&self) -> &IndexMap<String, (String, CookieOptions)> {
        &self.cookies
    }
}
