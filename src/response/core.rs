use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::io;
use std::sync::Arc;

use super::output::Output;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage; names are shared `Arc<str>` since most are static.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Result of a request, rendered to the output channel.
pub trait Response {
    fn status(&self) -> u16;

    fn headers(&self) -> HeaderVec {
        HeaderVec::new()
    }

    fn body(&self) -> String;

    /// Write status, headers and body to `out`.
    ///
    /// Side-effecting and not idempotent.
    fn render(&self, out: &mut dyn Output) -> io::Result<()> {
        out.send(self.status(), &self.headers(), self.body().as_bytes())
    }
}

impl std::fmt::Debug for dyn Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status())
            .field("headers", &self.headers())
            .finish_non_exhaustive()
    }
}

fn set_header(headers: &mut HeaderVec, name: &str, value: String) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((Arc::from(name), value));
}

/// Empty response carrying only a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpCode(pub u16);

impl HttpCode {
    #[must_use]
    pub fn boxed(status: u16) -> Box<dyn Response> {
        Box::new(HttpCode(status))
    }
}

impl Response for HttpCode {
    fn status(&self) -> u16 {
        self.0
    }

    fn body(&self) -> String {
        String::new()
    }
}

/// Response with a status, headers and a text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    status: u16,
    headers: HeaderVec,
    body: String,
}

impl Content {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: body.into(),
        }
    }

    /// `text/html` response
    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body).with_header("Content-Type", "text/html; charset=utf-8")
    }

    /// `text/plain` response
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body).with_header("Content-Type", "text/plain; charset=utf-8")
    }

    /// Add or replace a header (case-insensitive name match)
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name, value.into());
        self
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn boxed(self) -> Box<dyn Response> {
        Box::new(self)
    }
}

impl Response for Content {
    fn status(&self) -> u16 {
        self.status
    }

    fn headers(&self) -> HeaderVec {
        self.headers.clone()
    }

    fn body(&self) -> String {
        self.body.clone()
    }
}

/// JSON response with `application/json` content type.
#[derive(Debug, Clone, PartialEq)]
pub struct Json {
    status: u16,
    body: Value,
}

impl Json {
    #[must_use]
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Serialize any value into a JSON response.
    pub fn from_serialize<T: Serialize>(status: u16, value: &T) -> serde_json::Result<Self> {
        Ok(Self::new(status, serde_json::to_value(value)?))
    }

    /// `{"error": message}` body
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::new(status, serde_json::json!({ "error": message }))
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.body
    }

    #[must_use]
    pub fn boxed(self) -> Box<dyn Response> {
        Box::new(self)
    }
}

impl Response for Json {
    fn status(&self) -> u16 {
        self.status
    }

    fn headers(&self) -> HeaderVec {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("Content-Type"), "application/json".to_string()));
        headers
    }

    fn body(&self) -> String {
        self.body.to_string()
    }
}

/// Redirect to another location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    location: String,
    permanent: bool,
}

impl Redirect {
    /// 302 Found
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            permanent: false,
        }
    }

    /// 301 Moved Permanently
    pub fn permanent(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            permanent: true,
        }
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn boxed(self) -> Box<dyn Response> {
        Box::new(self)
    }
}

impl Response for Redirect {
    fn status(&self) -> u16 {
        if self.permanent {
            301
        } else {
            302
        }
    }

    fn headers(&self) -> HeaderVec {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("Location"), self.location.clone()));
        headers
    }

    fn body(&self) -> String {
        String::new()
    }
}
