use http::Method;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::params::{parse_cookies, parse_params};
use crate::config::Ports;
use crate::ids::RequestId;

/// URL scheme of the inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of one inbound HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    request_id: RequestId,
    method: Method,
    scheme: Scheme,
    host: String,
    port: u16,
    uri: String,
    path: String,
    /// Header names are lowercase
    headers: HashMap<String, String>,
    query: HashMap<String, Value>,
    body: HashMap<String, Value>,
    cookies: HashMap<String, String>,
}

impl Request {
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Build the snapshot from CGI meta-variables and the raw request body.
    ///
    /// This is the only place where ambient request state enters the crate.
    pub fn from_cgi_env<I, K, V>(ports: &Ports, vars: I, body: &[u8]) -> Request
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut builder = Request::builder();
        if let Some(method) = vars.get("REQUEST_METHOD") {
            builder = builder.method_str(method);
        }
        let uri = match vars.get("REQUEST_URI") {
            Some(uri) => uri.clone(),
            None => {
                let mut uri = format!(
                    "{}{}",
                    vars.get("SCRIPT_NAME").map(String::as_str).unwrap_or(""),
                    vars.get("PATH_INFO").map(String::as_str).unwrap_or("")
                );
                if let Some(q) = vars.get("QUERY_STRING").filter(|q| !q.is_empty()) {
                    uri.push('?');
                    uri.push_str(q);
                }
                uri
            }
        };
        builder = builder.uri(uri);

        for (name, value) in &vars {
            if let Some(header) = name.strip_prefix("HTTP_") {
                builder = builder.header(&header.replace('_', "-"), value.clone());
            }
        }
        if let Some(ct) = vars.get("CONTENT_TYPE") {
            builder = builder.header("content-type", ct.clone());
        }

        let host = vars
            .get("SERVER_NAME")
            .cloned()
            .or_else(|| {
                vars.get("HTTP_HOST")
                    .map(|h| h.split(':').next().unwrap_or("").to_string())
            })
            .unwrap_or_default();
        builder = builder.host(host);

        if let Some(scheme) = vars.get("REQUEST_SCHEME") {
            builder = builder.request_scheme(scheme.clone());
        }
        if let Some(flag) = vars.get("HTTPS") {
            builder = builder.https_flag(flag.clone());
        }
        if let Some(port) = vars.get("SERVER_PORT").and_then(|p| p.trim().parse().ok()) {
            builder = builder.port(port);
        }

        builder.body(body.to_vec()).build(ports)
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[must_use]
    pub fn is_https(&self) -> bool {
        self.scheme == Scheme::Https
    }

    /// `"https://"` or `"http://"`
    #[must_use]
    pub fn protocol(&self) -> &'static str {
        match self.scheme {
            Scheme::Https => "https://",
            Scheme::Http => "http://",
        }
    }

    /// Lowercased server host name
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Full request URI including query string
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Request URI without query string
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query string parameter
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.query.get(name)
    }

    /// Body parameter
    #[must_use]
    pub fn post(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Header by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// True for `X-Requested-With: XMLHttpRequest`
    #[must_use]
    pub fn is_ajax(&self) -> bool {
        self.header("x-requested-with")
            .is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"))
    }

    #[must_use]
    pub fn query_params(&self) -> &HashMap<String, Value> {
        &self.query
    }

    #[must_use]
    pub fn body_params(&self) -> &HashMap<String, Value> {
        &self.body
    }
}

/// Builder for [`Request`] snapshots.
#[derive(Debug, Default, Clone)]
pub struct RequestBuilder {
    method: Option<Method>,
    uri: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    request_scheme: Option<String>,
    https_flag: Option<String>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl RequestBuilder {
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Parse a method name; unknown tokens fall back to GET.
    #[must_use]
    pub fn method_str(mut self, method: &str) -> Self {
        let upper = method.trim().to_ascii_uppercase();
        let parsed = Method::from_bytes(upper.as_bytes()).unwrap_or_else(|_| {
            warn!(method = %method, "Invalid request method, falling back to GET");
            Method::GET
        });
        self.method = Some(parsed);
        self
    }

    #[must_use]
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Explicit scheme reported by the gateway (`REQUEST_SCHEME`)
    #[must_use]
    pub fn request_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.request_scheme = Some(scheme.into());
        self
    }

    /// Gateway HTTPS flag (`HTTPS=on`)
    #[must_use]
    pub fn https_flag(mut self, flag: impl Into<String>) -> Self {
        self.https_flag = Some(flag.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Append a cookie to the `Cookie` header.
    #[must_use]
    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        let pair = format!("{name}={}", urlencoding::encode(value));
        self.headers
            .entry("cookie".to_string())
            .and_modify(|c| {
                c.push_str("; ");
                c.push_str(&pair);
            })
            .or_insert(pair);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Form-encoded body with the matching content type.
    #[must_use]
    pub fn form(self, encoded: &str) -> Self {
        self.header("content-type", "application/x-www-form-urlencoded")
            .body(encoded.as_bytes().to_vec())
    }

    fn scheme(&self, ports: &Ports) -> Scheme {
        if self
            .request_scheme
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("https"))
        {
            return Scheme::Https;
        }
        if self
            .https_flag
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("on"))
        {
            return Scheme::Https;
        }
        if self.port.is_some_and(|p| ports.is_https_port(p)) {
            return Scheme::Https;
        }
        Scheme::Http
    }

    fn body_params(&self) -> HashMap<String, Value> {
        if self.body.is_empty() {
            return HashMap::new();
        }
        let content_type = self
            .headers
            .get("content-type")
            .map(|c| c.to_ascii_lowercase())
            .unwrap_or_default();
        let text = String::from_utf8_lossy(&self.body);

        if content_type.starts_with("application/json") {
            match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map.into_iter().collect(),
                Ok(_) => {
                    debug!("JSON body is not an object; no body parameters");
                    HashMap::new()
                }
                Err(err) => {
                    debug!(error = %err, "JSON body parse failed");
                    HashMap::new()
                }
            }
        } else if content_type.is_empty()
            || content_type.starts_with("application/x-www-form-urlencoded")
        {
            parse_params(&text)
        } else {
            HashMap::new()
        }
    }

    /// Freeze the builder into a snapshot.
    #[must_use]
    pub fn build(self, ports: &Ports) -> Request {
        let scheme = self.scheme(ports);
        let port = self.port.unwrap_or(match scheme {
            Scheme::Https => ports.default_https,
            Scheme::Http => ports.default_http,
        });
        let uri = self.uri.clone().unwrap_or_else(|| "/".to_string());
        let (path, query_str) = match uri.split_once('?') {
            Some((p, q)) => (p, q),
            None => (uri.as_str(), ""),
        };
        let path = if path.is_empty() { "/" } else { path }.to_string();
        let query = parse_params(query_str);
        let body = self.body_params();
        let cookies = self
            .headers
            .get("cookie")
            .map(|c| parse_cookies(c))
            .unwrap_or_default();
        let request_id =
            RequestId::from_header_or_new(self.headers.get("x-request-id").map(String::as_str));
        let method = self.method.unwrap_or(Method::GET);
        let host = self.host.unwrap_or_default().to_lowercase();

        // R2: request snapshot built
        info!(
            request_id = %request_id,
            method = %method,
            scheme = %scheme,
            host = %host,
            port = port,
            path = %path,
            query_count = query.len(),
            body_count = body.len(),
            cookie_count = cookies.len(),
            "Request snapshot built"
        );

        Request {
            request_id,
            method,
            scheme,
            host,
            port,
            uri,
            path,
            headers: self.headers,
            query,
            body,
            cookies,
        }
    }
}
