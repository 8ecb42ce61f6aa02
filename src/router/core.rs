use http::Method;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::params::Params;
use super::pattern::{normalize_path, CompiledPattern};
use crate::error::FrameworkError;

/// One registered route.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    method: Method,
    pattern: String,
    class: String,
    action: String,
    compiled: CompiledPattern,
}

impl RouteEntry {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Target class identifier
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Target method name
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }
}

/// Result of a successful route match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackInfo {
    class: String,
    method: String,
    params: Params,
    pattern: String,
}

impl CallbackInfo {
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Controller method to invoke
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Pattern of the matched entry
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Split into `(class, method, params)`.
    #[must_use]
    pub fn into_parts(self) -> (String, String, Params) {
        (self.class, self.method, self.params)
    }
}

/// Route table, scanned in registration order.
#[derive(Debug, Clone, Default)]
pub struct Router {
    entries: Vec<RouteEntry>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Earlier registrations take precedence.
    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        class: &str,
        action: &str,
    ) -> Result<&mut Self, FrameworkError> {
        let compiled = CompiledPattern::compile(pattern)?;
        debug!(
            method = %method,
            pattern = %pattern,
            class = %class,
            action = %action,
            captures = compiled.capture_names().len(),
            "Route registered"
        );
        self.entries.push(RouteEntry {
            method,
            pattern: pattern.to_string(),
            class: class.to_string(),
            action: action.to_string(),
            compiled,
        });
        Ok(self)
    }

    pub fn get(&mut self, pattern: &str, class: &str, action: &str) -> Result<&mut Self, FrameworkError> {
        self.register(Method::GET, pattern, class, action)
    }

    pub fn post(&mut self, pattern: &str, class: &str, action: &str) -> Result<&mut Self, FrameworkError> {
        self.register(Method::POST, pattern, class, action)
    }

    pub fn put(&mut self, pattern: &str, class: &str, action: &str) -> Result<&mut Self, FrameworkError> {
        self.register(Method::PUT, pattern, class, action)
    }

    pub fn patch(&mut self, pattern: &str, class: &str, action: &str) -> Result<&mut Self, FrameworkError> {
        self.register(Method::PATCH, pattern, class, action)
    }

    pub fn delete(&mut self, pattern: &str, class: &str, action: &str) -> Result<&mut Self, FrameworkError> {
        self.register(Method::DELETE, pattern, class, action)
    }

    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Log every registered route at info level.
    pub fn dump_routes(&self) {
        info!(routes_count = self.entries.len(), "Routing table");
        for entry in &self.entries {
            info!(
                method = %entry.method,
                pattern = %entry.pattern,
                target = %format_args!("{}::{}", entry.class, entry.action),
                "Route"
            );
        }
    }

    /// Resolve a request to its callback.
    ///
    /// # Errors
    ///
    /// * `RouteNotFound` - no pattern matches the path
    /// * `MethodNotAllowed` - the path matches only under other methods
    pub fn resolve(&self, method: &Method, path: &str) -> Result<CallbackInfo, FrameworkError> {
        // RT1: Route match attempt
        debug!(method = %method, path = %path, routes_count = self.entries.len(), "Route match attempt");

        let match_start = Instant::now();
        let normalized = normalize_path(path);
        let mut allowed: Vec<Method> = Vec::new();

        for entry in &self.entries {
            let Some(values) = entry.compiled.matches(normalized) else {
                continue;
            };
            if entry.method != *method {
                if !allowed.contains(&entry.method) {
                    allowed.push(entry.method.clone());
                }
                continue;
            }

            let mut params = Params::new();
            for (name, raw) in entry.compiled.capture_names().iter().zip(values) {
                let value = urlencoding::decode(raw)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| raw.to_string());
                params.push(name.clone(), value);
            }

            // RT3: Route matched
            info!(
                method = %method,
                path = %path,
                route_pattern = %entry.pattern,
                class = %entry.class,
                action = %entry.action,
                path_params = ?params,
                duration_us = match_start.elapsed().as_micros(),
                "Route matched"
            );

            return Ok(CallbackInfo {
                class: entry.class.clone(),
                method: entry.action.clone(),
                params,
                pattern: entry.pattern.clone(),
            });
        }

        let duration_us = match_start.elapsed().as_micros();
        if allowed.is_empty() {
            // RT4: No route found (404)
            warn!(method = %method, path = %path, duration_us = duration_us, "No route matched");
            Err(FrameworkError::RouteNotFound {
                method: method.clone(),
                path: path.to_string(),
            })
        } else {
            warn!(
                method = %method,
                path = %path,
                allowed = ?allowed,
                duration_us = duration_us,
                "Route matched under other methods only"
            );
            Err(FrameworkError::MethodNotAllowed {
                method: method.clone(),
                path: path.to_string(),
                allowed,
            })
        }
    }
}
