use regex::Regex;
use std::sync::Arc;

use crate::error::FrameworkError;

/// Strip one trailing slash; the empty path and `/` both normalize to `/`.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    if path.is_empty() || path == "/" {
        return "/";
    }
    path.strip_suffix('/').unwrap_or(path)
}

/// A route pattern compiled to an anchored regex.
#[derive(Debug, Clone)]
pub(crate) struct CompiledPattern {
    regex: Regex,
    /// One entry per capture, in path order; `None` for positional captures
    captures: Vec<Option<Arc<str>>>,
    /// Whole-segment constraint per capture, compiled on its own
    constraints: Vec<Option<Regex>>,
}

fn invalid(pattern: &str, reason: impl Into<String>) -> FrameworkError {
    FrameworkError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.into(),
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl CompiledPattern {
    /// Convert a route pattern like `/users/{id}/posts/{}` into an anchored
    /// regex with one named group (`p0`, `p1`, …) per capture.
    pub(crate) fn compile(pattern: &str) -> Result<Self, FrameworkError> {
        if !pattern.starts_with('/') {
            return Err(invalid(pattern, "pattern must start with '/'"));
        }
        let normalized = normalize_path(pattern);
        if normalized == "/" {
            let regex = Regex::new(r"^/$").map_err(|e| invalid(pattern, e.to_string()))?;
            return Ok(Self {
                regex,
                captures: Vec::new(),
                constraints: Vec::new(),
            });
        }

        let mut source = String::with_capacity(normalized.len() + 16);
        source.push('^');
        let mut captures = Vec::with_capacity(normalized.matches('{').count());
        let mut constraints = Vec::with_capacity(captures.capacity());

        for segment in normalized[1..].split('/') {
            source.push('/');
            if segment.starts_with('{') && segment.ends_with('}') {
                let inner = &segment[1..segment.len() - 1];
                let (name, constraint) = match inner.split_once(':') {
                    Some((name, re)) => (name, Some(re)),
                    None => (inner, None),
                };
                let group = format!("p{}", captures.len());
                source.push_str(&format!("(?P<{group}>[^/]+)"));
                match constraint {
                    Some(re) if re.is_empty() => {
                        return Err(invalid(pattern, "empty capture constraint"));
                    }
                    Some(re) => {
                        let compiled = Regex::new(&format!("^(?:{re})$")).map_err(|e| {
                            invalid(pattern, format!("invalid constraint '{re}': {e}"))
                        })?;
                        constraints.push(Some(compiled));
                    }
                    None => constraints.push(None),
                }
                if name.is_empty() {
                    if constraint.is_some() {
                        return Err(invalid(pattern, "constrained capture needs a name"));
                    }
                    captures.push(None);
                } else if valid_name(name) {
                    captures.push(Some(Arc::from(name)));
                } else {
                    return Err(invalid(pattern, format!("invalid capture name '{name}'")));
                }
            } else if segment.contains('{') || segment.contains('}') {
                return Err(invalid(pattern, format!("malformed segment '{segment}'")));
            } else if segment.is_empty() {
                return Err(invalid(pattern, "empty path segment"));
            } else {
                source.push_str(&regex::escape(segment));
            }
        }

        source.push('$');
        let regex = Regex::new(&source).map_err(|e| invalid(pattern, e.to_string()))?;
        Ok(Self {
            regex,
            captures,
            constraints,
        })
    }

    pub(crate) fn capture_names(&self) -> &[Option<Arc<str>>] {
        &self.captures
    }

    /// Match a normalized path, returning raw captured values in order.
    pub(crate) fn matches<'p>(&self, path: &'p str) -> Option<Vec<&'p str>> {
        let caps = self.regex.captures(path)?;
        let mut values = Vec::with_capacity(self.captures.len());
        for i in 0..self.captures.len() {
            let value = caps.name(&format!("p{i}"))?.as_str();
            if let Some(constraint) = &self.constraints[i] {
                if !constraint.is_match(value) {
                    return None;
                }
            }
            values.push(value);
        }
        Some(values)
    }
}
