//! # Error Module
//!
//! Failures that can happen while a request is being dispatched fall into two
//! families, and the orchestrator translates each family through its own path:
//!
//! - **Typed exceptions** ([`Exception`]) are expected, declared failures. The
//!   framework's own routing/resolution errors ([`FrameworkError`]) belong here,
//!   as does any application error type implementing [`AppException`].
//! - **Throwables** ([`Throwable`]) are everything else: `anyhow` errors,
//!   contract violations ([`InternalError`]) and panics caught at the dispatch
//!   boundary.
//!
//! Handlers return [`Outcome`] and can use `?` on either family because
//! [`Failure`] converts from both.

use std::error::Error as StdError;
use std::fmt;

use http::Method;
use thiserror::Error;

use crate::response::Response;

/// Result type returned by controller methods.
pub type Outcome = Result<Box<dyn Response>, Failure>;

/// Marker trait for typed application exceptions.
///
/// The set is open: any error type can opt in. `http_status` is a hint that
/// delegates may use when building a response.
pub trait AppException: StdError + Send + Sync + 'static {
    /// HTTP status suggested for this exception
    fn http_status(&self) -> u16 {
        500
    }
}

/// Errors raised by the framework core itself.
///
/// All variants travel on the typed-exception path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameworkError {
    /// No registered pattern matches the path under any method
    #[error("no route for {method} {path}")]
    RouteNotFound { method: Method, path: String },

    /// The path matches, but only under other methods
    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed {
        method: Method,
        path: String,
        allowed: Vec<Method>,
    },

    /// A route pattern could not be compiled
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The class identifier is not registered with the resolver
    #[error("class '{class}' is not registered")]
    ClassNotFound { class: String },

    /// A declared dependency has neither a default value nor a constructor
    #[error("cannot resolve dependency '{dependency}' of class '{class}'")]
    UnresolvableDependency { class: String, dependency: String },

    /// The controller has no method with this name
    #[error("method '{method}' not found on '{class}'")]
    MethodNotFound { class: String, method: String },

    /// The extracted parameters do not satisfy the method signature
    #[error("arguments for '{class}::{method}' do not match: {reason}")]
    ArgumentMismatch {
        class: String,
        method: String,
        reason: String,
    },
}

impl AppException for FrameworkError {
    fn http_status(&self) -> u16 {
        match self {
            FrameworkError::RouteNotFound { .. } => 404,
            FrameworkError::MethodNotAllowed { .. } => 405,
            FrameworkError::ArgumentMismatch { .. } => 400,
            _ => 500,
        }
    }
}

/// Contract violation inside the framework or between the framework and host code.
///
/// Always classified as a throwable, never as a typed exception.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("internal error: {0}")]
pub struct InternalError(pub String);

impl InternalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A typed application exception.
pub struct Exception {
    status: u16,
    inner: Box<dyn StdError + Send + Sync + 'static>,
}

impl Exception {
    pub fn new<E: AppException>(err: E) -> Self {
        Self {
            status: err.http_status(),
            inner: Box::new(err),
        }
    }

    /// HTTP status suggested by the underlying exception
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn downcast_ref<E: AppException>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    #[must_use]
    pub fn is<E: AppException>(&self) -> bool {
        self.inner.is::<E>()
    }

    /// Framework error carried by this exception, if any
    #[must_use]
    pub fn framework_error(&self) -> Option<&FrameworkError> {
        self.downcast_ref::<FrameworkError>()
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exception")
            .field("status", &self.status)
            .field("inner", &self.inner)
            .finish()
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

/// An unstructured runtime failure.
#[derive(Debug)]
pub struct Throwable {
    inner: anyhow::Error,
    panicked: bool,
}

impl Throwable {
    pub fn new(err: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: err.into(),
            panicked: false,
        }
    }

    /// Build a throwable from a payload caught by `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self {
            inner: anyhow::anyhow!("panicked: {message}"),
            panicked: true,
        }
    }

    /// True when the failure originated from a caught panic
    #[must_use]
    pub fn is_panic(&self) -> bool {
        self.panicked
    }

    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.inner.downcast_ref::<E>()
    }

    /// Contract violation carried by this throwable, if any
    #[must_use]
    pub fn internal_error(&self) -> Option<&InternalError> {
        self.downcast_ref::<InternalError>()
    }

    #[must_use]
    pub fn as_anyhow(&self) -> &anyhow::Error {
        &self.inner
    }
}

impl fmt::Display for Throwable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

/// Anything that can interrupt the dispatch pipeline.
#[derive(Debug)]
pub enum Failure {
    Exception(Exception),
    Throwable(Throwable),
}

impl Failure {
    #[must_use]
    pub fn is_exception(&self) -> bool {
        matches!(self, Failure::Exception(_))
    }

    /// Wrap any error as a throwable.
    pub fn throwable(err: impl Into<anyhow::Error>) -> Self {
        Failure::Throwable(Throwable::new(err))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Failure::Throwable(Throwable::new(InternalError::new(message)))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Exception(e) => write!(f, "exception: {e}"),
            Failure::Throwable(t) => write!(f, "throwable: {t}"),
        }
    }
}

impl<E: AppException> From<E> for Failure {
    fn from(err: E) -> Self {
        Failure::Exception(Exception::new(err))
    }
}

impl From<Exception> for Failure {
    fn from(exception: Exception) -> Self {
        Failure::Exception(exception)
    }
}

impl From<Throwable> for Failure {
    fn from(throwable: Throwable) -> Self {
        Failure::Throwable(throwable)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Failure::Throwable(Throwable::new(err))
    }
}

impl From<InternalError> for Failure {
    fn from(err: InternalError) -> Self {
        Failure::Throwable(Throwable::new(err))
    }
}

/// Errors that escape [`Application::run`](crate::application::Application::run).
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Neither the controller nor the delegate produced a response for a failure
    #[error("no response produced for failure: {0}")]
    Unhandled(String),

    /// Writing the response to the output channel failed
    #[error("failed to write response: {0}")]
    Output(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("payment required")]
    struct PaymentRequired;

    impl AppException for PaymentRequired {
        fn http_status(&self) -> u16 {
            402
        }
    }

    #[test]
    fn test_app_exception_converts_to_exception_failure() {
        let failure: Failure = PaymentRequired.into();
        match failure {
            Failure::Exception(e) => {
                assert_eq!(e.http_status(), 402);
                assert!(e.is::<PaymentRequired>());
                assert!(e.framework_error().is_none());
            }
            Failure::Throwable(_) => panic!("expected exception"),
        }
    }

    #[test]
    fn test_internal_error_is_throwable() {
        let failure: Failure = InternalError::new("not a controller").into();
        match failure {
            Failure::Throwable(t) => {
                assert!(t.internal_error().is_some());
                assert!(!t.is_panic());
            }
            Failure::Exception(_) => panic!("expected throwable"),
        }
    }

    #[test]
    fn test_framework_error_statuses() {
        let not_found = FrameworkError::RouteNotFound {
            method: Method::GET,
            path: "/x".into(),
        };
        assert_eq!(not_found.http_status(), 404);
        let class = FrameworkError::ClassNotFound {
            class: "Nope".into(),
        };
        assert_eq!(class.http_status(), 500);
    }

    #[test]
    fn test_panic_payload_message() {
        let t = Throwable::from_panic(Box::new("boom"));
        assert!(t.is_panic());
        assert_eq!(t.to_string(), "panicked: boom");
        let t = Throwable::from_panic(Box::new(String::from("owned")));
        assert_eq!(t.to_string(), "panicked: owned");
    }
}
