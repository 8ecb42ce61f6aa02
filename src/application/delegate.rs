use crate::error::{Exception, Failure, Throwable};
use crate::request::Request;
use crate::resolver::Resolver;
use crate::response::Response;
use crate::router::Router;

/// Host policy for one application.
///
/// The delegate outlives individual requests and may be shared between
/// them, hence `&self` everywhere; stateful delegates use interior mutability.
pub trait ApplicationDelegate: Send + Sync {
    /// Acquire per-request resources (database handles, caches, ...).
    ///
    /// A failure here is translated like any other; [`close`](Self::close)
    /// still runs.
    fn open(&self) -> Result<(), Failure> {
        Ok(())
    }

    /// Release what [`open`](Self::open) acquired. Called exactly once per request.
    fn close(&self) {}

    /// Fill the routing table.
    fn register_routes(&self, router: &mut Router) -> Result<(), Failure>;

    /// Register constructible classes and delegate-provided default values.
    ///
    /// The current `Request` and `Session` are already registered as default
    /// values when this is called.
    fn register_classes(&self, resolver: &mut Resolver) -> Result<(), Failure>;

    /// Path used for routing.
    fn current_request_path(&self, request: &Request) -> String {
        request.path().to_string()
    }

    /// Session cookie domain. A leading `.` scopes the cookie to all subdomains;
    /// anything else, including the empty default, keeps it host-only.
    fn session_domain(&self, _request: &Request) -> String {
        String::new()
    }

    /// Fallback response for a typed exception the controller did not handle.
    fn response_for_exception(
        &self,
        request: &Request,
        exception: &Exception,
    ) -> Option<Box<dyn Response>>;

    /// Fallback response for an unstructured failure the controller did not handle.
    fn response_for_throwable(
        &self,
        request: &Request,
        throwable: &Throwable,
    ) -> Option<Box<dyn Response>>;
}
