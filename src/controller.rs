//! Controller contract.
//!
//! A controller is constructed per request by the [`Resolver`](crate::resolver::Resolver),
//! exposes its invocable methods through a [`Methods`] table, and may offer a
//! response for failures raised while it was handling the request. Returning
//! `None` from a translator defers to the application delegate.
//!
//! ```rust
//! use basecore::call::Methods;
//! use basecore::controller::Controller;
//! use basecore::error::Outcome;
//! use basecore::response::Content;
//! use basecore::router::Params;
//!
//! struct Hello;
//!
//! impl Hello {
//!     fn greet(&self, params: &Params) -> Outcome {
//!         let name = params.require("name")?;
//!         Ok(Content::text(200, format!("hello {name}")).boxed())
//!     }
//! }
//!
//! impl Controller for Hello {
//!     fn methods() -> Methods<Self> {
//!         Methods::new().method("greet", &["name"], Self::greet)
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::call::{MethodDef, Methods};
use crate::error::{Exception, Outcome, Throwable};
use crate::response::Response;
use crate::router::Params;

pub trait Controller: Send + Sync + 'static {
    /// Methods the router may target on this controller.
    fn methods() -> Methods<Self>
    where
        Self: Sized;

    /// Response for a typed exception raised during this request.
    fn response_for_exception(&self, _exception: &Exception) -> Option<Box<dyn Response>> {
        None
    }

    /// Response for an unstructured failure raised during this request.
    fn response_for_throwable(&self, _throwable: &Throwable) -> Option<Box<dyn Response>> {
        None
    }
}

/// Object-safe view over a concrete controller and its method table.
trait ErasedController: Send + Sync {
    fn signature(&self, method: &str) -> Option<&'static [&'static str]>;
    fn invoke(&self, method: &str, params: &Params) -> Option<Outcome>;
    fn method_names(&self) -> Vec<&'static str>;
    fn response_for_exception(&self, exception: &Exception) -> Option<Box<dyn Response>>;
    fn response_for_throwable(&self, throwable: &Throwable) -> Option<Box<dyn Response>>;
}

struct Bound<C: Controller> {
    controller: Arc<C>,
    methods: Methods<C>,
}

impl<C: Controller> Bound<C> {
    fn find(&self, method: &str) -> Option<&MethodDef<C>> {
        self.methods.find(method)
    }
}

impl<C: Controller> ErasedController for Bound<C> {
    fn signature(&self, method: &str) -> Option<&'static [&'static str]> {
        self.find(method).map(MethodDef::params)
    }

    fn invoke(&self, method: &str, params: &Params) -> Option<Outcome> {
        self.find(method)
            .map(|def| def.call(self.controller.as_ref(), params))
    }

    fn method_names(&self) -> Vec<&'static str> {
        self.methods.names().collect()
    }

    fn response_for_exception(&self, exception: &Exception) -> Option<Box<dyn Response>> {
        self.controller.response_for_exception(exception)
    }

    fn response_for_throwable(&self, throwable: &Throwable) -> Option<Box<dyn Response>> {
        self.controller.response_for_throwable(throwable)
    }
}

/// A constructed controller, ready to be invoked through [`Call`](crate::call::Call).
pub struct ControllerHandle {
    class: &'static str,
    inner: Box<dyn ErasedController>,
}

impl std::fmt::Debug for ControllerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerHandle")
            .field("class", &self.class)
            .field("methods", &self.inner.method_names())
            .finish()
    }
}

impl ControllerHandle {
    pub fn new<C: Controller>(class: &'static str, controller: Arc<C>) -> Self {
        Self {
            class,
            inner: Box::new(Bound {
                controller,
                methods: C::methods(),
            }),
        }
    }

    #[must_use]
    pub fn class(&self) -> &'static str {
        self.class
    }

    /// Declared parameter names of `method`, `None` if the method does not exist
    #[must_use]
    pub fn signature(&self, method: &str) -> Option<&'static [&'static str]> {
        self.inner.signature(method)
    }

    #[must_use]
    pub fn method_names(&self) -> Vec<&'static str> {
        self.inner.method_names()
    }

    pub(crate) fn invoke_unchecked(&self, method: &str, params: &Params) -> Option<Outcome> {
        self.inner.invoke(method, params)
    }

    #[must_use]
    pub fn response_for_exception(&self, exception: &Exception) -> Option<Box<dyn Response>> {
        self.inner.response_for_exception(exception)
    }

    #[must_use]
    pub fn response_for_throwable(&self, throwable: &Throwable) -> Option<Box<dyn Response>> {
        self.inner.response_for_throwable(throwable)
    }
}
