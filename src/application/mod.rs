//! # Application Module
//!
//! [`Application`] runs one request end to end:
//!
//! ```text
//! Idle → ResourcesOpened → RoutesRegistered → PathResolved
//!      → ControllerResolved → Invoked → Rendered → Closed
//! ```
//!
//! 1. `delegate.open()`
//! 2. `delegate.register_routes(&mut Router)`
//! 3. `Router::resolve(method, delegate.current_request_path(request))`
//! 4. a fresh [`Resolver`](crate::resolver::Resolver) with the current
//!    `Request` and `Session` as default values, `delegate.register_classes`,
//!    then `create(class)`; the object must be a controller
//! 5. [`Call::invoke`](crate::call::Call::invoke)
//! 6. render the response, adding the session cookie for new sessions
//! 7. close the session, then the delegate
//!
//! ## Failure translation
//!
//! A failure at any step, panics included, is answered by the first of these
//! that returns `Some`:
//!
//! | Failure | 1st | 2nd |
//! |---|---|---|
//! | typed exception | controller `response_for_exception` | delegate `response_for_exception` |
//! | throwable | controller `response_for_throwable` | delegate `response_for_throwable` |
//!
//! The controller is only asked when one was resolved. If every candidate
//! declines, a bare 500 is rendered and [`Application::run`] returns
//! [`ApplicationError::Unhandled`](crate::error::ApplicationError::Unhandled).
//!
//! Whatever happens, exactly one response is rendered and step 7 runs exactly
//! once (a drop guard covers unwinding).

mod core;
mod delegate;

pub use core::{Application, DispatchPath, RunReport, Stage, Translator};
pub use delegate::ApplicationDelegate;
