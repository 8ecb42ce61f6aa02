//! # Router Module
//!
//! The router holds the `(method, pattern) → (class, method)` table the
//! delegate registers and resolves one request path to a [`CallbackInfo`].
//!
//! ## Patterns
//!
//! | Segment | Meaning |
//! |---|---|
//! | `users` | literal, case-sensitive |
//! | `{id}` | named capture of one path segment |
//! | `{}` | positional capture of one path segment |
//! | `{id:\d+}` | named capture constrained by a regex (whole segment) |
//!
//! Captured values are percent-decoded.
//!
//! ## Matching policy
//!
//! - One trailing slash is stripped from patterns and paths before matching,
//!   so `/users/` and `/users` are the same route. The root stays `/`.
//! - Entries are scanned in registration order and the first entry whose
//!   method and pattern both match wins.
//! - No pattern matches the path → [`FrameworkError::RouteNotFound`] (404).
//! - The path matches only under other methods →
//!   [`FrameworkError::MethodNotAllowed`] (405) listing those methods.
//!
//! ```rust
//! use basecore::router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.get("/users/{id}", "UserController", "show").unwrap();
//! let info = router.resolve(&Method::GET, "/users/7").unwrap();
//! assert_eq!(info.class(), "UserController");
//! assert_eq!(info.params().get("id"), Some("7"));
//! ```
//!
//! [`FrameworkError::RouteNotFound`]: crate::error::FrameworkError::RouteNotFound
//! [`FrameworkError::MethodNotAllowed`]: crate::error::FrameworkError::MethodNotAllowed

mod core;
mod params;
mod pattern;

pub use core::{CallbackInfo, RouteEntry, Router};
pub use params::{Param, ParamVec, Params, MAX_INLINE_PARAMS};
pub use pattern::normalize_path;
