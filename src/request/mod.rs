//! # Request Module
//!
//! [`Request`] is the read-only snapshot of the one inbound HTTP request an
//! invocation handles. It is built exactly once, either with
//! [`RequestBuilder`] or from a CGI environment via [`Request::from_cgi_env`],
//! and is then shared as `Arc<Request>` with the resolver and controllers.
//! Nothing else in the crate reads ambient process state.
//!
//! ## Parameter coercion
//!
//! Query (`get`) and body (`post`) parameters are exposed as
//! `serde_json::Value`:
//!
//! - a raw value that is an exact, canonical number (`"42"`, `"-3"`, `"1.5"`)
//!   becomes a JSON number;
//! - anything else (`"42abc"`, `"042"`, `" 7 "`) is trimmed and kept as a string;
//! - `name[]=a&name[]=b` becomes a list, `name[k]=v` an object, each element
//!   coerced the same way.

mod core;
mod params;

pub use core::{Request, RequestBuilder, Scheme};
pub use params::{coerce_value, parse_cookies, parse_params};
