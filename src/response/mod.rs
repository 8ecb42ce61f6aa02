//! # Response Module
//!
//! Polymorphic response objects returned by controllers and by the failure
//! translators, plus the output channel they are rendered to.
//!
//! Every response exposes `status()`, `headers()` and `body()` and renders
//! itself through [`Response::render`]. The orchestrator renders exactly one
//! response per request; [`HttpOutput`] additionally refuses a second send.
//!
//! | Variant | Status | Body |
//! |---|---|---|
//! | [`HttpCode`] | any | empty |
//! | [`Content`] | any | text with caller-supplied headers |
//! | [`Json`] | any | serialized `serde_json::Value` |
//! | [`Redirect`] | 301/302 | empty, `Location` header |

mod core;
mod output;

pub use core::{Content, HeaderVec, HttpCode, Json, Redirect, Response, MAX_INLINE_HEADERS};
pub use output::{status_reason, BufferedOutput, HttpOutput, Output, Sent, StatusLine};
