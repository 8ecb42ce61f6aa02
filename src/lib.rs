//! # basecore
//!
//! **basecore** is the dispatch core of a small request-per-invocation web
//! framework. It takes one immutable request snapshot, routes it to a
//! controller method, builds the controller with its declared dependencies,
//! invokes it and renders the returned response, translating failures into
//! responses on the way.
//!
//! ## Architecture
//!
//! - **[`request`]** - immutable request snapshot (method, scheme, host, port,
//!   path, coerced query/body parameters, cookies, headers)
//! - **[`session`]** - session with cookie-domain policy and pluggable store
//! - **[`router`]** - `(method, pattern) → (class, method)` table with 404/405 policy
//! - **[`resolver`]** - class registry and dependency injector
//! - **[`controller`]** / **[`call`]** - controller contract, method tables and
//!   single-shot invocation
//! - **[`response`]** - response variants and the output channel
//! - **[`application`]** - the orchestrator and the host's delegate contract
//! - **[`error`]** - typed exceptions vs. throwables
//! - **[`config`]** / **[`logging`]** - host settings and `tracing` setup
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host
//!     participant App as Application
//!     participant Delegate
//!     participant Router
//!     participant Resolver
//!     participant Controller
//!
//!     Host->>App: run(&mut output)
//!     App->>Delegate: open()
//!     App->>Delegate: register_routes(&mut Router)
//!     App->>Router: resolve(method, current_request_path)
//!     Router-->>App: CallbackInfo
//!     App->>Delegate: register_classes(&mut Resolver)
//!     App->>Resolver: create(class)
//!     Resolver-->>App: controller
//!     App->>Controller: Call::invoke()
//!     Controller-->>App: Box<dyn Response>
//!     App->>Host: render (+ Set-Cookie)
//!     App->>Delegate: close()
//! ```
//!
//! On failure the controller is asked first, then the delegate; see
//! [`application`].
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use basecore::application::{Application, ApplicationDelegate};
//! use basecore::call::Methods;
//! use basecore::config::AppConfig;
//! use basecore::controller::Controller;
//! use basecore::error::{Exception, Failure, Outcome, Throwable};
//! use basecore::request::Request;
//! use basecore::resolver::{Constructible, Dependencies, Resolver, TypeKey};
//! use basecore::response::{BufferedOutput, Content, HttpCode, Response};
//! use basecore::router::{Params, Router};
//! use basecore::session::MemorySessionStore;
//!
//! struct Users {
//!     request: Arc<Request>,
//! }
//!
//! impl Users {
//!     fn show(&self, params: &Params) -> Outcome {
//!         let id: u32 = params.parse("id")?;
//!         Ok(Content::text(200, format!("user {id} on {}", self.request.host())).boxed())
//!     }
//! }
//!
//! impl Constructible for Users {
//!     const CLASS: &'static str = "Users";
//!     fn dependencies() -> Vec<TypeKey> {
//!         vec![TypeKey::of::<Request>()]
//!     }
//!     fn construct(deps: &Dependencies<'_>) -> Result<Self, Failure> {
//!         Ok(Users { request: deps.get::<Request>()? })
//!     }
//! }
//!
//! impl Controller for Users {
//!     fn methods() -> Methods<Self> {
//!         Methods::new().method("show", &["id"], Self::show)
//!     }
//! }
//!
//! struct Site;
//!
//! impl ApplicationDelegate for Site {
//!     fn register_routes(&self, router: &mut Router) -> Result<(), Failure> {
//!         router.get("/users/{id}", "Users", "show")?;
//!         Ok(())
//!     }
//!     fn register_classes(&self, resolver: &mut Resolver) -> Result<(), Failure> {
//!         resolver.register_controller::<Users>();
//!         Ok(())
//!     }
//!     fn response_for_exception(&self, _: &Request, e: &Exception) -> Option<Box<dyn Response>> {
//!         Some(HttpCode::boxed(e.http_status()))
//!     }
//!     fn response_for_throwable(&self, _: &Request, _: &Throwable) -> Option<Box<dyn Response>> {
//!         Some(HttpCode::boxed(500))
//!     }
//! }
//!
//! let config = AppConfig::default();
//! let request = Request::builder()
//!     .uri("/users/7")
//!     .host("example.com")
//!     .build(&config.ports);
//! let app = Application::new(
//!     Arc::new(Site),
//!     &config,
//!     Arc::new(request),
//!     Arc::new(MemorySessionStore::new()),
//! );
//!
//! let mut out = BufferedOutput::new();
//! let report = app.run(&mut out).unwrap();
//! assert_eq!(report.status, 200);
//! assert_eq!(out.last().unwrap().body_str(), "user 7 on example.com");
//! ```
//!
//! ## Logging
//!
//! Every stage emits `tracing` events with structured fields. Hosts install
//! a subscriber with [`logging::init_logging`]; output goes to stderr so it
//! never mixes with a response written to stdout.

pub mod application;
pub mod call;
pub mod config;
pub mod controller;
pub mod error;
pub mod ids;
pub mod logging;
pub mod request;
pub mod resolver;
pub mod response;
pub mod router;
pub mod session;

pub use application::{Application, ApplicationDelegate, RunReport};
pub use error::{Exception, Failure, FrameworkError, Outcome, Throwable};
pub use request::Request;
pub use response::Response;
pub use router::Router;
