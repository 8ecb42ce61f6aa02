//! Runs one request from a CGI environment against a small demo site.
//!
//! ```bash
//! REQUEST_METHOD=GET REQUEST_URI=/hello/ann SERVER_NAME=localhost \
//!     cargo run --bin basecore-cgi
//! ```

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use basecore::application::{Application, ApplicationDelegate};
use basecore::call::Methods;
use basecore::config::AppConfig;
use basecore::controller::Controller;
use basecore::error::{Exception, Failure, Outcome, Throwable};
use basecore::logging::init_logging;
use basecore::request::Request;
use basecore::resolver::{Constructible, Dependencies, Resolver, TypeKey};
use basecore::response::{Content, HttpOutput, Json, Redirect, Response};
use basecore::router::{Params, Router};
use basecore::session::{MemorySessionStore, Session};
use clap::Parser;
use serde_json::json;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "basecore-cgi")]
#[command(about = "Handle one CGI request with the basecore demo site", long_about = None)]
struct Args {
    /// YAML configuration file; environment variables are used when absent
    #[arg(short, long, env = "BASECORE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "BASECORE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Session cookie domain; a leading dot covers all subdomains
    #[arg(long, env = "BASECORE_SESSION_DOMAIN", default_value = "")]
    session_domain: String,
}

struct HomeController {
    request: Arc<Request>,
}

impl HomeController {
    fn index(&self, _params: &Params) -> Outcome {
        Ok(Content::html(
            200,
            format!("<h1>basecore</h1><p>{}{}</p>", self.request.protocol(), self.request.host()),
        )
        .boxed())
    }

    fn greet(&self, params: &Params) -> Outcome {
        let name = params.require("name")?;
        Ok(Json::new(200, json!({ "hello": name })).boxed())
    }

    fn legacy(&self, _params: &Params) -> Outcome {
        Ok(Redirect::permanent("/").boxed())
    }
}

impl Constructible for HomeController {
    const CLASS: &'static str = "HomeController";

    fn dependencies() -> Vec<TypeKey> {
        vec![TypeKey::of::<Request>()]
    }

    fn construct(deps: &Dependencies<'_>) -> Result<Self, Failure> {
        Ok(Self {
            request: deps.get::<Request>()?,
        })
    }
}

impl Controller for HomeController {
    fn methods() -> Methods<Self> {
        Methods::new()
            .method("index", &[], Self::index)
            .method("greet", &["name"], Self::greet)
            .method("legacy", &[], Self::legacy)
    }
}

struct VisitController {
    session: Arc<Session>,
}

impl VisitController {
    fn count(&self, _params: &Params) -> Outcome {
        let visits = self
            .session
            .get("visits")
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
            + 1;
        self.session.set("visits", json!(visits));
        Ok(Json::new(200, json!({ "visits": visits })).boxed())
    }
}

impl Constructible for VisitController {
    const CLASS: &'static str = "VisitController";

    fn dependencies() -> Vec<TypeKey> {
        vec![TypeKey::of::<Session>()]
    }

    fn construct(deps: &Dependencies<'_>) -> Result<Self, Failure> {
        Ok(Self {
            session: deps.get::<Session>()?,
        })
    }
}

impl Controller for VisitController {
    fn methods() -> Methods<Self> {
        Methods::new().method("count", &[], Self::count)
    }
}

struct DemoSite {
    session_domain: String,
}

impl ApplicationDelegate for DemoSite {
    fn register_routes(&self, router: &mut Router) -> Result<(), Failure> {
        router
            .get("/", "HomeController", "index")?
            .get("/hello/{name}", "HomeController", "greet")?
            .get("/index.html", "HomeController", "legacy")?
            .get("/visits", "VisitController", "count")?;
        Ok(())
    }

    fn register_classes(&self, resolver: &mut Resolver) -> Result<(), Failure> {
        resolver
            .register_controller::<HomeController>()
            .register_controller::<VisitController>();
        Ok(())
    }

    fn session_domain(&self, _request: &Request) -> String {
        self.session_domain.clone()
    }

    fn response_for_exception(
        &self,
        _request: &Request,
        exception: &Exception,
    ) -> Option<Box<dyn Response>> {
        Some(Json::error(exception.http_status(), &exception.to_string()).boxed())
    }

    fn response_for_throwable(
        &self,
        _request: &Request,
        _throwable: &Throwable,
    ) -> Option<Box<dyn Response>> {
        Some(Content::text(500, "Internal Server Error").boxed())
    }
}

/// Read at most `CONTENT_LENGTH` bytes of request body.
fn read_body<R: Read>(reader: R, content_length: Option<&str>) -> anyhow::Result<Vec<u8>> {
    let length: u64 = content_length
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0);
    let mut body = Vec::new();
    reader
        .take(length)
        .read_to_end(&mut body)
        .context("Failed to read request body from stdin")?;
    Ok(body)
}

/// Gateways copy raw header bytes into `HTTP_*`, so values may not be UTF-8.
fn cgi_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter().map(|(k, v)| {
        (
            k.to_string_lossy().into_owned(),
            v.to_string_lossy().into_owned(),
        )
    })
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::from_env(),
    };
    info!(config = ?config, "Configuration loaded");

    let content_length = std::env::var_os("CONTENT_LENGTH").map(|v| v.to_string_lossy().into_owned());
    let body = read_body(io::stdin().lock(), content_length.as_deref())?;
    let request = Request::from_cgi_env(&config.ports, cgi_vars(std::env::vars_os()), &body);

    let delegate = Arc::new(DemoSite {
        session_domain: args.session_domain,
    });
    let app = Application::new(
        delegate,
        &config,
        Arc::new(request),
        Arc::new(MemorySessionStore::new()),
    );

    let mut out = HttpOutput::cgi(io::stdout().lock());
    match app.run(&mut out) {
        Ok(report) => {
            info!(status = report.status, outcome = ?report.outcome, "Done");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "Request failed");
            Err(err.into())
        }
    }
}
