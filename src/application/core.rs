use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

use super::delegate::ApplicationDelegate;
use crate::call::Call;
use crate::config::AppConfig;
use crate::controller::ControllerHandle;
use crate::error::{ApplicationError, Failure, InternalError, Outcome, Throwable};
use crate::request::Request;
use crate::resolver::Resolver;
use crate::response::{HttpCode, Output, Response};
use crate::router::Router;
use crate::session::{Session, SessionStore};

/// Pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    ResourcesOpened,
    RoutesRegistered,
    PathResolved,
    ControllerResolved,
    Invoked,
    Rendered,
    Closed,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::ResourcesOpened => "resources_opened",
            Stage::RoutesRegistered => "routes_registered",
            Stage::PathResolved => "path_resolved",
            Stage::ControllerResolved => "controller_resolved",
            Stage::Invoked => "invoked",
            Stage::Rendered => "rendered",
            Stage::Closed => "closed",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Which path produced the rendered response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPath {
    Success,
    Exception,
    Throwable,
}

/// Who translated a failure into the rendered response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translator {
    Controller,
    Delegate,
}

/// Summary of one handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: DispatchPath,
    /// Status of the rendered response
    pub status: u16,
    /// Last stage completed before the failure, `None` on success
    pub failed_at: Option<Stage>,
    pub translated_by: Option<Translator>,
}

/// Releases the session and delegate resources exactly once, also on unwind.
struct Cleanup {
    delegate: Arc<dyn ApplicationDelegate>,
    session: Arc<Session>,
    done: bool,
}

impl Cleanup {
    fn run(&mut self) {
        if self.done {
            return;
        }
        self.done = true;

        let session = Arc::clone(&self.session);
        match panic::catch_unwind(AssertUnwindSafe(|| session.close())) {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => error!(session_id = %session.id(), error = %err, "Session close failed"),
            Err(payload) => error!(
                session_id = %session.id(),
                error = %Throwable::from_panic(payload),
                "Session close panicked"
            ),
        }

        let delegate = Arc::clone(&self.delegate);
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| delegate.close())) {
            error!(error = %Throwable::from_panic(payload), "Delegate close panicked");
        }
        debug!("Request resources released");
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        self.run();
    }
}

/// Adds the session cookie to whatever the response sends.
pub(super) struct SessionOutput<'a> {
    pub(super) inner: &'a mut dyn Output,
    pub(super) cookie: Option<String>,
    /// Status actually sent, if any
    pub(super) sent: Option<u16>,
}

impl Output for SessionOutput<'_> {
    fn send(&mut self, status: u16, headers: &[(Arc<str>, String)], body: &[u8]) -> io::Result<()> {
        self.sent = Some(status);
        match &self.cookie {
            Some(cookie) => {
                let mut all = headers.to_vec();
                all.push((Arc::from("Set-Cookie"), cookie.clone()));
                self.inner.send(status, &all, body)
            }
            None => self.inner.send(status, headers, body),
        }
    }
}

/// Orchestrates one request from routing to rendering.
pub struct Application {
    delegate: Arc<dyn ApplicationDelegate>,
    request: Arc<Request>,
    session: Arc<Session>,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("request_id", &self.request.request_id())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Application {
    /// Start (or resume) the session for `request` and prepare the pipeline.
    pub fn new(
        delegate: Arc<dyn ApplicationDelegate>,
        config: &AppConfig,
        request: Arc<Request>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let domain = delegate.session_domain(&request);
        let session = Arc::new(Session::start(&config.session, &domain, &request, store));
        Self::with_session(delegate, request, session)
    }

    /// Use an already started session.
    pub fn with_session(
        delegate: Arc<dyn ApplicationDelegate>,
        request: Arc<Request>,
        session: Arc<Session>,
    ) -> Self {
        Self {
            delegate,
            request,
            session,
        }
    }

    #[must_use]
    pub fn request(&self) -> &Arc<Request> {
        &self.request
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Handle the request and render exactly one response to `out`.
    ///
    /// The session and the delegate are closed exactly once before this returns.
    ///
    /// # Errors
    ///
    /// * `Unhandled` - a failure was declined by every translator; a bare 500
    ///   has been rendered
    /// * `Output` - writing the response failed
    pub fn run(self, out: &mut dyn Output) -> Result<RunReport, ApplicationError> {
        let span = info_span!(
            "request",
            request_id = %self.request.request_id(),
            method = %self.request.method(),
            path = %self.request.path()
        );
        let _entered = span.enter();
        let started = Instant::now();

        let mut cleanup = Cleanup {
            delegate: Arc::clone(&self.delegate),
            session: Arc::clone(&self.session),
            done: false,
        };
        let mut stage = Stage::Idle;
        let mut controller: Option<ControllerHandle> = None;

        let dispatched = panic::catch_unwind(AssertUnwindSafe(|| {
            self.dispatch(&mut stage, &mut controller)
        }))
        .unwrap_or_else(|payload| Err(Failure::Throwable(Throwable::from_panic(payload))));

        let mut report = RunReport {
            outcome: DispatchPath::Success,
            status: 0,
            failed_at: None,
            translated_by: None,
        };
        let mut unhandled = None;

        let response = match dispatched {
            Ok(response) => response,
            Err(failure) => {
                report.failed_at = Some(stage);
                stage = Stage::Failed;
                self.translate(failure, controller.as_ref(), &mut report, &mut unhandled)
            }
        };

        let mut sink = SessionOutput {
            inner: out,
            cookie: self
                .session
                .is_new()
                .then(|| self.session.set_cookie_header()),
            sent: None,
        };

        let written = match render(response.as_ref(), &mut sink) {
            Ok(written) => written,
            Err(panicked) if sink.sent.is_none() => {
                // Nothing reached the client yet, so the failure can still be answered.
                if report.failed_at.is_none() {
                    report.failed_at = Some(stage);
                }
                let fallback = self.translate(
                    Failure::Throwable(panicked),
                    controller.as_ref(),
                    &mut report,
                    &mut unhandled,
                );
                match render(fallback.as_ref(), &mut sink) {
                    Ok(written) => written,
                    Err(panicked) if sink.sent.is_none() => {
                        error!(error = %panicked, "Fallback response panicked, rendering 500");
                        report.translated_by = None;
                        if unhandled.is_none() {
                            unhandled = Some(panicked.to_string());
                        }
                        HttpCode(500).render(&mut sink)
                    }
                    Err(panicked) => {
                        error!(error = %panicked, "Fallback response panicked after output was sent");
                        Ok(())
                    }
                }
            }
            Err(panicked) => {
                error!(error = %panicked, "Response panicked after output was sent");
                Ok(())
            }
        };
        report.status = sink.sent.unwrap_or_default();
        if stage != Stage::Failed {
            stage = Stage::Rendered;
        }

        // Controller instances live for the request only.
        drop(controller);
        cleanup.run();
        debug!(from = %stage, "Stage transition to closed");

        info!(
            outcome = ?report.outcome,
            status = report.status,
            failed_at = ?report.failed_at,
            translated_by = ?report.translated_by,
            duration_us = started.elapsed().as_micros(),
            "Request complete"
        );

        written?;
        match unhandled {
            Some(message) => Err(ApplicationError::Unhandled(message)),
            None => Ok(report),
        }
    }

    fn dispatch(&self, stage: &mut Stage, controller: &mut Option<ControllerHandle>) -> Outcome {
        self.delegate.open()?;
        advance(stage, Stage::ResourcesOpened);

        let mut router = Router::new();
        self.delegate.register_routes(&mut router)?;
        advance(stage, Stage::RoutesRegistered);

        let path = self.delegate.current_request_path(&self.request);
        let (class, method, params) = router.resolve(self.request.method(), &path)?.into_parts();
        advance(stage, Stage::PathResolved);

        let mut resolver = Resolver::new();
        resolver
            .set_default_value(Arc::clone(&self.request))
            .set_default_value(Arc::clone(&self.session));
        self.delegate.register_classes(&mut resolver)?;

        let handle = resolver.create(&class)?.into_controller().ok_or_else(|| {
            InternalError::new(format!("resolved class '{class}' is not a controller"))
        })?;
        let handle = controller.insert(handle);
        advance(stage, Stage::ControllerResolved);

        let response = Call::new(handle, method, params).invoke()?;
        advance(stage, Stage::Invoked);
        Ok(response)
    }

    /// Ask the controller, then the delegate, for a response to `failure`.
    fn translate(
        &self,
        failure: Failure,
        controller: Option<&ControllerHandle>,
        report: &mut RunReport,
        unhandled: &mut Option<String>,
    ) -> Box<dyn Response> {
        let translated = match &failure {
            Failure::Exception(exception) => {
                report.outcome = DispatchPath::Exception;
                warn!(
                    error = %exception,
                    status_hint = exception.http_status(),
                    controller = controller.map(ControllerHandle::class),
                    "Typed exception raised, translating"
                );
                candidate(Translator::Controller, || {
                    controller.and_then(|c| c.response_for_exception(exception))
                })
                .or_else(|| {
                    candidate(Translator::Delegate, || {
                        self.delegate
                            .response_for_exception(&self.request, exception)
                    })
                })
            }
            Failure::Throwable(throwable) => {
                report.outcome = DispatchPath::Throwable;
                error!(
                    error = %throwable,
                    panicked = throwable.is_panic(),
                    controller = controller.map(ControllerHandle::class),
                    "Unstructured failure raised, translating"
                );
                candidate(Translator::Controller, || {
                    controller.and_then(|c| c.response_for_throwable(throwable))
                })
                .or_else(|| {
                    candidate(Translator::Delegate, || {
                        self.delegate
                            .response_for_throwable(&self.request, throwable)
                    })
                })
            }
        };

        match translated {
            Some((response, by)) => {
                report.translated_by = Some(by);
                response
            }
            None => {
                error!(failure = %failure, "No translator produced a response, rendering 500");
                report.translated_by = None;
                *unhandled = Some(failure.to_string());
                HttpCode::boxed(500)
            }
        }
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!(from = %stage, to = %next, "Stage transition");
    *stage = next;
}

/// Run one translator; a panicking translator counts as declining.
pub(super) fn candidate<F>(who: Translator, translate: F) -> Option<(Box<dyn Response>, Translator)>
where
    F: FnOnce() -> Option<Box<dyn Response>>,
{
    let translated = panic::catch_unwind(AssertUnwindSafe(|| {
        translate().map(|response| {
            let status = response.status();
            (response, status)
        })
    }));
    match translated {
        Ok(Some((response, status))) => {
            info!(translated_by = ?who, status, "Failure translated");
            Some((response, who))
        }
        Ok(None) => None,
        Err(payload) => {
            error!(translator = ?who, error = %Throwable::from_panic(payload), "Translator panicked");
            None
        }
    }
}

/// Render `response`; panics in any response accessor are caught.
fn render(response: &dyn Response, sink: &mut SessionOutput<'_>) -> Result<io::Result<()>, Throwable> {
    panic::catch_unwind(AssertUnwindSafe(|| response.render(sink))).map_err(Throwable::from_panic)
}
