#![allow(dead_code)]

pub mod fixtures {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use basecore::application::{Application, ApplicationDelegate, RunReport};
    use basecore::call::Methods;
    use basecore::config::{AppConfig, Ports};
    use basecore::controller::Controller;
    use basecore::error::{
        AppException, ApplicationError, Exception, Failure, Outcome, Throwable,
    };
    use basecore::request::Request;
    use basecore::resolver::{Constructible, Dependencies, Resolver, TypeKey};
    use basecore::response::{BufferedOutput, Content, HttpCode, Json, Response};
    use basecore::router::{Params, Router};
    use basecore::ids::SessionId;
    use basecore::session::{MemorySessionStore, Session, SessionRecord, SessionStore};
    use parking_lot::Mutex;
    use serde_json::json;

    /// Typed application exception with a status hint.
    #[derive(Debug, thiserror::Error)]
    #[error("I'm a teapot")]
    pub struct Teapot;

    impl AppException for Teapot {
        fn http_status(&self) -> u16 {
            418
        }
    }

    /// Typed exception the controller does not handle.
    #[derive(Debug, thiserror::Error)]
    #[error("quota exceeded")]
    pub struct QuotaExceeded;

    impl AppException for QuotaExceeded {
        fn http_status(&self) -> u16 {
            429
        }
    }

    /// Response whose status accessor is broken.
    pub struct BadStatus;

    impl Response for BadStatus {
        fn status(&self) -> u16 {
            panic!("status unavailable");
        }

        fn body(&self) -> String {
            String::new()
        }
    }

    /// Store that cannot persist anything.
    #[derive(Debug, Default)]
    pub struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn load(&self, _id: &SessionId) -> anyhow::Result<Option<SessionRecord>> {
            Ok(None)
        }

        fn save(&self, _id: &SessionId, _record: SessionRecord) -> anyhow::Result<()> {
            panic!("store down");
        }
    }

    pub struct UserController {
        request: Arc<Request>,
        session: Arc<Session>,
    }

    impl UserController {
        fn show(&self, params: &Params) -> Outcome {
            let id = params.require("id")?;
            Ok(Content::text(200, format!("user {id}")).boxed())
        }

        fn post(&self, params: &Params) -> Outcome {
            let id: u64 = params.parse("id")?;
            let post = params.require("post")?;
            Ok(Json::new(200, json!({ "user": id, "post": post })).boxed())
        }

        fn create(&self, _params: &Params) -> Outcome {
            let name = self
                .request
                .post("name")
                .and_then(|v| v.as_str())
                .unwrap_or("anonymous")
                .to_string();
            self.session.set("last_created", json!(name));
            Ok(Json::new(201, json!({ "created": name })).boxed())
        }

        fn boom(&self, _params: &Params) -> Outcome {
            panic!("controller exploded");
        }

        fn fail(&self, _params: &Params) -> Outcome {
            Err(anyhow::anyhow!("database unavailable").into())
        }

        fn teapot(&self, _params: &Params) -> Outcome {
            Err(Teapot.into())
        }

        fn quota(&self, _params: &Params) -> Outcome {
            Err(QuotaExceeded.into())
        }

        fn odd(&self, _params: &Params) -> Outcome {
            Ok(Box::new(BadStatus))
        }
    }

    impl Constructible for UserController {
        const CLASS: &'static str = "UserController";

        fn dependencies() -> Vec<TypeKey> {
            vec![TypeKey::of::<Request>(), TypeKey::of::<Session>()]
        }

        fn construct(deps: &Dependencies<'_>) -> Result<Self, Failure> {
            Ok(Self {
                request: deps.get::<Request>()?,
                session: deps.get::<Session>()?,
            })
        }
    }

    impl Controller for UserController {
        fn methods() -> Methods<Self> {
            Methods::new()
                .method("show", &["id"], Self::show)
                .method("post", &["id", "post"], Self::post)
                .method("create", &[], Self::create)
                .method("boom", &[], Self::boom)
                .method("fail", &[], Self::fail)
                .method("teapot", &[], Self::teapot)
                .method("quota", &[], Self::quota)
                .method("odd", &[], Self::odd)
        }

        fn response_for_exception(&self, exception: &Exception) -> Option<Box<dyn Response>> {
            exception
                .downcast_ref::<Teapot>()
                .map(|t| Content::text(t.http_status(), "short and stout").boxed())
        }
    }

    /// Controller that answers every unstructured failure itself.
    #[derive(Default)]
    pub struct GuardedController;

    impl GuardedController {
        fn crash(&self, _params: &Params) -> Outcome {
            panic!("guarded crash");
        }
    }

    impl Constructible for GuardedController {
        const CLASS: &'static str = "GuardedController";

        fn construct(_deps: &Dependencies<'_>) -> Result<Self, Failure> {
            Ok(Self)
        }
    }

    impl Controller for GuardedController {
        fn methods() -> Methods<Self> {
            Methods::new().method("crash", &[], Self::crash)
        }

        fn response_for_throwable(&self, _throwable: &Throwable) -> Option<Box<dyn Response>> {
            Some(Content::text(500, "guarded").boxed())
        }
    }

    /// Registered class that is not a controller.
    #[derive(Default)]
    pub struct PlainService;

    pub struct Visits {
        session: Arc<Session>,
    }

    impl Visits {
        fn count(&self, _params: &Params) -> Outcome {
            let visits = self
                .session
                .get("visits")
                .and_then(|v| v.as_u64())
                .unwrap_or(0)
                + 1;
            self.session.set("visits", json!(visits));
            Ok(Content::text(200, visits.to_string()).boxed())
        }
    }

    impl Constructible for Visits {
        const CLASS: &'static str = "Visits";

        fn dependencies() -> Vec<TypeKey> {
            vec![TypeKey::of::<Session>()]
        }

        fn construct(deps: &Dependencies<'_>) -> Result<Self, Failure> {
            Ok(Self {
                session: deps.get::<Session>()?,
            })
        }
    }

    impl Controller for Visits {
        fn methods() -> Methods<Self> {
            Methods::new().method("count", &[], Self::count)
        }
    }

    /// Delegate that records every callback it receives.
    #[derive(Default)]
    pub struct RecordingDelegate {
        pub opened: AtomicUsize,
        pub closed: AtomicUsize,
        pub exceptions: Mutex<Vec<String>>,
        pub throwables: Mutex<Vec<String>>,
        /// `open` fails with a throwable
        pub fail_open: bool,
        /// Decline every failure
        pub decline: bool,
        /// Panic inside `response_for_throwable`
        pub panic_in_translation: bool,
        /// Answer exceptions with a response whose status panics
        pub broken_exception_response: bool,
        pub domain: String,
        /// Routing path override
        pub path_override: Option<String>,
    }

    impl RecordingDelegate {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn opened(&self) -> usize {
            self.opened.load(Ordering::SeqCst)
        }

        pub fn closed(&self) -> usize {
            self.closed.load(Ordering::SeqCst)
        }
    }

    impl ApplicationDelegate for RecordingDelegate {
        fn open(&self) -> Result<(), Failure> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            if self.fail_open {
                return Err(anyhow::anyhow!("cannot connect to database").into());
            }
            Ok(())
        }

        fn close(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }

        fn register_routes(&self, router: &mut Router) -> Result<(), Failure> {
            router
                .get("/users/{id}", "UserController", "show")?
                .get("/users/{id}/posts/{}", "UserController", "post")?
                .get("/users/{id}/edit", "UserController", "edit")?
                .post("/users", "UserController", "create")?
                .get("/boom", "UserController", "boom")?
                .get("/fail", "UserController", "fail")?
                .get("/teapot", "UserController", "teapot")?
                .get("/quota", "UserController", "quota")?
                .get("/odd", "UserController", "odd")?
                .get("/guarded", "GuardedController", "crash")?
                .get("/plain", "PlainService", "index")?
                .get("/nowhere", "Nowhere", "index")?
                .get("/visits", "Visits", "count")?;
            Ok(())
        }

        fn register_classes(&self, resolver: &mut Resolver) -> Result<(), Failure> {
            resolver
                .register_controller::<UserController>()
                .register_controller::<GuardedController>()
                .register_controller::<Visits>()
                .register_default::<PlainService>("PlainService");
            Ok(())
        }

        fn current_request_path(&self, request: &Request) -> String {
            self.path_override
                .clone()
                .unwrap_or_else(|| request.path().to_string())
        }

        fn session_domain(&self, _request: &Request) -> String {
            self.domain.clone()
        }

        fn response_for_exception(
            &self,
            _request: &Request,
            exception: &Exception,
        ) -> Option<Box<dyn Response>> {
            self.exceptions.lock().push(exception.to_string());
            if self.broken_exception_response {
                return Some(Box::new(BadStatus));
            }
            if self.decline {
                return None;
            }
            Some(Json::error(exception.http_status(), &exception.to_string()).boxed())
        }

        fn response_for_throwable(
            &self,
            _request: &Request,
            throwable: &Throwable,
        ) -> Option<Box<dyn Response>> {
            self.throwables.lock().push(throwable.to_string());
            if self.panic_in_translation {
                panic!("translation bug");
            }
            if self.decline {
                return None;
            }
            Some(HttpCode::boxed(503))
        }
    }

    /// Outcome of one `Application::run`.
    pub struct Ran {
        pub result: Result<RunReport, ApplicationError>,
        pub out: BufferedOutput,
        pub session: Arc<Session>,
    }

    impl Ran {
        pub fn report(&self) -> &RunReport {
            self.result.as_ref().expect("run failed")
        }
    }

    pub fn ports() -> Ports {
        Ports::default()
    }

    pub fn get(uri: &str) -> Request {
        Request::builder()
            .uri(uri)
            .host("www.example.com")
            .build(&ports())
    }

    pub fn run(delegate: Arc<RecordingDelegate>, request: Request) -> Ran {
        run_with_store(delegate, request, Arc::new(MemorySessionStore::new()))
    }

    pub fn run_with_store(
        delegate: Arc<RecordingDelegate>,
        request: Request,
        store: Arc<dyn SessionStore>,
    ) -> Ran {
        let app = Application::new(delegate, &AppConfig::default(), Arc::new(request), store);
        let session = Arc::clone(app.session());
        let mut out = BufferedOutput::new();
        let result = app.run(&mut out);
        Ran {
            result,
            out,
            session,
        }
    }
}
