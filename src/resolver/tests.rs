use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::call::Methods;
use crate::controller::Controller;
use crate::error::{Failure, FrameworkError, Outcome};
use crate::response::{HttpCode, Response};
use crate::router::Params;

struct Config {
    greeting: &'static str,
}

struct Repo {
    config: Arc<Config>,
}

impl Constructible for Repo {
    const CLASS: &'static str = "Repo";

    fn dependencies() -> Vec<TypeKey> {
        vec![TypeKey::of::<Config>()]
    }

    fn construct(deps: &Dependencies<'_>) -> Result<Self, Failure> {
        Ok(Repo {
            config: deps.get::<Config>()?,
        })
    }
}

struct Home {
    repo: Arc<Repo>,
}

impl Home {
    fn index(&self, _params: &Params) -> Outcome {
        Ok(HttpCode::boxed(if self.repo.config.greeting.is_empty() { 204 } else { 200 }))
    }
}

impl Constructible for Home {
    const CLASS: &'static str = "Home";

    fn dependencies() -> Vec<TypeKey> {
        vec![TypeKey::of::<Repo>()]
    }

    fn construct(deps: &Dependencies<'_>) -> Result<Self, Failure> {
        Ok(Home {
            repo: deps.get::<Repo>()?,
        })
    }
}

impl Controller for Home {
    fn methods() -> Methods<Self> {
        Methods::new().method("index", &[], Self::index)
    }
}

struct Ping;
struct Pong;

impl Constructible for Ping {
    const CLASS: &'static str = "Ping";

    fn dependencies() -> Vec<TypeKey> {
        vec![TypeKey::of::<Pong>()]
    }

    fn construct(_deps: &Dependencies<'_>) -> Result<Self, Failure> {
        Ok(Ping)
    }
}

impl Constructible for Pong {
    const CLASS: &'static str = "Pong";

    fn dependencies() -> Vec<TypeKey> {
        vec![TypeKey::of::<Ping>()]
    }

    fn construct(_deps: &Dependencies<'_>) -> Result<Self, Failure> {
        Ok(Pong)
    }
}

/// Reads a dependency it never declared.
struct Sneaky;

impl Constructible for Sneaky {
    const CLASS: &'static str = "Sneaky";

    fn construct(deps: &Dependencies<'_>) -> Result<Self, Failure> {
        deps.get::<Config>()?;
        Ok(Sneaky)
    }
}

static BUILT: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct Counter;

impl Constructible for Counter {
    const CLASS: &'static str = "Counter";

    fn construct(_deps: &Dependencies<'_>) -> Result<Self, Failure> {
        BUILT.fetch_add(1, Ordering::SeqCst);
        Ok(Counter)
    }
}

fn framework_error(failure: Failure) -> FrameworkError {
    match failure {
        Failure::Exception(e) => e.framework_error().cloned().unwrap(),
        Failure::Throwable(t) => panic!("unexpected throwable {t}"),
    }
}

fn resolver() -> Resolver {
    let mut resolver = Resolver::new();
    resolver
        .set_default_value(Arc::new(Config { greeting: "hi" }))
        .register::<Repo>()
        .register_controller::<Home>();
    resolver
}

#[test]
fn test_create_with_default_value() {
    let repo = resolver().create("Repo").unwrap().downcast::<Repo>().unwrap();
    assert_eq!(repo.config.greeting, "hi");
}

#[test]
fn test_create_recursive_dependency() {
    let object = resolver().create("Home").unwrap();
    assert_eq!(object.class(), "Home");
    assert!(object.is_controller());
    let home = object.downcast::<Home>().unwrap();
    assert_eq!(home.repo.config.greeting, "hi");
}

#[test]
fn test_controller_handle_invokes() {
    let handle = resolver().create("Home").unwrap().into_controller().unwrap();
    assert_eq!(handle.class(), "Home");
    assert_eq!(handle.method_names(), vec!["index"]);
    let response = crate::call::Call::new(&handle, "index", Params::new())
        .invoke()
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[test]
fn test_plain_class_is_not_controller() {
    let object = resolver().create("Repo").unwrap();
    assert!(!object.is_controller());
    assert!(object.into_controller().is_none());
}

#[test]
fn test_default_value_wins_over_constructor() {
    let mut resolver = resolver();
    let preset = Arc::new(Repo {
        config: Arc::new(Config { greeting: "" }),
    });
    resolver.set_default_value(Arc::clone(&preset));
    let home = resolver.create("Home").unwrap().downcast::<Home>().unwrap();
    assert!(Arc::ptr_eq(&home.repo, &preset));
}

#[test]
fn test_class_not_found() {
    let err = resolver().create("Missing").unwrap_err();
    assert_eq!(
        framework_error(err),
        FrameworkError::ClassNotFound {
            class: "Missing".into()
        }
    );
}

#[test]
fn test_unresolvable_dependency() {
    let mut resolver = Resolver::new();
    resolver.register::<Repo>();
    match framework_error(resolver.create("Repo").unwrap_err()) {
        FrameworkError::UnresolvableDependency { class, dependency } => {
            assert_eq!(class, "Repo");
            assert!(dependency.ends_with("Config"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_dependency_cycle_is_unresolvable() {
    let mut resolver = Resolver::new();
    resolver.register::<Ping>().register::<Pong>();
    assert!(matches!(
        framework_error(resolver.create("Ping").unwrap_err()),
        FrameworkError::UnresolvableDependency { .. }
    ));
}

#[test]
fn test_undeclared_dependency_is_not_visible() {
    let mut resolver = resolver();
    resolver.register::<Sneaky>();
    assert!(matches!(
        framework_error(resolver.create("Sneaky").unwrap_err()),
        FrameworkError::UnresolvableDependency { ref class, .. } if class == "Sneaky"
    ));
}

#[test]
fn test_each_create_builds_a_new_instance() {
    let mut resolver = Resolver::new();
    resolver.register::<Counter>();
    let before = BUILT.load(Ordering::SeqCst);
    let a = resolver.create("Counter").unwrap();
    let b = resolver.create("Counter").unwrap();
    assert!(!Arc::ptr_eq(a.instance(), b.instance()));
    assert_eq!(BUILT.load(Ordering::SeqCst) - before, 2);
}

#[test]
fn test_register_default_and_create_typed() {
    let mut resolver = Resolver::new();
    resolver.register_default::<Counter>("CounterAlias");
    assert!(resolver.contains("CounterAlias"));
    assert!(resolver.create_typed::<Counter>().is_ok());
    assert_eq!(resolver.classes(), vec!["CounterAlias"]);
}

#[test]
fn test_reregistering_replaces_class() {
    let mut resolver = Resolver::new();
    resolver
        .register_default::<Counter>("Thing")
        .register_default::<Config2>("Thing");
    let object = resolver.create("Thing").unwrap();
    assert!(object.downcast::<Config2>().is_some());
    assert!(resolver.create_typed::<Counter>().is_err());
}

#[test]
fn test_reregistering_keeps_type_taken_over_by_another_class() {
    let mut resolver = Resolver::new();
    resolver
        .register_default::<Counter>("First")
        .register_default::<Counter>("Second")
        .register_default::<Config2>("First");
    assert!(resolver.create_typed::<Counter>().is_ok());
    assert!(resolver.create_typed::<Config2>().is_ok());
    assert!(resolver.create("Second").unwrap().downcast::<Counter>().is_some());
}

#[derive(Default)]
struct Config2;
