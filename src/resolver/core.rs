use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::controller::{Controller, ControllerHandle};
use crate::error::{Failure, FrameworkError};

/// Shared, type-erased instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Identity of a dependency type.
///
/// Equality and hashing use the `TypeId` only; the name is kept for messages.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A type the resolver can build.
pub trait Constructible: Any + Send + Sync + Sized {
    /// Class identifier used by routes
    const CLASS: &'static str;

    /// Types that must be available to [`construct`](Self::construct).
    fn dependencies() -> Vec<TypeKey> {
        Vec::new()
    }

    fn construct(deps: &Dependencies<'_>) -> Result<Self, Failure>;
}

/// Resolved dependencies handed to a constructor.
///
/// Only the declared dependencies are available.
pub struct Dependencies<'a> {
    class: &'a str,
    values: Vec<(TypeKey, Instance)>,
}

impl Dependencies<'_> {
    /// Fetch a declared dependency.
    ///
    /// # Errors
    ///
    /// `UnresolvableDependency` if `T` was not declared by the class.
    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>, FrameworkError> {
        let key = TypeKey::of::<T>();
        self.values
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| Arc::clone(v).downcast::<T>().ok())
            .ok_or_else(|| FrameworkError::UnresolvableDependency {
                class: self.class.to_string(),
                dependency: key.name().to_string(),
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An object built by the resolver.
pub struct Object {
    class: &'static str,
    instance: Instance,
    controller: Option<ControllerHandle>,
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class)
            .field("controller", &self.controller.is_some())
            .finish_non_exhaustive()
    }
}

impl Object {
    #[must_use]
    pub fn class(&self) -> &'static str {
        self.class
    }

    #[must_use]
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.instance).downcast::<T>().ok()
    }

    /// True when the class was registered as a controller
    #[must_use]
    pub fn is_controller(&self) -> bool {
        self.controller.is_some()
    }

    #[must_use]
    pub fn into_controller(self) -> Option<ControllerHandle> {
        self.controller
    }
}

type Build = Box<dyn Fn(&Dependencies<'_>) -> Result<Object, Failure> + Send + Sync>;

struct Constructor {
    class: &'static str,
    produces: TypeKey,
    dependencies: Vec<TypeKey>,
    build: Build,
}

/// Class registry and dependency injector.
#[derive(Default)]
pub struct Resolver {
    defaults: HashMap<TypeKey, Instance>,
    constructors: HashMap<&'static str, Constructor>,
    by_type: HashMap<TypeKey, &'static str>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<_> = self.constructors.keys().collect();
        classes.sort();
        f.debug_struct("Resolver")
            .field("defaults", &self.defaults.keys().collect::<Vec<_>>())
            .field("classes", &classes)
            .finish()
    }
}

impl Resolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `value` available to every constructor declaring `T`.
    ///
    /// Default values take precedence over registered constructors.
    pub fn set_default_value<T: Any + Send + Sync>(&mut self, value: Arc<T>) -> &mut Self {
        let key = TypeKey::of::<T>();
        debug!(dependency = key.name(), "Default value registered");
        self.defaults.insert(key, value);
        self
    }

    /// Register a plain (non-controller) class.
    pub fn register<T: Constructible>(&mut self) -> &mut Self {
        self.insert(Constructor {
            class: T::CLASS,
            produces: TypeKey::of::<T>(),
            dependencies: T::dependencies(),
            build: Box::new(|deps: &Dependencies<'_>| {
                let instance: Instance = Arc::new(T::construct(deps)?);
                Ok(Object {
                    class: T::CLASS,
                    instance,
                    controller: None,
                })
            }),
        })
    }

    /// Register a controller class.
    pub fn register_controller<C: Constructible + Controller>(&mut self) -> &mut Self {
        self.insert(Constructor {
            class: C::CLASS,
            produces: TypeKey::of::<C>(),
            dependencies: C::dependencies(),
            build: Box::new(|deps: &Dependencies<'_>| {
                let controller = Arc::new(C::construct(deps)?);
                let instance: Instance = Arc::clone(&controller) as Instance;
                Ok(Object {
                    class: C::CLASS,
                    instance,
                    controller: Some(ControllerHandle::new(C::CLASS, controller)),
                })
            }),
        })
    }

    /// Register a dependency-free class built with `Default`.
    pub fn register_default<T: Default + Any + Send + Sync>(
        &mut self,
        class: &'static str,
    ) -> &mut Self {
        self.insert(Constructor {
            class,
            produces: TypeKey::of::<T>(),
            dependencies: Vec::new(),
            build: Box::new(move |_: &Dependencies<'_>| {
                Ok(Object {
                    class,
                    instance: Arc::new(T::default()),
                    controller: None,
                })
            }),
        })
    }

    fn insert(&mut self, constructor: Constructor) -> &mut Self {
        let class = constructor.class;
        debug!(
            class = class,
            produces = constructor.produces.name(),
            dependencies = ?constructor.dependencies,
            "Class registered"
        );
        if let Some(previous) = self.constructors.remove(class) {
            warn!(class = class, "Class registered twice, replacing previous constructor");
            // Another class may have taken over the type since.
            if self.by_type.get(&previous.produces) == Some(&class) {
                self.by_type.remove(&previous.produces);
            }
        }
        self.by_type.insert(constructor.produces, class);
        self.constructors.insert(class, constructor);
        self
    }

    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.constructors.contains_key(class)
    }

    /// Registered class identifiers, sorted
    #[must_use]
    pub fn classes(&self) -> Vec<&'static str> {
        let mut classes: Vec<_> = self.constructors.keys().copied().collect();
        classes.sort_unstable();
        classes
    }

    /// Build an object of the named class.
    ///
    /// # Errors
    ///
    /// * `ClassNotFound` - `class` is not registered
    /// * `UnresolvableDependency` - a dependency cannot be satisfied, or the
    ///   dependency graph has a cycle
    /// * any failure returned by a constructor
    pub fn create(&self, class: &str) -> Result<Object, Failure> {
        let object = self.create_inner(class, &mut Vec::new())?;
        info!(class = object.class(), controller = object.is_controller(), "Object created");
        Ok(object)
    }

    /// Build (or fetch the default value of) a `T` directly by type.
    pub fn create_typed<T: Any + Send + Sync>(&self) -> Result<Arc<T>, Failure> {
        let key = TypeKey::of::<T>();
        let instance = self.instance_of(key, "<root>", &mut Vec::new())?;
        instance.downcast::<T>().map_err(|_| {
            Failure::internal(format!("resolver produced the wrong type for {}", key.name()))
        })
    }

    fn create_inner(
        &self,
        class: &str,
        stack: &mut Vec<&'static str>,
    ) -> Result<Object, Failure> {
        let Some(constructor) = self.constructors.get(class) else {
            warn!(class = class, known = ?self.classes(), "Class not registered");
            return Err(FrameworkError::ClassNotFound {
                class: class.to_string(),
            }
            .into());
        };

        stack.push(constructor.class);
        let mut values = Vec::with_capacity(constructor.dependencies.len());
        for key in &constructor.dependencies {
            match self.instance_of(*key, constructor.class, stack) {
                Ok(instance) => values.push((*key, instance)),
                Err(err) => {
                    stack.pop();
                    return Err(err);
                }
            }
        }
        stack.pop();

        let deps = Dependencies {
            class: constructor.class,
            values,
        };
        (constructor.build)(&deps)
    }

    fn instance_of(
        &self,
        key: TypeKey,
        requested_by: &str,
        stack: &mut Vec<&'static str>,
    ) -> Result<Instance, Failure> {
        if let Some(value) = self.defaults.get(&key) {
            return Ok(Arc::clone(value));
        }
        let unresolvable = || FrameworkError::UnresolvableDependency {
            class: requested_by.to_string(),
            dependency: key.name().to_string(),
        };
        let Some(&class) = self.by_type.get(&key) else {
            warn!(class = requested_by, dependency = key.name(), "No default value or constructor for dependency");
            return Err(unresolvable().into());
        };
        if stack.contains(&class) {
            warn!(class = requested_by, dependency = key.name(), chain = ?stack, "Dependency cycle");
            return Err(unresolvable().into());
        }
        Ok(self.create_inner(class, stack)?.instance)
    }
}
