//! # Resolver Module
//!
//! The resolver builds objects by class identifier and satisfies their
//! declared dependencies.
//!
//! ## How dependencies are found
//!
//! A type opts in by implementing [`Constructible`]: it names its class, lists
//! the types it needs ([`TypeKey`]s) and builds itself from a [`Dependencies`]
//! view. For each declared dependency the resolver looks, in order, at
//!
//! 1. default values registered with [`Resolver::set_default_value`] (the
//!    orchestrator registers the current `Request` and `Session` here);
//! 2. another registered class producing that type, built recursively.
//!
//! A dependency found in neither place, or a dependency cycle, fails with
//! [`FrameworkError::UnresolvableDependency`]. Unknown class identifiers fail
//! with [`FrameworkError::ClassNotFound`].
//!
//! ```rust
//! use std::sync::Arc;
//! use basecore::error::Failure;
//! use basecore::resolver::{Constructible, Dependencies, Resolver, TypeKey};
//!
//! struct Clock(u64);
//!
//! struct Greeter {
//!     clock: Arc<Clock>,
//! }
//!
//! impl Constructible for Greeter {
//!     const CLASS: &'static str = "Greeter";
//!
//!     fn dependencies() -> Vec<TypeKey> {
//!         vec![TypeKey::of::<Clock>()]
//!     }
//!
//!     fn construct(deps: &Dependencies<'_>) -> Result<Self, Failure> {
//!         Ok(Greeter { clock: deps.get::<Clock>()? })
//!     }
//! }
//!
//! let mut resolver = Resolver::new();
//! resolver.set_default_value(Arc::new(Clock(42)));
//! resolver.register::<Greeter>();
//!
//! let greeter = resolver.create("Greeter").unwrap().downcast::<Greeter>().unwrap();
//! assert_eq!(greeter.clock.0, 42);
//! ```
//!
//! [`FrameworkError::UnresolvableDependency`]: crate::error::FrameworkError::UnresolvableDependency
//! [`FrameworkError::ClassNotFound`]: crate::error::FrameworkError::ClassNotFound

mod core;
#[cfg(test)]
mod tests;

pub use core::{Constructible, Dependencies, Instance, Object, Resolver, TypeKey};
