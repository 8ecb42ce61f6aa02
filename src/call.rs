//! Method tables and single-shot invocation.
//!
//! A controller declares each invocable method with the parameter names it
//! needs. [`Call`] binds the route's [`Params`] to that declaration and invokes
//! the method exactly once.
//!
//! Binding rules:
//!
//! - a declared name is satisfied by a named capture with the same name;
//! - remaining declared names take positional (`{}`) captures in path order;
//! - unsatisfied names, or positional captures left over, are an
//!   `ArgumentMismatch`. Extra named captures are ignored.

use std::time::Instant;
use tracing::{debug, info, warn};

use crate::controller::ControllerHandle;
use crate::error::{FrameworkError, Outcome};
use crate::router::Params;

/// Signature of a controller method.
pub type Handler<C> = fn(&C, &Params) -> Outcome;

pub struct MethodDef<C> {
    name: &'static str,
    params: &'static [&'static str],
    handler: Handler<C>,
}

impl<C> MethodDef<C> {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared parameter names
    #[must_use]
    pub fn params(&self) -> &'static [&'static str] {
        self.params
    }

    pub(crate) fn call(&self, controller: &C, params: &Params) -> Outcome {
        (self.handler)(controller, params)
    }
}

/// Method table of a controller type.
pub struct Methods<C> {
    defs: Vec<MethodDef<C>>,
}

impl<C> Default for Methods<C> {
    fn default() -> Self {
        Self { defs: Vec::new() }
    }
}

impl<C> Methods<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a method. A later declaration with the same name replaces the earlier one.
    #[must_use]
    pub fn method(
        mut self,
        name: &'static str,
        params: &'static [&'static str],
        handler: Handler<C>,
    ) -> Self {
        self.defs.retain(|d| d.name != name);
        self.defs.push(MethodDef {
            name,
            params,
            handler,
        });
        self
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&MethodDef<C>> {
        self.defs.iter().find(|d| d.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.defs.iter().map(|d| d.name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// One pending invocation of a controller method.
#[derive(Debug)]
pub struct Call<'a> {
    target: &'a ControllerHandle,
    method: String,
    params: Params,
}

impl<'a> Call<'a> {
    pub fn new(target: &'a ControllerHandle, method: impl Into<String>, params: Params) -> Self {
        Self {
            target,
            method: method.into(),
            params,
        }
    }

    /// Bind parameters and invoke the method once.
    ///
    /// # Errors
    ///
    /// * `MethodNotFound` - the controller has no such method
    /// * `ArgumentMismatch` - the parameters cannot satisfy the declaration
    /// * whatever the method itself returns
    pub fn invoke(self) -> Outcome {
        let class = self.target.class();
        let Some(declared) = self.target.signature(&self.method) else {
            warn!(
                class = %class,
                method = %self.method,
                available = ?self.target.method_names(),
                "Controller method not found"
            );
            return Err(FrameworkError::MethodNotFound {
                class: class.to_string(),
                method: self.method,
            }
            .into());
        };

        let params = bind(class, &self.method, declared, self.params)?;

        // H2: Handler execution start
        debug!(class = %class, method = %self.method, params = ?params, "Invoking controller method");
        let start = Instant::now();
        let outcome = match self.target.invoke_unchecked(&self.method, &params) {
            Some(outcome) => outcome,
            None => Err(FrameworkError::MethodNotFound {
                class: class.to_string(),
                method: self.method.clone(),
            }
            .into()),
        };

        // H4: Handler execution complete
        info!(
            class = %class,
            method = %self.method,
            ok = outcome.is_ok(),
            execution_time_us = start.elapsed().as_micros(),
            "Controller method returned"
        );
        outcome
    }
}

fn bind(
    class: &str,
    method: &str,
    declared: &[&'static str],
    mut params: Params,
) -> Result<Params, FrameworkError> {
    params.set_target(class, method);

    let unbound: Vec<&'static str> = declared
        .iter()
        .copied()
        .filter(|name| !params.contains(name))
        .collect();
    let positional = params.positional().count();

    if positional > unbound.len() {
        return Err(params.mismatch(format!(
            "{positional} positional argument(s) supplied, {} accepted",
            unbound.len()
        )));
    }
    if let Some(missing) = unbound.get(positional) {
        return Err(params.mismatch(format!("missing parameter '{missing}'")));
    }

    params.name_positional(&unbound);
    Ok(params)
}
