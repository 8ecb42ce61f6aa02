use smallvec::SmallVec;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::FrameworkError;

/// Maximum number of path parameters before heap allocation.
/// Most routes have ≤4 captures (e.g. `/users/{id}/posts/{post_id}`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// One captured path value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// `None` for positional captures
    pub name: Option<Arc<str>>,
    pub value: String,
}

pub type ParamVec = SmallVec<[Param; MAX_INLINE_PARAMS]>;

/// Ordered parameters extracted from a route match.
///
/// Lookups by name use "last write wins" when a name repeats at different
/// depths (e.g. `/org/{id}/user/{id}` yields the user id).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    items: ParamVec,
    /// `(class, method)` the parameters are bound to, used in error reports
    target: Option<(Arc<str>, Arc<str>)>,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: Option<Arc<str>>, value: impl Into<String>) {
        self.items.push(Param {
            name,
            value: value.into(),
        });
    }

    /// Add a named value
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.push(Some(Arc::from(name)), value);
        self
    }

    /// Add a positional value
    #[must_use]
    pub fn with_positional(mut self, value: impl Into<String>) -> Self {
        self.push(None, value);
        self
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .rfind(|p| p.name.as_deref() == Some(name))
            .map(|p| p.value.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Value at `index` in path order, named or not
    #[must_use]
    pub fn nth(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(|p| p.value.as_str())
    }

    /// Values of positional (unnamed) captures in path order
    pub fn positional(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .filter(|p| p.name.is_none())
            .map(|p| p.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn set_target(&mut self, class: &str, method: &str) {
        self.target = Some((Arc::from(class), Arc::from(method)));
    }

    /// Give positional captures the supplied names, in path order.
    pub(crate) fn name_positional(&mut self, names: &[&str]) {
        let mut names = names.iter();
        for param in self.items.iter_mut().filter(|p| p.name.is_none()) {
            match names.next() {
                Some(name) => param.name = Some(Arc::from(*name)),
                None => break,
            }
        }
    }

    pub(crate) fn mismatch(&self, reason: impl Into<String>) -> FrameworkError {
        let (class, method) = match &self.target {
            Some((c, m)) => (c.to_string(), m.to_string()),
            None => (String::new(), String::new()),
        };
        FrameworkError::ArgumentMismatch {
            class,
            method,
            reason: reason.into(),
        }
    }

    /// Required parameter as a string.
    pub fn require(&self, name: &str) -> Result<&str, FrameworkError> {
        self.get(name)
            .ok_or_else(|| self.mismatch(format!("missing parameter '{name}'")))
    }

    /// Required parameter converted with `FromStr`.
    ///
    /// Conversion failures are reported as `ArgumentMismatch`.
    pub fn parse<T>(&self, name: &str) -> Result<T, FrameworkError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.require(name)?;
        raw.parse::<T>().map_err(|e| {
            self.mismatch(format!(
                "parameter '{name}' = '{raw}' is not a valid {}: {e}",
                std::any::type_name::<T>()
            ))
        })
    }
}
