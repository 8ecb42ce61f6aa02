//! ULID identifiers for the request snapshot and the session cookie.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

macro_rules! ulid_id {
    ($(#[$doc:meta])* $name:ident, $what:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
        pub struct $name(pub ulid::Ulid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(ulid::Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                ulid::Ulid::from_string(s.trim()).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse()
                    .map_err(|_| serde::de::Error::custom(concat!("invalid ", $what)))
            }
        }
    };
}

ulid_id!(
    /// Correlates the log events of one dispatch.
    ///
    /// Fixed when the [`Request`](crate::request::Request) snapshot is built:
    /// taken from an upstream `X-Request-Id` when it is a valid ULID, fresh
    /// otherwise.
    RequestId,
    "request id"
);

ulid_id!(
    /// Key of a stored session, carried as the session cookie value.
    SessionId,
    "session id"
);

impl RequestId {
    /// Honour the upstream id when it parses; a proxy's garbage is replaced.
    #[must_use]
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}
