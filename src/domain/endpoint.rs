//! Type-safe client endpoint name.
//!
//! [`Endpoint`] wraps the endpoint name a LwM2M client registers with. It is
//! the routing key for subscription filters and tracer bindings, so it is
//! cheap to clone (`Arc<str>` inside).

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Stable identifier of one managed client/device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint(Arc<str>);

impl Endpoint {
    /// Creates an `Endpoint` from any string-like value.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Returns the endpoint name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(name: &str) -> Self {
        Self(Arc::from(name))
    }
}

impl From<String> for Endpoint {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl Serialize for Endpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
