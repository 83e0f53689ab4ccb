//! Event stream query parameters.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::Endpoint;
use crate::error::GatewayError;

/// Query parameters of `GET /api/event`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventStreamParams {
    /// Only stream events of this client endpoint (and its CoAP trace).
    /// Omit to stream every endpoint's events.
    pub ep: Option<String>,
}

impl EventStreamParams {
    /// Returns the endpoint filter, `None` for a wildcard stream.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `ep` is present but blank.
    pub fn endpoint_filter(&self) -> Result<Option<Endpoint>, GatewayError> {
        match self.ep.as_deref() {
            None => Ok(None),
            Some(ep) if ep.trim().is_empty() => Err(GatewayError::InvalidRequest(
                "ep must not be blank".to_string(),
            )),
            Some(ep) => Ok(Some(Endpoint::from(ep))),
        }
    }
}
