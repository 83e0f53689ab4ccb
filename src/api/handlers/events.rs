//! Server-Sent Events stream of domain events.

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use futures_util::stream;

use crate::api::dto::EventStreamParams;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::hub::WireMessage;

/// `GET /api/event` — Open an event stream.
///
/// Each event is framed as `event: <KIND>` followed by `data: <json>`.
/// The subscription lives as long as the HTTP response body; a client
/// disconnect unsubscribes.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if `ep` is blank.
#[utoipa::path(
    get,
    path = "/api/event",
    tag = "Events",
    summary = "Stream device events",
    description = "Opens a Server-Sent Events stream of registration, presence, notification and Send events. With `ep`, only that endpoint's events are streamed, plus its CoAP message log (COAPLOG).",
    params(EventStreamParams),
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = String),
        (status = 400, description = "Blank endpoint filter", body = ErrorResponse),
    )
)]
pub async fn event_stream(
    State(state): State<AppState>,
    Query(params): Query<EventStreamParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let filter = params.endpoint_filter()?;
    let handle = state.hub.subscribe(filter);

    let events = stream::unfold(handle, |mut handle| async move {
        let message = handle.recv().await?;
        Some((Ok::<Event, Infallible>(sse_event(&message)), handle))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(state.keep_alive)))
}

fn sse_event(message: &WireMessage) -> Event {
    Event::default()
        .event(message.kind.as_str())
        .data(message.data.as_str())
}

/// Event stream routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/event", get(event_stream))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use futures_util::StreamExt;
    use tower::ServiceExt;

    use crate::api::build_router;
    use crate::domain::registration::sample_registration;
    use crate::domain::DomainEvent;
    use crate::hub::{CoapMessageTracer, EventHub, ProtocolTracer};

    use super::*;

    fn state() -> AppState {
        let tracer: Arc<dyn ProtocolTracer> = Arc::new(CoapMessageTracer::new());
        AppState {
            hub: EventHub::new(tracer, 16),
            keep_alive: Duration::from_secs(30),
        }
    }

    fn request(uri: &str) -> Request<Body> {
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            panic!("invalid request");
        };
        request
    }

    #[tokio::test]
    async fn filtered_stream_delivers_matching_frames() {
        let state = state();
        let app = build_router().with_state(state.clone());

        let Ok(response) = app.oneshot(request("/api/event?ep=dev1")).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(content_type.starts_with("text/event-stream"));
        assert_eq!(state.hub.subscription_count(), 1);
        assert!(state.hub.is_tracing(&"dev1".into()));

        state.hub.dispatch(DomainEvent::Registered {
            registration: sample_registration("dev2"),
        });
        state.hub.dispatch(DomainEvent::Registered {
            registration: sample_registration("dev1"),
        });

        let mut body = response.into_body().into_data_stream();
        let Ok(Some(Ok(chunk))) = tokio::time::timeout(Duration::from_secs(2), body.next()).await
        else {
            panic!("no frame received");
        };
        let frame = String::from_utf8_lossy(&chunk);
        assert!(frame.starts_with("event: REGISTRATION\ndata: "), "{frame}");
        assert!(frame.contains("\"endpoint\":\"dev1\""));
        assert!(frame.ends_with("\n\n"));

        drop(body);
        assert_eq!(state.hub.subscription_count(), 0);
        assert!(!state.hub.is_tracing(&"dev1".into()));
    }

    #[tokio::test]
    async fn wildcard_stream_binds_no_tracer() {
        let state = state();
        let app = build_router().with_state(state.clone());

        let Ok(response) = app.oneshot(request("/api/event")).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.hub.subscription_count(), 1);
        assert_eq!(state.hub.traced_endpoint_count(), 0);
    }

    #[tokio::test]
    async fn blank_filter_is_rejected() {
        let state = state();
        let app = build_router().with_state(state.clone());

        let Ok(response) = app.oneshot(request("/api/event?ep=")).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.hub.subscription_count(), 0);
    }
}
