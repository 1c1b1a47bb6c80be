use std::convert::Infallible;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use futures::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::watch;

use gitpulse_collector::{RunState, TriggerOutcome};

use super::{ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct CollectStarted {
    message: &'static str,
}

/// `POST /collect` — start a run, or 409 if one is already in flight.
pub(super) async fn trigger_collect(State(state): State<AppState>) -> Response {
    let date = Utc::now().date_naive();
    match std::sync::Arc::clone(&state.collector).trigger(date) {
        TriggerOutcome::Started => Json(ApiResponse::ok(CollectStarted {
            message: "collection started; follow /collect/progress",
        }))
        .into_response(),
        TriggerOutcome::AlreadyRunning => (
            StatusCode::CONFLICT,
            Json(ApiResponse::<()>::err(
                "a collection run is already in progress",
            )),
        )
            .into_response(),
    }
}

/// The progress payload served to stream subscribers.
#[derive(Debug, Serialize)]
struct ProgressEvent {
    message: String,
    current_count: usize,
    total_count: usize,
    is_running: bool,
}

impl From<RunState> for ProgressEvent {
    fn from(state: RunState) -> Self {
        Self {
            message: state.message,
            current_count: state.current_count,
            total_count: state.total_count,
            is_running: state.is_running,
        }
    }
}

enum StreamState {
    /// Emit the current snapshot before waiting for changes, so a subscriber
    /// joining with no run active still receives one terminal event.
    Initial(watch::Receiver<RunState>),
    Waiting(watch::Receiver<RunState>),
    Done,
}

/// `GET /collect/progress` — server-sent snapshots of the run state.
///
/// Each event is a complete snapshot, so intermediate updates coalesced by
/// the latest-value channel lose nothing. The stream closes after the first
/// `is_running: false` event.
pub(super) async fn progress_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.collector.progress().subscribe();

    let stream = stream::unfold(StreamState::Initial(rx), |stream_state| async move {
        match stream_state {
            StreamState::Initial(mut rx) => {
                let snapshot = rx.borrow_and_update().clone();
                let next = next_state(snapshot.is_running, rx);
                Some((Ok(progress_event(snapshot)), next))
            }
            StreamState::Waiting(mut rx) => {
                if rx.changed().await.is_err() {
                    return None;
                }
                let snapshot = rx.borrow_and_update().clone();
                let next = next_state(snapshot.is_running, rx);
                Some((Ok(progress_event(snapshot)), next))
            }
            StreamState::Done => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn next_state(is_running: bool, rx: watch::Receiver<RunState>) -> StreamState {
    if is_running {
        StreamState::Waiting(rx)
    } else {
        StreamState::Done
    }
}

fn progress_event(state: RunState) -> Event {
    let payload = ProgressEvent::from(state);
    match serde_json::to_string(&payload) {
        Ok(json) => Event::default().data(json),
        Err(e) => {
            tracing::error!(error = %e, "progress event serialization failed");
            Event::default().data("{}")
        }
    }
}
