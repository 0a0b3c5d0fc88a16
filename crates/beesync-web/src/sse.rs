//! Server-Sent Events (SSE) streaming for live page refresh.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_core::Stream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::state::SharedState;

/// Each `AppEvent` goes out as one JSON `data:` line. A subscriber that
/// falls behind skips the events it missed.
pub async fn sse_handler(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.subscribe()).filter_map(|result| match result {
        Ok(event) => Event::default().json_data(&event).ok().map(Ok),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            debug!(skipped, "sse subscriber lagged");
            None
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
