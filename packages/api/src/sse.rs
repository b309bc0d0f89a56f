// ABOUTME: Server-Sent Events plumbing for the real-time update stream
// ABOUTME: Maps notifier snapshots onto `update` events with keep-alives

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use futures::StreamExt;
use std::convert::Infallible;
use tracing::warn;

use crate::AppState;

/// Helper to create an SSE response with standard keep-alive settings
pub fn create_sse_response<S>(stream: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(std::time::Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// GET /api/events — one `update` event immediately, then one per tick for
/// the lifetime of the connection. Dropping the connection drops the
/// subscription and its timer.
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let updates = state.notifier.subscribe();

    let stream = async_stream::stream! {
        futures::pin_mut!(updates);
        while let Some(update) = updates.next().await {
            match Event::default()
                .event("update")
                .id(update.id.to_string())
                .json_data(&update.snapshot)
            {
                Ok(event) => yield Ok(event),
                // A snapshot that fails to serialize costs one tick, not
                // the whole subscription.
                Err(error) => warn!(%error, "skipping unserializable snapshot"),
            }
        }
    };

    create_sse_response(stream)
}
