//! Server-Sent Events (SSE) utilities
//!
//! [`change_feed`] builds a stream of feed messages from a snapshot query and
//! the event bus; [`relay_feed`] turns such a stream into an SSE response with
//! the `data: {json}` envelope and a heartbeat comment.

use crate::events::RegwatchEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

/// Interval between keep-alive heartbeat comments
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Relay a feed of messages to an SSE client
///
/// Each message becomes one `data:` event. A `heartbeat` comment follows the
/// first message (the snapshot) and is repeated whenever the feed is idle for
/// [`HEARTBEAT_INTERVAL`].
///
/// # Example
/// ```rust,ignore
/// pub async fn feature_stream(
///     State(state): State<AppState>,
/// ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
///     regwatch_common::sse::relay_feed("features", state.features.stream())
/// }
/// ```
pub fn relay_feed<S, T>(
    feed_name: &'static str,
    messages: S,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    info!("New SSE client connected to {} stream", feed_name);

    let stream = async_stream::stream! {
        futures::pin_mut!(messages);
        let mut sent_snapshot = false;

        while let Some(message) = messages.next().await {
            match serde_json::to_string(&message) {
                Ok(json) => yield Ok(Event::default().data(json)),
                Err(e) => warn!("SSE: Failed to serialize {} message: {}", feed_name, e),
            }

            if !sent_snapshot {
                sent_snapshot = true;
                yield Ok(Event::default().comment("heartbeat"));
            }
        }

        debug!("SSE: {} stream ended", feed_name);
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}

/// Snapshot-then-changes feed over the event bus
///
/// Yields `snapshot()` first, then `relay(event)` for every event it maps to
/// `Some`. A receiver that lags behind the bus yields a fresh snapshot instead
/// of the lost events. A failed snapshot yields `on_error` and ends the feed.
///
/// `rx` should be subscribed before the call so no change between the
/// snapshot query and the first `recv` is missed.
pub fn change_feed<T, S, Fut, R, E>(
    feed_name: &'static str,
    mut rx: broadcast::Receiver<RegwatchEvent>,
    snapshot: S,
    relay: R,
    on_error: E,
) -> impl Stream<Item = T> + Send + 'static
where
    T: Send + 'static,
    S: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = crate::Result<T>> + Send + 'static,
    R: Fn(RegwatchEvent) -> Option<T> + Send + 'static,
    E: Fn(String) -> T + Send + 'static,
{
    async_stream::stream! {
        let mut needs_snapshot = true;

        loop {
            if needs_snapshot {
                needs_snapshot = false;
                match snapshot().await {
                    Ok(message) => yield message,
                    Err(e) => {
                        error!("{} feed: snapshot failed: {}", feed_name, e);
                        yield on_error(format!("Failed to load {}", feed_name));
                        break;
                    }
                }
            }

            match rx.recv().await {
                Ok(event) => {
                    if let Some(message) = relay(event) {
                        yield message;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("{} feed lagged by {} events, resending snapshot", feed_name, skipped);
                    needs_snapshot = true;
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
