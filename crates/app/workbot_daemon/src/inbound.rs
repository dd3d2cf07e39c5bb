//! Newline-delimited JSON chat event source.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use workbot_core::dispatcher::{ChatDispatcher, ChatEvent};

/// Parse one input line. Blank and malformed lines yield `None`.
pub fn parse_event(line: &str) -> Option<ChatEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<ChatEvent>(line) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, "skipping malformed chat event");
            None
        }
    }
}

/// Read events until end of input or cancellation, dispatching each on its own task.
///
/// Returns the number of events handed to the dispatcher.
pub async fn pump<R>(
    reader: R,
    dispatcher: Arc<ChatDispatcher>,
    tracker: &TaskTracker,
    cancel: &CancellationToken,
) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut dispatched = 0;

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            info!("end of chat input");
            break;
        };
        let Some(event) = parse_event(&line) else {
            continue;
        };

        debug!(sender = %event.sender, "chat event received");
        let dispatcher = Arc::clone(&dispatcher);
        tracker.spawn(async move {
            dispatcher.handle(&event).await;
        });
        dispatched += 1;
    }

    Ok(dispatched)
}
