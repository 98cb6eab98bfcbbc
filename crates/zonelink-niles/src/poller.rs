//! Periodic status refresh.
//!
//! The receiver pushes status only when queried, so the driver re-polls
//! every zone on a configurable interval. The poller is a small
//! cancellable task that checks once a second whether the interval has
//! elapsed since the last completed full poll and, if so, enqueues a
//! `PollAll` -- it never touches the wire itself, keeping all I/O in the
//! single worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::receiver::{Command, Shared};

/// How often the poller re-checks whether a refresh is due.
const CHECK_PERIOD: Duration = Duration::from_secs(1);

/// Run the poll scheduler until cancelled or the queue closes.
pub(crate) async fn run(
    cancel: CancellationToken,
    interval: Duration,
    shared: Arc<Shared>,
    cmd_tx: mpsc::UnboundedSender<Command>,
) {
    debug!(interval_secs = interval.as_secs(), "poller started");
    let mut ticker = tokio::time::interval(CHECK_PERIOD);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if shared.poll_due(interval) {
            debug!("poll interval elapsed, queueing status refresh");
            if cmd_tx.send(Command::PollAll).is_err() {
                break;
            }
        }
    }
    debug!("poller exiting");
}
