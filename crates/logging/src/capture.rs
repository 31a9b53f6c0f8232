//! Capture tracing events in memory.
//!
//! [`capture`] installs a thread-scoped subscriber whose [`CaptureLayer`]
//! renders every enabled event with [`crate::fmt::render_event`] and appends
//! it to a shared buffer. The subscriber stays active on the current thread
//! until the returned [`Captured`] is dropped.
//!
//! Usage:
//! - `let logs = logging::capture::capture("modal_host=debug");`
//! - exercise the code under test on the same thread
//! - inspect `logs.records()` or `logs.contains("...")`

use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::{Event, Subscriber, dispatcher::DefaultGuard};
use tracing_subscriber::{
    layer::{Context, Layer},
    prelude::*,
    registry,
};

use crate::{env_filter_from_spec, fmt::RenderedLog};

/// Shared buffer of rendered events.
type Sink = Arc<Mutex<Vec<RenderedLog>>>;

/// Tracing layer that appends rendered events to a shared buffer.
pub struct CaptureLayer {
    /// Destination buffer.
    sink: Sink,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let rendered = crate::fmt::render_event(event);
        self.sink.lock().push(rendered);
    }
}

/// Handle to an active capture. Dropping it restores the previous default subscriber.
pub struct Captured {
    /// Events recorded so far.
    sink: Sink,
    /// Keeps the thread-scoped subscriber installed.
    _guard: DefaultGuard,
}

impl Captured {
    /// Snapshot of all events recorded so far.
    pub fn records(&self) -> Vec<RenderedLog> {
        self.sink.lock().clone()
    }

    /// Remove and return all events recorded so far.
    pub fn drain(&self) -> Vec<RenderedLog> {
        self.sink.lock().drain(..).collect()
    }

    /// True if any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.sink.lock().iter().any(|r| r.mentions(needle))
    }

    /// Number of recorded events at `level` (e.g. "WARN").
    pub fn count_level(&self, level: &str) -> usize {
        self.sink.lock().iter().filter(|r| r.level == level).count()
    }
}

impl fmt::Debug for Captured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Captured")
            .field("records", &self.sink.lock().len())
            .finish_non_exhaustive()
    }
}

/// Start capturing events on the current thread using the filter directive `spec`.
pub fn capture(spec: &str) -> Captured {
    let sink: Sink = Arc::new(Mutex::new(Vec::new()));
    let subscriber = registry()
        .with(env_filter_from_spec(spec))
        .with(CaptureLayer { sink: sink.clone() });
    let guard = tracing::subscriber::set_default(subscriber);
    Captured {
        sink,
        _guard: guard,
    }
}
