use crate::broadcast::{ProgressBroadcaster, ProgressEvent};

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Bridges pipeline events to the broadcast channel.
pub struct BroadcastProgress {
    broadcaster: ProgressBroadcaster,
}

impl BroadcastProgress {
    pub fn new(broadcaster: ProgressBroadcaster) -> Self {
        Self { broadcaster }
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ProgressEvent) {
        self.broadcaster.send(event);
    }
}
