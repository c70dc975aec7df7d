//! Matching of backend utterance events to the one request an engine adapter owns.

use std::{
    collections::VecDeque,
    fmt::Debug,
    time::{Duration, Instant},
};

use tracing::debug;

use crate::engine::UtteranceCallbacks;

// Polling engines may not report speaking for a short while after submission.
pub(crate) const START_TIMEOUT: Duration = Duration::from_millis(500);

// Late events from cancelled utterances arrive shortly after a stop.
const CANCELLED_HISTORY: usize = 8;

struct Tracked<Id> {
    utterance: Option<Id>,
    callbacks: UtteranceCallbacks,
    started: bool,
    submitted_at: Instant,
}

/// Forwards backend events for the tracked utterance to its [UtteranceCallbacks] and drops
/// everything else: events for cancelled utterances, for other utterances, and ends that arrive
/// before the tracked utterance has an id unless that id later turns out to match.
pub(crate) struct UtteranceTracker<Id> {
    tracked: Option<Tracked<Id>>,
    cancelled: VecDeque<Id>,
    early_end: Option<Id>,
}

impl<Id> Default for UtteranceTracker<Id> {
    fn default() -> Self {
        Self {
            tracked: None,
            cancelled: VecDeque::new(),
            early_end: None,
        }
    }
}

impl<Id: PartialEq + Debug> UtteranceTracker<Id> {
    pub(crate) fn is_tracking(&self) -> bool {
        self.tracked.is_some()
    }

    /// Start tracking a request whose backend id is not known yet.
    pub(crate) fn track(&mut self, callbacks: UtteranceCallbacks, now: Instant) {
        self.early_end = None;
        self.tracked = Some(Tracked {
            utterance: None,
            callbacks,
            started: false,
            submitted_at: now,
        });
    }

    /// Record the id the backend gave the tracked request.
    pub(crate) fn assign(&mut self, utterance: Option<Id>) {
        let early_end = self.early_end.take();
        let (Some(tracked), Some(id)) = (self.tracked.as_mut(), utterance) else {
            return;
        };
        if early_end.is_some_and(|ended| ended == id) {
            self.finish();
            return;
        }
        tracked.utterance = Some(id);
    }

    /// Forget the tracked request without reporting anything.
    pub(crate) fn abandon(&mut self) {
        self.tracked = None;
        self.early_end = None;
    }

    /// Forget the tracked request and ignore whatever its utterance reports later.
    pub(crate) fn cancel(&mut self) -> bool {
        self.early_end = None;
        let Some(tracked) = self.tracked.take() else {
            return false;
        };
        if let Some(id) = tracked.utterance {
            if self.cancelled.len() == CANCELLED_HISTORY {
                self.cancelled.pop_front();
            }
            self.cancelled.push_back(id);
        }
        true
    }

    pub(crate) fn begin(&mut self, id: Id) {
        if self.cancelled.contains(&id) {
            debug!(utterance = ?id, "Begin event for a cancelled utterance");
            return;
        }
        match self.tracked.as_mut() {
            Some(tracked) if tracked.utterance.as_ref().is_none_or(|known| *known == id) => {
                if !tracked.started {
                    tracked.started = true;
                    tracked.callbacks.started();
                }
            }
            _ => debug!(utterance = ?id, "Begin event for an utterance we do not track"),
        }
    }

    pub(crate) fn end(&mut self, id: Id) {
        if self.cancelled.contains(&id) {
            debug!(utterance = ?id, "End event for a cancelled utterance");
            return;
        }
        let owned = match &self.tracked {
            None => {
                debug!(utterance = ?id, "End event with nothing tracked");
                return;
            }
            Some(tracked) => tracked.utterance.as_ref().map(|known| *known == id),
        };
        match owned {
            Some(true) => self.finish(),
            Some(false) => debug!(utterance = ?id, "End event for an utterance we do not track"),
            None => self.early_end = Some(id),
        }
    }

    /// Report start and end at once, for backends that cannot observe progress.
    pub(crate) fn complete_now(&mut self) {
        if let Some(tracked) = self.tracked.take() {
            tracked.callbacks.started();
            tracked.callbacks.ended();
        }
    }

    /// Advance a polled request from the backend's speaking state.
    pub(crate) fn poll(&mut self, speaking: Result<bool, String>, now: Instant) {
        let speaking = match speaking {
            Ok(speaking) => speaking,
            Err(message) => {
                if let Some(tracked) = self.tracked.take() {
                    tracked.callbacks.errored(message);
                }
                return;
            }
        };

        let finished = match self.tracked.as_mut() {
            None => return,
            Some(tracked) if speaking => {
                if !tracked.started {
                    tracked.started = true;
                    tracked.callbacks.started();
                }
                false
            }
            Some(tracked) => {
                tracked.started || now.duration_since(tracked.submitted_at) >= START_TIMEOUT
            }
        };
        if finished {
            self.finish();
        }
    }

    fn finish(&mut self) {
        if let Some(tracked) = self.tracked.take() {
            tracked.callbacks.ended();
        }
    }
}
