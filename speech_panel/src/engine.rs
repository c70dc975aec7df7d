use std::sync::mpsc::Sender;

use thiserror::Error;
use tracing::debug;

use crate::{params::SpeechParameters, voices::Voice};

/// Everything the speech engine needs to render one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: Option<Voice>, params: SpeechParameters) -> Self {
        Self {
            text: text.into(),
            voice,
            rate: params.rate,
            pitch: params.pitch,
            volume: params.volume,
        }
    }
}

/// Engine-assigned identifier of a submitted request. Only used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestHandle(u64);

impl RequestHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Error, Debug)]
pub enum SubmissionFault {
    #[error("Speech engine is unavailable")]
    Unavailable,
    #[error("Speech engine rejected the request: {0}")]
    Rejected(String),
    #[error("Failed to cancel speech: {0}")]
    CancelFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceEvent {
    Started,
    Ended,
    Errored(String),
}

/// Messages delivered to the panel from outside its own thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    CatalogChanged,
    Utterance {
        generation: u64,
        event: UtteranceEvent,
    },
}

/// Lifecycle callbacks handed to the engine with every request. They are tagged with the
/// generation of the request, so the panel can drop events from a request it no longer owns.
/// Calling them after the panel is gone is harmless.
#[derive(Debug, Clone)]
pub struct UtteranceCallbacks {
    generation: u64,
    events: Sender<PanelEvent>,
}

impl UtteranceCallbacks {
    pub(crate) fn new(generation: u64, events: Sender<PanelEvent>) -> Self {
        Self { generation, events }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn started(&self) {
        self.send(UtteranceEvent::Started);
    }

    pub fn ended(&self) {
        self.send(UtteranceEvent::Ended);
    }

    pub fn errored(&self, message: impl Into<String>) {
        self.send(UtteranceEvent::Errored(message.into()));
    }

    fn send(&self, event: UtteranceEvent) {
        let generation = self.generation;
        if self
            .events
            .send(PanelEvent::Utterance { generation, event })
            .is_err()
        {
            debug!(generation, "Speech panel is gone, dropping utterance event");
        }
    }
}

/// The speech synthesis capability of the host. Submission is fire-and-forget: the engine reports
/// progress through the [UtteranceCallbacks] it was given, from any thread.
pub trait SpeechEngine {
    fn submit(
        &mut self,
        request: SpeechRequest,
        callbacks: UtteranceCallbacks,
    ) -> Result<RequestHandle, SubmissionFault>;

    /// Cancel every in-flight or queued request.
    fn cancel_all(&mut self) -> Result<(), SubmissionFault>;

    /// Called on every panel pump. Engines that cannot push lifecycle events use it to poll.
    fn poll(&mut self) {}
}
