use std::collections::VecDeque;

use speech_panel::{
    engine::{RequestHandle, SpeechEngine, SpeechRequest, SubmissionFault, UtteranceCallbacks},
    voices::{CatalogNotifier, DirectoryError, Voice, VoiceDirectory},
    PanelConfig, SpeechPanel,
};

/// Records every request and keeps the callbacks so tests can play the engine's part.
#[derive(Default)]
pub struct RecordingEngine {
    pub submitted: Vec<SpeechRequest>,
    pub callbacks: Vec<UtteranceCallbacks>,
    pub cancels: usize,
    pub fail_next: bool,
    pub polls: usize,
}

impl RecordingEngine {
    pub fn last_callbacks(&self) -> &UtteranceCallbacks {
        self.callbacks.last().expect("no request submitted")
    }
}

impl SpeechEngine for RecordingEngine {
    fn submit(
        &mut self,
        request: SpeechRequest,
        callbacks: UtteranceCallbacks,
    ) -> Result<RequestHandle, SubmissionFault> {
        if std::mem::take(&mut self.fail_next) {
            return Err(SubmissionFault::Unavailable);
        }
        self.submitted.push(request);
        self.callbacks.push(callbacks);
        Ok(RequestHandle::new(self.submitted.len() as u64))
    }

    fn cancel_all(&mut self) -> Result<(), SubmissionFault> {
        self.cancels += 1;
        Ok(())
    }

    fn poll(&mut self) {
        self.polls += 1;
    }
}

/// Answers queries from a script, then keeps repeating `fallback`.
#[derive(Default)]
pub struct ScriptedDirectory {
    pub responses: VecDeque<Result<Vec<Voice>, DirectoryError>>,
    pub fallback: Vec<Voice>,
    pub supports_notifications: bool,
    pub notifier: Option<CatalogNotifier>,
    pub queries: usize,
}

impl ScriptedDirectory {
    pub fn fixed(voices: Vec<Voice>) -> Self {
        Self {
            fallback: voices,
            ..Self::default()
        }
    }

    pub fn notifying(responses: Vec<Vec<Voice>>) -> Self {
        Self {
            responses: responses.into_iter().map(Ok).collect(),
            supports_notifications: true,
            ..Self::default()
        }
    }

    pub fn notify(&self) {
        self.notifier
            .as_ref()
            .expect("directory was never subscribed")
            .notify();
    }
}

impl VoiceDirectory for ScriptedDirectory {
    fn list_voices(&mut self) -> Result<Vec<Voice>, DirectoryError> {
        self.queries += 1;
        self.responses
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }

    fn on_catalog_changed(&mut self, notifier: CatalogNotifier) -> bool {
        if self.supports_notifications {
            self.notifier = Some(notifier);
        }
        self.supports_notifications
    }
}

pub fn three_voices() -> Vec<Voice> {
    vec![
        Voice::new("alice", "Alice", "en-US"),
        Voice::new("kenji", "Kenji", "ja-JP"),
        Voice::new("mara", "Mara", "fr-FR"),
    ]
}

pub fn mount(directory: ScriptedDirectory) -> SpeechPanel<RecordingEngine, ScriptedDirectory> {
    SpeechPanel::mount(RecordingEngine::default(), directory, PanelConfig::default())
}
