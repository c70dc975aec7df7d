use std::{
    sync::mpsc::{self, Receiver, Sender},
    time::{Duration, Instant},
};

use engine::{PanelEvent, SpeechEngine, SpeechRequest, UtteranceCallbacks, UtteranceEvent};
use state::Observers;
use tracing::{debug, error, info, warn};
use voices::{reconcile_selection, CatalogNotifier, VoiceDirectory};

pub use engine::{RequestHandle, SubmissionFault};
pub use params::{ParameterRange, SpeechParameters};
pub use state::{
    PanelPhase, PanelState, PanelView, PlaybackState, SpeakRejection, SubscriptionId, VoiceStatus,
};
pub use voices::{DirectoryError, SelectVoiceError, Voice};

pub mod engine;
#[cfg(feature = "native")]
pub mod native;
pub mod params;
pub mod state;
#[cfg_attr(not(feature = "native"), allow(dead_code))]
mod utterances;
pub mod voices;

#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// How long to wait for a directory that supports change notifications but reports no voices
    /// before treating the empty catalog as final.
    pub voice_load_grace: Duration,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            voice_load_grace: Duration::from_secs(2),
        }
    }
}

#[derive(Debug)]
pub enum SpeakOutcome {
    Submitted { generation: u64 },
    Rejected(SpeakRejection),
    /// The engine refused the request. The panel is back to idle.
    Failed(SubmissionFault),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CatalogTrigger {
    Mount,
    Notification,
}

/// A text-to-speech panel over an injected [SpeechEngine] and [VoiceDirectory].
///
/// All state lives on the thread that owns the panel. Engine and directory callbacks only queue
/// [PanelEvent]s; they are applied by [SpeechPanel::pump], which the host calls from its event
/// loop.
pub struct SpeechPanel<E, D> {
    engine: E,
    directory: D,
    config: PanelConfig,
    state: PanelState,
    observers: Observers,
    events_tx: Sender<PanelEvent>,
    events_rx: Receiver<PanelEvent>,
    generation: u64,
    outstanding: Option<u64>,
    catalog_notifications: bool,
    mounted_at: Instant,
}

impl<E: SpeechEngine, D: VoiceDirectory> SpeechPanel<E, D> {
    /// Create the panel, subscribe to catalog changes and run the first voice query.
    pub fn mount(engine: E, directory: D, config: PanelConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let mut panel = Self {
            engine,
            directory,
            config,
            state: PanelState::default(),
            observers: Observers::default(),
            events_tx,
            events_rx,
            generation: 0,
            outstanding: None,
            catalog_notifications: false,
            mounted_at: Instant::now(),
        };

        panel.catalog_notifications = panel
            .directory
            .on_catalog_changed(CatalogNotifier::new(panel.events_tx.clone()));
        debug!(
            notifications = panel.catalog_notifications,
            "Speech panel mounted"
        );
        panel.refresh_voices(CatalogTrigger::Mount);
        panel
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn view(&self) -> PanelView {
        self.state.view()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut D {
        &mut self.directory
    }

    /// True while a submitted request has not yet ended, errored or been stopped.
    pub fn is_busy(&self) -> bool {
        self.outstanding.is_some()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&PanelState) + 'static) -> SubscriptionId {
        self.observers.subscribe(Box::new(observer))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.update(|state| state.text = text);
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.update(|state| state.parameters.rate = rate);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.update(|state| state.parameters.pitch = pitch);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.update(|state| state.parameters.volume = volume);
    }

    pub fn set_parameters(&mut self, parameters: SpeechParameters) {
        self.update(|state| state.parameters = parameters);
    }

    pub fn select_voice(&mut self, index: usize) -> Result<(), SelectVoiceError> {
        let len = self.state.voices.len();
        if index >= len {
            return Err(SelectVoiceError { index, len });
        }
        self.update(|state| state.selected_voice = index);
        Ok(())
    }

    /// Submit the draft text with the current voice and parameters.
    ///
    /// Does nothing if the text is blank, voices are still loading, or a previous request is
    /// still in flight. A fault from the engine is logged and leaves the panel idle.
    pub fn speak(&mut self) -> SpeakOutcome {
        if let Err(reason) = self.state.check_speak() {
            debug!(%reason, "Ignoring speak request");
            return SpeakOutcome::Rejected(reason);
        }

        self.generation += 1;
        let generation = self.generation;
        let request = SpeechRequest::new(
            self.state.text.clone(),
            self.state.selected_voice().cloned(),
            self.state.parameters,
        );
        let callbacks = UtteranceCallbacks::new(generation, self.events_tx.clone());

        match self.engine.submit(request, callbacks) {
            Ok(handle) => {
                info!(generation, handle = handle.id(), "Submitted speech request");
                self.outstanding = Some(generation);
                self.update(|state| state.request_pending = true);
                SpeakOutcome::Submitted { generation }
            }
            Err(fault) => {
                error!(generation, %fault, "Speech synthesis failed");
                self.outstanding = None;
                self.set_playback(PlaybackState::Idle);
                SpeakOutcome::Failed(fault)
            }
        }
    }

    /// Cancel whatever the engine is doing and return to idle immediately. Events that the
    /// cancelled request reports afterwards are ignored.
    pub fn stop(&mut self) {
        if let Err(fault) = self.engine.cancel_all() {
            warn!(%fault, "Speech engine failed to cancel");
        }
        if let Some(generation) = self.outstanding.take() {
            info!(generation, "Stopped speech request");
        }
        self.set_playback(PlaybackState::Idle);
    }

    /// Apply queued engine and directory events. Returns how many events were handled.
    pub fn pump(&mut self) -> usize {
        self.engine.poll();

        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }

        if self.state.loading_voices && self.mounted_at.elapsed() >= self.config.voice_load_grace
        {
            info!("No voices reported within the grace period, continuing without voices");
            self.update(|state| state.loading_voices = false);
        }
        handled
    }

    fn handle_event(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::CatalogChanged => self.refresh_voices(CatalogTrigger::Notification),
            PanelEvent::Utterance { generation, event } => {
                if self.outstanding != Some(generation) {
                    debug!(generation, ?event, "Ignoring event from a superseded request");
                    return;
                }
                match event {
                    UtteranceEvent::Started => self.set_playback(PlaybackState::Speaking),
                    UtteranceEvent::Ended => {
                        debug!(generation, "Speech finished");
                        self.outstanding = None;
                        self.set_playback(PlaybackState::Idle);
                    }
                    UtteranceEvent::Errored(message) => {
                        warn!(generation, %message, "Speech engine reported an error");
                        self.outstanding = None;
                        self.set_playback(PlaybackState::Idle);
                    }
                }
            }
        }
    }

    fn refresh_voices(&mut self, trigger: CatalogTrigger) {
        let voices = match self.directory.list_voices() {
            Ok(voices) => voices,
            Err(e) => {
                warn!(error = %e, "Failed to list voices");
                Vec::new()
            }
        };
        let settled = !voices.is_empty()
            || !self.catalog_notifications
            || trigger == CatalogTrigger::Notification;
        info!(count = voices.len(), ?trigger, "Loaded voice catalog");

        self.update(|state| {
            let selected = reconcile_selection(state.selected_voice(), &voices);
            state.selected_voice = selected;
            state.voices = voices;
            if settled {
                state.loading_voices = false;
            }
        });
    }

    /// Any playback report settles the submitted request.
    fn set_playback(&mut self, playback: PlaybackState) {
        self.update(|state| {
            state.playback = playback;
            state.request_pending = false;
        });
    }

    fn update(&mut self, mutate: impl FnOnce(&mut PanelState)) {
        let before = self.state.clone();
        mutate(&mut self.state);
        if self.state != before {
            self.observers.notify(&self.state);
        }
    }
}
