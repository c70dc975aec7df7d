use std::fmt;

use thiserror::Error;

use crate::{params::SpeechParameters, voices::Voice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Speaking,
}

/// What the user can observe: voices still loading, ready to play, or speaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    LoadingVoices,
    Ready,
    Speaking,
}

/// Why a call to speak was turned into a no-op.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakRejection {
    #[error("Nothing to say")]
    EmptyText,
    #[error("Voices are still loading")]
    LoadingVoices,
    #[error("Already speaking")]
    AlreadySpeaking,
    #[error("A request is waiting for the engine to start")]
    RequestPending,
}

/// Snapshot of everything the panel holds. Observers receive a reference to it after every
/// change.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    pub text: String,
    pub voices: Vec<Voice>,
    pub selected_voice: usize,
    pub parameters: SpeechParameters,
    pub playback: PlaybackState,
    /// Submitted to the engine, which has not reported a start yet.
    pub request_pending: bool,
    pub loading_voices: bool,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            text: String::new(),
            voices: Vec::new(),
            selected_voice: 0,
            parameters: SpeechParameters::default(),
            playback: PlaybackState::Idle,
            request_pending: false,
            loading_voices: true,
        }
    }
}

impl PanelState {
    pub fn phase(&self) -> PanelPhase {
        if self.playback == PlaybackState::Speaking {
            PanelPhase::Speaking
        } else if self.loading_voices {
            PanelPhase::LoadingVoices
        } else {
            PanelPhase::Ready
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.playback == PlaybackState::Speaking
    }

    /// The voice the next request will use, or `None` while the catalog is empty.
    pub fn selected_voice(&self) -> Option<&Voice> {
        self.voices.get(self.selected_voice)
    }

    /// Checks the preconditions of the play action that live in the snapshot.
    pub fn check_speak(&self) -> Result<(), SpeakRejection> {
        if self.text.trim().is_empty() {
            return Err(SpeakRejection::EmptyText);
        }
        if self.loading_voices {
            return Err(SpeakRejection::LoadingVoices);
        }
        if self.is_speaking() {
            return Err(SpeakRejection::AlreadySpeaking);
        }
        if self.request_pending {
            return Err(SpeakRejection::RequestPending);
        }
        Ok(())
    }

    pub fn view(&self) -> PanelView {
        let voice_status = if self.loading_voices {
            VoiceStatus::Loading
        } else if self.voices.is_empty() {
            VoiceStatus::NoVoices
        } else {
            VoiceStatus::Available
        };

        PanelView {
            play_enabled: self.check_speak().is_ok(),
            stop_enabled: self.is_speaking() || self.request_pending,
            play_label: if self.is_speaking() {
                "Speaking..."
            } else {
                "Play Speech"
            },
            voice_status,
            voice_options: self.voices.iter().map(Voice::label).collect(),
            selected_voice: self.selected_voice,
            rate_label: self.parameters.rate_label(),
            pitch_label: self.parameters.pitch_label(),
            volume_label: self.parameters.volume_label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStatus {
    Loading,
    NoVoices,
    Available,
}

impl fmt::Display for VoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceStatus::Loading => write!(f, "Loading voices..."),
            VoiceStatus::NoVoices => write!(f, "No voices available."),
            VoiceStatus::Available => write!(f, "Select Voice:"),
        }
    }
}

/// Render-ready description of the panel, derived from a [PanelState].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub play_enabled: bool,
    pub stop_enabled: bool,
    pub play_label: &'static str,
    pub voice_status: VoiceStatus,
    pub voice_options: Vec<String>,
    pub selected_voice: usize,
    pub rate_label: String,
    pub pitch_label: String,
    pub volume_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&PanelState)>;

#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Observer)>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn notify(&mut self, state: &PanelState) {
        for (_, observer) in self.entries.iter_mut() {
            observer(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    fn ready(text: &str) -> PanelState {
        PanelState {
            text: text.to_string(),
            loading_voices: false,
            ..PanelState::default()
        }
    }

    #[test]
    fn whitespace_text_disables_play() {
        for text in ["", " ", "\n\t  ", "\u{3000}"] {
            let view = ready(text).view();
            assert!(!view.play_enabled, "play enabled for {text:?}");
        }
    }

    #[test]
    fn play_enabled_once_ready_and_idle() {
        let mut state = ready("hello");
        assert!(state.view().play_enabled);

        state.playback = PlaybackState::Speaking;
        let view = state.view();
        assert!(!view.play_enabled);
        assert!(view.stop_enabled);
        assert_eq!(view.play_label, "Speaking...");

        state.playback = PlaybackState::Idle;
        state.loading_voices = true;
        assert!(!state.view().play_enabled);
        assert_eq!(state.check_speak(), Err(SpeakRejection::LoadingVoices));
    }

    #[test]
    fn pending_request_disables_play() {
        let mut state = ready("hello");
        state.request_pending = true;
        let view = state.view();
        assert!(!view.play_enabled);
        assert!(view.stop_enabled);
        assert_eq!(view.play_label, "Play Speech");
        assert_eq!(state.check_speak(), Err(SpeakRejection::RequestPending));
    }

    #[test]
    fn phase_reflects_loading_and_playback() {
        let mut state = PanelState::default();
        assert_eq!(state.phase(), PanelPhase::LoadingVoices);
        state.loading_voices = false;
        assert_eq!(state.phase(), PanelPhase::Ready);
        state.playback = PlaybackState::Speaking;
        assert_eq!(state.phase(), PanelPhase::Speaking);
    }

    #[test]
    fn voice_status_messages() {
        assert_eq!(PanelState::default().view().voice_status.to_string(), "Loading voices...");
        let mut state = ready("");
        assert_eq!(state.view().voice_status, VoiceStatus::NoVoices);
        assert_eq!(VoiceStatus::NoVoices.to_string(), "No voices available.");

        state.voices = vec![Voice::new("kenji", "Kenji", "ja-JP")];
        let view = state.view();
        assert_eq!(view.voice_status, VoiceStatus::Available);
        assert_eq!(view.voice_options, vec!["Kenji (ja-JP)".to_string()]);
    }

    #[test]
    fn observers_can_unsubscribe() {
        let seen = Rc::new(RefCell::new(0));
        let mut observers = Observers::default();
        let counter = seen.clone();
        let id = observers.subscribe(Box::new(move |_| *counter.borrow_mut() += 1));

        observers.notify(&PanelState::default());
        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        observers.notify(&PanelState::default());

        assert_eq!(*seen.borrow(), 1);
    }
}
