//! Speech engine and voice directory backed by the platform TTS service through the `tts` crate.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use thiserror::Error;
use tracing::{debug, warn};
use tts::{Features, Tts, UtteranceId};

pub use tts::Error as TtsError;

use crate::{
    engine::{RequestHandle, SpeechEngine, SpeechRequest, SubmissionFault, UtteranceCallbacks},
    params::ParameterRange,
    utterances::UtteranceTracker,
    voices::{CatalogNotifier, DirectoryError, Voice, VoiceDirectory},
};

#[derive(Error, Debug)]
pub enum NativeSpeechError {
    #[error("Failed to get TTS")]
    Tts(#[from] TtsError),
    #[error("TTS backend {0} is not available on this platform")]
    BackendUnavailable(&'static str),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NativeBackend {
    #[default]
    Platform,
    SpeechDispatcher,
}

pub fn get_tts(backend: NativeBackend) -> Result<Tts, NativeSpeechError> {
    match backend {
        NativeBackend::Platform => Ok(Tts::default()?),
        #[cfg(target_os = "linux")]
        NativeBackend::SpeechDispatcher => Ok(Tts::new(tts::Backends::SpeechDispatcher)?),
        #[cfg(not(target_os = "linux"))]
        NativeBackend::SpeechDispatcher => {
            Err(NativeSpeechError::BackendUnavailable("speech-dispatcher"))
        }
    }
}

/// Open the backend and split it into the two capabilities the panel consumes.
pub fn open(backend: NativeBackend) -> Result<(NativeEngine, NativeDirectory), NativeSpeechError> {
    let tts = get_tts(backend)?;
    let engine = NativeEngine::new(tts.clone())?;
    Ok((engine, NativeDirectory::new(tts)))
}

type SharedTracker = Arc<Mutex<UtteranceTracker<UtteranceId>>>;

fn lock(tracker: &SharedTracker) -> MutexGuard<'_, UtteranceTracker<UtteranceId>> {
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct NativeEngine {
    tts: Tts,
    features: Features,
    tracker: SharedTracker,
    next_handle: u64,
}

impl NativeEngine {
    pub fn new(tts: Tts) -> Result<Self, NativeSpeechError> {
        let features = tts.supported_features();
        let tracker: SharedTracker = Arc::default();

        if features.utterance_callbacks {
            let shared = tracker.clone();
            tts.on_utterance_begin(Some(Box::new(move |utterance: UtteranceId| {
                lock(&shared).begin(utterance)
            })))?;
            let shared = tracker.clone();
            tts.on_utterance_end(Some(Box::new(move |utterance: UtteranceId| {
                lock(&shared).end(utterance)
            })))?;
            let shared = tracker.clone();
            tts.on_utterance_stop(Some(Box::new(move |utterance: UtteranceId| {
                lock(&shared).end(utterance)
            })))?;
        } else {
            debug!("TTS backend has no utterance callbacks, polling instead");
        }

        Ok(Self {
            tts,
            features,
            tracker,
            next_handle: 0,
        })
    }

    fn apply(&mut self, request: &SpeechRequest) -> Result<(), TtsError> {
        if self.features.rate {
            let rate = to_backend_scale(
                request.rate,
                ParameterRange::RATE,
                self.tts.min_rate(),
                self.tts.normal_rate(),
                self.tts.max_rate(),
            );
            self.tts.set_rate(rate)?;
        }
        if self.features.pitch {
            let pitch = to_backend_scale(
                request.pitch,
                ParameterRange::PITCH,
                self.tts.min_pitch(),
                self.tts.normal_pitch(),
                self.tts.max_pitch(),
            );
            self.tts.set_pitch(pitch)?;
        }
        if self.features.volume {
            let volume = to_backend_scale(
                request.volume,
                ParameterRange::VOLUME,
                self.tts.min_volume(),
                self.tts.normal_volume(),
                self.tts.max_volume(),
            );
            self.tts.set_volume(volume)?;
        }

        if let (Some(wanted), true) = (&request.voice, self.features.voice) {
            match self
                .tts
                .voices()?
                .into_iter()
                .find(|voice| voice.id() == wanted.id)
            {
                Some(voice) => self.tts.set_voice(&voice)?,
                None => warn!(voice = %wanted, "Voice is no longer installed, using current voice"),
            }
        }
        Ok(())
    }
}

impl SpeechEngine for NativeEngine {
    fn submit(
        &mut self,
        request: SpeechRequest,
        callbacks: UtteranceCallbacks,
    ) -> Result<RequestHandle, SubmissionFault> {
        self.apply(&request)
            .map_err(|e| SubmissionFault::Rejected(e.to_string()))?;

        lock(&self.tracker).track(callbacks, Instant::now());

        let utterance = match self.tts.speak(request.text, false) {
            Ok(utterance) => utterance,
            Err(e) => {
                lock(&self.tracker).abandon();
                return Err(SubmissionFault::Rejected(e.to_string()));
            }
        };

        let mut tracker = lock(&self.tracker);
        tracker.assign(utterance);
        if !self.features.utterance_callbacks && !self.features.is_speaking {
            // no way to observe progress
            tracker.complete_now();
        }
        drop(tracker);

        self.next_handle += 1;
        Ok(RequestHandle::new(self.next_handle))
    }

    fn cancel_all(&mut self) -> Result<(), SubmissionFault> {
        if lock(&self.tracker).cancel() {
            debug!("Dropping tracked utterance on cancel");
        }
        if self.features.stop {
            self.tts
                .stop()
                .map_err(|e| SubmissionFault::CancelFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn poll(&mut self) {
        if self.features.utterance_callbacks || !self.features.is_speaking {
            return;
        }
        if !lock(&self.tracker).is_tracking() {
            return;
        }
        let speaking = self.tts.is_speaking().map_err(|e| e.to_string());
        lock(&self.tracker).poll(speaking, Instant::now());
    }
}

pub struct NativeDirectory {
    tts: Tts,
}

impl NativeDirectory {
    pub fn new(tts: Tts) -> Self {
        Self { tts }
    }
}

impl VoiceDirectory for NativeDirectory {
    fn list_voices(&mut self) -> Result<Vec<Voice>, DirectoryError> {
        if !self.tts.supported_features().voice {
            return Ok(Vec::new());
        }
        let voices = self
            .tts
            .voices()
            .map_err(|e| DirectoryError::Query(e.to_string()))?;
        Ok(voices
            .into_iter()
            .map(|voice| Voice::new(voice.id(), voice.name(), voice.language().to_string()))
            .collect())
    }

    fn on_catalog_changed(&mut self, _notifier: CatalogNotifier) -> bool {
        // the tts crate has no voices-changed signal
        false
    }
}

/// Map a panel parameter onto a backend scale, keeping the panel default on the backend's normal
/// value. Values outside the panel range are clamped.
pub(crate) fn to_backend_scale(
    value: f32,
    range: ParameterRange,
    min: f32,
    normal: f32,
    max: f32,
) -> f32 {
    let value = range.clamp(value);
    if value >= range.default {
        if range.max <= range.default {
            return normal;
        }
        normal + (value - range.default) / (range.max - range.default) * (max - normal)
    } else {
        min + (value - range.min) / (range.default - range.min) * (normal - min)
    }
}
