use std::{fmt, sync::mpsc::Sender};

use thiserror::Error;
use tracing::debug;

use crate::engine::PanelEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Stable identifier from the directory, used to find the voice again after a reload.
    pub id: String,
    pub name: String,
    pub language: String,
}

impl Voice {
    pub fn new(id: impl Into<String>, name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: language.into(),
        }
    }

    /// The label shown in a voice picker, e.g. `Alice (en-US)`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.language)
    }
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Voice directory is unavailable")]
    Unavailable,
    #[error("Failed to list voices: {0}")]
    Query(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Voice index {index} is out of range for a catalog of {len} voices")]
pub struct SelectVoiceError {
    pub index: usize,
    pub len: usize,
}

/// Handed to the directory on mount. The directory calls [CatalogNotifier::notify] whenever its
/// set of voices may have changed; the panel re-queries on its next pump.
#[derive(Debug, Clone)]
pub struct CatalogNotifier {
    events: Sender<PanelEvent>,
}

impl CatalogNotifier {
    pub(crate) fn new(events: Sender<PanelEvent>) -> Self {
        Self { events }
    }

    pub fn notify(&self) {
        if self.events.send(PanelEvent::CatalogChanged).is_err() {
            debug!("Speech panel is gone, dropping catalog notification");
        }
    }
}

/// The host's voice enumeration capability.
pub trait VoiceDirectory {
    fn list_voices(&mut self) -> Result<Vec<Voice>, DirectoryError>;

    /// Register for catalog change notifications. Returns `false` if the directory never
    /// notifies, in which case the first query is final.
    fn on_catalog_changed(&mut self, notifier: CatalogNotifier) -> bool;
}

/// Pick the selection for a freshly loaded catalog: keep the previously selected voice if it is
/// still there, otherwise fall back to the first entry.
pub(crate) fn reconcile_selection(previous: Option<&Voice>, catalog: &[Voice]) -> usize {
    previous
        .and_then(|voice| catalog.iter().position(|v| v.id == voice.id))
        .unwrap_or(0)
}
