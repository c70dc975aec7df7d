use speech_panel::{PanelView, VoiceStatus};

fn button(label: &str, enabled: bool) -> String {
    if enabled {
        format!("[{label}]")
    } else {
        format!("({label})")
    }
}

/// One-line summary printed whenever the panel changes. Disabled buttons are shown in parentheses.
pub fn status_line(view: &PanelView) -> String {
    let voice = match view.voice_status {
        VoiceStatus::Available => view
            .voice_options
            .get(view.selected_voice)
            .map(|label| format!("Voice: {label}"))
            .unwrap_or_else(|| view.voice_status.to_string()),
        _ => view.voice_status.to_string(),
    };
    format!(
        "{} {} | {} | {} | {} | {}",
        button(view.play_label, view.play_enabled),
        button("Stop", view.stop_enabled),
        voice,
        view.rate_label,
        view.pitch_label,
        view.volume_label,
    )
}

pub fn voice_list(view: &PanelView) -> String {
    if view.voice_status != VoiceStatus::Available {
        return view.voice_status.to_string();
    }
    let mut out = view.voice_status.to_string();
    for (index, label) in view.voice_options.iter().enumerate() {
        let marker = if index == view.selected_voice { '*' } else { ' ' };
        out.push_str(&format!("\n{marker} {index}: {label}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use speech_panel::{PanelState, PlaybackState, Voice};

    use super::*;

    fn state() -> PanelState {
        PanelState {
            text: "hello".to_string(),
            voices: vec![
                Voice::new("alice", "Alice", "en-US"),
                Voice::new("mara", "Mara", "fr-FR"),
            ],
            selected_voice: 1,
            loading_voices: false,
            ..PanelState::default()
        }
    }

    #[test]
    fn ready_panel() {
        assert_eq!(
            status_line(&state().view()),
            "[Play Speech] (Stop) | Voice: Mara (fr-FR) | Rate: 1 | Pitch: 1 | Volume: 1"
        );
    }

    #[test]
    fn speaking_panel() {
        let mut state = state();
        state.playback = PlaybackState::Speaking;
        assert!(status_line(&state.view()).starts_with("(Speaking...) [Stop]"));
    }

    #[test]
    fn loading_and_empty_catalogs() {
        assert!(status_line(&PanelState::default().view()).contains("Loading voices..."));

        let mut state = state();
        state.voices.clear();
        state.selected_voice = 0;
        assert_eq!(voice_list(&state.view()), "No voices available.");
    }

    #[test]
    fn voice_list_marks_selection() {
        assert_eq!(
            voice_list(&state().view()),
            "Select Voice:\n  0: Alice (en-US)\n* 1: Mara (fr-FR)"
        );
    }
}
