/// Bounds and step of a speech parameter slider. The panel never validates against these; front
/// ends use [ParameterRange::clamp] and [ParameterRange::snap] to constrain what the user can
/// enter, the same way a range input would.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub default: f32,
}

impl ParameterRange {
    pub const RATE: Self = Self {
        min: 0.5,
        max: 2.0,
        step: 0.1,
        default: 1.0,
    };
    pub const PITCH: Self = Self {
        min: 0.0,
        max: 2.0,
        step: 0.1,
        default: 1.0,
    };
    pub const VOLUME: Self = Self {
        min: 0.0,
        max: 1.0,
        step: 0.1,
        default: 1.0,
    };

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Clamp the value and round it to the nearest step, counted from `min`.
    pub fn snap(&self, value: f32) -> f32 {
        let steps = ((self.clamp(value) - self.min) / self.step).round();
        // drop float noise such as 0.70000005
        let snapped = ((self.min + steps * self.step) * 1000.0).round() / 1000.0;
        self.clamp(snapped)
    }
}

/// The values applied to the next utterance. Changing them never affects an utterance that is
/// already playing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechParameters {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for SpeechParameters {
    fn default() -> Self {
        Self {
            rate: ParameterRange::RATE.default,
            pitch: ParameterRange::PITCH.default,
            volume: ParameterRange::VOLUME.default,
        }
    }
}

impl SpeechParameters {
    pub fn rate_label(&self) -> String {
        format!("Rate: {}", self.rate)
    }

    pub fn pitch_label(&self) -> String {
        format!("Pitch: {}", self.pitch)
    }

    pub fn volume_label(&self) -> String {
        format!("Volume: {}", self.volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_neutral() {
        let params = SpeechParameters::default();
        assert_eq!(params.rate, 1.0);
        assert_eq!(params.pitch, 1.0);
        assert_eq!(params.volume, 1.0);
    }

    #[test]
    fn clamp_keeps_values_inside_slider_bounds() {
        assert_eq!(ParameterRange::RATE.clamp(0.1), 0.5);
        assert_eq!(ParameterRange::RATE.clamp(3.0), 2.0);
        assert_eq!(ParameterRange::VOLUME.clamp(-1.0), 0.0);
        assert_eq!(ParameterRange::PITCH.clamp(1.3), 1.3);
    }

    #[test]
    fn snap_rounds_to_step() {
        assert!((ParameterRange::RATE.snap(0.73) - 0.7).abs() < 1e-6);
        assert!((ParameterRange::PITCH.snap(1.96) - 2.0).abs() < 1e-6);
        assert_eq!(ParameterRange::VOLUME.snap(5.0), 1.0);
        assert_eq!(ParameterRange::RATE.snap(0.0), 0.5);
    }

    #[test]
    fn labels_print_like_the_sliders() {
        let params = SpeechParameters {
            rate: 0.5,
            pitch: 2.0,
            volume: 1.0,
        };
        assert_eq!(params.rate_label(), "Rate: 0.5");
        assert_eq!(params.pitch_label(), "Pitch: 2");
        assert_eq!(params.volume_label(), "Volume: 1");
    }

    #[test]
    fn contains_is_inclusive() {
        assert!(ParameterRange::RATE.contains(0.5));
        assert!(ParameterRange::RATE.contains(2.0));
        assert!(!ParameterRange::RATE.contains(0.4));
    }
}
