//! Configuration loading and validation
//!
//! A mixer config is a JSON document: startup sounds, named presets, the
//! crossfade duration and the play-on-start flag. Validation runs at load
//! time as well as inside `Mixer::new`, so a mixer can never come up on
//! top of a config that breaks its invariants. Out-of-range values are
//! rejected, not clamped.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{AmbraError, Result};
use crate::mixer::layer::{SoundSpec, MAX_PITCH, MAX_VOLUME, MIN_PITCH, MIN_VOLUME};
use crate::mixer::preset::Preset;

/// Crossfade used when the config does not name one.
pub const DEFAULT_CROSSFADE_SECS: f32 = 3.0;

/// Longest accepted crossfade (one hour). Bounding the value keeps the
/// stored f32 convertible to a std `Duration` everywhere it is exposed.
pub const MAX_CROSSFADE_SECS: f32 = 3600.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerConfig {
    /// Start playing as soon as the mixer is constructed.
    #[serde(default = "default_play_on_start")]
    pub play_on_start: bool,
    /// Crossfade duration in seconds; must be positive.
    #[serde(default = "default_crossfade")]
    pub crossfade_secs: f32,
    /// Layers alive from the moment the mixer starts.
    #[serde(default)]
    pub sounds: Vec<SoundSpec>,
    /// Soundscapes available to `load_song_named`.
    #[serde(default)]
    pub presets: Vec<Preset>,
}

fn default_play_on_start() -> bool {
    true
}

fn default_crossfade() -> f32 {
    DEFAULT_CROSSFADE_SECS
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            play_on_start: default_play_on_start(),
            crossfade_secs: default_crossfade(),
            sounds: Vec::new(),
            presets: Vec::new(),
        }
    }
}

impl MixerConfig {
    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        info!(
            "loaded config {} ({} sound(s), {} preset(s))",
            path.display(),
            config.sounds.len(),
            config.presets.len()
        );
        Ok(config)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Check every invariant the mixer relies on.
    ///
    /// Clip ids must be unique within the startup list and within each
    /// preset (clip identity is the crossfade matching key), base volume
    /// and pitch must sit in their nominal ranges, and the crossfade must
    /// be positive, no longer than [`MAX_CROSSFADE_SECS`].
    pub fn validate(&self) -> Result<()> {
        if !(self.crossfade_secs > 0.0 && self.crossfade_secs <= MAX_CROSSFADE_SECS) {
            return Err(AmbraError::InvalidCrossfade {
                secs: self.crossfade_secs,
                max: MAX_CROSSFADE_SECS,
            });
        }

        check_unique(&self.sounds, "startup sounds")?;
        for spec in &self.sounds {
            check_ranges(spec)?;
        }

        for preset in &self.presets {
            check_unique(&preset.layers, &format!("preset '{}'", preset.name))?;
            for spec in &preset.layers {
                check_ranges(spec)?;
            }
        }
        Ok(())
    }
}

fn check_unique(specs: &[SoundSpec], scope: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for spec in specs {
        if !seen.insert(&spec.clip) {
            return Err(AmbraError::DuplicateClip {
                scope: scope.to_string(),
                clip: spec.clip.to_string(),
            });
        }
    }
    Ok(())
}

fn check_ranges(spec: &SoundSpec) -> Result<()> {
    check_range(spec, "volume", spec.params.volume, MIN_VOLUME, MAX_VOLUME)?;
    check_range(spec, "pitch", spec.params.pitch, MIN_PITCH, MAX_PITCH)?;
    Ok(())
}

fn check_range(spec: &SoundSpec, field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    // NaN fails every comparison, so test for inclusion, not exclusion.
    if !(value >= min && value <= max) {
        return Err(AmbraError::ParameterOutOfRange {
            sound: spec.display_name().to_string(),
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const SAMPLE: &str = r#"{
        "crossfade_secs": 2.5,
        "sounds": [
            { "name": "Wind", "clip": "wind.ogg", "volume": 0.6 }
        ],
        "presets": [
            {
                "name": "Calm",
                "layers": [
                    { "clip": "wind.ogg", "volume": 0.2, "volume_fade_strength": 0.1 }
                ]
            }
        ]
    }"#;

    fn sample() -> MixerConfig {
        serde_json::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = MixerConfig::default();
        assert!(config.play_on_start);
        assert_eq!(config.crossfade_secs, DEFAULT_CROSSFADE_SECS);
        assert!(config.sounds.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_fills_missing_fields() {
        let config = sample();
        assert!(config.play_on_start);
        assert_eq!(config.crossfade_secs, 2.5);
        assert_eq!(config.sounds[0].params.volume, 0.6);
        assert_eq!(config.sounds[0].params.pitch, 1.0);
        assert!(config.sounds[0].looped);
        assert_eq!(config.presets[0].layers[0].params.volume_fade_strength, 0.1);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixer.json");

        let config = sample();
        config.save(&path).unwrap();
        let loaded = MixerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = MixerConfig::load("/no/such/mixer.json").unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }

    #[test]
    fn test_load_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = MixerConfig::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test_case(0.0 ; "zero")]
    #[test_case(-3.0 ; "negative")]
    #[test_case(f32::NAN ; "nan")]
    #[test_case(f32::INFINITY ; "infinite")]
    #[test_case(1e30 ; "absurdly long")]
    fn test_bad_crossfade_is_rejected(secs: f32) {
        let config = MixerConfig {
            crossfade_secs: secs,
            ..MixerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CROSSFADE");
    }

    #[test]
    fn test_crossfade_cap_is_inclusive() {
        let config = MixerConfig {
            crossfade_secs: MAX_CROSSFADE_SECS,
            ..MixerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_clip_in_startup_sounds() {
        let config = MixerConfig {
            sounds: vec![
                SoundSpec::new("Wind A", "wind.ogg"),
                SoundSpec::new("Wind B", "wind.ogg"),
            ],
            ..MixerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_CLIP");
        assert!(err.to_string().contains("startup sounds"));
    }

    #[test]
    fn test_duplicate_clip_in_preset() {
        let config = MixerConfig {
            presets: vec![Preset::new("Storm")
                .with_layer(SoundSpec::new("Rain", "rain.ogg"))
                .with_layer(SoundSpec::new("Rain Again", "rain.ogg"))],
            ..MixerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("preset 'Storm'"));
    }

    #[test]
    fn test_same_clip_in_different_presets_is_fine() {
        let config = MixerConfig {
            presets: vec![
                Preset::new("Day").with_layer(SoundSpec::new("Wind", "wind.ogg")),
                Preset::new("Night").with_layer(SoundSpec::new("Wind", "wind.ogg")),
            ],
            ..MixerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test_case(1.5 ; "above")]
    #[test_case(-0.1 ; "below")]
    fn test_volume_out_of_range(volume: f32) {
        let config = MixerConfig {
            sounds: vec![SoundSpec::new("Wind", "wind.ogg").with_volume(volume)],
            ..MixerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.error_code(), "PARAMETER_OUT_OF_RANGE");
        assert!(err.to_string().contains("volume"));
    }

    #[test_case(3.5 ; "above")]
    #[test_case(-0.5 ; "below")]
    fn test_pitch_out_of_range(pitch: f32) {
        let config = MixerConfig {
            sounds: vec![SoundSpec::new("Wind", "wind.ogg").with_pitch(pitch)],
            ..MixerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pitch"));
    }

    #[test]
    fn test_boundary_values_are_accepted() {
        let config = MixerConfig {
            sounds: vec![
                SoundSpec::new("Silent", "a.ogg").with_volume(0.0).with_pitch(0.0),
                SoundSpec::new("Loud", "b.ogg").with_volume(1.0).with_pitch(3.0),
            ],
            ..MixerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_range_errors_name_the_sound() {
        let config = MixerConfig {
            sounds: vec![SoundSpec::new("Thunder", "thunder.ogg").with_volume(2.0)],
            ..MixerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Thunder"));
    }
}
