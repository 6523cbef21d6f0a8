//! Named soundscapes
//!
//! A preset is an immutable list of sound specs under a name ("Forest Day",
//! "Cave"). Loading one never mutates it: the mixer copies whatever it
//! needs, so the same preset can be loaded any number of times and always
//! describes the same target.

use serde::{Deserialize, Serialize};

use crate::backend::ClipId;
use crate::mixer::layer::SoundSpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub layers: Vec<SoundSpec>,
}

impl Preset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layers: Vec::new(),
        }
    }

    /// Append a layer (builder style).
    pub fn with_layer(mut self, spec: SoundSpec) -> Self {
        self.layers.push(spec);
        self
    }

    /// Look up a layer by clip identity.
    pub fn layer(&self, clip: &ClipId) -> Option<&SoundSpec> {
        self.layers.iter().find(|spec| &spec.clip == clip)
    }

    pub fn contains(&self, clip: &ClipId) -> bool {
        self.layer(clip).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest() -> Preset {
        Preset::new("Forest Day")
            .with_layer(SoundSpec::new("Wind", "wind.ogg").with_volume(0.6))
            .with_layer(SoundSpec::new("Birds", "birds.ogg").with_volume(0.9))
    }

    #[test]
    fn test_lookup_by_clip() {
        let preset = forest();
        assert_eq!(preset.len(), 2);
        assert!(preset.contains(&"wind.ogg".into()));
        assert!(!preset.contains(&"rain.ogg".into()));

        let birds = preset.layer(&"birds.ogg".into()).unwrap();
        assert_eq!(birds.name, "Birds");
        assert_eq!(birds.params.volume, 0.9);
    }

    #[test]
    fn test_empty_preset_is_a_valid_target() {
        // Loading it just fades everything out.
        let silence = Preset::new("Silence");
        assert!(silence.is_empty());
        assert_eq!(silence.len(), 0);
    }

    #[test]
    fn test_serde_round_trip() {
        let preset = forest();
        let json = serde_json::to_string_pretty(&preset).unwrap();
        let back: Preset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, preset);
    }
}
