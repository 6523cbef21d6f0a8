//! Sound layers and their modulation parameters
//!
//! A layer is one looping audio clip with a base volume/pitch and an
//! optional sinusoidal fluctuation on top of each ("rhythmic fading"):
//!
//! ```text
//! effective_volume = volume + volume_fade_strength * sin(volume_fade_frequency * t)
//! effective_pitch  = pitch  + pitch_fade_strength  * sin(pitch_fade_frequency  * t)
//! ```
//!
//! where `t` is the mixer clock in seconds: one monotonic clock shared by
//! all layers, never reset, so modulation stays phase-continuous across
//! crossfades.

use serde::{Deserialize, Serialize};

use crate::backend::{Channel, ChannelId, ClipId};

// ============================================================================
// Constants
// ============================================================================

/// Nominal range for base volume.
pub const MIN_VOLUME: f32 = 0.0;
pub const MAX_VOLUME: f32 = 1.0;

/// Nominal range for base pitch (1.0 = unshifted playback).
pub const MIN_PITCH: f32 = 0.0;
pub const MAX_PITCH: f32 = 3.0;

// ============================================================================
// Modulation parameters
// ============================================================================

/// The six crossfade-interpolated parameters of a layer.
///
/// `volume` and `pitch` are base values; each fade pair describes a sine
/// fluctuation applied on top (strength = amplitude, frequency = angular
/// frequency in rad/s). All fields are plain floats and every operation on
/// them is total: extreme values produce extreme audio parameters, and it is
/// the host channel's job to clamp if it must.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundParams {
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_pitch")]
    pub pitch: f32,
    #[serde(default)]
    pub volume_fade_strength: f32,
    #[serde(default)]
    pub volume_fade_frequency: f32,
    #[serde(default)]
    pub pitch_fade_strength: f32,
    #[serde(default)]
    pub pitch_fade_frequency: f32,
}

fn default_volume() -> f32 {
    1.0
}

fn default_pitch() -> f32 {
    1.0
}

impl Default for SoundParams {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            pitch: default_pitch(),
            volume_fade_strength: 0.0,
            volume_fade_frequency: 0.0,
            pitch_fade_strength: 0.0,
            pitch_fade_frequency: 0.0,
        }
    }
}

impl SoundParams {
    /// Silence at the given pitch: volume 0, no fluctuation.
    ///
    /// Used as the destination when fading a layer out and as the starting
    /// point when fading a new layer in. Pitch is carried through unchanged
    /// so a crossfade never drags it toward zero (which would be an audible
    /// downward glide, not a fade).
    pub fn muted(pitch: f32) -> Self {
        Self {
            volume: 0.0,
            pitch,
            volume_fade_strength: 0.0,
            volume_fade_frequency: 0.0,
            pitch_fade_strength: 0.0,
            pitch_fade_frequency: 0.0,
        }
    }

    /// Instantaneous volume at mixer time `t` (seconds).
    ///
    /// The sine phase is accumulated in f64: `t` grows without bound and
    /// f32 phase would drift audibly after a few hours.
    pub fn effective_volume(&self, t: f64) -> f32 {
        self.volume + self.volume_fade_strength * (self.volume_fade_frequency as f64 * t).sin() as f32
    }

    /// Instantaneous pitch at mixer time `t` (seconds).
    pub fn effective_pitch(&self, t: f64) -> f32 {
        self.pitch + self.pitch_fade_strength * (self.pitch_fade_frequency as f64 * t).sin() as f32
    }

    /// Linear interpolation of every field, `t` in [0, 1].
    ///
    /// Deliberately not eased. Callers that need exact endpoint values
    /// assign the target directly instead of trusting `lerp(_, _, 1.0)` to
    /// round-trip through float arithmetic.
    pub fn lerp(start: &Self, target: &Self, t: f32) -> Self {
        Self {
            volume: lerp(start.volume, target.volume, t),
            pitch: lerp(start.pitch, target.pitch, t),
            volume_fade_strength: lerp(
                start.volume_fade_strength,
                target.volume_fade_strength,
                t,
            ),
            volume_fade_frequency: lerp(
                start.volume_fade_frequency,
                target.volume_fade_frequency,
                t,
            ),
            pitch_fade_strength: lerp(start.pitch_fade_strength, target.pitch_fade_strength, t),
            pitch_fade_frequency: lerp(start.pitch_fade_frequency, target.pitch_fade_frequency, t),
        }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

// ============================================================================
// Sound specs (pure data)
// ============================================================================

/// Pure-data snapshot of a layer: what configs and presets are made of.
///
/// Never owns a playback resource. `name` exists for logging and display
/// only; matching between presets is by `clip`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundSpec {
    #[serde(default)]
    pub name: String,
    pub clip: ClipId,
    #[serde(flatten)]
    pub params: SoundParams,
    #[serde(default = "default_looped", rename = "loop")]
    pub looped: bool,
}

fn default_looped() -> bool {
    true
}

impl SoundSpec {
    pub fn new(name: impl Into<String>, clip: impl Into<ClipId>) -> Self {
        Self {
            name: name.into(),
            clip: clip.into(),
            params: SoundParams::default(),
            looped: true,
        }
    }

    /// Set the base volume (builder style).
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.params.volume = volume;
        self
    }

    /// Set the base pitch (builder style).
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.params.pitch = pitch;
        self
    }

    /// Replace the whole parameter set (builder style).
    pub fn with_params(mut self, params: SoundParams) -> Self {
        self.params = params;
        self
    }

    /// Name to show in logs: the display name, or the clip id when unnamed.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.clip.as_str()
        } else {
            &self.name
        }
    }
}

// ============================================================================
// Live layers
// ============================================================================

/// A live, mixer-owned layer: spec data plus the playback channel handle.
///
/// The channel is exclusively owned. Only the mixer attaches or releases it;
/// transitions touch nothing but `params`.
pub struct SoundLayer {
    pub name: String,
    pub clip: ClipId,
    pub params: SoundParams,
    pub looped: bool,
    pub(crate) channel: Option<Box<dyn Channel>>,
}

impl SoundLayer {
    /// Build a live layer from pure data. No channel yet; the mixer
    /// attaches one before the layer is first heard.
    pub fn from_spec(spec: &SoundSpec) -> Self {
        Self {
            name: spec.name.clone(),
            clip: spec.clip.clone(),
            params: spec.params,
            looped: spec.looped,
            channel: None,
        }
    }

    /// Name to show in logs: the display name, or the clip id when unnamed.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.clip.as_str()
        } else {
            &self.name
        }
    }

    pub fn effective_volume(&self, t: f64) -> f32 {
        self.params.effective_volume(t)
    }

    pub fn effective_pitch(&self, t: f64) -> f32 {
        self.params.effective_pitch(t)
    }

    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    pub fn channel_id(&self) -> Option<ChannelId> {
        self.channel.as_ref().map(|ch| ch.id())
    }

    /// Start (or restart) the underlying channel, if one is attached.
    pub(crate) fn play(&mut self) {
        if let Some(channel) = &mut self.channel {
            channel.play();
        }
    }

    /// Pause the underlying channel, if one is attached.
    pub(crate) fn pause(&mut self) {
        if let Some(channel) = &mut self.channel {
            channel.pause();
        }
    }

    /// Push current effective values (and the loop flag) into the channel.
    ///
    /// Runs every tick whether or not a transition is active, so modulation
    /// keeps moving smoothly through crossfades.
    pub(crate) fn refresh(&mut self, t: f64) {
        if let Some(channel) = &mut self.channel {
            channel.set_volume(self.params.effective_volume(t));
            channel.set_pitch(self.params.effective_pitch(t));
            channel.set_looped(self.looped);
        }
    }

    /// Snapshot back to pure data (drops the channel handle).
    pub fn snapshot(&self) -> SoundSpec {
        SoundSpec {
            name: self.name.clone(),
            clip: self.clip.clone(),
            params: self.params,
            looped: self.looped,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
