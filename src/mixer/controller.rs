//! The mixer facade
//!
//! Owns the live layers, the playback state machine, the transition engine
//! and the audio backend, and exposes the whole system as a handful of
//! small operations. Hosts drive it cooperatively: call `tick` once per
//! frame with the elapsed time, call everything else whenever the user or
//! game logic asks for it. Nothing here spawns threads or blocks.

use std::fmt;
use std::time::Duration;

use log::{debug, info, warn};

use crate::backend::{AudioBackend, ClipId};
use crate::config::{MixerConfig, MAX_CROSSFADE_SECS};
use crate::error::{AmbraError, Result};
use crate::mixer::layer::{SoundLayer, SoundParams, SoundSpec};
use crate::mixer::preset::Preset;
use crate::mixer::transition::{diff, TransitionEngine, TransitionOp, TransitionTask};

// ============================================================================
// Playback state
// ============================================================================

/// Coarse transport state. There is no paused-vs-stopped distinction:
/// layers are looping beds, so resuming and restarting sound the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "stopped"),
            PlaybackState::Playing => write!(f, "playing"),
        }
    }
}

// ============================================================================
// Mixer
// ============================================================================

/// Layered ambient mixer with preset crossfading.
pub struct Mixer {
    layers: Vec<SoundLayer>,
    presets: Vec<Preset>,
    engine: TransitionEngine,
    state: PlaybackState,
    clock: f64,
    backend: Box<dyn AudioBackend>,
}

impl Mixer {
    /// Build a mixer from a validated configuration.
    ///
    /// Creates a channel for every startup sound and, when the config says
    /// so, starts playing straight away. A channel that cannot be created
    /// at this point fails the whole constructor: a mixer that comes up
    /// missing layers is harder to debug than one that refuses to start.
    /// Channels created before the failure are handed back to the backend.
    pub fn new(config: MixerConfig, backend: Box<dyn AudioBackend>) -> Result<Self> {
        config.validate()?;
        let MixerConfig {
            play_on_start,
            crossfade_secs,
            sounds,
            presets,
        } = config;

        let mut mixer = Self {
            layers: Vec::new(),
            presets,
            engine: TransitionEngine::new(crossfade_secs),
            state: PlaybackState::Stopped,
            clock: 0.0,
            backend,
        };

        for spec in &sounds {
            if let Err(err) = mixer.add_layer(spec) {
                // An aborted constructor must not strand host channels.
                while let Some(mut layer) = mixer.layers.pop() {
                    mixer.release_channel(&mut layer);
                }
                return Err(err);
            }
        }

        info!(
            "mixer up: {} layer(s), {} preset(s), {:.1}s crossfade",
            mixer.layers.len(),
            mixer.presets.len(),
            mixer.engine.duration()
        );

        if play_on_start {
            mixer.play();
        }
        Ok(mixer)
    }

    // ------------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------------

    /// Start playback on every layer. Does nothing while already playing,
    /// so repeated calls never restart clips mid-loop.
    pub fn play(&mut self) {
        if self.state.is_playing() {
            debug!("play ignored: already playing");
            return;
        }
        for layer in &mut self.layers {
            layer.play();
        }
        self.state = PlaybackState::Playing;
        info!("playback started ({} layer(s))", self.layers.len());
    }

    /// Pause every layer. Does nothing while already stopped.
    pub fn pause(&mut self) {
        if !self.state.is_playing() {
            debug!("pause ignored: already stopped");
            return;
        }
        for layer in &mut self.layers {
            layer.pause();
        }
        self.state = PlaybackState::Stopped;
        info!("playback paused");
    }

    /// Flip between playing and stopped.
    pub fn toggle(&mut self) {
        if self.state.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Restart every clip from the beginning, regardless of current state.
    pub fn restart(&mut self) {
        for layer in &mut self.layers {
            layer.play();
        }
        self.state = PlaybackState::Playing;
        info!("playback restarted");
    }

    // ------------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------------

    /// Advance the mixer by `dt`: the single per-frame entry point.
    ///
    /// Order matters. The clock moves first, then transitions write their
    /// interpolated parameters, then finished fade-outs retire their
    /// layers, and finally every surviving channel receives this tick's
    /// effective volume, pitch and loop flag.
    pub fn tick(&mut self, dt: Duration) {
        self.clock += dt.as_secs_f64();

        let finished = self.engine.step(dt.as_secs_f32(), &mut self.layers);
        for clip in finished {
            self.remove_layer(&clip);
        }

        for layer in &mut self.layers {
            layer.refresh(self.clock);
        }
    }

    // ------------------------------------------------------------------------
    // Soundscape switching
    // ------------------------------------------------------------------------

    /// Crossfade from whatever is playing toward `target`.
    ///
    /// Shared clips are retargeted in place, new clips fade in from
    /// silence (already audible mid-fade when the mixer is playing) and
    /// clips absent from the target fade out and are removed on landing.
    /// Playback state is untouched: a stopped mixer crossfades silently.
    ///
    /// A clip whose channel cannot be created is skipped with a warning
    /// rather than aborting the rest of the crossfade.
    pub fn load_song(&mut self, target: &Preset) {
        let current: Vec<ClipId> = self.layers.iter().map(|layer| layer.clip.clone()).collect();
        let ops = diff(&current, target);
        info!(
            "crossfade to '{}': {} op(s) over {:.1}s",
            target.name,
            ops.len(),
            self.engine.duration()
        );
        for op in ops {
            self.apply(op);
        }
    }

    /// Crossfade to one of the registered presets by name.
    pub fn load_song_named(&mut self, name: &str) -> Result<()> {
        // Cloning releases the borrow on the preset list before load_song
        // needs the mixer mutably.
        let preset = self
            .presets
            .iter()
            .find(|preset| preset.name == name)
            .cloned()
            .ok_or_else(|| AmbraError::UnknownPreset {
                name: name.to_string(),
            })?;
        self.load_song(&preset);
        Ok(())
    }

    fn apply(&mut self, op: TransitionOp) {
        match op {
            TransitionOp::Retarget { spec } => {
                let Some(layer) = self.layers.iter_mut().find(|layer| layer.clip == spec.clip)
                else {
                    return;
                };
                let start = layer.params;
                // The loop flag is not interpolable; it flips up front.
                layer.looped = spec.looped;
                debug!(
                    "retarget {}: volume {:.2} -> {:.2}",
                    spec.clip, start.volume, spec.params.volume
                );
                self.engine.retarget(spec.clip, start, spec.params);
            }
            TransitionOp::Introduce { spec } => {
                if self.layers.iter().any(|layer| layer.clip == spec.clip) {
                    // Duplicate clip inside one target; later entries act
                    // as retargets so the last one wins.
                    self.apply(TransitionOp::Retarget { spec });
                    return;
                }
                let target = spec.params;
                let mut muted = spec;
                muted.params = SoundParams::muted(target.pitch);
                match self.add_layer(&muted) {
                    Ok(()) => {
                        if self.state.is_playing() {
                            if let Some(layer) = self.layers.last_mut() {
                                layer.play();
                            }
                        }
                        debug!(
                            "introduce {} fading to volume {:.2}",
                            muted.clip, target.volume
                        );
                        self.engine.retarget(muted.clip.clone(), muted.params, target);
                    }
                    Err(err) => warn!("cannot introduce {}: {}", muted.clip, err),
                }
            }
            TransitionOp::FadeOut { clip } => {
                let Some(layer) = self.layers.iter().find(|layer| layer.clip == clip) else {
                    return;
                };
                let start = layer.params;
                debug!("fade out {}", clip);
                self.engine.fade_out(clip, start);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Layer management
    // ------------------------------------------------------------------------

    /// Remove a layer immediately, without a fade. Cancels any in-flight
    /// task for it first. Returns whether the clip had a layer.
    pub fn remove_sound(&mut self, clip: &ClipId) -> bool {
        self.engine.cancel(clip);
        let present = self.layers.iter().any(|layer| &layer.clip == clip);
        if present {
            self.remove_layer(clip);
        }
        present
    }

    /// Mutate a layer's parameters in place (live slider tweaking).
    ///
    /// Returns false when the clip has no layer. An active transition for
    /// the same clip overwrites the change on the next tick.
    pub fn update_params(&mut self, clip: &ClipId, update: impl FnOnce(&mut SoundParams)) -> bool {
        match self.layers.iter_mut().find(|layer| &layer.clip == clip) {
            Some(layer) => {
                update(&mut layer.params);
                true
            }
            None => false,
        }
    }

    /// Set a layer's loop flag. Returns false when the clip has no layer.
    pub fn set_looped(&mut self, clip: &ClipId, looped: bool) -> bool {
        match self.layers.iter_mut().find(|layer| &layer.clip == clip) {
            Some(layer) => {
                layer.looped = looped;
                true
            }
            None => false,
        }
    }

    fn add_layer(&mut self, spec: &SoundSpec) -> Result<()> {
        let mut layer = SoundLayer::from_spec(spec);
        layer.channel = Some(self.backend.create_channel(&layer.clip)?);
        layer.refresh(self.clock);
        debug!("layer added: {} ({})", layer.display_name(), layer.clip);
        self.layers.push(layer);
        Ok(())
    }

    fn remove_layer(&mut self, clip: &ClipId) {
        let Some(index) = self.layers.iter().position(|layer| &layer.clip == clip) else {
            return;
        };
        let mut layer = self.layers.remove(index);
        info!("layer retired: {}", layer.display_name());
        self.release_channel(&mut layer);
    }

    /// Destroy a layer's channel, if it has one. Teardown failures are
    /// recoverable: the layer is gone either way, the host just could not
    /// release it cleanly.
    fn release_channel(&mut self, layer: &mut SoundLayer) {
        if let Some(channel) = layer.channel.take() {
            if let Err(err) = self.backend.destroy_channel(channel) {
                warn!("channel teardown failed for {}: {}", layer.clip, err);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// True while any crossfade task is still running.
    pub fn is_transitioning(&self) -> bool {
        self.engine.is_active()
    }

    /// Mixer time in seconds: the sum of all tick deltas, never reset.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn layers(&self) -> &[SoundLayer] {
        &self.layers
    }

    pub fn layer(&self, clip: &ClipId) -> Option<&SoundLayer> {
        self.layers.iter().find(|layer| &layer.clip == clip)
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|preset| preset.name == name)
    }

    /// The in-flight crossfade tasks.
    pub fn transitions(&self) -> &[TransitionTask] {
        self.engine.tasks()
    }

    /// Duration applied to crossfades started from now on.
    pub fn crossfade(&self) -> Duration {
        Duration::from_secs_f32(self.engine.duration())
    }

    /// Change the crossfade duration for future transitions. Zero and
    /// durations past [`MAX_CROSSFADE_SECS`] are rejected; in-flight tasks
    /// keep their original timing.
    pub fn set_crossfade(&mut self, duration: Duration) -> Result<()> {
        let secs = duration.as_secs_f32();
        if !(secs > 0.0 && secs <= MAX_CROSSFADE_SECS) {
            return Err(AmbraError::InvalidCrossfade {
                secs,
                max: MAX_CROSSFADE_SECS,
            });
        }
        self.engine.set_duration(secs);
        Ok(())
    }
}

/// The audio backend is opaque, so debug output covers only the
/// mixer-side state.
impl fmt::Debug for Mixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixer")
            .field("state", &self.state)
            .field("clock", &self.clock)
            .field("layer_count", &self.layers.len())
            .field("preset_count", &self.presets.len())
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
