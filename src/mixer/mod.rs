//! Mixer core: layers, presets, crossfade transitions and the facade
//!
//! `layer` holds the parameter model and the live layers, `preset` the
//! named targets, `transition` the diff/interpolation machinery, and
//! `controller` ties them together behind the `Mixer` type most callers
//! should start from.

pub mod controller;
pub mod layer;
pub mod preset;
pub mod transition;

pub use controller::{Mixer, PlaybackState};
pub use layer::{SoundLayer, SoundParams, SoundSpec};
pub use layer::{MAX_PITCH, MAX_VOLUME, MIN_PITCH, MIN_VOLUME};
pub use preset::Preset;
pub use transition::{diff, TransitionEngine, TransitionOp, TransitionTask};
