//! Ambra - Layered Ambient Music Mixer
//!
//! Ambra builds endless background soundscapes out of two mechanisms:
//! 1. Sound Layers - looping clips whose volume and pitch drift on slow sine waves
//! 2. Preset Crossfading - named soundscapes diffed by clip identity and blended over time
//!
//! # Architecture
//!
//! The mixer is single-threaded and cooperatively driven:
//! - Backend: the host audio runtime behind the `AudioBackend`/`Channel` traits
//! - Mixer core: live layers, presets and the transition engine
//! - Config: JSON documents validated before a mixer comes up
//!
//! Hosts call `Mixer::tick` once per frame with the elapsed time; every
//! other operation is a plain method call in between ticks.

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod mixer;

pub use error::{AmbraError, Result};
