//! Host audio runtime abstraction
//!
//! Ambra never talks to an audio device itself. The embedding application
//! provides an [`AudioBackend`] that can mint playback channels for named
//! clips; the mixer owns the returned [`Channel`] handles and pushes volume,
//! pitch and loop state into them every tick.
//!
//! The whole crate runs on a single-threaded cooperative tick, so neither
//! trait carries `Send`/`Sync` bounds. Backends that bridge to a real audio
//! thread are expected to do their own handoff internally.

pub mod mock;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

pub use mock::{MockBackend, MockChannelState};

// ============================================================================
// Identifiers
// ============================================================================

/// Identity of an underlying audio asset.
///
/// This is the matching key for preset crossfades: two layers that reference
/// the same clip are the same layer, whatever their display names say.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(String);

impl ClipId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClipId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ClipId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque identifier for a playback channel instance.
///
/// Fresh for every channel a backend creates; used to key teardown
/// bookkeeping and to make log lines traceable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(Uuid);

impl ChannelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// A single playback channel owned by the mixer.
///
/// The setters are fire-and-forget: the mixer refreshes them every tick and
/// expects no feedback. Out-of-range values are the host's problem to clamp
/// or reject; the mixer never sanitizes what modulation produces.
pub trait Channel {
    /// Unique id of this channel instance.
    fn id(&self) -> ChannelId;

    /// The clip this channel plays. Stable for the channel's lifetime.
    fn clip(&self) -> &ClipId;

    /// Start playback from the beginning of the clip. Calling this on a
    /// channel that is already playing restarts it.
    fn play(&mut self);

    /// Pause playback. Harmless on a channel that is paused or was never
    /// started.
    fn pause(&mut self);

    fn set_volume(&mut self, volume: f32);

    fn set_pitch(&mut self, pitch: f32);

    fn set_looped(&mut self, looped: bool);
}

/// Channels are host-owned and opaque, so debug output shows only their
/// identity.
impl fmt::Debug for dyn Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id())
            .field("clip", self.clip())
            .finish()
    }
}

/// Factory and graveyard for playback channels.
///
/// Implemented by the embedding application over whatever audio runtime it
/// uses. [`NullBackend`] (headless) and [`MockBackend`] (inspectable, for
/// tests) ship with the crate.
pub trait AudioBackend {
    /// Create a playback channel for `clip`. The channel starts paused and
    /// silent until the mixer configures and starts it.
    fn create_channel(&mut self, clip: &ClipId) -> Result<Box<dyn Channel>>;

    /// Destroy a channel, releasing whatever the host allocated for it.
    ///
    /// Must be safe to call on a channel that was never started. A failure
    /// here is reported but the handle is consumed either way; callers are
    /// expected to log and continue rather than abort their teardown
    /// sequence.
    fn destroy_channel(&mut self, channel: Box<dyn Channel>) -> Result<()>;
}

// ============================================================================
// Null backend
// ============================================================================

/// A backend that produces channels which go nowhere.
///
/// Useful for headless runs (the CLI's `simulate` command) and for embedding
/// the mixer in contexts where audio output is wired up later. Tracks the
/// number of live channels so resource leaks stay visible even without
/// audio.
#[derive(Debug, Default)]
pub struct NullBackend {
    live: usize,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of channels created and not yet destroyed.
    pub fn live_channels(&self) -> usize {
        self.live
    }
}

impl AudioBackend for NullBackend {
    fn create_channel(&mut self, clip: &ClipId) -> Result<Box<dyn Channel>> {
        self.live += 1;
        Ok(Box::new(NullChannel {
            id: ChannelId::new(),
            clip: clip.clone(),
        }))
    }

    fn destroy_channel(&mut self, _channel: Box<dyn Channel>) -> Result<()> {
        self.live = self.live.saturating_sub(1);
        Ok(())
    }
}

/// Channel handed out by [`NullBackend`]: swallows every call.
struct NullChannel {
    id: ChannelId,
    clip: ClipId,
}

impl Channel for NullChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn clip(&self) -> &ClipId {
        &self.clip
    }

    fn play(&mut self) {}

    fn pause(&mut self) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn set_pitch(&mut self, _pitch: f32) {}

    fn set_looped(&mut self, _looped: bool) {}
}

// ============================================================================
// Tests
// ============================================================================
