//! Mock audio backend for tests
//!
//! Records every channel the mixer creates and destroys and exposes the
//! last values written to each channel. The registry lives behind an `Rc`,
//! so cloning the backend yields a probe that keeps observing after the
//! original is boxed up and handed to the mixer:
//!
//! ```
//! use ambra::backend::MockBackend;
//!
//! let backend = MockBackend::new();
//! let probe = backend.clone();
//! // hand `Box::new(backend)` to a mixer, keep `probe` for assertions
//! assert_eq!(probe.live_count(), 0);
//! ```
//!
//! Failure injection covers both backend edges: creation (fails before a
//! channel exists) and teardown (fails while the channel is being released,
//! which the mixer must survive).

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::backend::{AudioBackend, Channel, ChannelId, ClipId};
use crate::error::{AmbraError, Result};

/// Last observed values of one mock channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockChannelState {
    pub volume: f32,
    pub pitch: f32,
    pub looped: bool,
    pub playing: bool,
    pub play_count: u32,
    pub pause_count: u32,
}

struct MockChannel {
    id: ChannelId,
    clip: ClipId,
    state: Rc<RefCell<MockChannelState>>,
}

impl Channel for MockChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn clip(&self) -> &ClipId {
        &self.clip
    }

    fn play(&mut self) {
        let mut state = self.state.borrow_mut();
        state.playing = true;
        state.play_count += 1;
    }

    fn pause(&mut self) {
        let mut state = self.state.borrow_mut();
        state.playing = false;
        state.pause_count += 1;
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume;
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.state.borrow_mut().pitch = pitch;
    }

    fn set_looped(&mut self, looped: bool) {
        self.state.borrow_mut().looped = looped;
    }
}

#[derive(Default)]
struct MockRegistry {
    live: HashMap<ChannelId, (ClipId, Rc<RefCell<MockChannelState>>)>,
    created: Vec<ClipId>,
    destroyed: Vec<ClipId>,
    fail_create: HashSet<ClipId>,
    fail_teardown: HashSet<ClipId>,
}

/// Shared-registry mock backend. Clones observe the same registry.
#[derive(Clone, Default)]
pub struct MockBackend {
    registry: Rc<RefCell<MockRegistry>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create_channel` fail for this clip.
    pub fn fail_creation_for(&self, clip: impl Into<ClipId>) {
        self.registry.borrow_mut().fail_create.insert(clip.into());
    }

    /// Make `destroy_channel` fail for this clip. The channel is still
    /// consumed, mirroring a host that errors while releasing a voice it
    /// has already invalidated.
    pub fn fail_teardown_for(&self, clip: impl Into<ClipId>) {
        self.registry.borrow_mut().fail_teardown.insert(clip.into());
    }

    /// State handle for the live channel playing `clip`, if any.
    pub fn state_of(&self, clip: &ClipId) -> Option<Rc<RefCell<MockChannelState>>> {
        self.registry
            .borrow()
            .live
            .values()
            .find(|(owner, _)| owner == clip)
            .map(|(_, state)| Rc::clone(state))
    }

    pub fn live_count(&self) -> usize {
        self.registry.borrow().live.len()
    }

    /// How many channels have ever been created for `clip`.
    pub fn created_count(&self, clip: &ClipId) -> usize {
        self.registry
            .borrow()
            .created
            .iter()
            .filter(|c| *c == clip)
            .count()
    }

    /// How many channels have been destroyed for `clip`.
    pub fn destroyed_count(&self, clip: &ClipId) -> usize {
        self.registry
            .borrow()
            .destroyed
            .iter()
            .filter(|c| *c == clip)
            .count()
    }
}

impl AudioBackend for MockBackend {
    fn create_channel(&mut self, clip: &ClipId) -> Result<Box<dyn Channel>> {
        let mut registry = self.registry.borrow_mut();
        if registry.fail_create.contains(clip) {
            return Err(AmbraError::ChannelCreation {
                clip: clip.to_string(),
                reason: "injected creation failure".to_string(),
            });
        }

        let id = ChannelId::new();
        let state = Rc::new(RefCell::new(MockChannelState::default()));
        registry.live.insert(id, (clip.clone(), Rc::clone(&state)));
        registry.created.push(clip.clone());

        Ok(Box::new(MockChannel {
            id,
            clip: clip.clone(),
            state,
        }))
    }

    fn destroy_channel(&mut self, channel: Box<dyn Channel>) -> Result<()> {
        let clip = channel.clip().clone();
        let mut registry = self.registry.borrow_mut();
        registry.live.remove(&channel.id());
        registry.destroyed.push(clip.clone());

        if registry.fail_teardown.contains(&clip) {
            return Err(AmbraError::ChannelTeardown {
                clip: clip.to_string(),
                reason: "injected teardown failure".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(s: &str) -> ClipId {
        ClipId::new(s)
    }

    #[test]
    fn test_create_registers_a_live_channel() {
        let mut backend = MockBackend::new();
        let channel = backend.create_channel(&clip("rain")).unwrap();
        assert_eq!(channel.clip(), &clip("rain"));
        assert_eq!(backend.live_count(), 1);
        assert_eq!(backend.created_count(&clip("rain")), 1);
        assert!(backend.state_of(&clip("rain")).is_some());
    }

    #[test]
    fn test_channel_writes_are_visible_through_the_registry() {
        let mut backend = MockBackend::new();
        let mut channel = backend.create_channel(&clip("rain")).unwrap();

        channel.play();
        channel.set_volume(0.25);
        channel.set_pitch(1.5);
        channel.set_looped(true);

        let state = backend.state_of(&clip("rain")).unwrap();
        let state = state.borrow();
        assert!(state.playing);
        assert_eq!(state.play_count, 1);
        assert_eq!(state.volume, 0.25);
        assert_eq!(state.pitch, 1.5);
        assert!(state.looped);
    }

    #[test]
    fn test_clones_share_the_registry() {
        let mut backend = MockBackend::new();
        let probe = backend.clone();

        backend.create_channel(&clip("rain")).unwrap();
        assert_eq!(probe.live_count(), 1);
        assert_eq!(probe.created_count(&clip("rain")), 1);
    }

    #[test]
    fn test_destroy_unregisters() {
        let mut backend = MockBackend::new();
        let channel = backend.create_channel(&clip("rain")).unwrap();
        backend.destroy_channel(channel).unwrap();

        assert_eq!(backend.live_count(), 0);
        assert_eq!(backend.destroyed_count(&clip("rain")), 1);
        assert!(backend.state_of(&clip("rain")).is_none());
    }

    #[test]
    fn test_state_handle_survives_destruction() {
        let mut backend = MockBackend::new();
        let mut channel = backend.create_channel(&clip("rain")).unwrap();
        channel.set_volume(0.7);

        let state = backend.state_of(&clip("rain")).unwrap();
        backend.destroy_channel(channel).unwrap();

        // The held handle still shows the last written values.
        assert_eq!(state.borrow().volume, 0.7);
    }

    #[test]
    fn test_injected_creation_failure() {
        let mut backend = MockBackend::new();
        backend.fail_creation_for("rain");

        let err = backend.create_channel(&clip("rain")).unwrap_err();
        assert_eq!(err.error_code(), "CHANNEL_CREATION");
        assert_eq!(backend.live_count(), 0);
        assert_eq!(backend.created_count(&clip("rain")), 0);
    }

    #[test]
    fn test_teardown_failure_still_consumes_the_channel() {
        let mut backend = MockBackend::new();
        backend.fail_teardown_for("rain");

        let channel = backend.create_channel(&clip("rain")).unwrap();
        let err = backend.destroy_channel(channel).unwrap_err();

        assert!(err.is_recoverable());
        assert_eq!(backend.live_count(), 0);
        assert_eq!(backend.destroyed_count(&clip("rain")), 1);
    }

    #[test]
    fn test_pause_counts() {
        let mut backend = MockBackend::new();
        let mut channel = backend.create_channel(&clip("rain")).unwrap();

        channel.play();
        channel.play();
        channel.pause();

        let state = backend.state_of(&clip("rain")).unwrap();
        assert_eq!(state.borrow().play_count, 2);
        assert_eq!(state.borrow().pause_count, 1);
        assert!(!state.borrow().playing);
    }
}
