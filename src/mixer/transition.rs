//! Crossfade transitions between soundscapes
//!
//! Switching presets never cuts audio. Instead the current layer set is
//! diffed against the target by clip identity and every difference becomes
//! a timed interpolation task:
//!
//! - clip in both: retarget the existing layer's parameters
//! - clip only in the target: introduce a new layer, faded in from silence
//! - clip only in the current set: fade the layer out, then remove it
//!
//! `diff` is a pure function from identities to operations; applying the
//! operations (creating layers, spawning tasks) is the mixer's job. Tasks
//! are plain data stepped once per tick, not callbacks, so the whole
//! transition state can be inspected at any moment.

use std::fmt;

use crate::backend::ClipId;
use crate::mixer::layer::{SoundLayer, SoundParams, SoundSpec};
use crate::mixer::preset::Preset;

/// Floor for task durations. A shorter crossfade is indistinguishable from
/// an instant switch and would make the progress divide unsafe.
const MIN_DURATION: f32 = 1e-6;

// ============================================================================
// Diff
// ============================================================================

/// One difference between the current layer set and a target preset.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOp {
    /// Clip exists on both sides: animate the live layer toward the target
    /// parameters and adopt the target's loop flag.
    Retarget { spec: SoundSpec },
    /// Clip exists only in the target: add it muted and fade it in.
    Introduce { spec: SoundSpec },
    /// Clip exists only in the current set: fade it to silence, then drop it.
    FadeOut { clip: ClipId },
}

impl fmt::Display for TransitionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionOp::Retarget { spec } => write!(
                f,
                "~ {} -> volume {:.2}, pitch {:.2}",
                spec.clip, spec.params.volume, spec.params.pitch
            ),
            TransitionOp::Introduce { spec } => {
                write!(f, "+ {} (volume {:.2})", spec.clip, spec.params.volume)
            }
            TransitionOp::FadeOut { clip } => write!(f, "- {}", clip),
        }
    }
}

/// Compute the operations that carry `current` over to `target`.
///
/// Every clip on either side lands in exactly one operation. Retargets and
/// introductions come out in target order, fade-outs in current order, so
/// the result is deterministic for a given input.
pub fn diff(current: &[ClipId], target: &Preset) -> Vec<TransitionOp> {
    let mut ops = Vec::with_capacity(current.len() + target.len());

    for spec in &target.layers {
        if current.contains(&spec.clip) {
            ops.push(TransitionOp::Retarget { spec: spec.clone() });
        } else {
            ops.push(TransitionOp::Introduce { spec: spec.clone() });
        }
    }

    for clip in current {
        if !target.contains(clip) {
            ops.push(TransitionOp::FadeOut { clip: clip.clone() });
        }
    }

    ops
}

// ============================================================================
// Interpolation tasks
// ============================================================================

/// A single in-flight parameter ramp for one layer.
///
/// Start and target are captured once when the task spawns; progress is
/// `elapsed / duration`, so interpolation is stateless in between and a
/// task is trivially replayable from its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTask {
    clip: ClipId,
    start: SoundParams,
    target: SoundParams,
    duration: f32,
    elapsed: f32,
    fade_out: bool,
}

impl TransitionTask {
    pub fn clip(&self) -> &ClipId {
        &self.clip
    }

    pub fn target(&self) -> &SoundParams {
        &self.target
    }

    /// Completed fraction in [0, 1].
    pub fn progress(&self) -> f32 {
        (self.elapsed / self.duration).min(1.0)
    }

    /// True when the task ends with the layer's removal.
    pub fn is_fade_out(&self) -> bool {
        self.fade_out
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Owns the active interpolation tasks and steps them against the live
/// layer set.
///
/// At most one task per clip: spawning a new task for a clip that already
/// has one cancels the old task first, and the new start is captured from
/// wherever the parameters currently are. Rapid preset switching therefore
/// stays continuous (no jump back to a stale snapshot) and the task list
/// cannot grow past the layer count.
#[derive(Debug)]
pub struct TransitionEngine {
    tasks: Vec<TransitionTask>,
    duration: f32,
}

impl TransitionEngine {
    /// Engine whose future tasks run for `duration` seconds each.
    pub fn new(duration: f32) -> Self {
        Self {
            tasks: Vec::new(),
            duration: duration.max(MIN_DURATION),
        }
    }

    /// Duration applied to tasks spawned from now on. In-flight tasks keep
    /// the duration they were spawned with.
    pub fn set_duration(&mut self, secs: f32) {
        self.duration = secs.max(MIN_DURATION);
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Ramp an existing layer from `start` to `target`.
    pub fn retarget(&mut self, clip: ClipId, start: SoundParams, target: SoundParams) {
        self.spawn(clip, start, target, false);
    }

    /// Ramp a layer to silence; `step` reports the clip once it lands so
    /// the caller can remove the layer.
    pub fn fade_out(&mut self, clip: ClipId, start: SoundParams) {
        let target = SoundParams::muted(start.pitch);
        self.spawn(clip, start, target, true);
    }

    fn spawn(&mut self, clip: ClipId, start: SoundParams, target: SoundParams, fade_out: bool) {
        // Supersede-and-cancel: the newest intent for a clip wins outright.
        self.tasks.retain(|task| task.clip != clip);
        self.tasks.push(TransitionTask {
            clip,
            start,
            target,
            duration: self.duration,
            elapsed: 0.0,
            fade_out,
        });
    }

    /// Drop any task for `clip` without touching the layer. Returns whether
    /// one existed.
    pub fn cancel(&mut self, clip: &ClipId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| &task.clip != clip);
        self.tasks.len() != before
    }

    /// Advance every task by `dt` seconds, writing interpolated parameters
    /// into the matching layers.
    ///
    /// A task that reaches its end assigns the exact target (no float
    /// residue) and is dropped. Finished fade-outs are returned so the
    /// caller can retire those layers. Tasks whose layer has vanished are
    /// dropped silently.
    pub fn step(&mut self, dt: f32, layers: &mut [SoundLayer]) -> Vec<ClipId> {
        let mut faded_out = Vec::new();

        self.tasks.retain_mut(|task| {
            let Some(layer) = layers.iter_mut().find(|layer| layer.clip == task.clip) else {
                return false;
            };

            task.elapsed += dt;
            let fraction = task.elapsed / task.duration;
            if fraction >= 1.0 {
                layer.params = task.target;
                if task.fade_out {
                    faded_out.push(task.clip.clone());
                }
                false
            } else {
                layer.params = SoundParams::lerp(&task.start, &task.target, fraction);
                true
            }
        });

        faded_out
    }

    pub fn is_active(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn tasks(&self) -> &[TransitionTask] {
        &self.tasks
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn clip(s: &str) -> ClipId {
        ClipId::new(s)
    }

    fn layer(s: &str, volume: f32) -> SoundLayer {
        SoundLayer::from_spec(&SoundSpec::new(s, s).with_volume(volume))
    }

    // ------------------------------------------------------------------------
    // diff
    // ------------------------------------------------------------------------

    #[test]
    fn test_diff_partitions_every_clip() {
        let current = vec![clip("wind"), clip("rain")];
        let target = Preset::new("Cave")
            .with_layer(SoundSpec::new("Wind", "wind").with_volume(0.2))
            .with_layer(SoundSpec::new("Drips", "drips").with_volume(0.7));

        let ops = diff(&current, &target);
        assert_eq!(ops.len(), 3);

        // Target order first, then leftover current order.
        assert!(
            matches!(&ops[0], TransitionOp::Retarget { spec } if spec.clip == clip("wind"))
        );
        assert!(
            matches!(&ops[1], TransitionOp::Introduce { spec } if spec.clip == clip("drips"))
        );
        assert!(matches!(&ops[2], TransitionOp::FadeOut { clip: c } if *c == clip("rain")));
    }

    #[test]
    fn test_diff_from_nothing_introduces_everything() {
        let target = Preset::new("Forest")
            .with_layer(SoundSpec::new("Wind", "wind"))
            .with_layer(SoundSpec::new("Birds", "birds"));

        let ops = diff(&[], &target);
        assert_eq!(ops.len(), 2);
        assert!(ops
            .iter()
            .all(|op| matches!(op, TransitionOp::Introduce { .. })));
    }

    #[test]
    fn test_diff_to_empty_preset_fades_everything_out() {
        let current = vec![clip("wind"), clip("birds")];
        let ops = diff(&current, &Preset::new("Silence"));
        assert_eq!(ops.len(), 2);
        assert!(ops
            .iter()
            .all(|op| matches!(op, TransitionOp::FadeOut { .. })));
    }

    #[test]
    fn test_diff_identical_sets_yields_only_retargets() {
        let current = vec![clip("wind")];
        let target = Preset::new("Same").with_layer(SoundSpec::new("Wind", "wind"));
        let ops = diff(&current, &target);
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], TransitionOp::Retarget { .. }));
    }

    #[test]
    fn test_op_display() {
        let op = TransitionOp::FadeOut { clip: clip("rain") };
        assert_eq!(op.to_string(), "- rain");
    }

    // ------------------------------------------------------------------------
    // engine
    // ------------------------------------------------------------------------

    #[test]
    fn test_retarget_converges_exactly() {
        let mut engine = TransitionEngine::new(2.0);
        let mut layers = vec![layer("wind", 1.0)];
        let target = SoundParams {
            volume: 0.3,
            ..SoundParams::default()
        };

        engine.retarget(clip("wind"), layers[0].params, target);
        assert!(engine.is_active());

        // Uneven steps that overshoot the 2s total.
        for dt in [0.5, 0.7, 0.3, 0.4, 0.6] {
            engine.step(dt, &mut layers);
        }

        assert!(!engine.is_active());
        // Landed on the target bit-for-bit, not on lerp(_, _, ~1.0).
        assert_eq!(layers[0].params, target);
    }

    #[test]
    fn test_interpolation_is_monotonic() {
        let mut engine = TransitionEngine::new(1.0);
        let mut layers = vec![layer("wind", 0.0)];
        let target = SoundParams {
            volume: 1.0,
            ..SoundParams::default()
        };

        engine.retarget(clip("wind"), layers[0].params, target);

        let mut last = 0.0f32;
        for _ in 0..10 {
            engine.step(0.05, &mut layers);
            assert!(layers[0].params.volume >= last);
            last = layers[0].params.volume;
        }
        // Halfway through a 1s ramp.
        assert_relative_eq!(last, 0.5, max_relative = 1e-4);
    }

    #[test]
    fn test_supersede_cancels_and_restarts_from_current() {
        let mut engine = TransitionEngine::new(1.0);
        let mut layers = vec![layer("wind", 0.0)];
        let up = SoundParams {
            volume: 1.0,
            ..SoundParams::default()
        };

        engine.retarget(clip("wind"), layers[0].params, up);
        engine.step(0.5, &mut layers);
        assert_relative_eq!(layers[0].params.volume, 0.5);

        // Reverse course mid-flight. One task, started from 0.5, no snap.
        let down = SoundParams {
            volume: 0.0,
            ..SoundParams::default()
        };
        engine.retarget(clip("wind"), layers[0].params, down);
        assert_eq!(engine.task_count(), 1);
        assert_relative_eq!(engine.tasks()[0].progress(), 0.0);

        engine.step(0.5, &mut layers);
        assert_relative_eq!(layers[0].params.volume, 0.25);
    }

    #[test]
    fn test_fade_out_reports_landing_and_keeps_pitch() {
        let mut engine = TransitionEngine::new(1.0);
        let mut layers = vec![SoundLayer::from_spec(
            &SoundSpec::new("Wind", "wind").with_volume(0.8).with_pitch(1.5),
        )];

        engine.fade_out(clip("wind"), layers[0].params);

        let mid = engine.step(0.5, &mut layers);
        assert!(mid.is_empty());
        assert_relative_eq!(layers[0].params.volume, 0.4);
        assert_relative_eq!(layers[0].params.pitch, 1.5);

        let done = engine.step(0.6, &mut layers);
        assert_eq!(done, vec![clip("wind")]);
        assert_eq!(layers[0].params.volume, 0.0);
        assert_eq!(layers[0].params.pitch, 1.5);
        assert!(!engine.is_active());
    }

    #[test]
    fn test_task_for_vanished_layer_is_dropped() {
        let mut engine = TransitionEngine::new(1.0);
        let mut layers = vec![layer("wind", 1.0)];
        engine.fade_out(clip("wind"), layers[0].params);

        layers.clear();
        let finished = engine.step(0.1, &mut layers);
        assert!(finished.is_empty());
        assert!(!engine.is_active());
    }

    #[test]
    fn test_cancel() {
        let mut engine = TransitionEngine::new(1.0);
        let start = SoundParams::default();
        engine.fade_out(clip("wind"), start);

        assert!(engine.cancel(&clip("wind")));
        assert!(!engine.cancel(&clip("wind")));
        assert!(!engine.is_active());
    }

    #[test]
    fn test_step_with_no_tasks_is_a_no_op() {
        let mut engine = TransitionEngine::new(1.0);
        let mut layers = vec![layer("wind", 0.4)];
        let finished = engine.step(1.0, &mut layers);
        assert!(finished.is_empty());
        assert_eq!(layers[0].params.volume, 0.4);
    }

    #[test]
    fn test_duration_change_spares_in_flight_tasks() {
        let mut engine = TransitionEngine::new(2.0);
        let mut layers = vec![layer("wind", 0.0)];
        let target = SoundParams {
            volume: 1.0,
            ..SoundParams::default()
        };
        engine.retarget(clip("wind"), layers[0].params, target);

        engine.set_duration(10.0);
        engine.step(1.0, &mut layers);

        // Still on the 2s schedule it was spawned with.
        assert_relative_eq!(layers[0].params.volume, 0.5);
        assert_relative_eq!(engine.duration(), 10.0);
    }
}
