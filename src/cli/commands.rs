//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;
use std::time::Duration;

use log::info;

use crate::backend::{ClipId, NullBackend};
use crate::config::MixerConfig;
use crate::error::{AmbraError, Result};
use crate::mixer::{diff, Mixer, Preset, SoundParams, SoundSpec};

/// Write a starter config with an example soundscape.
pub fn init(path: &Path, force: bool) -> Result<()> {
    info!("Writing starter config to: {}", path.display());

    if path.exists() && !force {
        println!("ERROR: {} already exists (use --force to overwrite)", path.display());
        return Ok(());
    }

    let config = sample_config();
    config.save(path)?;

    println!("Config created: {}", path.display());
    println!(
        "{} startup sound(s), {} preset(s)",
        config.sounds.len(),
        config.presets.len()
    );
    println!("Try: ambra-cli simulate {} --preset \"Forest Night\"", path.display());

    Ok(())
}

/// Check a config file against the mixer's invariants.
pub fn validate(path: &Path) -> Result<()> {
    info!("Validating config: {}", path.display());

    // load() already validates; reaching past it means the config is sound.
    let config = MixerConfig::load(path)?;

    println!("Config OK: {}", path.display());
    println!("{:-<60}", "");
    println!("Play on start: {}", config.play_on_start);
    println!("Crossfade: {:.1}s", config.crossfade_secs);

    println!("Startup sounds ({}):", config.sounds.len());
    for spec in &config.sounds {
        println!(
            "  {} ({}) volume {:.2}, pitch {:.2}",
            spec.display_name(),
            spec.clip,
            spec.params.volume,
            spec.params.pitch
        );
    }

    println!("Presets ({}):", config.presets.len());
    for preset in &config.presets {
        println!("  {} ({} layer(s))", preset.name, preset.layers.len());
    }

    Ok(())
}

/// Show the operations a crossfade between two presets would run.
pub fn diff_presets(path: &Path, from: Option<&str>, to: &str) -> Result<()> {
    let config = MixerConfig::load(path)?;

    let current: Vec<ClipId> = match from {
        Some(name) => preset_named(&config, name)?
            .layers
            .iter()
            .map(|spec| spec.clip.clone())
            .collect(),
        None => config.sounds.iter().map(|spec| spec.clip.clone()).collect(),
    };
    let target = preset_named(&config, to)?;

    let ops = diff(&current, target);

    println!(
        "Crossfade {} -> '{}': {} operation(s)",
        from.map_or_else(|| "[startup sounds]".to_string(), |name| format!("'{}'", name)),
        target.name,
        ops.len()
    );
    println!("{:-<60}", "");
    if ops.is_empty() {
        println!("  (nothing to do)");
    }
    for op in &ops {
        println!("  {}", op);
    }

    Ok(())
}

/// Run a headless mixer and print the layer timeline.
///
/// Ticks a real `Mixer` over a `NullBackend` at a fixed rate, optionally
/// crossfading to a preset after one simulated second, and prints layer
/// volumes twice per simulated second.
pub fn simulate(
    path: &Path,
    preset: Option<&str>,
    seconds: f64,
    fps: u32,
    stopped: bool,
) -> Result<()> {
    let mut config = MixerConfig::load(path)?;
    if stopped {
        config.play_on_start = false;
    }
    if let Some(name) = preset {
        // Fail before the mixer comes up, not one simulated second in.
        preset_named(&config, name)?;
    }

    let fps = fps.max(1);
    let dt = Duration::from_secs_f64(1.0 / f64::from(fps));

    let mut mixer = Mixer::new(config, Box::new(NullBackend::new()))?;

    println!("=== Ambra Simulation ===");
    println!(
        "State: {} | {} layer(s) | crossfade {:.1}s",
        mixer.state(),
        mixer.layers().len(),
        mixer.crossfade().as_secs_f32()
    );
    println!("{:-<60}", "");

    let total_ticks = (seconds * f64::from(fps)).ceil() as u64;
    let report_every = u64::from(fps / 2).max(1);
    let mut crossfaded = false;

    for tick in 0..total_ticks {
        if let Some(name) = preset {
            if !crossfaded && mixer.clock() >= 1.0 {
                mixer.load_song_named(name)?;
                crossfaded = true;
            }
        }

        mixer.tick(dt);

        if tick % report_every == 0 {
            print_snapshot(&mixer);
        }
    }

    println!("{:-<60}", "");
    println!(
        "Done: clock {:.2}s, {} layer(s), state {}, {}",
        mixer.clock(),
        mixer.layers().len(),
        mixer.state(),
        if mixer.is_transitioning() {
            "still transitioning"
        } else {
            "settled"
        }
    );

    Ok(())
}

fn print_snapshot(mixer: &Mixer) {
    let t = mixer.clock();
    let marker = if mixer.is_transitioning() { "~" } else { " " };
    let layers: Vec<String> = mixer
        .layers()
        .iter()
        .map(|layer| format!("{} {:.2}", layer.display_name(), layer.effective_volume(t)))
        .collect();
    if layers.is_empty() {
        println!("{} t={:6.2}s  (no layers)", marker, t);
    } else {
        println!("{} t={:6.2}s  {}", marker, t, layers.join(" | "));
    }
}

fn preset_named<'a>(config: &'a MixerConfig, name: &str) -> Result<&'a Preset> {
    config
        .presets
        .iter()
        .find(|preset| preset.name == name)
        .ok_or_else(|| AmbraError::UnknownPreset {
            name: name.to_string(),
        })
}

fn sample_config() -> MixerConfig {
    MixerConfig {
        play_on_start: true,
        crossfade_secs: 3.0,
        sounds: vec![
            SoundSpec::new("Wind", "wind.ogg").with_volume(0.6),
            SoundSpec::new("Birds", "birds.ogg").with_volume(0.4),
        ],
        presets: vec![
            Preset::new("Forest Day")
                .with_layer(SoundSpec::new("Wind", "wind.ogg").with_volume(0.6))
                .with_layer(SoundSpec::new("Birds", "birds.ogg").with_volume(0.4)),
            Preset::new("Forest Night")
                .with_layer(SoundSpec::new("Wind", "wind.ogg").with_params(SoundParams {
                    volume: 0.3,
                    volume_fade_strength: 0.1,
                    volume_fade_frequency: 0.25,
                    ..SoundParams::default()
                }))
                .with_layer(SoundSpec::new("Crickets", "crickets.ogg").with_volume(0.5)),
        ],
    }
}
