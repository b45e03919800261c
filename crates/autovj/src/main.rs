//! AutoVJ - headless live runner
//!
//! Opens an input device, runs the analysis pipeline in the audio callback
//! and drives the visual parameter mapper from a paced render loop.

mod cli;
mod logging_setup;

use anyhow::{bail, Context, Result};
use autovj_core::audio::{enumerate_input_devices, open_input_device, CaptureStream};
use autovj_core::{
    CoreError, DeviceSelection, EngineConfig, LiveSession, MeterLayout, Vec2, VisualParams,
};
use clap::Parser;
use cli::Args;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Interval between parameter summaries in the log
const SUMMARY_INTERVAL: Duration = Duration::from_secs(1);

/// Nominal output size for the packed shader uniforms
const RESOLUTION: Vec2 = Vec2::new(1920.0, 1080.0);

/// Load the config before logging exists; the error is reported once logging is up
fn load_config(path: Option<&PathBuf>) -> (EngineConfig, Option<(PathBuf, CoreError)>) {
    match path {
        Some(path) if path.exists() => match EngineConfig::load(path) {
            Ok(config) => (config, None),
            Err(e) => (EngineConfig::default(), Some((path.clone(), e))),
        },
        _ => (EngineConfig::default(), None),
    }
}

fn apply_overrides(config: &mut EngineConfig, args: &Args) {
    if let Some(fps) = args.fps {
        config.target_fps = fps;
    }
    if let Some(gain) = args.gain {
        config.analysis.default_gain = gain;
    }
}

fn print_devices(devices: &DeviceSelection) {
    if devices.is_empty() {
        println!("No input devices found.");
        return;
    }
    println!("Input devices:");
    for (i, device) in devices.entries().iter().enumerate() {
        println!(
            "  [{}] {} ({} ch, rates {:?})",
            i, device.name, device.input_channels, device.sample_rates
        );
    }
}

fn log_summary(params: &VisualParams, session: &LiveSession) {
    let b = &params.bands;
    info!(
        "bands sub={:.2} low={:.2} mid={:.2} high={:.2} treble={:.2} | zoom={:.3} scale={:.3} rgb={:.1} strobe={:.2} slices={} invert={}",
        b.sub_bass,
        b.low_mids,
        b.mids,
        b.high_mids,
        b.treble,
        params.zoom,
        params.scale,
        params.rgb_shift,
        params.strobe,
        params.slice_count,
        params.invert
    );

    let meter = session.meter(&MeterLayout::default());
    let heights: Vec<String> = meter
        .bars
        .iter()
        .map(|bar| format!("{:.0}", bar.height))
        .collect();
    debug!("meter [{}] {}", heights.join(" "), meter.gain_label);

    let uniforms = params.uniforms(session.elapsed(), RESOLUTION);
    debug!(
        "uniforms pixel_size={:.1} rgb_shift={:.1} impact={:.3} blur_alpha={:.0} hue={:.0}",
        uniforms.pixel_size,
        uniforms.rgb_shift,
        uniforms.impact_delta,
        params.blur_alpha,
        params.color.hue
    );

    let audio = session.publisher().diagnostics();
    debug!(
        "audio detector baseline={:.3} impact={:.3} strobe={:.2}",
        audio.low_mid_baseline, audio.impact_delta, audio.strobe
    );
}

/// Time budget of one render frame
fn frame_period(fps: f32) -> Result<Duration> {
    Duration::try_from_secs_f32(1.0 / fps)
        .with_context(|| format!("Invalid frame rate: {} fps", fps))
}

/// When the render loop should stop, `None` to run until interrupted
fn run_deadline(from: Instant, seconds: Option<f32>) -> Result<Option<Instant>> {
    let Some(seconds) = seconds else {
        return Ok(None);
    };
    let duration = Duration::try_from_secs_f32(seconds.max(0.0))
        .with_context(|| format!("Invalid run time: {} seconds", seconds))?;
    let deadline = from
        .checked_add(duration)
        .with_context(|| format!("Run time too long: {} seconds", seconds))?;
    Ok(Some(deadline))
}

fn run_live(session: &mut LiveSession, seconds: Option<f32>) -> Result<()> {
    let frame_period = frame_period(session.config().target_fps)?;
    let deadline = run_deadline(Instant::now(), seconds)?;

    let start = session.start().context("Failed to start live session")?;

    let capture = match open_input_device(&start.settings.device_name)
        .and_then(|device| CaptureStream::start(&device, &start.settings, start.pipeline))
    {
        Ok(capture) => capture,
        Err(e) => {
            session.abort_start();
            return Err(e).context("Failed to open audio input");
        }
    };

    let mut last_frame = Instant::now();
    let mut last_summary = Instant::now();
    let mut peak_strobe_frames = 0u64;

    info!(
        "Render loop running at {:.0} fps{}",
        session.config().target_fps,
        seconds
            .map(|s| format!(" for {:.1}s", s))
            .unwrap_or_default()
    );

    loop {
        let frame_start = Instant::now();
        let dt = frame_start.duration_since(last_frame).as_secs_f32();
        last_frame = frame_start;

        if let Some(params) = session.frame(dt) {
            if params.strobe >= 1.0 {
                peak_strobe_frames += 1;
            }
            if last_summary.elapsed() >= SUMMARY_INTERVAL {
                log_summary(&params, session);
                last_summary = Instant::now();
            }
        }

        for err in capture.drain_errors() {
            warn!("Audio stream error: {}", err);
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }

        if let Some(remaining) = frame_period.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    capture.stop();
    info!(
        "Audio frames analyzed: {}, strobe hits seen: {}",
        session.publisher().frames(),
        peak_strobe_frames
    );
    session.stop();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(EngineConfig::default_path);
    let (mut config, load_error) = load_config(config_path.as_ref());
    apply_overrides(&mut config, &args);

    let _log_guard = logging_setup::init(&config.log)?;

    info!("==========================================");
    info!("===       AutoVJ Session Started       ===");
    info!("==========================================");

    if let Some((path, e)) = load_error {
        warn!("Ignoring config {:?}: {}", path, e);
    }
    config.validate().context("Invalid configuration")?;

    if args.write_config {
        let path = config_path.context("No config directory available")?;
        config.save(&path)?;
        println!("Config written to {}", path.display());
        return Ok(());
    }

    let devices = DeviceSelection::new(
        enumerate_input_devices().context("Failed to enumerate input devices")?,
    );

    if args.list_devices {
        print_devices(&devices);
        return Ok(());
    }

    let mut session = LiveSession::new(config, devices);
    session.mapper_mut().set_target_hue(args.hue);

    match args.device.as_deref() {
        Some(name) => {
            if session.select_device(name).is_none() {
                bail!("Input device '{}' not found (try --list-devices)", name);
            }
        }
        None => {
            if session.devices().is_empty() {
                bail!("No input devices available");
            }
            session.set_device_toggle(0, true);
        }
    }

    if let Err(e) = run_live(&mut session, args.seconds) {
        error!("Live session failed: {:#}", e);
        return Err(e);
    }

    info!("AutoVJ session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_period() {
        let period = frame_period(50.0).unwrap();
        assert!((period.as_secs_f64() - 0.02).abs() < 1e-6);
        assert!(frame_period(1e-20).is_err());
        assert!(frame_period(0.0).is_err());
        assert!(frame_period(f32::NAN).is_err());
    }

    #[test]
    fn test_run_deadline() {
        let now = Instant::now();
        assert_eq!(run_deadline(now, None).unwrap(), None);
        assert_eq!(
            run_deadline(now, Some(2.0)).unwrap(),
            Some(now + Duration::from_secs(2))
        );
        assert_eq!(run_deadline(now, Some(-3.0)).unwrap(), Some(now));
        assert!(run_deadline(now, Some(f32::INFINITY)).is_err());
        assert!(run_deadline(now, Some(1e30)).is_err());
    }
}
