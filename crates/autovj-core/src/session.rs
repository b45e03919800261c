//! Live session lifecycle
//!
//! Owns everything that outlives a single capture stream: device selection,
//! the shared publisher and the render-side mapper. Starting a session hands
//! out a fresh [`AnalysisPipeline`] for the audio callback; stopping it puts
//! every envelope back at rest so the next session starts clean.

use crate::config::EngineConfig;
use crate::devices::{DeviceSelection, StreamSettings, ToggleOutcome};
use crate::error::{CoreError, Result};
use crate::hud::{GainSlider, MeterLayout, MeterReadout};
use crate::pipeline::AnalysisPipeline;
use crate::publisher::ControlPublisher;
use crate::visual::{VisualMapper, VisualParams};
use std::sync::Arc;
use tracing::{debug, info};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not capturing
    Idle,
    /// Capturing and producing visual parameters
    Live,
}

/// Handed to the capture layer when a session starts
pub struct LiveStart {
    /// Stream parameters for the selected device
    pub settings: StreamSettings,
    /// Pipeline to move into the audio callback
    pub pipeline: AnalysisPipeline,
}

/// Idle → Live → Idle state machine around one capture stream
pub struct LiveSession {
    config: EngineConfig,
    devices: DeviceSelection,
    publisher: Arc<ControlPublisher>,
    mapper: VisualMapper,
    state: SessionState,
    transitioning: bool,
    elapsed: f32,
    frames: u64,
}

impl LiveSession {
    /// Create an idle session over the given devices
    pub fn new(config: EngineConfig, devices: DeviceSelection) -> Self {
        let publisher = Arc::new(ControlPublisher::new(config.analysis.default_gain));
        let mapper = VisualMapper::new(config.visual);
        Self {
            config,
            devices,
            publisher,
            mapper,
            state: SessionState::Idle,
            transitioning: false,
            elapsed: 0.0,
            frames: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True while live
    pub fn is_live(&self) -> bool {
        self.state == SessionState::Live
    }

    /// Configuration in use
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Device list and selection
    pub fn devices(&self) -> &DeviceSelection {
        &self.devices
    }

    /// Toggle a device; ignored while live
    pub fn set_device_toggle(&mut self, index: usize, on: bool) -> ToggleOutcome {
        self.devices.set_toggle(index, on)
    }

    /// Select a device by name; ignored while live
    pub fn select_device(&mut self, name: &str) -> Option<ToggleOutcome> {
        self.devices.select_by_name(name)
    }

    /// Shared control values
    pub fn publisher(&self) -> &Arc<ControlPublisher> {
        &self.publisher
    }

    /// Render-side mapper
    pub fn mapper(&self) -> &VisualMapper {
        &self.mapper
    }

    /// Mutable render-side mapper, e.g. to set the target hue
    pub fn mapper_mut(&mut self) -> &mut VisualMapper {
        &mut self.mapper
    }

    /// Input gain
    pub fn gain(&self) -> f32 {
        self.publisher.gain()
    }

    /// Set the input gain (clamped to the slider range)
    pub fn set_gain(&self, gain: f32) {
        self.publisher.set_gain(gain);
    }

    /// Seconds of live frames since start
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Go live on the selected device.
    ///
    /// Returns the stream settings and a new pipeline bound to this
    /// session's publisher. The caller opens the device with them and calls
    /// [`LiveSession::abort_start`] if that fails.
    pub fn start(&mut self) -> Result<LiveStart> {
        if self.is_live() {
            return Err(CoreError::SessionActive);
        }
        let settings = self
            .devices
            .stream_settings()
            .ok_or(CoreError::NoDeviceSelected)?;

        let pipeline = AnalysisPipeline::new(
            &self.config.analysis,
            self.config.bands,
            self.config.impact,
            Arc::clone(&self.publisher),
        );

        self.devices.set_frozen(true);
        self.state = SessionState::Live;
        self.transitioning = true;
        self.elapsed = 0.0;
        self.frames = 0;

        info!(
            "Live session started on '{}' ({} ch @ {} Hz)",
            settings.device_name, settings.channels, settings.sample_rate
        );
        Ok(LiveStart { settings, pipeline })
    }

    /// Roll back a start whose device failed to open
    pub fn abort_start(&mut self) {
        if self.is_live() {
            debug!("Live session start aborted");
            self.enter_idle();
        }
    }

    /// End the session and return every envelope to rest
    pub fn stop(&mut self) {
        if !self.is_live() {
            return;
        }
        info!(
            "Live session stopped after {:.1}s ({} frames)",
            self.elapsed, self.frames
        );
        self.enter_idle();
    }

    fn enter_idle(&mut self) {
        self.state = SessionState::Idle;
        self.transitioning = false;
        self.devices.set_frozen(false);
        self.publisher.reset();
        self.mapper.reset();
    }

    /// Advance one render frame. `None` while idle and on the first frame after start.
    pub fn frame(&mut self, dt: f32) -> Option<VisualParams> {
        if self.transitioning {
            self.transitioning = false;
            return None;
        }
        if !self.is_live() {
            return None;
        }
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
        self.frames += 1;
        let snapshot = self.publisher.snapshot();
        Some(self.mapper.update(&snapshot))
    }

    /// Meter contents for the current published bands and gain
    pub fn meter(&self, layout: &MeterLayout) -> MeterReadout {
        MeterReadout::new(layout, &self.publisher.bands(), self.gain())
    }

    /// Pointer press or drag on the meter. Returns the new gain when the gain slider was hit.
    pub fn pointer(&mut self, x: f32, y: f32, window_height: f32) -> Option<f32> {
        if !self.is_live() {
            return None;
        }
        let gain = GainSlider::for_window(window_height).hit(x, y)?;
        self.publisher.set_gain(gain);
        Some(self.publisher.gain())
    }
}
