//! AutoVJ Core - Audio feature extraction and envelope control
//!
//! This crate turns live audio into smoothed visual control signals:
//! - Spectrum analysis and five-band aggregation (audio thread)
//! - Envelope smoothing and self-relative impact detection (audio thread)
//! - Lock-free publication of band values across threads
//! - Render-side visual parameter mapping, meter readout and shader uniforms
//! - Device selection, live session lifecycle and cpal capture

#![warn(missing_docs)]

pub use glam::Vec2;

// Analysis (audio thread)
pub mod bands;
pub mod envelope;
pub mod impact;
pub mod pipeline;
pub mod publisher;
pub mod remap;
pub mod spectrum;

// Render side
pub mod hud;
pub mod uniforms;
pub mod visual;

// Session & setup
pub mod audio;
pub mod config;
pub mod devices;
pub mod error;
pub mod logging;
pub mod session;

// --- Re-exports grouped by category ---

// Analysis
pub use bands::{Band, BandAggregator, BandConfig, BandEnergies, BAND_COUNT};
pub use envelope::{AttackRelease, EnvelopeSmoother, EnvelopeState, OnePole};
pub use impact::{impact_delta, ImpactConfig, ImpactDetector, ImpactState, StrobeTimer};
pub use pipeline::{AnalysisConfig, AnalysisPipeline, AudioFrame, PassResult};
pub use publisher::{AudioDiagnostics, ControlPublisher, ControlSnapshot, MAX_GAIN};
pub use remap::{lerp, remap, RemapRange};
pub use spectrum::{FftSpectrum, SpectrumProvider, WindowFunction};

// Render
pub use hud::{GainSlider, MeterLayout, MeterReadout};
pub use uniforms::ShaderUniforms;
pub use visual::{HsbColor, VisualConfig, VisualMapper, VisualParams};

// Session & Setup
pub use config::{EngineConfig, MAX_FPS, MIN_FPS};
pub use devices::{DeviceEntry, DeviceSelection, StreamSettings, ToggleOutcome};
pub use error::{CoreError, Result};
pub use logging::LogConfig;
pub use session::{LiveSession, LiveStart, SessionState};
