//! Audio-thread analysis pipeline
//!
//! One call to [`AnalysisPipeline::process`] per audio callback:
//! downmix → analysis window → spectrum → band aggregation → envelopes →
//! impact → publish. All buffers are allocated in [`AnalysisPipeline::new`];
//! the steady-state path performs no allocation, locking or logging.
//!
//! The spectrum always sees the most recent `fft_size` mono samples, so
//! hosts that deliver shorter callbacks than requested still get full frames.

use crate::bands::{BandAggregator, BandConfig};
use crate::envelope::{EnvelopeSmoother, EnvelopeState};
use crate::impact::{ImpactConfig, ImpactDetector, ImpactState};
use crate::publisher::ControlPublisher;
use crate::spectrum::{FftSpectrum, SpectrumProvider, WindowFunction};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One audio callback's worth of interleaved samples. Borrowed, never retained.
#[derive(Debug, Clone, Copy)]
pub struct AudioFrame<'a> {
    /// Interleaved samples
    pub samples: &'a [f32],
    /// Channels per frame (0 is treated as mono)
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl<'a> AudioFrame<'a> {
    /// Wrap a callback buffer
    pub fn new(samples: &'a [f32], channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Number of sample frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }
}

/// Analysis constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// FFT frame size (power of two); the spectrum has half as many bins
    pub fft_size: usize,
    /// Requested callback size in frames; also the downmix buffer capacity
    pub buffer_size: usize,
    /// Fast envelope smoothing factor
    pub fast_alpha: f32,
    /// Low-mid baseline smoothing factor
    pub baseline_alpha: f32,
    /// Input gain at session start
    pub default_gain: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            buffer_size: 1024,
            fast_alpha: 0.1,
            baseline_alpha: 0.05,
            default_gain: 1.0,
        }
    }
}

impl AnalysisConfig {
    /// Check the configuration, returning a description of the first problem found
    pub fn check(&self) -> Option<String> {
        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Some(format!(
                "fft_size must be a power of two >= 2, got {}",
                self.fft_size
            ));
        }
        if self.buffer_size == 0 {
            return Some("buffer_size must be > 0".to_string());
        }
        for (name, alpha) in [
            ("fast_alpha", self.fast_alpha),
            ("baseline_alpha", self.baseline_alpha),
        ] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Some(format!("{} must be in (0, 1], got {}", name, alpha));
            }
        }
        if !self.default_gain.is_finite() || self.default_gain < 0.0 {
            return Some(format!(
                "default_gain must be >= 0, got {}",
                self.default_gain
            ));
        }
        None
    }
}

/// Everything one pass produced, for callers that want more than the publisher
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassResult {
    /// Envelopes after this pass
    pub envelopes: EnvelopeState,
    /// Impact detector output
    pub impact: ImpactState,
}

/// Audio-thread analysis state. Moved into the audio callback at session start.
pub struct AnalysisPipeline<P: SpectrumProvider = FftSpectrum> {
    provider: P,
    aggregator: BandAggregator,
    smoother: EnvelopeSmoother,
    detector: ImpactDetector,
    publisher: Arc<ControlPublisher>,
    mono: Vec<f32>,
    window: Vec<f32>,
}

impl AnalysisPipeline<FftSpectrum> {
    /// Build a pipeline with the default FFT provider
    pub fn new(
        analysis: &AnalysisConfig,
        bands: BandConfig,
        impact: ImpactConfig,
        publisher: Arc<ControlPublisher>,
    ) -> Self {
        let provider = FftSpectrum::new(analysis.fft_size, WindowFunction::Hamming);
        Self::with_provider(provider, analysis, bands, impact, publisher)
    }
}

impl<P: SpectrumProvider> AnalysisPipeline<P> {
    /// Build a pipeline around a custom spectrum provider
    pub fn with_provider(
        provider: P,
        analysis: &AnalysisConfig,
        bands: BandConfig,
        impact: ImpactConfig,
        publisher: Arc<ControlPublisher>,
    ) -> Self {
        let capacity = analysis.buffer_size.max(1);
        let window_len = analysis.fft_size.max(1);
        debug!(
            "AnalysisPipeline created: bins={}, mono_capacity={}, window={}, fast_alpha={}, baseline_alpha={}",
            provider.bin_count(),
            capacity,
            window_len,
            analysis.fast_alpha,
            analysis.baseline_alpha
        );
        Self {
            provider,
            aggregator: BandAggregator::new(bands),
            smoother: EnvelopeSmoother::new(analysis.fast_alpha, analysis.baseline_alpha),
            detector: ImpactDetector::new(impact),
            publisher,
            mono: Vec::with_capacity(capacity),
            window: vec![0.0; window_len],
        }
    }

    /// Run one pass over a callback buffer and publish the result
    pub fn process(&mut self, frame: AudioFrame<'_>) -> PassResult {
        self.downmix(&frame);
        self.slide_window();

        let magnitudes = self.provider.process(&self.window);
        let raw = self.aggregator.aggregate(
            magnitudes,
            frame.sample_rate as f32,
            self.publisher.gain(),
        );

        // Baseline moves inside `update`, before the detector reads it
        let envelopes = self.smoother.update(&raw);
        let impact = self
            .detector
            .update(envelopes.fast.low_mids, envelopes.low_mid_baseline);

        self.publisher.publish(&envelopes, &impact);

        PassResult { envelopes, impact }
    }

    /// Average interleaved channels into the preallocated mono buffer.
    ///
    /// Frames beyond the buffer capacity are dropped from the front so the
    /// most recent audio is analyzed and the buffer never grows.
    fn downmix(&mut self, frame: &AudioFrame<'_>) {
        let channels = frame.channels.max(1) as usize;
        let capacity = self.mono.capacity();
        let frames = frame.frame_count();
        let skip = frames.saturating_sub(capacity);
        let scale = 1.0 / channels as f32;

        self.mono.clear();
        self.mono.extend(
            frame.samples[skip * channels..frames * channels]
                .chunks_exact(channels)
                .map(|chunk| chunk.iter().sum::<f32>() * scale),
        );
    }

    /// Shift the fresh mono samples into the tail of the analysis window
    fn slide_window(&mut self) {
        let len = self.window.len();
        let fresh = &self.mono[self.mono.len().saturating_sub(len)..];
        let keep = len - fresh.len();
        self.window.copy_within(fresh.len().., 0);
        self.window[keep..].copy_from_slice(fresh);
    }

    /// Shared publisher
    pub fn publisher(&self) -> &Arc<ControlPublisher> {
        &self.publisher
    }

    /// Envelope state after the last pass
    pub fn envelopes(&self) -> EnvelopeState {
        self.smoother.state()
    }

    /// Drop all analysis history and zero the published controls
    pub fn reset(&mut self) {
        self.provider.reset();
        self.window.fill(0.0);
        self.smoother.reset();
        self.detector.reset();
        self.publisher.reset();
    }
}
