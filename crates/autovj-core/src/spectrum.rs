//! Spectrum Provider - time-domain frame in, magnitude bins out
//!
//! The analysis pipeline only sees the [`SpectrumProvider`] trait. The
//! default [`FftSpectrum`] wraps `rustfft` with a Hamming window; every
//! buffer is sized at construction so `process` never allocates.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use tracing::debug;

/// Converts a time-domain frame into magnitude bins of increasing frequency
pub trait SpectrumProvider: Send {
    /// Number of bins produced per frame
    fn bin_count(&self) -> usize;

    /// Analyze `samples` and return `bin_count()` magnitudes.
    ///
    /// Called from the audio callback: implementations must not allocate,
    /// lock or block.
    fn process(&mut self, samples: &[f32]) -> &[f32];

    /// Clear any history the provider keeps between frames
    fn reset(&mut self) {}
}

/// Window applied before the transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFunction {
    /// Hamming window (default)
    Hamming,
    /// Hann window
    Hann,
    /// No windowing
    Rectangular,
}

impl WindowFunction {
    /// Window coefficients for a frame of `size` samples
    pub fn coefficients(self, size: usize) -> Vec<f32> {
        if size <= 1 {
            return vec![1.0; size];
        }
        let denom = (size - 1) as f32;
        (0..size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / denom;
                match self {
                    WindowFunction::Hamming => 0.54 - 0.46 * phase.cos(),
                    WindowFunction::Hann => 0.5 * (1.0 - phase.cos()),
                    WindowFunction::Rectangular => 1.0,
                }
            })
            .collect()
    }
}

/// FFT-backed spectrum provider
pub struct FftSpectrum {
    fft: Arc<dyn Fft<f32>>,
    frame_size: usize,
    window: Vec<f32>,
    /// `2 / sum(window)`: a full-scale sine peaks at ~1.0 in its bin
    norm_factor: f32,
    fft_buffer: Vec<Complex<f32>>,
    scratch_buffer: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl FftSpectrum {
    /// Create a provider for frames of `frame_size` samples (`frame_size / 2` bins)
    pub fn new(frame_size: usize, window: WindowFunction) -> Self {
        let frame_size = frame_size.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(frame_size);

        let window = window.coefficients(frame_size);
        let window_sum: f32 = window.iter().sum();
        let norm_factor = if window_sum > 0.0 { 2.0 / window_sum } else { 0.0 };

        let scratch_len = fft.get_inplace_scratch_len();

        debug!(
            "FftSpectrum created: frame_size={}, bins={}",
            frame_size,
            frame_size / 2
        );

        Self {
            fft,
            frame_size,
            window,
            norm_factor,
            fft_buffer: vec![Complex::new(0.0, 0.0); frame_size],
            scratch_buffer: vec![Complex::new(0.0, 0.0); scratch_len],
            magnitudes: vec![0.0; frame_size / 2],
        }
    }

    /// Samples consumed per transform
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }
}

impl std::fmt::Debug for FftSpectrum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftSpectrum")
            .field("frame_size", &self.frame_size)
            .field("bins", &self.magnitudes.len())
            .finish()
    }
}

impl SpectrumProvider for FftSpectrum {
    fn bin_count(&self) -> usize {
        self.magnitudes.len()
    }

    fn process(&mut self, samples: &[f32]) -> &[f32] {
        // Keep the most recent frame; zero-pad short input
        let recent = &samples[samples.len().saturating_sub(self.frame_size)..];

        for (i, slot) in self.fft_buffer.iter_mut().enumerate() {
            let sample = recent.get(i).copied().unwrap_or(0.0);
            let sample = if sample.is_finite() { sample } else { 0.0 };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch_buffer);

        for (magnitude, bin) in self.magnitudes.iter_mut().zip(&self.fft_buffer) {
            let value = bin.norm() * self.norm_factor;
            *magnitude = if value.is_finite() { value } else { 0.0 };
        }

        &self.magnitudes
    }

    fn reset(&mut self) {
        self.magnitudes.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin() * amplitude)
            .collect()
    }

    #[test]
    fn test_bin_count() {
        let provider = FftSpectrum::new(1024, WindowFunction::Hamming);
        assert_eq!(provider.bin_count(), 512);
        assert_eq!(provider.frame_size(), 1024);
    }

    #[test]
    fn test_silence_gives_zero_bins() {
        let mut provider = FftSpectrum::new(1024, WindowFunction::Hamming);
        let bins = provider.process(&[0.0; 1024]);
        assert!(bins.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_sine_peaks_in_expected_bin() {
        let mut provider = FftSpectrum::new(1024, WindowFunction::Hamming);
        // 44100 / 1024 = 43.07 Hz per bin; bin 10 center is ~430.7 Hz
        let freq = 10.0 * 44100.0 / 1024.0;
        let bins = provider.process(&sine(freq, 44100.0, 1024, 1.0));
        let (peak, value) = bins
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |acc, (i, &m)| if m > acc.1 { (i, m) } else { acc });
        assert_eq!(peak, 10);
        assert!((value - 1.0).abs() < 0.05, "peak amplitude was {}", value);
    }

    #[test]
    fn test_short_and_long_input() {
        let mut provider = FftSpectrum::new(256, WindowFunction::Hann);
        assert_eq!(provider.process(&[0.5; 10]).len(), 128);
        assert_eq!(provider.process(&vec![0.5; 4096]).len(), 128);
    }

    #[test]
    fn test_non_finite_samples_are_silenced() {
        let mut provider = FftSpectrum::new(64, WindowFunction::Hamming);
        let samples = vec![f32::NAN; 64];
        let bins = provider.process(&samples);
        assert!(bins.iter().all(|m| *m == 0.0));
    }

    #[test]
    fn test_window_shapes() {
        let hamming = WindowFunction::Hamming.coefficients(5);
        assert!((hamming[0] - 0.08).abs() < 1e-6);
        assert!((hamming[2] - 1.0).abs() < 1e-6);
        let hann = WindowFunction::Hann.coefficients(5);
        assert!(hann[0].abs() < 1e-6);
        assert_eq!(WindowFunction::Rectangular.coefficients(3), vec![1.0; 3]);
    }
}
