//! Band Aggregator - folds a magnitude spectrum into five semantic bands
//!
//! Crossover frequencies are converted to bin indices on every frame because
//! the capture device decides the sample rate. A linear tilt boosts higher
//! bins before averaging to compensate the natural spectral roll-off of
//! real-world audio; without it the upper bands sit at the noise floor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of frequency bands produced per analysis frame
pub const BAND_COUNT: usize = 5;

/// One of the five fixed frequency ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    /// Deep thumps (below the first crossover)
    SubBass,
    /// Kicks and bass guitar
    LowMids,
    /// Vocals and snare
    Mids,
    /// Lead instruments and shimmer
    HighMids,
    /// Cymbals and sharp noise
    Treble,
}

impl Band {
    /// All bands in ascending frequency order
    pub const ALL: [Band; BAND_COUNT] = [
        Band::SubBass,
        Band::LowMids,
        Band::Mids,
        Band::HighMids,
        Band::Treble,
    ];

    /// Position of this band in [`Band::ALL`]
    pub const fn index(self) -> usize {
        match self {
            Band::SubBass => 0,
            Band::LowMids => 1,
            Band::Mids => 2,
            Band::HighMids => 3,
            Band::Treble => 4,
        }
    }

    /// Name used for shader uniforms and log output
    pub const fn uniform_name(self) -> &'static str {
        match self {
            Band::SubBass => "subBass",
            Band::LowMids => "lowMids",
            Band::Mids => "mids",
            Band::HighMids => "highMids",
            Band::Treble => "treble",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Band::SubBass => write!(f, "Sub Bass"),
            Band::LowMids => write!(f, "Low Mids"),
            Band::Mids => write!(f, "Mids"),
            Band::HighMids => write!(f, "High Mids"),
            Band::Treble => write!(f, "Treble"),
        }
    }
}

/// Energy per band for one analysis frame. Always finite and non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandEnergies {
    /// Sub-bass energy
    pub sub_bass: f32,
    /// Low-mid energy
    pub low_mids: f32,
    /// Mid energy
    pub mids: f32,
    /// High-mid energy
    pub high_mids: f32,
    /// Treble energy
    pub treble: f32,
}

impl BandEnergies {
    /// All-zero energies (silence)
    pub const ZERO: BandEnergies = BandEnergies {
        sub_bass: 0.0,
        low_mids: 0.0,
        mids: 0.0,
        high_mids: 0.0,
        treble: 0.0,
    };

    /// Build from an array ordered like [`Band::ALL`]
    pub const fn from_array(values: [f32; BAND_COUNT]) -> Self {
        Self {
            sub_bass: values[0],
            low_mids: values[1],
            mids: values[2],
            high_mids: values[3],
            treble: values[4],
        }
    }

    /// Values ordered like [`Band::ALL`]
    pub const fn to_array(&self) -> [f32; BAND_COUNT] {
        [
            self.sub_bass,
            self.low_mids,
            self.mids,
            self.high_mids,
            self.treble,
        ]
    }

    /// Energy of a single band
    pub fn get(&self, band: Band) -> f32 {
        match band {
            Band::SubBass => self.sub_bass,
            Band::LowMids => self.low_mids,
            Band::Mids => self.mids,
            Band::HighMids => self.high_mids,
            Band::Treble => self.treble,
        }
    }

    /// Mutable access to a single band
    pub fn get_mut(&mut self, band: Band) -> &mut f32 {
        match band {
            Band::SubBass => &mut self.sub_bass,
            Band::LowMids => &mut self.low_mids,
            Band::Mids => &mut self.mids,
            Band::HighMids => &mut self.high_mids,
            Band::Treble => &mut self.treble,
        }
    }

    /// True when every band holds a finite value
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Tunable constants of the band aggregator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    /// Upper edge (inclusive) of the first four bands in Hz, ascending
    pub crossovers_hz: [f32; BAND_COUNT - 1],
    /// Per-band output scaling, equalizes perceived loudness across bands
    pub band_scales: [f32; BAND_COUNT],
    /// Tilt constant K in `1 + (i / N) * K`
    pub tilt: f32,
    /// Fixed pre-gain applied to every bin before the user gain
    pub input_scale: f32,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            crossovers_hz: [150.0, 350.0, 1000.0, 4000.0],
            band_scales: [1.0, 1.8, 2.5, 4.0, 6.0],
            tilt: 10.0,
            input_scale: 25.0,
        }
    }
}

impl BandConfig {
    /// Check the configuration, returning a description of the first problem found
    pub fn check(&self) -> Option<String> {
        if self
            .crossovers_hz
            .iter()
            .any(|hz| !hz.is_finite() || *hz <= 0.0)
        {
            return Some(format!(
                "crossover frequencies must be positive, got {:?}",
                self.crossovers_hz
            ));
        }
        if self.crossovers_hz.windows(2).any(|w| w[0] >= w[1]) {
            return Some(format!(
                "crossover frequencies must be strictly ascending, got {:?}",
                self.crossovers_hz
            ));
        }
        if self
            .band_scales
            .iter()
            .any(|s| !s.is_finite() || *s < 0.0)
        {
            return Some(format!(
                "band scales must be finite and non-negative, got {:?}",
                self.band_scales
            ));
        }
        if !self.tilt.is_finite() || self.tilt < 0.0 {
            return Some(format!("tilt must be non-negative, got {}", self.tilt));
        }
        if !self.input_scale.is_finite() || self.input_scale < 0.0 {
            return Some(format!(
                "input scale must be non-negative, got {}",
                self.input_scale
            ));
        }
        None
    }
}

/// Width of one bin in Hz for a Nyquist-folded spectrum of `bin_count` bins
#[inline]
pub fn bin_hz(sample_rate: f32, bin_count: usize) -> f32 {
    sample_rate / (2.0 * bin_count.max(1) as f32)
}

/// Convert the four crossover frequencies into bin indices.
///
/// Every returned index lies in `[0, bin_count)` and the sequence never
/// decreases. A zero, negative or non-finite sample rate yields a zero-width
/// bin, in which case every bin is attributed to the lowest band.
pub fn cutoff_bins(
    crossovers_hz: &[f32; BAND_COUNT - 1],
    sample_rate: f32,
    bin_count: usize,
) -> [usize; BAND_COUNT - 1] {
    let last = bin_count.saturating_sub(1);
    let width = bin_hz(sample_rate, bin_count);
    let mut cutoffs = [last; BAND_COUNT - 1];

    if !(width.is_finite() && width > 0.0) {
        return cutoffs;
    }

    let mut floor = 0;
    for (cutoff, hz) in cutoffs.iter_mut().zip(crossovers_hz) {
        let bin = hz / width;
        // `as usize` saturates, so NaN lands on 0 and huge ratios on usize::MAX
        let bin = if bin.is_finite() { bin as usize } else { last };
        let bin = bin.min(last).max(floor);
        *cutoff = bin;
        floor = bin;
    }
    cutoffs
}

/// Band a bin index belongs to, given the cutoffs from [`cutoff_bins`]
#[inline]
pub fn band_for_bin(index: usize, cutoffs: &[usize; BAND_COUNT - 1]) -> Band {
    if index <= cutoffs[0] {
        Band::SubBass
    } else if index <= cutoffs[1] {
        Band::LowMids
    } else if index <= cutoffs[2] {
        Band::Mids
    } else if index <= cutoffs[3] {
        Band::HighMids
    } else {
        Band::Treble
    }
}

/// Tilt factor for bin `index` of `bin_count`
#[inline]
pub fn tilt_factor(index: usize, bin_count: usize, tilt: f32) -> f32 {
    1.0 + (index as f32 / bin_count.max(1) as f32) * tilt
}

/// Folds magnitude spectra into [`BandEnergies`]. Holds no per-frame buffers.
#[derive(Debug, Clone)]
pub struct BandAggregator {
    config: BandConfig,
}

impl BandAggregator {
    /// Create an aggregator with the given constants
    pub fn new(config: BandConfig) -> Self {
        Self { config }
    }

    /// Current constants
    pub fn config(&self) -> &BandConfig {
        &self.config
    }

    /// Replace the constants
    pub fn set_config(&mut self, config: BandConfig) {
        self.config = config;
    }

    /// Average tilted, gained bin energy per band.
    ///
    /// Empty bands divide by one, non-finite or negative magnitudes count as
    /// silence and a negative gain is treated as zero, so the result is always
    /// finite and non-negative.
    pub fn aggregate(&self, magnitudes: &[f32], sample_rate: f32, gain: f32) -> BandEnergies {
        let bin_count = magnitudes.len();
        if bin_count == 0 {
            return BandEnergies::ZERO;
        }

        let gain = if gain.is_finite() { gain.max(0.0) } else { 0.0 };
        let pre_gain = gain * self.config.input_scale;
        let cutoffs = cutoff_bins(&self.config.crossovers_hz, sample_rate, bin_count);

        let mut sums = [0.0f32; BAND_COUNT];
        let mut counts = [0u32; BAND_COUNT];

        for (i, &magnitude) in magnitudes.iter().enumerate() {
            let magnitude = if magnitude.is_finite() {
                magnitude.max(0.0)
            } else {
                0.0
            };
            let value = magnitude * pre_gain * tilt_factor(i, bin_count, self.config.tilt);
            let band = band_for_bin(i, &cutoffs).index();
            sums[band] += value;
            counts[band] += 1;
        }

        let mut out = [0.0f32; BAND_COUNT];
        for band in 0..BAND_COUNT {
            let avg = sums[band] / counts[band].max(1) as f32;
            let scaled = avg * self.config.band_scales[band];
            out[band] = if scaled.is_finite() { scaled } else { 0.0 };
        }
        BandEnergies::from_array(out)
    }
}

impl Default for BandAggregator {
    fn default() -> Self {
        Self::new(BandConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_order_and_names() {
        for (i, band) in Band::ALL.iter().enumerate() {
            assert_eq!(band.index(), i);
        }
        assert_eq!(Band::LowMids.uniform_name(), "lowMids");
        assert_eq!(Band::HighMids.to_string(), "High Mids");
    }

    #[test]
    fn test_cutoffs_at_44100_with_512_bins() {
        let config = BandConfig::default();
        let cutoffs = cutoff_bins(&config.crossovers_hz, 44100.0, 512);
        // 44100 / 1024 = 43.07 Hz per bin
        assert_eq!(cutoffs, [3, 8, 23, 92]);
    }

    #[test]
    fn test_cutoffs_clamped_for_tiny_spectra() {
        let config = BandConfig::default();
        let cutoffs = cutoff_bins(&config.crossovers_hz, 44100.0, 4);
        assert!(cutoffs.iter().all(|&c| c < 4));
    }

    #[test]
    fn test_zero_sample_rate_puts_everything_in_sub_bass() {
        let config = BandConfig::default();
        let cutoffs = cutoff_bins(&config.crossovers_hz, 0.0, 64);
        assert_eq!(cutoffs, [63; 4]);
        for i in 0..64 {
            assert_eq!(band_for_bin(i, &cutoffs), Band::SubBass);
        }
    }

    #[test]
    fn test_silence_is_all_zero() {
        let aggregator = BandAggregator::default();
        let energies = aggregator.aggregate(&[0.0; 512], 44100.0, 3.0);
        assert_eq!(energies, BandEnergies::ZERO);
    }

    #[test]
    fn test_single_low_bin_only_feeds_sub_bass() {
        let aggregator = BandAggregator::default();
        let mut spectrum = vec![0.0; 512];
        spectrum[0] = 1.0;
        let energies = aggregator.aggregate(&spectrum, 44100.0, 1.0);

        assert!(energies.sub_bass > 0.0);
        assert_eq!(energies.low_mids, 0.0);
        assert_eq!(energies.mids, 0.0);
        assert_eq!(energies.high_mids, 0.0);
        assert_eq!(energies.treble, 0.0);

        // Bin 0 has tilt 1.0 and the sub band spans bins 0..=3
        let expected = 1.0 * 25.0 / 4.0;
        assert!((energies.sub_bass - expected).abs() < 1e-5);
    }

    #[test]
    fn test_tilt_boosts_high_bins() {
        let config = BandConfig {
            band_scales: [1.0; BAND_COUNT],
            input_scale: 1.0,
            ..BandConfig::default()
        };
        let aggregator = BandAggregator::new(config);
        let spectrum = vec![1.0; 512];
        let energies = aggregator.aggregate(&spectrum, 44100.0, 1.0);
        let values = energies.to_array();
        for pair in values.windows(2) {
            assert!(pair[1] > pair[0], "tilt should raise upper bands: {:?}", values);
        }
    }

    #[test]
    fn test_band_scales_are_applied_per_band() {
        let flat = BandConfig {
            tilt: 0.0,
            input_scale: 1.0,
            band_scales: [1.0; BAND_COUNT],
            ..BandConfig::default()
        };
        let scaled = BandConfig {
            band_scales: [1.0, 1.8, 2.5, 4.0, 6.0],
            ..flat
        };
        let spectrum = vec![0.5; 256];
        let a = BandAggregator::new(flat).aggregate(&spectrum, 48000.0, 1.0);
        let b = BandAggregator::new(scaled).aggregate(&spectrum, 48000.0, 1.0);
        for band in Band::ALL {
            let ratio = b.get(band) / a.get(band);
            assert!((ratio - scaled.band_scales[band.index()]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_bad_magnitudes_and_gain_stay_finite() {
        let aggregator = BandAggregator::default();
        let spectrum = [f32::NAN, f32::INFINITY, -1.0, 0.5];
        let energies = aggregator.aggregate(&spectrum, 44100.0, f32::NAN);
        assert!(energies.is_finite());
        assert_eq!(energies, BandEnergies::ZERO);

        let energies = aggregator.aggregate(&spectrum, 44100.0, 1.0);
        assert!(energies.is_finite());
        assert!(energies.to_array().iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_empty_spectrum() {
        let aggregator = BandAggregator::default();
        assert_eq!(aggregator.aggregate(&[], 44100.0, 1.0), BandEnergies::ZERO);
    }

    #[test]
    fn test_config_check() {
        assert!(BandConfig::default().check().is_none());
        let unsorted = BandConfig {
            crossovers_hz: [150.0, 100.0, 1000.0, 4000.0],
            ..BandConfig::default()
        };
        assert!(unsorted.check().is_some());
        let negative = BandConfig {
            band_scales: [1.0, -1.0, 1.0, 1.0, 1.0],
            ..BandConfig::default()
        };
        assert!(negative.check().is_some());
    }
}
