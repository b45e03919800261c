//! Control Publisher - lock-free boundary between the audio and render threads
//!
//! Each published scalar is its own atomic cell holding `f32` bits. The
//! audio thread stores with `Release`, the render thread loads with
//! `Acquire`; neither side can block the other. Bands are independent, so a
//! reader may see band A from buffer `n` and band B from buffer `n - 1`.
//! That skew of at most one buffer period is acceptable for visuals.

use crate::bands::{Band, BandEnergies, BAND_COUNT};
use crate::envelope::EnvelopeState;
use crate::impact::ImpactState;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Largest gain accepted from the UI (matches the meter slider range)
pub const MAX_GAIN: f32 = 5.0;

/// An `f32` stored as bits in an [`AtomicU32`]
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    /// Create a cell holding `value`
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Read the current value
    #[inline]
    pub fn load(&self, order: Ordering) -> f32 {
        f32::from_bits(self.0.load(order))
    }

    /// Replace the current value
    #[inline]
    pub fn store(&self, value: f32, order: Ordering) {
        self.0.store(value.to_bits(), order);
    }
}

/// Audio-thread detector state, published for logging and meters only.
///
/// The render side runs its own baseline and detector; nothing in the
/// mapping path reads these values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioDiagnostics {
    /// Audio-thread low-mid baseline
    pub low_mid_baseline: f32,
    /// Audio-thread impact delta
    pub impact_delta: f32,
    /// Audio-thread strobe level
    pub strobe: f32,
}

/// Render-side copy of everything the audio thread publishes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlSnapshot {
    /// Fast band envelopes
    pub bands: BandEnergies,
    /// Audio-thread detector state
    pub audio: AudioDiagnostics,
    /// Number of strobe triggers so far (wrapping)
    pub strobe_generation: u32,
    /// Number of analysis passes published so far
    pub frames: u64,
}

/// Shared control values. Wrap in an `Arc` and hand one clone to each thread.
///
/// Written only by the audio callback, except for the gain which flows the
/// other way (UI to audio).
#[derive(Debug)]
pub struct ControlPublisher {
    bands: [AtomicF32; BAND_COUNT],
    low_mid_baseline: AtomicF32,
    impact_delta: AtomicF32,
    strobe: AtomicF32,
    strobe_generation: AtomicU32,
    frames: AtomicU64,
    gain: AtomicF32,
}

impl ControlPublisher {
    /// Create a publisher with all controls at zero and the given gain
    pub fn new(gain: f32) -> Self {
        let publisher = Self {
            bands: Default::default(),
            low_mid_baseline: AtomicF32::new(0.0),
            impact_delta: AtomicF32::new(0.0),
            strobe: AtomicF32::new(0.0),
            strobe_generation: AtomicU32::new(0),
            frames: AtomicU64::new(0),
            gain: AtomicF32::new(0.0),
        };
        publisher.set_gain(gain);
        publisher
    }

    /// Publish the result of one analysis pass. Audio thread only.
    pub fn publish(&self, envelopes: &EnvelopeState, impact: &ImpactState) {
        for band in Band::ALL {
            self.bands[band.index()].store(envelopes.fast.get(band), Ordering::Release);
        }
        self.low_mid_baseline
            .store(envelopes.low_mid_baseline, Ordering::Release);
        self.impact_delta
            .store(impact.impact_delta, Ordering::Release);
        self.strobe.store(impact.strobe, Ordering::Release);
        if impact.triggered {
            self.strobe_generation.fetch_add(1, Ordering::AcqRel);
        }
        self.frames.fetch_add(1, Ordering::Release);
    }

    /// Latest published value of a single band
    #[inline]
    pub fn band(&self, band: Band) -> f32 {
        self.bands[band.index()].load(Ordering::Acquire)
    }

    /// Latest value of every band, each independently current
    pub fn bands(&self) -> BandEnergies {
        let mut energies = BandEnergies::ZERO;
        for band in Band::ALL {
            *energies.get_mut(band) = self.band(band);
        }
        energies
    }

    /// Read everything currently published. Never blocks.
    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            bands: self.bands(),
            audio: self.diagnostics(),
            strobe_generation: self.strobe_generation.load(Ordering::Acquire),
            frames: self.frames.load(Ordering::Acquire),
        }
    }

    /// Audio-thread detector state as last published
    pub fn diagnostics(&self) -> AudioDiagnostics {
        AudioDiagnostics {
            low_mid_baseline: self.low_mid_baseline.load(Ordering::Acquire),
            impact_delta: self.impact_delta.load(Ordering::Acquire),
            strobe: self.strobe.load(Ordering::Acquire),
        }
    }

    /// Number of analysis passes published so far
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Input gain read by the audio thread each pass
    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain.load(Ordering::Relaxed)
    }

    /// Set the input gain, clamped to `[0, MAX_GAIN]`. Non-finite values are ignored.
    pub fn set_gain(&self, gain: f32) {
        if gain.is_finite() {
            self.gain.store(gain.clamp(0.0, MAX_GAIN), Ordering::Relaxed);
        }
    }

    /// Zero every published control. The gain and trigger generation are kept.
    pub fn reset(&self) {
        for cell in &self.bands {
            cell.store(0.0, Ordering::Release);
        }
        self.low_mid_baseline.store(0.0, Ordering::Release);
        self.impact_delta.store(0.0, Ordering::Release);
        self.strobe.store(0.0, Ordering::Release);
    }
}

impl Default for ControlPublisher {
    fn default() -> Self {
        Self::new(1.0)
    }
}
