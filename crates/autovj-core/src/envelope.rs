//! Envelope Smoother - exponential smoothing of band energies
//!
//! Two flavours of first-order smoothing live here:
//! - [`OnePole`]: symmetric lerp-toward-target with a fixed factor. Used for
//!   raw loudness following on the audio thread and for slow baselines.
//! - [`AttackRelease`]: directional smoothing that snaps toward a rising
//!   target and relaxes toward a rest value when the target falls.

use crate::bands::{Band, BandEnergies, BAND_COUNT};
use crate::remap::lerp;

/// Symmetric one-pole smoother: `value' = value + alpha * (target - value)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnePole {
    value: f32,
    alpha: f32,
}

impl OnePole {
    /// Create a smoother starting at `initial`. `alpha` is clamped to `[0, 1]`.
    pub fn new(initial: f32, alpha: f32) -> Self {
        Self {
            value: initial,
            alpha: clamp_factor(alpha),
        }
    }

    /// Advance one step toward `target` and return the new value
    #[inline]
    pub fn step(&mut self, target: f32) -> f32 {
        if target.is_finite() {
            self.value = lerp(self.value, target, self.alpha);
        }
        self.value
    }

    /// Current value
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Smoothing factor
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Jump straight to `value`
    pub fn reset(&mut self, value: f32) {
        self.value = value;
    }
}

/// Asymmetric smoother with separate attack and release factors.
///
/// When the target is above the current value the envelope moves toward the
/// target by `attack`; otherwise it decays toward `rest` by `release`,
/// regardless of how far the target itself has dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackRelease {
    value: f32,
    attack: f32,
    release: f32,
    rest: f32,
}

impl AttackRelease {
    /// Create an envelope sitting at its rest value
    pub fn new(rest: f32, attack: f32, release: f32) -> Self {
        Self {
            value: rest,
            attack: clamp_factor(attack),
            release: clamp_factor(release),
            rest,
        }
    }

    /// Advance one step and return the new value
    #[inline]
    pub fn step(&mut self, target: f32) -> f32 {
        if target.is_finite() && target > self.value {
            self.value = lerp(self.value, target, self.attack);
        } else {
            self.value = lerp(self.value, self.rest, self.release);
        }
        self.value
    }

    /// Current value
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Value the envelope relaxes toward
    pub fn rest(&self) -> f32 {
        self.rest
    }

    /// Return to the rest value
    pub fn reset(&mut self) {
        self.value = self.rest;
    }
}

fn clamp_factor(factor: f32) -> f32 {
    if factor.is_finite() {
        factor.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Audio-thread envelope state: fast per-band values plus the low-mid baseline
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvelopeState {
    /// Fast-tracking envelope of every band
    pub fast: BandEnergies,
    /// Slow rolling average of the fast low-mid envelope
    pub low_mid_baseline: f32,
}

/// Per-band fast envelopes and the slow low-mid baseline, advanced once per audio buffer
#[derive(Debug, Clone)]
pub struct EnvelopeSmoother {
    fast: [OnePole; BAND_COUNT],
    baseline: OnePole,
}

impl EnvelopeSmoother {
    /// Create a smoother with the given fast and baseline factors
    pub fn new(fast_alpha: f32, baseline_alpha: f32) -> Self {
        Self {
            fast: [OnePole::new(0.0, fast_alpha); BAND_COUNT],
            baseline: OnePole::new(0.0, baseline_alpha),
        }
    }

    /// Fold one frame of raw energies into the envelopes.
    ///
    /// The fast envelopes move first, then the baseline chases the updated
    /// fast low-mid value. Impact detection must read the state returned
    /// here, never a baseline from before this call.
    pub fn update(&mut self, raw: &BandEnergies) -> EnvelopeState {
        let mut fast = BandEnergies::ZERO;
        for band in Band::ALL {
            *fast.get_mut(band) = self.fast[band.index()].step(raw.get(band));
        }
        let low_mid_baseline = self.baseline.step(fast.low_mids);
        EnvelopeState {
            fast,
            low_mid_baseline,
        }
    }

    /// Current state without advancing
    pub fn state(&self) -> EnvelopeState {
        let mut fast = BandEnergies::ZERO;
        for band in Band::ALL {
            *fast.get_mut(band) = self.fast[band.index()].value();
        }
        EnvelopeState {
            fast,
            low_mid_baseline: self.baseline.value(),
        }
    }

    /// Drop back to silence
    pub fn reset(&mut self) {
        for pole in &mut self.fast {
            pole.reset(0.0);
        }
        self.baseline.reset(0.0);
    }
}
