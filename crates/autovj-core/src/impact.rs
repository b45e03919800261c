//! Impact Detector - self-relative transient detection and the strobe pulse
//!
//! An impact is low-frequency energy exceeding its own rolling baseline by a
//! margin, so the detector follows the overall loudness instead of relying on
//! an absolute threshold. Strong impacts arm a monostable strobe timer.

use serde::{Deserialize, Serialize};

/// Detector constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    /// Headroom above the baseline before anything counts as an impact
    pub margin: f32,
    /// Impact delta above which the strobe fires
    pub trigger_threshold: f32,
    /// Strobe decrement per tick
    pub strobe_decay: f32,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            margin: 0.12,
            trigger_threshold: 0.45,
            strobe_decay: 0.1,
        }
    }
}

impl ImpactConfig {
    /// Check the configuration, returning a description of the first problem found
    pub fn check(&self) -> Option<String> {
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Some(format!("impact margin must be >= 0, got {}", self.margin));
        }
        if !self.trigger_threshold.is_finite() || self.trigger_threshold < 0.0 {
            return Some(format!(
                "trigger threshold must be >= 0, got {}",
                self.trigger_threshold
            ));
        }
        if !self.strobe_decay.is_finite() || self.strobe_decay <= 0.0 || self.strobe_decay > 1.0 {
            return Some(format!(
                "strobe decay must be in (0, 1], got {}",
                self.strobe_decay
            ));
        }
        None
    }
}

/// `max(0, fast - (baseline + margin))`, never NaN
#[inline]
pub fn impact_delta(fast: f32, baseline: f32, margin: f32) -> f32 {
    let delta = fast - (baseline + margin);
    if delta > 0.0 && delta.is_finite() {
        delta
    } else {
        0.0
    }
}

/// Monostable pulse: set to 1.0 on trigger, falls by a fixed step per tick.
///
/// The timer counts whole ticks so it reaches exactly zero after
/// `ceil(1 / step)` ticks, independent of floating-point accumulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrobeTimer {
    step: f32,
    duration_ticks: u32,
    elapsed_ticks: u32,
}

impl StrobeTimer {
    /// Create an idle timer decaying by `step` per tick
    pub fn new(step: f32) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step.min(1.0)
        } else {
            1.0
        };
        let duration_ticks = (1.0 / step).ceil().max(1.0) as u32;
        Self {
            step,
            duration_ticks,
            elapsed_ticks: duration_ticks,
        }
    }

    /// Arm the pulse at full strength
    pub fn trigger(&mut self) {
        self.elapsed_ticks = 0;
    }

    /// Advance one tick and return the new level
    pub fn tick(&mut self) -> f32 {
        if self.elapsed_ticks < self.duration_ticks {
            self.elapsed_ticks += 1;
        }
        self.value()
    }

    /// Current level in `[0, 1]`
    pub fn value(&self) -> f32 {
        if self.elapsed_ticks >= self.duration_ticks {
            0.0
        } else {
            (1.0 - self.elapsed_ticks as f32 * self.step).clamp(0.0, 1.0)
        }
    }

    /// True while the pulse is above zero
    pub fn is_active(&self) -> bool {
        self.value() > 0.0
    }

    /// Ticks from trigger until the pulse reaches zero
    pub fn duration_ticks(&self) -> u32 {
        self.duration_ticks
    }

    /// Silence the pulse
    pub fn reset(&mut self) {
        self.elapsed_ticks = self.duration_ticks;
    }
}

/// Result of one detector pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImpactState {
    /// How far the fast low-mid envelope exceeds its baseline plus margin
    pub impact_delta: f32,
    /// Strobe level in `[0, 1]`
    pub strobe: f32,
    /// True when this pass (re)armed the strobe
    pub triggered: bool,
}

/// Stateful detector: computes the impact delta and drives the strobe timer.
///
/// The baseline is owned by the caller. The audio thread passes the
/// envelope smoother's baseline; the render loop keeps its own, slower-paced
/// baseline and runs a second detector instance.
#[derive(Debug, Clone)]
pub struct ImpactDetector {
    config: ImpactConfig,
    strobe: StrobeTimer,
}

impl ImpactDetector {
    /// Create a detector
    pub fn new(config: ImpactConfig) -> Self {
        Self {
            config,
            strobe: StrobeTimer::new(config.strobe_decay),
        }
    }

    /// Constants in use
    pub fn config(&self) -> &ImpactConfig {
        &self.config
    }

    /// One pass: decay the strobe, compute the delta and re-arm on a qualifying transient.
    ///
    /// `baseline` must already include the current frame.
    pub fn update(&mut self, fast_low_mids: f32, baseline: f32) -> ImpactState {
        self.strobe.tick();
        let delta = impact_delta(fast_low_mids, baseline, self.config.margin);
        let triggered = delta > self.config.trigger_threshold;
        if triggered {
            self.strobe.trigger();
        }
        ImpactState {
            impact_delta: delta,
            strobe: self.strobe.value(),
            triggered,
        }
    }

    /// Arm the strobe from outside (e.g. a trigger observed on another thread)
    pub fn trigger_strobe(&mut self) {
        self.strobe.trigger();
    }

    /// Current strobe level
    pub fn strobe(&self) -> f32 {
        self.strobe.value()
    }

    /// Silence the strobe
    pub fn reset(&mut self) {
        self.strobe.reset();
    }
}

impl Default for ImpactDetector {
    fn default() -> Self {
        Self::new(ImpactConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_examples() {
        assert!((impact_delta(0.6, 0.1, 0.1) - 0.4).abs() < 1e-6);
        assert!((impact_delta(0.7, 0.1, 0.1) - 0.5).abs() < 1e-6);
        assert_eq!(impact_delta(0.1, 0.5, 0.1), 0.0);
        assert_eq!(impact_delta(f32::NAN, 0.0, 0.1), 0.0);
        assert_eq!(impact_delta(f32::INFINITY, 0.0, 0.1), 0.0);
    }

    #[test]
    fn test_threshold_scenario() {
        let config = ImpactConfig {
            margin: 0.1,
            trigger_threshold: 0.45,
            strobe_decay: 0.1,
        };
        let mut detector = ImpactDetector::new(config);

        let quiet = detector.update(0.6, 0.1);
        assert!((quiet.impact_delta - 0.4).abs() < 1e-6);
        assert!(!quiet.triggered);
        assert_eq!(quiet.strobe, 0.0);

        let hit = detector.update(0.7, 0.1);
        assert!(hit.impact_delta >= 0.45);
        assert!(hit.triggered);
        assert_eq!(hit.strobe, 1.0);
    }

    #[test]
    fn test_strobe_duration_is_exact() {
        for step in [0.1f32, 0.25, 0.3, 0.07, 1.0] {
            let mut timer = StrobeTimer::new(step);
            timer.trigger();
            assert_eq!(timer.value(), 1.0);
            let expected = (1.0 / step).ceil() as u32;
            for tick in 1..expected {
                let v = timer.tick();
                assert!(v > 0.0, "step {} tick {} already at zero", step, tick);
            }
            assert_eq!(timer.tick(), 0.0);
            assert_eq!(timer.tick(), 0.0);
            assert!(!timer.is_active());
        }
    }

    #[test]
    fn test_strobe_decays_linearly() {
        let mut timer = StrobeTimer::new(0.1);
        timer.trigger();
        timer.tick();
        assert!((timer.value() - 0.9).abs() < 1e-6);
        timer.tick();
        assert!((timer.value() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_retrigger_rearms_full_strength() {
        let mut detector = ImpactDetector::default();
        detector.update(1.0, 0.0);
        for _ in 0..5 {
            detector.update(0.0, 0.0);
        }
        assert!(detector.strobe() < 1.0);
        let state = detector.update(1.0, 0.0);
        assert!(state.triggered);
        assert_eq!(state.strobe, 1.0);
    }

    #[test]
    fn test_invalid_step_falls_back_to_single_tick() {
        let mut timer = StrobeTimer::new(0.0);
        timer.trigger();
        assert_eq!(timer.duration_ticks(), 1);
        assert_eq!(timer.tick(), 0.0);
    }

    #[test]
    fn test_config_check() {
        assert!(ImpactConfig::default().check().is_none());
        let bad = ImpactConfig {
            strobe_decay: 0.0,
            ..ImpactConfig::default()
        };
        assert!(bad.check().is_some());
    }
}
