//! Visual Parameter Mapper - render-thread envelopes and audio→visual mappings
//!
//! Runs once per render frame on a [`ControlSnapshot`]. The mapper keeps its
//! own low-mid baseline and impact detector, advanced at render cadence.
//! This is a second state machine next to the audio-thread one, not a copy
//! of it: the two baselines move at different rates and both are needed.

use crate::bands::BandEnergies;
use crate::envelope::{AttackRelease, OnePole};
use crate::impact::{impact_delta, ImpactConfig, ImpactDetector};
use crate::publisher::ControlSnapshot;
use crate::remap::{remap, RemapRange};
use crate::uniforms::ShaderUniforms;
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Mapper constants. Defaults reproduce the stock look.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    /// Render-side impact detector (margin, strobe trigger, strobe decay per frame)
    pub impact: ImpactConfig,
    /// Render-side low-mid baseline smoothing factor
    pub baseline_alpha: f32,
    /// Impact deltas at or below this are treated as noise
    pub impact_floor: f32,
    /// Impact delta → normalized impact in `[0, 1]`
    pub impact_range: RemapRange,
    /// Zoom added at full impact
    pub zoom_depth: f32,
    /// Zoom attack factor
    pub zoom_attack: f32,
    /// Zoom release factor
    pub zoom_release: f32,
    /// RGB shift (pixels) at full impact
    pub rgb_bloom: f32,
    /// RGB shift attack factor
    pub rgb_attack: f32,
    /// RGB shift release factor
    pub rgb_release: f32,
    /// Hue chase factor
    pub hue_alpha: f32,
    /// Margin for the draw-time impact used by bounce and RGB shift
    pub draw_impact_margin: f32,
    /// Draw-time impact is clamped to `[0, draw_impact_max]`
    pub draw_impact_max: f32,
    /// Bounce scale per unit of draw-time impact
    pub bounce_gain: f32,
    /// Sub-bass above this adds no further RGB shift
    pub sub_bass_max: f32,
    /// RGB shift per unit of sub-bass
    pub rgb_sub_bass_gain: f32,
    /// Mids → motion blur overlay alpha (0-255)
    pub blur_alpha: RemapRange,
    /// High mids → translation jitter
    pub jitter: RemapRange,
    /// Jitter at or below this is not applied
    pub jitter_floor: f32,
    /// Treble → shader pixel size
    pub pixel_size: RemapRange,
    /// Sub-bass above this inverts the image
    pub invert_threshold: f32,
    /// High mids → tint brightness (0-255)
    pub brightness: RemapRange,
    /// Tint saturation (0-255)
    pub saturation: f32,
    /// Mids above this enable horizontal slicing
    pub slice_threshold: f32,
    /// Mids → number of slices
    pub slice_count: RemapRange,
    /// Mids → maximum horizontal slice offset
    pub slice_shift: RemapRange,
    /// Strobe level → white overlay alpha
    pub strobe_alpha_gain: f32,
    /// Shader pattern threshold
    pub low_thresh: f32,
    /// Shader block threshold
    pub high_thresh: f32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            impact: ImpactConfig::default(),
            baseline_alpha: 0.05,
            impact_floor: 0.05,
            impact_range: RemapRange::new(0.05, 0.5, 0.0, 1.0),
            zoom_depth: 0.35,
            zoom_attack: 0.4,
            zoom_release: 0.08,
            rgb_bloom: 120.0,
            rgb_attack: 0.5,
            rgb_release: 0.1,
            hue_alpha: 0.05,
            draw_impact_margin: 0.1,
            draw_impact_max: 5.0,
            bounce_gain: 18.0,
            sub_bass_max: 5.0,
            rgb_sub_bass_gain: 8.0,
            blur_alpha: RemapRange::new(0.2, 0.8, 80.0, 15.0),
            jitter: RemapRange::new(0.3, 1.0, 0.0, 0.3),
            jitter_floor: 0.01,
            pixel_size: RemapRange::new(0.1, 1.2, 1.0, 14.0),
            invert_threshold: 0.8,
            brightness: RemapRange::new(0.2, 0.8, 150.0, 190.0),
            saturation: 160.0,
            slice_threshold: 0.25,
            slice_count: RemapRange::new(0.25, 1.0, 16.0, 64.0),
            slice_shift: RemapRange::new(0.25, 1.0, 0.5, 4.0),
            strobe_alpha_gain: 40.0,
            low_thresh: 0.10,
            high_thresh: 0.80,
        }
    }
}

impl VisualConfig {
    /// Check the configuration, returning a description of the first problem found
    pub fn check(&self) -> Option<String> {
        if let Some(problem) = self.impact.check() {
            return Some(problem);
        }
        for (name, factor) in [
            ("baseline_alpha", self.baseline_alpha),
            ("zoom_attack", self.zoom_attack),
            ("zoom_release", self.zoom_release),
            ("rgb_attack", self.rgb_attack),
            ("rgb_release", self.rgb_release),
            ("hue_alpha", self.hue_alpha),
        ] {
            if !(factor > 0.0 && factor <= 1.0) {
                return Some(format!("{} must be in (0, 1], got {}", name, factor));
            }
        }
        for (name, range) in [
            ("impact_range", self.impact_range),
            ("blur_alpha", self.blur_alpha),
            ("jitter", self.jitter),
            ("pixel_size", self.pixel_size),
            ("brightness", self.brightness),
            ("slice_count", self.slice_count),
            ("slice_shift", self.slice_shift),
        ] {
            if !range.is_finite() {
                return Some(format!("{} has non-finite bounds: {:?}", name, range));
            }
        }
        for (name, value) in [
            ("impact_floor", self.impact_floor),
            ("zoom_depth", self.zoom_depth),
            ("rgb_bloom", self.rgb_bloom),
            ("draw_impact_margin", self.draw_impact_margin),
            ("draw_impact_max", self.draw_impact_max),
            ("bounce_gain", self.bounce_gain),
            ("sub_bass_max", self.sub_bass_max),
            ("rgb_sub_bass_gain", self.rgb_sub_bass_gain),
            ("jitter_floor", self.jitter_floor),
            ("invert_threshold", self.invert_threshold),
            ("saturation", self.saturation),
            ("slice_threshold", self.slice_threshold),
            ("strobe_alpha_gain", self.strobe_alpha_gain),
            ("low_thresh", self.low_thresh),
            ("high_thresh", self.high_thresh),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Some(format!("{} must be finite and >= 0, got {}", name, value));
            }
        }
        if self.slice_count.out_lo < 0.0 || self.slice_count.out_hi < 0.0 {
            return Some("slice_count output range must be >= 0".to_string());
        }
        let (max_scale, max_rgb_shift) = self.output_ceilings();
        if !max_scale.is_finite() || !max_rgb_shift.is_finite() {
            return Some(format!(
                "largest scale ({}) and RGB shift ({}) must be finite",
                max_scale, max_rgb_shift
            ));
        }
        None
    }

    /// Largest `scale` and `rgb_shift` the mapper can emit
    pub fn output_ceilings(&self) -> (f32, f32) {
        let max_impact = self
            .impact_range
            .out_lo
            .max(self.impact_range.out_hi)
            .max(0.0);
        let max_zoom = 1.0 + max_impact * self.zoom_depth;
        let max_bounce = 1.0 + self.draw_impact_max * self.bounce_gain;
        let max_rgb_shift =
            self.sub_bass_max * self.rgb_sub_bass_gain + max_impact * self.rgb_bloom;
        (max_zoom * max_bounce, max_rgb_shift)
    }
}

/// Tint color in 0-255 HSB space
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HsbColor {
    /// Hue, wrapped into `[0, 255)`
    pub hue: f32,
    /// Saturation
    pub saturation: f32,
    /// Brightness
    pub brightness: f32,
}

impl HsbColor {
    /// Convert to 8-bit RGB
    pub fn to_rgb8(&self) -> [u8; 3] {
        let s = (self.saturation / 255.0).clamp(0.0, 1.0);
        let v = (self.brightness / 255.0).clamp(0.0, 1.0);
        let h = (self.hue.rem_euclid(255.0) / 255.0) * 6.0;

        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        let (r, g, b) = match sector as u32 % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        [
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
        ]
    }
}

/// Final per-frame parameters handed to the renderer and HUD
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VisualParams {
    /// Band values the frame was derived from
    pub bands: BandEnergies,
    /// Render-side impact delta (envelope margin)
    pub impact_delta: f32,
    /// Impact normalized to `[0, 1]` after the noise floor
    pub clean_impact: f32,
    /// Draw-time impact delta (draw margin), drives bounce and shader
    pub draw_impact: f32,
    /// Zoom envelope, 1.0 at rest
    pub zoom: f32,
    /// `1 + draw_impact * bounce_gain`
    pub bounce_scale: f32,
    /// Total uniform scale, `zoom * bounce_scale`
    pub scale: f32,
    /// RGB bloom envelope, 0.0 at rest
    pub smoothed_rgb_shift: f32,
    /// RGB shift uniform: sub-bass contribution plus bloom
    pub rgb_shift: f32,
    /// Hue envelope (unwrapped)
    pub smoothed_hue: f32,
    /// Tint color
    pub color: HsbColor,
    /// Motion blur overlay alpha (0-255)
    pub blur_alpha: f32,
    /// Maximum translation jitter, 0.0 when below the floor
    pub jitter_amount: f32,
    /// Shader pixel size
    pub pixel_size: f32,
    /// Invert the image this frame
    pub invert: bool,
    /// Horizontal slices, 0 when slicing is off
    pub slice_count: u32,
    /// Maximum horizontal slice offset
    pub max_slice_shift: f32,
    /// Render-side strobe level in `[0, 1]`
    pub strobe: f32,
    /// White overlay alpha (0-255)
    pub strobe_alpha: f32,
    /// Shader pattern threshold
    pub low_thresh: f32,
    /// Shader block threshold
    pub high_thresh: f32,
}

impl VisualParams {
    /// True when the frame should be drawn as slices
    pub fn is_sliced(&self) -> bool {
        self.slice_count > 0
    }

    /// Random translation in `[-jitter, jitter]²`, zero when jitter is off
    pub fn jitter_offset<R: Rng>(&self, rng: &mut R) -> Vec2 {
        if self.jitter_amount <= 0.0 {
            return Vec2::ZERO;
        }
        let j = self.jitter_amount;
        Vec2::new(rng.random_range(-j..=j), rng.random_range(-j..=j))
    }

    /// Fill `out` with one random horizontal offset per slice
    pub fn slice_offsets<R: Rng>(&self, rng: &mut R, out: &mut Vec<f32>) {
        out.clear();
        let shift = self.max_slice_shift;
        out.extend((0..self.slice_count).map(|_| {
            if shift > 0.0 {
                rng.random_range(-shift..=shift)
            } else {
                0.0
            }
        }));
    }

    /// Pack the shader inputs
    pub fn uniforms(&self, time: f32, resolution: Vec2) -> ShaderUniforms {
        ShaderUniforms::from_params(self, time, resolution)
    }
}

/// Render-thread state machine producing [`VisualParams`] once per frame
#[derive(Debug, Clone)]
pub struct VisualMapper {
    config: VisualConfig,
    baseline: OnePole,
    detector: ImpactDetector,
    zoom: AttackRelease,
    rgb_shift: AttackRelease,
    hue: OnePole,
    target_hue: f32,
    last_strobe_generation: Option<u32>,
}

impl VisualMapper {
    /// Create a mapper at rest
    pub fn new(config: VisualConfig) -> Self {
        Self {
            config,
            baseline: OnePole::new(0.0, config.baseline_alpha),
            detector: ImpactDetector::new(config.impact),
            zoom: AttackRelease::new(1.0, config.zoom_attack, config.zoom_release),
            rgb_shift: AttackRelease::new(0.0, config.rgb_attack, config.rgb_release),
            hue: OnePole::new(0.0, config.hue_alpha),
            target_hue: 0.0,
            last_strobe_generation: None,
        }
    }

    /// Constants in use
    pub fn config(&self) -> &VisualConfig {
        &self.config
    }

    /// Set the hue the tint drifts toward
    pub fn set_target_hue(&mut self, hue: f32) {
        if hue.is_finite() {
            self.target_hue = hue;
        }
    }

    /// Render-side low-mid baseline
    pub fn baseline(&self) -> f32 {
        self.baseline.value()
    }

    /// Current zoom envelope
    pub fn zoom(&self) -> f32 {
        self.zoom.value()
    }

    /// Advance one render frame
    pub fn update(&mut self, snapshot: &ControlSnapshot) -> VisualParams {
        let cfg = &self.config;
        let bands = snapshot.bands;

        // Baseline first, then the detector reads it
        let baseline = self.baseline.step(bands.low_mids);
        let impact = self.detector.update(bands.low_mids, baseline);

        // A trigger seen by the audio thread since last frame also fires the strobe
        if let Some(previous) = self.last_strobe_generation {
            if previous != snapshot.strobe_generation {
                self.detector.trigger_strobe();
            }
        }
        self.last_strobe_generation = Some(snapshot.strobe_generation);

        let clean_impact = if impact.impact_delta > cfg.impact_floor {
            cfg.impact_range.apply(impact.impact_delta)
        } else {
            0.0
        };

        let zoom = self.zoom.step(1.0 + clean_impact * cfg.zoom_depth);
        let smoothed_rgb_shift = self.rgb_shift.step(clean_impact * cfg.rgb_bloom);
        let smoothed_hue = self.hue.step(self.target_hue);

        let draw_impact = remap(
            impact_delta(bands.low_mids, baseline, cfg.draw_impact_margin),
            0.0,
            cfg.draw_impact_max,
            0.0,
            cfg.draw_impact_max,
        );
        let bounce_scale = 1.0 + draw_impact * cfg.bounce_gain;
        let sub_bass_shift = remap(
            bands.sub_bass,
            0.0,
            cfg.sub_bass_max,
            0.0,
            cfg.sub_bass_max * cfg.rgb_sub_bass_gain,
        );

        let jitter = cfg.jitter.apply(bands.high_mids);
        let jitter_amount = if jitter > cfg.jitter_floor { jitter } else { 0.0 };

        let (slice_count, max_slice_shift) = if bands.mids > cfg.slice_threshold {
            (
                cfg.slice_count.apply(bands.mids) as u32,
                cfg.slice_shift.apply(bands.mids),
            )
        } else {
            (0, 0.0)
        };

        let strobe = self.detector.strobe();

        VisualParams {
            bands,
            impact_delta: impact.impact_delta,
            clean_impact,
            draw_impact,
            zoom,
            bounce_scale,
            scale: zoom * bounce_scale,
            smoothed_rgb_shift,
            rgb_shift: sub_bass_shift + smoothed_rgb_shift,
            smoothed_hue,
            color: HsbColor {
                hue: smoothed_hue.rem_euclid(255.0),
                saturation: cfg.saturation,
                brightness: cfg.brightness.apply(bands.high_mids),
            },
            blur_alpha: cfg.blur_alpha.apply(bands.mids),
            jitter_amount,
            pixel_size: cfg.pixel_size.apply(bands.treble),
            invert: bands.sub_bass > cfg.invert_threshold,
            slice_count,
            max_slice_shift,
            strobe,
            strobe_alpha: strobe * cfg.strobe_alpha_gain,
            low_thresh: cfg.low_thresh,
            high_thresh: cfg.high_thresh,
        }
    }

    /// Return every envelope to rest
    pub fn reset(&mut self) {
        self.baseline.reset(0.0);
        self.detector.reset();
        self.zoom.reset();
        self.rgb_shift.reset();
        self.hue.reset(0.0);
        self.last_strobe_generation = None;
    }
}

impl Default for VisualMapper {
    fn default() -> Self {
        Self::new(VisualConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn snapshot(bands: BandEnergies) -> ControlSnapshot {
        ControlSnapshot {
            bands,
            ..ControlSnapshot::default()
        }
    }

    #[test]
    fn test_silence_is_at_rest() {
        let mut mapper = VisualMapper::default();
        let params = mapper.update(&snapshot(BandEnergies::ZERO));
        assert_eq!(params.zoom, 1.0);
        assert_eq!(params.scale, 1.0);
        assert_eq!(params.smoothed_rgb_shift, 0.0);
        assert_eq!(params.blur_alpha, 80.0);
        assert_eq!(params.pixel_size, 1.0);
        assert_eq!(params.jitter_amount, 0.0);
        assert_eq!(params.slice_count, 0);
        assert!(!params.invert);
        assert_eq!(params.strobe, 0.0);
        assert_eq!(params.color.brightness, 150.0);
    }

    #[test]
    fn test_impact_snaps_zoom_and_rgb() {
        let mut mapper = VisualMapper::default();
        let bands = BandEnergies {
            low_mids: 1.0,
            ..BandEnergies::ZERO
        };
        let params = mapper.update(&snapshot(bands));
        // baseline = 0.05, delta = 1.0 - 0.17 = 0.83 -> clean impact 1.0
        assert!((mapper.baseline() - 0.05).abs() < 1e-6);
        assert!((params.impact_delta - 0.83).abs() < 1e-5);
        assert_eq!(params.clean_impact, 1.0);
        assert!((params.zoom - (1.0 + 0.35 * 0.4)).abs() < 1e-5);
        assert!((params.smoothed_rgb_shift - 60.0).abs() < 1e-4);
        assert_eq!(params.strobe, 1.0);
        assert_eq!(params.strobe_alpha, 40.0);
        assert!(params.bounce_scale > 1.0);
    }

    #[test]
    fn test_release_is_slower_than_attack() {
        let mut mapper = VisualMapper::default();
        let hit = BandEnergies {
            low_mids: 1.0,
            ..BandEnergies::ZERO
        };
        let peak = mapper.update(&snapshot(hit)).zoom;
        let after = mapper.update(&snapshot(BandEnergies::ZERO)).zoom;
        let released = peak - after;
        assert!(released > 0.0);
        assert!((after - (1.0 + (peak - 1.0) * 0.92)).abs() < 1e-5);
    }

    #[test]
    fn test_audio_trigger_fires_render_strobe() {
        let mut mapper = VisualMapper::default();
        let mut snap = snapshot(BandEnergies::ZERO);
        snap.strobe_generation = 7;
        // First frame only records the generation
        assert_eq!(mapper.update(&snap).strobe, 0.0);
        snap.strobe_generation = 8;
        assert_eq!(mapper.update(&snap).strobe, 1.0);
        let decayed = mapper.update(&snap).strobe;
        assert!((decayed - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_slicing_and_invert() {
        let mut mapper = VisualMapper::default();
        let bands = BandEnergies {
            sub_bass: 0.9,
            mids: 1.0,
            ..BandEnergies::ZERO
        };
        let params = mapper.update(&snapshot(bands));
        assert!(params.invert);
        assert_eq!(params.slice_count, 64);
        assert_eq!(params.max_slice_shift, 4.0);
        assert_eq!(params.blur_alpha, 15.0);
        assert!((params.rgb_shift - 0.9 * 8.0).abs() < 1e-5);

        let mut rng = StdRng::seed_from_u64(1);
        let mut offsets = Vec::new();
        params.slice_offsets(&mut rng, &mut offsets);
        assert_eq!(offsets.len(), 64);
        assert!(offsets.iter().all(|o| o.abs() <= 4.0));
    }

    #[test]
    fn test_jitter_offset_bounds() {
        let mut mapper = VisualMapper::default();
        let bands = BandEnergies {
            high_mids: 1.0,
            ..BandEnergies::ZERO
        };
        let params = mapper.update(&snapshot(bands));
        assert!((params.jitter_amount - 0.3).abs() < 1e-6);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let offset = params.jitter_offset(&mut rng);
            assert!(offset.x.abs() <= 0.3 && offset.y.abs() <= 0.3);
        }
        let calm = VisualParams::default();
        assert_eq!(calm.jitter_offset(&mut rng), Vec2::ZERO);
    }

    #[test]
    fn test_hue_chases_target() {
        let mut mapper = VisualMapper::default();
        mapper.set_target_hue(100.0);
        let params = mapper.update(&snapshot(BandEnergies::ZERO));
        assert!((params.smoothed_hue - 5.0).abs() < 1e-5);
        for _ in 0..400 {
            mapper.update(&snapshot(BandEnergies::ZERO));
        }
        let params = mapper.update(&snapshot(BandEnergies::ZERO));
        assert!((params.smoothed_hue - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_hue_wraps_for_color() {
        let mut mapper = VisualMapper::default();
        mapper.set_target_hue(600.0);
        for _ in 0..600 {
            mapper.update(&snapshot(BandEnergies::ZERO));
        }
        let params = mapper.update(&snapshot(BandEnergies::ZERO));
        assert!(params.color.hue >= 0.0 && params.color.hue < 255.0);
    }

    #[test]
    fn test_reset_returns_to_rest() {
        let mut mapper = VisualMapper::default();
        mapper.set_target_hue(50.0);
        let bands = BandEnergies {
            low_mids: 1.0,
            ..BandEnergies::ZERO
        };
        mapper.update(&snapshot(bands));
        mapper.reset();
        assert_eq!(mapper.zoom(), 1.0);
        assert_eq!(mapper.baseline(), 0.0);
        let params = mapper.update(&snapshot(BandEnergies::ZERO));
        assert_eq!(params.strobe, 0.0);
    }

    #[test]
    fn test_hsb_to_rgb() {
        let white = HsbColor {
            hue: 0.0,
            saturation: 0.0,
            brightness: 255.0,
        };
        assert_eq!(white.to_rgb8(), [255, 255, 255]);
        let red = HsbColor {
            hue: 0.0,
            saturation: 255.0,
            brightness: 255.0,
        };
        assert_eq!(red.to_rgb8(), [255, 0, 0]);
        let black = HsbColor::default();
        assert_eq!(black.to_rgb8(), [0, 0, 0]);
    }

    #[test]
    fn test_huge_bands_give_bounded_outputs() {
        let mut mapper = VisualMapper::default();
        let (max_scale, max_rgb_shift) = mapper.config().output_ceilings();
        let bands = BandEnergies::from_array([1e38, 1e38, 0.0, 0.0, 0.0]);
        for _ in 0..5 {
            let params = mapper.update(&snapshot(bands));
            assert_eq!(params.draw_impact, 5.0);
            assert_eq!(params.bounce_scale, 91.0);
            assert!(params.scale.is_finite() && params.scale <= max_scale * (1.0 + 1e-6));
            assert!(params.rgb_shift.is_finite() && params.rgb_shift <= max_rgb_shift + 1e-3);

            let uniforms = params.uniforms(1.0, Vec2::new(640.0, 480.0));
            assert!(uniforms.scale.is_finite());
            assert!(uniforms.rgb_shift.is_finite());
            assert!(uniforms.impact_delta.is_finite());
        }
    }

    #[test]
    fn test_config_check() {
        assert!(VisualConfig::default().check().is_none());
        let overflowing = VisualConfig {
            draw_impact_max: 1e30,
            bounce_gain: 1e30,
            ..VisualConfig::default()
        };
        assert!(overflowing.check().is_some());
        let bad = VisualConfig {
            zoom_attack: 1.5,
            ..VisualConfig::default()
        };
        assert!(bad.check().is_some());
    }
}
