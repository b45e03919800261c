//! Clamped linear interpolation helpers
//!
//! Every audio-to-visual mapping in the engine goes through [`remap`], so a
//! band value can never push a visual parameter outside its declared range.

use serde::{Deserialize, Serialize};

/// Linear interpolation between `from` and `to`.
#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Map `value` from `[in_lo, in_hi]` onto `[out_lo, out_hi]`, clamping to the output range.
///
/// Returns `out_lo` for every `value <= in_lo` and `out_hi` for every
/// `value >= in_hi`. Reversed output ranges (`out_lo > out_hi`) are allowed
/// and produce a monotonically decreasing mapping. A collapsed input range
/// acts as a step at `in_lo`, and NaN input maps to `out_lo`.
#[inline]
pub fn remap(value: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    let span = in_hi - in_lo;
    let t = if span.abs() <= f32::EPSILON {
        if value >= in_lo {
            1.0
        } else {
            0.0
        }
    } else {
        (value - in_lo) / span
    };

    if t.is_nan() || t <= 0.0 {
        out_lo
    } else if t >= 1.0 {
        out_hi
    } else {
        let (lo, hi) = if out_lo <= out_hi {
            (out_lo, out_hi)
        } else {
            (out_hi, out_lo)
        };
        let mapped = lerp(out_lo, out_hi, t);
        if mapped < lo {
            lo
        } else if mapped > hi {
            hi
        } else {
            mapped
        }
    }
}

/// A stored input/output range pair for [`remap`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemapRange {
    /// Input value mapped to `out_lo`
    pub in_lo: f32,
    /// Input value mapped to `out_hi`
    pub in_hi: f32,
    /// Output at or below `in_lo`
    pub out_lo: f32,
    /// Output at or above `in_hi`
    pub out_hi: f32,
}

impl RemapRange {
    /// Create a new range
    pub const fn new(in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> Self {
        Self {
            in_lo,
            in_hi,
            out_lo,
            out_hi,
        }
    }

    /// Apply the mapping
    #[inline]
    pub fn apply(&self, value: f32) -> f32 {
        remap(value, self.in_lo, self.in_hi, self.out_lo, self.out_hi)
    }

    /// True when every bound is a finite number
    pub fn is_finite(&self) -> bool {
        self.in_lo.is_finite()
            && self.in_hi.is_finite()
            && self.out_lo.is_finite()
            && self.out_hi.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(2.0, 4.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 4.0, 1.0), 4.0);
        assert!((lerp(1.0, 1.3, 0.4) - 1.12).abs() < 1e-6);
    }

    #[test]
    fn test_remap_clamps_both_ends() {
        assert_eq!(remap(-3.0, 0.0, 1.0, 10.0, 20.0), 10.0);
        assert_eq!(remap(0.0, 0.0, 1.0, 10.0, 20.0), 10.0);
        assert_eq!(remap(1.0, 0.0, 1.0, 10.0, 20.0), 20.0);
        assert_eq!(remap(7.0, 0.0, 1.0, 10.0, 20.0), 20.0);
        assert!((remap(0.5, 0.0, 1.0, 10.0, 20.0) - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_remap_reversed_output() {
        // Motion blur alpha falls as mids rise
        assert_eq!(remap(0.1, 0.2, 0.8, 80.0, 15.0), 80.0);
        assert_eq!(remap(0.9, 0.2, 0.8, 80.0, 15.0), 15.0);
        let mid = remap(0.5, 0.2, 0.8, 80.0, 15.0);
        assert!(mid < 80.0 && mid > 15.0);
    }

    #[test]
    fn test_remap_degenerate_input_range() {
        assert_eq!(remap(0.4, 0.5, 0.5, 0.0, 1.0), 0.0);
        assert_eq!(remap(0.5, 0.5, 0.5, 0.0, 1.0), 1.0);
        assert_eq!(remap(0.6, 0.5, 0.5, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_remap_non_finite_input() {
        assert_eq!(remap(f32::NAN, 0.0, 1.0, 3.0, 9.0), 3.0);
        assert_eq!(remap(f32::INFINITY, 0.0, 1.0, 3.0, 9.0), 9.0);
        assert_eq!(remap(f32::NEG_INFINITY, 0.0, 1.0, 3.0, 9.0), 3.0);
    }

    #[test]
    fn test_range_apply_matches_free_function() {
        let range = RemapRange::new(0.1, 1.2, 1.0, 14.0);
        for i in 0..20 {
            let x = i as f32 * 0.1;
            assert_eq!(range.apply(x), remap(x, 0.1, 1.2, 1.0, 14.0));
        }
    }
}
