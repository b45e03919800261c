//! Meter readout - bar heights, gain slider fill and pointer hit-test
//!
//! Pure geometry: the renderer draws what [`MeterReadout`] describes.

use crate::bands::{Band, BandEnergies, BAND_COUNT};
use crate::publisher::MAX_GAIN;
use crate::remap::remap;

/// Per-band bar colors, sub-bass to treble
pub const BAR_COLORS: [[u8; 3]; BAND_COUNT] = [
    [255, 80, 80],
    [255, 160, 50],
    [80, 255, 80],
    [80, 180, 255],
    [180, 80, 255],
];

/// Band value drawn as a full-height bar
pub const BAR_FULL_SCALE: f32 = 5.0;

/// Meter panel geometry in window pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterLayout {
    /// Left edge of the bars
    pub x_base: f32,
    /// Tallest bar
    pub max_bar_height: f32,
    /// Bar width
    pub bar_width: f32,
    /// Gap between bars
    pub bar_gap: f32,
    /// Slider track height
    pub slider_height: f32,
}

impl Default for MeterLayout {
    fn default() -> Self {
        Self {
            x_base: 15.0,
            max_bar_height: 100.0,
            bar_width: 28.0,
            bar_gap: 6.0,
            slider_height: 12.0,
        }
    }
}

impl MeterLayout {
    /// Width spanned by the five bars, also the slider track width
    pub fn slider_width(&self) -> f32 {
        (self.bar_width + self.bar_gap) * (BAND_COUNT - 1) as f32 + self.bar_width
    }

    /// Left edge of the bar for `band`
    pub fn bar_x(&self, band: Band) -> f32 {
        self.x_base + band.index() as f32 * (self.bar_width + self.bar_gap)
    }
}

/// One meter bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarReadout {
    /// Band shown
    pub band: Band,
    /// Left edge
    pub x: f32,
    /// Height in pixels, `[0, max_bar_height]`
    pub height: f32,
    /// Fill color
    pub color: [u8; 3],
}

/// Everything the meter draws for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct MeterReadout {
    /// Bars, sub-bass to treble
    pub bars: [BarReadout; BAND_COUNT],
    /// Width of the gain slider fill
    pub gain_fill: f32,
    /// Gain label, e.g. `GAIN: 1.0`
    pub gain_label: String,
}

impl MeterReadout {
    /// Build the readout for the current bands and gain
    pub fn new(layout: &MeterLayout, bands: &BandEnergies, gain: f32) -> Self {
        let bars = Band::ALL.map(|band| BarReadout {
            band,
            x: layout.bar_x(band),
            height: remap(
                bands.get(band),
                0.0,
                BAR_FULL_SCALE,
                0.0,
                layout.max_bar_height,
            ),
            color: BAR_COLORS[band.index()],
        });
        Self {
            bars,
            gain_fill: remap(gain, 0.0, MAX_GAIN, 0.0, layout.slider_width()),
            gain_label: gain_label(gain),
        }
    }
}

/// `GAIN: x.y`
pub fn gain_label(gain: f32) -> String {
    format!("GAIN: {:.1}", gain)
}

/// Clickable gain slider region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainSlider {
    /// Left edge
    pub x_start: f32,
    /// Top edge
    pub y: f32,
    /// Track width
    pub width: f32,
    /// Clickable height
    pub height: f32,
}

impl GainSlider {
    /// Slider region for a window of the given height
    pub fn for_window(window_height: f32) -> Self {
        Self {
            x_start: 15.0,
            y: window_height - 240.0 + 180.0,
            width: 164.0,
            height: 15.0,
        }
    }

    /// True when the point lies on the slider (edges included)
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x_start
            && x <= self.x_start + self.width
            && y >= self.y
            && y <= self.y + self.height
    }

    /// Gain selected by a press at `(x, y)`, or `None` when the press misses
    pub fn hit(&self, x: f32, y: f32) -> Option<f32> {
        if !self.contains(x, y) {
            return None;
        }
        Some(remap(x, self.x_start, self.x_start + self.width, 0.0, MAX_GAIN))
    }
}
