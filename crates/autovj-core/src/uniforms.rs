//! Shader uniform block for the glitch pass

use crate::visual::VisualParams;
use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Uniforms for the glitch shader
/// Note: 64 bytes, `resolution` first so the vec2 stays 8-byte aligned
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable, PartialEq)]
pub struct ShaderUniforms {
    /// Source frame size in pixels
    pub resolution: [f32; 2], // 8 bytes
    /// Seconds since start
    pub time: f32, // 4 bytes
    /// Pixelation block size
    pub pixel_size: f32, // 4 bytes
    /// Channel separation in pixels
    pub rgb_shift: f32, // 4 bytes
    /// Draw-time impact delta
    pub impact_delta: f32, // 4 bytes
    /// Zoom times bounce
    pub scale: f32, // 4 bytes
    /// Strobe level
    pub strobe: f32, // 4 bytes
    /// Sub-bass envelope
    pub sub_bass: f32, // 4 bytes
    /// Low-mid envelope
    pub low_mids: f32, // 4 bytes
    /// Mid envelope
    pub mids: f32, // 4 bytes
    /// High-mid envelope
    pub high_mids: f32, // 4 bytes
    /// Treble envelope
    pub treble: f32, // 4 bytes
    /// Pattern threshold
    pub low_thresh: f32, // 4 bytes
    /// Block threshold
    pub high_thresh: f32, // 4 bytes
    /// 1 when the image is inverted
    pub invert: u32, // 4 bytes (total 64 bytes)
}

impl ShaderUniforms {
    /// Pack one frame's parameters
    pub fn from_params(params: &VisualParams, time: f32, resolution: Vec2) -> Self {
        Self {
            resolution: resolution.to_array(),
            time,
            pixel_size: params.pixel_size,
            rgb_shift: params.rgb_shift,
            impact_delta: params.draw_impact,
            scale: params.scale,
            strobe: params.strobe,
            sub_bass: params.bands.sub_bass,
            low_mids: params.bands.low_mids,
            mids: params.bands.mids,
            high_mids: params.bands.high_mids,
            treble: params.bands.treble,
            low_thresh: params.low_thresh,
            high_thresh: params.high_thresh,
            invert: params.invert as u32,
        }
    }

    /// Raw bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::BandEnergies;

    #[test]
    fn test_uniform_size_is_std140_friendly() {
        assert_eq!(std::mem::size_of::<ShaderUniforms>(), 64);
        assert_eq!(std::mem::size_of::<ShaderUniforms>() % 16, 0);
    }

    #[test]
    fn test_from_params() {
        let params = VisualParams {
            bands: BandEnergies::from_array([0.9, 0.2, 0.3, 0.4, 0.5]),
            pixel_size: 3.0,
            rgb_shift: 7.5,
            draw_impact: 0.25,
            scale: 1.2,
            invert: true,
            low_thresh: 0.1,
            high_thresh: 0.8,
            ..VisualParams::default()
        };
        let uniforms = params.uniforms(1.5, Vec2::new(1920.0, 1080.0));
        assert_eq!(uniforms.resolution, [1920.0, 1080.0]);
        assert_eq!(uniforms.time, 1.5);
        assert_eq!(uniforms.impact_delta, 0.25);
        assert_eq!(uniforms.sub_bass, 0.9);
        assert_eq!(uniforms.invert, 1);
        assert_eq!(uniforms.as_bytes().len(), 64);
    }
}
