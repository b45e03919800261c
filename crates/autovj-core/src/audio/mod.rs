//! Audio capture
//!
//! The analysis itself is device-agnostic; this module only connects a cpal
//! input stream to an [`AnalysisPipeline`](crate::pipeline::AnalysisPipeline).

#[cfg(feature = "audio")]
pub mod capture;

#[cfg(feature = "audio")]
pub use capture::{enumerate_input_devices, open_input_device, CaptureStream};
