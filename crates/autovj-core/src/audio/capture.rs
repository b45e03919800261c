//! cpal input stream feeding the analysis pipeline
//!
//! The pipeline is moved into the data callback at start; from then on the
//! callback is its only owner. Stream errors are forwarded through a bounded
//! channel and dropped when the channel is full, so the callback never waits.

use crate::devices::{DeviceEntry, StreamSettings};
use crate::error::{CoreError, Result};
use crate::pipeline::{AnalysisPipeline, AudioFrame};
use crate::spectrum::SpectrumProvider;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver};
use tracing::{debug, info, warn};

/// Rates offered after the device default, in order of preference
const COMMON_SAMPLE_RATES: [u32; 3] = [44100, 48000, 96000];

/// Pending stream errors kept before new ones are dropped
const ERROR_QUEUE_DEPTH: usize = 16;

/// List input-capable devices on the default host
pub fn enumerate_input_devices() -> Result<Vec<DeviceEntry>> {
    let host = cpal::default_host();
    let mut entries = Vec::new();

    for device in host.input_devices()? {
        let name = match device.name() {
            Ok(name) => name,
            Err(e) => {
                warn!("Skipping input device without a name: {}", e);
                continue;
            }
        };

        let ranges: Vec<cpal::SupportedStreamConfigRange> = match device.supported_input_configs()
        {
            Ok(configs) => configs.collect(),
            Err(e) => {
                warn!("Skipping input device '{}': {}", name, e);
                continue;
            }
        };

        let input_channels = ranges.iter().map(|r| r.channels()).max().unwrap_or(0);
        if input_channels == 0 {
            continue;
        }

        let mut sample_rates = Vec::new();
        if let Ok(default) = device.default_input_config() {
            sample_rates.push(default.sample_rate().0);
        }
        for rate in COMMON_SAMPLE_RATES {
            let supported = ranges
                .iter()
                .any(|r| r.min_sample_rate().0 <= rate && r.max_sample_rate().0 >= rate);
            if supported && !sample_rates.contains(&rate) {
                sample_rates.push(rate);
            }
        }

        debug!(
            "Input device '{}': channels={}, rates={:?}",
            name, input_channels, sample_rates
        );
        entries.push(DeviceEntry::new(name, input_channels, sample_rates));
    }

    info!("Found {} input device(s)", entries.len());
    Ok(entries)
}

/// Find an input device by exact name
pub fn open_input_device(name: &str) -> Result<cpal::Device> {
    let host = cpal::default_host();
    host.input_devices()?
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| CoreError::AudioDevice(format!("Input device '{}' not found", name)))
}

/// Fixed buffer size when the device accepts it, otherwise the host default
fn buffer_size_for(device: &cpal::Device, settings: &StreamSettings) -> cpal::BufferSize {
    let accepts_fixed = device
        .supported_input_configs()
        .map(|mut configs| {
            configs.any(|range| {
                range.channels() >= settings.channels
                    && matches!(
                        range.buffer_size(),
                        cpal::SupportedBufferSize::Range { min, max }
                            if *min <= settings.buffer_size && *max >= settings.buffer_size
                    )
            })
        })
        .unwrap_or(false);

    if accepts_fixed {
        cpal::BufferSize::Fixed(settings.buffer_size)
    } else {
        debug!(
            "Device does not accept a fixed {}-frame buffer, using host default",
            settings.buffer_size
        );
        cpal::BufferSize::Default
    }
}

/// A running input stream. Dropping it stops capture.
pub struct CaptureStream {
    stream: cpal::Stream,
    errors: Receiver<cpal::StreamError>,
    settings: StreamSettings,
}

impl CaptureStream {
    /// Build and start an input stream that runs `pipeline` on every callback
    pub fn start<P>(
        device: &cpal::Device,
        settings: &StreamSettings,
        mut pipeline: AnalysisPipeline<P>,
    ) -> Result<Self>
    where
        P: SpectrumProvider + 'static,
    {
        let config = cpal::StreamConfig {
            channels: settings.channels,
            sample_rate: cpal::SampleRate(settings.sample_rate),
            buffer_size: buffer_size_for(device, settings),
        };

        let (error_tx, error_rx) = bounded(ERROR_QUEUE_DEPTH);
        let channels = settings.channels;
        let sample_rate = settings.sample_rate;

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                pipeline.process(AudioFrame::new(data, channels, sample_rate));
            },
            move |err| {
                let _ = error_tx.try_send(err);
            },
            None,
        )?;
        stream.play()?;

        info!(
            "Capture started on '{}': {} ch @ {} Hz, buffer {:?}",
            settings.device_name, settings.channels, settings.sample_rate, config.buffer_size
        );

        Ok(Self {
            stream,
            errors: error_rx,
            settings: settings.clone(),
        })
    }

    /// Settings the stream was opened with
    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Take every stream error reported since the last call
    pub fn drain_errors(&self) -> Vec<cpal::StreamError> {
        self.errors.try_iter().collect()
    }

    /// Stop capture and release the device
    pub fn stop(self) {
        if let Err(e) = self.stream.pause() {
            warn!("Failed to pause input stream: {}", e);
        }
        info!("Capture stopped on '{}'", self.settings.device_name);
    }
}
