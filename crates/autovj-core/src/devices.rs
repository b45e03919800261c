//! Input device selection state
//!
//! A plain vector of device records with a single update function. At most
//! one device is selected; once something is selected it can only be
//! replaced, never cleared, and the list is frozen while a session is live.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Fallback sample rate when a device reports none
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Callback size requested from the device, in frames
pub const DEFAULT_BUFFER_SIZE: u32 = 1024;

/// An input-capable device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Device name as reported by the host
    pub name: String,
    /// Maximum input channels
    pub input_channels: u16,
    /// Supported sample rates, preferred first
    pub sample_rates: Vec<u32>,
    /// Selection flag
    pub selected: bool,
}

impl DeviceEntry {
    /// Unselected entry
    pub fn new(name: impl Into<String>, input_channels: u16, sample_rates: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            input_channels,
            sample_rates,
            selected: false,
        }
    }
}

/// Stream parameters derived from the selected device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Device to open
    pub device_name: String,
    /// Input channels, at most two
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Callback size in frames
    pub buffer_size: u32,
}

/// What a toggle request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The device is now the only selected one
    Selected,
    /// Request to deselect the current device was refused
    KeptSelected,
    /// Nothing changed
    Unchanged,
    /// Selection is frozen during a live session
    Frozen,
    /// No device at that index
    OutOfRange,
}

/// Owned list of input devices with radio-style selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSelection {
    entries: Vec<DeviceEntry>,
    frozen: bool,
}

impl DeviceSelection {
    /// Build from enumerated devices; output-only devices are dropped and
    /// every flag starts cleared.
    pub fn new(devices: impl IntoIterator<Item = DeviceEntry>) -> Self {
        let entries = devices
            .into_iter()
            .filter(|d| d.input_channels > 0)
            .map(|d| DeviceEntry {
                selected: false,
                ..d
            })
            .collect();
        Self {
            entries,
            frozen: false,
        }
    }

    /// All input devices in enumeration order
    pub fn entries(&self) -> &[DeviceEntry] {
        &self.entries
    }

    /// Number of input devices
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no input devices
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the selected device
    pub fn selected_index(&self) -> Option<usize> {
        self.entries.iter().position(|d| d.selected)
    }

    /// The selected device
    pub fn selected(&self) -> Option<&DeviceEntry> {
        self.entries.iter().find(|d| d.selected)
    }

    /// True while a live session holds the selection
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Freeze or release the selection
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Apply a toggle from the UI
    pub fn set_toggle(&mut self, index: usize, on: bool) -> ToggleOutcome {
        if self.frozen {
            return ToggleOutcome::Frozen;
        }
        let Some(entry) = self.entries.get(index) else {
            return ToggleOutcome::OutOfRange;
        };

        if !on {
            return if entry.selected {
                ToggleOutcome::KeptSelected
            } else {
                ToggleOutcome::Unchanged
            };
        }
        if entry.selected {
            return ToggleOutcome::Unchanged;
        }

        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.selected = i == index;
        }
        info!("Input device selected: {}", self.entries[index].name);
        ToggleOutcome::Selected
    }

    /// Select the first device whose name matches exactly, or contains `name`
    /// case-insensitively
    pub fn select_by_name(&mut self, name: &str) -> Option<ToggleOutcome> {
        let needle = name.to_lowercase();
        let index = self
            .entries
            .iter()
            .position(|d| d.name == name)
            .or_else(|| {
                self.entries
                    .iter()
                    .position(|d| d.name.to_lowercase().contains(&needle))
            })?;
        Some(self.set_toggle(index, true))
    }

    /// Stream parameters for the selected device
    pub fn stream_settings(&self) -> Option<StreamSettings> {
        self.selected().map(|device| StreamSettings {
            device_name: device.name.clone(),
            channels: device.input_channels.min(2),
            sample_rate: device
                .sample_rates
                .first()
                .copied()
                .unwrap_or(DEFAULT_SAMPLE_RATE),
            buffer_size: DEFAULT_BUFFER_SIZE,
        })
    }
}
