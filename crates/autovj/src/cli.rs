//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "autovj")]
#[command(about = "Live audio analysis driving audio-reactive visuals", long_about = None)]
pub struct Args {
    /// Input device name (exact, or a case-insensitive substring)
    #[arg(long, value_name = "NAME")]
    pub device: Option<String>,

    /// List input devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Input gain, 0.0 to 5.0
    #[arg(long, value_name = "GAIN")]
    pub gain: Option<f32>,

    /// Render loop rate
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Stop after this many seconds (runs until killed if not specified)
    #[arg(long, value_name = "SECONDS")]
    pub seconds: Option<f32>,

    /// Target hue for the tint, 0 to 255
    #[arg(long, value_name = "HUE", default_value = "0")]
    pub hue: f32,

    /// Save the effective configuration and exit
    #[arg(long)]
    pub write_config: bool,
}
