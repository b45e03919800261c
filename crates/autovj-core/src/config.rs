//! Engine configuration, persisted as JSON

use crate::bands::BandConfig;
use crate::error::{CoreError, Result};
use crate::impact::ImpactConfig;
use crate::logging::LogConfig;
use crate::pipeline::AnalysisConfig;
use crate::visual::VisualConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Slowest render loop rate accepted by [`EngineConfig::validate`]
pub const MIN_FPS: f32 = 1.0;

/// Fastest render loop rate accepted by [`EngineConfig::validate`]
pub const MAX_FPS: f32 = 1000.0;

/// Every tunable of the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// FFT and envelope settings
    pub analysis: AnalysisConfig,
    /// Band crossovers, scaling and tilt
    pub bands: BandConfig,
    /// Audio-thread impact detector
    pub impact: ImpactConfig,
    /// Render-side mapper constants
    pub visual: VisualConfig,
    /// Logging
    pub log: LogConfig,
    /// Render loop rate in frames per second
    pub target_fps: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            bands: BandConfig::default(),
            impact: ImpactConfig::default(),
            visual: VisualConfig::default(),
            log: LogConfig::default(),
            target_fps: 60.0,
        }
    }
}

impl EngineConfig {
    /// `<config_dir>/AutoVJ/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("AutoVJ");
            p.push("config.json");
            p
        })
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Config saved to {:?}", path);
        Ok(())
    }

    /// Load from `path` (or the default location), falling back to defaults on any problem
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => return Self::default(),
        };
        if !path.exists() {
            info!("No config at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Ignoring config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let problem = self
            .analysis
            .check()
            .or_else(|| self.bands.check())
            .or_else(|| self.impact.check())
            .or_else(|| self.visual.check());
        if let Some(problem) = problem {
            return Err(CoreError::InvalidConfig(problem));
        }
        if !(MIN_FPS..=MAX_FPS).contains(&self.target_fps) {
            return Err(CoreError::InvalidConfig(format!(
                "target_fps must be in [{}, {}], got {}",
                MIN_FPS, MAX_FPS, self.target_fps
            )));
        }
        Ok(())
    }
}
