//! Configuration management

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::renderer::OutputFormat;

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Path to configuration file
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Inference device: "auto" (GPU when detected), "cpu" or "cuda"
    pub device: String,

    /// Pretrained portrait-animation weights
    pub model_path: String,

    /// Reported in health checks and render responses
    pub model_version: String,

    /// Directory rendered images are written to
    pub output_dir: PathBuf,

    /// Emotion intensity used when a request omits it (0.0-1.0)
    pub default_intensity: f64,

    /// Output format used when a request omits it
    pub default_output_format: String,

    /// Largest accepted source image, in bytes
    pub max_upload_bytes: usize,

    /// Run a neutral render at startup
    pub warmup: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            config_path: Self::default_config_path(),
            host: "0.0.0.0".to_string(),
            port: 8001,
            device: "auto".to_string(),
            model_path: "/opt/portrait/models/liveportrait".to_string(),
            model_version: "1.0.0".to_string(),
            output_dir: std::env::temp_dir().join("portrait_output"),
            default_intensity: 0.7,
            default_output_format: "png".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            warmup: true,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the default location, or create it
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_config_path())
    }

    /// Load configuration from `path`, writing defaults there if it is missing
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config_path = path.as_ref().to_path_buf();

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

            let mut config: ServiceConfig = toml::from_str(&contents)
                .context("Failed to parse config file")?;

            config.config_path = config_path;
            Ok(config)
        } else {
            let config = Self {
                config_path,
                ..Self::default()
            };
            config.save()
                .context("Failed to save default config")?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(&self.config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Reject values the daemon cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            bail!("port must be non-zero");
        }
        if !portrait_motion::is_valid_emotion_intensity(self.default_intensity) {
            bail!(
                "default_intensity must be within [0, 1], got {}",
                self.default_intensity
            );
        }
        OutputFormat::parse(&self.default_output_format)
            .with_context(|| format!("Invalid default_output_format '{}'", self.default_output_format))?;
        if self.max_upload_bytes == 0 {
            bail!("max_upload_bytes must be non-zero");
        }
        Ok(())
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get default config path
    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("portrait-daemon")
            .join("config.toml")
    }
}
