//! Configuration file management for bedtime.
//!
//! This module handles loading and saving application configuration from TOML
//! files. Configuration is stored in the user's config directory; a default
//! file is written on first run.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::capture::session::DEFAULT_MAX_DURATION_SECS;
use crate::canvas::surface::{DEFAULT_SIZE, DEFAULT_STROKE_WIDTH};
use crate::words::DEFAULT_VISIBLE_COUNT;

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `bedtime list-devices`
    /// - device name from `bedtime list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Requested recording sample rate in Hz (device native rate wins)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Maximum recording length in seconds; the session auto-stops here
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u32,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_max_duration_secs() -> u32 {
    DEFAULT_MAX_DURATION_SECS
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            max_duration_secs: default_max_duration_secs(),
        }
    }
}

/// Drawing surface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Surface width in pixels
    #[serde(default = "default_canvas_size")]
    pub width: u32,
    /// Surface height in pixels
    #[serde(default = "default_canvas_size")]
    pub height: u32,
    /// Stroke width in pixels
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
    /// Filename for downloaded drawings
    #[serde(default = "default_download_file")]
    pub download_file: String,
}

fn default_canvas_size() -> u32 {
    DEFAULT_SIZE
}

fn default_stroke_width() -> f32 {
    DEFAULT_STROKE_WIDTH
}

fn default_download_file() -> String {
    "drawing.png".to_string()
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_canvas_size(),
            height: default_canvas_size(),
            stroke_width: default_stroke_width(),
            download_file: default_download_file(),
        }
    }
}

/// Decorative word-field configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordsConfig {
    /// How many vocabulary words the backdrop shows
    #[serde(default = "default_visible_count")]
    pub visible_count: usize,
}

fn default_visible_count() -> usize {
    DEFAULT_VISIBLE_COUNT
}

impl Default for WordsConfig {
    fn default() -> Self {
        Self {
            visible_count: default_visible_count(),
        }
    }
}

/// Where exported payloads are meant to be sent.
///
/// Deployment configuration only: bedtime never talks to the inference
/// service itself, it just records the forwarding rule the deployment's
/// dev proxy applies. Requests under `path_prefix` forward to `target`
/// with the path preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Request path prefix that gets forwarded
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
    /// Inference service origin, e.g. "http://34.71.209.167:6000"
    #[serde(default = "default_proxy_target")]
    pub target: String,
    /// Whether the local transport to the target is TLS-terminated
    #[serde(default)]
    pub secure: bool,
}

fn default_path_prefix() -> String {
    "/infer".to_string()
}

fn default_proxy_target() -> String {
    "http://34.71.209.167:6000".to_string()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            path_prefix: default_path_prefix(),
            target: default_proxy_target(),
            secure: false,
        }
    }
}

impl ProxyConfig {
    /// Maps a request path onto the forwarded URL, path preserved.
    /// Returns `None` for paths outside the proxied prefix.
    pub fn forward_url(&self, path: &str) -> Option<String> {
        if path.starts_with(&self.path_prefix) {
            Some(format!("{}{}", self.target.trim_end_matches('/'), path))
        } else {
            None
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BedtimeConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub words: WordsConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

impl BedtimeConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        let config_content = fs::read_to_string(&config_path)?;
        let config: BedtimeConfig = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Loads the configuration, writing defaults first if no file exists.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If an existing file cannot be read or parsed
    pub fn load_or_init() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            tracing::info!("Default configuration written: {}", config_path.display());
            return Ok(config);
        }
        Self::load()
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = get_config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }
}

/// Retrieves the path to the config file, creating the directory if needed.
///
/// # Errors
/// - If the config directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
    let config_dir = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not find home directory",
        )
    })?;
    let config_dir = config_dir.join(".config").join("bedtime");

    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir.join("bedtime.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BedtimeConfig::default();
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.audio.max_duration_secs, 10);
        assert_eq!(config.canvas.width, 500);
        assert_eq!(config.canvas.height, 500);
        assert_eq!(config.canvas.download_file, "drawing.png");
        assert_eq!(config.words.visible_count, 50);
        assert_eq!(config.proxy.path_prefix, "/infer");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: BedtimeConfig = toml::from_str(
            r#"
            [audio]
            max_duration_secs = 3

            [proxy]
            target = "https://inference.internal"
            secure = true
            "#,
        )
        .unwrap();

        assert_eq!(config.audio.max_duration_secs, 3);
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.canvas.stroke_width, 2.0);
        assert!(config.proxy.secure);
        assert_eq!(config.proxy.target, "https://inference.internal");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = BedtimeConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: BedtimeConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.audio.sample_rate, config.audio.sample_rate);
        assert_eq!(parsed.proxy.target, config.proxy.target);
    }

    #[test]
    fn test_proxy_preserves_the_path() {
        let proxy = ProxyConfig::default();
        assert_eq!(
            proxy.forward_url("/infer").as_deref(),
            Some("http://34.71.209.167:6000/infer")
        );
        assert_eq!(
            proxy.forward_url("/infer/story?voice=1").as_deref(),
            Some("http://34.71.209.167:6000/infer/story?voice=1")
        );
        assert_eq!(proxy.forward_url("/api/other"), None);
    }

    #[test]
    fn test_proxy_target_trailing_slash() {
        let proxy = ProxyConfig {
            target: "http://localhost:6000/".to_string(),
            ..ProxyConfig::default()
        };
        assert_eq!(
            proxy.forward_url("/infer").as_deref(),
            Some("http://localhost:6000/infer")
        );
    }
}
