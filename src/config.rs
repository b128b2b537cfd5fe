use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::fallback::FALLBACK_DEEPFAKE_PROBABILITY;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub model_config: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory for per-request temporary media. Falls back to the OS temp dir.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    64 * 1024 * 1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_image_model_path")]
    pub image_model_path: PathBuf,
    #[serde(default = "default_audio_feature_extractor_path")]
    pub audio_feature_extractor_path: PathBuf,
    #[serde(default = "default_audio_classifier_path")]
    pub audio_classifier_path: PathBuf,
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    #[serde(default = "default_inference_timeout_secs")]
    pub inference_timeout_secs: u64,
    #[serde(default = "default_frame_interval")]
    pub frame_interval: usize,
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,
    #[serde(default = "default_audio_sample_rate")]
    pub audio_sample_rate: u32,
    #[serde(default = "default_fallback_deepfake_probability")]
    pub fallback_deepfake_probability: f64,
}

fn default_image_model_path() -> PathBuf {
    PathBuf::from("models/deepfake_detector.onnx")
}

fn default_audio_feature_extractor_path() -> PathBuf {
    PathBuf::from("models/wav2vec2_base.onnx")
}

fn default_audio_classifier_path() -> PathBuf {
    PathBuf::from("models/deepfake_audio_model.onnx")
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_inference_timeout_secs() -> u64 {
    30
}

fn default_frame_interval() -> usize {
    10
}

fn default_max_frames() -> usize {
    10
}

fn default_audio_sample_rate() -> u32 {
    16_000
}

fn default_fallback_deepfake_probability() -> f64 {
    FALLBACK_DEEPFAKE_PROBABILITY
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            temp_dir: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            image_model_path: default_image_model_path(),
            audio_feature_extractor_path: default_audio_feature_extractor_path(),
            audio_classifier_path: default_audio_classifier_path(),
            ffmpeg_path: default_ffmpeg_path(),
            inference_timeout_secs: default_inference_timeout_secs(),
            frame_interval: default_frame_interval(),
            max_frames: default_max_frames(),
            audio_sample_rate: default_audio_sample_rate(),
            fallback_deepfake_probability: default_fallback_deepfake_probability(),
        }
    }
}

impl SystemConfig {
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl ModelConfig {
    pub fn inference_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.inference_timeout_secs)
    }
}

impl Config {
    /// Load a YAML or JSON configuration file, substituting `${VAR}` references
    /// from the environment before parsing.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        let content = substitute_env_vars(&content)?;

        let path_lower = path.to_lowercase();
        let config: Config = if path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        Ok(config)
    }

    /// Load the first configuration file that exists among `paths`, falling back
    /// to defaults when none does. Returns the path that was used, if any.
    ///
    /// A file that exists but fails to parse is an error rather than skipped.
    pub fn load_first(paths: &[String]) -> Result<(Self, Option<String>)> {
        for path in paths {
            if !Path::new(path).exists() {
                debug!("No configuration at {}", path);
                continue;
            }
            let config = Config::load(path)
                .with_context(|| format!("Invalid configuration in {}", path))?;
            return Ok((config, Some(path.clone())));
        }
        Ok((Config::default(), None))
    }

    /// Apply process environment overrides. `PORT` selects the listening port.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var("PORT") {
            self.system_config.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got {:?}", port))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let models = &self.model_config;
        if models.frame_interval == 0 {
            anyhow::bail!("frame_interval must be at least 1");
        }
        if models.max_frames == 0 {
            anyhow::bail!("max_frames must be at least 1");
        }
        if models.inference_timeout_secs == 0 {
            anyhow::bail!("inference_timeout_secs must be at least 1");
        }
        if models.audio_sample_rate == 0 {
            anyhow::bail!("audio_sample_rate must be positive");
        }
        if !(0.0..=1.0).contains(&models.fallback_deepfake_probability) {
            anyhow::bail!(
                "fallback_deepfake_probability must be within [0, 1], got {}",
                models.fallback_deepfake_probability
            );
        }
        Ok(())
    }
}

/// Replace `${VAR_NAME}` with the variable's value. Unset variables are left as is.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let pattern = Regex::new(r"\$\{(\w+)\}")?;
    let replaced = pattern.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    Ok(replaced.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, name: &str, content: &str) -> String {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn defaults_match_service_contract() {
        let config = Config::default();
        assert_eq!(config.system_config.host, "0.0.0.0");
        assert_eq!(config.system_config.port, 8080);
        assert_eq!(config.model_config.frame_interval, 10);
        assert_eq!(config.model_config.max_frames, 10);
        assert_eq!(config.model_config.audio_sample_rate, 16_000);
        assert_eq!(config.model_config.fallback_deepfake_probability, 0.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_partial_yaml_with_env_substitution() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("DEEPFAKE_TEST_MODEL_DIR", "/opt/models");
        let path = write_config(
            dir.path(),
            "conf.yaml",
            concat!(
                "model_config:\n",
                "  image_model_path: ${DEEPFAKE_TEST_MODEL_DIR}/image.onnx\n",
                "  max_frames: 4\n",
            ),
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.model_config.image_model_path,
            PathBuf::from("/opt/models/image.onnx")
        );
        assert_eq!(config.model_config.max_frames, 4);
        assert_eq!(config.model_config.frame_interval, 10);
        assert_eq!(config.system_config.port, 8080);
    }

    #[test]
    fn loads_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "conf.json",
            r#"{"system_config": {"port": 9000, "max_body_bytes": 1024}}"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.system_config.port, 9000);
        assert_eq!(config.system_config.max_body_bytes, 1024);
    }

    #[test]
    fn unset_variables_are_left_in_place() {
        let out = substitute_env_vars("path: ${DEEPFAKE_TEST_SURELY_UNSET_VAR}").unwrap();
        assert_eq!(out, "path: ${DEEPFAKE_TEST_SURELY_UNSET_VAR}");
    }

    #[test]
    fn load_first_falls_back_to_defaults() {
        let (config, used) =
            Config::load_first(&["/nonexistent/conf.yaml".to_string()]).unwrap();
        assert!(used.is_none());
        assert_eq!(config.system_config.port, 8080);
    }

    #[test]
    fn load_first_rejects_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "conf.json", "{ not json");
        assert!(Config::load_first(&[path]).is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::default();
        config.model_config.frame_interval = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.model_config.fallback_deepfake_probability = 1.5;
        assert!(config.validate().is_err());
    }
}
