use std::path::PathBuf;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};

use crate::WATCH_URL;
use crate::llm::CompletionOptions;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Language the model is told to answer in
    pub language: String,
    /// Attempts per network stage; 1 means no retry
    pub retry_attempts: u32,
    pub server: ServerConfig,
    pub youtube: YoutubeConfig,
    #[serde(deserialize_with = "summary_section")]
    pub summary: ModelConfig,
    #[serde(deserialize_with = "recipe_section")]
    pub recipe: ModelConfig,
    pub completion: CompletionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            language: "Korean".to_string(),
            retry_attempts: 1,
            server: ServerConfig::default(),
            youtube: YoutubeConfig::default(),
            summary: ModelConfig::summary(),
            recipe: ModelConfig::recipe(),
            completion: CompletionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// Watch page prefix; the video id is appended
    pub watch_url: String,
    pub page_timeout_ms: u64,
    pub transcript_page_timeout_ms: u64,
    pub caption_timeout_ms: u64,
    /// Caption languages to prefer, in order. Empty takes the first track.
    pub caption_languages: Vec<String>,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        YoutubeConfig {
            watch_url: WATCH_URL.to_string(),
            page_timeout_ms: 10_000,
            transcript_page_timeout_ms: 15_000,
            caption_timeout_ms: 10_000,
            caption_languages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// A `[summary]` or `[recipe]` table as written. Keys left out keep the
/// defaults of that flow.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelSection {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ModelSection {
    fn over(self, base: ModelConfig) -> ModelConfig {
        ModelConfig {
            model: self.model.unwrap_or(base.model),
            temperature: self.temperature.or(base.temperature),
            max_tokens: self.max_tokens.or(base.max_tokens),
        }
    }
}

fn summary_section<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<ModelConfig, D::Error> {
    Ok(ModelSection::deserialize(deserializer)?.over(ModelConfig::summary()))
}

fn recipe_section<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<ModelConfig, D::Error> {
    Ok(ModelSection::deserialize(deserializer)?.over(ModelConfig::recipe()))
}

impl ModelConfig {
    fn summary() -> Self {
        ModelConfig {
            model: "gpt-4o".to_string(),
            temperature: Some(0.3),
            max_tokens: None,
        }
    }

    fn recipe() -> Self {
        ModelConfig {
            model: "gpt-4o".to_string(),
            temperature: Some(0.2),
            max_tokens: Some(1500),
        }
    }

    pub fn options(&self) -> CompletionOptions {
        CompletionOptions {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub timeout_ms: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        CompletionConfig { timeout_ms: 60_000 }
    }
}

impl Config {
    /// Load config from ~/.config/ytdigest/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytdigest")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
language = "English"
retry_attempts = 3

[server]
bind = "0.0.0.0:9000"

[youtube]
page_timeout_ms = 5000
caption_languages = ["ko", "en"]

[recipe]
model = "claude-sonnet-4-6"
temperature = 0.1
max_tokens = 2000
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.language, "English");
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.youtube.page_timeout_ms, 5000);
        assert_eq!(config.youtube.transcript_page_timeout_ms, 15_000);
        assert_eq!(config.youtube.caption_languages, vec!["ko", "en"]);
        assert_eq!(config.recipe.model, "claude-sonnet-4-6");
        assert_eq!(config.recipe.max_tokens, Some(2000));
        assert_eq!(config.summary.model, "gpt-4o");
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.language, "Korean");
        assert_eq!(config.retry_attempts, 1);
        assert_eq!(config.youtube.watch_url, WATCH_URL);
        assert!(config.youtube.caption_languages.is_empty());
        assert_eq!(config.summary.temperature, Some(0.3));
        assert_eq!(config.recipe.temperature, Some(0.2));
        assert_eq!(config.recipe.max_tokens, Some(1500));
        assert_eq!(config.completion.timeout_ms, 60_000);
    }

    #[test]
    fn test_model_section_with_only_temperature() {
        let toml_str = r#"
language = "English"

[recipe]
temperature = 0.1
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.language, "English");
        assert_eq!(config.recipe.model, "gpt-4o");
        assert_eq!(config.recipe.temperature, Some(0.1));
        assert_eq!(config.recipe.max_tokens, Some(1500));
        assert_eq!(config.summary, ModelConfig::summary());
    }

    #[test]
    fn test_model_section_with_only_model() {
        let toml_str = r#"
[summary]
model = "gpt-4o-mini"

[recipe]
model = "claude-sonnet-4-6"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.summary.model, "gpt-4o-mini");
        assert_eq!(config.summary.temperature, Some(0.3));
        assert_eq!(config.summary.max_tokens, None);
        assert_eq!(config.recipe.model, "claude-sonnet-4-6");
        assert_eq!(config.recipe.temperature, Some(0.2));
        assert_eq!(config.recipe.max_tokens, Some(1500));
    }

    #[test]
    fn test_empty_model_section_keeps_defaults() {
        let config: Config = toml::from_str("[recipe]\n").unwrap();
        assert_eq!(config.recipe, ModelConfig::recipe());
    }

    #[test]
    fn test_model_options() {
        let options = ModelConfig::recipe().options();
        assert_eq!(options.model, "gpt-4o");
        assert_eq!(options.temperature, Some(0.2));
        assert_eq!(options.max_tokens, Some(1500));
    }
}
