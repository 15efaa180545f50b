use crate::utils::errors::{Result, WordlistError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub translation: TranslationDefaults,
    pub output: OutputLayout,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationDefaults {
    pub source_lang: String,
    pub target_lang: String,
    pub chunk_size: usize,
    pub pause_ms: u64,
    pub max_retries: usize,
    /// Also sleep `pause / chunk_size` between words inside a chunk.
    pub word_pacing: bool,
}

/// Column labels of the bilingual output header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputLayout {
    pub level_label: String,
    pub title_label: String,
    pub word_label_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for TranslationDefaults {
    fn default() -> Self {
        Self {
            source_lang: "en".to_string(),
            target_lang: "zh-cn".to_string(),
            chunk_size: 10,
            pause_ms: 500,
            max_retries: 2,
            word_pacing: false,
        }
    }
}

impl TranslationDefaults {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            level_label: "level".to_string(),
            title_label: "title".to_string(),
            word_label_prefix: "word".to_string(),
        }
    }
}

impl OutputLayout {
    pub fn header(&self, max_words: usize) -> Vec<String> {
        let mut header = Vec::with_capacity(max_words + 2);
        header.push(self.level_label.clone());
        header.push(self.title_label.clone());
        header.extend((1..=max_words).map(|i| format!("{}{}", self.word_label_prefix, i)));
        header
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
            timeout_seconds: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                .to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| WordlistError::ConfigError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| WordlistError::ConfigError(e.to_string()))
    }

    /// A missing file yields defaults; an unreadable or invalid one is an error.
    pub fn load_if_present(path: impl AsRef<Path>) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }
}
