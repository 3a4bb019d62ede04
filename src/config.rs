use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::application::term_extractor::MAX_TERMS;
use crate::infrastructure::local_model::DEFAULT_MAX_NEW_TOKENS;
use crate::infrastructure::text_extractor::{
    TextEncoding, DEFAULT_MAX_CHARS, DEFAULT_PREVIEW_CHARS,
};

pub const DEFAULT_CONFIG_FILENAME: &str = "flashgen.toml";
pub const CONFIG_PATH_ENV: &str = "FLASHGEN_CONFIG_PATH";
pub const DEFAULT_MODEL_NAME: &str = "google/flan-t5-small";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub model_name: String,
    /// Local in-process model when true, the (unimplemented) remote API otherwise.
    pub use_local: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    pub max_new_tokens: usize,
    /// Where downloaded model artifacts are cached.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let default_cache_dir = ProjectDirs::from("dev", "flashgen", "flashgen")
            .map(|dirs| dirs.cache_dir().join("models"));

        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            use_local: true,
            api_key: None,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            cache_dir: default_cache_dir,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub min_cards: usize,
    pub max_cards: usize,
    pub default_cards: usize,
    pub max_terms: usize,
    pub default_subject: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_cards: 5,
            max_cards: 25,
            default_cards: 15,
            max_terms: MAX_TERMS,
            default_subject: "General".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn card_range(&self) -> RangeInclusive<usize> {
        self.min_cards..=self.max_cards
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TextConfig {
    /// Character cap applied by preprocessing before prompting.
    pub max_chars: usize,
    pub preview_chars: usize,
    /// Decoding attempts for `.txt` uploads, in order.
    pub encodings: Vec<TextEncoding>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            encodings: TextEncoding::default_chain(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FlashgenConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub text: TextConfig,
}

/// Loads configuration from defaults, `flashgen.toml` (or `$FLASHGEN_CONFIG_PATH`),
/// `FLASHGEN_*` environment variables and `MODEL_NAME`, later sources winning.
pub fn load_config() -> Result<FlashgenConfig> {
    // Determine config file path: FLASHGEN_CONFIG_PATH wins over ./flashgen.toml
    let config_path_env = std::env::var(CONFIG_PATH_ENV).ok();
    let config_path = config_path_env
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_FILENAME.to_string());

    // An explicit path must exist; the default file is optional
    if let Some(ref env_path) = config_path_env {
        if !Path::new(env_path).exists() {
            return Err(anyhow::anyhow!(
                "Config file not found at {}: {}",
                CONFIG_PATH_ENV,
                env_path
            ));
        }
        log::info!("{} is set: {}", CONFIG_PATH_ENV, env_path);
    } else {
        log::debug!("{} not set, falling back to default: {}", CONFIG_PATH_ENV, config_path);
    }

    // Build figment: defaults -> TOML -> FLASHGEN_* env -> MODEL_NAME
    let figment = Figment::new()
        .merge(Serialized::defaults(FlashgenConfig::default()))
        .merge(Toml::file(&config_path))
        .merge(Env::prefixed("FLASHGEN_").split("__"))
        .merge(
            Env::raw()
                .only(&["MODEL_NAME"])
                .map(|_| "generation.model_name".into()),
        );

    // Extract and validate
    let config: FlashgenConfig = figment
        .extract()
        .context("Failed to extract FlashgenConfig")?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &FlashgenConfig) -> Result<()> {
    if config.generation.model_name.trim().is_empty() {
        return Err(anyhow::anyhow!("generation.model_name cannot be empty"));
    }
    if config.generation.max_new_tokens == 0 {
        return Err(anyhow::anyhow!("generation.max_new_tokens must be at least 1"));
    }
    if let Some(dir) = &config.generation.cache_dir {
        if dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Configured generation.cache_dir cannot be empty"));
        }
    }
    let pipeline = &config.pipeline;
    if pipeline.min_cards == 0 || pipeline.min_cards > pipeline.max_cards {
        return Err(anyhow::anyhow!(
            "pipeline.min_cards ({}) must be between 1 and pipeline.max_cards ({})",
            pipeline.min_cards,
            pipeline.max_cards
        ));
    }
    if !pipeline.card_range().contains(&pipeline.default_cards) {
        return Err(anyhow::anyhow!(
            "pipeline.default_cards ({}) must be within {}..={}",
            pipeline.default_cards,
            pipeline.min_cards,
            pipeline.max_cards
        ));
    }
    if config.text.encodings.is_empty() {
        return Err(anyhow::anyhow!("text.encodings must list at least one encoding"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_load_config_default() {
        Jail::expect_with(|_jail| {
            let config = load_config().expect("Failed to load default config");
            assert_eq!(config.generation.model_name, DEFAULT_MODEL_NAME);
            assert!(config.generation.use_local);
            assert!(config.generation.api_key.is_none());
            assert_eq!(config.generation.max_new_tokens, 128);
            assert_eq!(config.pipeline.card_range(), 5..=25);
            assert_eq!(config.pipeline.default_cards, 15);
            assert_eq!(config.pipeline.max_terms, 25);
            assert_eq!(config.text.max_chars, 8000);
            assert_eq!(config.text.encodings, TextEncoding::default_chain());
            Ok(())
        });
    }

    #[test]
    fn test_load_config_toml_only() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "flashgen.toml",
                r#"
[generation]
model_name = "google/flan-t5-base"
use_local = false
api_key = "hf_toml"

[pipeline]
default_cards = 10

[text]
encodings = ["utf-8", "windows-1252"]
                "#,
            )?;
            let config = load_config().expect("Failed to load TOML config");
            assert_eq!(config.generation.model_name, "google/flan-t5-base");
            assert!(!config.generation.use_local);
            assert_eq!(config.generation.api_key.as_deref(), Some("hf_toml"));
            // untouched keys keep their defaults
            assert_eq!(config.generation.max_new_tokens, 128);
            assert_eq!(config.pipeline.default_cards, 10);
            assert_eq!(config.pipeline.max_cards, 25);
            assert_eq!(
                config.text.encodings,
                vec![TextEncoding::Utf8, TextEncoding::Windows1252]
            );
            Ok(())
        });
    }

    #[test]
    fn test_load_config_env_only() {
        Jail::expect_with(|jail| {
            jail.set_env("FLASHGEN_GENERATION__MAX_NEW_TOKENS", "64");
            jail.set_env("FLASHGEN_PIPELINE__DEFAULT_SUBJECT", "Physics");
            let config = load_config().expect("Failed to load env config");
            assert_eq!(config.generation.max_new_tokens, 64);
            assert_eq!(config.pipeline.default_subject, "Physics");
            Ok(())
        });
    }

    #[test]
    fn test_model_name_env_overrides_toml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "flashgen.toml",
                r#"
[generation]
model_name = "google/flan-t5-base"
                "#,
            )?;
            jail.set_env("MODEL_NAME", "google/flan-t5-large");
            let config = load_config().expect("Failed to load config");
            assert_eq!(config.generation.model_name, "google/flan-t5-large");
            Ok(())
        });
    }

    #[test]
    fn test_config_path_env_must_exist() {
        Jail::expect_with(|jail| {
            jail.set_env(CONFIG_PATH_ENV, "missing/flashgen.toml");
            let err = load_config().unwrap_err();
            assert!(err.to_string().contains("Config file not found"));
            Ok(())
        });
    }

    #[test]
    fn test_config_path_env_is_used() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
[pipeline]
max_terms = 10
                "#,
            )?;
            jail.set_env(CONFIG_PATH_ENV, "custom.toml");
            let config = load_config().expect("Failed to load custom config");
            assert_eq!(config.pipeline.max_terms, 10);
            Ok(())
        });
    }

    #[test]
    fn test_validation_rejects_bad_ranges() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "flashgen.toml",
                r#"
[pipeline]
min_cards = 30
max_cards = 25
                "#,
            )?;
            assert!(load_config().is_err());
            Ok(())
        });
    }

    #[test]
    fn test_validation_rejects_empty_encoding_chain() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "flashgen.toml",
                r#"
[text]
encodings = []
                "#,
            )?;
            let err = load_config().unwrap_err();
            assert!(err.to_string().contains("text.encodings"));
            Ok(())
        });
    }
}
