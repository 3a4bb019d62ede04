use crate::config::GenerationConfig;
use crate::domain::generation::GenerationBackend;
use crate::error::Result;
use crate::infrastructure::local_model::LocalBackend;
use crate::infrastructure::remote::RemoteBackend;

/// Model identifiers offered to users; others are accepted but may not be T5 models.
pub const KNOWN_MODELS: &[&str] = &[
    "google/flan-t5-small",
    "google/flan-t5-base",
    "google/flan-t5-large",
    "google/flan-t5-xxl",
];

/// The backend selected by configuration.
pub enum Backend {
    Local(LocalBackend),
    Remote(RemoteBackend),
}

impl Backend {
    /// Builds the configured backend. Only the local variant does any work here, and it
    /// may take a while: model artifacts are downloaded and loaded before this returns.
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        if !KNOWN_MODELS.contains(&config.model_name.as_str()) {
            log::warn!("Model '{}' is not one of the predefined models", config.model_name);
        }
        if config.use_local {
            let local = LocalBackend::load(
                &config.model_name,
                config.cache_dir.clone(),
                config.max_new_tokens,
            )?;
            Ok(Backend::Local(local))
        } else {
            Ok(Backend::Remote(RemoteBackend::new(
                config.api_key.clone(),
                config.model_name.clone(),
            )))
        }
    }
}

impl GenerationBackend for Backend {
    fn generate(&mut self, prompt: &str) -> Result<String> {
        match self {
            Backend::Local(local) => local.generate(prompt),
            Backend::Remote(remote) => remote.generate(prompt),
        }
    }

    fn test_connection(&self) -> bool {
        match self {
            Backend::Local(local) => local.test_connection(),
            Backend::Remote(remote) => remote.test_connection(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Backend::Local(local) => local.name(),
            Backend::Remote(remote) => remote.name(),
        }
    }
}
