use crate::domain::generation::GenerationBackend;
use crate::error::{FlashgenError, Result};
use log::warn;
use std::fmt;

/// Placeholder for a hosted inference API. It accepts credentials but never serves
/// requests: `test_connection` is always false so callers stop before generating.
pub struct RemoteBackend {
    api_key: Option<String>,
    model_name: String,
}

impl RemoteBackend {
    pub fn new(api_key: Option<String>, model_name: impl Into<String>) -> Self {
        Self {
            api_key,
            model_name: model_name.into(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

// Keeps the key out of logs.
impl fmt::Debug for RemoteBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteBackend")
            .field("model_name", &self.model_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GenerationBackend for RemoteBackend {
    fn generate(&mut self, _prompt: &str) -> Result<String> {
        warn!("Remote generation requested for '{}'", self.model_name);
        Err(FlashgenError::NotImplemented(
            "API mode not supported in local-only setup.".to_string(),
        ))
    }

    fn test_connection(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_generate_is_never_implemented() {
        let cases = [
            RemoteBackend::new(None, "google/flan-t5-small"),
            RemoteBackend::new(Some(String::new()), ""),
            RemoteBackend::new(Some("hf_secret".to_string()), "google/flan-t5-xxl"),
        ];
        for mut backend in cases {
            assert!(!backend.test_connection());
            assert_matches!(backend.generate("anything"), Err(FlashgenError::NotImplemented(_)));
            assert_matches!(backend.generate(""), Err(FlashgenError::NotImplemented(_)));
        }
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let backend = RemoteBackend::new(Some("hf_secret".to_string()), "google/flan-t5-base");
        let debug = format!("{:?}", backend);
        assert!(!debug.contains("hf_secret"));
        assert!(debug.contains("<redacted>"));
        assert!(backend.has_api_key());
    }
}
