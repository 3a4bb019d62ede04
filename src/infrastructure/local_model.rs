use crate::domain::generation::GenerationBackend;
use crate::error::{FlashgenError, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::t5;
use hf_hub::api::sync::{ApiBuilder, ApiRepo};
use log::{debug, info};
use std::path::PathBuf;
use tokenizers::Tokenizer;

/// Output cap used when no other limit is configured.
pub const DEFAULT_MAX_NEW_TOKENS: usize = 128;

const SINGLE_WEIGHTS_FILE: &str = "model.safetensors";
const SHARDED_WEIGHTS_INDEX: &str = "model.safetensors.index.json";

/// A T5-family seq2seq model (e.g. `google/flan-t5-small`) held in process memory.
///
/// Artifacts are fetched from the Hugging Face hub (or the local cache) when the backend
/// is created. Dropping the backend releases the weights.
pub struct LocalBackend {
    model_name: String,
    model: t5::T5ForConditionalGeneration,
    tokenizer: Tokenizer,
    config: t5::Config,
    device: Device,
    max_new_tokens: usize,
}

impl LocalBackend {
    /// Loads tokenizer, config and weights for `model_name`.
    ///
    /// # Arguments
    ///
    /// * `model_name` - Hub model identifier, e.g. `google/flan-t5-base`.
    /// * `cache_dir` - Where hub artifacts are cached (None for the hub default).
    /// * `max_new_tokens` - Upper bound on generated tokens per call.
    pub fn load(
        model_name: &str,
        cache_dir: Option<PathBuf>,
        max_new_tokens: usize,
    ) -> Result<Self> {
        info!("Loading local model '{}'...", model_name);
        // --- Fetch artifacts (hub cache first) ---
        let load_error = |reason: String| FlashgenError::ModelLoad {
            model: model_name.to_string(),
            reason,
        };

        let mut builder = ApiBuilder::new().with_progress(false);
        if let Some(dir) = cache_dir {
            builder = builder.with_cache_dir(dir);
        }
        let api = builder.build().map_err(|e| load_error(e.to_string()))?;
        let repo = api.model(model_name.to_string());

        let config_path = repo
            .get("config.json")
            .map_err(|e| load_error(format!("config.json: {}", e)))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| load_error(format!("tokenizer.json: {}", e)))?;
        let weight_paths = weight_files(&repo).map_err(load_error)?;

        // --- Parse config and tokenizer ---
        let raw_config =
            std::fs::read_to_string(&config_path).map_err(|e| load_error(e.to_string()))?;
        let mut config: t5::Config =
            serde_json::from_str(&raw_config).map_err(|e| load_error(e.to_string()))?;
        config.use_cache = true;

        let tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| load_error(e.to_string()))?;

        // --- Load weights on CPU ---
        let device = Device::Cpu;
        // SAFETY: the safetensors files are owned by the hub cache and not modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&weight_paths, DType::F32, &device) }
            .map_err(|e| load_error(e.to_string()))?;
        let model =
            t5::T5ForConditionalGeneration::load(vb, &config).map_err(|e| load_error(e.to_string()))?;

        info!(
            "Loaded '{}' ({} weight file(s), max {} new tokens)",
            model_name,
            weight_paths.len(),
            max_new_tokens
        );
        Ok(Self {
            model_name: model_name.to_string(),
            model,
            tokenizer,
            config,
            device,
            max_new_tokens,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    // Greedy decoding: always take the highest-scoring token.
    fn decode_greedy(&mut self, prompt: &str) -> candle_core::Result<Vec<u32>> {
        // Start from an empty decoder cache, even after a failed call.
        self.model.clear_kv_cache();

        // Encode the prompt once
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(candle_core::Error::msg)?;
        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let encoder_output = self.model.encode(&input_ids)?;

        let start_token = self
            .config
            .decoder_start_token_id
            .unwrap_or(self.config.pad_token_id) as u32;
        let mut output_ids = vec![start_token];

        // Feed back one token per step until EOS or the token cap
        while output_ids.len() <= self.max_new_tokens {
            let decoder_input = if output_ids.len() == 1 || !self.config.use_cache {
                Tensor::new(output_ids.as_slice(), &self.device)?.unsqueeze(0)?
            } else {
                let last = output_ids[output_ids.len() - 1];
                Tensor::new(&[last], &self.device)?.unsqueeze(0)?
            };
            let logits = self
                .model
                .decode(&decoder_input, &encoder_output)?
                .squeeze(0)?;
            let next = logits.argmax(D::Minus1)?.to_scalar::<u32>()?;
            if next as usize == self.config.eos_token_id {
                break;
            }
            output_ids.push(next);
        }

        output_ids.remove(0);
        Ok(output_ids)
    }
}

impl GenerationBackend for LocalBackend {
    fn generate(&mut self, prompt: &str) -> Result<String> {
        debug!("Local generation ({} prompt chars)", prompt.len());
        let token_ids = self
            .decode_greedy(prompt)
            .map_err(|e| FlashgenError::Generation(e.to_string()))?;
        let text = self
            .tokenizer
            .decode(&token_ids, true)
            .map_err(|e| FlashgenError::Generation(e.to_string()))?;
        debug!("Generated {} tokens", token_ids.len());
        Ok(text)
    }

    fn test_connection(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "local"
    }
}

impl Drop for LocalBackend {
    fn drop(&mut self) {
        debug!("Releasing local model '{}'", self.model_name);
    }
}

/// Single-file checkpoints ship `model.safetensors`; large ones are sharded behind an
/// index whose `weight_map` names every shard.
fn weight_files(repo: &ApiRepo) -> std::result::Result<Vec<PathBuf>, String> {
    if let Ok(path) = repo.get(SINGLE_WEIGHTS_FILE) {
        return Ok(vec![path]);
    }

    let index_path = repo
        .get(SHARDED_WEIGHTS_INDEX)
        .map_err(|e| format!("no {} or {}: {}", SINGLE_WEIGHTS_FILE, SHARDED_WEIGHTS_INDEX, e))?;
    let raw = std::fs::read_to_string(&index_path).map_err(|e| e.to_string())?;
    let index: serde_json::Value = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
    let shards = shard_names(&index)?;
    shards
        .iter()
        .map(|shard| repo.get(shard).map_err(|e| format!("{}: {}", shard, e)))
        .collect()
}

fn shard_names(index: &serde_json::Value) -> std::result::Result<Vec<String>, String> {
    let weight_map = index
        .get("weight_map")
        .and_then(|m| m.as_object())
        .ok_or_else(|| "weight index has no weight_map".to_string())?;
    let mut shards: Vec<String> = weight_map
        .values()
        .filter_map(|v| v.as_str().map(str::to_owned))
        .collect();
    shards.sort();
    shards.dedup();
    Ok(shards)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_names_are_unique_and_sorted() {
        let index = serde_json::json!({
            "metadata": {"total_size": 1},
            "weight_map": {
                "encoder.block.0.weight": "model-00002-of-00002.safetensors",
                "decoder.block.0.weight": "model-00001-of-00002.safetensors",
                "shared.weight": "model-00001-of-00002.safetensors"
            }
        });
        assert_eq!(
            shard_names(&index).unwrap(),
            vec!["model-00001-of-00002.safetensors", "model-00002-of-00002.safetensors"]
        );
    }

    #[test]
    fn test_shard_names_requires_weight_map() {
        assert!(shard_names(&serde_json::json!({})).is_err());
    }

    #[test]
    fn test_unknown_model_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let result = LocalBackend::load(
            "flashgen-tests/definitely-not-a-model",
            Some(dir.path().to_path_buf()),
            DEFAULT_MAX_NEW_TOKENS,
        );
        assert!(matches!(result, Err(FlashgenError::ModelLoad { .. })));
    }

    // Downloads google/flan-t5-small (~300MB) on first run.
    #[test]
    #[ignore]
    fn test_repeated_prompts_decode_from_a_clean_cache() {
        let mut backend = LocalBackend::load("google/flan-t5-small", None, 16).unwrap();
        let first = backend.generate("What is mitosis?").unwrap();
        let _ = backend.generate("Translate to German: good morning").unwrap();
        let again = backend.generate("What is mitosis?").unwrap();
        assert_eq!(first, again);
    }

    #[test]
    #[ignore]
    fn test_flan_t5_small_generates_text() {
        let mut backend = LocalBackend::load("google/flan-t5-small", None, 32).unwrap();
        assert!(backend.test_connection());
        let answer = backend
            .generate("Explain the process of photosynthesis in simple terms.")
            .unwrap();
        assert!(!answer.is_empty());
    }
}
