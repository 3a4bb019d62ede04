use flashgen::config;
use flashgen::{GenerationBackend, LocalBackend};
use std::env;

const DEFAULT_PROMPT: &str = "Explain the process of photosynthesis in simple terms.";

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    // Args: optional prompt, joined with spaces
    let args: Vec<String> = env::args().skip(1).collect();
    let prompt = if args.is_empty() {
        DEFAULT_PROMPT.to_string()
    } else {
        args.join(" ")
    };

    let config = config::load_config()?;
    let generation = &config.generation;
    let mut backend = LocalBackend::load(
        &generation.model_name,
        generation.cache_dir.clone(),
        generation.max_new_tokens,
    )?;

    let answer = backend.generate(&prompt)?;
    println!("Q: {}", prompt);
    println!("A: {}", answer);
    Ok(())
}
