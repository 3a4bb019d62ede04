use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use flashgen::application::flashcard_service::generate_demo;
use flashgen::config::{self, FlashgenConfig, GenerationConfig};
use flashgen::infrastructure::export::ExportFormat;
use flashgen::infrastructure::text_extractor::{preprocess, preview};
use flashgen::{
    extract_terms_with_limit, Backend, FlashcardService, FlashcardSession, GenerationBackend,
    TextExtractor,
};

#[derive(Parser)]
#[command(
    name = "flashgen",
    version,
    about = "Generate question/answer flashcards from educational text"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract plain text from a .txt or .pdf file
    Extract {
        /// Path to the .txt or .pdf file
        file: PathBuf,

        /// Drop blank lines and cap the text at text.max_chars characters
        #[arg(long)]
        preprocess: bool,

        /// Only print the first text.preview_chars characters
        #[arg(long)]
        preview: bool,
    },
    /// List the key terms flashcards would be generated for
    Terms {
        /// Path to the .txt or .pdf file
        file: Option<PathBuf>,

        /// Use this text instead of a file
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
    },
    /// Generate a batch of flashcards and export it
    Generate(GenerateArgs),
    /// Build the configured backend and report whether it can serve requests
    Check {
        /// Check the remote backend instead of the local model
        #[arg(long)]
        remote: bool,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Path to the .txt or .pdf source
    #[arg(short, long, value_name = "FILE", required_unless_present = "text")]
    input: Option<PathBuf>,

    /// Source text given inline
    #[arg(short, long, conflicts_with = "input")]
    text: Option<String>,

    /// Subject the cards are about (default: pipeline.default_subject)
    #[arg(short, long)]
    subject: Option<String>,

    /// Number of cards (default: pipeline.default_cards)
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Model identifier, e.g. google/flan-t5-base
    #[arg(short, long)]
    model: Option<String>,

    /// Use the remote backend
    #[arg(long)]
    remote: bool,

    /// API key for the remote backend; ignored without --remote
    #[arg(long, env = "HF_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Template answers without loading any model
    #[arg(long, conflicts_with = "remote")]
    demo: bool,

    /// Drop blank lines and cap the source at text.max_chars characters before generating
    #[arg(long)]
    preprocess: bool,

    /// Export format: csv (default), json, anki or quizlet
    #[arg(short, long, default_value = "csv")]
    format: ExportFormat,

    /// Write the export to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // A missing .env is fine.
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_config()?;
    log::debug!("Configuration loaded: {:?}", config);

    match cli.command {
        Commands::Extract {
            file,
            preprocess: should_preprocess,
            preview: should_preview,
        } => {
            let mut text = extract_file(&config, &file)?;
            if should_preprocess {
                text = preprocess(&text, config.text.max_chars);
            }
            if should_preview {
                text = preview(&text, config.text.preview_chars);
            }
            println!("{}", text);
        }
        Commands::Terms { file, text } => {
            let content = match (file, text) {
                (Some(file), _) => extract_file(&config, &file)?,
                (None, Some(text)) => text,
                (None, None) => bail!("Provide a file or --text"),
            };
            for term in extract_terms_with_limit(&content, config.pipeline.max_terms) {
                println!("{}", term);
            }
        }
        Commands::Generate(args) => run_generate(config, args)?,
        Commands::Check { remote } => {
            let mut generation = config.generation.clone();
            if remote {
                generation.use_local = false;
            }
            let backend = Backend::from_config(&generation)
                .with_context(|| format!("Failed to build backend for '{}'", generation.model_name))?;
            let available = backend.test_connection();
            println!(
                "backend={} model={} available={}",
                backend.name(),
                generation.model_name,
                available
            );
            if !available {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}

fn run_generate(mut config: FlashgenConfig, args: GenerateArgs) -> Result<()> {
    apply_backend_overrides(&mut config.generation, args.model, args.remote, args.api_key);

    // Source text: file or inline, optionally cleaned up and capped
    let raw = match (&args.input, args.text) {
        (Some(path), _) => extract_file(&config, path)?,
        (None, Some(text)) => text,
        (None, None) => bail!("Provide --input or --text"),
    };
    let content = if args.preprocess {
        preprocess(&raw, config.text.max_chars)
    } else {
        raw
    };
    let subject = args
        .subject
        .unwrap_or_else(|| config.pipeline.default_subject.clone());
    let count = args.count.unwrap_or(config.pipeline.default_cards);
    let allowed = config.pipeline.card_range();

    let mut session = FlashcardSession::new();
    let generated = if args.demo {
        if !allowed.contains(&count) {
            bail!(
                "Number of flashcards must be between {} and {}, got {}",
                allowed.start(),
                allowed.end(),
                count
            );
        }
        session.generate_with(&content, |text| Ok(generate_demo(text, &subject, count)))?
    } else {
        let backend = Backend::from_config(&config.generation).with_context(|| {
            format!("Failed to build backend for '{}'", config.generation.model_name)
        })?;
        let mut service = FlashcardService::new(backend).with_max_terms(config.pipeline.max_terms);
        session.generate(&mut service, &content, &subject, count, allowed)?
    };
    log::info!("Generated {} flashcards", generated);

    let payload = session.export(args.format)?;
    match args.output {
        Some(path) => {
            fs::write(&path, &payload.bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {} export to {}", args.format, path.display());
        }
        None => print!("{}", String::from_utf8_lossy(&payload.bytes)),
    }
    Ok(())
}

/// Command-line backend choices layered over the loaded configuration.
/// The API key only applies to the remote backend.
fn apply_backend_overrides(
    generation: &mut GenerationConfig,
    model: Option<String>,
    remote: bool,
    api_key: Option<String>,
) {
    if let Some(model) = model {
        generation.model_name = model;
    }
    if remote {
        generation.use_local = false;
        generation.api_key = api_key.or(generation.api_key.take());
    }
}

fn extract_file(config: &FlashgenConfig, path: &Path) -> Result<String> {
    let extractor = TextExtractor::new(config.text.encodings.clone());
    extractor
        .extract_path(path)
        .with_context(|| format!("Failed to extract text from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn parse_generate(args: &[&str]) -> GenerateArgs {
        let argv = ["flashgen", "generate"].iter().chain(args.iter());
        match Cli::try_parse_from(argv).expect("arguments should parse").command {
            Commands::Generate(args) => args,
            _ => panic!("expected the generate subcommand"),
        }
    }

    #[test]
    fn test_local_generate_parses_with_api_key_in_env() {
        Jail::expect_with(|jail| {
            jail.set_env("HF_API_KEY", "hf_from_env");
            let args = parse_generate(&["--text", "Photosynthesis uses light"]);
            assert!(!args.remote);
            assert_eq!(args.api_key.as_deref(), Some("hf_from_env"));

            let mut generation = GenerationConfig::default();
            apply_backend_overrides(&mut generation, args.model, args.remote, args.api_key);
            assert!(generation.use_local);
            assert!(generation.api_key.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_remote_generate_takes_api_key() {
        Jail::expect_with(|_jail| {
            let args = parse_generate(&[
                "--text",
                "Photosynthesis uses light",
                "--remote",
                "--api-key",
                "hf_flag",
                "--model",
                "google/flan-t5-base",
            ]);
            let mut generation = GenerationConfig::default();
            apply_backend_overrides(&mut generation, args.model, args.remote, args.api_key);
            assert!(!generation.use_local);
            assert_eq!(generation.api_key.as_deref(), Some("hf_flag"));
            assert_eq!(generation.model_name, "google/flan-t5-base");
            Ok(())
        });
    }

    #[test]
    fn test_generate_preprocess_is_opt_in() {
        Jail::expect_with(|_jail| {
            let args = parse_generate(&["--text", "Cells divide"]);
            assert!(!args.preprocess);
            assert_eq!(args.format, ExportFormat::Csv);

            let args = parse_generate(&["--text", "Cells divide", "--preprocess", "-f", "anki"]);
            assert!(args.preprocess);
            assert_eq!(args.format, ExportFormat::Anki);
            Ok(())
        });
    }

    #[test]
    fn test_generate_requires_a_source() {
        assert!(Cli::try_parse_from(["flashgen", "generate"]).is_err());
        assert!(Cli::try_parse_from(["flashgen", "generate", "--demo", "--remote", "-t", "x"]).is_err());
    }
}
