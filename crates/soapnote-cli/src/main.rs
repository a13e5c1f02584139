mod display;
mod serve;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use soapnote_ai::{EngineConfig, LexiconRecognizer, NoteEngine};
use soapnote_core::Capabilities;
use soapnote_remote::InferenceClient;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "soapnote", version, about = "Structure consultation text into SOAP notes")]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct EngineArgs {
    /// Base URL of an inference server for sentences, zero-shot and NER.
    #[arg(long, env = "SOAPNOTE_INFERENCE_URL", global = true)]
    inference_url: Option<String>,

    /// Recognise symptoms and conditions from the built-in lexicon.
    #[arg(long, global = true)]
    lexicon: bool,

    /// Sentence-transformers model directory for local zero-shot
    /// classification (needs the `onnx` feature).
    #[arg(long, env = "SOAPNOTE_MODEL_DIR", global = true)]
    model_dir: Option<PathBuf>,

    /// Engine options as JSON.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Clean up speech-to-text output before structuring.
    #[arg(long, global = true)]
    normalize: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Structure text from an argument, a file or stdin.
    Structure {
        text: Option<String>,

        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Print the note as JSON instead of a card.
        #[arg(long)]
        json: bool,
    },
    /// List section keywords in classification priority order.
    Keywords,
    /// Serve the HTTP API.
    Serve {
        #[arg(long, env = "SOAPNOTE_ADDR", default_value = "127.0.0.1:8080")]
        addr: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("soapnote=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Structure { text, file, json } => {
            let engine = build_engine(&cli.engine)?;
            let input = read_input(text, file)?;
            let note = engine.process(&input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&note)?);
            } else {
                display::print_note(&note);
            }
        }
        Command::Keywords => display::print_keywords(),
        Command::Serve { addr } => {
            // Built before the runtime: the blocking HTTP client must be
            // created and dropped outside async context.
            let engine = Arc::new(build_engine(&cli.engine)?);
            info!("soapnote v{}", env!("CARGO_PKG_VERSION"));
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve::run(&addr, Arc::clone(&engine)))?;
            drop(runtime);
        }
    }

    Ok(())
}

fn build_engine(args: &EngineArgs) -> anyhow::Result<NoteEngine> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if args.normalize {
        config.normalize_transcripts = true;
    }

    let mut caps = Capabilities::none();

    if let Some(url) = &args.inference_url {
        let client = Arc::new(
            InferenceClient::new(url.as_str()).with_context(|| format!("inference client for {url}"))?,
        );
        caps = caps
            .with_sentence_boundary(client.clone())
            .with_zero_shot(client.clone())
            .with_entities(client);
    }

    if args.lexicon {
        caps = caps.with_entities(Arc::new(LexiconRecognizer));
    }

    if let Some(dir) = &args.model_dir {
        caps = with_local_zero_shot(caps, dir)?;
    }

    info!(?caps, ?config, "engine configured");
    Ok(NoteEngine::with_config(caps, config))
}

#[cfg(feature = "onnx")]
fn with_local_zero_shot(caps: Capabilities, dir: &std::path::Path) -> anyhow::Result<Capabilities> {
    let zero_shot = soapnote_ai::EmbeddingZeroShot::load(dir)
        .with_context(|| format!("loading zero-shot model from {}", dir.display()))?;
    Ok(caps.with_zero_shot(Arc::new(zero_shot)))
}

#[cfg(not(feature = "onnx"))]
fn with_local_zero_shot(_caps: Capabilities, dir: &std::path::Path) -> anyhow::Result<Capabilities> {
    anyhow::bail!(
        "--model-dir {} given but soapnote was built without the `onnx` feature",
        dir.display()
    )
}

fn read_input(text: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("reading stdin")?;
    Ok(buf)
}
