use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use speechwire_core::{
    LongRunningRecognizeRequest, Operation, RecognizeRequest, Settings, StreamingRecognizeRequest,
    StreamingRecognizeResponse,
};
use speechwire_stream::{
    chunk_requests, RecognizerRegistry, RequestSequencer, ResponseChecker, SessionHost,
    TranscriptAssembler,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "speechwire", about = "Speech recognition wire schema toolkit")]
struct Cli {
    /// Path to the configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a JSON message (or JSON-lines stream) against the schema rules
    Validate {
        #[arg(short, long, value_enum)]
        kind: MessageKind,
        path: PathBuf,
    },
    /// Stream a raw audio file through the configured recognizer
    Stream {
        audio: PathBuf,
    },
    /// Answer a RecognizeRequest JSON file through the configured recognizer
    Recognize {
        request: PathBuf,
    },
    /// Assemble the transcript from a JSON-lines file of streaming responses
    Transcript {
        responses: PathBuf,

        /// Minimum stability for interim text to be shown
        #[arg(long)]
        stability: Option<f32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MessageKind {
    Recognize,
    LongRunning,
    StreamingRequests,
    StreamingResponses,
    Operation,
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("failed to load config from {path:?}")),
        None => Ok(Settings::from_toml_str("")?),
    }
}

fn read_json_lines<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("{path:?} line {}", i + 1))
        })
        .collect()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))?;
    serde_json::from_str(&content).with_context(|| format!("failed to decode {path:?}"))
}

fn validate(kind: MessageKind, path: &Path) -> Result<()> {
    match kind {
        MessageKind::Recognize => {
            let req: RecognizeRequest = read_json(path)?;
            req.validate()?;
        }
        MessageKind::LongRunning => {
            let req: LongRunningRecognizeRequest = read_json(path)?;
            req.validate()?;
        }
        MessageKind::StreamingRequests => {
            let requests: Vec<StreamingRecognizeRequest> = read_json_lines(path)?;
            let mut sequencer = RequestSequencer::new();
            for (i, req) in requests.iter().enumerate() {
                sequencer
                    .push(req)
                    .with_context(|| format!("request #{}", i + 1))?;
            }
            let (chunks, bytes) = sequencer.audio_sent();
            tracing::info!(chunks, bytes, "request stream is well ordered");
        }
        MessageKind::StreamingResponses => {
            let responses: Vec<StreamingRecognizeResponse> = read_json_lines(path)?;
            for (i, resp) in responses.iter().enumerate() {
                resp.validate()
                    .with_context(|| format!("response #{}", i + 1))?;
            }
        }
        MessageKind::Operation => {
            let op: Operation = read_json(path)?;
            if let Some(meta) = &op.metadata {
                tracing::info!(
                    name = %op.name,
                    progress = meta.progress_percent,
                    done = op.done,
                    "operation"
                );
            }
        }
    }
    println!("ok");
    Ok(())
}

async fn stream(settings: &Settings, audio: &Path) -> Result<()> {
    let streaming_config = settings.streaming_config()?;
    let content = std::fs::read(audio).with_context(|| format!("failed to read {audio:?}"))?;
    if content.is_empty() {
        bail!("{audio:?} is empty");
    }

    let registry = RecognizerRegistry::new();
    let mut host = SessionHost::new();
    let mut rx = host
        .take_response_receiver()
        .context("response receiver already taken")?;
    let tx = host
        .open(
            &settings.recognizer.engine,
            settings.recognizer_table(),
            &registry,
        )
        .await
        .with_context(|| format!("failed to open recognizer '{}'", settings.recognizer.engine))?;
    host.start();

    let requests = chunk_requests(streaming_config.clone(), &content, settings.general.chunk_size);
    tracing::info!(
        requests = requests.len(),
        bytes = content.len(),
        "streaming {:?}",
        audio
    );
    for req in requests {
        if tx.send(req).is_err() {
            tracing::warn!("session ended before all audio was sent");
            break;
        }
    }
    drop(tx);

    let mut checker = ResponseChecker::new(streaming_config);
    let mut assembler = TranscriptAssembler::new();
    while let Some(response) = rx.recv().await {
        if let Err(e) = checker.check(&response) {
            tracing::warn!("response violates stream rules: {e}");
        }
        assembler.push(&response);
        println!("{}", serde_json::to_string(&response)?);
        if let Some(status) = response.error() {
            tracing::error!(code = %status.code, "stream failed: {}", status.message);
        }
    }
    host.shutdown().await;

    tracing::info!(finals = assembler.final_count(), "transcript: {}", assembler.transcript());
    Ok(())
}

async fn recognize(settings: &Settings, path: &Path) -> Result<()> {
    let request: RecognizeRequest = read_json(path)?;
    let registry = RecognizerRegistry::new();
    let response = speechwire_stream::recognize(
        request,
        &settings.recognizer.engine,
        settings.recognizer_table(),
        &registry,
        settings.general.chunk_size,
    )
    .await
    .context("recognize failed")?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn transcript(path: &Path, stability: Option<f32>) -> Result<()> {
    let responses: Vec<StreamingRecognizeResponse> = read_json_lines(path)?;
    let mut assembler = TranscriptAssembler::new();
    for resp in &responses {
        if let Some(status) = resp.error() {
            bail!("stream reported an error: {status}");
        }
        assembler.push(resp);
    }
    match stability {
        Some(threshold) => println!("{}", assembler.display_text(threshold)),
        None => println!("{}", assembler.transcript()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    let env_filter = EnvFilter::try_new(&settings.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    match cli.command {
        Command::Validate { kind, path } => validate(kind, &path),
        Command::Stream { audio } => stream(&settings, &audio).await,
        Command::Recognize { request } => recognize(&settings, &request).await,
        Command::Transcript {
            responses,
            stability,
        } => transcript(&responses, stability),
    }
}
