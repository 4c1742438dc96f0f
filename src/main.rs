use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use sharecard::{new_dispatcher, Dispatcher, RenderConfig, SharePayload};
use std::path::PathBuf;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser)]
#[command(name = "sharecard")]
#[command(about = "Render promotional share cards to PNG", long_about = None)]
struct Cli {
    /// JSON render configuration; missing fields keep their defaults
    #[arg(long, global = true, value_name = "CONFIG_JSON")]
    config: Option<PathBuf>,
    /// Origin that relative asset and font paths resolve against
    #[arg(long, global = true)]
    asset_origin: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one payload file to a PNG file
    Render {
        #[arg(long, value_name = "PAYLOAD_JSON")]
        payload: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Composite the given layers full-frame, skipping any that fail to load
    Overlay {
        #[arg(long = "layer", required = true)]
        layers: Vec<String>,
        #[arg(long)]
        caption: Option<String>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Read one `{"id", "payload"}` job per stdin line and answer with data URLs
    Worker,
}

#[derive(Deserialize)]
struct Job {
    id: serde_json::Value,
    payload: serde_json::Value,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Reply {
    Rendered { id: serde_json::Value, url: String },
    Failed { id: serde_json::Value, error: String },
}

fn load_config(cli: &Cli) -> anyhow::Result<RenderConfig> {
    let mut config = match &cli.config {
        Some(path) => RenderConfig::from_json_file(path)?,
        None => RenderConfig::default(),
    };
    if let Some(origin) = &cli.asset_origin {
        config.asset_origin = origin.clone();
    }
    Ok(config)
}

async fn worker_main(dispatcher: &Dispatcher) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let job: Job = match serde_json::from_str(&line) {
            Ok(job) => job,
            Err(e) => {
                log::warn!("ignoring malformed job line: {}", e);
                continue;
            }
        };
        let rendered = match SharePayload::from_value(job.payload) {
            Ok(payload) => dispatcher.handle_request(&payload).await,
            Err(e) => Err(e),
        };
        let reply = match rendered {
            Ok(image) => Reply::Rendered { id: job.id, url: image.data_url() },
            Err(e) => Reply::Failed { id: job.id, error: e.to_string() },
        };
        let mut encoded = serde_json::to_vec(&reply)?;
        encoded.push(b'\n');
        out.write_all(&encoded).await?;
        out.flush().await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let dispatcher = new_dispatcher(config)?;

    match cli.command {
        Command::Render { payload, out } => {
            let started = Instant::now();
            let raw = std::fs::read_to_string(&payload)
                .with_context(|| format!("reading {}", payload.display()))?;
            let image = dispatcher.handle_json(&raw).await?;
            std::fs::write(&out, &image.png_data).with_context(|| format!("writing {}", out.display()))?;
            log::info!("wrote {} ({}) in {:?}", out.display(), image.digest(), started.elapsed());
        }
        Command::Overlay { layers, caption, out } => {
            let image = dispatcher.render_overlay(&layers, caption.as_deref()).await?;
            std::fs::write(&out, &image.png_data).with_context(|| format!("writing {}", out.display()))?;
            log::info!("wrote {} ({})", out.display(), image.digest());
        }
        Command::Worker => worker_main(&dispatcher).await?,
    }
    Ok(())
}
