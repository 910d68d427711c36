use std::path::Path;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use asr_stream_client::audio::WavChunkReader;
use asr_stream_client::auth::SignedUriBuilder;
use asr_stream_client::config::ConfigSet;
use asr_stream_client::session::SessionOrchestrator;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match ConfigSet::load_from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = ?err, "failed to load configuration");
            std::process::exit(1);
        }
    };
    info!(root = ?config.root(), "configuration loaded");

    let reader = WavChunkReader::new(config.streaming.chunk_duration_ms);
    let endpoint = SignedUriBuilder::new(config.endpoint.clone());
    let orchestrator = SessionOrchestrator::new(config.streaming.clone(), endpoint);

    if let Err(err) = std::fs::create_dir_all(&config.io.output_dir) {
        error!(error = %err, dir = ?config.io.output_dir, "failed to create output directory");
        std::process::exit(1);
    }

    let entries = match std::fs::read_dir(&config.io.input_dir) {
        Ok(entries) => entries,
        Err(err) => {
            error!(error = %err, dir = ?config.io.input_dir, "failed to read input directory");
            std::process::exit(1);
        }
    };

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("wav"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    info!(files = paths.len(), "processing input directory");
    for path in paths {
        if let Err(err) = process_file(&path, &reader, &orchestrator, &config).await {
            error!(file = ?path, error = %err, "session failed");
        }
    }
}

/// WAVファイル1つを1セッションとして実行し、トレースを保存する
async fn process_file(
    path: &Path,
    reader: &WavChunkReader,
    orchestrator: &SessionOrchestrator<SignedUriBuilder>,
    config: &ConfigSet,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(file = ?path, "processing");
    let chunks = reader.read_chunks(path)?;

    let report = orchestrator
        .run_session(chunks, config.streaming.vad_silence_ms)
        .await?;
    info!(
        iid = %report.iid,
        outcome = ?report.outcome,
        events = report.events.len(),
        "session finished"
    );

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let out_path = config.io.output_dir.join(format!("{stem}.json"));
    report.save_json(&out_path)?;
    info!(file = ?out_path, "trace saved");
    Ok(())
}

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install tracing subscriber: {err}");
    }
}
