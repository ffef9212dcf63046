mod commands;
mod render;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tune_core::mpv::MpvSink;
use tune_core::{CoreEvent, DirectoryClient, TunerCore};
use tune_proto::config::Config;
use tune_proto::protocol::Update;
use tune_proto::state::{lock_store, KvStore, VOLUME_KEY};

use crate::commands::{Command, HELP};
use crate::render::Renderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = tune_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("tunetracker.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // RUST_LOG wins; otherwise keep HTTP client internals quiet.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,tune_core=debug,hyper_util=warn,reqwest=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("tunetracker log: {}", log_path.display());

    tracing::info!("tunetracker starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("config: {}, using defaults", e);
        Config::default()
    });

    // ── Persistent store, directory, audio sink ─────────────────────────────
    let store = KvStore::open(&config.store.path).shared();
    let directory = Arc::new(DirectoryClient::new(&config.directory)?);
    let volume = lock_store(&store)
        .get::<u8>(VOLUME_KEY)
        .unwrap_or(config.playback.default_volume);
    let sink = Arc::new(MpvSink::new(
        Duration::from_secs(config.playback.connect_timeout_secs),
        volume,
    ));

    // ── Channels (adapter → core, core → adapter) ───────────────────────────
    let (update_tx, update_rx) = broadcast::channel::<Update>(1024);
    let (event_tx, event_rx) = mpsc::channel::<CoreEvent>(1024);

    // ── Spawn TunerCore event loop ───────────────────────────────────────────
    let core = TunerCore::new(
        &config,
        directory,
        sink.clone(),
        store,
        update_tx,
        event_tx.clone(),
    );
    let core_task = tokio::spawn(core.run(event_rx));

    let printer = tokio::spawn(print_updates(
        update_rx,
        Renderer::new(config.random.categories.clone()),
    ));

    println!("{}", HELP);

    // ── Read commands ────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match commands::parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(Command::Help)) => println!("{}", HELP),
            Ok(Some(Command::Categories)) => {
                println!("{}", Renderer::new(config.random.categories.clone()).categories_line())
            }
            Ok(Some(Command::Intent(intent))) => {
                if event_tx.send(CoreEvent::Intent(intent)).await.is_err() {
                    tracing::error!("TunerCore is gone, exiting");
                    break;
                }
            }
            Err(e) => println!("{}", e),
        }
    }

    let _ = event_tx.send(CoreEvent::Shutdown).await;
    if let Err(e) = core_task.await {
        tracing::error!("TunerCore task failed: {}", e);
    }
    printer.abort();
    sink.shutdown().await;
    tracing::info!("tunetracker exiting");
    Ok(())
}

async fn print_updates(mut rx: broadcast::Receiver<Update>, mut renderer: Renderer) {
    loop {
        match rx.recv().await {
            Ok(update) => {
                for line in renderer.render(&update, chrono::Local::now()) {
                    println!("{}", line);
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("printer: skipped {} updates", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
