//! Playback controller: the station state machine over a single audio sink.
//!
//! Each `play` is an attempt with a fresh id.  Starting a new attempt aborts
//! the previous one, and a late result for an old id is ignored, so the most
//! recent request always wins.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use tune_proto::protocol::{NowPlaying, PlaybackStatus, Station};
use tune_proto::state::{lock_store, SharedStore, VOLUME_KEY};

use crate::core::CoreEvent;
use crate::error::SinkError;

pub const CONNECT_FAILED_NOTICE: &str = "Unable to connect to this station. Please try another one.";
pub const STREAM_FAILED_NOTICE: &str = "Stream unavailable. Please try another station.";

pub type AttemptId = u64;

/// Progress reported by the audio sink while a stream is loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    LoadStart,
    Waiting,
    Stalled,
    Playing,
    /// Paused at `position` seconds into the stream.
    Pause { position: f64 },
    Ended,
    Error(String),
}

/// The single shared audio output.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Load `url` and resolve once audio is flowing.
    async fn start(&self, url: &str) -> Result<(), SinkError>;
    async fn set_paused(&self, paused: bool) -> Result<(), SinkError>;
    async fn set_volume(&self, percent: u8) -> Result<(), SinkError>;
    async fn stop(&self) -> Result<(), SinkError>;
    fn subscribe(&self) -> broadcast::Receiver<SinkEvent>;
}

pub struct PlaybackController {
    sink: Arc<dyn AudioSink>,
    store: SharedStore,
    event_tx: mpsc::Sender<CoreEvent>,
    status: PlaybackStatus,
    status_text: String,
    current: Option<Station>,
    now_playing: Option<NowPlaying>,
    volume: u8,
    has_source: bool,
    latest_attempt: AttemptId,
    attempt_handle: Option<AbortHandle>,
}

impl PlaybackController {
    /// `default_volume` applies when nothing valid is persisted.
    pub fn new(
        sink: Arc<dyn AudioSink>,
        store: SharedStore,
        event_tx: mpsc::Sender<CoreEvent>,
        default_volume: u8,
    ) -> Self {
        let volume = lock_store(&store)
            .get::<u8>(VOLUME_KEY)
            .unwrap_or(default_volume)
            .min(100);
        Self {
            sink,
            store,
            event_tx,
            status: PlaybackStatus::Idle,
            status_text: "Idle".to_string(),
            current: None,
            now_playing: None,
            volume,
            has_source: false,
            latest_attempt: 0,
            attempt_handle: None,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn current(&self) -> Option<&Station> {
        self.current.as_ref()
    }

    pub fn now_playing(&self) -> Option<&NowPlaying> {
        self.now_playing.as_ref()
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// True once any station has been handed to the sink.
    pub fn has_source(&self) -> bool {
        self.has_source
    }

    /// Start connecting to `station`.  The outcome arrives later as
    /// `CoreEvent::AttemptResolved` carrying the returned id.
    pub fn play(&mut self, station: Station) -> AttemptId {
        self.abort_attempt();
        self.latest_attempt += 1;
        let id = self.latest_attempt;
        info!("playback: attempt {} -> {} ({})", id, station.name, station.url);

        let url = station.url.clone();
        self.current = Some(station);
        self.now_playing = None;
        self.status = PlaybackStatus::Connecting;
        self.status_text = "Connecting…".to_string();
        self.has_source = true;

        let sink = Arc::clone(&self.sink);
        let tx = self.event_tx.clone();
        let handle = tokio::spawn(async move {
            let result = sink.start(&url).await;
            let _ = tx.send(CoreEvent::AttemptResolved { id, result }).await;
        });
        self.attempt_handle = Some(handle.abort_handle());
        id
    }

    /// Apply the outcome of attempt `id`.  Returns a user notice on failure.
    pub fn on_attempt_resolved(
        &mut self,
        id: AttemptId,
        result: Result<(), SinkError>,
    ) -> Option<&'static str> {
        if id != self.latest_attempt || self.status != PlaybackStatus::Connecting {
            debug!("playback: ignoring stale attempt {}", id);
            return None;
        }
        self.attempt_handle = None;
        match result {
            Ok(()) => {
                self.status = PlaybackStatus::Playing;
                self.status_text = "Live".to_string();
                self.now_playing = self.current.as_ref().map(NowPlaying::from_station);
                info!("playback: attempt {} playing", id);
                None
            }
            Err(e) => {
                warn!("playback: attempt {} failed: {}", id, e);
                self.status = PlaybackStatus::Error;
                self.status_text = "Error".to_string();
                self.now_playing = None;
                self.current = None;
                Some(CONNECT_FAILED_NOTICE)
            }
        }
    }

    /// Flip pause while a stream is live.  `Ok(None)` when there is nothing
    /// to pause; otherwise the new paused flag.  A sink that refuses leaves
    /// the controller in `Error` with nothing current.
    pub async fn toggle_pause(&mut self) -> Result<Option<bool>, SinkError> {
        let pause = match self.status {
            PlaybackStatus::Playing => true,
            PlaybackStatus::Paused => false,
            _ => return Ok(None),
        };
        if let Err(e) = self.sink.set_paused(pause).await {
            warn!("playback: pause toggle failed: {}", e);
            self.status = PlaybackStatus::Error;
            self.status_text = "Error".to_string();
            self.current = None;
            self.now_playing = None;
            return Err(e);
        }
        if pause {
            self.status = PlaybackStatus::Paused;
            self.status_text = "Paused".to_string();
        } else {
            self.status = PlaybackStatus::Playing;
            self.status_text = "Live".to_string();
        }
        Ok(Some(pause))
    }

    pub async fn stop(&mut self) -> Result<(), SinkError> {
        self.abort_attempt();
        // invalidate a result that may already be queued
        self.latest_attempt += 1;
        self.status = PlaybackStatus::Idle;
        self.status_text = "Idle".to_string();
        self.current = None;
        self.now_playing = None;
        self.sink.stop().await
    }

    /// Clamp to 0..=100, apply and persist.  The volume is kept even when
    /// the sink or the store refuse it.
    pub async fn set_volume(&mut self, percent: u8) -> Result<(), SinkError> {
        self.volume = percent.min(100);
        if let Err(e) = lock_store(&self.store).set(VOLUME_KEY, &self.volume) {
            warn!("playback: failed to persist volume: {}", e);
        }
        self.sink.set_volume(self.volume).await
    }

    /// Push the current volume to the sink without persisting it.
    pub async fn sync_volume(&self) -> Result<(), SinkError> {
        self.sink.set_volume(self.volume).await
    }

    pub fn subscribe_sink(&self) -> broadcast::Receiver<SinkEvent> {
        self.sink.subscribe()
    }

    /// Track sink progress.  Returns a user notice when the stream dies.
    pub fn on_sink_event(&mut self, event: SinkEvent) -> Option<&'static str> {
        if !self.status.has_current() {
            return None;
        }
        let live = matches!(self.status, PlaybackStatus::Playing | PlaybackStatus::Paused);
        self.status_text = match &event {
            SinkEvent::LoadStart => "Connecting…",
            SinkEvent::Waiting => "Buffering…",
            SinkEvent::Stalled => "Reconnecting…",
            SinkEvent::Playing => "Live",
            SinkEvent::Pause { position } if *position > 0.0 => "Paused",
            SinkEvent::Pause { .. } => "Idle",
            SinkEvent::Ended => "Ended",
            SinkEvent::Error(_) => "Error",
        }
        .to_string();

        match event {
            // while connecting the attempt itself reports the failure
            SinkEvent::Error(reason) if live => {
                warn!("playback: {}", SinkError::RuntimeFailure(reason));
                self.status = PlaybackStatus::Error;
                self.now_playing = None;
                self.current = None;
                Some(STREAM_FAILED_NOTICE)
            }
            SinkEvent::Ended if live => {
                info!("playback: stream ended");
                self.status = PlaybackStatus::Ended;
                None
            }
            _ => None,
        }
    }

    fn abort_attempt(&mut self) {
        if let Some(handle) = self.attempt_handle.take() {
            handle.abort();
        }
    }
}
