//! mpv-backed audio sink.
//!
//! Architecture:
//!
//! ```text
//!   MpvSink::connection()   (spawns mpv on first use, again if it died)
//!         │
//!         ├── writer_task   ← receives PendingRequest via mpsc, serialises → socket
//!         └── reader_task   ← reads JSON lines from socket
//!                                ├── response (has request_id) → matched oneshot::Sender
//!                                └── event / property-change   → EventTranslator → SinkEvent broadcast
//! ```
//!
//! Only Unix domain sockets are supported; elsewhere the sink reports
//! `SinkError::Unavailable`.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::error::SinkError;
use crate::playback::{AudioSink, SinkEvent};

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

/// Fixed observe_property IDs, matched in property-change events.
pub const OBS_CORE_IDLE: u64 = 1;
pub const OBS_PAUSE: u64 = 2;
pub const OBS_PAUSED_FOR_CACHE: u64 = 3;
pub const OBS_TIME_POS: u64 = 4;

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, SinkError>>>>>;

struct PendingRequest {
    req_id: u64,
    payload: String, // serialised JSON line (already has '\n')
    reply: oneshot::Sender<Result<Value, SinkError>>,
}

/// An mpv event / property-change that arrived unsolicited (no request_id).
#[derive(Debug, Clone)]
pub struct MpvEvent {
    pub raw: Value,
}

impl MpvEvent {
    /// Returns `Some((obs_id, data))` if this is a property-change event.
    pub fn as_property_change(&self) -> Option<(u64, &Value)> {
        if self.raw.get("event")?.as_str()? == "property-change" {
            let id = self.raw.get("id")?.as_u64()?;
            let data = self.raw.get("data").unwrap_or(&Value::Null);
            Some((id, data))
        } else {
            None
        }
    }

    /// The event name, e.g. "end-file", "start-file".
    pub fn event_name(&self) -> Option<&str> {
        self.raw.get("event")?.as_str()
    }
}

/// Turns raw mpv events into sink events.  Keeps the little state needed
/// to tell a stall from a pause and to report the pause position.
#[derive(Debug, Default)]
pub struct EventTranslator {
    time_pos: f64,
    paused: bool,
    playing: bool,
}

impl EventTranslator {
    pub fn translate(&mut self, evt: &MpvEvent) -> Option<SinkEvent> {
        if let Some((id, data)) = evt.as_property_change() {
            return match id {
                OBS_CORE_IDLE => match data.as_bool() {
                    Some(false) => {
                        self.playing = true;
                        Some(SinkEvent::Playing)
                    }
                    Some(true) if self.playing && !self.paused => {
                        self.playing = false;
                        Some(SinkEvent::Stalled)
                    }
                    _ => None,
                },
                OBS_PAUSE => {
                    self.paused = data.as_bool().unwrap_or(false);
                    self.paused.then_some(SinkEvent::Pause {
                        position: self.time_pos,
                    })
                }
                OBS_PAUSED_FOR_CACHE => (data.as_bool() == Some(true)).then_some(SinkEvent::Waiting),
                OBS_TIME_POS => {
                    if let Some(pos) = data.as_f64() {
                        self.time_pos = pos;
                    }
                    None
                }
                _ => None,
            };
        }

        match evt.event_name()? {
            "start-file" => {
                self.time_pos = 0.0;
                self.playing = false;
                Some(SinkEvent::LoadStart)
            }
            "end-file" => {
                self.playing = false;
                let reason = evt.raw.get("reason").and_then(Value::as_str).unwrap_or("");
                match reason {
                    "eof" => Some(SinkEvent::Ended),
                    "error" | "network" => {
                        let detail = evt
                            .raw
                            .get("file_error")
                            .and_then(Value::as_str)
                            .unwrap_or(reason);
                        Some(SinkEvent::Error(detail.to_string()))
                    }
                    // "stop", "quit", "redirect": replaced or shut down on purpose
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

// ── handle ────────────────────────────────────────────────────────────────────

/// Cloneable handle to the writer task.  `send()` fires a command and
/// awaits mpv's reply.
#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<PendingRequest>,
}

impl MpvHandle {
    pub async fn send(&self, command: Value) -> Result<Value, SinkError> {
        let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
        let msg = json!({ "command": command, "request_id": req_id });
        let mut raw = serde_json::to_string(&msg).map_err(|e| SinkError::Ipc(e.to_string()))?;
        raw.push('\n');

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PendingRequest {
                req_id,
                payload: raw,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SinkError::Ipc("mpv writer task gone".into()))?;

        tokio::time::timeout(REPLY_TIMEOUT, reply_rx)
            .await
            .map_err(|_| SinkError::Ipc(format!("mpv IPC timeout for req={}", req_id)))?
            .map_err(|_| SinkError::Ipc(format!("mpv reply channel dropped req={}", req_id)))?
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Register the property observers the translator relies on.  Needed
    /// after every fresh connection.
    pub async fn observe_properties(&self) {
        let props = [
            (OBS_CORE_IDLE, "core-idle"),
            (OBS_PAUSE, "pause"),
            (OBS_PAUSED_FOR_CACHE, "paused-for-cache"),
            (OBS_TIME_POS, "time-pos"),
        ];
        for (id, name) in &props {
            match self.send(json!(["observe_property", id, name])).await {
                Ok(_) => debug!("mpv: observe_property id={} name={}", id, name),
                Err(e) => warn!("mpv: observe_property {} failed: {}", name, e),
            }
        }
    }
}

/// Wire up reader and writer tasks on an established connection.
pub fn start_io_tasks<S>(stream: S, events: broadcast::Sender<SinkEvent>) -> MpvHandle
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
    let (cmd_tx, cmd_rx) = mpsc::channel::<PendingRequest>(64);

    tokio::spawn(writer_task(write_half, cmd_rx, pending.clone()));
    tokio::spawn(reader_task(BufReader::new(read_half), pending, events));

    MpvHandle { tx: cmd_tx }
}

async fn fail_all(pending: &PendingMap, reason: &str) {
    let mut map = pending.lock().await;
    for (_, tx) in map.drain() {
        let _ = tx.send(Err(SinkError::Ipc(reason.to_string())));
    }
}

async fn reader_task<R>(mut reader: BufReader<R>, pending: PendingMap, events: broadcast::Sender<SinkEvent>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut translator = EventTranslator::default();
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("mpv reader: connection closed");
                fail_all(&pending, "mpv IPC connection closed").await;
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let val: Value = match serde_json::from_str(trimmed) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!("mpv reader: invalid json '{}': {}", trimmed, e);
                        continue;
                    }
                };

                if let Some(req_id) = val.get("request_id").and_then(Value::as_u64) {
                    let mut map = pending.lock().await;
                    if let Some(tx) = map.remove(&req_id) {
                        let result = if val["error"].as_str() == Some("success") {
                            Ok(val)
                        } else {
                            let err = val["error"].as_str().unwrap_or("unknown error");
                            debug!("mpv reader: response req={} err={}", req_id, err);
                            Err(SinkError::Ipc(format!("mpv error: {}", err)))
                        };
                        let _ = tx.send(result);
                    } else {
                        debug!("mpv reader: response for unknown req={}", req_id);
                    }
                } else {
                    debug!("mpv reader: event {}", trimmed);
                    if let Some(evt) = translator.translate(&MpvEvent { raw: val }) {
                        // no subscribers is fine
                        let _ = events.send(evt);
                    }
                }
            }
            Err(e) => {
                warn!("mpv reader: read error: {}", e);
                fail_all(&pending, &format!("mpv IPC read error: {}", e)).await;
                break;
            }
        }
    }
}

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<PendingRequest>, pending: PendingMap)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        // register before writing so the reader can match the reply
        pending.lock().await.insert(req.req_id, req.reply);
        debug!("mpv writer: send req={} payload={}", req.req_id, req.payload.trim());
        if let Err(e) = writer.write_all(req.payload.as_bytes()).await {
            warn!("mpv writer: write error: {}", e);
            if let Some(tx) = pending.lock().await.remove(&req.req_id) {
                let _ = tx.send(Err(SinkError::Ipc(format!("mpv write error: {}", e))));
            }
            break;
        }
    }
    debug!("mpv writer: task exiting");
}

// ── sink ──────────────────────────────────────────────────────────────────────

struct Connection {
    handle: MpvHandle,
    /// Spawned with kill_on_drop, so dropping the connection ends mpv.
    process: Option<tokio::process::Child>,
}

pub struct MpvSink {
    socket_name: String,
    connect_timeout: Duration,
    volume: AtomicU8,
    events: broadcast::Sender<SinkEvent>,
    conn: Mutex<Option<Connection>>,
}

impl MpvSink {
    pub fn new(connect_timeout: Duration, volume: u8) -> Self {
        Self {
            socket_name: tune_proto::platform::mpv_socket_name(),
            connect_timeout,
            volume: AtomicU8::new(volume.min(100)),
            events: broadcast::channel(64).0,
            conn: Mutex::new(None),
        }
    }

    /// Live handle, spawning mpv when there is none or the old one died.
    async fn connection(&self) -> Result<MpvHandle, SinkError> {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_mut() {
            let alive = match conn.process.as_mut() {
                Some(child) => matches!(child.try_wait(), Ok(None)),
                None => true,
            };
            if alive && !conn.handle.is_closed() {
                return Ok(conn.handle.clone());
            }
            warn!("mpv: process gone, respawning");
        }
        *guard = None;
        let conn = self.spawn_and_connect().await?;
        let handle = conn.handle.clone();
        *guard = Some(conn);
        Ok(handle)
    }

    /// Handle only if mpv is already running.
    async fn existing(&self) -> Option<MpvHandle> {
        self.conn.lock().await.as_ref().map(|c| c.handle.clone())
    }

    #[cfg(unix)]
    async fn spawn_and_connect(&self) -> Result<Connection, SinkError> {
        use tokio::net::UnixStream;

        let socket_path = std::path::PathBuf::from(&self.socket_name);
        let _ = tokio::fs::remove_file(&socket_path).await;

        let mpv_binary = tune_proto::platform::find_mpv_binary()
            .ok_or_else(|| SinkError::Unavailable("mpv binary not found".into()))?;

        let data_dir = tune_proto::platform::data_dir();
        let stderr = std::fs::create_dir_all(&data_dir)
            .and_then(|_| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(data_dir.join("mpv-stderr.log"))
            })
            .map(std::process::Stdio::from)
            .unwrap_or_else(|_| std::process::Stdio::null());

        info!("mpv: spawning {}", mpv_binary.display());
        let child = tokio::process::Command::new(&mpv_binary)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg(tune_proto::platform::mpv_socket_arg(&self.socket_name))
            .arg("--quiet")
            .arg(format!("--volume={}", self.volume.load(Ordering::Relaxed)))
            .stdout(std::process::Stdio::null())
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SinkError::Unavailable(format!("failed to start mpv: {}", e)))?;
        info!("mpv: spawned process with pid {:?}", child.id());

        for _ in 0..50 {
            if socket_path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        if !socket_path.exists() {
            return Err(SinkError::Unavailable("mpv IPC socket did not appear".into()));
        }

        let stream = UnixStream::connect(&socket_path)
            .await
            .map_err(|e| SinkError::Ipc(format!("connect {}: {}", socket_path.display(), e)))?;
        info!("mpv: connected to IPC socket");

        let handle = start_io_tasks(stream, self.events.clone());
        handle.observe_properties().await;
        Ok(Connection {
            handle,
            process: Some(child),
        })
    }

    #[cfg(not(unix))]
    async fn spawn_and_connect(&self) -> Result<Connection, SinkError> {
        Err(SinkError::Unavailable(
            "mpv IPC is only supported over Unix sockets".into(),
        ))
    }

    /// Attach to an already running mpv over `stream` instead of spawning.
    pub async fn attach<S>(&self, stream: S)
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + 'static,
    {
        let handle = start_io_tasks(stream, self.events.clone());
        handle.observe_properties().await;
        *self.conn.lock().await = Some(Connection {
            handle,
            process: None,
        });
    }

    /// Quit mpv and drop the connection.
    pub async fn shutdown(&self) {
        if let Some(conn) = self.conn.lock().await.take() {
            let _ = conn.handle.send(json!(["quit"])).await;
            if let Some(mut child) = conn.process {
                let _ = child.kill().await;
            }
        }
        #[cfg(unix)]
        let _ = tokio::fs::remove_file(&self.socket_name).await;
    }

    async fn wait_for_audio(&self, mut rx: broadcast::Receiver<SinkEvent>) -> Result<(), SinkError> {
        let mut loading = false;
        loop {
            match rx.recv().await {
                Ok(SinkEvent::LoadStart) => loading = true,
                Ok(SinkEvent::Playing) if loading => return Ok(()),
                Ok(SinkEvent::Error(reason)) if loading => return Err(SinkError::ConnectFailed(reason)),
                Ok(SinkEvent::Ended) if loading => {
                    return Err(SinkError::ConnectFailed("stream ended before playback".into()))
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => debug!("mpv: start skipped {} events", n),
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(SinkError::Ipc("mpv event channel closed".into()))
                }
            }
        }
    }
}

#[async_trait]
impl AudioSink for MpvSink {
    async fn start(&self, url: &str) -> Result<(), SinkError> {
        let handle = self.connection().await?;
        let rx = self.events.subscribe();
        debug!("mpv: loadfile {}", url);
        handle.send(json!(["loadfile", url])).await?;
        if let Err(e) = handle.send(json!(["set_property", "pause", false])).await {
            warn!("mpv: failed to clear pause: {}", e);
        }

        let outcome = match tokio::time::timeout(self.connect_timeout, self.wait_for_audio(rx)).await {
            Ok(result) => result,
            Err(_) => Err(SinkError::ConnectFailed(format!(
                "no audio after {:?}",
                self.connect_timeout
            ))),
        };
        if outcome.is_err() {
            // a failed attempt must not go on loading in the background
            if let Err(e) = handle.send(json!(["stop"])).await {
                warn!("mpv: failed to stop after failed start: {}", e);
            }
        }
        outcome
    }

    /// Only talks to a running mpv; pausing never spawns a fresh, empty player.
    async fn set_paused(&self, paused: bool) -> Result<(), SinkError> {
        let handle = self
            .existing()
            .await
            .ok_or_else(|| SinkError::Unavailable("mpv is not running".into()))?;
        handle.send(json!(["set_property", "pause", paused])).await?;
        Ok(())
    }

    async fn set_volume(&self, percent: u8) -> Result<(), SinkError> {
        let percent = percent.min(100);
        self.volume.store(percent, Ordering::Relaxed);
        // applied at spawn time when mpv is not running yet
        if let Some(handle) = self.existing().await {
            handle.send(json!(["set_property", "volume", percent])).await?;
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), SinkError> {
        if let Some(handle) = self.existing().await {
            handle.send(json!(["stop"])).await?;
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SinkEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evt(raw: Value) -> MpvEvent {
        MpvEvent { raw }
    }

    fn prop(id: u64, data: Value) -> MpvEvent {
        evt(json!({ "event": "property-change", "id": id, "data": data }))
    }

    #[test]
    fn test_translate_lifecycle() {
        let mut t = EventTranslator::default();
        assert_eq!(t.translate(&evt(json!({"event":"start-file"}))), Some(SinkEvent::LoadStart));
        assert_eq!(t.translate(&prop(OBS_PAUSED_FOR_CACHE, json!(true))), Some(SinkEvent::Waiting));
        assert_eq!(t.translate(&prop(OBS_PAUSED_FOR_CACHE, json!(false))), None);
        assert_eq!(t.translate(&prop(OBS_CORE_IDLE, json!(false))), Some(SinkEvent::Playing));
        assert_eq!(t.translate(&prop(OBS_TIME_POS, json!(12.5))), None);
        assert_eq!(
            t.translate(&prop(OBS_PAUSE, json!(true))),
            Some(SinkEvent::Pause { position: 12.5 })
        );
        // idle because paused, not stalled
        assert_eq!(t.translate(&prop(OBS_CORE_IDLE, json!(true))), None);
        assert_eq!(t.translate(&prop(OBS_PAUSE, json!(false))), None);
        assert_eq!(t.translate(&prop(OBS_CORE_IDLE, json!(false))), Some(SinkEvent::Playing));
        assert_eq!(t.translate(&prop(OBS_CORE_IDLE, json!(true))), Some(SinkEvent::Stalled));
    }

    #[test]
    fn test_translate_end_file() {
        let mut t = EventTranslator::default();
        assert_eq!(
            t.translate(&evt(json!({"event":"end-file","reason":"eof"}))),
            Some(SinkEvent::Ended)
        );
        assert_eq!(
            t.translate(&evt(json!({"event":"end-file","reason":"error","file_error":"loading failed"}))),
            Some(SinkEvent::Error("loading failed".into()))
        );
        assert_eq!(
            t.translate(&evt(json!({"event":"end-file","reason":"network"}))),
            Some(SinkEvent::Error("network".into()))
        );
        assert_eq!(t.translate(&evt(json!({"event":"end-file","reason":"stop"}))), None);
        assert_eq!(t.translate(&evt(json!({"event":"file-loaded"}))), None);
    }

    /// Minimal mpv stand-in on the far end of a socket pair: acknowledges
    /// every command, records its name and plays `script` once it sees a
    /// loadfile.  A `{"delay_ms": n}` entry pauses the script.
    #[cfg(unix)]
    fn fake_mpv(stream: tokio::net::UnixStream, script: Vec<Value>) -> Arc<std::sync::Mutex<Vec<String>>> {
        let commands = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = commands.clone();
        tokio::spawn(async move {
            let (read_half, write_half) = stream.into_split();
            let write_half = Arc::new(Mutex::new(write_half));
            let mut lines = BufReader::new(read_half).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let req: Value = serde_json::from_str(&line).unwrap();
                let name = req["command"][0].as_str().unwrap_or_default().to_string();
                seen.lock().unwrap().push(name.clone());
                let reply = json!({ "request_id": req["request_id"], "error": "success", "data": null });
                write_half
                    .lock()
                    .await
                    .write_all(format!("{}\n", reply).as_bytes())
                    .await
                    .unwrap();
                if name == "loadfile" {
                    let script = script.clone();
                    let writer = write_half.clone();
                    tokio::spawn(async move {
                        for event in script {
                            if let Some(ms) = event.get("delay_ms").and_then(Value::as_u64) {
                                tokio::time::sleep(Duration::from_millis(ms)).await;
                                continue;
                            }
                            let _ = writer.lock().await.write_all(format!("{}\n", event).as_bytes()).await;
                        }
                    });
                }
            }
        });
        commands
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_resolves_on_playback() {
        let (ours, theirs) = tokio::net::UnixStream::pair().unwrap();
        fake_mpv(
            theirs,
            vec![
                json!({"event":"end-file","reason":"stop"}),
                json!({"event":"start-file"}),
                json!({"event":"property-change","id":OBS_CORE_IDLE,"data":false}),
            ],
        );
        let sink = MpvSink::new(Duration::from_secs(2), 50);
        sink.attach(ours).await;
        let mut events = sink.subscribe();

        sink.start("http://radio.example/stream").await.unwrap();
        assert_eq!(events.recv().await.unwrap(), SinkEvent::LoadStart);
        assert_eq!(events.recv().await.unwrap(), SinkEvent::Playing);
        sink.set_volume(30).await.unwrap();
        sink.stop().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_fails_on_error_end_file() {
        let (ours, theirs) = tokio::net::UnixStream::pair().unwrap();
        fake_mpv(
            theirs,
            vec![
                json!({"event":"start-file"}),
                json!({"event":"end-file","reason":"error","file_error":"unrecognized file format"}),
            ],
        );
        let sink = MpvSink::new(Duration::from_secs(2), 50);
        sink.attach(ours).await;

        let err = sink.start("http://bad.example/").await.unwrap_err();
        assert_eq!(err, SinkError::ConnectFailed("unrecognized file format".into()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_times_out_without_audio() {
        let (ours, theirs) = tokio::net::UnixStream::pair().unwrap();
        fake_mpv(theirs, vec![json!({"event":"start-file"})]);
        let sink = MpvSink::new(Duration::from_millis(200), 50);
        sink.attach(ours).await;

        let err = sink.start("http://silent.example/").await.unwrap_err();
        assert_eq!(err, SinkError::ConnectFailed("no audio after 200ms".into()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timed_out_start_stops_the_stream() {
        let (ours, theirs) = tokio::net::UnixStream::pair().unwrap();
        let commands = fake_mpv(
            theirs,
            vec![
                json!({"event":"start-file"}),
                json!({"delay_ms": 300}),
                json!({"event":"property-change","id":OBS_CORE_IDLE,"data":false}),
            ],
        );
        let sink = MpvSink::new(Duration::from_millis(100), 50);
        sink.attach(ours).await;

        assert!(sink.start("http://slow.example/").await.is_err());
        let sent = commands.lock().unwrap().clone();
        let load = sent.iter().position(|c| c == "loadfile").unwrap();
        assert_eq!(sent.last().map(String::as_str), Some("stop"));
        assert!(sent.len() > load + 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_start_stops_the_stream() {
        let (ours, theirs) = tokio::net::UnixStream::pair().unwrap();
        let commands = fake_mpv(
            theirs,
            vec![
                json!({"event":"start-file"}),
                json!({"event":"end-file","reason":"network"}),
            ],
        );
        let sink = MpvSink::new(Duration::from_secs(2), 50);
        sink.attach(ours).await;

        assert!(sink.start("http://gone.example/").await.is_err());
        assert!(commands.lock().unwrap().iter().any(|c| c == "stop"));
    }

    #[tokio::test]
    async fn test_pause_without_running_mpv_is_unavailable() {
        let sink = MpvSink::new(Duration::from_secs(1), 50);
        let err = sink.set_paused(true).await.unwrap_err();
        assert!(matches!(err, SinkError::Unavailable(_)));
        assert!(sink.existing().await.is_none());
    }
}
