//! TunerCore: single-owner event loop for all mutable player state.
//!
//! The presentation adapter sends `Intent`s wrapped in `CoreEvent::Intent`;
//! every slow operation (directory fetches, stream connects, the search
//! debounce) runs in a spawned task that reports back with another
//! `CoreEvent`.  Nothing else touches the list, the favorites or the
//! playback controller.
//!
//! After each change the core broadcasts an `Update` describing what the
//! adapter should render.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use tune_proto::config::Config;
use tune_proto::protocol::{Intent, PlaybackStatus, SourceKind, Station, Update};
use tune_proto::state::SharedStore;

use crate::directory::DirectoryClient;
use crate::error::{DirectoryError, SinkError};
use crate::favorites::FavoritesStore;
use crate::playback::{AttemptId, AudioSink, PlaybackController, SinkEvent, STREAM_FAILED_NOTICE};
use crate::random::{RandomPick, RandomPicker, FAVORITES_CATEGORY};
use crate::search::{SearchGate, SearchInput, SearchTicket};
use crate::station_list::StationListModel;

pub const DIRECTORY_UNREACHABLE_NOTICE: &str = "Station directory unreachable";

// ── CoreEvent ─────────────────────────────────────────────────────────────────

/// All inputs into the TunerCore loop.
#[derive(Debug)]
pub enum CoreEvent {
    /// A user intent from the adapter.
    Intent(Intent),
    /// The debounce delay for `ticket` elapsed.
    SearchSettled(SearchTicket),
    SearchResults {
        ticket: SearchTicket,
        result: Result<Vec<Station>, DirectoryError>,
    },
    /// A category fetch finished; `generation` is the view it was made for.
    CategoryLoaded {
        generation: u64,
        category: String,
        result: Result<Vec<Station>, DirectoryError>,
    },
    AttemptResolved {
        id: AttemptId,
        result: Result<(), SinkError>,
    },
    /// Progress forwarded from the audio sink.
    Sink(SinkEvent),
    RandomPicked {
        seq: u64,
        pick: Option<RandomPick>,
    },
    Shutdown,
}

// ── TunerCore ─────────────────────────────────────────────────────────────────

pub struct TunerCore {
    directory: Arc<DirectoryClient>,
    picker: RandomPicker,
    favorites: FavoritesStore,
    list: StationListModel,
    playback: PlaybackController,
    search: SearchGate,
    debounce: Duration,
    /// What the list area shows; `None` is the category grid.
    showing: Option<SourceKind>,
    /// Bumped on every navigation so late directory results can be dropped.
    view_generation: u64,
    random_seq: u64,
    search_task: Option<AbortHandle>,
    event_tx: mpsc::Sender<CoreEvent>,
    update_tx: broadcast::Sender<Update>,
}

impl TunerCore {
    pub fn new(
        config: &Config,
        directory: Arc<DirectoryClient>,
        sink: Arc<dyn AudioSink>,
        store: SharedStore,
        update_tx: broadcast::Sender<Update>,
        event_tx: mpsc::Sender<CoreEvent>,
    ) -> Self {
        let favorites = FavoritesStore::load(store.clone());
        let playback = PlaybackController::new(
            sink,
            store,
            event_tx.clone(),
            config.playback.default_volume,
        );
        Self {
            directory,
            picker: RandomPicker::new(&config.random),
            favorites,
            list: StationListModel::new(),
            playback,
            search: SearchGate::new(&config.search),
            debounce: Duration::from_millis(config.search.debounce_ms),
            showing: None,
            view_generation: 0,
            random_seq: 0,
            search_task: None,
            event_tx,
            update_tx,
        }
    }

    /// Run the core event loop.  Returns on `Shutdown` or when every
    /// sender is gone.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<CoreEvent>) {
        info!("TunerCore: starting event loop");

        let mut sink_rx = self.playback.subscribe_sink();
        let sink_tx = self.event_tx.clone();
        let forwarder = tokio::spawn(async move {
            loop {
                match sink_rx.recv().await {
                    Ok(evt) => {
                        if sink_tx.send(CoreEvent::Sink(evt)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!("TunerCore: dropped {} sink events", n)
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        if let Err(e) = self.playback.sync_volume().await {
            debug!("TunerCore: initial volume not applied: {}", e);
        }
        self.emit(Update::Volume {
            percent: self.playback.volume(),
        });
        self.emit(Update::CategoriesView);
        self.emit_playback();

        while let Some(evt) = event_rx.recv().await {
            match evt {
                CoreEvent::Shutdown => {
                    info!("TunerCore: shutdown requested");
                    break;
                }
                CoreEvent::Intent(intent) => {
                    debug!("TunerCore: intent {:?}", intent);
                    self.handle_intent(intent).await;
                }
                CoreEvent::SearchSettled(ticket) => self.on_search_settled(ticket),
                CoreEvent::SearchResults { ticket, result } => self.on_search_results(ticket, result),
                CoreEvent::CategoryLoaded {
                    generation,
                    category,
                    result,
                } => self.on_category_loaded(generation, category, result),
                CoreEvent::AttemptResolved { id, result } => {
                    let notice = self.playback.on_attempt_resolved(id, result);
                    self.after_playback_change(notice);
                }
                CoreEvent::Sink(evt) => {
                    let notice = self.playback.on_sink_event(evt);
                    self.after_playback_change(notice);
                }
                CoreEvent::RandomPicked { seq, pick } => self.on_random_picked(seq, pick),
            }
        }

        forwarder.abort();
        if let Some(task) = self.search_task.take() {
            task.abort();
        }
        if let Err(e) = self.playback.stop().await {
            warn!("TunerCore: stop on shutdown failed: {}", e);
        }
        info!("TunerCore: event loop finished");
    }

    // ── intents ───────────────────────────────────────────────────────────────

    async fn handle_intent(&mut self, intent: Intent) {
        match intent {
            Intent::SelectCategory { category } => self.select_category(category),
            Intent::SearchChanged { text } => self.on_search_input(&text),
            Intent::ActivateStation { index } => match self.list.get(index).cloned() {
                Some(station) => {
                    self.list.select(index as i64);
                    self.play(station);
                }
                None => self.notify("Station not found"),
            },
            Intent::ToggleFavorite { index } => self.toggle_favorite(index),
            Intent::PlayPause => self.play_pause().await,
            Intent::Next | Intent::Previous => {
                // no history: both directions are a fresh random pick
                if self.playback.has_source() {
                    self.request_random();
                }
            }
            Intent::Back => {
                self.cancel_search();
                self.show_grid();
            }
            Intent::Stop => {
                if let Err(e) = self.playback.stop().await {
                    warn!("TunerCore: stop failed: {}", e);
                }
                self.list.clear_selection();
                self.render_list();
                self.emit_playback();
            }
            Intent::Volume { percent } => {
                if let Err(e) = self.playback.set_volume(percent).await {
                    warn!("TunerCore: volume not applied: {}", e);
                }
                self.emit(Update::Volume {
                    percent: self.playback.volume(),
                });
            }
        }
    }

    fn select_category(&mut self, category: String) {
        self.cancel_search();
        self.view_generation += 1;
        if category.eq_ignore_ascii_case(FAVORITES_CATEGORY) {
            self.show_favorites();
            return;
        }

        info!("TunerCore: loading category '{}'", category);
        self.emit(Update::Loading {
            message: "Loading stations...".to_string(),
        });
        let generation = self.view_generation;
        let directory = Arc::clone(&self.directory);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = directory.try_list_by_category(&category).await;
            let _ = tx
                .send(CoreEvent::CategoryLoaded {
                    generation,
                    category,
                    result,
                })
                .await;
        });
    }

    fn on_category_loaded(
        &mut self,
        generation: u64,
        category: String,
        result: Result<Vec<Station>, DirectoryError>,
    ) {
        if generation != self.view_generation {
            debug!("TunerCore: dropping stale result for '{}'", category);
            return;
        }
        let stations = self.unwrap_listing(result);
        self.list.set_category(stations, &category);
        self.showing = Some(SourceKind::Category);
        self.highlight_current();
        self.render_list();
    }

    /// Exhaustion shows up as an empty list plus a notice.
    fn unwrap_listing(&self, result: Result<Vec<Station>, DirectoryError>) -> Vec<Station> {
        match result {
            Ok(stations) => stations,
            Err(e) => {
                warn!("TunerCore: directory failed: {}", e);
                self.notify(DIRECTORY_UNREACHABLE_NOTICE);
                Vec::new()
            }
        }
    }

    fn show_favorites(&mut self) {
        self.list
            .set_stations(self.favorites.list().to_vec(), SourceKind::Favorites);
        self.showing = Some(SourceKind::Favorites);
        self.highlight_current();
        self.render_list();
    }

    fn show_grid(&mut self) {
        self.view_generation += 1;
        self.showing = None;
        self.emit(Update::CategoriesView);
    }

    fn toggle_favorite(&mut self, index: usize) {
        let Some(station) = self.list.get(index).cloned() else {
            return;
        };
        if let Err(e) = self.favorites.toggle(&station) {
            warn!("TunerCore: favorites not saved: {}", e);
        }
        if self.list.source() == SourceKind::Favorites {
            self.show_favorites();
        } else {
            self.render_list();
        }
    }

    // ── search ────────────────────────────────────────────────────────────────

    fn on_search_input(&mut self, text: &str) {
        match self.search.on_input(text, self.showing) {
            SearchInput::Filter(term) => {
                self.list.filter_in_place(&term);
                self.render_list();
            }
            SearchInput::TooShort { leave_results } => {
                self.abort_search_task();
                if leave_results {
                    self.show_grid();
                }
            }
            SearchInput::Schedule(ticket) => {
                self.abort_search_task();
                let delay = self.debounce;
                let tx = self.event_tx.clone();
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(CoreEvent::SearchSettled(ticket)).await;
                });
                self.search_task = Some(handle.abort_handle());
            }
        }
    }

    fn on_search_settled(&mut self, ticket: SearchTicket) {
        if !self.search.is_current(&ticket) {
            return;
        }
        info!("TunerCore: searching '{}'", ticket.term());
        self.emit(Update::Loading {
            message: "Searching...".to_string(),
        });
        let directory = Arc::clone(&self.directory);
        let tx = self.event_tx.clone();
        let handle = tokio::spawn(async move {
            let result = directory.try_search(ticket.term()).await;
            let _ = tx.send(CoreEvent::SearchResults { ticket, result }).await;
        });
        self.search_task = Some(handle.abort_handle());
    }

    fn on_search_results(&mut self, ticket: SearchTicket, result: Result<Vec<Station>, DirectoryError>) {
        if !self.search.is_current(&ticket) {
            debug!("TunerCore: dropping stale results for '{}'", ticket.term());
            return;
        }
        self.search_task = None;
        let stations = self.unwrap_listing(result);
        self.view_generation += 1;
        self.list.set_stations(stations, SourceKind::Search);
        self.showing = Some(SourceKind::Search);
        self.highlight_current();
        self.render_list();
    }

    fn cancel_search(&mut self) {
        self.search.cancel();
        self.abort_search_task();
    }

    fn abort_search_task(&mut self) {
        if let Some(task) = self.search_task.take() {
            task.abort();
        }
    }

    // ── playback ──────────────────────────────────────────────────────────────

    fn play(&mut self, station: Station) {
        self.playback.play(station);
        self.render_list();
        self.emit_playback();
    }

    async fn play_pause(&mut self) {
        let status = self.playback.status();
        if !self.playback.has_source()
            || matches!(
                status,
                PlaybackStatus::Idle | PlaybackStatus::Error | PlaybackStatus::Ended
            )
        {
            self.request_random();
            return;
        }
        if status == PlaybackStatus::Connecting {
            return;
        }
        match self.playback.toggle_pause().await {
            Ok(_) => self.emit_playback(),
            Err(e) => {
                warn!("TunerCore: pause toggle failed: {}", e);
                self.after_playback_change(Some(STREAM_FAILED_NOTICE));
            }
        }
    }

    fn request_random(&mut self) {
        self.random_seq += 1;
        let seq = self.random_seq;
        let picker = self.picker.clone();
        let favorites = self.favorites.list().to_vec();
        let directory = Arc::clone(&self.directory);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let pick = picker.pick(&favorites, &directory).await;
            let _ = tx.send(CoreEvent::RandomPicked { seq, pick }).await;
        });
    }

    /// Show the list the pick came from, then play it.
    fn on_random_picked(&mut self, seq: u64, pick: Option<RandomPick>) {
        if seq != self.random_seq {
            return;
        }
        let Some(pick) = pick else {
            info!("TunerCore: random pick found nothing");
            return;
        };
        let station = pick.station().clone();
        let index = pick.index();
        self.cancel_search();
        self.view_generation += 1;
        match pick {
            RandomPick::Favorite { .. } => {
                self.list
                    .set_stations(self.favorites.list().to_vec(), SourceKind::Favorites);
                self.showing = Some(SourceKind::Favorites);
            }
            RandomPick::Category {
                category, stations, ..
            } => {
                self.list.set_category(stations, &category);
                self.showing = Some(SourceKind::Category);
            }
        }
        // favorites may have changed while the pick was running
        let index = match self.list.get(index) {
            Some(shown) if shown.same_identity(&station.name, &station.url) => Some(index),
            _ => self.list.position_of(&station.name, &station.url),
        };
        if let Some(index) = index {
            self.list.select(index as i64);
        }
        self.play(station);
    }

    fn after_playback_change(&mut self, notice: Option<&str>) {
        if let Some(message) = notice {
            self.notify(message);
        }
        if self.playback.current().is_none() && self.list.selected_index().is_some() {
            self.list.clear_selection();
            self.render_list();
        }
        self.emit_playback();
    }

    /// Re-select the playing station after the list was replaced.
    fn highlight_current(&mut self) {
        let Some(current) = self.playback.current() else {
            return;
        };
        if let Some(index) = self.list.position_of(&current.name, &current.url) {
            self.list.select(index as i64);
        }
    }

    // ── updates ───────────────────────────────────────────────────────────────

    fn emit(&self, update: Update) {
        // no adapter attached is fine
        let _ = self.update_tx.send(update);
    }

    fn notify(&self, message: &str) {
        self.emit(Update::Notification {
            message: message.to_string(),
        });
    }

    fn render_list(&self) {
        if self.showing.is_none() {
            return;
        }
        let favorites = &self.favorites;
        self.emit(Update::StationList {
            source: self.list.source(),
            category: self.list.category().map(str::to_string),
            rows: self.list.rows(|s| favorites.contains(&s.name, &s.url)),
        });
    }

    fn emit_playback(&self) {
        let current_index = match (self.playback.current(), self.list.selected_station()) {
            (Some(current), Some(selected)) if selected.same_identity(&current.name, &current.url) => {
                self.list.selected_index()
            }
            _ => None,
        };
        self.emit(Update::Playback {
            status: self.playback.status(),
            status_text: self.playback.status_text().to_string(),
            now_playing: self.playback.now_playing().cloned(),
            current_index,
        });
    }
}
