//! Station acquisition and playback coordination for TuneTracker.
//!
//! `TunerCore` owns every piece of mutable state and is driven by
//! `CoreEvent`s; the other modules are the pieces it coordinates.

pub mod core;
pub mod directory;
pub mod error;
pub mod favorites;
pub mod mpv;
pub mod playback;
pub mod random;
pub mod search;
pub mod station_list;

pub use crate::core::{CoreEvent, TunerCore};
pub use directory::{DirectoryClient, DirectoryTransport, ReqwestTransport};
pub use error::{DirectoryError, SinkError};
pub use favorites::FavoritesStore;
pub use playback::{AudioSink, PlaybackController, SinkEvent};
pub use random::{RandomPick, RandomPicker};
pub use search::{SearchGate, SearchInput, SearchTicket};
pub use station_list::StationListModel;
