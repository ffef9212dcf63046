use serde::{Deserialize, Serialize};

/// Bundled logo shown when a station has no usable favicon.
pub const DEFAULT_ARTWORK: &str = "tunetracker.svg";

/// Separator between the parts of a station meta line.
pub const META_SEPARATOR: &str = " • ";

/// Messages sent from the presentation adapter into the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent")]
pub enum Intent {
    SelectCategory { category: String },
    SearchChanged { text: String },
    ActivateStation { index: usize },
    ToggleFavorite { index: usize },
    PlayPause,
    Next,
    Previous,
    Back,
    Stop,
    Volume { percent: u8 },
}

/// Render instructions sent from the core to the presentation adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "update")]
pub enum Update {
    /// The station list changed (new contents, filter, hearts or highlight).
    StationList {
        source: SourceKind,
        category: Option<String>,
        rows: Vec<StationRow>,
    },
    /// A list is being fetched; show a placeholder row.
    Loading { message: String },
    /// Back to the category grid.
    CategoriesView,
    Playback {
        status: PlaybackStatus,
        status_text: String,
        now_playing: Option<NowPlaying>,
        current_index: Option<usize>,
    },
    /// Transient user notification.
    Notification { message: String },
    Volume { percent: u8 },
}

/// Where the displayed station list came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Category,
    Search,
    Favorites,
}

/// Playback state machine driven by the playback controller.
///
/// Transitions:
///   Idle -> Connecting -> Playing <-> Paused
///   Connecting | Playing -> Error | Ended
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle, // nothing loaded / explicitly stopped
    Connecting, // source assigned, waiting for audio
    Playing,
    Paused,
    Error, // failed to start or failed while playing
    Ended, // stream reached its end
}

impl PlaybackStatus {
    /// True while a station is considered current.
    pub fn has_current(self) -> bool {
        matches!(self, Self::Connecting | Self::Playing | Self::Paused)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Station {
    pub name: String,
    pub url: String,
    /// Stream bitrate in kbps, when the directory knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    #[serde(default)]
    pub codec: String,
    /// Directory votes; only used for ranking.
    #[serde(default)]
    pub votes: i64,
    #[serde(default)]
    pub favicon: String,
    /// Comma-separated tag list as returned by the directory.
    #[serde(default)]
    pub tags: String,
}

impl Station {
    /// Minimal record used when nothing richer than the identity is known.
    pub fn minimal(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn same_identity(&self, name: &str, url: &str) -> bool {
        self.name == name && self.url == url
    }

    /// First two trimmed, non-empty tags.
    pub fn display_tags(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .take(2)
            .map(str::to_string)
            .collect()
    }

    pub fn bitrate_label(&self) -> Option<String> {
        self.bitrate
            .filter(|&b| b > 0)
            .map(|b| format!("{} kbps", b))
    }

    /// "MP3 • 128 kbps • jazz, smooth", each part only when present.
    pub fn meta_line(&self) -> String {
        let mut parts = Vec::new();
        if !self.codec.is_empty() {
            parts.push(self.codec.to_uppercase());
        }
        if let Some(label) = self.bitrate_label() {
            parts.push(label);
        }
        let tags = self.display_tags();
        if !tags.is_empty() {
            parts.push(tags.join(", "));
        }
        parts.join(META_SEPARATOR)
    }
}

/// Artwork source for the now-playing panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Artwork {
    Remote(String),
    Default,
}

impl Artwork {
    /// Accept absolute http(s), protocol-relative and data URLs; protocol-relative
    /// URLs are pinned to https.  Anything else falls back to the bundled logo.
    pub fn resolve(favicon: &str) -> Self {
        let trimmed = favicon.trim();
        if trimmed.is_empty() {
            return Self::Default;
        }
        let resolved = match trimmed.strip_prefix("//") {
            Some(rest) => format!("https://{}", rest),
            None => trimmed.to_string(),
        };
        if resolved.starts_with("http") || resolved.starts_with("data:") {
            Self::Remote(resolved)
        } else {
            Self::Default
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Self::Remote(url) => url,
            Self::Default => DEFAULT_ARTWORK,
        }
    }
}

/// Display summary of the station that is currently playing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NowPlaying {
    pub name: String,
    pub codec: String,
    pub bitrate_label: Option<String>,
    pub tags: Vec<String>,
    pub artwork: Artwork,
}

impl NowPlaying {
    pub fn from_station(station: &Station) -> Self {
        Self {
            name: station.name.clone(),
            codec: station.codec.to_uppercase(),
            bitrate_label: station.bitrate_label(),
            tags: station.display_tags(),
            artwork: Artwork::resolve(&station.favicon),
        }
    }

    pub fn meta_line(&self) -> String {
        let mut parts = Vec::new();
        if !self.codec.is_empty() {
            parts.push(self.codec.clone());
        }
        if let Some(label) = &self.bitrate_label {
            parts.push(label.clone());
        }
        if !self.tags.is_empty() {
            parts.push(self.tags.join(", "));
        }
        parts.join(META_SEPARATOR)
    }
}

/// One rendered row of the station list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StationRow {
    pub index: usize,
    pub name: String,
    pub meta: String,
    pub is_favorite: bool,
    pub is_playing: bool,
    /// False when hidden by the in-place category filter.
    pub visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station() -> Station {
        Station {
            name: "Jazz FM".into(),
            url: "http://jazz.example/stream".into(),
            bitrate: Some(128),
            codec: "mp3".into(),
            votes: 10,
            favicon: String::new(),
            tags: " jazz , smooth jazz,,bebop ".into(),
        }
    }

    #[test]
    fn test_meta_line() {
        assert_eq!(station().meta_line(), "MP3 • 128 kbps • jazz, smooth jazz");

        let bare = Station::minimal("x", "http://x");
        assert_eq!(bare.meta_line(), "");
    }

    #[test]
    fn test_zero_bitrate_has_no_label() {
        let mut s = station();
        s.bitrate = Some(0);
        assert_eq!(s.bitrate_label(), None);
    }

    #[test]
    fn test_artwork_protocol_relative() {
        assert_eq!(
            Artwork::resolve("//cdn.example.com/x.png"),
            Artwork::Remote("https://cdn.example.com/x.png".into())
        );
    }

    #[test]
    fn test_artwork_fallbacks() {
        assert_eq!(Artwork::resolve(""), Artwork::Default);
        assert_eq!(Artwork::resolve("favicon.ico"), Artwork::Default);
        assert_eq!(Artwork::resolve("ftp://x/y.png"), Artwork::Default);
        assert_eq!(
            Artwork::resolve(" data:image/png;base64,AAAA "),
            Artwork::Remote("data:image/png;base64,AAAA".into())
        );
        assert_eq!(Artwork::Default.source(), DEFAULT_ARTWORK);
    }

    #[test]
    fn test_now_playing_from_station() {
        let np = NowPlaying::from_station(&station());
        assert_eq!(np.codec, "MP3");
        assert_eq!(np.bitrate_label.as_deref(), Some("128 kbps"));
        assert_eq!(np.tags, vec!["jazz", "smooth jazz"]);
        assert_eq!(np.artwork, Artwork::Default);
        assert_eq!(np.meta_line(), station().meta_line());
    }

    #[test]
    fn test_intent_roundtrip_json() {
        let json = serde_json::to_string(&Intent::Volume { percent: 40 }).unwrap();
        assert_eq!(json, r#"{"intent":"Volume","percent":40}"#);
        let back: Intent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Intent::Volume { percent: 40 });
    }
}
