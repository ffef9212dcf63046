//! User favorites, persisted as one list under the `favorites` key.
//!
//! Identity is the (name, url) pair.  The whole list is written back after
//! every mutation.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use tune_proto::protocol::Station;
use tune_proto::state::{lock_store, SharedStore, StoreError, FAVORITES_KEY};

/// A favorite as found on disk.  Older records carry `bit_rate` instead of
/// `bitrate` and may lack the display fields entirely.
#[derive(Debug, Deserialize)]
struct StoredFavorite {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    bitrate: Option<u32>,
    #[serde(default)]
    bit_rate: Option<u32>,
    #[serde(default)]
    codec: Option<String>,
    #[serde(default)]
    votes: Option<i64>,
    #[serde(default)]
    favicon: Option<String>,
    #[serde(default)]
    tags: Option<String>,
}

impl StoredFavorite {
    fn normalize(self) -> Option<Station> {
        let name = self.name.filter(|n| !n.is_empty())?;
        let url = self.url.filter(|u| !u.is_empty())?;
        let bitrate = match self.bitrate {
            Some(b) if b > 0 => Some(b),
            _ => self.bit_rate.or(self.bitrate),
        };
        Some(Station {
            name,
            url,
            bitrate,
            codec: self.codec.unwrap_or_default(),
            votes: self.votes.unwrap_or(0),
            favicon: self.favicon.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
        })
    }
}

pub struct FavoritesStore {
    store: SharedStore,
    entries: Vec<Station>,
}

impl FavoritesStore {
    /// Load and normalize whatever is persisted.  Unusable records are
    /// dropped and duplicates collapse onto their first occurrence.
    pub fn load(store: SharedStore) -> Self {
        let raw = lock_store(&store).get_raw(FAVORITES_KEY).cloned();
        let entries = raw.map(decode_entries).unwrap_or_default();
        debug!("favorites: loaded {} stations", entries.len());
        Self { store, entries }
    }

    pub fn list(&self) -> &[Station] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str, url: &str) -> bool {
        self.entries.iter().any(|s| s.same_identity(name, url))
    }

    /// Add or remove `station`; returns the new membership.  When the write
    /// fails the in-memory change stays and the error is returned.
    pub fn toggle(&mut self, station: &Station) -> Result<bool, StoreError> {
        self.toggle_by_key(&station.name, &station.url, Some(station))
    }

    /// Toggle by identity.  On insert the `snapshot` is stored, or a
    /// record holding only name and url when none is given.
    pub fn toggle_by_key(
        &mut self,
        name: &str,
        url: &str,
        snapshot: Option<&Station>,
    ) -> Result<bool, StoreError> {
        let member = match self.entries.iter().position(|s| s.same_identity(name, url)) {
            Some(pos) => {
                self.entries.remove(pos);
                false
            }
            None => {
                let station = snapshot
                    .cloned()
                    .unwrap_or_else(|| Station::minimal(name, url));
                self.entries.push(station);
                true
            }
        };
        debug!("favorites: '{}' -> {}", name, if member { "added" } else { "removed" });
        self.persist()?;
        Ok(member)
    }

    fn persist(&self) -> Result<(), StoreError> {
        lock_store(&self.store)
            .set(FAVORITES_KEY, &self.entries)
            .map_err(|e| {
                warn!("favorites: failed to persist: {}", e);
                e
            })
    }
}

/// Accepts the list itself or the list encoded as a JSON string.
fn decode_entries(value: Value) -> Vec<Station> {
    let value = match value {
        Value::String(text) => match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                warn!("favorites: stored text is not JSON ({}), starting empty", e);
                return Vec::new();
            }
        },
        other => other,
    };
    let Value::Array(items) = value else {
        warn!("favorites: stored value is not a list, starting empty");
        return Vec::new();
    };

    let mut entries: Vec<Station> = Vec::with_capacity(items.len());
    for item in items {
        let station = match serde_json::from_value::<StoredFavorite>(item) {
            Ok(raw) => raw.normalize(),
            Err(e) => {
                warn!("favorites: skipping malformed record: {}", e);
                None
            }
        };
        if let Some(station) = station {
            if !entries.iter().any(|s| s.same_identity(&station.name, &station.url)) {
                entries.push(station);
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use tune_proto::state::KvStore;

    fn jazz() -> Station {
        Station {
            name: "Jazz FM".into(),
            url: "http://jazz.example/stream".into(),
            bitrate: Some(128),
            codec: "MP3".into(),
            votes: 7,
            favicon: "//cdn.example.com/j.png".into(),
            tags: "jazz".into(),
        }
    }

    fn store_with(value: Value) -> SharedStore {
        let mut kv = KvStore::in_memory();
        kv.set(FAVORITES_KEY, &value).unwrap();
        kv.shared()
    }

    #[test]
    fn test_legacy_bit_rate_field() {
        let store = store_with(json!([{ "name": "Old", "url": "http://old", "bit_rate": 128 }]));
        let favs = FavoritesStore::load(store);
        assert_eq!(favs.len(), 1);
        let s = &favs.list()[0];
        assert_eq!(s.bitrate, Some(128));
        assert_eq!(s.codec, "");
        assert_eq!(s.tags, "");
        assert_eq!(s.favicon, "");
        assert_eq!(s.votes, 0);
    }

    #[test]
    fn test_zero_bitrate_prefers_legacy_field() {
        let store = store_with(json!([{ "name": "A", "url": "u", "bitrate": 0, "bit_rate": 96 }]));
        assert_eq!(FavoritesStore::load(store).list()[0].bitrate, Some(96));
    }

    #[test]
    fn test_string_encoded_list() {
        let text = json!([{ "name": "A", "url": "http://a" }]).to_string();
        let favs = FavoritesStore::load(store_with(Value::String(text)));
        assert!(favs.contains("A", "http://a"));
    }

    #[test]
    fn test_unusable_and_duplicate_records_dropped() {
        let store = store_with(json!([
            { "name": "A", "url": "http://a", "codec": "AAC" },
            { "name": "A", "url": "http://a", "codec": "MP3" },
            { "url": "http://nameless" },
            { "name": "No URL" },
            42
        ]));
        let favs = FavoritesStore::load(store);
        assert_eq!(favs.len(), 1);
        assert_eq!(favs.list()[0].codec, "AAC");
    }

    #[test]
    fn test_toggle_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let mut favs = FavoritesStore::load(KvStore::open(&path).shared());

        assert!(favs.toggle(&jazz()).unwrap());
        assert!(favs.contains("Jazz FM", "http://jazz.example/stream"));
        let reopened = FavoritesStore::load(KvStore::open(&path).shared());
        assert_eq!(reopened.list(), &[jazz()]);

        assert!(!favs.toggle(&jazz()).unwrap());
        assert!(favs.is_empty());
        let reopened = FavoritesStore::load(KvStore::open(&path).shared());
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_persisted_as_json_array() {
        let store = KvStore::in_memory().shared();
        let mut favs = FavoritesStore::load(store.clone());
        favs.toggle(&jazz()).unwrap();

        let kv = lock_store(&store);
        let raw = kv.get_raw(FAVORITES_KEY).unwrap();
        assert!(raw.is_array());
        assert_eq!(raw[0]["name"], "Jazz FM");
    }

    #[test]
    fn test_toggle_by_key_without_snapshot() {
        let mut favs = FavoritesStore::load(KvStore::in_memory().shared());
        assert!(favs.toggle_by_key("Bare", "http://bare", None).unwrap());
        assert_eq!(favs.list()[0], Station::minimal("Bare", "http://bare"));
    }

    #[test]
    fn test_identity_is_name_and_url() {
        let mut favs = FavoritesStore::load(KvStore::in_memory().shared());
        favs.toggle(&jazz()).unwrap();
        let mut mirror = jazz();
        mirror.url = "http://other/stream".into();
        assert!(favs.toggle(&mirror).unwrap());
        assert_eq!(favs.len(), 2);
    }
}
