//! The station list currently on screen, its selection and in-place filter.

use tune_proto::protocol::{SourceKind, Station, StationRow};

#[derive(Debug, Default)]
pub struct StationListModel {
    stations: Vec<Station>,
    source: SourceKind,
    category: Option<String>,
    selected: Option<usize>,
    filter: String,
    /// Original indices that pass the filter, in list order.
    visible_indices: Vec<usize>,
}

impl StationListModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole list.  Selection and filter are cleared.
    pub fn set_stations(&mut self, stations: Vec<Station>, source: SourceKind) {
        self.stations = stations;
        self.source = source;
        self.category = None;
        self.selected = None;
        self.filter.clear();
        self.rebuild_filter();
    }

    pub fn set_category(&mut self, stations: Vec<Station>, label: &str) {
        self.set_stations(stations, SourceKind::Category);
        self.category = Some(label.to_string());
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Select by index; negative or out-of-range indices leave the model
    /// untouched.  Returns whether the selection was applied.
    pub fn select(&mut self, index: i64) -> bool {
        let Ok(index) = usize::try_from(index) else {
            return false;
        };
        if index >= self.stations.len() {
            return false;
        }
        self.selected = Some(index);
        true
    }

    /// Select from index text handed over by the adapter ("3", "NaN", ...).
    pub fn select_raw(&mut self, raw: &str) -> bool {
        match raw.trim().parse::<i64>() {
            Ok(index) => self.select(index),
            Err(_) => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_station(&self) -> Option<&Station> {
        self.stations.get(self.selected?)
    }

    /// Hide entries whose name does not contain `term`.  Only category lists
    /// filter in place; returns false for other sources.
    pub fn filter_in_place(&mut self, term: &str) -> bool {
        if self.source != SourceKind::Category {
            return false;
        }
        self.filter = term.trim().to_lowercase();
        self.rebuild_filter();
        true
    }

    fn rebuild_filter(&mut self) {
        self.visible_indices = if self.filter.is_empty() {
            (0..self.stations.len()).collect()
        } else {
            self.stations
                .iter()
                .enumerate()
                .filter(|(_, s)| s.name.to_lowercase().contains(&self.filter))
                .map(|(i, _)| i)
                .collect()
        };
    }

    /// (list index, station) for every displayed row.
    pub fn visible(&self) -> impl Iterator<Item = (usize, &Station)> + '_ {
        self.visible_indices.iter().map(|&i| (i, &self.stations[i]))
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible_indices.binary_search(&index).is_ok()
    }

    pub fn get(&self, index: usize) -> Option<&Station> {
        self.stations.get(index)
    }

    pub fn position_of(&self, name: &str, url: &str) -> Option<usize> {
        self.stations.iter().position(|s| s.same_identity(name, url))
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Render every row, hidden ones included with `visible: false`.
    pub fn rows(&self, is_favorite: impl Fn(&Station) -> bool) -> Vec<StationRow> {
        self.stations
            .iter()
            .enumerate()
            .map(|(i, s)| StationRow {
                index: i,
                name: s.name.clone(),
                meta: s.meta_line(),
                is_favorite: is_favorite(s),
                is_playing: self.selected == Some(i),
                visible: self.is_visible(i),
            })
            .collect()
    }
}
