//! Random station selection for play-with-nothing-loaded and next/previous.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};
use tune_proto::config::RandomConfig;
use tune_proto::protocol::Station;

use crate::directory::DirectoryClient;

/// Category label that means "the favorites list", never fetched.
pub const FAVORITES_CATEGORY: &str = "favorites";

#[derive(Debug, Clone, PartialEq)]
pub enum RandomPick {
    Favorite {
        index: usize,
        station: Station,
    },
    /// `stations` is the whole fetched category so it can be shown.
    Category {
        category: String,
        stations: Vec<Station>,
        index: usize,
    },
}

impl RandomPick {
    pub fn station(&self) -> &Station {
        match self {
            Self::Favorite { station, .. } => station,
            Self::Category { stations, index, .. } => &stations[*index],
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Favorite { index, .. } | Self::Category { index, .. } => *index,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomPicker {
    favorites_probability: f64,
    categories: Vec<String>,
}

impl RandomPicker {
    pub fn new(config: &RandomConfig) -> Self {
        let categories = config
            .categories
            .iter()
            .filter(|c| !c.eq_ignore_ascii_case(FAVORITES_CATEGORY))
            .cloned()
            .collect();
        let p = config.favorites_probability;
        Self {
            favorites_probability: if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) },
            categories,
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub async fn pick(&self, favorites: &[Station], directory: &DirectoryClient) -> Option<RandomPick> {
        let mut rng = StdRng::from_entropy();
        self.pick_with(&mut rng, favorites, directory).await
    }

    pub async fn pick_with<R: Rng + Send>(
        &self,
        rng: &mut R,
        favorites: &[Station],
        directory: &DirectoryClient,
    ) -> Option<RandomPick> {
        if !favorites.is_empty() && rng.gen_bool(self.favorites_probability) {
            let index = rng.gen_range(0..favorites.len());
            debug!("random: favorite #{}", index);
            return Some(RandomPick::Favorite {
                index,
                station: favorites[index].clone(),
            });
        }

        let category = self.categories.choose(rng)?.clone();
        let stations = directory.list_by_category(&category).await;
        if stations.is_empty() {
            info!("random: category '{}' has no stations", category);
            return None;
        }
        let index = rng.gen_range(0..stations.len());
        debug!("random: '{}' #{}", category, index);
        Some(RandomPick::Category {
            category,
            stations,
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DirectoryTransport;
    use crate::error::DirectoryError;
    use async_trait::async_trait;
    use reqwest::Url;
    use std::sync::Arc;
    use tune_proto::config::DirectoryConfig;

    /// Answers every request with the same body.
    struct StaticTransport(String);

    #[async_trait]
    impl DirectoryTransport for StaticTransport {
        async fn get_text(&self, url: &Url) -> Result<String, DirectoryError> {
            if url.path().ends_with("/servers") {
                return Err(DirectoryError::Status(503));
            }
            Ok(self.0.clone())
        }
    }

    fn directory(body: &str) -> DirectoryClient {
        DirectoryClient::with_transport(
            &DirectoryConfig::default(),
            Arc::new(StaticTransport(body.to_string())),
        )
    }

    const THREE: &str = r#"[
        {"name":"a","url_resolved":"http://a","bitrate":128,"votes":3},
        {"name":"b","url_resolved":"http://b","bitrate":128,"votes":2},
        {"name":"c","url_resolved":"http://c","bitrate":128,"votes":1}
    ]"#;

    fn picker(probability: f64, categories: &[&str]) -> RandomPicker {
        RandomPicker::new(&RandomConfig {
            favorites_probability: probability,
            categories: categories.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn favorites() -> Vec<Station> {
        vec![Station::minimal("f1", "http://f1"), Station::minimal("f2", "http://f2")]
    }

    #[tokio::test]
    async fn test_always_favorites() {
        let mut rng = StdRng::seed_from_u64(7);
        let favs = favorites();
        let pick = picker(1.0, &["jazz"])
            .pick_with(&mut rng, &favs, &directory(THREE))
            .await
            .unwrap();
        match &pick {
            RandomPick::Favorite { index, station } => assert_eq!(&favs[*index], station),
            other => panic!("expected favorite, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_category_pick() {
        let mut rng = StdRng::seed_from_u64(7);
        let pick = picker(0.0, &["jazz", "rock"])
            .pick_with(&mut rng, &favorites(), &directory(THREE))
            .await
            .unwrap();
        match &pick {
            RandomPick::Category { category, stations, index } => {
                assert!(category == "jazz" || category == "rock");
                assert_eq!(stations.len(), 3);
                assert!(*index < 3);
                assert_eq!(pick.station(), &stations[*index]);
            }
            other => panic!("expected category, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_favorites_falls_through_to_category() {
        let mut rng = StdRng::seed_from_u64(1);
        let pick = picker(1.0, &["jazz"])
            .pick_with(&mut rng, &[], &directory(THREE))
            .await;
        assert!(matches!(pick, Some(RandomPick::Category { .. })));
    }

    #[tokio::test]
    async fn test_favorites_label_never_fetched() {
        let p = picker(0.0, &["Favorites", "favorites"]);
        assert!(p.categories().is_empty());
        assert!(p.pick(&favorites(), &directory(THREE)).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_category_gives_nothing() {
        let mut rng = StdRng::seed_from_u64(3);
        let pick = picker(0.0, &["jazz"])
            .pick_with(&mut rng, &[], &directory("[]"))
            .await;
        assert!(pick.is_none());
    }
}
