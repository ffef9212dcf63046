//! Turns core updates into terminal lines.

use chrono::{DateTime, Duration, Local};
use tune_proto::protocol::{SourceKind, StationRow, Update};

/// Same notification within this window is shown once.
const NOTICE_DEDUP_SECS: i64 = 3;

pub struct Renderer {
    categories: Vec<String>,
    last_playback: Option<String>,
    last_notice: Option<(String, DateTime<Local>)>,
}

impl Renderer {
    pub fn new(categories: Vec<String>) -> Self {
        Self {
            categories,
            last_playback: None,
            last_notice: None,
        }
    }

    pub fn categories_line(&self) -> String {
        let mut names = vec!["favorites".to_string()];
        names.extend(self.categories.iter().cloned());
        format!("categories: {}", names.join(", "))
    }

    /// Lines to print for `update`, stamped with `now`.  Empty when nothing
    /// changed from the user's point of view.
    pub fn render(&mut self, update: &Update, now: DateTime<Local>) -> Vec<String> {
        match update {
            Update::StationList { source, category, rows } => station_list(*source, category.as_deref(), rows),
            Update::Loading { message } => vec![message.clone()],
            Update::CategoriesView => vec![self.categories_line()],
            Update::Playback {
                status_text,
                now_playing,
                ..
            } => {
                let line = match now_playing {
                    Some(np) => {
                        let meta = np.meta_line();
                        if meta.is_empty() {
                            format!("[{}] {}", status_text, np.name)
                        } else {
                            format!("[{}] {} ({})", status_text, np.name, meta)
                        }
                    }
                    None => format!("[{}]", status_text),
                };
                if self.last_playback.as_deref() == Some(line.as_str()) {
                    return Vec::new();
                }
                self.last_playback = Some(line.clone());
                let mut lines = vec![line];
                if let Some(np) = now_playing {
                    lines.push(format!("    artwork: {}", np.artwork.source()));
                }
                lines
            }
            Update::Notification { message } => {
                if let Some((last, at)) = &self.last_notice {
                    if last == message && now - *at < Duration::seconds(NOTICE_DEDUP_SECS) {
                        return Vec::new();
                    }
                }
                self.last_notice = Some((message.clone(), now));
                vec![format!("{} ! {}", now.format("%H:%M:%S"), message)]
            }
            Update::Volume { percent } => vec![format!("volume {}%", percent)],
        }
    }
}

fn station_list(source: SourceKind, category: Option<&str>, rows: &[StationRow]) -> Vec<String> {
    let title = match (source, category) {
        (SourceKind::Favorites, _) => "favorites".to_string(),
        (SourceKind::Search, _) => "search results".to_string(),
        (SourceKind::Category, Some(label)) => label.to_string(),
        (SourceKind::Category, None) => "stations".to_string(),
    };
    let visible: Vec<&StationRow> = rows.iter().filter(|r| r.visible).collect();
    let mut lines = vec![format!("── {} ({}) ──", title, visible.len())];
    if visible.is_empty() {
        lines.push(match source {
            SourceKind::Favorites => "No favorites yet".to_string(),
            _ => "No stations found".to_string(),
        });
        return lines;
    }
    for row in visible {
        let marker = if row.is_playing { '▶' } else { ' ' };
        let heart = if row.is_favorite { '♥' } else { '♡' };
        let mut line = format!("{}{} {:>3}  {}", marker, heart, row.index, row.name);
        if !row.meta.is_empty() {
            line.push_str("  ");
            line.push_str(&row.meta);
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use tune_proto::protocol::{Artwork, NowPlaying, PlaybackStatus};

    fn row(index: usize, name: &str, visible: bool) -> StationRow {
        StationRow {
            index,
            name: name.into(),
            meta: "MP3 • 128 kbps".into(),
            is_favorite: index == 0,
            is_playing: index == 1,
            visible,
        }
    }

    #[test]
    fn test_list_hides_filtered_rows() {
        let mut r = Renderer::new(vec![]);
        let lines = r.render(
            &Update::StationList {
                source: SourceKind::Category,
                category: Some("jazz".into()),
                rows: vec![row(0, "A", true), row(1, "B", true), row(2, "C", false)],
            },
            Local::now(),
        );
        assert_eq!(lines[0], "── jazz (2) ──");
        assert_eq!(lines[1], " ♥   0  A  MP3 • 128 kbps");
        assert_eq!(lines[2], "▶♡   1  B  MP3 • 128 kbps");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_empty_lists() {
        let mut r = Renderer::new(vec![]);
        let fav = r.render(
            &Update::StationList {
                source: SourceKind::Favorites,
                category: None,
                rows: vec![],
            },
            Local::now(),
        );
        assert_eq!(fav[1], "No favorites yet");
    }

    #[test]
    fn test_playback_line_deduplicated() {
        let mut r = Renderer::new(vec![]);
        let update = Update::Playback {
            status: PlaybackStatus::Playing,
            status_text: "Live".into(),
            now_playing: Some(NowPlaying {
                name: "Jazz FM".into(),
                codec: "MP3".into(),
                bitrate_label: Some("128 kbps".into()),
                tags: vec!["jazz".into()],
                artwork: Artwork::Remote("https://jazz.example/logo.png".into()),
            }),
            current_index: Some(0),
        };
        assert_eq!(
            r.render(&update, Local::now()),
            vec![
                "[Live] Jazz FM (MP3 • 128 kbps • jazz)",
                "    artwork: https://jazz.example/logo.png"
            ]
        );
        assert!(r.render(&update, Local::now()).is_empty());

        let idle = Update::Playback {
            status: PlaybackStatus::Idle,
            status_text: "Idle".into(),
            now_playing: None,
            current_index: None,
        };
        assert_eq!(r.render(&idle, Local::now()), vec!["[Idle]"]);
    }

    #[test]
    fn test_default_artwork_shows_bundled_logo() {
        let mut r = Renderer::new(vec![]);
        let update = Update::Playback {
            status: PlaybackStatus::Playing,
            status_text: "Live".into(),
            now_playing: Some(NowPlaying {
                name: "Plain".into(),
                codec: String::new(),
                bitrate_label: None,
                tags: vec![],
                artwork: Artwork::Default,
            }),
            current_index: None,
        };
        assert_eq!(
            r.render(&update, Local::now()),
            vec!["[Live] Plain", "    artwork: tunetracker.svg"]
        );
    }

    #[test]
    fn test_notification_dedup_window() {
        let mut r = Renderer::new(vec![]);
        let notice = Update::Notification {
            message: "Station directory unreachable".into(),
        };
        let t0 = Local::now();
        assert_eq!(r.render(&notice, t0).len(), 1);
        assert!(r.render(&notice, t0 + Duration::seconds(1)).is_empty());
        assert_eq!(r.render(&notice, t0 + Duration::seconds(5)).len(), 1);
    }

    #[test]
    fn test_categories_line_starts_with_favorites() {
        let r = Renderer::new(vec!["jazz".into(), "rock".into()]);
        assert_eq!(r.categories_line(), "categories: favorites, jazz, rock");
    }
}
