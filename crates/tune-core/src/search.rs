//! Search input gating: in-place filtering, minimum length, and
//! last-keystroke-wins debouncing of directory searches.

use tune_proto::config::SearchConfig;
use tune_proto::protocol::SourceKind;

/// Identifies one scheduled search.  Only the newest ticket is honoured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    seq: u64,
    term: String,
}

impl SearchTicket {
    pub fn term(&self) -> &str {
        &self.term
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchInput {
    /// A category list is shown: filter it in place, no request.
    Filter(String),
    /// Too short to search.  `leave_results` is set when search results
    /// are on screen and should give way to the category view.
    TooShort { leave_results: bool },
    /// Run a directory search once the debounce delay has passed.
    Schedule(SearchTicket),
}

#[derive(Debug)]
pub struct SearchGate {
    min_chars: usize,
    seq: u64,
    live_query: String,
}

impl SearchGate {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            min_chars: config.min_chars,
            seq: 0,
            live_query: String::new(),
        }
    }

    /// Classify new input text given what the list is showing (`None` for
    /// the category grid).  Every call invalidates earlier tickets.
    pub fn on_input(&mut self, raw: &str, showing: Option<SourceKind>) -> SearchInput {
        let term = raw.trim().to_lowercase();
        self.seq += 1;
        self.live_query = term.clone();

        if showing == Some(SourceKind::Category) {
            return SearchInput::Filter(term);
        }
        if term.chars().count() < self.min_chars {
            return SearchInput::TooShort {
                leave_results: showing == Some(SourceKind::Search),
            };
        }
        SearchInput::Schedule(SearchTicket { seq: self.seq, term })
    }

    /// True while `ticket` is the newest and still matches the live query.
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        ticket.seq == self.seq && ticket.term == self.live_query
    }

    /// Drop any pending search (navigation away, category click).
    pub fn cancel(&mut self) {
        self.seq += 1;
        self.live_query.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::task::AbortHandle;

    fn gate() -> SearchGate {
        SearchGate::new(&SearchConfig::default())
    }

    #[test]
    fn test_category_view_filters() {
        let mut g = gate();
        assert_eq!(
            g.on_input("  Jazz ", Some(SourceKind::Category)),
            SearchInput::Filter("jazz".into())
        );
    }

    #[test]
    fn test_short_input() {
        let mut g = gate();
        assert_eq!(
            g.on_input(" r ", Some(SourceKind::Search)),
            SearchInput::TooShort { leave_results: true }
        );
        assert_eq!(
            g.on_input("r", None),
            SearchInput::TooShort { leave_results: false }
        );
    }

    #[test]
    fn test_newer_input_supersedes_ticket() {
        let mut g = gate();
        let SearchInput::Schedule(old) = g.on_input("ro", None) else {
            panic!("expected a scheduled search");
        };
        let SearchInput::Schedule(new) = g.on_input("roc", Some(SourceKind::Favorites)) else {
            panic!("expected a scheduled search");
        };
        assert!(!g.is_current(&old));
        assert!(g.is_current(&new));
        assert_eq!(new.term(), "roc");

        g.cancel();
        assert!(!g.is_current(&new));
    }

    /// Drives the gate the way the core does: one sleeping task per
    /// ticket, the previous one aborted, a final currency check.
    #[tokio::test(start_paused = true)]
    async fn test_debounce_issues_single_query() {
        let gate = Arc::new(Mutex::new(gate()));
        let issued: Arc<Mutex<Vec<String>>> = Arc::default();
        let mut pending: Option<AbortHandle> = None;

        for text in ["r", "ro", "roc"] {
            let input = gate.lock().unwrap().on_input(text, Some(SourceKind::Search));
            if let SearchInput::Schedule(ticket) = input {
                if let Some(prev) = pending.take() {
                    prev.abort();
                }
                let gate = gate.clone();
                let issued = issued.clone();
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(400)).await;
                    if gate.lock().unwrap().is_current(&ticket) {
                        issued.lock().unwrap().push(ticket.term().to_string());
                    }
                });
                pending = Some(handle.abort_handle());
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*issued.lock().unwrap(), vec!["roc".to_string()]);
    }
}
