//! Per-panel display state with a latest-request-wins guard.
//!
//! Every lane owns one [`Region`]. A load calls [`Region::begin`], which shows
//! [`RegionState::Loading`] right away and hands out a [`Ticket`]. When the
//! request settles the lane calls [`Region::settle`] with that ticket; if a
//! newer request was started in the meantime the ticket is stale and the
//! result is dropped, so a slow superseded request never overwrites a newer
//! one.

use crate::outputs::{Panel, PanelContent, Surface};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// What a panel currently shows. Exactly one state is visible at a time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum RegionState<V> {
    Loading,
    Error(String),
    Empty(String),
    Populated(V),
}

impl<V> RegionState<V> {
    pub fn is_loading(&self) -> bool {
        matches!(self, RegionState::Loading)
    }

    pub fn populated(&self) -> Option<&V> {
        match self {
            RegionState::Populated(v) => Some(v),
            _ => None,
        }
    }

    /// The message of an empty or error state.
    #[cfg(test)]
    pub fn message(&self) -> Option<&str> {
        match self {
            RegionState::Error(m) | RegionState::Empty(m) => Some(m),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> RegionState<U> {
        match self {
            RegionState::Loading => RegionState::Loading,
            RegionState::Error(m) => RegionState::Error(m),
            RegionState::Empty(m) => RegionState::Empty(m),
            RegionState::Populated(v) => RegionState::Populated(f(v)),
        }
    }
}

/// Proof that a request was the latest one started for its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
}

struct Slot<V> {
    seq: u64,
    state: RegionState<V>,
}

/// The display region of one lane.
pub struct Region<V> {
    panel: Panel,
    slot: Mutex<Slot<V>>,
    surface: Arc<dyn Surface>,
}

impl<V> Region<V>
where
    V: Clone + Into<PanelContent>,
{
    /// A region showing `initial`; nothing is committed until the first change.
    pub fn new(panel: Panel, surface: Arc<dyn Surface>, initial: RegionState<V>) -> Self {
        Self {
            panel,
            slot: Mutex::new(Slot {
                seq: 0,
                state: initial,
            }),
            surface,
        }
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    fn lock(&self) -> MutexGuard<'_, Slot<V>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(&self, state: &RegionState<V>) {
        let view = state.clone().map(Into::into);
        self.surface.commit(self.panel, &view);
    }

    /// Start a request: show `Loading` and return its ticket.
    pub fn begin(&self) -> Ticket {
        self.present(RegionState::Loading)
    }

    /// Show `state` immediately, superseding any request in flight.
    pub fn present(&self, state: RegionState<V>) -> Ticket {
        let mut slot = self.lock();
        slot.seq += 1;
        slot.state = state;
        self.commit(&slot.state);
        Ticket { seq: slot.seq }
    }

    /// Apply the outcome of the request behind `ticket`.
    ///
    /// Returns `false` and leaves the region untouched if a newer request has
    /// been started since.
    pub fn settle(&self, ticket: Ticket, state: RegionState<V>) -> bool {
        let mut slot = self.lock();
        if slot.seq != ticket.seq {
            debug!(
                panel = %self.panel,
                ticket = ticket.seq,
                latest = slot.seq,
                "Discarding superseded result"
            );
            return false;
        }
        slot.state = state;
        self.commit(&slot.state);
        true
    }

    /// Like [`settle`](Self::settle), but only while the region still shows
    /// `Loading`. Used by watchdogs to fill a stuck panel.
    pub fn settle_if_loading(&self, ticket: Ticket, state: RegionState<V>) -> bool {
        let mut slot = self.lock();
        if slot.seq != ticket.seq || !slot.state.is_loading() {
            return false;
        }
        slot.state = state;
        self.commit(&slot.state);
        true
    }

    pub fn snapshot(&self) -> RegionState<V> {
        self.lock().state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lanes::hot_words::{HotWordsView, render_hot_words};
    use crate::config::HotWordsVariant;
    use crate::models::HotWordEntry;
    use crate::testing::RecordingSurface;

    fn view(word: &str) -> HotWordsView {
        render_hot_words(
            &[HotWordEntry {
                word: word.to_string(),
                count: 1,
            }],
            HotWordsVariant::List,
            10,
        )
    }

    fn region(surface: &Arc<RecordingSurface>) -> Region<HotWordsView> {
        Region::new(Panel::HotWords, surface.clone(), RegionState::Empty("idle".into()))
    }

    #[test]
    fn test_begin_shows_loading_and_commits() {
        let surface = Arc::new(RecordingSurface::default());
        let region = region(&surface);
        region.begin();
        assert!(region.snapshot().is_loading());
        let commits = surface.commits_for(Panel::HotWords);
        assert_eq!(commits, vec![RegionState::Loading]);
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let surface = Arc::new(RecordingSurface::default());
        let region = region(&surface);
        let first = region.begin();
        let second = region.begin();

        assert!(region.settle(second, RegionState::Populated(view("new"))));
        assert!(!region.settle(first, RegionState::Populated(view("old"))));

        let state = region.snapshot();
        assert_eq!(state.populated().unwrap().rows[0].word, "new");
    }

    #[test]
    fn test_settle_if_loading_only_fills_loading_region() {
        let surface = Arc::new(RecordingSurface::default());
        let region = region(&surface);
        let ticket = region.begin();

        assert!(region.settle_if_loading(ticket, RegionState::Empty("placeholder".into())));
        assert!(!region.settle_if_loading(ticket, RegionState::Empty("again".into())));
        // the real result still lands afterwards
        assert!(region.settle(ticket, RegionState::Populated(view("real"))));
        assert!(region.snapshot().populated().is_some());
    }

    #[test]
    fn test_present_supersedes_in_flight_request() {
        let surface = Arc::new(RecordingSurface::default());
        let region = region(&surface);
        let ticket = region.begin();
        region.present(RegionState::Empty("select a history".into()));
        assert!(!region.settle(ticket, RegionState::Populated(view("late"))));
        assert_eq!(region.snapshot().message(), Some("select a history"));
    }

    #[test]
    fn test_map_keeps_messages() {
        let state: RegionState<u8> = RegionState::Error("boom".into());
        assert_eq!(state.map(|v| v as u32), RegionState::Error("boom".into()));
        let state: RegionState<u8> = RegionState::Populated(2);
        assert_eq!(state.map(|v| v as u32 * 2), RegionState::Populated(4));
    }
}
