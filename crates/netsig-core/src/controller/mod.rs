// ── Signal state controllers ──
//
// One controller per transport. Each owns a current/last snapshot pair,
// applies status events to the current snapshot, and produces a payload
// only when the current snapshot differs from the last dispatched one.
//
// Committing and delivering are split: the `apply_*` calls commit and hand
// back the payload, the provided `handle_*` calls also deliver it. The
// registry uses the split form so no controller lock is held while
// listeners run.

mod ethernet;
mod wifi;

use std::collections::VecDeque;
use std::fmt::{self, Write as _};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::dispatch::{DispatchReport, Dispatcher};
use crate::error::CoreError;
use crate::model::{IndicatorUpdate, StatusEvent, TransportKind};

pub use ethernet::EthernetSignalController;
pub use wifi::WifiSignalController;

/// What a mutating call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The snapshot matched the last dispatched one; nobody was notified.
    Unchanged,
    /// Listeners were notified.
    Notified(DispatchReport),
}

impl DispatchOutcome {
    pub fn is_notified(&self) -> bool {
        matches!(self, Self::Notified(_))
    }

    /// Deliver `pending`, if any.
    pub fn deliver(dispatcher: &Dispatcher, pending: Option<&IndicatorUpdate>) -> Self {
        pending.map_or(Self::Unchanged, |update| {
            Self::Notified(dispatcher.dispatch(update))
        })
    }
}

/// Behavior shared by every transport controller.
pub trait SignalController: Send {
    fn transport(&self) -> TransportKind;

    fn dispatcher(&self) -> &Dispatcher;

    /// Apply and commit one status event. Returns the payload listeners
    /// should receive, or `None` when the snapshot is unchanged.
    ///
    /// A rejected event leaves the snapshot untouched.
    fn apply_status_event(
        &mut self,
        event: &StatusEvent,
    ) -> Result<Option<IndicatorUpdate>, CoreError>;

    /// Re-read the full status from the source and commit it.
    fn apply_initial_state(&mut self) -> Result<Option<IndicatorUpdate>, CoreError>;

    /// Signal level as of the last completed mutating call.
    fn current_level(&self) -> u8;

    /// Payload for the current snapshot, recorded as sent.
    fn current_update(&mut self) -> IndicatorUpdate;

    /// Payload for the current snapshot after state outside it (aggregate
    /// flags) changed. `None` when listeners already hold an identical
    /// payload or were never sent one.
    fn refreshed_update(&mut self) -> Option<IndicatorUpdate>;

    /// Whether this transport is the default route as carrier-merged wifi
    /// on subscription `sub_id`.
    fn is_carrier_merged_for(&self, _sub_id: i32) -> bool {
        false
    }

    /// Human-readable state dump.
    fn dump(&self) -> String;

    /// Apply one status event and notify listeners if the snapshot changed.
    fn handle_status_event(&mut self, event: &StatusEvent) -> Result<DispatchOutcome, CoreError> {
        let pending = self.apply_status_event(event)?;
        Ok(DispatchOutcome::deliver(self.dispatcher(), pending.as_ref()))
    }

    /// Re-read the full status from the source, then diff and notify.
    fn fetch_initial_state(&mut self) -> Result<DispatchOutcome, CoreError> {
        let pending = self.apply_initial_state()?;
        Ok(DispatchOutcome::deliver(self.dispatcher(), pending.as_ref()))
    }

    /// Dispatch the current snapshot without diffing.
    fn notify_listeners(&mut self) -> DispatchReport {
        let update = self.current_update();
        self.dispatcher().dispatch(&update)
    }
}

// ── Sent payload ────────────────────────────────────────────────────

/// The payload listeners last received from one controller.
#[derive(Debug, Clone, Default)]
pub struct SentUpdate(Option<IndicatorUpdate>);

impl SentUpdate {
    pub fn get(&self) -> Option<&IndicatorUpdate> {
        self.0.as_ref()
    }

    pub fn record(&mut self, update: IndicatorUpdate) -> IndicatorUpdate {
        self.0 = Some(update.clone());
        update
    }

    /// Record `update` only if listeners hold a different payload.
    pub fn replace_if_changed(&mut self, update: IndicatorUpdate) -> Option<IndicatorUpdate> {
        match &self.0 {
            Some(sent) if *sent != update => Some(self.record(update)),
            _ => None,
        }
    }
}

// ── Shadow state ────────────────────────────────────────────────────

/// A dispatched snapshot and when it went out.
#[derive(Debug, Clone)]
pub struct HistoryEntry<S> {
    pub at: DateTime<Utc>,
    pub state: S,
}

/// Current/last snapshot pair with a bounded record of dispatched states.
#[derive(Debug, Clone)]
pub struct ShadowState<S> {
    current: S,
    last: S,
    history: VecDeque<HistoryEntry<S>>,
    history_size: usize,
}

impl<S: Clone + PartialEq + fmt::Debug> ShadowState<S> {
    pub fn new(initial: S, history_size: usize) -> Self {
        Self {
            current: initial.clone(),
            last: initial,
            history: VecDeque::with_capacity(history_size),
            history_size,
        }
    }

    pub fn current(&self) -> &S {
        &self.current
    }

    /// The last snapshot that was actually dispatched.
    pub fn last(&self) -> &S {
        &self.last
    }

    pub fn replace_current(&mut self, state: S) {
        self.current = state;
    }

    /// True when the current snapshot differs from the last dispatched one.
    pub fn is_dirty(&self) -> bool {
        self.current != self.last
    }

    /// Mark the current snapshot as dispatched.
    pub fn save_last_state(&mut self) {
        if self.history_size > 0 {
            if self.history.len() == self.history_size {
                self.history.pop_front();
            }
            self.history.push_back(HistoryEntry {
                at: Utc::now(),
                state: self.current.clone(),
            });
        }
        self.last.clone_from(&self.current);
    }

    /// Oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &HistoryEntry<S>> {
        self.history.iter()
    }

    pub fn dump_into(&self, out: &mut String) {
        let _ = writeln!(out, "  current={:?}", self.current);
        let _ = writeln!(out, "  last={:?}", self.last);
        let _ = writeln!(out, "  history ({} of max {}):", self.history.len(), self.history_size);
        for entry in self.history.iter().rev() {
            let _ = writeln!(
                out,
                "    {} {:?}",
                entry.at.to_rfc3339_opts(SecondsFormat::Millis, true),
                entry.state
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EthernetIndicatorUpdate, IconState};

    fn ethernet(description: &str) -> IndicatorUpdate {
        IndicatorUpdate::Ethernet(EthernetIndicatorUpdate {
            visible: true,
            status_icon: IconState::default(),
            description: description.to_owned(),
        })
    }

    #[test]
    fn sent_update_refreshes_only_on_difference() {
        let mut sent = SentUpdate::default();
        assert!(sent.replace_if_changed(ethernet("a")).is_none());
        assert!(sent.get().is_none());

        sent.record(ethernet("a"));
        assert!(sent.replace_if_changed(ethernet("a")).is_none());
        assert_eq!(sent.replace_if_changed(ethernet("b")), Some(ethernet("b")));
        assert_eq!(sent.get(), Some(&ethernet("b")));
    }

    #[test]
    fn fresh_pair_is_clean() {
        let shadow = ShadowState::new(0u8, 4);
        assert!(!shadow.is_dirty());
        assert_eq!(shadow.history().len(), 0);
    }

    #[test]
    fn save_last_state_copies_and_records() {
        let mut shadow = ShadowState::new(0u8, 4);
        shadow.replace_current(3);
        assert!(shadow.is_dirty());
        assert_eq!(*shadow.last(), 0);

        shadow.save_last_state();
        assert!(!shadow.is_dirty());
        assert_eq!(*shadow.last(), 3);
        assert_eq!(shadow.history().len(), 1);
    }

    #[test]
    fn history_is_bounded_oldest_first() {
        let mut shadow = ShadowState::new(0u8, 2);
        for v in 1..=3 {
            shadow.replace_current(v);
            shadow.save_last_state();
        }
        let states: Vec<u8> = shadow.history().map(|e| e.state).collect();
        assert_eq!(states, vec![2, 3]);
    }

    #[test]
    fn zero_history_size_records_nothing() {
        let mut shadow = ShadowState::new(0u8, 0);
        shadow.replace_current(1);
        shadow.save_last_state();
        assert_eq!(shadow.history().len(), 0);
        assert_eq!(*shadow.last(), 1);
    }

    #[test]
    fn dump_lists_newest_history_first() {
        let mut shadow = ShadowState::new(0u8, 4);
        shadow.replace_current(1);
        shadow.save_last_state();
        shadow.replace_current(2);
        shadow.save_last_state();

        let mut out = String::new();
        shadow.dump_into(&mut out);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "  current=2");
        assert_eq!(lines[1], "  last=2");
        assert_eq!(lines[2], "  history (2 of max 4):");
        assert!(lines[3].ends_with(" 2"));
        assert!(lines[4].ends_with(" 1"));
    }
}
