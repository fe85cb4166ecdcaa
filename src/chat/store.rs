//! The two client-side copies of the persisted conversation.
//!
//! `history` is what this session has exchanged and is sent along with every
//! chat request.  `full_history` is the last report of everything the backend
//! has persisted for the session, including earlier sessions.

use crate::types::HistoryEntry;

/// Identifies one history fetch so its result can be checked for staleness
/// when it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    epoch: u64,
    sequence: u64,
}

/// Holds `history` and `full_history`.
#[derive(Debug, Default)]
pub struct HistoryStore {
    history: Vec<HistoryEntry>,
    full_history: Vec<HistoryEntry>,
    // Advanced by every clear.
    epoch: u64,
    issued: u64,
    applied: u64,
}

impl HistoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The round trips this session has completed, in order.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The server's last applied report, exactly as it was returned.
    pub fn full_history(&self) -> &[HistoryEntry] {
        &self.full_history
    }

    /// Records one completed exchange: the user entry, then the assistant
    /// entry.
    pub fn append_round_trip(
        &mut self,
        user_text: impl Into<String>,
        assistant_text: impl Into<String>,
    ) {
        self.history.push(HistoryEntry::user(user_text));
        self.history.push(HistoryEntry::assistant(assistant_text));
    }

    /// Replaces the mirror of the server's history wholesale.
    pub fn replace_full_history(&mut self, entries: Vec<HistoryEntry>) {
        self.full_history = entries;
    }

    /// Empties both copies.  Fetches issued before this call become stale.
    pub fn clear(&mut self) {
        self.history.clear();
        self.full_history.clear();
        self.epoch += 1;
    }

    /// Takes a ticket for a fetch that is about to be issued.
    pub fn issue_ticket(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket {
            epoch: self.epoch,
            sequence: self.issued,
        }
    }

    /// Returns true if a fetch carrying `ticket` may still be applied: no
    /// clear happened since it was issued and no newer fetch was applied.
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.epoch == self.epoch && ticket.sequence > self.applied
    }

    /// Returns true if a fetch carrying `ticket` lost only to a newer fetch
    /// from the same epoch.  The newer result is already in `full_history`.
    pub fn is_superseded(&self, ticket: FetchTicket) -> bool {
        ticket.epoch == self.epoch && ticket.sequence <= self.applied
    }

    /// Applies a fetch result if its ticket is still current.  Returns
    /// whether it was applied.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, entries: Vec<HistoryEntry>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.applied = ticket.sequence;
        self.replace_full_history(entries);
        true
    }
}
