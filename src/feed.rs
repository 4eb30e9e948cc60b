//! Live attendance feed.
//!
//! `FeedHub` fans check-ins out to every websocket watching a meeting.
//! `AttendanceList` is the per-connection view that merges the initial
//! fetch with pushed records, keyed by record id.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

use crate::models::attendance::AttendanceRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Attendee(AttendanceRecord),
    Closed,
}

type Subscribers = HashMap<i64, Vec<mpsc::UnboundedSender<FeedEvent>>>;

#[derive(Clone, Default)]
pub struct FeedHub {
    subscribers: Arc<RwLock<Subscribers>>,
}

impl FeedHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in a meeting. Dropping the receiver unsubscribes
    /// lazily, on the next publish or prune.
    pub fn subscribe(&self, meeting_id: i64) -> mpsc::UnboundedReceiver<FeedEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut map = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        map.entry(meeting_id).or_default().push(tx);
        rx
    }

    /// Push a new record to the meeting's watchers. Returns how many received it.
    pub fn publish(&self, record: &AttendanceRecord) -> usize {
        self.send(record.meeting_id, FeedEvent::Attendee(record.clone()))
    }

    /// Tell watchers the meeting closed and drop them.
    pub fn close_meeting(&self, meeting_id: i64) -> usize {
        let delivered = self.send(meeting_id, FeedEvent::Closed);
        let mut map = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        map.remove(&meeting_id);
        delivered
    }

    /// Forget closed senders for a meeting.
    pub fn prune(&self, meeting_id: i64) {
        let mut map = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        if let Some(senders) = map.get_mut(&meeting_id) {
            senders.retain(|s| !s.is_closed());
            if senders.is_empty() {
                map.remove(&meeting_id);
            }
        }
    }

    pub fn subscriber_count(&self, meeting_id: i64) -> usize {
        let map = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
        map.get(&meeting_id).map_or(0, |s| s.iter().filter(|tx| !tx.is_closed()).count())
    }

    fn send(&self, meeting_id: i64, event: FeedEvent) -> usize {
        let delivered = {
            let map = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
            match map.get(&meeting_id) {
                Some(senders) => senders
                    .iter()
                    .filter(|tx| tx.send(event.clone()).is_ok())
                    .count(),
                None => 0,
            }
        };
        self.prune(meeting_id);
        delivered
    }
}

/// Attendees of one meeting, without duplicates, in scan order.
#[derive(Debug, Default)]
pub struct AttendanceList {
    records: Vec<AttendanceRecord>,
    seen: HashSet<i64>,
}

impl AttendanceList {
    pub fn from_initial(initial: Vec<AttendanceRecord>) -> Self {
        let mut list = Self::default();
        for record in initial {
            list.apply(record);
        }
        list
    }

    /// Add a pushed record. Returns false when the id was already present.
    pub fn apply(&mut self, record: AttendanceRecord) -> bool {
        if !self.seen.insert(record.id) {
            return false;
        }
        // Pushes usually arrive in order; fall back to an ordered insert.
        let pos = self
            .records
            .iter()
            .rposition(|r| (r.scanned_at, r.id) <= (record.scanned_at, record.id))
            .map_or(0, |i| i + 1);
        self.records.insert(pos, record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }
}

/// Messages sent to the browser over the feed websocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage<'a> {
    Snapshot { attendees: &'a [AttendanceRecord] },
    Attendee { attendee: &'a AttendanceRecord, count: usize },
    Closed,
}
