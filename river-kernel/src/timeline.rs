//! Timeline events and the per-stream ordered index.

use crate::codec::ParsedEvent;
use river_proto::{stream_event, ChannelMessage, ChannelProperties};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalEventStatus {
    Sending,
    Sent,
    Failed,
}

/// An optimistically created event that has not been seen on the wire yet.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalEvent {
    pub local_id: String,
    pub channel_message: ChannelMessage,
    pub status: LocalEventStatus,
}

/// Plaintext handed back by the group-encryption boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum DecryptedContent {
    ChannelMessage(ChannelMessage),
    ChannelProperties(ChannelProperties),
    Text(String),
}

impl DecryptedContent {
    pub fn kind(&self) -> &'static str {
        match self {
            DecryptedContent::ChannelMessage(_) => "channelMessage",
            DecryptedContent::ChannelProperties(_) => "channelProperties",
            DecryptedContent::Text(_) => "text",
        }
    }
}

/// Structured decryption failure, typically a missing group session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptionSessionError {
    pub missing_session: bool,
    pub kind: String,
    pub message: String,
}

/// Lifecycle of a timeline entry. Exactly one applies at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEventState {
    Local(LocalEvent),
    Remote(ParsedEvent),
    Confirmed {
        event: ParsedEvent,
        miniblock_num: i64,
        confirmed_event_num: i64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamTimelineEvent {
    pub hash_str: String,
    pub creator_user_id: String,
    pub event_num: i64,
    pub created_at_epoch_ms: i64,
    pub state: TimelineEventState,
    pub decrypted_content: Option<DecryptedContent>,
    pub decrypted_content_error: Option<DecryptionSessionError>,
}

impl StreamTimelineEvent {
    pub fn remote(event: ParsedEvent, event_num: i64) -> Self {
        Self {
            hash_str: event.hash_str.clone(),
            creator_user_id: event.creator_user_id.clone(),
            event_num,
            created_at_epoch_ms: event.event.created_at_epoch_ms,
            state: TimelineEventState::Remote(event),
            decrypted_content: None,
            decrypted_content_error: None,
        }
    }

    pub fn confirmed(event: ParsedEvent, event_num: i64, miniblock_num: i64) -> Self {
        let mut out = Self::remote(event, event_num);
        out.confirm(miniblock_num, event_num);
        out
    }

    pub fn remote_event(&self) -> Option<&ParsedEvent> {
        match &self.state {
            TimelineEventState::Remote(e) | TimelineEventState::Confirmed { event: e, .. } => Some(e),
            TimelineEventState::Local(_) => None,
        }
    }

    pub fn local_event(&self) -> Option<&LocalEvent> {
        match &self.state {
            TimelineEventState::Local(l) => Some(l),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&stream_event::Payload> {
        self.remote_event().and_then(ParsedEvent::payload)
    }

    pub fn is_local(&self) -> bool {
        matches!(self.state, TimelineEventState::Local(_))
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.state, TimelineEventState::Confirmed { .. })
    }

    pub fn miniblock_num(&self) -> Option<i64> {
        match self.state {
            TimelineEventState::Confirmed { miniblock_num, .. } => Some(miniblock_num),
            _ => None,
        }
    }

    pub fn confirmed_event_num(&self) -> Option<i64> {
        match self.state {
            TimelineEventState::Confirmed { confirmed_event_num, .. } => Some(confirmed_event_num),
            _ => None,
        }
    }

    /// Stamp sealing info. A local event has nothing to seal and stays local.
    pub fn confirm(&mut self, miniblock_num: i64, confirmed_event_num: i64) {
        match &mut self.state {
            TimelineEventState::Confirmed { miniblock_num: m, confirmed_event_num: c, .. } => {
                *m = miniblock_num;
                *c = confirmed_event_num;
            }
            TimelineEventState::Remote(event) => {
                let event = std::mem::take(event);
                self.state = TimelineEventState::Confirmed { event, miniblock_num, confirmed_event_num };
            }
            TimelineEventState::Local(_) => {}
        }
    }

    /// Replace the wire payload in place, keeping any sealing info.
    pub fn refresh_remote(&mut self, parsed: ParsedEvent) {
        self.creator_user_id = parsed.creator_user_id.clone();
        self.created_at_epoch_ms = parsed.event.created_at_epoch_ms;
        match &mut self.state {
            TimelineEventState::Confirmed { event, .. } | TimelineEventState::Remote(event) => *event = parsed,
            TimelineEventState::Local(_) => self.state = TimelineEventState::Remote(parsed),
        }
    }
}

/// Ordered timeline plus a hash index. Each hash appears at most once.
#[derive(Debug, Default, Clone)]
pub struct Timeline {
    order: VecDeque<String>,
    events: HashMap<String, StreamTimelineEvent>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, hash_str: &str) -> bool {
        self.events.contains_key(hash_str)
    }

    pub fn get(&self, hash_str: &str) -> Option<&StreamTimelineEvent> {
        self.events.get(hash_str)
    }

    pub fn get_mut(&mut self, hash_str: &str) -> Option<&mut StreamTimelineEvent> {
        self.events.get_mut(hash_str)
    }

    /// Returns false (and leaves the timeline untouched) on a duplicate hash.
    pub fn push_back(&mut self, event: StreamTimelineEvent) -> bool {
        if self.events.contains_key(&event.hash_str) {
            return false;
        }
        self.order.push_back(event.hash_str.clone());
        self.events.insert(event.hash_str.clone(), event);
        true
    }

    /// Insert `events` ahead of the current front, keeping their relative order.
    pub fn prepend(&mut self, events: Vec<StreamTimelineEvent>) {
        for event in events.into_iter().rev() {
            if self.events.contains_key(&event.hash_str) {
                continue;
            }
            self.order.push_front(event.hash_str.clone());
            self.events.insert(event.hash_str.clone(), event);
        }
    }

    /// Drop the most recently pushed entry if it is `hash_str`.
    pub fn pop_back_if(&mut self, hash_str: &str) -> Option<StreamTimelineEvent> {
        if self.order.back().map(String::as_str) != Some(hash_str) {
            return None;
        }
        self.order.pop_back();
        self.events.remove(hash_str)
    }

    pub fn remove(&mut self, hash_str: &str) -> Option<StreamTimelineEvent> {
        let event = self.events.remove(hash_str)?;
        self.order.retain(|h| h != hash_str);
        Some(event)
    }

    /// Move an entry to a new key, keeping its position.
    pub fn rekey(&mut self, old: &str, new: &str) -> bool {
        if old == new || self.events.contains_key(new) {
            return false;
        }
        let Some(mut event) = self.events.remove(old) else {
            return false;
        };
        event.hash_str = new.to_string();
        if let Some(slot) = self.order.iter_mut().find(|h| h.as_str() == old) {
            *slot = new.to_string();
        }
        self.events.insert(new.to_string(), event);
        true
    }

    pub fn first(&self) -> Option<&StreamTimelineEvent> {
        self.order.front().and_then(|h| self.events.get(h))
    }

    pub fn last(&self) -> Option<&StreamTimelineEvent> {
        self.order.back().and_then(|h| self.events.get(h))
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamTimelineEvent> {
        self.order.iter().filter_map(|h| self.events.get(h))
    }

    pub fn hashes(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
