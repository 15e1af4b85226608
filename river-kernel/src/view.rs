//! Per-stream state machine
//!
//! [`StreamStateView`] folds a genesis snapshot, sealed miniblocks and the
//! unsealed minipool tail into a timeline plus the stream's content and
//! membership projections. It is single-owner; see [`crate::actor`] for
//! the task that serializes access to one view.

use crate::codec::{ParsedEvent, ParsedMiniblock, ParsedStreamResponse};
use crate::content::ContentView;
use crate::error::{check, RiverError};
use crate::members::Members;
use crate::notify::{Notifier, StreamStateEvent, TimelineChange};
use crate::timeline::{
    DecryptedContent, DecryptionSessionError, LocalEvent, LocalEventStatus, StreamTimelineEvent,
    Timeline, TimelineEventState,
};
use river_model::{Clock, Hash, StreamId, StreamKind, SystemClock};
use river_proto::{stream_event, ChannelMessage, ErrCode, MiniblockHeader, Snapshot, SyncCookie};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Range of miniblocks loaded into the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiniblockInfo {
    pub min: i64,
    pub max: i64,
    /// Miniblock 0 is loaded. Never reset once set.
    pub terminus_reached: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Uninitialized,
    Initializing,
    Initialized,
}

/// Extra inputs for [`StreamStateView::initialize`].
#[derive(Debug, Default)]
pub struct InitOptions {
    /// Older miniblocks fetched eagerly alongside the stream, oldest first.
    pub prepended_miniblocks: Vec<ParsedMiniblock>,
    /// Locally queued events to replay on top of the remote state.
    pub local_events: Vec<LocalEvent>,
}

pub struct StreamStateView {
    user_id: String,
    stream_id: StreamId,
    status: ViewStatus,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    timeline: Timeline,
    content: ContentView,
    members: Members,
    miniblock_info: Option<MiniblockInfo>,
    prev_miniblock_hash: Option<Hash>,
    prev_snapshot_miniblock_num: i64,
    last_event_num: i64,
    sync_cookie: Option<SyncCookie>,
    snapshot: Option<Snapshot>,
}

impl fmt::Debug for StreamStateView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamStateView")
            .field("stream_id", &self.stream_id)
            .field("status", &self.status)
            .field("miniblock_info", &self.miniblock_info)
            .field("last_event_num", &self.last_event_num)
            .field("timeline_len", &self.timeline.len())
            .finish()
    }
}

impl StreamStateView {
    pub fn new(user_id: impl Into<String>, stream_id: StreamId, notifier: Notifier) -> Self {
        Self::with_clock(user_id, stream_id, notifier, Arc::new(SystemClock))
    }

    pub fn with_clock(user_id: impl Into<String>, stream_id: StreamId, notifier: Notifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_id: user_id.into(),
            stream_id,
            status: ViewStatus::Uninitialized,
            notifier,
            clock,
            timeline: Timeline::default(),
            content: ContentView::new(stream_id),
            members: Members::new(stream_id),
            miniblock_info: None,
            prev_miniblock_hash: None,
            prev_snapshot_miniblock_num: 0,
            last_event_num: 0,
            sync_cookie: None,
            snapshot: None,
        }
    }

    // ------------------------------------------------------------------
    // Initialize
    // ------------------------------------------------------------------

    /// Build state from a bootstrap response. Runs once; state
    /// notifications are held back until the final `Initialized`.
    pub fn initialize(&mut self, response: ParsedStreamResponse, opts: InitOptions) -> Result<(), RiverError> {
        check(self.status == ViewStatus::Uninitialized, ErrCode::FailedPrecondition, || {
            format!("stream {} already initialized", self.stream_id)
        })?;
        let ParsedStreamResponse { stream_and_cookie, snapshot, prev_snapshot_miniblock_num, .. } = response;
        let mut miniblocks = stream_and_cookie.miniblocks.into_iter();
        let genesis = miniblocks
            .next()
            .ok_or_else(|| RiverError::new(ErrCode::StreamEmpty, format!("no miniblocks for {}", self.stream_id)))?;

        self.status = ViewStatus::Initializing;
        self.notifier.set_state_muted(true);
        let result = self.initialize_inner(
            genesis,
            miniblocks.collect(),
            snapshot,
            stream_and_cookie.events,
            stream_and_cookie.next_sync_cookie,
            prev_snapshot_miniblock_num,
            opts,
        );
        self.notifier.set_state_muted(false);
        match result {
            Ok(()) => {
                self.status = ViewStatus::Initialized;
                tracing::debug!(
                    stream_id = %self.stream_id,
                    events = self.timeline.len(),
                    last_event_num = self.last_event_num,
                    "stream initialized"
                );
                self.notifier.state_always(StreamStateEvent::Initialized { stream_id: self.stream_id });
                Ok(())
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// Drop partially applied bootstrap state so `initialize` can run again.
    fn reset(&mut self) {
        self.status = ViewStatus::Uninitialized;
        self.timeline = Timeline::default();
        self.content = ContentView::new(self.stream_id);
        self.members = Members::new(self.stream_id);
        self.miniblock_info = None;
        self.prev_miniblock_hash = None;
        self.prev_snapshot_miniblock_num = 0;
        self.last_event_num = 0;
        self.sync_cookie = None;
        self.snapshot = None;
    }

    #[allow(clippy::too_many_arguments)]
    fn initialize_inner(
        &mut self,
        genesis: ParsedMiniblock,
        rest: Vec<ParsedMiniblock>,
        snapshot: Snapshot,
        minipool: Vec<ParsedEvent>,
        next_sync_cookie: SyncCookie,
        prev_snapshot_miniblock_num: i64,
        opts: InitOptions,
    ) -> Result<(), RiverError> {
        self.apply_snapshot(&genesis.hash.to_string(), snapshot)?;

        let mut last_block = (genesis.header.event_num_offset, genesis.events.len(), genesis.hash);

        // Genesis block goes through the prepend path, latest first.
        let genesis_events = block_events(genesis);
        let hashes: Vec<String> = genesis_events.iter().map(|e| e.hash_str.clone()).collect();
        for event in genesis_events {
            self.timeline.push_back(event);
        }
        for hash in hashes.iter().rev() {
            self.process_prepended_event(hash);
        }

        let mut change = TimelineChange::default();
        for block in rest {
            last_block = (block.header.event_num_offset, block.events.len(), block.hash);
            for event in block_events(block) {
                let hash = event.hash_str.clone();
                if self.timeline.push_back(event) {
                    change.appended.push(hash.clone());
                    self.process_appended_event(&hash, &mut change);
                }
            }
        }

        let (offset, count, hash) = last_block;
        self.last_event_num = offset + count as i64;
        self.prev_miniblock_hash = Some(hash);

        self.append_stream_and_cookie(minipool, next_sync_cookie, &mut change);
        self.prev_snapshot_miniblock_num = prev_snapshot_miniblock_num;

        if !opts.prepended_miniblocks.is_empty() {
            let terminus = opts.prepended_miniblocks[0].header.miniblock_num == 0;
            self.prepend_miniblocks(opts.prepended_miniblocks, terminus);
        }
        for local in opts.local_events {
            self.insert_local_event(local);
        }
        Ok(())
    }

    fn apply_snapshot(&mut self, event_id: &str, snapshot: Snapshot) -> Result<(), RiverError> {
        check(snapshot.content.is_some(), ErrCode::StreamBadEvent, || {
            format!("snapshot for {} has no content", self.stream_id)
        })?;
        self.members.apply_snapshot(event_id, &snapshot, &self.notifier)?;
        self.content.projection_mut().apply_snapshot(event_id, &snapshot, &self.notifier)?;
        self.snapshot = Some(snapshot);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Append
    // ------------------------------------------------------------------

    /// Apply live events in order and advance the sync cookie.
    pub fn append_events(&mut self, events: Vec<ParsedEvent>, next_sync_cookie: SyncCookie) -> Result<(), RiverError> {
        check(self.status == ViewStatus::Initialized, ErrCode::FailedPrecondition, || {
            format!("append to uninitialized stream {}", self.stream_id)
        })?;
        let mut change = TimelineChange::default();
        self.append_stream_and_cookie(events, next_sync_cookie, &mut change);
        if !change.is_empty() {
            self.notifier.state(StreamStateEvent::Updated { stream_id: self.stream_id, change });
        }
        Ok(())
    }

    fn append_stream_and_cookie(&mut self, events: Vec<ParsedEvent>, next_sync_cookie: SyncCookie, change: &mut TimelineChange) {
        for parsed in events {
            if let Some(existing) = self.timeline.get_mut(&parsed.hash_str) {
                change.updated.push(parsed.hash_str.clone());
                existing.refresh_remote(parsed);
                continue;
            }
            let event = StreamTimelineEvent::remote(parsed, self.last_event_num);
            self.last_event_num += 1;
            let hash = event.hash_str.clone();
            self.timeline.push_back(event);
            change.appended.push(hash.clone());
            self.process_appended_event(&hash, change);
        }
        self.sync_cookie = Some(next_sync_cookie);
    }

    fn process_appended_event(&mut self, hash_str: &str, change: &mut TimelineChange) {
        let Some(event) = self.timeline.get(hash_str) else {
            return;
        };
        let result = match event.payload() {
            Some(stream_event::Payload::MiniblockHeader(header)) => {
                let header = header.clone();
                let block_hash = event.remote_event().map(|e| e.hash);
                match self.apply_appended_header(hash_str, &header, block_hash, change) {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        tracing::error!(
                            stream_id = %self.stream_id,
                            miniblock_num = header.miniblock_num,
                            error = %e,
                            "dropping out-of-order miniblock header"
                        );
                        if self.timeline.pop_back_if(hash_str).is_some() {
                            self.last_event_num -= 1;
                            change.appended.retain(|h| h != hash_str);
                        }
                        return;
                    }
                }
            }
            Some(stream_event::Payload::MemberPayload(payload)) => {
                self.members.append_event(event, payload, &self.notifier)
            }
            Some(_) => self.content.projection_mut().append_event(event, &self.notifier),
            None => Ok(()),
        };
        if let Err(e) = result {
            tracing::error!(stream_id = %self.stream_id, event = %hash_str, error = %e, "failed to apply event");
        }
    }

    /// Seal the events a header lists, then the header itself. The header
    /// must extend the range.
    fn apply_appended_header(
        &mut self,
        header_hash: &str,
        header: &MiniblockHeader,
        block_hash: Option<Hash>,
        change: &mut TimelineChange,
    ) -> Result<(), RiverError> {
        if let Some(info) = &self.miniblock_info {
            check(header.miniblock_num > info.max, ErrCode::StreamBadEvent, || {
                format!("miniblock num {} not greater than max {}", header.miniblock_num, info.max)
            })?;
        }
        self.update_miniblock_info(header.miniblock_num);
        if let Some(hash) = block_hash {
            self.prev_miniblock_hash = Some(hash);
        }
        if let Some(snapshot) = &header.snapshot {
            self.snapshot = Some(snapshot.clone());
        }

        for (i, raw) in header.event_hashes.iter().enumerate() {
            let hash_str = hex::encode(raw);
            let confirmed_event_num = header.event_num_offset + i as i64;
            let Some(event) = self.timeline.get_mut(&hash_str) else {
                tracing::error!(
                    stream_id = %self.stream_id,
                    miniblock_num = header.miniblock_num,
                    event = %hash_str,
                    "sealed event missing from timeline"
                );
                continue;
            };
            event.confirm(header.miniblock_num, confirmed_event_num);
            change.confirmed.push(hash_str.clone());

            let Some(event) = self.timeline.get(&hash_str) else { continue };
            match event.payload() {
                Some(stream_event::Payload::MemberPayload(payload)) => {
                    self.members.on_confirmed_event(event, payload, &self.notifier)
                }
                _ => self.content.projection_mut().on_confirmed_event(event, &self.notifier),
            }
        }

        // The header takes the slot right after the events it seals.
        if let Some(event) = self.timeline.get_mut(header_hash) {
            event.confirm(header.miniblock_num, header.event_num_offset + header.event_hashes.len() as i64);
            change.confirmed.push(header_hash.to_string());
        }
        Ok(())
    }

    fn update_miniblock_info(&mut self, miniblock_num: i64) {
        match &mut self.miniblock_info {
            None => {
                self.miniblock_info = Some(MiniblockInfo {
                    min: miniblock_num,
                    max: miniblock_num,
                    terminus_reached: miniblock_num == 0,
                });
            }
            Some(info) => {
                info.min = info.min.min(miniblock_num);
                info.max = info.max.max(miniblock_num);
                if info.min == 0 {
                    info.terminus_reached = true;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Prepend
    // ------------------------------------------------------------------

    /// Insert older miniblocks ahead of the timeline. `terminus` marks that
    /// nothing older exists.
    pub fn prepend_events(&mut self, miniblocks: Vec<ParsedMiniblock>, terminus: bool) -> Result<(), RiverError> {
        check(self.status == ViewStatus::Initialized, ErrCode::FailedPrecondition, || {
            format!("prepend to uninitialized stream {}", self.stream_id)
        })?;
        self.prepend_miniblocks(miniblocks, terminus);
        Ok(())
    }

    fn prepend_miniblocks(&mut self, miniblocks: Vec<ParsedMiniblock>, terminus: bool) {
        let mut events = Vec::new();
        for block in miniblocks {
            for event in block_events(block) {
                if self.timeline.contains(&event.hash_str) {
                    tracing::warn!(stream_id = %self.stream_id, event = %event.hash_str, "skipping duplicate prepended event");
                    continue;
                }
                events.push(event);
            }
        }
        let hashes: Vec<String> = events.iter().map(|e| e.hash_str.clone()).collect();
        self.timeline.prepend(events);
        for hash in hashes.iter().rev() {
            self.process_prepended_event(hash);
        }
        if terminus {
            if let Some(info) = &mut self.miniblock_info {
                info.terminus_reached = true;
            }
        }
        self.notifier.state(StreamStateEvent::Updated {
            stream_id: self.stream_id,
            change: TimelineChange { prepended: hashes, ..Default::default() },
        });
    }

    fn process_prepended_event(&mut self, hash_str: &str) {
        let Some(event) = self.timeline.get(hash_str) else {
            return;
        };
        let result = match event.payload() {
            Some(stream_event::Payload::MiniblockHeader(header)) => {
                let (num, prev_snapshot) = (header.miniblock_num, header.prev_snapshot_miniblock_num);
                self.update_miniblock_info(num);
                self.prev_snapshot_miniblock_num = prev_snapshot;
                Ok(())
            }
            Some(stream_event::Payload::MemberPayload(payload)) => {
                self.members.prepend_event(event, payload, &self.notifier)
            }
            Some(_) => self.content.projection_mut().prepend_event(event, &self.notifier),
            None => Ok(()),
        };
        if let Err(e) = result {
            tracing::error!(stream_id = %self.stream_id, event = %hash_str, error = %e, "failed to apply prepended event");
        }
    }

    // ------------------------------------------------------------------
    // Decryption
    // ------------------------------------------------------------------

    pub fn update_decrypted_content(&mut self, event_id: &str, content: DecryptedContent) {
        self.members.on_decrypted_content(event_id, &content, &self.notifier);
        self.content.projection_mut().on_decrypted_content(event_id, &content, &self.notifier);

        let Some(event) = self.timeline.get_mut(event_id) else {
            return;
        };
        if let Some(existing) = &event.decrypted_content {
            tracing::error!(
                stream_id = %self.stream_id,
                event = %event_id,
                kind = existing.kind(),
                "event already decrypted"
            );
        }
        event.decrypted_content = Some(content);
        event.decrypted_content_error = None;
        self.notifier.state(StreamStateEvent::Updated {
            stream_id: self.stream_id,
            change: TimelineChange { updated: vec![event_id.to_string()], ..Default::default() },
        });
        self.notifier.state(StreamStateEvent::EventDecrypted {
            stream_id: self.stream_id,
            event_id: event_id.to_string(),
        });
    }

    pub fn update_decrypted_content_error(&mut self, event_id: &str, error: DecryptionSessionError) {
        let Some(event) = self.timeline.get_mut(event_id) else {
            return;
        };
        if event.decrypted_content.is_some() {
            tracing::warn!(stream_id = %self.stream_id, event = %event_id, "ignoring decryption error for decrypted event");
            return;
        }
        if event.decrypted_content_error.as_ref() == Some(&error) {
            return;
        }
        event.decrypted_content_error = Some(error);
        self.notifier.state(StreamStateEvent::Updated {
            stream_id: self.stream_id,
            change: TimelineChange { updated: vec![event_id.to_string()], ..Default::default() },
        });
    }

    // ------------------------------------------------------------------
    // Local events
    // ------------------------------------------------------------------

    /// Optimistically add a message before it is sent. Returns its local id.
    pub fn append_local_event(&mut self, channel_message: ChannelMessage, status: LocalEventStatus) -> String {
        let local_id = format!("~{}", uuid::Uuid::new_v4().simple());
        self.insert_local_event(LocalEvent { local_id: local_id.clone(), channel_message, status });
        local_id
    }

    fn insert_local_event(&mut self, local: LocalEvent) {
        let local_id = local.local_id.clone();
        let event = StreamTimelineEvent {
            hash_str: local_id.clone(),
            creator_user_id: self.user_id.clone(),
            event_num: self.last_event_num,
            created_at_epoch_ms: self.clock.now_ms(),
            decrypted_content: Some(DecryptedContent::ChannelMessage(local.channel_message.clone())),
            decrypted_content_error: None,
            state: TimelineEventState::Local(local),
        };
        if !self.timeline.push_back(event) {
            tracing::warn!(stream_id = %self.stream_id, local_id = %local_id, "duplicate local event id");
            return;
        }
        self.last_event_num += 1;
        if let Some(event) = self.timeline.get(&local_id) {
            self.content.projection_mut().on_append_local_event(event, &self.notifier);
        }
        self.notifier.state(StreamStateEvent::Updated {
            stream_id: self.stream_id,
            change: TimelineChange { appended: vec![local_id], ..Default::default() },
        });
    }

    /// Record the send outcome of a local event and move it to its wire hash.
    pub fn update_local_event(&mut self, local_id: &str, hash_str: &str, status: LocalEventStatus) -> Result<(), RiverError> {
        let event = self
            .timeline
            .get_mut(local_id)
            .ok_or_else(|| RiverError::new(ErrCode::NotFound, format!("local event {} not found", local_id)))?;
        let TimelineEventState::Local(local) = &mut event.state else {
            return Err(RiverError::new(ErrCode::FailedPrecondition, format!("event {} is not local", local_id)));
        };
        local.status = status;

        let current_id = if local_id == hash_str {
            local_id.to_string()
        } else if self.timeline.contains(hash_str) {
            // The remote copy arrived first; it supersedes the local one.
            self.timeline.remove(local_id);
            hash_str.to_string()
        } else {
            self.timeline.rekey(local_id, hash_str);
            hash_str.to_string()
        };
        if let Some(event) = self.timeline.get(&current_id) {
            self.notifier.state(StreamStateEvent::LocalEventUpdated {
                stream_id: self.stream_id,
                previous_id: local_id.to_string(),
                event: Box::new(event.clone()),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Users who may receive this stream's group keys.
    pub fn get_users_entitled_to_key_exchange(&self) -> BTreeSet<String> {
        match self.stream_id.kind() {
            StreamKind::Channel | StreamKind::Space | StreamKind::Gdm => self.members.joined_participants(),
            StreamKind::Dm => self.members.participants(),
            _ => BTreeSet::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    pub fn status(&self) -> ViewStatus {
        self.status
    }

    pub fn is_initialized(&self) -> bool {
        self.status == ViewStatus::Initialized
    }

    pub fn miniblock_info(&self) -> Option<&MiniblockInfo> {
        self.miniblock_info.as_ref()
    }

    pub fn prev_miniblock_hash(&self) -> Option<&Hash> {
        self.prev_miniblock_hash.as_ref()
    }

    pub fn prev_snapshot_miniblock_num(&self) -> i64 {
        self.prev_snapshot_miniblock_num
    }

    pub fn last_event_num(&self) -> i64 {
        self.last_event_num
    }

    pub fn sync_cookie(&self) -> Option<&SyncCookie> {
        self.sync_cookie.as_ref()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn get_content(&self) -> &ContentView {
        &self.content
    }

    pub fn get_members(&self) -> &Members {
        &self.members
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

/// Timeline entries for a sealed block: header last, numbered from the
/// block's event offset.
fn block_events(block: ParsedMiniblock) -> Vec<StreamTimelineEvent> {
    let miniblock_num = block.header.miniblock_num;
    let offset = block.header.event_num_offset;
    block
        .events
        .into_iter()
        .enumerate()
        .map(|(i, event)| StreamTimelineEvent::confirmed(event, offset + i as i64, miniblock_num))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(kind: StreamKind) -> StreamStateView {
        StreamStateView::new("0xme", StreamId::random(kind), Notifier::new(64))
    }

    #[test]
    fn test_miniblock_info_widens() {
        let mut v = view(StreamKind::Channel);
        v.update_miniblock_info(5);
        assert_eq!(v.miniblock_info(), Some(&MiniblockInfo { min: 5, max: 5, terminus_reached: false }));
        v.update_miniblock_info(7);
        v.update_miniblock_info(2);
        assert_eq!(v.miniblock_info(), Some(&MiniblockInfo { min: 2, max: 7, terminus_reached: false }));
        v.update_miniblock_info(0);
        assert!(v.miniblock_info().unwrap().terminus_reached);
    }

    #[test]
    fn test_empty_stream_fails() {
        let mut v = view(StreamKind::Channel);
        let err = v.initialize(ParsedStreamResponse::default(), InitOptions::default()).unwrap_err();
        assert_eq!(err.code, ErrCode::StreamEmpty);
        assert_eq!(v.status(), ViewStatus::Uninitialized);
    }

    #[test]
    fn test_append_before_initialize_fails() {
        let mut v = view(StreamKind::Channel);
        let err = v.append_events(vec![], SyncCookie::default()).unwrap_err();
        assert_eq!(err.code, ErrCode::FailedPrecondition);
    }

    #[test]
    fn test_local_event_lifecycle() {
        let mut v = view(StreamKind::Channel);
        let mut rx = v.notifier().subscribe_state();
        let local_id = v.append_local_event(ChannelMessage::text("hi"), LocalEventStatus::Sending);
        assert!(local_id.starts_with('~'));
        assert_eq!(v.last_event_num(), 1);
        assert!(v.timeline().get(&local_id).unwrap().is_local());
        assert!(matches!(rx.try_recv(), Ok(StreamStateEvent::Updated { .. })));

        v.update_local_event(&local_id, "abcd", LocalEventStatus::Sent).unwrap();
        let event = v.timeline().get("abcd").unwrap();
        assert_eq!(event.local_event().unwrap().status, LocalEventStatus::Sent);
        assert!(!v.timeline().contains(&local_id));
        assert!(matches!(rx.try_recv(), Ok(StreamStateEvent::LocalEventUpdated { .. })));

        let err = v.update_local_event("~missing", "ef", LocalEventStatus::Failed).unwrap_err();
        assert_eq!(err.code, ErrCode::NotFound);
    }

    #[test]
    fn test_decryption_error_skipped_once_decrypted() {
        let mut v = view(StreamKind::Channel);
        let local_id = v.append_local_event(ChannelMessage::text("hi"), LocalEventStatus::Sending);
        let error = DecryptionSessionError { missing_session: true, kind: "channelMessage".into(), message: "no session".into() };
        v.update_decrypted_content_error(&local_id, error);
        assert!(v.timeline().get(&local_id).unwrap().decrypted_content_error.is_none());
    }

    #[test]
    fn test_second_decrypt_replaces_first() {
        let mut v = view(StreamKind::Channel);
        let local_id = v.append_local_event(ChannelMessage::text("hi"), LocalEventStatus::Sending);
        let mut rx = v.notifier().subscribe_state();

        v.update_decrypted_content(&local_id, DecryptedContent::Text("first".into()));
        v.update_decrypted_content(&local_id, DecryptedContent::Text("second".into()));

        let event = v.timeline().get(&local_id).unwrap();
        assert_eq!(event.decrypted_content, Some(DecryptedContent::Text("second".into())));
        let mut decrypted = 0;
        while let Ok(ev) = rx.try_recv() {
            if let StreamStateEvent::EventDecrypted { event_id, .. } = ev {
                assert_eq!(event_id, local_id);
                decrypted += 1;
            }
        }
        assert_eq!(decrypted, 2);
    }

    #[test]
    fn test_local_events_stamped_from_view_clock() {
        let clock = Arc::new(river_model::ManualClock::at(1_000));
        let mut v = StreamStateView::with_clock("0xme", StreamId::random(StreamKind::Channel), Notifier::new(64), clock.clone());
        let first = v.append_local_event(ChannelMessage::text("a"), LocalEventStatus::Sending);
        clock.advance(std::time::Duration::from_millis(250));
        let second = v.append_local_event(ChannelMessage::text("b"), LocalEventStatus::Sending);

        assert_eq!(v.timeline().get(&first).unwrap().created_at_epoch_ms, 1_000);
        assert_eq!(v.timeline().get(&second).unwrap().created_at_epoch_ms, 1_250);
    }
}
