use super::{stream_id_of, unexpected_payload, unexpected_snapshot, ContentProjection};
use crate::error::RiverError;
use crate::notify::{Notifier, StreamStateEvent};
use crate::timeline::StreamTimelineEvent;
use river_model::{StreamId, StreamKind};
use river_proto::media_payload::{self, Chunk, Inception};
use river_proto::{snapshot, stream_event, ErrCode, Snapshot};

/// Attachment stream: an inception followed by numbered chunks.
#[derive(Debug, Clone)]
pub struct MediaContent {
    pub stream_id: StreamId,
    pub channel_id: Option<StreamId>,
    pub space_id: Option<StreamId>,
    pub chunk_count: usize,
    pub chunks: Vec<Option<Vec<u8>>>,
}

impl MediaContent {
    pub fn new(stream_id: StreamId) -> Self {
        Self { stream_id, channel_id: None, space_id: None, chunk_count: 0, chunks: Vec::new() }
    }

    pub fn is_complete(&self) -> bool {
        self.chunk_count > 0 && self.chunks.iter().all(Option::is_some)
    }

    /// Concatenated chunks once every index has arrived.
    pub fn data(&self) -> Option<Vec<u8>> {
        if !self.is_complete() {
            return None;
        }
        Some(self.chunks.iter().flatten().flatten().copied().collect())
    }

    fn apply_inception(&mut self, inception: &Inception) -> Result<(), RiverError> {
        self.channel_id = Some(stream_id_of(&inception.channel_id)?);
        self.space_id = inception.space_id.as_deref().map(stream_id_of).transpose()?;
        self.chunk_count = usize::try_from(inception.chunk_count)
            .map_err(|_| RiverError::new(ErrCode::BadPayload, format!("bad chunk count {}", inception.chunk_count)))?;
        self.chunks.resize(self.chunk_count, None);
        Ok(())
    }

    fn apply_chunk(&mut self, chunk: &Chunk, notifier: &Notifier) -> Result<(), RiverError> {
        let slot = usize::try_from(chunk.chunk_index)
            .ok()
            .and_then(|i| self.chunks.get_mut(i))
            .ok_or_else(|| {
                RiverError::new(
                    ErrCode::BadPayload,
                    format!("chunk index {} out of range (count {})", chunk.chunk_index, self.chunk_count),
                )
            })?;
        *slot = Some(chunk.data.clone());
        notifier.state(StreamStateEvent::MediaChunkReceived { stream_id: self.stream_id, chunk_index: chunk.chunk_index });
        Ok(())
    }

    fn apply(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        let Some(stream_event::Payload::MediaPayload(payload)) = event.payload() else {
            return Err(unexpected_payload(StreamKind::Media, event));
        };
        match &payload.content {
            Some(media_payload::Content::Inception(inception)) => self.apply_inception(inception),
            Some(media_payload::Content::Chunk(chunk)) => self.apply_chunk(chunk, notifier),
            None => Ok(()),
        }
    }
}

impl ContentProjection for MediaContent {
    fn apply_snapshot(&mut self, _event_id: &str, snapshot: &Snapshot, _notifier: &Notifier) -> Result<(), RiverError> {
        let Some(snapshot::Content::MediaContent(content)) = &snapshot.content else {
            return Err(unexpected_snapshot(StreamKind::Media));
        };
        if let Some(inception) = &content.inception {
            self.apply_inception(inception)?;
        }
        Ok(())
    }

    fn append_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        self.apply(event, notifier)
    }

    /// Chunks are not part of the snapshot, so history still carries data.
    fn prepend_event(&mut self, event: &StreamTimelineEvent, notifier: &Notifier) -> Result<(), RiverError> {
        self.apply(event, notifier)
    }
}
