#![allow(dead_code)]

use async_trait::async_trait;
use river_kernel::codec::{make_event, SignerContext};
use river_kernel::{ParsedMiniblock, StreamHandle};
use river_model::crypto::generate_signing_key;
use river_model::{StreamId, StreamKind};
use river_proto::{
    channel_payload, miniblock_header, snapshot, stream_event, ChannelPayload, EncryptedData, Empty,
    Envelope, GetMiniblocksResponse, MemberPayload, MembershipOp, Miniblock, MiniblockHeader,
    Snapshot, StreamAndCookie, SyncCookie,
};
use river_sync::{MiniblockSource, SyncError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

pub struct Wallet {
    pub ctx: SignerContext,
}

impl Wallet {
    pub fn random() -> Self {
        Self { ctx: SignerContext::root(generate_signing_key()).unwrap() }
    }

    pub fn user_id(&self) -> String {
        self.ctx.creator_user_id()
    }

    pub fn address(&self) -> Vec<u8> {
        self.ctx.creator_address.as_bytes().to_vec()
    }

    pub fn sign(&self, payload: impl Into<stream_event::Payload>) -> Envelope {
        make_event(&self.ctx, Some(payload.into()), None).unwrap()
    }

    pub fn join(&self) -> Envelope {
        self.sign(MemberPayload::membership(MembershipOp::SoJoin, self.address(), self.address()))
    }

    pub fn message(&self, ciphertext: &str) -> Envelope {
        self.sign(ChannelPayload::message(EncryptedData {
            ciphertext: ciphertext.into(),
            algorithm: "test".into(),
            ..Default::default()
        }))
    }
}

pub fn channel_snapshot(space_id: &StreamId, channel_id: &StreamId) -> Snapshot {
    Snapshot {
        members: Some(Default::default()),
        content: Some(snapshot::Content::ChannelContent(channel_payload::Snapshot {
            inception: Some(channel_payload::Inception {
                stream_id: channel_id.to_vec(),
                space_id: space_id.to_vec(),
                settings: None,
            }),
        })),
        ..Default::default()
    }
}

/// Sealed miniblocks for one channel, signed by a node key.
pub struct Chain {
    pub space_id: StreamId,
    pub stream_id: StreamId,
    pub node: Wallet,
    pub blocks: Vec<Miniblock>,
    pub minipool: Vec<Envelope>,
    next_offset: i64,
    prev_hash: Vec<u8>,
    last_snapshot_num: i64,
}

impl Chain {
    pub fn channel() -> Self {
        let space_id = StreamId::random(StreamKind::Space);
        let stream_id = StreamId::unique_channel(&space_id);
        let mut chain = Self {
            space_id,
            stream_id,
            node: Wallet::random(),
            blocks: Vec::new(),
            minipool: Vec::new(),
            next_offset: 0,
            prev_hash: Vec::new(),
            last_snapshot_num: 0,
        };
        chain.seal_snapshot(vec![]);
        chain
    }

    pub fn seal(&mut self, events: Vec<Envelope>) {
        self.seal_with(events, None);
    }

    pub fn seal_snapshot(&mut self, events: Vec<Envelope>) {
        let snapshot = channel_snapshot(&self.space_id, &self.stream_id);
        self.seal_with(events, Some(snapshot));
    }

    fn seal_with(&mut self, events: Vec<Envelope>, snapshot: Option<Snapshot>) {
        let num = self.blocks.len() as i64;
        let has_snapshot = snapshot.is_some();
        let header = self.node.sign(MiniblockHeader {
            miniblock_num: num,
            prev_miniblock_hash: self.prev_hash.clone(),
            event_hashes: events.iter().map(|e| e.hash.clone()).collect(),
            snapshot,
            event_num_offset: self.next_offset,
            prev_snapshot_miniblock_num: self.last_snapshot_num,
            content: Some(miniblock_header::Content::None(Empty {})),
            ..Default::default()
        });
        self.next_offset += events.len() as i64 + 1;
        self.prev_hash = header.hash.clone();
        if has_snapshot {
            self.last_snapshot_num = num;
        }
        self.blocks.push(Miniblock { events, header: Some(header) });
    }

    /// Stream response from block `first`, which must carry a snapshot.
    pub fn stream_from(&self, first: usize) -> StreamAndCookie {
        StreamAndCookie {
            events: self.minipool.clone(),
            next_sync_cookie: Some(SyncCookie {
                stream_id: self.stream_id.to_vec(),
                minipool_gen: self.blocks.len() as i64,
                prev_miniblock_hash: self.prev_hash.clone(),
                ..Default::default()
            }),
            miniblocks: self.blocks[first..].to_vec(),
            sync_reset: false,
        }
    }
}

/// In-memory node serving one chain, counting calls.
pub struct FakeSource {
    pub chain: Chain,
    /// Block index `get_stream` starts from.
    pub first: usize,
    pub stream_calls: AtomicUsize,
    pub miniblock_calls: AtomicUsize,
    /// Applied to the handle while the next page is "in flight".
    pub interfere: Mutex<Option<(StreamHandle, Vec<ParsedMiniblock>)>>,
    /// When set, `get_miniblocks` answers not found.
    pub fail_miniblocks: AtomicBool,
}

impl FakeSource {
    pub fn new(chain: Chain, first: usize) -> Self {
        Self {
            chain,
            first,
            stream_calls: AtomicUsize::new(0),
            miniblock_calls: AtomicUsize::new(0),
            interfere: Mutex::new(None),
            fail_miniblocks: AtomicBool::new(false),
        }
    }

    pub fn miniblock_calls(&self) -> usize {
        self.miniblock_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MiniblockSource for FakeSource {
    async fn get_stream(&self, stream_id: &StreamId) -> Result<StreamAndCookie, SyncError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        if *stream_id != self.chain.stream_id {
            return Err(SyncError::StreamNotFound(*stream_id));
        }
        Ok(self.chain.stream_from(self.first))
    }

    async fn get_miniblocks(
        &self,
        stream_id: &StreamId,
        from_inclusive: i64,
        to_exclusive: i64,
    ) -> Result<GetMiniblocksResponse, SyncError> {
        self.miniblock_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.fail_miniblocks.load(Ordering::SeqCst) {
            return Err(SyncError::StreamNotFound(*stream_id));
        }
        if let Some((handle, blocks)) = self.interfere.lock().await.take() {
            handle.prepend_events(blocks, false).await?;
        }
        Ok(GetMiniblocksResponse {
            miniblocks: self.chain.blocks[from_inclusive as usize..to_exclusive as usize].to_vec(),
            terminus: from_inclusive == 0,
        })
    }
}
