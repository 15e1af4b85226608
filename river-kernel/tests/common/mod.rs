#![allow(dead_code)]

use river_kernel::codec::{make_event, unpack_stream, ParsedStreamResponse, SignerContext, UnpackOpts};
use river_model::crypto::generate_signing_key;
use river_model::{StreamId, StreamKind};
use river_proto::{
    channel_payload, miniblock_header, snapshot, stream_event, ChannelPayload, EncryptedData, Empty,
    Envelope, MemberPayload, MembershipOp, Miniblock, MiniblockHeader, Snapshot, StreamAndCookie,
    SyncCookie,
};

/// A signing identity with a root key.
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
        self.ctx.creator_address.to_vec()
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

/// Builds a sealed chain of miniblocks for one stream, signed by a node key.
pub struct ChainBuilder {
    pub stream_id: StreamId,
    pub node: Wallet,
    pub blocks: Vec<Miniblock>,
    pub minipool: Vec<Envelope>,
    next_offset: i64,
    prev_hash: Vec<u8>,
    last_snapshot_num: i64,
}

impl ChainBuilder {
    /// Chain whose block 0 carries `snapshot` and `genesis_events`.
    pub fn new(stream_id: StreamId, snapshot: Snapshot, genesis_events: Vec<Envelope>) -> Self {
        let mut builder = Self {
            stream_id,
            node: Wallet::random(),
            blocks: Vec::new(),
            minipool: Vec::new(),
            next_offset: 0,
            prev_hash: Vec::new(),
            last_snapshot_num: 0,
        };
        builder.seal(genesis_events, Some(snapshot));
        builder
    }

    /// Empty channel stream in a random space.
    pub fn channel() -> Self {
        let space = StreamId::random(StreamKind::Space);
        let channel = StreamId::unique_channel(&space);
        Self::new(channel, channel_snapshot(&space, &channel), vec![])
    }

    pub fn next_miniblock_num(&self) -> i64 {
        self.blocks.len() as i64
    }

    /// Header event for block `num` sealing `events`, not added to the chain.
    pub fn header(&self, num: i64, events: &[Envelope], offset: i64, snapshot: Option<Snapshot>) -> Envelope {
        let header = MiniblockHeader {
            miniblock_num: num,
            prev_miniblock_hash: self.prev_hash.clone(),
            event_hashes: events.iter().map(|e| e.hash.clone()).collect(),
            snapshot,
            event_num_offset: offset,
            prev_snapshot_miniblock_num: self.last_snapshot_num,
            content: Some(miniblock_header::Content::None(Empty {})),
            ..Default::default()
        };
        self.node.sign(header)
    }

    /// Seal `events` into the next block.
    pub fn seal(&mut self, events: Vec<Envelope>, snapshot: Option<Snapshot>) -> &Miniblock {
        let num = self.next_miniblock_num();
        let has_snapshot = snapshot.is_some();
        let header = self.header(num, &events, self.next_offset, snapshot);
        self.next_offset += events.len() as i64 + 1;
        self.prev_hash = header.hash.clone();
        if has_snapshot {
            self.last_snapshot_num = num;
        }
        self.blocks.push(Miniblock { events, header: Some(header) });
        &self.blocks[num as usize]
    }

    /// Seal the current minipool.
    pub fn seal_minipool(&mut self) -> &Miniblock {
        let events = std::mem::take(&mut self.minipool);
        self.seal(events, None)
    }

    pub fn cookie(&self) -> SyncCookie {
        SyncCookie {
            stream_id: self.stream_id.to_vec(),
            minipool_gen: self.next_miniblock_num(),
            prev_miniblock_hash: self.prev_hash.clone(),
            ..Default::default()
        }
    }

    /// Stream response starting at block `first` (which must carry a snapshot).
    pub fn stream_from(&self, first: usize) -> StreamAndCookie {
        StreamAndCookie {
            events: self.minipool.clone(),
            next_sync_cookie: Some(self.cookie()),
            miniblocks: self.blocks[first..].to_vec(),
            sync_reset: false,
        }
    }

    pub fn stream(&self) -> StreamAndCookie {
        self.stream_from(0)
    }

    pub fn parsed_from(&self, first: usize) -> ParsedStreamResponse {
        unpack_stream(Some(&self.stream_from(first)), &UnpackOpts::default()).unwrap()
    }

    pub fn parsed(&self) -> ParsedStreamResponse {
        self.parsed_from(0)
    }
}
