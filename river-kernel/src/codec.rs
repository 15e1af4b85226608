//! Envelope codec
//!
//! Packs payloads into signed envelopes and unpacks envelopes, miniblocks
//! and whole stream responses into verified [`ParsedEvent`]s.

use crate::error::{check, RiverError};
use river_model::crypto::{
    check_delegate_sig, generate_salt, generate_signing_key, public_key_bytes,
    public_key_to_address, recover_public_key, river_hash, sign_delegate, sign_hash,
    user_id_from_address,
};
use river_model::{Address, Clock, Hash, SigningKey, SystemClock};
use river_proto::{
    stream_event, Envelope, ErrCode, Miniblock, MiniblockHeader, Snapshot, StreamAndCookie,
    StreamEvent, SyncCookie,
};
use prost::Message;

/// Signing identity for outgoing events.
///
/// With a delegate signature the event is signed by a device key and
/// attributed to the root key's address.
#[derive(Clone)]
pub struct SignerContext {
    pub signer_private_key: SigningKey,
    pub creator_address: Address,
    pub delegate_sig: Option<Vec<u8>>,
    pub delegate_expiry_epoch_ms: Option<i64>,
}

impl SignerContext {
    /// Root-signed context: the signer is also the creator.
    pub fn root(key: SigningKey) -> Result<Self, RiverError> {
        let creator_address = public_key_to_address(&public_key_bytes(&key))?;
        Ok(Self {
            signer_private_key: key,
            creator_address,
            delegate_sig: None,
            delegate_expiry_epoch_ms: None,
        })
    }

    pub fn creator_user_id(&self) -> String {
        user_id_from_address(&self.creator_address)
    }
}

impl std::fmt::Debug for SignerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerContext")
            .field("creator_address", &self.creator_address)
            .field("delegated", &self.delegate_sig.is_some())
            .field("delegate_expiry_epoch_ms", &self.delegate_expiry_epoch_ms)
            .finish_non_exhaustive()
    }
}

/// Generate a fresh device key authorized by `root_key` until
/// `expiry_epoch_ms` (0 = never expires).
pub fn make_signer_delegate(root_key: &SigningKey, expiry_epoch_ms: i64) -> Result<SignerContext, RiverError> {
    let device_key = generate_signing_key();
    let delegate_sig = sign_delegate(root_key, &public_key_bytes(&device_key), expiry_epoch_ms)?;
    Ok(SignerContext {
        signer_private_key: device_key,
        creator_address: public_key_to_address(&public_key_bytes(root_key))?,
        delegate_sig: Some(delegate_sig.0.to_vec()),
        delegate_expiry_epoch_ms: Some(expiry_epoch_ms),
    })
}

/// Envelope-verification switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnpackOpts {
    /// Skip hash, signature and delegate checks (server-sealed history).
    pub disable_checks: bool,
    /// Wall clock used for delegate expiry; `None` reads the system clock.
    pub now_ms: Option<i64>,
}

impl UnpackOpts {
    pub fn unchecked() -> Self {
        Self { disable_checks: true, now_ms: None }
    }

    pub fn at(now_ms: i64) -> Self {
        Self { disable_checks: false, now_ms: Some(now_ms) }
    }
}

/// A verified, decoded envelope.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedEvent {
    pub event: StreamEvent,
    pub hash: Hash,
    pub hash_str: String,
    pub prev_miniblock_hash_str: Option<String>,
    pub creator_user_id: String,
}

impl ParsedEvent {
    pub fn payload(&self) -> Option<&stream_event::Payload> {
        self.event.payload.as_ref()
    }
}

/// A miniblock whose `events` end with the header event itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMiniblock {
    pub hash: Hash,
    pub header: MiniblockHeader,
    pub events: Vec<ParsedEvent>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedStreamAndCookie {
    pub events: Vec<ParsedEvent>,
    pub next_sync_cookie: SyncCookie,
    pub miniblocks: Vec<ParsedMiniblock>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedStreamResponse {
    pub stream_and_cookie: ParsedStreamAndCookie,
    pub snapshot: Snapshot,
    pub prev_snapshot_miniblock_num: i64,
    pub event_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Packing
// ---------------------------------------------------------------------------

fn has_content_case(payload: &stream_event::Payload) -> bool {
    use stream_event::Payload as P;
    match payload {
        P::MiniblockHeader(v) => v.content.is_some(),
        P::MemberPayload(v) => v.content.is_some(),
        P::SpacePayload(v) => v.content.is_some(),
        P::ChannelPayload(v) => v.content.is_some(),
        P::UserPayload(v) => v.content.is_some(),
        P::UserSettingsPayload(v) => v.content.is_some(),
        P::UserDeviceKeyPayload(v) => v.content.is_some(),
        P::UserInboxPayload(v) => v.content.is_some(),
        P::MediaPayload(v) => v.content.is_some(),
        P::DmChannelPayload(v) => v.content.is_some(),
        P::GdmChannelPayload(v) => v.content.is_some(),
    }
}

/// Build, hash and sign a new event.
pub fn make_event(
    context: &SignerContext,
    payload: Option<stream_event::Payload>,
    prev_miniblock_hash: Option<&[u8]>,
) -> Result<Envelope, RiverError> {
    make_event_with_clock(context, payload, prev_miniblock_hash, &SystemClock)
}

pub fn make_event_with_clock(
    context: &SignerContext,
    payload: Option<stream_event::Payload>,
    prev_miniblock_hash: Option<&[u8]>,
    clock: &dyn Clock,
) -> Result<Envelope, RiverError> {
    let payload = payload.ok_or_else(|| RiverError::new(ErrCode::BadPayload, "Payload can't be undefined"))?;
    check(has_content_case(&payload), ErrCode::BadPayload, || {
        format!("Payload content case can't be empty ({})", payload.case_name())
    })?;
    if let Some(prev) = prev_miniblock_hash {
        check(prev.len() == Hash::LEN, ErrCode::BadHashFormat, || {
            format!("prevMiniblockHash should be 32 bytes, got {}", prev.len())
        })?;
    }

    let mut event = StreamEvent {
        creator_address: context.creator_address.to_vec(),
        salt: generate_salt().to_vec(),
        prev_miniblock_hash: prev_miniblock_hash.map(<[u8]>::to_vec),
        created_at_epoch_ms: clock.now_ms(),
        payload: Some(payload),
        ..Default::default()
    };
    if let Some(sig) = &context.delegate_sig {
        event.delegate_sig = sig.clone();
        event.delegate_expiry_epoch_ms = context.delegate_expiry_epoch_ms.unwrap_or(0);
    }

    let bytes = event.encode_to_vec();
    let hash = river_hash(&bytes);
    let signature = sign_hash(&context.signer_private_key, &hash)?;
    Ok(Envelope {
        hash: hash.to_vec(),
        signature: signature.0.to_vec(),
        event: bytes,
    })
}

// ---------------------------------------------------------------------------
// Unpacking
// ---------------------------------------------------------------------------

pub fn unpack_envelope(envelope: &Envelope, opts: &UnpackOpts) -> Result<ParsedEvent, RiverError> {
    check(!envelope.event.is_empty(), ErrCode::BadEvent, || "Event base is not set".into())?;
    check(!envelope.hash.is_empty(), ErrCode::BadEvent, || "Event hash is not set".into())?;
    check(!envelope.signature.is_empty(), ErrCode::BadEvent, || "Event signature is not set".into())?;

    let event = StreamEvent::decode(envelope.event.as_slice())?;
    let hash = Hash::try_from(envelope.hash.as_slice()).map_err(|_| {
        RiverError::new(
            ErrCode::BadHashFormat,
            format!("event hash should be 32 bytes, got {}", envelope.hash.len()),
        )
    })?;

    if !opts.disable_checks {
        let computed = river_hash(&envelope.event);
        check(computed == hash, ErrCode::BadEventId, || "Event id is not valid".into())?;

        let recovered = recover_public_key(computed.as_bytes(), &envelope.signature)
            .map_err(|e| RiverError::new(ErrCode::BadEventSignature, e.to_string()))?;

        if event.delegate_sig.is_empty() {
            let address = public_key_to_address(&recovered)?;
            check(address.as_ref() == event.creator_address.as_slice(), ErrCode::BadEventSignature, || {
                "Event signature is not valid".into()
            })?;
        } else {
            let now_ms = opts.now_ms.unwrap_or_else(|| SystemClock.now_ms());
            check_delegate_sig(
                &recovered,
                &event.creator_address,
                &event.delegate_sig,
                event.delegate_expiry_epoch_ms,
                now_ms,
            )?;
        }
    }

    let creator = Address::try_from(event.creator_address.as_slice()).map_err(|_| {
        RiverError::new(
            ErrCode::BadCreatorAddress,
            format!("creator address should be 20 bytes, got {}", event.creator_address.len()),
        )
    })?;

    Ok(ParsedEvent {
        hash_str: hash.to_string(),
        prev_miniblock_hash_str: event.prev_miniblock_hash.as_deref().map(hex::encode),
        creator_user_id: user_id_from_address(&creator),
        hash,
        event,
    })
}

pub fn unpack_envelopes(envelopes: &[Envelope], opts: &UnpackOpts) -> Result<Vec<ParsedEvent>, RiverError> {
    envelopes.iter().map(|e| unpack_envelope(e, opts)).collect()
}

/// Unpack body events and the header; the header event is appended last.
pub fn unpack_miniblock(miniblock: &Miniblock, opts: &UnpackOpts) -> Result<ParsedMiniblock, RiverError> {
    let header_env = miniblock
        .header
        .as_ref()
        .ok_or_else(|| RiverError::new(ErrCode::BadBlock, "Miniblock header is not set"))?;
    let header_event = unpack_envelope(header_env, opts)?;
    let header = header_event.event.miniblock_header().cloned().ok_or_else(|| {
        RiverError::new(
            ErrCode::BadBlock,
            format!("bad miniblock header: wrong case received: {}", header_event.event.payload_case()),
        )
    })?;
    let mut events = unpack_envelopes(&miniblock.events, opts)?;
    let hash = header_event.hash;
    events.push(header_event);
    Ok(ParsedMiniblock { hash, header, events })
}

pub fn unpack_stream_and_cookie(
    stream: &StreamAndCookie,
    opts: &UnpackOpts,
) -> Result<ParsedStreamAndCookie, RiverError> {
    let next_sync_cookie = stream
        .next_sync_cookie
        .clone()
        .ok_or_else(|| RiverError::new(ErrCode::BadSyncCookie, "bad stream: no cookie"))?;
    let miniblocks = stream
        .miniblocks
        .iter()
        .map(|mb| unpack_miniblock(mb, opts))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ParsedStreamAndCookie {
        events: unpack_envelopes(&stream.events, opts)?,
        next_sync_cookie,
        miniblocks,
    })
}

/// Unpack a full `GetStream` response. The snapshot lives in the first miniblock.
pub fn unpack_stream(stream: Option<&StreamAndCookie>, opts: &UnpackOpts) -> Result<ParsedStreamResponse, RiverError> {
    let stream = stream.ok_or_else(|| RiverError::new(ErrCode::StreamEmpty, "bad stream"))?;
    let stream_and_cookie = unpack_stream_and_cookie(stream, opts)?;
    let first = stream_and_cookie.miniblocks.first().ok_or_else(|| {
        RiverError::new(
            ErrCode::StreamEmpty,
            format!("bad stream: no blocks {}", hex::encode(&stream_and_cookie.next_sync_cookie.stream_id)),
        )
    })?;
    let snapshot = first.header.snapshot.clone().ok_or_else(|| {
        RiverError::new(
            ErrCode::StreamBadEvent,
            format!("bad block: snapshot is undefined {}", hex::encode(&stream_and_cookie.next_sync_cookie.stream_id)),
        )
    })?;
    let prev_snapshot_miniblock_num = first.header.prev_snapshot_miniblock_num;
    let event_ids = stream_and_cookie
        .miniblocks
        .iter()
        .flat_map(|mb| mb.events.iter())
        .chain(stream_and_cookie.events.iter())
        .map(|e| e.hash_str.clone())
        .collect();
    Ok(ParsedStreamResponse {
        stream_and_cookie,
        snapshot,
        prev_snapshot_miniblock_num,
        event_ids,
    })
}

/// Every envelope in a stream: per miniblock, body events then header; then the minipool.
pub fn unpack_stream_envelopes(stream: &StreamAndCookie, opts: &UnpackOpts) -> Result<Vec<ParsedEvent>, RiverError> {
    let mut out = Vec::new();
    for mb in &stream.miniblocks {
        out.extend(unpack_envelopes(&mb.events, opts)?);
        let header = mb
            .header
            .as_ref()
            .ok_or_else(|| RiverError::new(ErrCode::BadBlock, "Miniblock header is not set"))?;
        out.push(unpack_envelope(header, opts)?);
    }
    out.extend(unpack_envelopes(&stream.events, opts)?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use river_proto::{ChannelPayload, EncryptedData, MemberPayload, MembershipOp};

    fn join_payload(ctx: &SignerContext) -> Option<stream_event::Payload> {
        Some(
            MemberPayload::membership(
                MembershipOp::SoJoin,
                ctx.creator_address.to_vec(),
                ctx.creator_address.to_vec(),
            )
            .into(),
        )
    }

    #[test]
    fn test_make_and_unpack_round_trip() {
        let ctx = SignerContext::root(generate_signing_key()).unwrap();
        let env = make_event(&ctx, join_payload(&ctx), None).unwrap();
        let parsed = unpack_envelope(&env, &UnpackOpts::default()).unwrap();
        assert_eq!(parsed.creator_user_id, ctx.creator_user_id());
        assert_eq!(parsed.hash_str, hex::encode(&env.hash));
        assert!(parsed.prev_miniblock_hash_str.is_none());
    }

    #[test]
    fn test_make_event_rejects_empty_payload() {
        let ctx = SignerContext::root(generate_signing_key()).unwrap();
        let err = make_event(&ctx, None, None).unwrap_err();
        assert_eq!(err.code, ErrCode::BadPayload);

        let empty = Some(stream_event::Payload::ChannelPayload(ChannelPayload { content: None }));
        assert_eq!(make_event(&ctx, empty, None).unwrap_err().code, ErrCode::BadPayload);
    }

    #[test]
    fn test_make_event_rejects_short_prev_hash() {
        let ctx = SignerContext::root(generate_signing_key()).unwrap();
        let err = make_event(&ctx, join_payload(&ctx), Some(&[0u8; 31])).unwrap_err();
        assert_eq!(err.code, ErrCode::BadHashFormat);
        assert!(make_event(&ctx, join_payload(&ctx), Some(&[0u8; 32])).is_ok());
    }

    #[test]
    fn test_tampered_event_fails_hash_check() {
        let ctx = SignerContext::root(generate_signing_key()).unwrap();
        let mut env = make_event(&ctx, join_payload(&ctx), None).unwrap();
        let last = env.event.len() - 1;
        env.event[last] ^= 0x01;
        let err = unpack_envelope(&env, &UnpackOpts::default()).unwrap_err();
        assert_eq!(err.code, ErrCode::BadEventId);
    }

    #[test]
    fn test_wrong_creator_fails_signature_check() {
        let ctx = SignerContext::root(generate_signing_key()).unwrap();
        let other = SignerContext::root(generate_signing_key()).unwrap();
        let forged = SignerContext { creator_address: other.creator_address, ..ctx };
        let env = make_event(&forged, join_payload(&forged), None).unwrap();
        let err = unpack_envelope(&env, &UnpackOpts::default()).unwrap_err();
        assert_eq!(err.code, ErrCode::BadEventSignature);
        assert!(unpack_envelope(&env, &UnpackOpts::unchecked()).is_ok());
    }

    #[test]
    fn test_unpack_miniblock_requires_header_case() {
        let ctx = SignerContext::root(generate_signing_key()).unwrap();
        let not_a_header = make_event(
            &ctx,
            Some(ChannelPayload::message(EncryptedData::default()).into()),
            None,
        )
        .unwrap();
        let mb = Miniblock { events: vec![], header: Some(not_a_header) };
        let err = unpack_miniblock(&mb, &UnpackOpts::default()).unwrap_err();
        assert_eq!(err.code, ErrCode::BadBlock);
    }

    #[test]
    fn test_unpack_stream_without_blocks_is_empty() {
        let stream = StreamAndCookie { next_sync_cookie: Some(SyncCookie::default()), ..Default::default() };
        let err = unpack_stream(Some(&stream), &UnpackOpts::default()).unwrap_err();
        assert_eq!(err.code, ErrCode::StreamEmpty);
        assert_eq!(unpack_stream(None, &UnpackOpts::default()).unwrap_err().code, ErrCode::StreamEmpty);
    }
}
