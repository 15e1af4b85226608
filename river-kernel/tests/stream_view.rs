mod common;

use common::{ChainBuilder, Wallet};
use river_kernel::codec::{unpack_envelope, unpack_envelopes, unpack_miniblock, UnpackOpts};
use river_kernel::{
    EncryptionEvent, InitOptions, Notifier, StreamHandle, StreamStateEvent, StreamStateView, ViewStatus,
};
use river_model::{StreamId, StreamKind};
use river_proto::ErrCode;

fn new_view(chain: &ChainBuilder, me: &Wallet) -> StreamStateView {
    StreamStateView::new(me.user_id(), chain.stream_id, Notifier::new(256))
}

#[test]
fn test_join_and_message_in_one_block() {
    let alice = Wallet::random();
    let mut chain = ChainBuilder::channel();
    let message = alice.message("hello");
    chain.seal(vec![alice.join(), message.clone()], None);

    let mut view = new_view(&chain, &alice);
    view.initialize(chain.parsed(), InitOptions::default()).unwrap();

    assert!(view.get_members().membership.joined_users.contains(&alice.user_id()));
    assert!(view.get_members().membership.pending_joined_users.is_empty());

    let messages: Vec<_> = view
        .timeline()
        .iter()
        .filter(|e| matches!(e.payload(), Some(river_proto::stream_event::Payload::ChannelPayload(_))))
        .collect();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].is_confirmed());
    assert_eq!(messages[0].creator_user_id, alice.user_id());
    assert_eq!(messages[0].hash_str, hex::encode(&message.hash));
    assert_eq!(messages[0].miniblock_num(), Some(1));
}

#[test]
fn test_initialize_emits_once_after_replay() {
    let alice = Wallet::random();
    let mut chain = ChainBuilder::channel();
    chain.seal(vec![alice.join()], None);
    chain.minipool.push(alice.message("pending"));

    let notifier = Notifier::new(256);
    let mut state_rx = notifier.subscribe_state();
    let mut enc_rx = notifier.subscribe_encryption();
    let mut view = StreamStateView::new(alice.user_id(), chain.stream_id, notifier);
    view.initialize(chain.parsed(), InitOptions::default()).unwrap();

    assert_eq!(state_rx.try_recv().unwrap(), StreamStateEvent::Initialized { stream_id: chain.stream_id });
    assert!(state_rx.try_recv().is_err());

    // Encryption hand-offs are not held back.
    let mut saw_message = false;
    while let Ok(ev) = enc_rx.try_recv() {
        if matches!(ev, EncryptionEvent::NewEncryptedContent { .. }) {
            saw_message = true;
        }
    }
    assert!(saw_message);
    assert_eq!(view.status(), ViewStatus::Initialized);
}

#[test]
fn test_last_event_num_and_minipool_numbering() {
    let alice = Wallet::random();
    let mut chain = ChainBuilder::channel();
    chain.seal(vec![alice.join(), alice.message("a")], None);
    let pending = alice.message("b");
    chain.minipool.push(pending.clone());

    let mut view = new_view(&chain, &alice);
    view.initialize(chain.parsed(), InitOptions::default()).unwrap();

    // genesis header = 0, block 1 = join 1, message 2, header 3
    let tail = view.timeline().get(&hex::encode(&pending.hash)).unwrap();
    assert_eq!(tail.event_num, 4);
    assert!(!tail.is_confirmed());
    assert_eq!(view.last_event_num(), 5);
    assert_eq!(view.miniblock_info().map(|i| (i.min, i.max)), Some((0, 1)));
    assert!(view.miniblock_info().unwrap().terminus_reached);
    assert_eq!(view.prev_miniblock_hash().map(|h| h.to_vec()), chain.blocks[1].header.as_ref().map(|h| h.hash.clone()));
}

#[test]
fn test_append_same_envelope_twice() {
    let alice = Wallet::random();
    let mut chain = ChainBuilder::channel();
    chain.seal(vec![alice.join()], None);

    let notifier = Notifier::new(256);
    let mut view = StreamStateView::new(alice.user_id(), chain.stream_id, notifier.clone());
    view.initialize(chain.parsed(), InitOptions::default()).unwrap();
    let mut enc_rx = notifier.subscribe_encryption();

    let message = alice.message("once");
    let parsed = unpack_envelope(&message, &UnpackOpts::default()).unwrap();
    view.append_events(vec![parsed.clone()], chain.cookie()).unwrap();
    view.append_events(vec![parsed.clone()], chain.cookie()).unwrap();

    let count = view.timeline().hashes().filter(|h| *h == parsed.hash_str).count();
    assert_eq!(count, 1);

    let mut dispatched = 0;
    while let Ok(ev) = enc_rx.try_recv() {
        if let EncryptionEvent::NewEncryptedContent { event_id, .. } = ev {
            if event_id == parsed.hash_str {
                dispatched += 1;
            }
        }
    }
    assert_eq!(dispatched, 1);
}

#[test]
fn test_header_ordering_invariant() {
    let alice = Wallet::random();
    let mut chain = ChainBuilder::channel();
    chain.seal(vec![alice.join()], None);

    let mut view = new_view(&chain, &alice);
    view.initialize(chain.parsed(), InitOptions::default()).unwrap();
    assert_eq!(view.miniblock_info().unwrap().max, 1);
    let before = view.timeline().len();

    // Block 1 again: not greater than max.
    let stale = chain.header(1, &[], 10, None);
    let stale_parsed = unpack_envelope(&stale, &UnpackOpts::default()).unwrap();
    view.append_events(vec![stale_parsed.clone()], chain.cookie()).unwrap();
    assert_eq!(view.miniblock_info().unwrap().max, 1);
    assert!(!view.timeline().contains(&stale_parsed.hash_str));
    assert_eq!(view.timeline().len(), before);

    // Block 2 seals a pending message.
    let message = alice.message("sealed");
    let message_parsed = unpack_envelope(&message, &UnpackOpts::default()).unwrap();
    view.append_events(vec![message_parsed.clone()], chain.cookie()).unwrap();
    assert!(!view.timeline().get(&message_parsed.hash_str).unwrap().is_confirmed());

    let offset = view.last_event_num() - 1;
    let next = chain.header(2, std::slice::from_ref(&message), offset, None);
    let next_parsed = unpack_envelope(&next, &UnpackOpts::default()).unwrap();
    view.append_events(vec![next_parsed.clone()], chain.cookie()).unwrap();
    assert_eq!(view.miniblock_info().unwrap().max, 2);
    let sealed = view.timeline().get(&message_parsed.hash_str).unwrap();
    assert!(sealed.is_confirmed());
    assert_eq!(sealed.miniblock_num(), Some(2));

    // The live header seals itself, same as one loaded at bootstrap.
    let header = view.timeline().get(&next_parsed.hash_str).unwrap();
    assert!(header.is_confirmed());
    assert_eq!(header.miniblock_num(), Some(2));
    assert_eq!(header.confirmed_event_num(), Some(offset + 1));
}

#[test]
fn test_bootstrap_header_matches_live_header() {
    let alice = Wallet::random();
    let mut chain = ChainBuilder::channel();
    chain.seal(vec![alice.join()], None);
    let mut view = new_view(&chain, &alice);
    view.initialize(chain.parsed(), InitOptions::default()).unwrap();

    let message = alice.message("sealed");
    view.append_events(vec![unpack_envelope(&message, &UnpackOpts::default()).unwrap()], chain.cookie())
        .unwrap();
    let block = chain.seal(vec![message], None).clone();
    let header = unpack_miniblock(&block, &UnpackOpts::default()).unwrap();
    let header_event = header.events.last().unwrap().clone();
    view.append_events(vec![header_event.clone()], chain.cookie()).unwrap();

    let mut fresh = new_view(&chain, &alice);
    fresh.initialize(chain.parsed(), InitOptions::default()).unwrap();

    let live = view.timeline().get(&header_event.hash_str).unwrap();
    let loaded = fresh.timeline().get(&header_event.hash_str).unwrap();
    assert_eq!(
        (live.is_confirmed(), live.miniblock_num(), live.confirmed_event_num()),
        (loaded.is_confirmed(), loaded.miniblock_num(), loaded.confirmed_event_num())
    );
}

#[test]
fn test_header_naming_unknown_event_is_contained() {
    let alice = Wallet::random();
    let chain = ChainBuilder::channel();
    let mut view = new_view(&chain, &alice);
    view.initialize(chain.parsed(), InitOptions::default()).unwrap();

    let never_appended = alice.message("ghost");
    let header = chain.header(1, &[never_appended], 1, None);
    let parsed = unpack_envelope(&header, &UnpackOpts::default()).unwrap();
    view.append_events(vec![parsed], chain.cookie()).unwrap();
    assert_eq!(view.miniblock_info().unwrap().max, 1);
}

#[test]
fn test_reconstruction_is_deterministic() {
    let alice = Wallet::random();
    let bob = Wallet::random();
    let mut chain = ChainBuilder::channel();
    chain.seal(vec![alice.join(), bob.join()], None);
    chain.seal(vec![alice.message("1"), bob.message("2")], None);
    chain.minipool.push(alice.message("3"));

    let summarize = |view: &StreamStateView| -> Vec<(String, i64, bool)> {
        view.timeline().iter().map(|e| (e.hash_str.clone(), e.event_num, e.is_confirmed())).collect()
    };

    let mut first = new_view(&chain, &alice);
    first.initialize(chain.parsed(), InitOptions::default()).unwrap();
    let mut second = new_view(&chain, &bob);
    second.initialize(chain.parsed(), InitOptions::default()).unwrap();

    assert_eq!(summarize(&first), summarize(&second));
    assert_eq!(first.timeline().len(), 8);
}

#[test]
fn test_prepend_older_blocks() {
    let alice = Wallet::random();
    let mut chain = ChainBuilder::channel();
    chain.seal(vec![alice.join()], None);
    chain.seal(vec![alice.message("old")], None);
    let snapshot = common::channel_snapshot(&StreamId::random(StreamKind::Space), &chain.stream_id);
    chain.seal(vec![], Some(snapshot));
    chain.seal(vec![alice.message("new")], None);

    let mut view = new_view(&chain, &alice);
    view.initialize(chain.parsed_from(3), InitOptions::default()).unwrap();
    let info = *view.miniblock_info().unwrap();
    assert_eq!((info.min, info.max, info.terminus_reached), (3, 4, false));
    assert_eq!(view.prev_snapshot_miniblock_num(), 0);
    // Alice joined in block 1; the snapshot here carries no members.
    assert!(!view.get_members().is_member_joined(&alice.user_id()));

    let older: Vec<_> = chain.blocks[..3]
        .iter()
        .map(|mb| unpack_miniblock(mb, &UnpackOpts::default()).unwrap())
        .collect();
    view.prepend_events(older.clone(), true).unwrap();
    let info = *view.miniblock_info().unwrap();
    assert_eq!((info.min, info.max, info.terminus_reached), (0, 4, true));
    assert!(view.get_members().is_member_joined(&alice.user_id()));

    // A duplicate page changes nothing.
    let len = view.timeline().len();
    view.prepend_events(older, true).unwrap();
    assert_eq!(view.timeline().len(), len);

    let first = view.timeline().first().unwrap();
    assert_eq!(first.event_num, 0);
    assert_eq!(first.miniblock_num(), Some(0));
}

#[test]
fn test_minipool_events_can_be_unpacked_in_bulk() {
    let alice = Wallet::random();
    let envs = vec![alice.join(), alice.message("x")];
    let parsed = unpack_envelopes(&envs, &UnpackOpts::default()).unwrap();
    assert_eq!(parsed.len(), 2);
    assert!(parsed.iter().all(|p| p.creator_user_id == alice.user_id()));
}

#[test]
fn test_initialize_twice_fails() {
    let alice = Wallet::random();
    let chain = ChainBuilder::channel();
    let mut view = new_view(&chain, &alice);
    view.initialize(chain.parsed(), InitOptions::default()).unwrap();
    let err = view.initialize(chain.parsed(), InitOptions::default()).unwrap_err();
    assert_eq!(err.code, ErrCode::FailedPrecondition);
}

#[test]
fn test_failed_initialize_leaves_view_clean() {
    let alice = Wallet::random();
    let mut chain = ChainBuilder::channel();
    chain.seal(vec![alice.join()], None);
    let mut view = new_view(&chain, &alice);

    // Members apply, then the channel projection rejects a space snapshot.
    let mut bad = chain.parsed();
    bad.snapshot.members = Some(river_proto::member_payload::Snapshot {
        joined: vec![river_proto::member_payload::snapshot::Member {
            user_address: alice.address(),
            ..Default::default()
        }],
    });
    bad.snapshot.content = Some(river_proto::snapshot::Content::SpaceContent(Default::default()));
    assert!(view.initialize(bad, InitOptions::default()).is_err());
    assert_eq!(view.status(), ViewStatus::Uninitialized);
    assert!(view.get_members().membership.joined_users.is_empty());
    assert!(view.timeline().is_empty());
    assert!(view.miniblock_info().is_none());

    view.initialize(chain.parsed(), InitOptions::default()).unwrap();
    assert_eq!(view.status(), ViewStatus::Initialized);
    assert!(view.get_members().is_member_joined(&alice.user_id()));
}

#[tokio::test]
async fn test_handle_guards_prepend_on_min() {
    let alice = Wallet::random();
    let mut chain = ChainBuilder::channel();
    chain.seal(vec![alice.message("m")], None);
    let snapshot = common::channel_snapshot(&StreamId::random(StreamKind::Space), &chain.stream_id);
    chain.seal(vec![], Some(snapshot));

    let handle = StreamHandle::spawn(new_view(&chain, &alice));
    handle.initialize(chain.parsed_from(2), InitOptions::default()).await.unwrap();
    let min = handle.miniblock_info().await.unwrap().unwrap().min;
    assert_eq!(min, 2);

    let older: Vec<_> = chain.blocks[..2]
        .iter()
        .map(|mb| unpack_miniblock(mb, &UnpackOpts::default()).unwrap())
        .collect();
    assert!(!handle.prepend_if_min_unchanged(min + 1, older.clone(), true).await.unwrap());
    assert_eq!(handle.miniblock_info().await.unwrap().unwrap().min, 2);

    assert!(handle.prepend_if_min_unchanged(min, older, true).await.unwrap());
    let terminus = handle.read(|v| v.miniblock_info().map(|i| i.terminus_reached)).await.unwrap();
    assert_eq!(terminus, Some(true));

    handle.close().await;
    assert!(handle.miniblock_info().await.is_err());
}
